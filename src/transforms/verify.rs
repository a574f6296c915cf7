//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::analysis;
use crate::analysis::GraphWriter;
use crate::arena::ArenaKey;
use crate::ir::*;
use crate::pass::GraphTransformPass;
use crate::utility::SaHashSet;
use smallbitvec::SmallBitVec;
use smallvec::SmallVec;

/// An IR validity verification pass.
///
/// This scans the entire graph, and will do nothing if the graph is valid. If
/// the graph isn't valid, it will abort with an error.
pub struct VerifyGraphPass;

impl GraphTransformPass for VerifyGraphPass {
    fn run(&mut self, graph: &mut Graph) -> bool {
        verify_graph_panic(graph);

        false
    }
}

/// A single problem found by [`verify_graph`]. Nodes are referred to by
/// their textual form, values by their printed name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerifyError {
    /// A value was used somewhere that its definition isn't visible.
    #[error("`{at}` uses {value}, which is not defined before it in an enclosing block")]
    UndefinedValue {
        /// The node (or block terminator) with the use
        at: String,
        /// The value being used
        value: String,
    },
    /// A node has the wrong number of inputs, outputs or blocks for its kind.
    #[error("`{at}`: {message}")]
    InvalidNode {
        /// The invalid node
        at: String,
        /// What is wrong with it
        message: String,
    },
    /// A block owned by a node has parameters, or doesn't know its owner.
    #[error("`{at}` owns an invalid block: {message}")]
    InvalidBlock {
        /// The owner of the invalid block
        at: String,
        /// What is wrong with it
        message: String,
    },
    /// The recorded use-list of a value doesn't match the places it's used.
    #[error("use-list of {value} is out of sync with its uses")]
    UseListMismatch {
        /// The value with the wrong use-list
        value: String,
    },
}

/// Verifies that a graph is well-formed.
///
/// This checks that every value is defined before it's used (and only used
/// where its definition is visible), that each builtin node has the shape it
/// requires, that owned blocks are well-formed and that the use-lists of
/// every value are correct.
pub fn verify_graph(graph: &Graph) -> Result<(), Vec<VerifyError>> {
    let mut verifier = Verifier {
        graph,
        writer: GraphWriter::from(graph),
        defined: SmallBitVec::from_elem(graph.dfg.value_count(), false),
        expected_uses: SaHashSet::default(),
        errors: Vec::default(),
    };

    verifier.walk();

    if verifier.errors.is_empty() {
        Ok(())
    } else {
        Err(verifier.errors)
    }
}

/// This is [`verify_graph`], except that it writes out any errors
/// and then panics on failure.
pub fn verify_graph_panic(graph: &Graph) {
    if let Err(errors) = verify_graph(graph) {
        println!();
        analysis::print_graph(graph);
        println!();

        for error in errors {
            println!("error: {error}");
        }

        panic!("graph failed verification");
    }
}

struct Verifier<'g> {
    graph: &'g Graph,
    writer: GraphWriter,
    defined: SmallBitVec,
    expected_uses: SaHashSet<Use>,
    errors: Vec<VerifyError>,
}

impl<'g> Verifier<'g> {
    fn walk(&mut self) {
        let graph = self.graph;
        let entry = graph.entry_block();

        for &input in graph.inputs() {
            self.define(input);
        }

        self.block(entry, "return");
        self.verify_use_lists();
    }

    // verifies every node in `block` and returns every value defined inside it,
    // so the caller can take them out of scope again
    fn block(&mut self, block: Block, terminator: &str) -> SmallVec<[Value; 8]> {
        let graph = self.graph;
        let mut view = GraphView::over(graph);
        let mut scope = SmallVec::new();

        view.goto_before(block);

        while let Some(node) = view.next_node() {
            self.node(node);

            for &output in graph.dfg.node(node).outputs() {
                self.define(output);
                scope.push(output);
            }
        }

        for (i, &output) in graph.dfg.block(block).outputs().iter().enumerate() {
            self.expected_uses.insert(Use::Output(block, i as u32));

            if !self.is_defined(output) {
                let at = format!("{terminator} {}", self.value_name(output));

                self.errors.push(VerifyError::UndefinedValue {
                    at,
                    value: self.value_name(output),
                });
            }
        }

        scope
    }

    fn node(&mut self, node: Node) {
        let graph = self.graph;
        let data = graph.dfg.node(node);

        for (i, &input) in data.inputs().iter().enumerate() {
            self.expected_uses.insert(Use::Input(node, i as u32));

            if !self.is_defined(input) {
                self.errors.push(VerifyError::UndefinedValue {
                    at: self.writer.node(node).to_owned(),
                    value: self.value_name(input),
                });
            }
        }

        self.verify_shape(node, data);

        for &inner in data.blocks() {
            let block_data = graph.dfg.block(inner);

            if !block_data.params().is_empty() {
                self.invalid_block(node, "nested blocks cannot have parameters");
            }

            if block_data.owner() != Some(node) {
                self.invalid_block(node, "block does not record its owner");
            }

            for value in self.block(inner, "yield") {
                self.undefine(value);
            }
        }
    }

    fn verify_shape(&mut self, node: Node, data: &NodeData) {
        let (inputs, outputs, blocks) = (
            data.inputs().len(),
            data.outputs().len(),
            data.blocks().len(),
        );

        match data.kind() {
            NodeKind::AutogradZero => {
                if inputs != 0 || outputs != 1 || blocks != 0 {
                    self.invalid_node(node, "`autograd_zero` takes no inputs and has one output");
                }
            }
            NodeKind::AutogradAdd | NodeKind::Add => {
                if inputs != 2 || outputs != 1 || blocks != 0 {
                    self.invalid_node(node, "addition takes two inputs and has one output");
                }
            }
            NodeKind::GradOf => {
                if blocks != 1 {
                    self.invalid_node(node, "`grad_of` must own exactly one block");

                    return;
                }

                let yielded = self.graph.dfg.block(data.blocks()[0]).outputs().len();

                if inputs != outputs || outputs != yielded {
                    self.invalid_node(
                        node,
                        "`grad_of` must have as many outputs as inputs and yielded values",
                    );
                }
            }
            NodeKind::Op(_) => {}
        }
    }

    fn verify_use_lists(&mut self) {
        let graph = self.graph;

        for value in graph.dfg.values() {
            let uses = graph.dfg.uses(value);
            let consistent = uses.iter().all(|u| {
                self.expected_uses.contains(u)
                    && match *u {
                        Use::Input(node, i) => graph.dfg.node(node).input(i as usize) == value,
                        Use::Output(block, i) => {
                            graph.dfg.block(block).outputs()[i as usize] == value
                        }
                    }
            });

            if !consistent {
                self.errors.push(VerifyError::UseListMismatch {
                    value: self.value_name(value),
                });
            }

            for u in uses {
                self.expected_uses.remove(u);
            }
        }

        // anything left over is a use that no value knows about
        let mut missing: Vec<Use> = self.expected_uses.drain().collect();

        missing.sort_by_key(|u| match *u {
            Use::Input(node, i) => (0, node.index(), i),
            Use::Output(block, i) => (1, block.index(), i),
        });

        for u in missing {
            let value = match u {
                Use::Input(node, i) => graph.dfg.node(node).input(i as usize),
                Use::Output(block, i) => graph.dfg.block(block).outputs()[i as usize],
            };

            self.errors.push(VerifyError::UseListMismatch {
                value: self.value_name(value),
            });
        }
    }

    fn invalid_node(&mut self, node: Node, message: &str) {
        self.errors.push(VerifyError::InvalidNode {
            at: self.writer.node(node).to_owned(),
            message: message.to_owned(),
        });
    }

    fn invalid_block(&mut self, node: Node, message: &str) {
        self.errors.push(VerifyError::InvalidBlock {
            at: self.writer.node(node).to_owned(),
            message: message.to_owned(),
        });
    }

    fn value_name(&self, value: Value) -> String {
        match self.writer.val(value) {
            Some(name) => name.to_owned(),
            None => format!("{value:?}"),
        }
    }

    fn define(&mut self, value: Value) {
        self.defined.set(value.index(), true);
    }

    fn undefine(&mut self, value: Value) {
        self.defined.set(value.index(), false);
    }

    fn is_defined(&self, value: Value) -> bool {
        self.defined.get(value.index()).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::parse_gir;

    #[test]
    fn parsed_graphs_are_valid() {
        let graph = parse_gir(
            "graph(%x: tensor, %c: bool) {
  %z = autograd_zero
  %g = grad_of %x {
    %t = autograd_add %x, %z
    yield %t
  }
  %r = if %c : tensor {
    yield %g
  } {
    yield %z
  }
  return %r
}",
        )
        .unwrap();

        assert_eq!(verify_graph(&graph), Ok(()));
    }

    #[test]
    fn spliced_guard_bodies_are_valid() {
        let mut graph = parse_gir(
            "graph(%b: tensor(nonzero)) {
  %g = grad_of %b {
    %t = mul %b, %b : tensor
    %h = grad_of %t {
      yield %t
    }
    yield %h
  }
  return %g
}",
        )
        .unwrap();

        crate::transforms::specialize_autograd_zero(&mut graph);

        assert_eq!(verify_graph(&graph), Ok(()));
        assert_eq!(graph.nodes().count(), 2);
    }

    #[test]
    fn body_values_are_not_visible_outside() {
        let mut b = GraphBuilder::new();
        let x = b.input(Type::tensor());
        let body = b.create_block();

        b.switch_to(body);
        let t = b.append().add(x, x);
        b.set_block_outputs(body, &[t]);

        b.switch_to(b.entry_block());
        b.append().grad_of(&[x], body);
        b.ret(&[t]);

        let errors = verify_graph(&b.finish()).unwrap_err();

        assert_eq!(
            errors,
            [VerifyError::UndefinedValue {
                at: "return %2".to_owned(),
                value: "%2".to_owned(),
            }]
        );
    }

    #[test]
    fn use_before_definition() {
        let mut b = GraphBuilder::new();
        let x = b.input(Type::tensor());
        let body = b.create_block();

        // `t` is defined in a block that nothing owns
        b.switch_to(body);
        let t = b.append().add(x, x);
        b.switch_to(b.entry_block());
        let y = b.append().autograd_add(t, x);
        b.ret(&[y]);

        let errors = verify_graph(&b.finish()).unwrap_err();

        assert!(errors.iter().any(|e| matches!(
            e,
            VerifyError::UndefinedValue { at, .. } if at.contains("autograd_add")
        )));
    }

    #[test]
    fn guard_arity_is_checked() {
        let mut b = GraphBuilder::new();
        let x = b.input(Type::tensor());
        let y = b.input(Type::tensor());
        let body = b.create_block();

        b.set_block_outputs(body, &[x]);
        let guard = b.append().grad_of(&[x, y], body);
        let g = b.dfg().node(guard).output();
        b.ret(&[g]);

        let errors = verify_graph(&b.finish()).unwrap_err();

        assert_eq!(errors.len(), 1);
        assert!(matches!(&errors[0], VerifyError::InvalidNode { .. }));
        assert!(errors[0]
            .to_string()
            .contains("as many outputs as inputs"));
    }

    #[test]
    #[should_panic(expected = "graph failed verification")]
    fn verify_pass_panics_on_invalid_graph() {
        let mut b = GraphBuilder::new();
        let x = b.input(Type::tensor());
        let body = b.create_block();

        b.switch_to(body);
        let t = b.append().add(x, x);
        b.switch_to(b.entry_block());
        b.ret(&[t]);

        VerifyGraphPass.run(&mut b.finish());
    }
}
