//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::arena::SecondaryMap;
use crate::ir::*;
use crate::utility::SaHashSet;
use std::ops::Range;

/// A simple graph -> text pass that turns an entire graph into the
/// textual `.gir` format, and then maps each node to the range of text
/// referring to it.
///
/// Named values keep their names. If two values share a name, later ones
/// get a `.N` suffix. Unnamed values are numbered in definition order,
/// skipping any number that is already used as a name.
#[derive(Debug, Clone)]
pub struct GraphWriter {
    whole: String,
    names: SecondaryMap<Value, String>,
    node_ranges: SecondaryMap<Node, Range<usize>>,
}

impl GraphWriter {
    /// Writes out the graph.
    pub fn from(graph: &Graph) -> Self {
        let mut writer_impl = WriterImpl {
            graph,
            state: GraphWriter {
                whole: String::default(),
                names: SecondaryMap::default(),
                node_ranges: SecondaryMap::default(),
            },
            reserved: SaHashSet::default(),
            taken: SaHashSet::default(),
            next: 0,
        };

        writer_impl.walk();

        writer_impl.state
    }

    /// Provides the name of a value (the `%_` syntax), if the value
    /// appears in the graph.
    pub fn val(&self, value: Value) -> Option<&str> {
        self.names.get(value).map(String::as_str)
    }

    /// Stringifies an entire node. This includes the results and any
    /// nested blocks.
    pub fn node(&self, node: Node) -> &str {
        &self.whole[self.node_ranges[node].clone()]
    }

    /// Returns the entire graph as a string.
    pub fn graph(&self) -> &str {
        &self.whole
    }
}

/// Stringifies an entire graph.
pub fn stringify_graph(graph: &Graph) -> String {
    GraphWriter::from(graph).whole
}

/// Prints an entire graph to `stdout`.
pub fn print_graph(graph: &Graph) {
    print!("{}", GraphWriter::from(graph).graph());
}

struct WriterImpl<'g> {
    graph: &'g Graph,
    state: GraphWriter,
    reserved: SaHashSet<String>,
    taken: SaHashSet<String>,
    next: u32,
}

impl<'g> WriterImpl<'g> {
    fn walk(&mut self) {
        let graph = self.graph;
        let entry = graph.entry_block();

        self.reserve(entry);
        self.state.whole += "graph(";

        let mut it = graph.inputs().iter().copied().peekable();

        while let Some(input) = it.next() {
            let name = self.name(input);
            let ty = graph.dfg.ty(input);

            self.state.whole += &format!("{name}: {ty}");

            if it.peek().is_some() {
                self.state.whole += ", ";
            }
        }

        self.state.whole += ") {\n";
        self.block(entry, 1, "return");
        self.state.whole += "}\n";
    }

    // every name that appears anywhere in the graph is reserved up front,
    // so generated names can't collide with one that's printed later
    fn reserve(&mut self, block: Block) {
        let graph = self.graph;

        for &param in graph.dfg.block(block).params() {
            self.reserve_value(param);
        }

        for node in graph.layout.nodes_in_block(block) {
            let data = graph.dfg.node(node);

            for &output in data.outputs() {
                self.reserve_value(output);
            }

            for &inner in data.blocks() {
                self.reserve(inner);
            }
        }
    }

    fn reserve_value(&mut self, value: Value) {
        if let Some(name) = self.graph.dfg.name(value) {
            self.reserved.insert(name.to_owned());
        }
    }

    fn block(&mut self, block: Block, depth: usize, terminator: &str) {
        let graph = self.graph;

        for node in graph.layout.nodes_in_block(block) {
            self.node(node, depth);
        }

        self.indent(depth);
        self.state.whole += terminator;

        let outputs = graph.dfg.block(block).outputs();

        if !outputs.is_empty() {
            let list = self.list(outputs);

            self.state.whole += " ";
            self.state.whole += &list;
        }

        self.state.whole += "\n";
    }

    fn node(&mut self, node: Node, depth: usize) {
        let graph = self.graph;
        let data = graph.dfg.node(node);

        self.indent(depth);

        let begin = self.state.whole.len();

        if !data.outputs().is_empty() {
            let results = self.list(data.outputs());

            self.state.whole += &format!("{results} = ");
        }

        self.state.whole += data.kind().name(graph.dfg.strings());

        if !data.inputs().is_empty() {
            let args = self.list(data.inputs());

            self.state.whole += &format!(" {args}");
        }

        // builtins have fixed result types, only opaque ops spell theirs out
        if data.kind().is_opaque() && !data.outputs().is_empty() {
            let tys: Vec<String> = data
                .outputs()
                .iter()
                .map(|&output| graph.dfg.ty(output).to_string())
                .collect();

            self.state.whole += &format!(" : {}", tys.join(", "));
        }

        for &inner in data.blocks() {
            self.state.whole += " {\n";
            self.block(inner, depth + 1, "yield");
            self.indent(depth);
            self.state.whole += "}";
        }

        let end = self.state.whole.len();

        self.state.node_ranges.insert(node, begin..end);
        self.state.whole += "\n";
    }

    fn list(&mut self, values: &[Value]) -> String {
        let names: Vec<String> = values.iter().map(|&value| self.name(value)).collect();

        names.join(", ")
    }

    fn indent(&mut self, depth: usize) {
        for _ in 0..depth {
            self.state.whole += "  ";
        }
    }

    fn name(&mut self, value: Value) -> String {
        if let Some(name) = self.state.names.get(value) {
            return name.clone();
        }

        let graph = self.graph;
        let name = match graph.dfg.name(value) {
            Some(name) if !self.taken.contains(name) => name.to_owned(),
            Some(name) => {
                let mut suffix = 1;

                loop {
                    let candidate = format!("{name}.{suffix}");

                    if self.is_available(&candidate) {
                        break candidate;
                    }

                    suffix += 1;
                }
            }
            None => loop {
                let candidate = self.next.to_string();

                self.next += 1;

                if self.is_available(&candidate) {
                    break candidate;
                }
            },
        };

        let full = format!("%{name}");

        self.taken.insert(name);
        self.state.names.insert(value, full.clone());

        full
    }

    fn is_available(&self, name: &str) -> bool {
        !self.reserved.contains(name) && !self.taken.contains(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unnamed_values_are_numbered() {
        let mut b = GraphBuilder::new();
        let x = b.input(Type::nonzero_tensor());
        let zero = b.append().autograd_zero();
        let y = b.append().autograd_add(x, zero);
        b.ret(&[y]);

        let graph = b.finish();

        assert_eq!(
            stringify_graph(&graph),
            "graph(%0: tensor(nonzero)) {
  %1 = autograd_zero
  %2 = autograd_add %0, %1
  return %2
}
"
        );
    }

    #[test]
    fn numbers_skip_reserved_names() {
        let mut b = GraphBuilder::new();
        let x = b.input(Type::tensor());
        let y = b.append().add(x, x);
        b.set_name(y, "0");
        b.ret(&[y]);

        let graph = b.finish();

        assert_eq!(
            stringify_graph(&graph),
            "graph(%1: tensor) {
  %0 = add %1, %1
  return %0
}
"
        );
    }

    #[test]
    fn duplicate_names_get_suffixes() {
        let mut b = GraphBuilder::new();
        let x = b.input(Type::tensor());
        let y = b.append().add(x, x);
        b.set_name(x, "a");
        b.set_name(y, "a");
        b.ret(&[y]);

        let graph = b.finish();

        assert_eq!(
            stringify_graph(&graph),
            "graph(%a: tensor) {
  %a.1 = add %a, %a
  return %a.1
}
"
        );
    }

    #[test]
    fn nested_blocks_and_opaque_types() {
        let mut b = GraphBuilder::new();
        let x = b.input(Type::tensor());
        let n = b.input(Type::Int);
        let mul = b.intern("mul");
        let print = b.intern("print");
        let body = b.create_block();

        b.switch_to(body);
        let node = b.append().op(mul, &[x, n], &[Type::tensor()]);
        let t = b.dfg().node(node).output();
        b.set_block_outputs(body, &[t]);

        b.switch_to(b.entry_block());
        let guard = b.append().grad_of(&[x], body);
        let g = b.dfg().node(guard).output();
        b.append().op(print, &[g], &[]);
        b.ret(&[g]);

        let graph = b.finish();
        let writer = GraphWriter::from(&graph);

        assert_eq!(
            writer.graph(),
            "graph(%0: tensor, %1: int) {
  %2 = grad_of %0 {
    %3 = mul %0, %1 : tensor
    yield %3
  }
  print %2
  return %2
}
"
        );
        assert_eq!(writer.node(node), "%3 = mul %0, %1 : tensor");
        assert_eq!(writer.val(g), Some("%2"));
    }
}
