//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::analysis::{ZeroState, ZeroStateMap};
use crate::ir::*;
use crate::pass::GraphTransformPass;
use log::{debug, trace};
use smallvec::SmallVec;

/// Specializes a gradient graph using what is statically known about
/// which values are autograd zeros.
///
/// Every `autograd_add` whose result can be decided statically is replaced,
/// either by one of its operands (when the other is zero) or by a plain `add`
/// (when neither is). Every `grad_of` is removed: guards whose inputs are all
/// zero become a single `autograd_zero`, and every other guard has its body
/// moved into the enclosing block.
pub struct SpecializeAutogradZeroPass;

impl GraphTransformPass for SpecializeAutogradZeroPass {
    fn run(&mut self, graph: &mut Graph) -> bool {
        specialize_autograd_zero(graph).stats.changed()
    }
}

/// Counts of each rewrite performed by [`specialize_autograd_zero`].
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct SpecializeStats {
    /// `grad_of` nodes whose inputs were all zero
    pub zeroed_guards: usize,
    /// `grad_of` nodes whose bodies were moved out of the guard
    pub spliced_guards: usize,
    /// `autograd_add` nodes replaced by one of their operands
    pub absorbed_adds: usize,
    /// `autograd_add` nodes replaced by a plain `add`
    pub resolved_adds: usize,
}

impl SpecializeStats {
    /// Checks if any rewrite was performed.
    pub fn changed(&self) -> bool {
        self.zeroed_guards + self.spliced_guards + self.absorbed_adds + self.resolved_adds != 0
    }
}

/// The result of running [`specialize_autograd_zero`].
#[derive(Debug, Clone)]
pub struct Specialized {
    /// The zero state that every visited value ended up with.
    pub states: ZeroStateMap,
    /// What was rewritten.
    pub stats: SpecializeStats,
}

/// Runs the specialization over `graph`, see [`SpecializeAutogradZeroPass`].
///
/// The graph's inputs are seeded with [`ZeroStateMap::seed`], and then every
/// top-level node is visited once, in order. Blocks owned by opaque nodes are
/// not looked into, and neither are the bodies of guards: the nodes of a
/// spliced body end up before the guard, so they are never visited.
///
/// Panics if a `grad_of` node is reached while one of its inputs has an
/// [`ZeroState::Unknown`] state. Guards are only ever built out of values
/// whose zero-ness is tracked, so this means the graph was built incorrectly.
pub fn specialize_autograd_zero(graph: &mut Graph) -> Specialized {
    let mut states = ZeroStateMap::seed(graph);
    let mut stats = SpecializeStats::default();
    let entry = graph.entry_block();
    let mut cursor = GraphCursor::over(graph);

    cursor.goto_before(entry);
    specialize_block(&mut cursor, &mut states, &mut stats);

    debug!(
        "specialize-autograd-zero: {} guards zeroed, {} guards spliced, {} adds absorbed, {} adds resolved",
        stats.zeroed_guards, stats.spliced_guards, stats.absorbed_adds, stats.resolved_adds
    );

    Specialized { states, stats }
}

// visits every node after the cursor's position in the current block
fn specialize_block(
    cursor: &mut GraphCursor<'_>,
    states: &mut ZeroStateMap,
    stats: &mut SpecializeStats,
) {
    while let Some(node) = cursor.next_node() {
        match cursor.dfg().kind(node) {
            NodeKind::AutogradZero => {
                let output = cursor.dfg().node(node).output();

                states.set(output, ZeroState::Zero);
            }
            NodeKind::GradOf => specialize_grad_of(cursor, states, stats, node),
            NodeKind::AutogradAdd => specialize_autograd_add(cursor, states, stats, node),
            NodeKind::Add | NodeKind::Op(_) => {
                for &output in cursor.dfg().node(node).outputs() {
                    states.set(output, ZeroState::Unknown);
                }
            }
        }
    }
}

fn specialize_grad_of(
    cursor: &mut GraphCursor<'_>,
    states: &mut ZeroStateMap,
    stats: &mut SpecializeStats,
    node: Node,
) {
    let data = cursor.dfg().node(node);
    let outputs: SmallVec<[Value; 4]> = SmallVec::from_slice(data.outputs());
    let body = data.blocks()[0];
    let mut all_zero = true;

    for &input in data.inputs() {
        match states.get(input) {
            ZeroState::Zero => {}
            ZeroState::Nonzero => all_zero = false,
            ZeroState::Unknown => {
                panic!("grad_of node {node:?} has input {input:?} with an unknown zero state")
            }
        }
    }

    if all_zero {
        let zero = cursor.ins_after().autograd_zero();

        for output in outputs {
            cursor.graph_mut().replace_all_uses_with(output, zero);
        }

        states.set(zero, ZeroState::Zero);
        cursor.remove_node();

        // skip over the new zero, it's already been handled
        if let ValueDef::Result(zero_node, _) = cursor.dfg().value_def(zero) {
            cursor.goto_node(zero_node);
        }

        trace!("zeroed grad_of {node:?}, outputs replaced with {zero:?}");
        stats.zeroed_guards += 1;

        return;
    }

    let body_nodes: SmallVec<[Node; 8]> = cursor.layout().nodes_in_block(body).collect();
    let yielded: SmallVec<[Value; 4]> =
        SmallVec::from_slice(cursor.dfg().block(body).outputs());

    // moved nodes are never visited, anything they compute is treated as a
    // real gradient. nested guards and `autograd_add`s are left as-is
    for &moved in body_nodes.iter() {
        for &output in cursor.dfg().node(moved).outputs() {
            states.set(output, ZeroState::Nonzero);
        }
    }

    cursor.graph_mut().splice_block_before(body, node);

    for (&output, &value) in outputs.iter().zip(yielded.iter()) {
        cursor.graph_mut().replace_all_uses_with(output, value);
    }

    // leaves the cursor on the last node that was spliced in, so the
    // next node visited is the one that originally followed the guard
    cursor.remove_node();

    trace!(
        "spliced grad_of {node:?}, {} nodes moved out of its body",
        body_nodes.len()
    );
    stats.spliced_guards += 1;
}

fn specialize_autograd_add(
    cursor: &mut GraphCursor<'_>,
    states: &mut ZeroStateMap,
    stats: &mut SpecializeStats,
    node: Node,
) {
    let data = cursor.dfg().node(node);
    let (lhs, rhs) = (data.input(0), data.input(1));
    let output = data.output();

    let replacement = match (states.get(lhs), states.get(rhs)) {
        (ZeroState::Zero, _) => rhs,
        (_, ZeroState::Zero) => lhs,
        (ZeroState::Nonzero, ZeroState::Nonzero) => {
            let sum = cursor.ins().add(lhs, rhs);

            states.set(sum, ZeroState::Nonzero);
            cursor.graph_mut().replace_all_uses_with(output, sum);
            cursor.remove_node();

            trace!("resolved autograd_add {node:?} into plain add {sum:?}");
            stats.resolved_adds += 1;

            return;
        }
        _ => {
            states.set(output, ZeroState::Unknown);

            return;
        }
    };

    cursor.graph_mut().replace_all_uses_with(output, replacement);
    cursor.remove_node();

    trace!("absorbed autograd_add {node:?} into {replacement:?}");
    stats.absorbed_adds += 1;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::stringify_graph;
    use crate::reader::parse_gir;
    use crate::transforms::verify_graph_panic;

    fn specialize(source: &str) -> (Graph, Specialized) {
        let mut graph = parse_gir(source).unwrap();
        let result = specialize_autograd_zero(&mut graph);

        verify_graph_panic(&graph);

        (graph, result)
    }

    fn named(graph: &Graph, name: &str) -> Value {
        graph
            .dfg
            .values()
            .find(|&v| graph.dfg.name(v) == Some(name))
            .unwrap()
    }

    #[test]
    fn add_of_zero_returns_other_operand() {
        let (graph, result) = specialize(
            "graph(%x: tensor(nonzero)) {
  %z = autograd_zero
  %y = autograd_add %x, %z
  return %y
}",
        );

        assert_eq!(graph.outputs(), &[named(&graph, "x")]);
        assert_eq!(result.stats.absorbed_adds, 1);
        assert_eq!(
            stringify_graph(&graph),
            "graph(%x: tensor(nonzero)) {
  %z = autograd_zero
  return %x
}
"
        );
    }

    #[test]
    fn zero_lhs_is_absorbed_by_identity() {
        let (graph, _) = specialize(
            "graph(%x: tensor(zero), %w: int) {
  %u = foo %w : tensor
  %y = autograd_add %x, %u
  %r = mul %y, %y : tensor
  return %r
}",
        );

        let u = named(&graph, "u");
        let mul = graph.nodes().last().unwrap();

        assert_eq!(graph.dfg.node(mul).inputs(), &[u, u]);
    }

    #[test]
    fn nonzero_operands_become_plain_add() {
        let (graph, result) = specialize(
            "graph(%x: tensor, %y: tensor(nonzero)) {
  %s = autograd_add %x, %y
  %t = mul %s, %x : tensor
  return %s, %t
}",
        );

        let add = graph.nodes().next().unwrap();
        let sum = graph.dfg.node(add).output();

        assert_eq!(graph.dfg.kind(add), NodeKind::Add);
        assert_eq!(result.states.get(sum), ZeroState::Nonzero);
        assert_eq!(graph.outputs()[0], sum);
        assert_eq!(result.stats.resolved_adds, 1);
        assert_eq!(
            stringify_graph(&graph),
            "graph(%x: tensor, %y: tensor(nonzero)) {
  %0 = add %x, %y
  %t = mul %0, %x : tensor
  return %0, %t
}
"
        );
    }

    #[test]
    fn unknown_operand_keeps_autograd_add() {
        let source = "graph(%x: tensor, %n: int) {
  %u = foo %n : tensor
  %y = autograd_add %x, %u
  %v = autograd_add %u, %u
  return %y, %v
}
";
        let (graph, result) = specialize(source);
        let nodes: Vec<Node> = graph.nodes().collect();

        assert_eq!(stringify_graph(&graph), source);
        assert!(!result.stats.changed());
        assert_eq!(
            graph.dfg.node(nodes[1]).inputs(),
            &[named(&graph, "x"), named(&graph, "u")]
        );
        assert_eq!(result.states.get(named(&graph, "y")), ZeroState::Unknown);
        assert_eq!(result.states.get(named(&graph, "v")), ZeroState::Unknown);
    }

    #[test]
    fn all_zero_guard_becomes_single_zero() {
        let (graph, result) = specialize(
            "graph(%a: tensor(zero), %b: tensor(zero)) {
  %g0, %g1 = grad_of %a, %b {
    %t = mul %a, %b : tensor
    yield %t, %t
  }
  %s = mul %g0, %g1 : tensor
  return %s, %g1
}",
        );

        let zero = graph.outputs()[1];

        assert_eq!(result.states.get(zero), ZeroState::Zero);
        assert_eq!(result.stats.zeroed_guards, 1);
        assert_eq!(graph.dfg.uses(zero).len(), 3);
        assert_eq!(
            stringify_graph(&graph),
            "graph(%a: tensor(zero), %b: tensor(zero)) {
  %0 = autograd_zero
  %s = mul %0, %0 : tensor
  return %s, %0
}
"
        );
    }

    #[test]
    fn mixed_guard_is_spliced_in_order() {
        let (graph, result) = specialize(
            "graph(%a: tensor(zero), %b: tensor) {
  %before = sum %b : tensor
  %g0, %g1 = grad_of %a, %b {
    %t = autograd_add %a, %b
    %u = mul %t, %b : tensor
    %w = neg %u : tensor
    yield %w, %t
  }
  %s = autograd_add %g0, %g1
  return %s
}",
        );

        assert_eq!(result.stats.spliced_guards, 1);
        assert_eq!(result.stats.absorbed_adds, 0);
        assert_eq!(result.stats.resolved_adds, 1);
        assert_eq!(result.states.get(named(&graph, "w")), ZeroState::Nonzero);
        assert_eq!(result.states.get(named(&graph, "u")), ZeroState::Nonzero);
        assert_eq!(result.states.get(named(&graph, "t")), ZeroState::Nonzero);
        assert_eq!(
            stringify_graph(&graph),
            "graph(%a: tensor(zero), %b: tensor) {
  %before = sum %b : tensor
  %t = autograd_add %a, %b
  %u = mul %t, %b : tensor
  %w = neg %u : tensor
  %0 = add %w, %t
  return %0
}
"
        );
    }

    #[test]
    fn nested_guards_are_moved_unchanged() {
        let (graph, result) = specialize(
            "graph(%a: tensor(zero), %b: tensor(nonzero)) {
  %g = grad_of %b {
    %h = grad_of %a {
      %t = mul %a, %a : tensor
      yield %t
    }
    %s = autograd_add %h, %b
    yield %s
  }
  return %g
}",
        );

        assert_eq!(result.stats.spliced_guards, 1);
        assert_eq!(result.stats.zeroed_guards, 0);
        assert_eq!(result.stats.absorbed_adds, 0);
        assert_eq!(result.states.try_get(named(&graph, "t")), None);
        assert_eq!(
            stringify_graph(&graph),
            "graph(%a: tensor(zero), %b: tensor(nonzero)) {
  %h = grad_of %a {
    %t = mul %a, %a : tensor
    yield %t
  }
  %s = autograd_add %h, %b
  return %s
}
"
        );
    }

    #[test]
    fn guard_body_is_moved_without_being_visited() {
        let source = "graph(%b: tensor(nonzero)) {
  %g = grad_of %b {
    %t = mul %b, %b : tensor
    %h = grad_of %t {
      yield %t
    }
    %s = autograd_add %t, %h
    yield %s
  }
  %r = autograd_add %g, %b
  return %r
}";
        let (graph, result) = specialize(source);

        for name in ["t", "h", "s"] {
            assert_eq!(result.states.get(named(&graph, name)), ZeroState::Nonzero);
        }

        assert_eq!(result.stats.spliced_guards, 1);
        assert_eq!(result.stats.resolved_adds, 1);
        assert_eq!(result.stats.absorbed_adds, 0);
        assert_eq!(
            stringify_graph(&graph),
            "graph(%b: tensor(nonzero)) {
  %t = mul %b, %b : tensor
  %h = grad_of %t {
    yield %t
  }
  %s = autograd_add %t, %h
  %0 = add %s, %b
  return %0
}
"
        );
    }

    #[test]
    fn opaque_blocks_are_left_alone() {
        let source = "graph(%c: bool, %x: tensor(zero)) {
  %r = if %c : tensor {
    %z = autograd_zero
    %y = autograd_add %x, %z
    yield %y
  } {
    yield %x
  }
  return %r
}
";
        let (graph, result) = specialize(source);

        assert_eq!(stringify_graph(&graph), source);
        assert_eq!(result.states.get(named(&graph, "r")), ZeroState::Unknown);
        assert_eq!(result.states.try_get(named(&graph, "y")), None);
    }

    #[test]
    fn second_run_changes_nothing() {
        let mut graph = parse_gir(
            "graph(%a: tensor(zero), %b: tensor, %n: int) {
  %z = autograd_zero
  %p = autograd_add %b, %z
  %u = foo %n : tensor
  %q = autograd_add %p, %u
  %g0, %g1 = grad_of %a, %p {
    %t = neg %p : tensor
    %m = mul %t, %u : tensor
    yield %m, %t
  }
  %k0 = grad_of %a {
    yield %a
  }
  %r = autograd_add %g0, %g1
  %s = autograd_add %r, %k0
  return %q, %s
}",
        )
        .unwrap();

        let first = specialize_autograd_zero(&mut graph);
        let text = stringify_graph(&graph);
        let second = specialize_autograd_zero(&mut graph);

        assert!(first.stats.changed());
        assert!(!second.stats.changed());
        assert_eq!(stringify_graph(&graph), text);
    }

    #[test]
    #[should_panic(expected = "with an unknown zero state")]
    fn guard_with_unknown_input_panics() {
        let mut graph = parse_gir(
            "graph(%n: int) {
  %g = grad_of %n {
    yield %n
  }
  return %g
}",
        )
        .unwrap();

        specialize_autograd_zero(&mut graph);
    }

    #[test]
    fn pass_reports_changes() {
        let mut graph = parse_gir(
            "graph(%x: tensor, %y: tensor) {
  %s = autograd_add %x, %y
  return %s
}",
        )
        .unwrap();

        assert!(SpecializeAutogradZeroPass.run(&mut graph));
        assert!(!SpecializeAutogradZeroPass.run(&mut graph));
    }
}
