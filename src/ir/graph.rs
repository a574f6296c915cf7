//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::ir::{Block, DataFlowGraph, Layout, Node, Type, Value};
use smallvec::SmallVec;

#[cfg(feature = "enable-serde")]
use serde::{Deserialize, Serialize};

/// A single gradient graph.
///
/// A graph is an entry block (whose parameters are the graph's inputs and whose
/// outputs are the graph's outputs) plus every node reachable from it, either
/// directly or through the blocks owned by other nodes.
///
/// The two halves are public so that analyses can borrow them separately,
/// but the mutating primitives here should be preferred over changing
/// the layout directly, since they keep both halves consistent.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub struct Graph {
    /// Every entity in the graph and the data-flow between them.
    pub dfg: DataFlowGraph,
    /// The order of the nodes in each block.
    pub layout: Layout,
    entry: Block,
}

impl Graph {
    /// Creates a graph with no inputs, outputs or nodes.
    pub fn new() -> Self {
        let mut dfg = DataFlowGraph::new();
        let mut layout = Layout::new();
        let entry = dfg.create_block();

        layout.insert_block(entry);

        Self { dfg, layout, entry }
    }

    /// Gets the top-level block of the graph.
    #[inline]
    pub fn entry_block(&self) -> Block {
        self.entry
    }

    /// Gets the inputs to the graph, in order.
    #[inline]
    pub fn inputs(&self) -> &[Value] {
        self.dfg.block(self.entry).params()
    }

    /// Gets the outputs of the graph, in order.
    #[inline]
    pub fn outputs(&self) -> &[Value] {
        self.dfg.block(self.entry).outputs()
    }

    /// Adds an input of type `ty` to the graph.
    pub fn add_input(&mut self, ty: Type) -> Value {
        self.dfg.append_block_param(self.entry, ty)
    }

    /// Replaces the outputs of the graph.
    pub fn set_outputs(&mut self, outputs: &[Value]) {
        self.dfg.set_block_outputs(self.entry, outputs);
    }

    /// Creates an empty block and inserts it into the layout. The block is
    /// expected to be given to a node that will own it.
    pub fn create_block(&mut self) -> Block {
        let block = self.dfg.create_block();

        self.layout.insert_block(block);

        block
    }

    /// Iterates over the top-level nodes of the graph, in order.
    pub fn nodes(&self) -> impl Iterator<Item = Node> + '_ {
        self.layout.nodes_in_block(self.entry)
    }

    /// Makes every use of `old` into a use of `new`.
    pub fn replace_all_uses_with(&mut self, old: Value, new: Value) {
        self.dfg.replace_all_uses_with(old, new);
    }

    /// Moves `node` (which can be in any block) so that it's directly
    /// before `before`.
    pub fn move_node_before(&mut self, node: Node, before: Node) {
        debug_assert_ne!(node, before, "cannot move node before itself");

        self.layout.remove_node(node);
        self.layout.insert_node_before(node, before);
    }

    /// Moves every node in `block` so that they are directly before `before`,
    /// keeping their relative order. `block` is empty afterwards.
    pub fn splice_block_before(&mut self, block: Block, before: Node) {
        let nodes: SmallVec<[Node; 8]> = self.layout.nodes_in_block(block).collect();

        for node in nodes {
            self.move_node_before(node, before);
        }
    }

    /// Removes a node from the graph entirely.
    ///
    /// Every output of `node` must already be unused. Any blocks the node owns
    /// are destroyed with it (including everything nested inside of them),
    /// and the node stops being a use of its inputs.
    pub fn destroy_node(&mut self, node: Node) {
        assert!(
            self.dfg
                .node(node)
                .outputs()
                .iter()
                .all(|&output| !self.dfg.has_uses(output)),
            "cannot destroy node whose outputs are still used"
        );

        let blocks: SmallVec<[Block; 1]> = SmallVec::from_slice(self.dfg.node(node).blocks());

        for block in blocks {
            self.destroy_block(block);
        }

        self.dfg.release_node_inputs(node);
        self.layout.remove_node(node);
    }

    /// Checks if a node is still part of the graph.
    #[inline]
    pub fn contains_node(&self, node: Node) -> bool {
        self.layout.is_node_inserted(node)
    }

    fn destroy_block(&mut self, block: Block) {
        self.dfg.clear_block_outputs(block);

        // later nodes can only use earlier ones, so going backwards
        // means every node is dead by the time it's destroyed
        while let Some(last) = self.layout.block_last_node(block) {
            self.destroy_node(last);
        }

        self.layout.remove_block(block);
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::*;

    #[test]
    fn inputs_and_outputs_are_entry_block() {
        let mut graph = Graph::new();
        let x = graph.add_input(Type::tensor());
        let n = graph.add_input(Type::Int);

        graph.set_outputs(&[x]);

        assert_eq!(graph.inputs(), &[x, n]);
        assert_eq!(graph.outputs(), &[x]);
        assert_eq!(graph.dfg.uses(x), &[Use::Output(graph.entry_block(), 0)]);
    }

    #[test]
    fn splice_keeps_order() {
        let mut b = GraphBuilder::new();
        let x = b.input(Type::tensor());
        let body = b.create_block();

        b.switch_to(body);
        let t0 = b.append().autograd_add(x, x);
        let t1 = b.append().add(t0, x);
        b.set_block_outputs(body, &[t1]);

        b.switch_to(b.entry_block());
        let guard = b.append().grad_of(&[x], body);
        let out = b.dfg().node(guard).output();
        b.ret(&[out]);
        let mut graph = b.finish();

        graph.splice_block_before(body, guard);

        let kinds: Vec<_> = graph.nodes().map(|n| graph.dfg.kind(n)).collect();

        assert_eq!(
            kinds,
            [NodeKind::AutogradAdd, NodeKind::Add, NodeKind::GradOf]
        );
        assert_eq!(graph.layout.nodes_in_block(body).next(), None);
    }

    #[test]
    fn destroy_node_releases_everything() {
        let mut b = GraphBuilder::new();
        let x = b.input(Type::tensor());
        let body = b.create_block();

        b.switch_to(body);
        let t0 = b.append().autograd_zero();
        let t1 = b.append().autograd_add(t0, x);
        b.set_block_outputs(body, &[t1]);

        b.switch_to(b.entry_block());
        let guard = b.append().grad_of(&[x], body);
        b.ret(&[x]);
        let mut graph = b.finish();

        graph.destroy_node(guard);

        assert_eq!(graph.nodes().count(), 0);
        assert_eq!(graph.layout.len_nodes(), 0);
        assert!(!graph.layout.is_block_inserted(body));
        assert!(!graph.contains_node(guard));
        assert_eq!(graph.dfg.uses(x), &[Use::Output(graph.entry_block(), 0)]);
        assert!(!graph.dfg.has_uses(t0));
    }

    #[test]
    #[should_panic(expected = "cannot destroy node whose outputs are still used")]
    fn destroy_live_node_panics() {
        let mut b = GraphBuilder::new();
        let zero = b.append().autograd_zero();
        b.ret(&[zero]);
        let mut graph = b.finish();
        let node = graph.nodes().next().unwrap();

        graph.destroy_node(node);
    }
}
