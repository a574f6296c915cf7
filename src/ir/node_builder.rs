//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::ir::*;
use crate::utility::Str;
use smallvec::SmallVec;

/// Helper trait that allows easy creation of node builders. This trait
/// provides a variety of helper methods that build nodes and inserts them
/// in whatever way the trait implementor defines.
///
/// This is used for the append and insert builders.
pub trait NodeBuilder: Sized {
    /// Gets the data-flow graph in use for the inserter
    fn dfg(&self) -> &DataFlowGraph;

    /// "Builds" a single node and inserts it in whatever way
    /// the particular [`NodeBuilder`] sees fit.
    fn build(self, kind: NodeKind, inputs: &[Value], outputs: &[Type], blocks: &[Block]) -> Node;

    /// Builds a node and returns both it and its first output.
    fn build_result(self, kind: NodeKind, inputs: &[Value], output: Type) -> (Node, Value);

    /// Builds an `autograd_zero` node
    fn autograd_zero(self) -> Value {
        self.build_result(NodeKind::AutogradZero, &[], Type::tensor())
            .1
    }

    /// Builds an `autograd_add` node
    fn autograd_add(self, lhs: Value, rhs: Value) -> Value {
        self.build_result(NodeKind::AutogradAdd, &[lhs, rhs], Type::tensor())
            .1
    }

    /// Builds a plain `add` node.
    fn add(self, lhs: Value, rhs: Value) -> Value {
        debug_assert!(self.dfg().ty(lhs).is_tensor());
        debug_assert!(self.dfg().ty(rhs).is_tensor());

        self.build_result(NodeKind::Add, &[lhs, rhs], Type::tensor())
            .1
    }

    /// Builds an opaque node with a given opcode, one output per type in `outputs`.
    fn op(self, opcode: Str, inputs: &[Value], outputs: &[Type]) -> Node {
        self.build(NodeKind::Op(opcode), inputs, outputs, &[])
    }

    /// Builds a `grad_of` node that owns `body`. The node has one output for
    /// every output of `body`, with matching types.
    fn grad_of(self, inputs: &[Value], body: Block) -> Node {
        let dfg = self.dfg();

        debug_assert!(dfg.block(body).owner().is_none(), "body is already owned");
        debug_assert!(dfg.block(body).params().is_empty(), "body cannot have params");

        let tys: SmallVec<[Type; 4]> = dfg
            .block(body)
            .outputs()
            .iter()
            .map(|&v| dfg.ty(v))
            .collect();

        self.build(NodeKind::GradOf, inputs, &tys, &[body])
    }
}

/// Helper type that appends to a block. Implements the [`NodeBuilder`]
/// trait to allow easy node creation.
pub struct AppendBuilder<'g> {
    graph: &'g mut Graph,
    block: Block,
}

impl<'g> AppendBuilder<'g> {
    pub(in crate::ir) fn new(graph: &'g mut Graph, block: Block) -> Self {
        Self { graph, block }
    }
}

impl<'g> NodeBuilder for AppendBuilder<'g> {
    fn dfg(&self) -> &DataFlowGraph {
        &self.graph.dfg
    }

    fn build(self, kind: NodeKind, inputs: &[Value], outputs: &[Type], blocks: &[Block]) -> Node {
        let node = self.graph.dfg.create_node(kind, inputs, outputs, blocks);

        self.graph.layout.append_node(node, self.block);

        node
    }

    fn build_result(self, kind: NodeKind, inputs: &[Value], output: Type) -> (Node, Value) {
        let graph = &mut *self.graph;
        let node = graph.dfg.create_node(kind, inputs, &[output], &[]);

        graph.layout.append_node(node, self.block);

        (node, graph.dfg.node(node).output())
    }
}

/// Where an [`InsertBuilder`] puts the nodes it builds.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum InsertPoint {
    /// Directly before a node, in the same block.
    Before(Node),
    /// Directly after a node, in the same block.
    After(Node),
}

/// Helper type that inserts next to an existing node. Implements the
/// [`NodeBuilder`] trait to allow easy node creation.
pub struct InsertBuilder<'g> {
    graph: &'g mut Graph,
    at: InsertPoint,
}

impl<'g> InsertBuilder<'g> {
    pub(in crate::ir) fn new(graph: &'g mut Graph, at: InsertPoint) -> Self {
        Self { graph, at }
    }

    fn place(&mut self, node: Node) {
        match self.at {
            InsertPoint::Before(before) => self.graph.layout.insert_node_before(node, before),
            InsertPoint::After(after) => self.graph.layout.insert_node_after(node, after),
        }
    }
}

impl<'g> NodeBuilder for InsertBuilder<'g> {
    fn dfg(&self) -> &DataFlowGraph {
        &self.graph.dfg
    }

    fn build(mut self, kind: NodeKind, inputs: &[Value], outputs: &[Type], blocks: &[Block]) -> Node {
        let node = self.graph.dfg.create_node(kind, inputs, outputs, blocks);

        self.place(node);

        node
    }

    fn build_result(mut self, kind: NodeKind, inputs: &[Value], output: Type) -> (Node, Value) {
        let node = self.graph.dfg.create_node(kind, inputs, &[output], &[]);

        self.place(node);

        (node, self.graph.dfg.node(node).output())
    }
}

#[cfg(test)]
mod tests {
    use crate::ir::*;

    #[test]
    fn grad_of_outputs_follow_body() {
        let mut b = GraphBuilder::new();
        let x = b.input(Type::zero_tensor());
        let n = b.input(Type::Int);
        let body = b.create_block();

        b.set_block_outputs(body, &[x, n]);

        let guard = b.append().grad_of(&[x], body);
        let outputs = b.dfg().node(guard).outputs().to_vec();

        assert_eq!(outputs.len(), 2);
        assert_eq!(b.dfg().ty(outputs[0]), Type::zero_tensor());
        assert_eq!(b.dfg().ty(outputs[1]), Type::Int);
        assert_eq!(b.dfg().block(body).owner(), Some(guard));
    }

    #[test]
    fn op_has_requested_outputs() {
        let mut b = GraphBuilder::new();
        let x = b.input(Type::tensor());
        let mul = b.intern("mul");
        let node = b.append().op(mul, &[x, x], &[Type::tensor(), Type::Bool]);

        assert_eq!(b.dfg().kind(node), NodeKind::Op(mul));
        assert_eq!(b.dfg().node(node).outputs().len(), 2);
        assert_eq!(b.dfg().uses(x).len(), 2);
    }
}
