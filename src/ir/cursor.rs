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

/// Models the position that the cursor is "pointing at."
///
/// A cursor can be pointing at some block (either before the first node
/// in the block or after the last), at a specific node in a specific block,
/// or pointing at nothing.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Ord, PartialOrd, Hash)]
pub enum CursorPos {
    /// Pointing at nothing.
    Nothing,
    /// Pointing "before" the first node in a given block.
    ///
    /// ```none
    /// graph(%x: tensor) {
    ///   ; <-- here
    ///   %0 = autograd_zero
    ///   %1 = autograd_add %x, %0
    ///   ; ...
    /// ```
    Before(Block),
    /// Pointing at a specific node in a given block.
    ///
    /// ```none
    /// graph(%x: tensor) {
    ///   %0 = autograd_zero ; <-- here
    ///   %1 = autograd_add %x, %0
    ///   ; ...
    /// ```
    At(Block, Node),
    /// Pointing at the end of a specific block.
    ///
    /// ```none
    /// graph(%x: tensor) {
    ///   %0 = autograd_zero
    ///   %1 = autograd_add %x, %0
    ///   ; <-- here
    ///   return %1
    /// ```
    After(Block),
}

#[inline(always)]
fn move_to_node_internal(this: &mut impl Cursor, next: Option<(Block, Node)>) -> Option<Node> {
    this.set_pos(next.map_or_else(
        || CursorPos::Nothing,
        |(block, node)| CursorPos::At(block, node),
    ));

    next.map(|(_, node)| node)
}

/// Models basic cursor operations that **view** a graph. None of these operations
/// require mutable access to a given graph, so they can be used inside of
/// analyses.
///
/// A cursor never leaves the block it's in by itself: moving past the last
/// node of a block moves to `Nothing`, and nested blocks are only entered
/// through [`Cursor::goto_before`] and friends.
pub trait Cursor: Sized {
    /// Gets the current cursor position
    fn pos(&self) -> CursorPos;

    /// Sets the current cursor position
    fn set_pos(&mut self, pos: CursorPos);

    /// Returns the graph being viewed
    fn graph(&self) -> &Graph;

    /// Gets the layout of the graph being viewed
    fn layout(&self) -> &Layout {
        &self.graph().layout
    }

    /// Gets the data-flow graph of the graph being viewed
    fn dfg(&self) -> &DataFlowGraph {
        &self.graph().dfg
    }

    /// Gets the current block being viewed by the cursor, if any.
    fn current_block(&self) -> Option<Block> {
        match self.pos() {
            CursorPos::Nothing => None,
            CursorPos::Before(block) | CursorPos::After(block) | CursorPos::At(block, _) => {
                Some(block)
            }
        }
    }

    /// Gets the current node being viewed by the cursor, if any.
    fn current_node(&self) -> Option<Node> {
        if let CursorPos::At(_, node) = self.pos() {
            Some(node)
        } else {
            None
        }
    }

    /// Moves the position to `Before(block)`.
    fn goto_before(&mut self, block: Block) {
        debug_assert!(self.layout().is_block_inserted(block));

        self.set_pos(CursorPos::Before(block));
    }

    /// Moves the position to `After(block)`.
    fn goto_after(&mut self, block: Block) {
        debug_assert!(self.layout().is_block_inserted(block));

        self.set_pos(CursorPos::After(block));
    }

    /// Moves the position to `At(block, first_node_in_block)`.
    fn goto_first_node(&mut self, block: Block) {
        self.goto_before(block);

        self.next_node();
    }

    /// Moves the position to `At(block, last_node_in_block)`.
    fn goto_last_node(&mut self, block: Block) {
        self.goto_after(block);

        self.prev_node();
    }

    /// Moves the position to `At(containing, node)`
    fn goto_node(&mut self, node: Node) {
        debug_assert!(self.layout().is_node_inserted(node));

        let block = self.layout().node_block(node);

        self.set_pos(CursorPos::At(block, node));
    }

    /// Moves the cursor to the next node in the block. If the cursor points
    /// before the block, this is the first node. If it points after, this does
    /// nothing. If it points at nothing, this does nothing.
    fn next_node(&mut self) -> Option<Node> {
        let block_and_node = match self.pos() {
            CursorPos::Nothing | CursorPos::After(_) => None,
            CursorPos::At(block, node) => self.layout().node_next(node).map(|node| (block, node)),
            CursorPos::Before(block) => self
                .layout()
                .block_first_node(block)
                .map(|node| (block, node)),
        };

        move_to_node_internal(self, block_and_node)
    }

    /// Moves the cursor to the previous node in the block. If the cursor points
    /// after the block, this is the last node. If it points before, this does
    /// nothing. If it points at nothing, this does nothing.
    fn prev_node(&mut self) -> Option<Node> {
        let block_and_node = match self.pos() {
            CursorPos::Nothing | CursorPos::Before(_) => None,
            CursorPos::At(block, node) => self.layout().node_prev(node).map(|node| (block, node)),
            CursorPos::After(block) => self
                .layout()
                .block_last_node(block)
                .map(|node| (block, node)),
        };

        move_to_node_internal(self, block_and_node)
    }
}

/// Effectively a [`GraphCursor`] without any of the operations
/// that mutate the graph.
pub struct GraphView<'g> {
    graph: &'g Graph,
    pos: CursorPos,
}

impl<'g> Cursor for GraphView<'g> {
    fn pos(&self) -> CursorPos {
        self.pos
    }

    fn set_pos(&mut self, pos: CursorPos) {
        self.pos = pos;
    }

    fn graph(&self) -> &Graph {
        self.graph
    }
}

impl<'g> GraphView<'g> {
    /// Creates a [`GraphView`] that allows the given graph to be viewed.
    pub fn over(graph: &'g Graph) -> Self {
        Self {
            graph,
            pos: CursorPos::Nothing,
        }
    }
}

/// Similar to [`GraphBuilder`] but for in-place modification of graphs.
///
/// The cursor is the only safe way to remove nodes while walking a block:
/// [`GraphCursor::remove_node`] leaves the cursor at the position before
/// the removed node, so the next call to [`Cursor::next_node`] continues
/// with whatever followed it.
pub struct GraphCursor<'g> {
    graph: &'g mut Graph,
    pos: CursorPos,
}

impl<'g> Cursor for GraphCursor<'g> {
    fn pos(&self) -> CursorPos {
        self.pos
    }

    fn set_pos(&mut self, pos: CursorPos) {
        self.pos = pos;
    }

    fn graph(&self) -> &Graph {
        self.graph
    }
}

impl<'g> GraphCursor<'g> {
    /// Creates a [`GraphCursor`] that allows the given graph to be modified.
    pub fn over(graph: &'g mut Graph) -> Self {
        Self {
            graph,
            pos: CursorPos::Nothing,
        }
    }

    /// Gets mutable access to the graph being modified.
    pub fn graph_mut(&mut self) -> &mut Graph {
        self.graph
    }

    /// Returns a builder that inserts nodes directly before the current node.
    ///
    /// Panics if the cursor isn't pointing at a node.
    pub fn ins(&mut self) -> InsertBuilder<'_> {
        let node = self
            .current_node()
            .expect("cannot insert without a current node");

        InsertBuilder::new(self.graph, InsertPoint::Before(node))
    }

    /// Returns a builder that inserts nodes directly after the current node.
    ///
    /// Panics if the cursor isn't pointing at a node.
    pub fn ins_after(&mut self) -> InsertBuilder<'_> {
        let node = self
            .current_node()
            .expect("cannot insert without a current node");

        InsertBuilder::new(self.graph, InsertPoint::After(node))
    }

    /// Destroys the current node (see [`Graph::destroy_node`]) and moves the
    /// cursor to the node before it, or to `Before(block)` if it was the first.
    ///
    /// Panics if the cursor isn't pointing at a node.
    pub fn remove_node(&mut self) -> Node {
        let (block, node) = match self.pos {
            CursorPos::At(block, node) => (block, node),
            _ => panic!("cannot remove without a current node"),
        };

        let prev = self.graph.layout.node_prev(node);

        self.graph.destroy_node(node);
        self.pos = prev.map_or(CursorPos::Before(block), |prev| CursorPos::At(block, prev));

        node
    }
}

#[cfg(test)]
mod tests {
    use crate::ir::*;

    fn three_zeros() -> (Graph, Vec<Value>) {
        let mut b = GraphBuilder::new();
        let values: Vec<Value> = (0..3).map(|_| b.append().autograd_zero()).collect();

        b.ret(&values);

        (b.finish(), values)
    }

    #[test]
    fn view_walks_block_in_order() {
        let (graph, values) = three_zeros();
        let mut view = GraphView::over(&graph);
        let mut seen = Vec::new();

        view.goto_before(graph.entry_block());

        while let Some(node) = view.next_node() {
            seen.push(graph.dfg.node(node).output());
        }

        assert_eq!(seen, values);
        assert_eq!(view.pos(), CursorPos::Nothing);
    }

    #[test]
    fn remove_continues_with_successor() {
        let (mut graph, values) = three_zeros();
        let entry = graph.entry_block();
        graph.set_outputs(&[values[2]]);

        let mut cursor = GraphCursor::over(&mut graph);
        cursor.goto_first_node(entry);
        cursor.remove_node();

        assert_eq!(cursor.pos(), CursorPos::Before(entry));

        let next = cursor.next_node().unwrap();
        assert_eq!(cursor.dfg().node(next).output(), values[1]);

        cursor.remove_node();
        assert!(matches!(cursor.next_node(), Some(n) if cursor.dfg().node(n).output() == values[2]));
        assert_eq!(cursor.next_node(), None);
    }

    #[test]
    fn ins_places_around_current_node() {
        let mut b = GraphBuilder::new();
        let x = b.input(Type::tensor());
        let y = b.append().autograd_add(x, x);
        b.ret(&[y]);

        let mut graph = b.finish();
        let entry = graph.entry_block();
        let mut cursor = GraphCursor::over(&mut graph);

        cursor.goto_first_node(entry);
        cursor.ins().autograd_zero();
        cursor.ins_after().add(x, x);

        let kinds: Vec<_> = graph.nodes().map(|n| graph.dfg.kind(n)).collect();

        assert_eq!(
            kinds,
            [NodeKind::AutogradZero, NodeKind::AutogradAdd, NodeKind::Add]
        );
    }
}
