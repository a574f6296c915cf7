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
use crate::ir::{Block, Node};
use crate::utility::PackedOption;

#[cfg(feature = "enable-serde")]
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
struct NodeLinks {
    prev: PackedOption<Node>,
    next: PackedOption<Node>,
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
struct BlockLinks {
    first: PackedOption<Node>,
    last: PackedOption<Node>,
}

/// Allows all of the nodes in a given block to be iterated over.
///
/// The iterator reads the links as it goes, so the layout cannot be modified
/// while it exists. Code that mutates while walking a block should use a
/// [`GraphCursor`](crate::ir::GraphCursor) instead.
#[derive(Copy, Clone, Debug)]
pub struct NodeIter<'layout> {
    next: Option<Node>,
    layout: &'layout Layout,
}

impl<'l> Iterator for NodeIter<'l> {
    type Item = Node;

    fn next(&mut self) -> Option<Self::Item> {
        self.next.map(|node| {
            self.next = self.layout.nodes[node].next.expand();

            node
        })
    }
}

/// Models the order of the nodes inside of every block in a graph.
///
/// Each block is a doubly-linked list of nodes, which allows nodes to be
/// inserted, removed and moved between blocks in constant time without
/// invalidating any other node.
#[derive(Default, Clone, Debug)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub struct Layout {
    // doubly-linked list links for every inserted node
    nodes: SecondaryMap<Node, NodeLinks>,
    // head/tail of the list for every inserted block
    blocks: SecondaryMap<Block, BlockLinks>,
    // maps nodes -> the blocks that contain them
    node_blocks: SecondaryMap<Node, Block>,
}

impl Layout {
    /// Creates an empty layout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an empty block into the layout.
    pub fn insert_block(&mut self, block: Block) {
        debug_assert!(
            !self.blocks.contains(block),
            "cannot insert block that is already inserted"
        );

        self.blocks.insert(block, BlockLinks::default());
    }

    /// Removes a block from the layout. The block must already be empty.
    pub fn remove_block(&mut self, block: Block) {
        let links = self
            .blocks
            .remove(block)
            .expect("cannot remove block that isn't in the layout");

        debug_assert!(links.first.is_none(), "cannot remove non-empty block");
    }

    /// Appends a node to the end of `block`.
    pub fn append_node(&mut self, node: Node, block: Block) {
        debug_assert!(
            !self.nodes.contains(node),
            "cannot insert same node multiple times"
        );

        let links = &mut self.blocks[block];
        let prev = links.last.replace(node);

        match prev {
            Some(prev) => self.nodes[prev].next = PackedOption::some(node),
            None => {
                links.first.replace(node);
            }
        }

        self.link(node, block, prev.into(), PackedOption::none());
    }

    /// Inserts `node` into the same block as `before`, directly before `before`.
    pub fn insert_node_before(&mut self, node: Node, before: Node) {
        debug_assert!(
            !self.nodes.contains(node),
            "cannot insert same node multiple times"
        );

        let block = self.node_blocks[before];
        let prev = self.nodes[before].prev.replace(node);

        match prev {
            Some(prev) => self.nodes[prev].next = PackedOption::some(node),
            None => {
                self.blocks[block].first.replace(node);
            }
        }

        self.link(node, block, prev.into(), PackedOption::some(before));
    }

    /// Inserts `node` into the same block as `after`, directly after `after`.
    pub fn insert_node_after(&mut self, node: Node, after: Node) {
        debug_assert!(
            !self.nodes.contains(node),
            "cannot insert same node multiple times"
        );

        let block = self.node_blocks[after];
        let next = self.nodes[after].next.replace(node);

        match next {
            Some(next) => self.nodes[next].prev = PackedOption::some(node),
            None => {
                self.blocks[block].last.replace(node);
            }
        }

        self.link(node, block, PackedOption::some(after), next.into());
    }

    /// Removes a node from the layout. The node must be in the layout.
    pub fn remove_node(&mut self, node: Node) {
        let links = self
            .nodes
            .remove(node)
            .expect("cannot remove node that isn't in the layout");

        let block = self
            .node_blocks
            .remove(node)
            .expect("node in layout did not have a block");

        match links.prev.expand() {
            Some(prev) => self.nodes[prev].next = links.next,
            None => self.blocks[block].first = links.next,
        }

        match links.next.expand() {
            Some(next) => self.nodes[next].prev = links.prev,
            None => self.blocks[block].last = links.prev,
        }
    }

    /// Checks if a block is currently inside the layout.
    #[inline]
    pub fn is_block_inserted(&self, block: Block) -> bool {
        self.blocks.contains(block)
    }

    /// Checks if a node is currently inside the layout.
    #[inline]
    pub fn is_node_inserted(&self, node: Node) -> bool {
        self.nodes.contains(node)
    }

    /// Gets the number of nodes in the layout, across every block.
    #[inline]
    pub fn len_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Gets an iterator over every node in a given block.
    pub fn nodes_in_block(&self, block: Block) -> NodeIter<'_> {
        NodeIter {
            next: self.blocks[block].first.expand(),
            layout: self,
        }
    }

    /// Gets the first node in `block`
    #[inline]
    pub fn block_first_node(&self, block: Block) -> Option<Node> {
        self.blocks[block].first.expand()
    }

    /// Gets the last node in `block`
    #[inline]
    pub fn block_last_node(&self, block: Block) -> Option<Node> {
        self.blocks[block].last.expand()
    }

    /// Gets the node that comes after `node`
    #[inline]
    pub fn node_next(&self, node: Node) -> Option<Node> {
        self.nodes[node].next.expand()
    }

    /// Gets the node that comes before `node`
    #[inline]
    pub fn node_prev(&self, node: Node) -> Option<Node> {
        self.nodes[node].prev.expand()
    }

    /// Gets the block that a node is in
    #[inline]
    pub fn node_block(&self, node: Node) -> Block {
        self.node_blocks[node]
    }

    fn link(
        &mut self,
        node: Node,
        block: Block,
        prev: PackedOption<Node>,
        next: PackedOption<Node>,
    ) {
        self.nodes.insert(node, NodeLinks { prev, next });
        self.node_blocks.insert(node, block);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::ArenaKey;

    fn nodes(n: usize) -> Vec<Node> {
        (0..n).map(Node::new).collect()
    }

    #[test]
    fn append_keeps_order() {
        let mut layout = Layout::new();
        let block = Block::new(0);
        let ns = nodes(3);

        layout.insert_block(block);

        for &n in ns.iter() {
            layout.append_node(n, block);
        }

        assert!(layout.nodes_in_block(block).eq(ns.iter().copied()));
        assert_eq!(layout.block_first_node(block), Some(ns[0]));
        assert_eq!(layout.block_last_node(block), Some(ns[2]));
        assert_eq!(layout.node_prev(ns[1]), Some(ns[0]));
        assert_eq!(layout.node_next(ns[1]), Some(ns[2]));
    }

    #[test]
    fn insert_before_and_after() {
        let mut layout = Layout::new();
        let block = Block::new(0);
        let ns = nodes(4);

        layout.insert_block(block);
        layout.append_node(ns[1], block);
        layout.insert_node_before(ns[0], ns[1]);
        layout.insert_node_after(ns[3], ns[1]);
        layout.insert_node_before(ns[2], ns[3]);

        assert!(layout.nodes_in_block(block).eq(ns.iter().copied()));
        assert_eq!(layout.block_first_node(block), Some(ns[0]));
        assert_eq!(layout.block_last_node(block), Some(ns[3]));
    }

    #[test]
    fn remove_from_every_position() {
        let mut layout = Layout::new();
        let block = Block::new(0);
        let ns = nodes(4);

        layout.insert_block(block);

        for &n in ns.iter() {
            layout.append_node(n, block);
        }

        layout.remove_node(ns[0]);
        layout.remove_node(ns[3]);
        layout.remove_node(ns[1]);

        assert!(layout.nodes_in_block(block).eq([ns[2]]));
        assert!(!layout.is_node_inserted(ns[1]));
        assert_eq!(layout.len_nodes(), 1);

        layout.remove_node(ns[2]);
        layout.remove_block(block);

        assert!(!layout.is_block_inserted(block));
    }

    #[test]
    fn move_between_blocks() {
        let mut layout = Layout::new();
        let (outer, inner) = (Block::new(0), Block::new(1));
        let ns = nodes(3);

        layout.insert_block(outer);
        layout.insert_block(inner);
        layout.append_node(ns[0], outer);
        layout.append_node(ns[2], outer);
        layout.append_node(ns[1], inner);

        layout.remove_node(ns[1]);
        layout.insert_node_before(ns[1], ns[2]);

        assert!(layout.nodes_in_block(outer).eq(ns.iter().copied()));
        assert_eq!(layout.node_block(ns[1]), outer);
        assert_eq!(layout.nodes_in_block(inner).next(), None);
    }
}
