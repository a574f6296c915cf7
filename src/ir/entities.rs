//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::dense_arena_key;

dense_arena_key! {
    /// A reference to a single SSA value. Every value is either a parameter of
    /// a block (graph inputs are the parameters of the entry block) or one of
    /// the outputs of a node.
    ///
    /// These are useless without the [`DataFlowGraph`](crate::ir::DataFlowGraph)
    /// they came from, they are just keys into a table.
    pub struct Value;

    /// A reference to a node in the graph. Nodes consume values, produce
    /// zero or more values, and may own nested [`Block`]s.
    pub struct Node;

    /// A reference to a block: an ordered list of nodes followed by a list
    /// of block outputs. The entry block of a graph is the graph's body, every
    /// other block is owned by exactly one node.
    pub struct Block;
}

#[cfg(test)]
mod tests {
    use super::*;
    use static_assertions::assert_eq_size;

    #[test]
    fn entities_are_dense() {
        assert_eq_size!(Value, u32);
        assert_eq_size!(Node, u32);
        assert_eq_size!(Block, u32);
        assert_eq_size!(crate::utility::PackedOption<Node>, u32);
    }
}
