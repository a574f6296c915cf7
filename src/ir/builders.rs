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

/// Helper type for building a graph from scratch.
///
/// The builder starts out appending to the entry block. Nested bodies are
/// built by creating a block, switching to it, appending nodes and setting its
/// outputs, and then switching back to hand it to [`NodeBuilder::grad_of`].
///
/// ```
/// # use garnet::ir::*;
/// let mut b = GraphBuilder::new();
/// let x = b.input(Type::nonzero_tensor());
/// let zero = b.append().autograd_zero();
/// let y = b.append().autograd_add(x, zero);
///
/// b.ret(&[y]);
///
/// let graph = b.finish();
///
/// assert_eq!(graph.nodes().count(), 2);
/// ```
#[derive(Debug)]
pub struct GraphBuilder {
    graph: Graph,
    current: Block,
}

impl GraphBuilder {
    /// Creates a builder for an empty graph, pointing at the entry block.
    pub fn new() -> Self {
        let graph = Graph::new();
        let current = graph.entry_block();

        Self { graph, current }
    }

    /// Adds an input to the graph being built.
    pub fn input(&mut self, ty: Type) -> Value {
        self.graph.add_input(ty)
    }

    /// Gives a value a name that will be used when printing.
    pub fn set_name(&mut self, value: Value, name: &str) {
        self.graph.dfg.set_name(value, name);
    }

    /// Interns a string, for use as an opcode.
    pub fn intern(&mut self, string: &str) -> Str {
        self.graph.dfg.intern(string)
    }

    /// Creates an empty block that will become the body of some node.
    ///
    /// Note that this does not switch the builder to operate on that block,
    /// you still need to call [`Self::switch_to`].
    pub fn create_block(&mut self) -> Block {
        self.graph.create_block()
    }

    /// Switches to appending to a specific block.
    pub fn switch_to(&mut self, block: Block) {
        debug_assert!(self.graph.layout.is_block_inserted(block));

        self.current = block;
    }

    /// Gets the block the builder is currently appending to.
    pub fn current_block(&self) -> Block {
        self.current
    }

    /// Gets the entry block of the graph.
    pub fn entry_block(&self) -> Block {
        self.graph.entry_block()
    }

    /// Returns a builder that can be used to append a node to
    /// the current block.
    pub fn append(&mut self) -> AppendBuilder<'_> {
        AppendBuilder::new(&mut self.graph, self.current)
    }

    /// Sets the values that `block` yields.
    pub fn set_block_outputs(&mut self, block: Block, outputs: &[Value]) {
        self.graph.dfg.set_block_outputs(block, outputs);
    }

    /// Sets the outputs of the graph.
    pub fn ret(&mut self, outputs: &[Value]) {
        self.graph.set_outputs(outputs);
    }

    /// Gets the type of a value that was previously emitted by the builder.
    pub fn ty(&self, value: Value) -> Type {
        self.graph.dfg.ty(value)
    }

    /// Returns the data-flow graph for the graph
    pub fn dfg(&self) -> &DataFlowGraph {
        &self.graph.dfg
    }

    /// Returns the layout for the graph
    pub fn layout(&self) -> &Layout {
        &self.graph.layout
    }

    /// Finishes building and returns the graph.
    pub fn finish(self) -> Graph {
        self.graph
    }
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}
