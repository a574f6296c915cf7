//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::arena::{ArenaMap, SecondaryMap};
use crate::ir::{Block, Node, NodeData, NodeKind, Type, Value};
use crate::utility::{PackedOption, Str, StringPool};
use smallvec::SmallVec;

#[cfg(feature = "enable-serde")]
use serde::{Deserialize, Serialize};

/// Where a value comes from.
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub enum ValueDef {
    /// The value is the `n`th parameter of a block.
    Param(Block, u32),
    /// The value is the `n`th output of a node.
    Result(Node, u32),
}

/// A single use of a value.
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub enum Use {
    /// The value is the `n`th input of a node.
    Input(Node, u32),
    /// The value is the `n`th output of a block.
    Output(Block, u32),
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
struct ValueData {
    ty: Type,
    def: ValueDef,
}

/// The data of a single block.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub struct BlockData {
    params: SmallVec<[Value; 4]>,
    outputs: SmallVec<[Value; 4]>,
    owner: PackedOption<Node>,
}

impl BlockData {
    /// Gets the parameters of the block. Only the entry block has these,
    /// they are the graph's inputs.
    #[inline]
    pub fn params(&self) -> &[Value] {
        &self.params
    }

    /// Gets the values that the block yields when it finishes.
    #[inline]
    pub fn outputs(&self) -> &[Value] {
        &self.outputs
    }

    /// Gets the node that owns the block. `None` for the entry block.
    #[inline]
    pub fn owner(&self) -> Option<Node> {
        self.owner.expand()
    }
}

/// Owns every node, value and block in a graph, along with the data-flow
/// information between them.
///
/// Every value has a use-list that records exactly which node input slots
/// and block output slots refer to it. The use-lists are only ever updated
/// inside of the methods on this type, so they can't be observed out of sync
/// with the operands they describe.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub struct DataFlowGraph {
    nodes: ArenaMap<Node, NodeData>,
    values: ArenaMap<Value, ValueData>,
    blocks: ArenaMap<Block, BlockData>,
    uses: SecondaryMap<Value, SmallVec<[Use; 4]>>,
    names: SecondaryMap<Value, Str>,
    strings: StringPool,
}

impl DataFlowGraph {
    /// Creates an empty data-flow graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a block that has no parameters, outputs or owner.
    pub fn create_block(&mut self) -> Block {
        self.blocks.insert(BlockData::default())
    }

    /// Appends a parameter of type `ty` to `block`.
    pub fn append_block_param(&mut self, block: Block, ty: Type) -> Value {
        let index = self.blocks[block].params.len() as u32;
        let value = self.values.insert(ValueData {
            ty,
            def: ValueDef::Param(block, index),
        });

        self.blocks[block].params.push(value);

        value
    }

    /// Creates a node. One output value is created for every type in `outputs`,
    /// and the node takes ownership of every block in `blocks`.
    ///
    /// The node is not inserted into any block, that's up to the layout.
    pub fn create_node(
        &mut self,
        kind: NodeKind,
        inputs: &[Value],
        outputs: &[Type],
        blocks: &[Block],
    ) -> Node {
        let node = self.nodes.insert(NodeData::new(kind, inputs, blocks));

        for (i, &input) in inputs.iter().enumerate() {
            self.add_use(input, Use::Input(node, i as u32));
        }

        for (i, &ty) in outputs.iter().enumerate() {
            let value = self.values.insert(ValueData {
                ty,
                def: ValueDef::Result(node, i as u32),
            });

            self.nodes[node].push_output(value);
        }

        for &block in blocks {
            let old = self.blocks[block].owner.replace(node);

            debug_assert!(old.is_none(), "block is already owned by another node");
        }

        node
    }

    /// Replaces the outputs of `block` with `outputs`.
    pub fn set_block_outputs(&mut self, block: Block, outputs: &[Value]) {
        self.clear_block_outputs(block);

        for (i, &value) in outputs.iter().enumerate() {
            self.add_use(value, Use::Output(block, i as u32));
        }

        self.blocks[block].outputs = SmallVec::from_slice(outputs);
    }

    /// Removes every output of `block`.
    pub fn clear_block_outputs(&mut self, block: Block) {
        let old = std::mem::take(&mut self.blocks[block].outputs);

        for (i, &value) in old.iter().enumerate() {
            self.remove_use(value, Use::Output(block, i as u32));
        }
    }

    /// Removes every use that `node` has of its inputs. After this the node
    /// still refers to its inputs, but they no longer know about it.
    pub(in crate::ir) fn release_node_inputs(&mut self, node: Node) {
        let inputs: SmallVec<[Value; 4]> = SmallVec::from_slice(self.nodes[node].inputs());

        for (i, &input) in inputs.iter().enumerate() {
            self.remove_use(input, Use::Input(node, i as u32));
        }
    }

    /// Makes every use of `old` into a use of `new` instead. After this
    /// `old` has no uses.
    pub fn replace_all_uses_with(&mut self, old: Value, new: Value) {
        if old == new {
            return;
        }

        let uses = self.uses.remove(old).unwrap_or_default();

        for &u in uses.iter() {
            match u {
                Use::Input(node, i) => self.nodes[node].set_input(i as usize, new),
                Use::Output(block, i) => self.blocks[block].outputs[i as usize] = new,
            }
        }

        self.uses.get_or_default(new).extend(uses);
    }

    /// Gets the data of a node.
    #[inline]
    pub fn node(&self, node: Node) -> &NodeData {
        &self.nodes[node]
    }

    /// Gets the kind of a node.
    #[inline]
    pub fn kind(&self, node: Node) -> NodeKind {
        self.nodes[node].kind()
    }

    /// Gets the data of a block.
    #[inline]
    pub fn block(&self, block: Block) -> &BlockData {
        &self.blocks[block]
    }

    /// Gets the type of a value.
    #[inline]
    pub fn ty(&self, value: Value) -> Type {
        self.values[value].ty
    }

    /// Gets where a value is defined.
    #[inline]
    pub fn value_def(&self, value: Value) -> ValueDef {
        self.values[value].def
    }

    /// Gets every use of a value. The order of uses is unspecified.
    pub fn uses(&self, value: Value) -> &[Use] {
        self.uses.get(value).map_or(&[], |uses| uses.as_slice())
    }

    /// Checks if a value has any uses.
    pub fn has_uses(&self, value: Value) -> bool {
        !self.uses(value).is_empty()
    }

    /// Gets the name given to a value, if it has one.
    pub fn name(&self, value: Value) -> Option<&str> {
        self.names.get(value).map(|&s| &self.strings[s])
    }

    /// Gives a value a name. Names are only hints for printing, they have no
    /// meaning and do not need to be unique.
    pub fn set_name(&mut self, value: Value, name: &str) {
        let s = self.strings.insert(name);

        self.names.insert(value, s);
    }

    /// Interns a string, usually the opcode for an opaque node.
    pub fn intern(&mut self, string: &str) -> Str {
        self.strings.insert(string)
    }

    /// Gets the strings used by the graph.
    #[inline]
    pub fn strings(&self) -> &StringPool {
        &self.strings
    }

    /// Gets the number of values that have ever been created. Every [`Value`]
    /// has an index less than this.
    #[inline]
    pub fn value_count(&self) -> usize {
        self.values.len()
    }

    /// Iterates over every value that has ever been created, including ones
    /// whose definitions have since been removed from the graph.
    pub fn values(&self) -> impl Iterator<Item = Value> + '_ {
        self.values.keys()
    }

    fn add_use(&mut self, value: Value, u: Use) {
        self.uses.get_or_default(value).push(u);
    }

    fn remove_use(&mut self, value: Value, u: Use) {
        let uses = self
            .uses
            .get_mut(value)
            .expect("tried to remove a use from a value that has no uses");

        let pos = uses
            .iter()
            .position(|&existing| existing == u)
            .expect("use-list does not contain use being removed");

        uses.swap_remove(pos);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_node_registers_uses() {
        let mut dfg = DataFlowGraph::new();
        let entry = dfg.create_block();
        let a = dfg.append_block_param(entry, Type::tensor());
        let b = dfg.append_block_param(entry, Type::tensor());
        let n = dfg.create_node(NodeKind::AutogradAdd, &[a, b, a], &[Type::tensor()], &[]);

        assert_eq!(dfg.uses(a), &[Use::Input(n, 0), Use::Input(n, 2)]);
        assert_eq!(dfg.uses(b), &[Use::Input(n, 1)]);
        assert_eq!(dfg.value_def(a), ValueDef::Param(entry, 0));
        assert_eq!(dfg.value_def(dfg.node(n).output()), ValueDef::Result(n, 0));
        assert!(!dfg.has_uses(dfg.node(n).output()));
    }

    #[test]
    fn replace_all_uses_moves_every_use() {
        let mut dfg = DataFlowGraph::new();
        let entry = dfg.create_block();
        let a = dfg.append_block_param(entry, Type::tensor());
        let b = dfg.append_block_param(entry, Type::tensor());
        let n = dfg.create_node(NodeKind::Add, &[a, a], &[Type::tensor()], &[]);
        dfg.set_block_outputs(entry, &[a]);

        dfg.replace_all_uses_with(a, b);

        assert!(!dfg.has_uses(a));
        assert_eq!(dfg.uses(b).len(), 3);
        assert_eq!(dfg.node(n).inputs(), &[b, b]);
        assert_eq!(dfg.block(entry).outputs(), &[b]);
    }

    #[test]
    fn block_outputs_are_uses() {
        let mut dfg = DataFlowGraph::new();
        let entry = dfg.create_block();
        let a = dfg.append_block_param(entry, Type::Int);
        let b = dfg.append_block_param(entry, Type::Int);

        dfg.set_block_outputs(entry, &[a, b]);
        dfg.set_block_outputs(entry, &[b]);

        assert!(!dfg.has_uses(a));
        assert_eq!(dfg.uses(b), &[Use::Output(entry, 0)]);
    }

    #[test]
    fn blocks_know_their_owner() {
        let mut dfg = DataFlowGraph::new();
        let body = dfg.create_block();
        let n = dfg.create_node(NodeKind::GradOf, &[], &[], &[body]);

        assert_eq!(dfg.block(body).owner(), Some(n));
        assert_eq!(dfg.node(n).blocks(), &[body]);
    }

    #[test]
    fn names_are_hints() {
        let mut dfg = DataFlowGraph::new();
        let entry = dfg.create_block();
        let a = dfg.append_block_param(entry, Type::tensor());
        let b = dfg.append_block_param(entry, Type::tensor());

        dfg.set_name(a, "x");

        assert_eq!(dfg.name(a), Some("x"));
        assert_eq!(dfg.name(b), None);
    }
}
