//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::ir::{Block, Value};
use crate::utility::{Str, StringPool};
use smallvec::SmallVec;

#[cfg(feature = "enable-serde")]
use serde::{Deserialize, Serialize};

/// The operation that a node performs.
///
/// Only a handful of node kinds have meaning to the transforms in this crate,
/// everything else is an [`NodeKind::Op`] whose semantics are opaque.
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub enum NodeKind {
    /// `autograd_zero`: no inputs, one output that is always a structural zero.
    ///
    /// ```none
    /// %z = autograd_zero
    /// ```
    AutogradZero,
    /// `autograd_add`: the sum of exactly two inputs, where either input may
    /// be a structural zero at runtime. Always has one output.
    ///
    /// ```none
    /// %s = autograd_add %a, %b
    /// ```
    AutogradAdd,
    /// `grad_of`: a guarded block. The single owned block only needs to run
    /// when not every input is a structural zero, its outputs are the
    /// block outputs of that block. The body refers to the inputs directly.
    ///
    /// ```none
    /// %g0, %g1 = grad_of %a, %b {
    ///   %t = mul %a, %b : tensor
    ///   yield %t, %a
    /// }
    /// ```
    GradOf,
    /// `add`: a plain binary addition of two tensors.
    ///
    /// ```none
    /// %s = add %a, %b
    /// ```
    Add,
    /// Any other operation. The [`Str`] is the opcode, e.g. `mul` in
    /// `%r = mul %a, %b : tensor`.
    Op(Str),
}

impl NodeKind {
    /// Maps a builtin keyword to its node kind. Returns `None` for anything
    /// that would be an opaque opcode.
    pub fn from_keyword(keyword: &str) -> Option<NodeKind> {
        match keyword {
            "autograd_zero" => Some(NodeKind::AutogradZero),
            "autograd_add" => Some(NodeKind::AutogradAdd),
            "grad_of" => Some(NodeKind::GradOf),
            "add" => Some(NodeKind::Add),
            _ => None,
        }
    }

    /// Gets the textual name of the node kind.
    pub fn name(self, pool: &StringPool) -> &str {
        match self {
            NodeKind::AutogradZero => "autograd_zero",
            NodeKind::AutogradAdd => "autograd_add",
            NodeKind::GradOf => "grad_of",
            NodeKind::Add => "add",
            NodeKind::Op(opcode) => &pool[opcode],
        }
    }

    /// Checks if the node kind is an opaque operation.
    pub fn is_opaque(self) -> bool {
        matches!(self, NodeKind::Op(_))
    }
}

/// The data of a single node: what it does, what it consumes, what it
/// produces and which blocks it owns.
///
/// The operand lists can only be modified through the
/// [`DataFlowGraph`](crate::ir::DataFlowGraph), since the use-lists of every
/// value need to be kept in sync with them.
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub struct NodeData {
    kind: NodeKind,
    inputs: SmallVec<[Value; 2]>,
    outputs: SmallVec<[Value; 1]>,
    blocks: SmallVec<[Block; 1]>,
}

impl NodeData {
    pub(in crate::ir) fn new(kind: NodeKind, inputs: &[Value], blocks: &[Block]) -> Self {
        Self {
            kind,
            inputs: SmallVec::from_slice(inputs),
            outputs: SmallVec::default(),
            blocks: SmallVec::from_slice(blocks),
        }
    }

    /// Gets the kind of the node.
    #[inline]
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Gets every value the node consumes, in order.
    #[inline]
    pub fn inputs(&self) -> &[Value] {
        &self.inputs
    }

    /// Gets the `i`th input of the node.
    #[inline]
    pub fn input(&self, i: usize) -> Value {
        self.inputs[i]
    }

    /// Gets every value the node produces, in order.
    #[inline]
    pub fn outputs(&self) -> &[Value] {
        &self.outputs
    }

    /// Gets the only output of a node that has exactly one output.
    pub fn output(&self) -> Value {
        assert_eq!(
            self.outputs.len(),
            1,
            "`output` called on node that does not have exactly one output"
        );

        self.outputs[0]
    }

    /// Gets the blocks owned by the node.
    #[inline]
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub(in crate::ir) fn push_output(&mut self, value: Value) {
        self.outputs.push(value);
    }

    pub(in crate::ir) fn set_input(&mut self, i: usize, value: Value) {
        self.inputs[i] = value;
    }
}
