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
use crate::ir::{Graph, Type, Value};
use std::fmt;
use std::fmt::{Display, Formatter};

/// What is statically known about whether a value is a structural zero.
///
/// Each value gets exactly one of these, so "zero and nonzero at the same time"
/// can't be represented.
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq)]
pub enum ZeroState {
    /// The value is always a structural zero.
    Zero,
    /// The value is never a structural zero.
    Nonzero,
    /// Nothing is known.
    Unknown,
}

impl ZeroState {
    /// Gets the state that a graph input of type `ty` starts out with.
    ///
    /// An explicit zero-ness annotation on a tensor is always trusted. Tensors
    /// (and lists of tensors) without one are assumed to be nonzero, and
    /// everything else is unknown.
    pub fn for_input(ty: Type) -> ZeroState {
        if let Some(zero) = ty.as_tensor().and_then(|tt| tt.autograd_zero()) {
            return if zero {
                ZeroState::Zero
            } else {
                ZeroState::Nonzero
            };
        }

        if ty.is_subtype_of(Type::tensor()) || ty.is_subtype_of(Type::TensorList) {
            ZeroState::Nonzero
        } else {
            ZeroState::Unknown
        }
    }
}

impl Display for ZeroState {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Zero => write!(f, "zero"),
            Self::Nonzero => write!(f, "nonzero"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Maps values to their [`ZeroState`].
///
/// The map is only meaningful for the graph it was seeded from, and is
/// expected to be filled in as that graph is walked in definition order.
#[derive(Debug, Clone, Default)]
pub struct ZeroStateMap {
    states: SecondaryMap<Value, ZeroState>,
}

impl ZeroStateMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a map where every input of `graph` has been given its initial
    /// state (see [`ZeroState::for_input`]).
    pub fn seed(graph: &Graph) -> Self {
        let mut map = Self::new();

        for &input in graph.inputs() {
            map.set(input, ZeroState::for_input(graph.dfg.ty(input)));
        }

        map
    }

    /// Gets the state of a value.
    ///
    /// Panics if the value hasn't been given a state yet, which means
    /// a use was visited before its definition.
    pub fn get(&self, value: Value) -> ZeroState {
        match self.states.get(value) {
            Some(&state) => state,
            None => panic!("value {value:?} used before it was given a zero state"),
        }
    }

    /// Gets the state of a value, if it has one.
    pub fn try_get(&self, value: Value) -> Option<ZeroState> {
        self.states.get(value).copied()
    }

    /// Gives a value a state, replacing any previous state.
    pub fn set(&mut self, value: Value, state: ZeroState) {
        self.states.insert(value, state);
    }

    /// Gets the number of values that have a state.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Checks if no value has a state.
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Iterates over every value with a state.
    pub fn iter(&self) -> impl Iterator<Item = (Value, ZeroState)> + '_ {
        self.states.iter().map(|(value, &state)| (value, state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn annotations_are_trusted() {
        assert_eq!(ZeroState::for_input(Type::zero_tensor()), ZeroState::Zero);
        assert_eq!(ZeroState::for_input(Type::nonzero_tensor()), ZeroState::Nonzero);
    }

    #[test]
    fn unannotated_tensors_are_nonzero() {
        assert_eq!(ZeroState::for_input(Type::tensor()), ZeroState::Nonzero);
        assert_eq!(ZeroState::for_input(Type::TensorList), ZeroState::Nonzero);
    }

    #[test]
    fn everything_else_is_unknown() {
        for ty in [Type::Int, Type::Float, Type::Bool, Type::IntList, Type::None] {
            assert_eq!(ZeroState::for_input(ty), ZeroState::Unknown);
        }
    }

    #[test]
    fn seeding_covers_every_input() {
        let mut graph = Graph::new();
        let inputs = [
            graph.add_input(Type::zero_tensor()),
            graph.add_input(Type::nonzero_tensor()),
            graph.add_input(Type::tensor()),
            graph.add_input(Type::TensorList),
            graph.add_input(Type::Int),
        ];

        let map = ZeroStateMap::seed(&graph);
        let states: Vec<_> = inputs.iter().map(|&v| map.get(v)).collect();

        assert_eq!(map.len(), inputs.len());
        assert_eq!(
            states,
            [
                ZeroState::Zero,
                ZeroState::Nonzero,
                ZeroState::Nonzero,
                ZeroState::Nonzero,
                ZeroState::Unknown
            ]
        );
    }

    #[test]
    #[should_panic(expected = "used before it was given a zero state")]
    fn untagged_lookup_panics() {
        let mut graph = Graph::new();
        let x = graph.add_input(Type::tensor());

        ZeroStateMap::new().get(x);
    }
}
