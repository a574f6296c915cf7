//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::arena::ArenaKey;
use std::fmt::{Debug, Formatter};
use std::marker::PhantomData;
use std::ops::{Index, IndexMut};
use std::{fmt, slice};

#[cfg(feature = "enable-serde")]
use serde::{Deserialize, Serialize};

/// A primary mapping of `K -> V`. Every key is created by inserting into
/// the map, and keys are never invalidated: nothing is ever removed.
///
/// This is effectively a typed wrapper around `Vec<V>`, the main advantage
/// is that it can only be indexed by the correct key type. Entities that are
/// "deleted" from a graph stay in their arena, they are simply unreachable
/// from the graph's layout afterwards.
#[derive(Clone)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub struct ArenaMap<K: ArenaKey, V> {
    data: Vec<V>,
    #[cfg_attr(feature = "enable-serde", serde(skip))]
    _unused: PhantomData<fn() -> K>,
}

impl<K: ArenaKey, V> ArenaMap<K, V> {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self {
            data: Vec::default(),
            _unused: PhantomData,
        }
    }

    /// Creates an empty map with space for at least `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
            _unused: PhantomData,
        }
    }

    /// Checks if a key refers to an entry in the map.
    #[inline]
    pub fn contains(&self, key: K) -> bool {
        key.index() < self.data.len()
    }

    /// Gets the value associated with a key, if it exists.
    #[inline]
    pub fn get(&self, key: K) -> Option<&V> {
        self.data.get(key.index())
    }

    /// Gets the value associated with a key, if it exists.
    #[inline]
    pub fn get_mut(&mut self, key: K) -> Option<&mut V> {
        self.data.get_mut(key.index())
    }

    /// Inserts a value into the map and returns the key that refers to it.
    pub fn insert(&mut self, value: V) -> K {
        let key = self.next_key();

        self.data.push(value);

        key
    }

    /// Gets the key that the next call to [`Self::insert`] will return.
    #[inline]
    pub fn next_key(&self) -> K {
        K::new(self.data.len())
    }

    /// Gets the number of entries that have been inserted.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Checks if nothing has been inserted yet.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Iterates over every key in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = K> + DoubleEndedIterator + ExactSizeIterator {
        (0..self.data.len()).map(K::new)
    }

    /// Iterates over every value in insertion order.
    pub fn values(&self) -> slice::Iter<'_, V> {
        self.data.iter()
    }

    /// Iterates over every `(key, value)` pair in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (K, &V)> + DoubleEndedIterator + ExactSizeIterator {
        self.data
            .iter()
            .enumerate()
            .map(|(i, v)| (K::new(i), v))
    }
}

impl<K: ArenaKey, V> Default for ArenaMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: ArenaKey, V: PartialEq> PartialEq for ArenaMap<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
    }
}

impl<K: ArenaKey, V: Eq> Eq for ArenaMap<K, V> {}

impl<K: ArenaKey, V: Debug> Debug for ArenaMap<K, V> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        crate::arena::debug_write_map(f, "ArenaMap", self.iter())
    }
}

impl<K: ArenaKey, V> Index<K> for ArenaMap<K, V> {
    type Output = V;

    #[inline]
    fn index(&self, key: K) -> &Self::Output {
        &self.data[key.index()]
    }
}

impl<K: ArenaKey, V> IndexMut<K> for ArenaMap<K, V> {
    #[inline]
    fn index_mut(&mut self, key: K) -> &mut Self::Output {
        &mut self.data[key.index()]
    }
}

#[cfg(test)]
mod tests {
    use crate::arena::*;
    use crate::arena_key;

    arena_key! { struct Key(u32); }

    #[test]
    fn insert_and_lookup() {
        let mut map = ArenaMap::new();
        let k1: Key = map.insert("a");
        let k2 = map.insert("b");

        assert_eq!(map[k1], "a");
        assert_eq!(map[k2], "b");
        assert_eq!(map.len(), 2);
        assert!(map.contains(k2));
        assert!(!map.contains(Key::new(2)));
    }

    #[test]
    fn next_key_matches_insert() {
        let mut map = ArenaMap::<Key, i32>::new();
        let expected = map.next_key();

        assert_eq!(map.insert(3), expected);
    }

    #[test]
    fn keys_are_in_order() {
        let mut map = ArenaMap::new();
        let keys: Vec<Key> = (0..4).map(|i| map.insert(i)).collect();

        assert!(map.keys().eq(keys.iter().copied()));
        assert!(map.values().copied().eq(0..4));
    }
}
