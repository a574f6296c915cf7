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
use std::{fmt, mem};

#[cfg(feature = "enable-serde")]
use serde::{Deserialize, Serialize};

/// A sparse mapping of `K -> V` that uses keys made by some other primary map.
///
/// Unlike [`ArenaMap`](crate::arena::ArenaMap) entries can be removed, which
/// is what the layout and the use-lists need in order to model entities leaving
/// the graph.
///
/// ```
/// # use garnet::arena_key;
/// # use garnet::arena::*;
/// arena_key! { struct Node; }
///
/// let mut nodes = ArenaMap::new();
/// let n: Node = nodes.insert("n");
///
/// let mut names = SecondaryMap::new();
/// names.insert(n, "first node");
///
/// assert_eq!(names[n], "first node");
/// assert_eq!(names.remove(n), Some("first node"));
/// assert!(!names.contains(n));
/// ```
#[derive(Clone)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub struct SecondaryMap<K: ArenaKey, V> {
    data: Vec<Option<V>>,
    len: usize,
    #[cfg_attr(feature = "enable-serde", serde(skip))]
    _unused: PhantomData<fn() -> K>,
}

impl<K: ArenaKey, V> SecondaryMap<K, V> {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self {
            data: Vec::default(),
            len: 0,
            _unused: PhantomData,
        }
    }

    /// Checks if the map has an entry for `key`.
    #[inline]
    pub fn contains(&self, key: K) -> bool {
        matches!(self.data.get(key.index()), Some(Some(_)))
    }

    /// Inserts a value for `key`, returning the previous value if there was one.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let index = key.index();

        if index >= self.data.len() {
            self.data.resize_with(index + 1, || None);
        }

        let old = mem::replace(&mut self.data[index], Some(value));

        if old.is_none() {
            self.len += 1;
        }

        old
    }

    /// Removes the entry for `key`, returning it if it existed.
    pub fn remove(&mut self, key: K) -> Option<V> {
        let old = self.data.get_mut(key.index()).and_then(Option::take);

        if old.is_some() {
            self.len -= 1;
        }

        old
    }

    /// Gets the value for `key`, if there is one.
    #[inline]
    pub fn get(&self, key: K) -> Option<&V> {
        self.data.get(key.index()).and_then(Option::as_ref)
    }

    /// Gets the value for `key`, if there is one.
    #[inline]
    pub fn get_mut(&mut self, key: K) -> Option<&mut V> {
        self.data.get_mut(key.index()).and_then(Option::as_mut)
    }

    /// Gets the number of keys with a value.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Checks if no key has a value.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Iterates over every `(key, value)` pair, ordered by key.
    pub fn iter(&self) -> impl Iterator<Item = (K, &V)> {
        self.data
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.as_ref().map(|v| (K::new(i), v)))
    }

    /// Iterates over every key with a value, in order.
    pub fn keys(&self) -> impl Iterator<Item = K> + '_ {
        self.iter().map(|(k, _)| k)
    }
}

impl<K: ArenaKey, V: Default> SecondaryMap<K, V> {
    /// Gets the value for `key`, inserting `V::default()` first if there was no value.
    pub fn get_or_default(&mut self, key: K) -> &mut V {
        if !self.contains(key) {
            self.insert(key, V::default());
        }

        self.data[key.index()]
            .as_mut()
            .expect("value was just inserted")
    }
}

impl<K: ArenaKey, V> Default for SecondaryMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: ArenaKey, V: Debug> Debug for SecondaryMap<K, V> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        crate::arena::debug_write_map(f, "SecondaryMap", self.iter())
    }
}

impl<K: ArenaKey, V> Index<K> for SecondaryMap<K, V> {
    type Output = V;

    #[inline]
    fn index(&self, key: K) -> &Self::Output {
        self.get(key)
            .expect("tried to index with key that has no value")
    }
}

impl<K: ArenaKey, V> IndexMut<K> for SecondaryMap<K, V> {
    #[inline]
    fn index_mut(&mut self, key: K) -> &mut Self::Output {
        self.get_mut(key)
            .expect("tried to index with key that has no value")
    }
}

#[cfg(test)]
mod tests {
    use crate::arena::*;
    use crate::dense_arena_key;

    dense_arena_key! { struct E; }

    #[test]
    fn sparse_insert() {
        let mut map = SecondaryMap::new();
        map.insert(E::new(5), 'c');

        assert!(map.contains(E::new(5)));
        assert!(!map.contains(E::new(2)));
        assert!(!map.contains(E::new(100)));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn insert_replaces() {
        let mut map = SecondaryMap::new();

        assert_eq!(map.insert(E::new(0), 1), None);
        assert_eq!(map.insert(E::new(0), 2), Some(1));
        assert_eq!(map.len(), 1);
        assert_eq!(map[E::new(0)], 2);
    }

    #[test]
    fn remove_updates_len() {
        let mut map = SecondaryMap::new();
        map.insert(E::new(1), "a");
        map.insert(E::new(3), "b");

        assert_eq!(map.remove(E::new(1)), Some("a"));
        assert_eq!(map.remove(E::new(1)), None);
        assert_eq!(map.remove(E::new(9)), None);
        assert_eq!(map.len(), 1);
        assert!(map.keys().eq([E::new(3)]));
    }

    #[test]
    fn get_or_default_inserts() {
        let mut map = SecondaryMap::<E, Vec<i32>>::new();

        map.get_or_default(E::new(2)).push(4);
        map.get_or_default(E::new(2)).push(5);

        assert_eq!(map[E::new(2)], vec![4, 5]);
    }

    #[test]
    #[should_panic(expected = "tried to index with key that has no value")]
    fn index_missing_panics() {
        let map = SecondaryMap::<E, i32>::new();

        let _ = map[E::new(0)];
    }
}
