//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use ahash::AHashMap;
use std::ops::Index;
use std::rc::Rc;

#[cfg(feature = "enable-serde")]
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A reference to a string inside of a given [`StringPool`].
///
/// Opcode names of opaque nodes and the names of values are stored as these,
/// they are much more compact than a [`String`] and compare in constant time.
///
/// ```
/// # use garnet::utility::*;
/// let mut pool = StringPool::new();
/// let s = pool.insert("mul");
///
/// assert_eq!(&pool[s], "mul");
/// assert_eq!(pool.insert("mul"), s);
/// ```
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub struct Str(u32);

/// De-duplicating storage for strings, mapping them to [`Str`]s.
#[derive(Debug, Clone, Default)]
pub struct StringPool {
    strings: Vec<Rc<str>>,
    refs: AHashMap<Rc<str>, Str>,
}

impl StringPool {
    /// Creates an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a string into the pool, returning the existing [`Str`]
    /// if an equal string was already inserted.
    pub fn insert(&mut self, string: &str) -> Str {
        if let Some(s) = self.refs.get(string) {
            return *s;
        }

        let shared: Rc<str> = Rc::from(string);
        let s = Str(self.strings.len() as u32);

        self.strings.push(Rc::clone(&shared));
        self.refs.insert(shared, s);

        s
    }

    /// Looks up a string without inserting it.
    pub fn find(&self, string: &str) -> Option<Str> {
        self.refs.get(string).copied()
    }

    /// Resolves a [`Str`], if it came from this pool.
    pub fn get(&self, s: Str) -> Option<&str> {
        self.strings.get(s.0 as usize).map(|rc| rc.as_ref())
    }
}

impl Index<Str> for StringPool {
    type Output = str;

    fn index(&self, index: Str) -> &Self::Output {
        self.strings[index.0 as usize].as_ref()
    }
}

#[cfg(feature = "enable-serde")]
impl Serialize for StringPool {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        // the order is what makes the `Str`s stored elsewhere valid, so it's a sequence
        serializer.collect_seq(self.strings.iter().map(|rc| rc.as_ref()))
    }
}

#[cfg(feature = "enable-serde")]
impl<'de> Deserialize<'de> for StringPool {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let strings = Vec::<String>::deserialize(deserializer)?;
        let mut pool = StringPool::new();

        for string in strings.iter() {
            pool.insert(string);
        }

        Ok(pool)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedups_strings() {
        let mut pool = StringPool::new();
        let a = pool.insert("a");
        let b = pool.insert("b");

        assert_ne!(a, b);
        assert_eq!(pool.insert("a"), a);
        assert_eq!(pool.find("b"), Some(b));
        assert_eq!(pool.find("c"), None);
        assert_eq!(pool.get(b), Some("b"));
    }

    #[cfg(feature = "enable-serde")]
    #[test]
    fn serializes_in_order() {
        use serde_test::{assert_ser_tokens, assert_tokens, Token};

        let mut pool = StringPool::new();
        pool.insert("mul");
        pool.insert("sum");

        // `StringPool` has no `PartialEq`, the `Str`s are checked separately
        assert_ser_tokens(
            &pool,
            &[
                Token::Seq { len: Some(2) },
                Token::Str("mul"),
                Token::Str("sum"),
                Token::SeqEnd,
            ],
        );

        assert_tokens(
            &pool.find("sum").unwrap(),
            &[Token::NewtypeStruct { name: "Str" }, Token::U32(1)],
        );
    }
}
