//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use std::fmt::Debug;

/// Models a type that can act as a key for the arena map types.
///
/// Keys are just typed indices, they carry no information about which
/// arena they came from. Using a key from one graph inside of another
/// graph is a logic error that will not be caught.
///
/// This should not be implemented by hand, prefer [`arena_key`](crate::arena_key)
/// or [`dense_arena_key`](crate::dense_arena_key).
pub trait ArenaKey: Copy + Eq + Debug {
    /// Creates a new key from a given arena index.
    ///
    /// Panics if `index` cannot be represented by the key's storage type.
    fn new(index: usize) -> Self;

    /// Converts the key back into the index it was created from.
    fn index(self) -> usize;
}

/// Creates a type-safe key for a [`ArenaMap`](crate::arena::ArenaMap) and
/// the maps that are keyed off of it.
///
/// ```
/// # use garnet::arena_key;
/// # use garnet::arena::ArenaMap;
/// arena_key! {
///     /// Uses `usize` as the storage type.
///     pub struct EntityRef;
///
///     struct TinyRef(u8);
/// }
///
/// let mut map = ArenaMap::new();
/// let key: EntityRef = map.insert("entity");
///
/// assert_eq!(map[key], "entity");
/// ```
#[macro_export(local_inner_macros)]
macro_rules! arena_key {
    ( $(#[$outer:meta])* $vis:vis struct $name:ident($ty:ty); $($rest:tt)* ) => {
        $(#[$outer])*
        #[repr(transparent)]
        #[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
        #[cfg_attr(feature = "enable-serde", derive(serde::Serialize, serde::Deserialize))]
        $vis struct $name($ty);

        impl $crate::arena::ArenaKey for $name {
            #[inline]
            fn new(index: usize) -> Self {
                use std::convert::TryInto;

                Self(index.try_into().expect("index is not representable with key type"))
            }

            #[inline]
            fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl ::std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
                std::write!(f, "{}({})", std::stringify!($name), self.0)
            }
        }

        arena_key!($($rest)*);
    };

    ( $(#[$outer:meta])* $vis:vis struct $name:ident; $($rest:tt)* ) => {
        arena_key! { $(#[$outer])* $vis struct $name(usize); $($rest)* }
    };

    () => {}
}

/// Acts like [`arena_key`] but always stores a [`u32`], and reserves
/// `u32::MAX` so the key can be stored in a [`PackedOption`](crate::utility::PackedOption).
///
/// ```
/// # use garnet::dense_arena_key;
/// # use garnet::utility::{Packable, PackedOption};
/// dense_arena_key! {
///     pub struct DenseRef;
/// }
///
/// let none = PackedOption::<DenseRef>::none();
///
/// assert!(none.is_none());
/// ```
#[macro_export(local_inner_macros)]
macro_rules! dense_arena_key {
    ( $(#[$outer:meta])* $vis:vis struct $name:ident; $($rest:tt)* ) => {
        arena_key! { $(#[$outer])* $vis struct $name(u32); }

        impl $crate::utility::Packable for $name {
            #[inline]
            fn reserved() -> Self {
                Self(u32::MAX)
            }

            #[inline]
            fn is_reserved(&self) -> bool {
                self.0 == u32::MAX
            }
        }

        dense_arena_key!($($rest)*);
    };

    () => {}
}

#[cfg(test)]
mod tests {
    use crate::arena::*;
    use crate::utility::Packable;
    use static_assertions::assert_eq_size;

    #[test]
    fn reserved_key_works() {
        dense_arena_key! { struct K; }

        let mut map = ArenaMap::<K, i32>::default();

        let k1 = map.insert(15);
        let k2 = map.insert(32);
        let k3 = K::reserved();

        assert!(k3.is_reserved());
        assert!(!k2.is_reserved());
        assert!(!k1.is_reserved());
    }

    #[test]
    fn arena_key_default_is_usize() {
        arena_key! { struct Key; }

        assert_eq_size!(Key, usize);
    }

    #[test]
    fn dense_arena_key_is_u32() {
        dense_arena_key! { struct Key; }

        assert_eq_size!(Key, u32);
    }

    #[test]
    fn debug_prints_name_and_index() {
        dense_arena_key! { struct Thing; }

        let mut map = ArenaMap::new();
        let _: Thing = map.insert(());
        let k: Thing = map.insert(());

        assert_eq!(format!("{k:?}"), "Thing(1)");
    }

    #[test]
    #[should_panic(expected = "index is not representable with key type")]
    fn arena_key_bounds_causes_panic() {
        arena_key! { struct Key(u8); }

        let mut map = ArenaMap::new();

        // 1 past what u8 can represent
        for i in 0..=256 {
            let k: Key = map.insert(i);

            assert_eq!(map[k], i);
        }
    }

    #[cfg(feature = "enable-serde")]
    #[test]
    fn dense_key_serializes_as_newtype() {
        use serde_test::{assert_tokens, Token};

        dense_arena_key! { struct Key; }

        let mut map = ArenaMap::new();
        let _: Key = map.insert(0);
        let k: Key = map.insert(1);

        assert_tokens(&k, &[Token::NewtypeStruct { name: "Key" }, Token::U32(1)]);
    }
}
