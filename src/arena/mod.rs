//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

//! A simple typed arena module.
//!
//! Entities in the IR (values, nodes, blocks) are plain integer keys into
//! these arenas instead of pointers. Graph edges are then just keys stored
//! in other entities, which avoids any ownership cycles between nodes and
//! the values they use.
//!
//! ```
//! # use garnet::arena_key;
//! # use garnet::arena::*;
//! arena_key! {
//!     pub struct Expr;
//! }
//!
//! enum ExprData {
//!     Leaf(u64),
//!     Add(Expr, Expr),
//! }
//!
//! let mut arena = ArenaMap::new();
//!
//! let e1: Expr = arena.insert(ExprData::Leaf(16));
//! let e2 = arena.insert(ExprData::Leaf(3));
//! let e3 = arena.insert(ExprData::Add(e1, e2));
//! ```

mod key;
mod map;
mod secondary;

pub use key::ArenaKey;
pub use map::ArenaMap;
pub use secondary::SecondaryMap;

use std::fmt;
use std::fmt::{Debug, Formatter};

pub(in crate::arena) fn debug_write_map<'a, K, V>(
    f: &mut Formatter<'_>,
    name: &'static str,
    it: impl Iterator<Item = (K, &'a V)>,
) -> fmt::Result
where
    K: ArenaKey,
    V: Debug + 'a,
{
    write!(f, "{name} ")?;

    f.debug_map().entries(it).finish()
}
