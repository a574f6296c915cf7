//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

//! The graph IR that the autograd transforms operate on.
//!
//! A [`Graph`] is made of [`Value`]s, [`Node`]s and [`Block`]s. Every entity
//! is a small key into an arena owned by the [`DataFlowGraph`], and the order
//! of the nodes inside of each block lives separately in the [`Layout`].

mod builders;
mod cursor;
mod dfg;
mod entities;
mod graph;
mod layout;
mod node;
mod node_builder;
mod types;

pub use builders::*;
pub use cursor::*;
pub use dfg::*;
pub use entities::*;
pub use graph::*;
pub use layout::*;
pub use node::*;
pub use node_builder::*;
pub use types::*;
