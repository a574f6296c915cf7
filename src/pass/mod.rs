//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

//! Defines the pass infrastructure used to run transforms over graphs.
//!
//! Passes at their core are just objects that take in IR and report
//! whether they changed it:
//!
//! ```
//! # use garnet::ir::Graph;
//! struct Pass { /* ... */ }
//!
//! impl Pass {
//!     fn run(&mut self, ir: &mut Graph) -> bool { false }
//! }
//! ```
//!
//! Passes are allowed to take a `&mut self` to keep internal state
//! during the run (and potentially across runs), but they should always
//! act as-if they were pure functions. Running the same pass over the
//! same IR should produce the same output every time.
//!
//! The main trait used here is [`GraphTransformPass`], and pipelines are
//! built with a [`GraphPassManager`].

mod manager;
mod transform;

pub use manager::*;
pub use transform::*;
