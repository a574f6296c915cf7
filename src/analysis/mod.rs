//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

//! Analyses over gradient graphs.
//!
//! These never modify the graph they're given. The transforms in
//! [`crate::transforms`] use them to decide what to rewrite, and the
//! writer is used by anything that needs human-readable output.

mod writer;
mod zero_state;

pub use writer::*;
pub use zero_state::*;
