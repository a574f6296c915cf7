//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

//! Defines the transform passes that can be run over gradient graphs.
//!
//! Some of these "transforms" are not actually transformations (the verify
//! and printing passes don't touch the IR at all), but they're all run the
//! same way through a [`GraphPassManager`](crate::pass::GraphPassManager).

mod printers;
mod specialize_zero;
mod verify;

pub use printers::*;
pub use specialize_zero::*;
pub use verify::*;
