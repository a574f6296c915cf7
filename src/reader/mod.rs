//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

//! A hand-written lexer and parser for the textual `.gir` format.
//!
//! ```none
//! graph(%x: tensor(nonzero), %n: int) {
//!   %z = autograd_zero
//!   %y = autograd_add %x, %z
//!   %g = grad_of %y {
//!     %t = mul %y, %n : tensor
//!     yield %t
//!   }
//!   return %g
//! }
//! ```
//!
//! Comments start with `;` and run until the end of the line.

mod errors;
mod lex;
mod parse;

pub use errors::*;
pub use lex::*;
pub use parse::*;
