//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::ir::Graph;

/// Models a pass that possibly performs a transformation over a graph.
///
/// Not every pass actually modifies the IR (printers and the verifier
/// don't), but every pass has the ability to.
pub trait GraphTransformPass {
    /// Performs the transformation over a given graph, and returns whether
    /// the graph was changed.
    ///
    /// This function is expected to act as-if it was pure, i.e. calling the same
    /// pass multiple times on the same IR should produce equivalent IR each time.
    fn run(&mut self, graph: &mut Graph) -> bool;
}
