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
use crate::pass::GraphTransformPass;

/// Manages running a set of passes over a graph.
///
/// An important note is that this is actually a pass itself, it's a pass
/// that simply runs other passes.
#[derive(Default)]
pub struct GraphPassManager {
    passes: Vec<Box<dyn GraphTransformPass>>,
}

impl GraphPassManager {
    /// Creates a new, empty, pass manager.
    pub fn new() -> Self {
        Self {
            passes: Vec::default(),
        }
    }

    /// Adds a transformation pass to the pass manager. This pass's order is defined
    /// relative to other calls to [`Self::add_pass`].
    pub fn add_pass<T: GraphTransformPass + 'static>(&mut self, pass: T) {
        self.passes.push(Box::new(pass));
    }

    /// Gets the number of passes that will be run.
    pub fn len(&self) -> usize {
        self.passes.len()
    }

    /// Checks if the manager has no passes.
    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }
}

impl GraphTransformPass for GraphPassManager {
    fn run(&mut self, graph: &mut Graph) -> bool {
        let mut changed = false;

        // every pass runs even after one reports a change
        for pass in self.passes.iter_mut() {
            changed |= pass.run(graph);
        }

        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::*;
    use std::cell::Cell;
    use std::rc::Rc;

    struct Counting {
        runs: Rc<Cell<u32>>,
        changes: bool,
    }

    impl GraphTransformPass for Counting {
        fn run(&mut self, _: &mut Graph) -> bool {
            self.runs.set(self.runs.get() + 1);

            self.changes
        }
    }

    #[test]
    fn runs_every_pass_and_ors_results() {
        let runs = Rc::new(Cell::new(0));
        let mut manager = GraphPassManager::new();
        let mut graph = Graph::new();

        manager.add_pass(Counting {
            runs: runs.clone(),
            changes: true,
        });
        manager.add_pass(Counting {
            runs: runs.clone(),
            changes: false,
        });

        assert_eq!(manager.len(), 2);
        assert!(manager.run(&mut graph));
        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn empty_manager_changes_nothing() {
        let mut manager = GraphPassManager::new();
        let mut graph = Graph::new();

        assert!(manager.is_empty());
        assert!(!manager.run(&mut graph));
    }
}
