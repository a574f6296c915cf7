//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

#![deny(
    unreachable_pub,
    missing_docs,
    missing_abi,
    rust_2018_idioms,
    rustdoc::broken_intra_doc_links,
    rustdoc::private_intra_doc_links
)]

//! # Garnet
//!
//! A small gradient-graph IR, and a pass that specializes gradient graphs
//! based on which values are statically known to be autograd zeros.
//!
//! ```
//! # use garnet::transforms::specialize_autograd_zero;
//! let mut graph = garnet::parse_gir(
//!     "graph(%x: tensor(zero), %y: tensor(nonzero)) {
//!   %s = autograd_add %x, %y
//!   return %s
//! }",
//! )
//! .unwrap();
//!
//! specialize_autograd_zero(&mut graph);
//!
//! assert_eq!(
//!     garnet::analysis::stringify_graph(&graph),
//!     "graph(%x: tensor(zero), %y: tensor(nonzero)) {
//!   return %y
//! }
//! "
//! );
//! ```

pub mod analysis;
pub mod arena;
pub mod ir;
pub mod pass;
pub mod reader;
pub mod transforms;
pub mod utility;

#[cfg(feature = "dev-tools")]
pub mod cli;

use crate::pass::{GraphPassManager, GraphTransformPass};
use crate::transforms::{GraphWriterPass, SpecializeAutogradZeroPass, VerifyGraphPass};
use log::debug;

pub use reader::parse_gir;

/// Every pass name that [`run_passes`] understands.
pub const PASS_NAMES: [&str; 3] = ["specialize-autograd-zero", "graph-stdout", "graph-stderr"];

/// A helper function that handles "run these passes specified by the user" in a way that multiple
/// tools can use.
///
/// This is not intended to be used for pre-determined pass pipelines, but is useful for tools
/// that work in a similar way to `gopt`.
///
/// - `verify` is whether to insert verify passes between all passes
/// - `passes` is the user-specified list of passes
/// - `extra` are any extra passes that must be run after `passes` that are provided by the tool
///
/// Returns whether any pass changed the graph. Panics if a pass name isn't one of
/// [`PASS_NAMES`], or if `verify` is set and the graph fails verification.
pub fn run_passes(
    graph: &mut ir::Graph,
    verify: bool,
    passes: &[String],
    extra: &[&'static str],
) -> bool {
    let mut gpm = GraphPassManager::new();

    if verify {
        gpm.add_pass(VerifyGraphPass);
    }

    for pass in passes
        .iter()
        .cloned()
        .chain(extra.iter().map(|s| s.to_string()))
    {
        match pass.as_str() {
            "specialize-autograd-zero" => gpm.add_pass(SpecializeAutogradZeroPass),
            "graph-stdout" => gpm.add_pass(GraphWriterPass::stdout()),
            "graph-stderr" => gpm.add_pass(GraphWriterPass::stderr()),
            name => panic!("unknown pass '{name}'"),
        }

        if verify {
            gpm.add_pass(VerifyGraphPass);
        }
    }

    debug!("running {} passes", gpm.len());

    gpm.run(graph)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = "graph(%x: tensor(zero), %y: tensor) {
  %g = grad_of %x {
    %t = mul %x, %y : tensor
    yield %t
  }
  return %g
}";

    #[test]
    fn pipeline_reports_changes() {
        let mut graph = parse_gir(SOURCE).unwrap();
        let passes = ["specialize-autograd-zero".to_owned()];

        assert!(run_passes(&mut graph, true, &passes, &[]));
        assert!(!run_passes(&mut graph, true, &passes, &[]));
        assert_eq!(
            analysis::stringify_graph(&graph),
            "graph(%x: tensor(zero), %y: tensor) {
  %0 = autograd_zero
  return %0
}
"
        );
    }

    #[test]
    #[should_panic(expected = "unknown pass 'dce'")]
    fn unknown_passes_are_rejected() {
        let mut graph = parse_gir(SOURCE).unwrap();

        run_passes(&mut graph, false, &["dce".to_owned()], &[]);
    }
}
