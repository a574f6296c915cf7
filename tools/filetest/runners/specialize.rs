//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::subtest::{Subtest, TestResult};
use garnet::analysis;
use garnet::pass::{GraphPassManager, GraphTransformPass};
use garnet::reader::format_parse_error;
use garnet::transforms::{self, SpecializeAutogradZeroPass, VerifyGraphPass};

fn specialize(name: &str, content: &str) -> TestResult {
    match garnet::parse_gir(content) {
        Ok(mut graph) => {
            transforms::verify_graph_panic(&graph);

            let mut gpm = GraphPassManager::new();
            gpm.add_pass(SpecializeAutogradZeroPass);
            gpm.add_pass(VerifyGraphPass);

            gpm.run(&mut graph);

            TestResult::Output(analysis::stringify_graph(&graph))
        }
        Err(err) => TestResult::CompileError(format_parse_error(name, content, &err)),
    }
}

pub const fn specialize_subtest() -> Subtest {
    Subtest::new("specialize", specialize)
}
