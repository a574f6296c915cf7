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
use garnet::reader::format_parse_error;
use garnet::transforms;

fn parser_output(name: &str, content: &str) -> TestResult {
    match garnet::parse_gir(content) {
        Ok(graph) => {
            // this also tests the verifier. Every graph we parse should
            // also correctly verify, anything that doesn't is a bug.
            transforms::verify_graph_panic(&graph);

            TestResult::Output(analysis::stringify_graph(&graph))
        }
        Err(err) => TestResult::CompileError(format_parse_error(name, content, &err)),
    }
}

pub const fn parse_subtest() -> Subtest {
    Subtest::new("parse", parser_output)
}
