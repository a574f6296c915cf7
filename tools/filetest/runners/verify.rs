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

// every file here has to either verify cleanly and print back out the
// same, or be rejected (by the parser or the verifier) with the expected error
fn verify(name: &str, content: &str) -> TestResult {
    let graph = match garnet::parse_gir(content) {
        Ok(graph) => graph,
        Err(err) => return TestResult::CompileError(format_parse_error(name, content, &err)),
    };

    match transforms::verify_graph(&graph) {
        Ok(()) => TestResult::Output(analysis::stringify_graph(&graph)),
        Err(errors) => {
            let messages: Vec<String> = errors.iter().map(|e| format!("error: {e}")).collect();

            TestResult::CompileError(messages.join("\n"))
        }
    }
}

pub const fn verify_subtest() -> Subtest {
    Subtest::new("verify", verify)
}
