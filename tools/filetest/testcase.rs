//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::subtest::TestResult;

#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub enum TestFailure {
    Diff { expected: String, got: String },
    Missing { check: String, full: String },
    CompileError(String),
    Panic(String, String),
    LackOfCompileError,
}

/// What a test file expects its output to look like. This is decided
/// by the first line of the file.
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
enum Check<'data> {
    /// `; MATCH-ENTIRE`, the output must be the rest of the file verbatim
    Entire(&'data str),
    /// `; MATCH-SECTION`, the output must contain the commented-out block
    /// that follows the header
    Section(String),
    /// `; STANDARD`, every `; CHECK:` line must appear in the output in order
    Lines(Vec<&'data str>),
    /// `; COMPILE-ERROR: <message>`, the runner must fail with an error
    /// containing the message
    Error(&'data str),
}

fn split_header(contents: &str) -> Option<(&str, &str)> {
    contents.split_once('\n')
}

// a section looks like this, and ends at the first `;;`:
//
// ; MATCH-SECTION
// ;
// ; graph(%x: tensor) {
// ;   return %x
// ; }
// ;;
fn parse_section(rest: &str) -> Check<'_> {
    let mut lines = rest.lines();
    let mut section = String::default();

    assert_eq!(lines.next(), Some(";"), "section must start with a lone `;`");

    // only the `; ` prefix is removed, the indentation after it is kept
    for line in lines
        .map(|line| line.trim_end())
        .take_while(|line| *line != ";;")
    {
        section += line.strip_prefix("; ").unwrap_or("");
        section += "\n";
    }

    Check::Section(section)
}

fn parse_lines(rest: &str) -> Check<'_> {
    let checks = rest
        .lines()
        .filter_map(|line| line.trim_start().strip_prefix("; CHECK: "))
        .collect();

    Check::Lines(checks)
}

fn parse_check<'data>(name: &str, contents: &'data str) -> Check<'data> {
    let (first, rest) = match split_header(contents) {
        Some(data) => data,
        None => return Check::Lines(Vec::default()),
    };

    if first.starts_with("; MATCH-ENTIRE") {
        return Check::Entire(rest);
    }

    if first.starts_with("; MATCH-SECTION") {
        return parse_section(rest);
    }

    if let Some(message) = first.strip_prefix("; COMPILE-ERROR: ") {
        return Check::Error(message.trim_end());
    }

    if first.starts_with("; STANDARD") {
        return parse_lines(rest);
    }

    panic!("test '{name}' did not provide `; <TYPE>` header for `filetest`. got: '{first}'")
}

fn output_or_failure(output: TestResult) -> Result<String, TestFailure> {
    match output {
        TestResult::Output(data) => Ok(data),
        TestResult::CompileError(err) => Err(TestFailure::CompileError(err)),
    }
}

fn match_entire(output: TestResult, expected: &str) -> Result<(), TestFailure> {
    let got = output_or_failure(output)?;

    if got == expected {
        Ok(())
    } else {
        Err(TestFailure::Diff {
            expected: expected.to_owned(),
            got,
        })
    }
}

fn match_section(output: TestResult, section: &str) -> Result<(), TestFailure> {
    let got = output_or_failure(output)?;

    if got.contains(section) {
        Ok(())
    } else {
        Err(TestFailure::Diff {
            expected: section.to_owned(),
            got,
        })
    }
}

fn match_error(output: TestResult, err: &str) -> Result<(), TestFailure> {
    match output {
        TestResult::CompileError(got) if got.contains(err) => Ok(()),
        TestResult::CompileError(got) => Err(TestFailure::CompileError(got)),
        TestResult::Output(_) => Err(TestFailure::LackOfCompileError),
    }
}

fn match_lines(output: TestResult, checks: &[&str]) -> Result<(), TestFailure> {
    let got = output_or_failure(output)?;
    let mut checks = checks.iter().peekable();

    for line in got.lines() {
        match checks.peek() {
            Some(&&check) if line.trim() == check.trim() => {
                checks.next();
            }
            Some(_) => {}
            None => break,
        }
    }

    match checks.next() {
        None => Ok(()),
        Some(check) => Err(TestFailure::Missing {
            check: check.to_string(),
            full: got,
        }),
    }
}

#[derive(Debug, Hash, Eq, PartialEq)]
pub struct FileTestCase<'data> {
    check: Check<'data>,
}

impl<'data> FileTestCase<'data> {
    pub fn from_raw(name: &str, raw: &'data str) -> Self {
        Self {
            check: parse_check(name, raw),
        }
    }

    pub fn check(&self, output: TestResult) -> Result<(), TestFailure> {
        match &self.check {
            Check::Entire(expected) => match_entire(output, expected),
            Check::Section(section) => match_section(output, section),
            Check::Error(error) => match_error(output, error),
            Check::Lines(checks) => match_lines(output, checks),
        }
    }
}

#[test]
fn section_keeps_indentation() {
    let case = FileTestCase::from_raw(
        "t.gir",
        "; MATCH-SECTION\n;\n; graph() {\n;   return\n; }\n;;\ngraph() {\n  return\n}\n",
    );

    assert_eq!(
        case.check,
        Check::Section("graph() {\n  return\n}\n".to_owned())
    );
}

#[test]
fn checks_must_appear_in_order() {
    let case = FileTestCase::from_raw("t.gir", "; STANDARD\n; CHECK: b\n; CHECK: a\n");
    let output = TestResult::Output("a\nb\n".to_owned());

    assert!(matches!(
        case.check(output),
        Err(TestFailure::Missing { check, .. }) if check == "a"
    ));
}
