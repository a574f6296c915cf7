//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::reader::TokPair;

/// An error produced while reading a `.gir` file.
///
/// The position is 1-based and points at the token that caused the
/// error, `len` is the length of that token.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{line}:{col}: {message}")]
pub struct ParseError {
    /// The line of the token that caused the error
    pub line: u32,
    /// The column of the token that caused the error
    pub col: u32,
    /// The length of the token that caused the error
    pub len: u32,
    /// What went wrong
    pub message: String,
}

impl ParseError {
    pub(in crate::reader) fn at(pair: TokPair<'_>, message: String) -> Self {
        Self {
            line: pair.line,
            col: pair.col as u32,
            len: pair.len as u32,
            message,
        }
    }
}

/// Formats a [`ParseError`] into a human-readable string, with the
/// offending line and an underline below the token that caused it.
pub fn format_parse_error(name: &str, source: &str, err: &ParseError) -> String {
    let line = source
        .lines()
        .nth(err.line.saturating_sub(1) as usize)
        .unwrap_or("");

    let (line_n, col_n) = (err.line.to_string(), err.col.to_string());
    let mut error = String::default();

    let num_padding = " ".repeat(line_n.len());
    let col_padding = " ".repeat(err.col.saturating_sub(1) as usize);
    let underline = "^".repeat(err.len.max(1) as usize);

    error += &format!("  --> {name}:{line_n}:{col_n}\n");
    error += &format!(" {num_padding} |\n");
    error += &format!(" {line_n} | {line}\n");
    error += &format!(" {num_padding} | {col_padding}{underline}\n");
    error += &format!(" {num_padding} |\n");
    error += &format!(" {num_padding} = {}", err.message);

    error
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn underlines_the_token() {
        let err = ParseError {
            line: 2,
            col: 3,
            len: 4,
            message: "unknown value '%abc'".to_owned(),
        };

        assert_eq!(err.to_string(), "2:3: unknown value '%abc'");
        assert_eq!(
            format_parse_error("test.gir", "graph() {\n  %abc\n}", &err),
            "  --> test.gir:2:3
   |
 2 |   %abc
   |   ^^^^
   |
   = unknown value '%abc'"
        );
    }
}
