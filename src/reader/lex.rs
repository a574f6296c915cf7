//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use std::fmt;
use std::fmt::{Display, Formatter};
use std::iter::Peekable;
use std::str::Bytes;

/// A lexer for `.gir` that lazily produces tokens.
pub struct Lex<'a> {
    raw: RawLex<'a>,
    next: Option<TokPair<'a>>,
}

impl<'a> Lex<'a> {
    /// Creates a new [`Lex`] based on a given source file.
    pub fn new(source: &'a str) -> Self {
        let mut raw = RawLex::new(source);
        let first = raw.next();

        Self { raw, next: first }
    }

    /// Produces the next token, if one exists. If `None` is returned,
    /// EOF has been reached.
    pub fn next_token(&mut self) -> Option<TokPair<'a>> {
        // stay "one ahead" of the raw lexer, this makes `peek_token` trivial
        let old = self.next.take();

        self.next = self.raw.next();

        old
    }

    /// Returns whether or not the lexer is able to yield more tokens via [`Self::next_token`]
    pub fn is_at_end(&self) -> bool {
        self.next.is_none()
    }

    /// Peek at the next token to be yielded, if there are any
    pub fn peek_token(&self) -> Option<TokPair<'a>> {
        self.next
    }
}

/// A single lex token
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Token<'a> {
    /// A value, `%ident`
    LocalIdent(&'a str),
    /// An opcode, `ident`
    Ident(&'a str),
    /// `graph`
    Graph,
    /// `return`
    Return,
    /// `yield`
    Yield,
    /// `tensor`
    Tensor,
    /// `int`
    Int,
    /// `float`
    Float,
    /// `bool`
    Bool,
    /// `none`
    None,
    /// `zero`
    Zero,
    /// `nonzero`
    Nonzero,
    /// `{`
    CurlyOpen,
    /// `}`
    CurlyClose,
    /// `(`
    ParenOpen,
    /// `)`
    ParenClose,
    /// `[`
    SquareOpen,
    /// `]`
    SquareClose,
    /// `=`
    Eq,
    /// `:`
    Colon,
    /// `,`
    Comma,
    /// An unknown token, almost certainly an error
    Unknown(&'a str),
}

impl<'a> Display for Token<'a> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::LocalIdent(s) => return write!(f, "%{s}"),
            Self::Ident(s) | Self::Unknown(s) => *s,
            Self::Graph => "graph",
            Self::Return => "return",
            Self::Yield => "yield",
            Self::Tensor => "tensor",
            Self::Int => "int",
            Self::Float => "float",
            Self::Bool => "bool",
            Self::None => "none",
            Self::Zero => "zero",
            Self::Nonzero => "nonzero",
            Self::CurlyOpen => "{",
            Self::CurlyClose => "}",
            Self::ParenOpen => "(",
            Self::ParenClose => ")",
            Self::SquareOpen => "[",
            Self::SquareClose => "]",
            Self::Eq => "=",
            Self::Colon => ":",
            Self::Comma => ",",
        };

        write!(f, "{s}")
    }
}

/// A token yielded by the lexer, containing line/col information as well
/// as raw token data.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct TokPair<'a> {
    /// The raw token data
    pub tok: Token<'a>,
    /// The line in the original source that the token is located at
    pub line: u32,
    /// The column in the original source that the token is located at
    pub col: u16,
    /// The total length of the token
    pub len: u16,
}

static_assertions::assert_eq_size!(TokPair<'static>, [usize; 4]);

// implements lexicographic string comparisons at compile time
//
// this is equivalent to `Ord<str, str>`, just written in a way that
// is actually usable inside `const` functions
const fn less_than(left: &'static str, right: &'static str) -> bool {
    let left = left.as_bytes();
    let right = right.as_bytes();
    let mut i = 0;
    let min_length = if left.len() > right.len() {
        right.len()
    } else {
        left.len()
    };

    while i < min_length {
        if left[i] != right[i] {
            return left[i] < right[i];
        }

        i += 1;
    }

    left.len() < right.len()
}

// insertion sort at compile time, so keywords can be binary-searched while lexing
const fn sort_array<const N: usize>(
    mut arr: [(&'static str, Token<'static>); N],
) -> [(&'static str, Token<'static>); N] {
    let mut i = 1;

    while i < N {
        let mut j = i;

        while j > 0 && !less_than(arr[j - 1].0, arr[j].0) {
            let tmp = arr[j - 1];
            arr[j - 1] = arr[j];
            arr[j] = tmp;
            j -= 1;
        }

        i += 1;
    }

    arr
}

const KEYWORDS: [(&str, Token<'static>); 10] = [
    ("graph", Token::Graph),
    ("return", Token::Return),
    ("yield", Token::Yield),
    ("tensor", Token::Tensor),
    ("int", Token::Int),
    ("float", Token::Float),
    ("bool", Token::Bool),
    ("none", Token::None),
    ("zero", Token::Zero),
    ("nonzero", Token::Nonzero),
];

const SORTED_KEYWORDS: [(&str, Token<'static>); 10] = sort_array(KEYWORDS);

struct RawLex<'a> {
    source: &'a str,
    chars: Peekable<Bytes<'a>>,
    current: usize,
    line: usize,
    col: usize,
}

impl<'a> RawLex<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            current: 0,
            line: 1,
            col: 0,
            chars: source.bytes().peekable(),
        }
    }

    fn next(&mut self) -> Option<TokPair<'a>> {
        let ch = self.take_next()?;
        let start = self.current - 1;
        let col = self.col;
        let line = self.line;

        let tok = match ch {
            '%' => match self.try_lex_ident_without_first() {
                Some(ident) => Token::LocalIdent(ident),
                None => Token::Unknown(self.last_consumed_as_str()),
            },
            '{' => Token::CurlyOpen,
            '}' => Token::CurlyClose,
            '(' => Token::ParenOpen,
            ')' => Token::ParenClose,
            '[' => Token::SquareOpen,
            ']' => Token::SquareClose,
            ':' => Token::Colon,
            ',' => Token::Comma,
            '=' => Token::Eq,
            c if c.is_ascii_alphabetic() || c == '_' => self.try_lex_ident_with_first(),
            _ => Token::Unknown(self.last_consumed_as_str()),
        };

        Some(TokPair {
            tok,
            line: line as u32,
            col: col as u16,
            len: (self.current - start) as u16,
        })
    }

    fn lex_ident_raw(&mut self, start: usize) -> &'a str {
        while let Some(c) = self.peek_next() {
            if !(c.is_ascii_alphanumeric() || c == '.' || c == '_') {
                break;
            }

            self.consume_next();
        }

        &self.source[start..self.current]
    }

    // lexes the `ident` part of `%ident`, the `%` has already been consumed
    fn try_lex_ident_without_first(&mut self) -> Option<&'a str> {
        let full = self.lex_ident_raw(self.current);

        (!full.is_empty()).then_some(full)
    }

    // lexes an identifier where the first character has been consumed
    fn try_lex_ident_with_first(&mut self) -> Token<'a> {
        let full = self.lex_ident_raw(self.current - 1);

        if let Ok(idx) = SORTED_KEYWORDS.binary_search_by_key(&full, |(s, _)| *s) {
            SORTED_KEYWORDS[idx].1
        } else {
            Token::Ident(full)
        }
    }

    fn take_next(&mut self) -> Option<char> {
        while let Some(ch) = self.consume_next() {
            if ch.is_ascii_whitespace() {
                continue;
            }

            // comments run until the end of the line
            if ch == ';' {
                while self.peek_next().is_some_and(|c| c != '\n') {
                    self.consume_next();
                }

                continue;
            }

            return Some(ch);
        }

        None
    }

    fn consume_next(&mut self) -> Option<char> {
        let ch = self.chars.next();

        if let Some(ch) = ch {
            if ch == b'\n' {
                self.line += 1;
                self.col = 0;
            } else {
                self.col += 1;
            }

            self.current += 1;
        }

        ch.map(|ch| ch as char)
    }

    #[inline]
    fn peek_next(&mut self) -> Option<char> {
        self.chars.peek().map(|&ch| ch as char)
    }

    #[inline]
    fn last_consumed_as_str(&self) -> &'a str {
        &self.source[self.current - 1..self.current]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(source: &str) -> Vec<Token<'_>> {
        let mut lex = Lex::new(source);
        let mut result = Vec::new();

        while let Some(pair) = lex.next_token() {
            result.push(pair.tok);
        }

        result
    }

    #[test]
    fn keywords_are_recognized() {
        assert_eq!(
            tokens("graph tensor(zero) int[] nonzero yield return none"),
            [
                Token::Graph,
                Token::Tensor,
                Token::ParenOpen,
                Token::Zero,
                Token::ParenClose,
                Token::Int,
                Token::SquareOpen,
                Token::SquareClose,
                Token::Nonzero,
                Token::Yield,
                Token::Return,
                Token::None
            ]
        );
    }

    #[test]
    fn idents_and_values() {
        assert_eq!(
            tokens("%x.1 = autograd_add %0, %_y"),
            [
                Token::LocalIdent("x.1"),
                Token::Eq,
                Token::Ident("autograd_add"),
                Token::LocalIdent("0"),
                Token::Comma,
                Token::LocalIdent("_y"),
            ]
        );
    }

    #[test]
    fn comments_are_skipped() {
        assert_eq!(
            tokens("; a comment\n%x ; another\n}"),
            [Token::LocalIdent("x"), Token::CurlyClose]
        );
    }

    #[test]
    fn positions_are_one_based() {
        let mut lex = Lex::new("graph\n  %abc");
        let first = lex.next_token().unwrap();
        let second = lex.next_token().unwrap();

        assert_eq!((first.line, first.col, first.len), (1, 1, 5));
        assert_eq!((second.line, second.col, second.len), (2, 3, 4));
        assert!(lex.is_at_end());
    }

    #[test]
    fn unknown_characters() {
        assert_eq!(
            tokens("% $"),
            [Token::Unknown("%"), Token::Unknown("$")]
        );
    }

    #[test]
    fn display_matches_source() {
        for tok in tokens("graph %x ( ) { } [ ] = : , mul") {
            let text = tok.to_string();

            assert_eq!(tokens(&text), [tok]);
        }
    }
}
