//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::ir::*;
use crate::reader::{Lex, ParseError, TokPair, Token};
use crate::utility::SaHashMap;
use smallvec::SmallVec;

/// Parses a string containing a single `.gir` graph.
///
/// ```
/// # use garnet::reader::parse_gir;
/// let graph = parse_gir(
///     "graph(%x: tensor) {
///        %z = autograd_zero
///        %y = autograd_add %x, %z
///        return %y
///      }",
/// )
/// .unwrap();
///
/// assert_eq!(graph.nodes().count(), 2);
/// ```
pub fn parse_gir(source: &str) -> Result<Graph, ParseError> {
    Parser::new(source).parse()
}

type ParseResult<T> = Result<T, ParseError>;

/// Parses a string containing a `.gir` graph.
///
/// The parser builds the graph as it goes, so a value is only visible
/// after the node that defines it. Values defined inside of a block
/// are only visible inside of that block.
pub struct Parser<'a> {
    lex: Lex<'a>,
    builder: GraphBuilder,
    scopes: Vec<SaHashMap<&'a str, Value>>,
    last: Option<TokPair<'a>>,
}

impl<'a> Parser<'a> {
    /// Creates a parser for `source`.
    pub fn new(source: &'a str) -> Self {
        Self {
            lex: Lex::new(source),
            builder: GraphBuilder::new(),
            scopes: vec![SaHashMap::default()],
            last: None,
        }
    }

    /// Parses the entire source, and returns the graph if there were no errors.
    pub fn parse(mut self) -> ParseResult<Graph> {
        self.expect(Token::Graph)?;
        self.expect(Token::ParenOpen)?;

        if !self.eat(Token::ParenClose) {
            loop {
                let (name, pair) = self.local()?;
                self.expect(Token::Colon)?;
                let ty = self.ty()?;
                let value = self.builder.input(ty);

                self.define(name, pair, value)?;

                if !self.eat(Token::Comma) {
                    break;
                }
            }

            self.expect(Token::ParenClose)?;
        }

        let entry = self.builder.entry_block();

        self.expect(Token::CurlyOpen)?;
        self.body(entry, Token::Return)?;
        self.expect(Token::CurlyClose)?;

        if let Some(pair) = self.lex.next_token() {
            return Err(ParseError::at(
                pair,
                format!("expected end of file, found '{}'", pair.tok),
            ));
        }

        Ok(self.builder.finish())
    }

    // parses nodes until `terminator`, and then the values after it
    fn body(&mut self, block: Block, terminator: Token<'a>) -> ParseResult<()> {
        loop {
            let pair = self.peek()?;

            if pair.tok == terminator {
                self.next()?;

                break;
            }

            self.builder.switch_to(block);
            self.node()?;
        }

        let outputs = if self.peek()?.tok == Token::CurlyClose {
            SmallVec::new()
        } else {
            self.values()?
        };

        self.builder.set_block_outputs(block, &outputs);

        Ok(())
    }

    fn node(&mut self) -> ParseResult<()> {
        let mut results: SmallVec<[(&'a str, TokPair<'a>); 2]> = SmallVec::new();

        if let Token::LocalIdent(_) = self.peek()?.tok {
            loop {
                results.push(self.local()?);

                if !self.eat(Token::Comma) {
                    break;
                }
            }

            self.expect(Token::Eq)?;
        }

        let op = self.next()?;
        let opcode = match op.tok {
            Token::Ident(opcode) => opcode,
            tok => return Err(ParseError::at(op, format!("expected opcode, found '{tok}'"))),
        };

        // operands have to start on the same line as the opcode, otherwise
        // `%z = autograd_zero` followed by `%y = ...` would be ambiguous
        let inputs = match self.lex.peek_token() {
            Some(TokPair {
                tok: Token::LocalIdent(_),
                line,
                ..
            }) if line == op.line => self.values()?,
            _ => SmallVec::new(),
        };

        let tys = if self.eat(Token::Colon) {
            let mut tys: SmallVec<[Type; 2]> = SmallVec::new();

            loop {
                tys.push(self.ty()?);

                if !self.eat(Token::Comma) {
                    break;
                }
            }

            tys
        } else {
            SmallVec::new()
        };

        let current = self.builder.current_block();
        let mut blocks: SmallVec<[Block; 1]> = SmallVec::new();

        while self.eat(Token::CurlyOpen) {
            let block = self.builder.create_block();

            self.scopes.push(SaHashMap::default());
            self.body(block, Token::Yield)?;
            self.scopes.pop();
            self.expect(Token::CurlyClose)?;

            blocks.push(block);
        }

        self.builder.switch_to(current);

        let kind = match NodeKind::from_keyword(opcode) {
            Some(kind) => kind,
            None => NodeKind::Op(self.builder.intern(opcode)),
        };

        let arity_error = |message: &str| {
            Err(ParseError::at(
                op,
                format!("invalid '{opcode}' node: {message}"),
            ))
        };

        if !kind.is_opaque() && !tys.is_empty() {
            return arity_error("result types are only written for opaque nodes");
        }

        let outputs: SmallVec<[Value; 2]> = match kind {
            NodeKind::AutogradZero | NodeKind::AutogradAdd | NodeKind::Add => {
                let expected = if kind == NodeKind::AutogradZero { 0 } else { 2 };

                if inputs.len() != expected {
                    return arity_error(&format!("expected {expected} inputs, got {}", inputs.len()));
                }

                if results.len() != 1 || !blocks.is_empty() {
                    return arity_error("expected exactly one result and no blocks");
                }

                let value = match kind {
                    NodeKind::AutogradZero => self.builder.append().autograd_zero(),
                    NodeKind::AutogradAdd => self.builder.append().autograd_add(inputs[0], inputs[1]),
                    _ => self.builder.append().add(inputs[0], inputs[1]),
                };

                SmallVec::from_slice(&[value])
            }
            NodeKind::GradOf => {
                if blocks.len() != 1 {
                    return arity_error("expected exactly one block");
                }

                let yielded = self.builder.dfg().block(blocks[0]).outputs().len();

                if results.len() != inputs.len() || results.len() != yielded {
                    return arity_error(&format!(
                        "{} inputs, {} results and {} yielded values must all match",
                        inputs.len(),
                        results.len(),
                        yielded
                    ));
                }

                let node = self.builder.append().grad_of(&inputs, blocks[0]);

                SmallVec::from_slice(self.builder.dfg().node(node).outputs())
            }
            NodeKind::Op(_) => {
                if results.len() != tys.len() {
                    return arity_error(&format!(
                        "{} results but {} result types",
                        results.len(),
                        tys.len()
                    ));
                }

                let node = self.builder.append().build(kind, &inputs, &tys, &blocks);

                SmallVec::from_slice(self.builder.dfg().node(node).outputs())
            }
        };

        for (&(name, pair), &value) in results.iter().zip(outputs.iter()) {
            self.define(name, pair, value)?;
        }

        Ok(())
    }

    fn values(&mut self) -> ParseResult<SmallVec<[Value; 2]>> {
        let mut values = SmallVec::new();

        loop {
            let (name, pair) = self.local()?;

            values.push(self.lookup(name, pair)?);

            if !self.eat(Token::Comma) {
                break;
            }
        }

        Ok(values)
    }

    fn ty(&mut self) -> ParseResult<Type> {
        let pair = self.next()?;

        let ty = match pair.tok {
            Token::Tensor => {
                if self.eat(Token::ParenOpen) {
                    let annotation = self.next()?;
                    let zero = match annotation.tok {
                        Token::Zero => true,
                        Token::Nonzero => false,
                        tok => {
                            return Err(ParseError::at(
                                annotation,
                                format!("expected 'zero' or 'nonzero', found '{tok}'"),
                            ))
                        }
                    };

                    self.expect(Token::ParenClose)?;

                    return Ok(Type::Tensor(TensorType::annotated(zero)));
                }

                if self.list_suffix()? {
                    Type::TensorList
                } else {
                    Type::tensor()
                }
            }
            Token::Int => {
                if self.list_suffix()? {
                    Type::IntList
                } else {
                    Type::Int
                }
            }
            Token::Float => Type::Float,
            Token::Bool => Type::Bool,
            Token::None => Type::None,
            tok => return Err(ParseError::at(pair, format!("expected type, found '{tok}'"))),
        };

        Ok(ty)
    }

    fn list_suffix(&mut self) -> ParseResult<bool> {
        if self.eat(Token::SquareOpen) {
            self.expect(Token::SquareClose)?;

            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn local(&mut self) -> ParseResult<(&'a str, TokPair<'a>)> {
        let pair = self.next()?;

        match pair.tok {
            Token::LocalIdent(name) => Ok((name, pair)),
            tok => Err(ParseError::at(pair, format!("expected value, found '{tok}'"))),
        }
    }

    fn define(&mut self, name: &'a str, pair: TokPair<'a>, value: Value) -> ParseResult<()> {
        if self.scopes.iter().any(|scope| scope.contains_key(name)) {
            return Err(ParseError::at(
                pair,
                format!("redefinition of value '%{name}'"),
            ));
        }

        self.builder.set_name(value, name);
        self.scopes
            .last_mut()
            .expect("scope stack is never empty")
            .insert(name, value);

        Ok(())
    }

    fn lookup(&self, name: &'a str, pair: TokPair<'a>) -> ParseResult<Value> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name).copied())
            .ok_or_else(|| ParseError::at(pair, format!("unknown value '%{name}'")))
    }

    fn expect(&mut self, expected: Token<'static>) -> ParseResult<TokPair<'a>> {
        let pair = self.next()?;

        if pair.tok == expected {
            Ok(pair)
        } else {
            Err(ParseError::at(
                pair,
                format!("expected '{expected}', found '{}'", pair.tok),
            ))
        }
    }

    fn eat(&mut self, tok: Token<'static>) -> bool {
        match self.lex.peek_token() {
            Some(pair) if pair.tok == tok => {
                self.last = self.lex.next_token();

                true
            }
            _ => false,
        }
    }

    fn peek(&self) -> ParseResult<TokPair<'a>> {
        self.lex.peek_token().ok_or_else(|| self.eof_error())
    }

    fn next(&mut self) -> ParseResult<TokPair<'a>> {
        let pair = self.lex.next_token().ok_or_else(|| self.eof_error())?;

        self.last = Some(pair);

        Ok(pair)
    }

    fn eof_error(&self) -> ParseError {
        let (line, col) = self
            .last
            .map_or((1, 1), |pair| (pair.line, pair.col as u32 + pair.len as u32));

        ParseError {
            line,
            col,
            len: 1,
            message: "unexpected end of file".to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::stringify_graph;

    fn roundtrip(source: &str) {
        let graph = parse_gir(source).unwrap();

        assert_eq!(stringify_graph(&graph), source);
    }

    fn error(source: &str) -> String {
        parse_gir(source).unwrap_err().to_string()
    }

    #[test]
    fn canonical_text_is_reproduced() {
        roundtrip(
            "graph(%x: tensor(nonzero), %n: int) {
  %z = autograd_zero
  %y = autograd_add %x, %z
  %g0, %g1 = grad_of %x, %y {
    %t = mul %x, %y : tensor
    yield %t, %t
  }
  %s = sum %g0, %n : tensor
  print %s
  return %s, %g1
}
",
        );
    }

    #[test]
    fn every_type_parses() {
        roundtrip(
            "graph(%a: tensor, %b: tensor(zero), %c: tensor[], %d: int, %e: int[], %f: float, %g: bool, %h: none) {
  return
}
",
        );
    }

    #[test]
    fn opaque_nodes_can_own_blocks() {
        roundtrip(
            "graph(%c: bool, %x: tensor) {
  %r = if %c : tensor {
    yield %x
  } {
    %z = autograd_zero
    yield %z
  }
  return %r
}
",
        );
    }

    #[test]
    fn names_are_kept() {
        let graph = parse_gir("graph(%x: tensor) {\n  return %x\n}").unwrap();

        assert_eq!(graph.dfg.name(graph.inputs()[0]), Some("x"));
        assert_eq!(graph.outputs(), graph.inputs());
    }

    #[test]
    fn unknown_value() {
        assert_eq!(
            error("graph(%x: tensor) {\n  %y = add %x, %w\n  return %y\n}"),
            "2:16: unknown value '%w'"
        );
    }

    #[test]
    fn redefinition() {
        assert_eq!(
            error("graph(%x: tensor) {\n  %x = autograd_zero\n  return %x\n}"),
            "2:3: redefinition of value '%x'"
        );
    }

    #[test]
    fn block_values_are_scoped() {
        assert_eq!(
            error(
                "graph(%x: tensor) {
  %g = grad_of %x {
    %t = add %x, %x
    yield %t
  }
  return %t
}"
            ),
            "6:10: unknown value '%t'"
        );
    }

    #[test]
    fn arity_is_checked() {
        assert_eq!(
            error("graph(%x: tensor) {\n  %y = autograd_add %x\n  return %y\n}"),
            "2:8: invalid 'autograd_add' node: expected 2 inputs, got 1"
        );
        assert_eq!(
            error("graph(%x: tensor) {\n  %y = mul %x, %x\n  return %y\n}"),
            "2:8: invalid 'mul' node: 1 results but 0 result types"
        );
        assert_eq!(
            error("graph(%x: tensor) {\n  %y = grad_of %x {\n    yield\n  }\n  return %y\n}"),
            "2:8: invalid 'grad_of' node: 1 inputs, 1 results and 0 yielded values must all match"
        );
    }

    #[test]
    fn operands_must_start_on_opcode_line() {
        let graph = parse_gir(
            "graph(%x: tensor) {
  %z = autograd_zero
  %y = autograd_add %x,
    %z
  return %y
}",
        )
        .unwrap();

        assert_eq!(graph.nodes().count(), 2);
    }

    #[test]
    fn unexpected_eof() {
        assert_eq!(error("graph(%x: tensor) {"), "1:20: unexpected end of file");
    }

    #[test]
    fn trailing_tokens() {
        assert_eq!(
            error("graph() {\n  return\n}\n}"),
            "4:1: expected end of file, found '}'"
        );
    }
}
