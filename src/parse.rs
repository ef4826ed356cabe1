//! Textual syntax for facts and rules.
//!
//! ```text
//! fact: (isa cube block)
//! rule: ((hasColor ?x red) (isa ?x block)) -> (isRedBlock ?x)
//! ```
//!
//! [`parse_claim`] handles the prefixed claim form; [`parse_statement`]
//! parses a bare parenthesized statement. Tokens are whitespace-separated;
//! parentheses delimit statements and the premise list of a rule is wrapped
//! in one extra pair.

use crate::error::{ParseError, ParseResult};
use crate::kb::Claim;
use crate::statement::{Statement, Term};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Open,
    Close,
    Atom(String),
}

fn tokenize(input: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut atom = String::new();
    for ch in input.chars() {
        match ch {
            '(' | ')' => {
                if !atom.is_empty() {
                    tokens.push(Token::Atom(std::mem::take(&mut atom)));
                }
                tokens.push(if ch == '(' { Token::Open } else { Token::Close });
            }
            c if c.is_whitespace() => {
                if !atom.is_empty() {
                    tokens.push(Token::Atom(std::mem::take(&mut atom)));
                }
            }
            c => atom.push(c),
        }
    }
    if !atom.is_empty() {
        tokens.push(Token::Atom(atom));
    }
    tokens
}

struct Cursor<'a> {
    tokens: &'a [Token],
    position: usize,
    input: &'a str,
}

impl<'a> Cursor<'a> {
    fn new(tokens: &'a [Token], input: &'a str) -> Self {
        Self {
            tokens,
            position: 0,
            input,
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.position).cloned();
        if token.is_some() {
            self.position += 1;
        }
        token
    }

    fn unbalanced(&self) -> ParseError {
        ParseError::Unbalanced {
            input: self.input.trim().to_string(),
        }
    }

    /// Parse one `(predicate term ...)` group.
    fn statement(&mut self) -> ParseResult<Statement> {
        match self.next() {
            Some(Token::Open) => {}
            _ => return Err(self.unbalanced()),
        }
        let predicate = match self.next() {
            Some(Token::Atom(atom)) => atom,
            Some(Token::Close) => return Err(ParseError::EmptyStatement),
            _ => return Err(self.unbalanced()),
        };
        let mut terms = Vec::new();
        loop {
            match self.next() {
                Some(Token::Atom(atom)) => terms.push(Term::from_token(&atom)),
                Some(Token::Close) => break,
                _ => return Err(self.unbalanced()),
            }
        }
        Ok(Statement::new(predicate, terms))
    }

    fn expect_end(&mut self) -> ParseResult<()> {
        if let Some(token) = self.peek() {
            let rest = match token {
                Token::Open => "(".to_string(),
                Token::Close => ")".to_string(),
                Token::Atom(atom) => atom.clone(),
            };
            return Err(ParseError::TrailingInput { rest });
        }
        Ok(())
    }
}

/// Parse a bare parenthesized statement, e.g. `(isa ?x block)`.
pub fn parse_statement(input: &str) -> ParseResult<Statement> {
    let tokens = tokenize(input);
    let mut cursor = Cursor::new(&tokens, input);
    let statement = cursor.statement()?;
    cursor.expect_end()?;
    Ok(statement)
}

/// Parse a prefixed claim line: `fact: (...)` or `rule: ((...) ...) -> (...)`.
pub fn parse_claim(input: &str) -> ParseResult<Claim> {
    let line = input.trim();
    if let Some(rest) = line.strip_prefix("fact:") {
        return Ok(Claim::Fact(parse_statement(rest)?));
    }
    if let Some(rest) = line.strip_prefix("rule:") {
        let (lhs_src, rhs_src) = rest.split_once("->").ok_or_else(|| ParseError::MissingArrow {
            input: line.to_string(),
        })?;
        let rhs = parse_statement(rhs_src)?;
        let tokens = tokenize(lhs_src);
        let mut cursor = Cursor::new(&tokens, lhs_src);
        match cursor.next() {
            Some(Token::Open) => {}
            _ => return Err(cursor.unbalanced()),
        }
        let mut lhs = Vec::new();
        loop {
            match cursor.peek() {
                Some(Token::Open) => lhs.push(cursor.statement()?),
                Some(Token::Close) => {
                    cursor.next();
                    break;
                }
                _ => return Err(cursor.unbalanced()),
            }
        }
        if lhs.is_empty() {
            return Err(ParseError::NoPremises);
        }
        cursor.expect_end()?;
        return Ok(Claim::Rule { lhs, rhs });
    }
    Err(ParseError::MissingPrefix {
        input: line.to_string(),
    })
}
