//! Parser for the query language.
//!
//! ## Parse flow
//!
//! ```text
//! parse()
//!   ├─ empty input → None (match everything)
//!   └─ parse_query()
//!        ├─ parse_simple_query()
//!        │    ├─ NOT  → parse_simple_query()          (NOT binds tightest)
//!        │    ├─ "("  → parse_query() then ")"
//!        │    ├─ name ":"          → parse_field_query()
//!        │    │                        ├─ "(" value ")"
//!        │    │                        ├─ "*"   → exists (or match all for *:*)
//!        │    │                        └─ value
//!        │    ├─ name "<" | "<=" | ">" | ">=" → parse_range_query()
//!        │    └─ otherwise         → parse_field_less_query()
//!        │
//!        └─ (AND / OR simple)*   → folded to the right     (chains lean right)
//! ```
//!
//! ## Operators
//!
//! `NOT` applies to the simple query right after it. `AND` and `OR` share one
//! level and associate to the right, so `a AND b OR c` reads as
//! `a AND (b OR c)` and `a OR b AND c` as `a OR (b AND c)`.
//!
//! ## Values
//!
//! A value is a single quoted literal, or a run of unquoted literals and
//! wildcards. Keywords next to a value are part of it when they cannot be
//! operators:
//!
//! ```text
//! status: NOT closed     → value "NOT closed"
//! status: open AND       → value "open AND"
//! status: AND            → value "AND"
//! status: open AND x:y   → status:open AND x:y
//! ```

use crate::ast::{BoolOp, FieldName, FieldValue, NodeKind, ParseNode, RangeOp};
use crate::error::{ParsingError, Result};
use crate::token::{Span, Token, TokenKind};

/// Deepest nesting of `NOT`, parentheses and operator changes accepted.
pub const MAX_DEPTH: usize = 128;

pub struct Parser<'a> {
    tokens: &'a [Token<'a>],
    position: usize,
    /// Returned once the tokens are exhausted.
    eof: Token<'a>,
    /// Nesting level of the node being parsed.
    depth: usize,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token<'a>]) -> Self {
        let eof = match tokens.last() {
            Some(last) if last.kind == TokenKind::Eof => *last,
            last => {
                let end = last.map_or(0, |t| t.span.end);
                Token {
                    kind: TokenKind::Eof,
                    text: "",
                    span: Span::new(end, end),
                    position: last
                        .map(|t| t.position.after(t.text))
                        .unwrap_or_default(),
                }
            }
        };
        Self {
            tokens,
            position: 0,
            eof,
            depth: 0,
        }
    }

    /// Returns the current token without advancing.
    fn peek(&self) -> Token<'a> {
        self.peek_nth(0)
    }

    fn peek_nth(&self, n: usize) -> Token<'a> {
        self.tokens
            .get(self.position + n)
            .copied()
            .unwrap_or(self.eof)
    }

    /// Returns the current token and advances.
    fn advance(&mut self) -> Token<'a> {
        let token = self.peek();
        if self.position < self.tokens.len() {
            self.position += 1;
        }
        token
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    /// Expects a token of the given kind and advances, or fails.
    fn expect(&mut self, kind: TokenKind) -> Result<Token<'a>> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(unexpected(self.peek(), kind.describe()))
        }
    }

    /// Span of the most recently consumed token.
    fn previous_span(&self) -> Span {
        self.position
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map_or(self.eof.span, |t| t.span)
    }

    fn node(&self, kind: NodeKind<'a>, start: Token<'a>) -> ParseNode<'a> {
        ParseNode {
            kind,
            span: start.span.merge(self.previous_span()),
            position: start.position,
        }
    }

    /// Parses the whole input. `None` means the input held no query at all.
    pub fn parse(&mut self) -> Result<Option<ParseNode<'a>>> {
        if self.check(TokenKind::Eof) {
            return Ok(None);
        }

        let query = self.parse_query()?;

        let next = self.peek();
        if next.kind != TokenKind::Eof {
            return Err(unexpected(next, "AND, OR or end of input"));
        }
        Ok(Some(query))
    }

    /// Enters one nesting level of the tree being built.
    fn descend(&mut self, at: Token<'a>) -> Result<()> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(ParsingError::syntax(
                format!("Query is nested too deeply, at most {MAX_DEPTH} levels are supported"),
                at.position,
            ));
        }
        Ok(())
    }

    /// `simple ((AND | OR) simple)*`, read in one pass and folded to the right.
    fn parse_query(&mut self) -> Result<ParseNode<'a>> {
        let base = self.depth;
        let first = self.parse_simple_query()?;
        let mut rest: Vec<(BoolOp, ParseNode<'a>)> = Vec::new();

        loop {
            let token = self.peek();
            let op = match token.kind {
                TokenKind::And => BoolOp::And,
                TokenKind::Or => BoolOp::Or,
                _ => break,
            };
            self.advance(); // consume the operator

            // each change of operator nests the rest of the chain one level deeper
            if rest.last().map(|(prev, _)| *prev) != Some(op) {
                self.descend(token)?;
            }
            let operand = self.parse_simple_query()?;
            rest.push((op, operand));
        }

        self.depth = base;
        Ok(fold_right(first, rest))
    }

    fn parse_simple_query(&mut self) -> Result<ParseNode<'a>> {
        let token = self.peek();
        match token.kind {
            TokenKind::Not if can_start_query(self.peek_nth(1).kind) => {
                self.advance(); // consume NOT
                self.descend(token)?;
                let inner = self.parse_simple_query()?;
                self.depth -= 1;
                Ok(self.node(NodeKind::Not(Box::new(inner)), token))
            }
            TokenKind::LParen => {
                self.advance(); // consume (
                self.descend(token)?;
                let inner = self.parse_query()?;
                self.depth -= 1;
                self.expect(TokenKind::RParen)?;
                Ok(self.node(NodeKind::Parenthesized(Box::new(inner)), token))
            }
            TokenKind::Wildcard | TokenKind::QuotedLiteral | TokenKind::UnquotedLiteral => {
                let next = self.peek_nth(1).kind;
                if next == TokenKind::Colon {
                    self.parse_field_query()
                } else if next.is_range_operator() {
                    self.parse_range_query()
                } else {
                    self.parse_field_less_query()
                }
            }
            // a lone or leading keyword is a field-less value
            TokenKind::And | TokenKind::Or | TokenKind::Not => self.parse_field_less_query(),
            _ => Err(unexpected(token, "a query")),
        }
    }

    fn parse_field_query(&mut self) -> Result<ParseNode<'a>> {
        let start = self.advance();
        let field = FieldName { token: start };
        self.expect(TokenKind::Colon)?;

        let token = self.peek();
        let kind = match token.kind {
            TokenKind::LParen => {
                self.advance(); // consume (
                let value = self.parse_field_value()?;
                self.expect(TokenKind::RParen)?;
                NodeKind::Field { field, value }
            }
            TokenKind::LBrace => {
                return Err(ParsingError::syntax(
                    format!(
                        "Nested queries are not supported, found [{}] after field [{}]",
                        token.text, field.token.text
                    ),
                    token.position,
                ));
            }
            _ => {
                let value = self.parse_field_value()?;
                if !value.is_lone_wildcard() {
                    NodeKind::Field { field, value }
                } else if field.token.kind == TokenKind::Wildcard {
                    NodeKind::MatchAll
                } else {
                    NodeKind::Exists { field }
                }
            }
        };

        Ok(self.node(kind, start))
    }

    fn parse_range_query(&mut self) -> Result<ParseNode<'a>> {
        let start = self.advance();
        let field = FieldName { token: start };

        let op_token = self.advance();
        let op = RangeOp::from_token(op_token.kind)
            .ok_or_else(|| unexpected(op_token, "a range operator"))?;

        let mut tokens = Vec::new();
        if self.check(TokenKind::QuotedLiteral) {
            tokens.push(self.advance());
        } else {
            while matches!(
                self.peek().kind,
                TokenKind::UnquotedLiteral | TokenKind::Wildcard
            ) {
                tokens.push(self.advance());
            }
        }
        if tokens.is_empty() {
            return Err(unexpected(self.peek(), "a range value"));
        }

        let value = FieldValue { tokens };
        Ok(self.node(NodeKind::Range { field, op, value }, start))
    }

    fn parse_field_less_query(&mut self) -> Result<ParseNode<'a>> {
        let start = self.peek();
        let value = self.parse_field_value()?;

        let kind = if value.is_lone_wildcard() {
            NodeKind::MatchAll
        } else {
            NodeKind::FieldLess { value }
        };
        Ok(self.node(kind, start))
    }

    /// `QUOTED | op? (UNQUOTED | WILDCARD)* op?`, never empty.
    fn parse_field_value(&mut self) -> Result<FieldValue<'a>> {
        if self.check(TokenKind::QuotedLiteral) {
            return Ok(FieldValue {
                tokens: vec![self.advance()],
            });
        }

        let mut tokens = Vec::new();

        // a leading keyword is always text here
        if self.peek().kind.is_operator() {
            tokens.push(self.advance());
        }

        while matches!(
            self.peek().kind,
            TokenKind::UnquotedLiteral | TokenKind::Wildcard
        ) {
            tokens.push(self.advance());
        }

        // a trailing keyword is text only when nothing could follow it as an operand
        if self.peek().kind.is_operator()
            && matches!(self.peek_nth(1).kind, TokenKind::Eof | TokenKind::RParen)
        {
            tokens.push(self.advance());
        }

        if tokens.is_empty() {
            return Err(unexpected(self.peek(), "a field value"));
        }
        Ok(FieldValue { tokens })
    }
}

/// Groups `s0 op0 s1 op1 s2 ...` to the right, merging runs of the same
/// operator into one node: `a AND b OR c OR d` becomes `AND[a, OR[b, c, d]]`.
/// Each operand in `rest` comes with the operator in front of it.
fn fold_right<'a>(first: ParseNode<'a>, mut rest: Vec<(BoolOp, ParseNode<'a>)>) -> ParseNode<'a> {
    let Some((mut op, mut tail)) = rest.pop() else {
        return first;
    };
    let mut first = Some(first);

    loop {
        let mut group = vec![tail];
        // walk left while operands are still joined by `op`
        let next_op = loop {
            match rest.pop() {
                Some((before, operand)) if before == op => group.push(operand),
                Some((before, operand)) => {
                    group.push(operand);
                    break Some(before);
                }
                None => {
                    group.extend(first.take());
                    break None;
                }
            }
        };
        group.reverse();

        let span = group
            .iter()
            .map(|node| node.span)
            .reduce(Span::merge)
            .unwrap_or_default();
        let position = group.first().map(|node| node.position).unwrap_or_default();
        tail = ParseNode {
            kind: NodeKind::Boolean {
                op,
                operands: group,
            },
            span,
            position,
        };

        match next_op {
            Some(before) => op = before,
            None => return tail,
        }
    }
}

/// Tokens a simple query may start with, excluding a bare keyword value.
fn can_start_query(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Not
            | TokenKind::LParen
            | TokenKind::Wildcard
            | TokenKind::QuotedLiteral
            | TokenKind::UnquotedLiteral
    )
}

fn unexpected(token: Token<'_>, expected: &str) -> ParsingError {
    let found = match token.kind {
        TokenKind::Eof => "end of input".to_string(),
        TokenKind::Illegal => format!("unterminated quoted literal [{}]", token.text),
        _ => format!("[{}]", token.text),
    };
    ParsingError::syntax(format!("Expected {expected}, found {found}"), token.position)
}
