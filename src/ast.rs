//! Parse tree produced by the grammar, consumed by the compiler.

use crate::token::{Position, Span, Token, TokenKind};

/// A node of the parse tree together with where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseNode<'a> {
    pub kind: NodeKind<'a>,
    pub span: Span,
    pub position: Position,
}

/// The grammar rule a node was recognised by.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind<'a> {
    /// A run of operands joined by the same operator, `a AND b AND c`.
    /// A run that is followed by the other operator ends with the rest of
    /// the chain as its last operand, so chains lean to the right.
    Boolean {
        op: BoolOp,
        operands: Vec<ParseNode<'a>>,
    },
    /// `NOT query`
    Not(Box<ParseNode<'a>>),
    /// `(query)`
    Parenthesized(Box<ParseNode<'a>>),
    /// `*` or `*:*`
    MatchAll,
    /// `field:*`
    Exists { field: FieldName<'a> },
    /// `field < value`, `field >= value`, ...
    Range {
        field: FieldName<'a>,
        op: RangeOp,
        value: FieldValue<'a>,
    },
    /// `field:value`
    Field {
        field: FieldName<'a>,
        value: FieldValue<'a>,
    },
    /// A value with no field in front of it.
    FieldLess { value: FieldValue<'a> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolOp {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeOp {
    Lt,
    Lte,
    Gt,
    Gte,
}

impl RangeOp {
    pub fn from_token(kind: TokenKind) -> Option<Self> {
        match kind {
            TokenKind::Lt => Some(RangeOp::Lt),
            TokenKind::Lte => Some(RangeOp::Lte),
            TokenKind::Gt => Some(RangeOp::Gt),
            TokenKind::Gte => Some(RangeOp::Gte),
            _ => None,
        }
    }
}

/// The field-name side of a field query: a single literal or wildcard token.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldName<'a> {
    pub token: Token<'a>,
}

impl FieldName<'_> {
    /// A quoted field name is an exact name and never a pattern.
    pub fn is_literal(&self) -> bool {
        self.token.kind == TokenKind::QuotedLiteral
    }
}

/// The literal tokens making up one logical value.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldValue<'a> {
    pub tokens: Vec<Token<'a>>,
}

impl FieldValue<'_> {
    /// The value is a single quoted literal.
    pub fn is_quoted(&self) -> bool {
        matches!(self.tokens.as_slice(), [t] if t.kind == TokenKind::QuotedLiteral)
    }

    /// The value is exactly one free-standing `*`.
    pub fn is_lone_wildcard(&self) -> bool {
        matches!(self.tokens.as_slice(), [t] if t.kind == TokenKind::Wildcard)
    }

    pub fn span(&self) -> Span {
        self.tokens
            .iter()
            .map(|t| t.span)
            .reduce(Span::merge)
            .unwrap_or_default()
    }
}
