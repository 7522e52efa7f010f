//! The token definition for the query language.

/// A token is a single unit of the language, with a specific kind and location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    /// The raw source text, quotes and escapes included.
    pub text: &'a str,
    pub span: Span,
    /// Where the token starts, for error reporting.
    pub position: Position,
}

/// The kind of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Keywords (case-insensitive, only when free-standing)
    And, // "and"
    Or,  // "or"
    Not, // "not"

    // Literals
    QuotedLiteral,   // "..." including the quotes
    UnquotedLiteral, // a run of literal characters, escapes included

    // Punctuation
    Colon,    // :
    LParen,   // (
    RParen,   // )
    LBrace,   // {
    RBrace,   // }
    Wildcard, // a free-standing *

    // Range operators
    Lt,  // <
    Lte, // <=
    Gt,  // >
    Gte, // >=

    // Special
    Illegal, // An unterminated quoted literal
    Eof,     // End of input
}

impl TokenKind {
    /// Boolean operator keywords.
    pub fn is_operator(self) -> bool {
        matches!(self, TokenKind::And | TokenKind::Or | TokenKind::Not)
    }

    /// Tokens a field-name or value may be built from.
    pub fn is_literal(self) -> bool {
        matches!(
            self,
            TokenKind::QuotedLiteral | TokenKind::UnquotedLiteral | TokenKind::Wildcard
        )
    }

    pub fn is_range_operator(self) -> bool {
        matches!(
            self,
            TokenKind::Lt | TokenKind::Lte | TokenKind::Gt | TokenKind::Gte
        )
    }

    /// Human readable name used in syntax errors.
    pub fn describe(self) -> &'static str {
        match self {
            TokenKind::And => "AND",
            TokenKind::Or => "OR",
            TokenKind::Not => "NOT",
            TokenKind::QuotedLiteral => "quoted literal",
            TokenKind::UnquotedLiteral => "literal",
            TokenKind::Colon => "':'",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::LBrace => "'{'",
            TokenKind::RBrace => "'}'",
            TokenKind::Wildcard => "'*'",
            TokenKind::Lt => "'<'",
            TokenKind::Lte => "'<='",
            TokenKind::Gt => "'>'",
            TokenKind::Gte => "'>='",
            TokenKind::Illegal => "unterminated quoted literal",
            TokenKind::Eof => "end of input",
        }
    }
}

/// Represents a span in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    /// The starting byte offset.
    pub start: usize,
    /// The ending byte offset.
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Smallest span covering both `self` and `other`.
    pub fn merge(self, other: Span) -> Self {
        Self {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

/// A location in the source text. `line` and `column` are 1-based and count characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub column: usize,
    /// Byte offset from the start of the input.
    pub offset: usize,
}

impl Default for Position {
    fn default() -> Self {
        Self {
            line: 1,
            column: 1,
            offset: 0,
        }
    }
}

impl Position {
    /// Moves the position past one character.
    pub fn advance(&mut self, c: char) {
        self.offset += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
    }

    /// The position reached after walking over `text`.
    pub fn after(mut self, text: &str) -> Self {
        for c in text.chars() {
            self.advance(c);
        }
        self
    }
}
