//! Lexer for the query language.
//!
//! Splits the input into operators, punctuation and literals. Escapes are
//! kept verbatim inside literal tokens; decoding them is left to
//! [`crate::escape`] so that errors can point into the token.

use crate::token::{Position, Span, Token, TokenKind};

pub struct Lexer<'a> {
    input: &'a str,
    /// Current location in the input.
    position: Position,
    /// Set once the `Eof` token has been produced.
    finished: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Lexer {
            input,
            position: Position::default(),
            finished: false,
        }
    }

    /// Lexes the whole input. The last token is always `Eof`.
    pub fn tokenize(input: &'a str) -> Vec<Token<'a>> {
        Lexer::new(input).collect()
    }

    /// Returns the current character without advancing.
    fn peek(&self) -> Option<char> {
        self.input[self.position.offset..].chars().next()
    }

    /// Advances one character and returns it.
    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if let Some(c) = c {
            self.position.advance(c);
        }
        c
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.bump();
            } else {
                break;
            }
        }
    }

    fn token(&self, kind: TokenKind, start: Position) -> Token<'a> {
        Token {
            kind,
            text: &self.input[start.offset..self.position.offset],
            span: Span::new(start.offset, self.position.offset),
            position: start,
        }
    }

    /// Reads a double-quoted literal. The opening quote is already consumed.
    fn read_quoted(&mut self, start: Position) -> Token<'a> {
        loop {
            match self.bump() {
                Some('"') => return self.token(TokenKind::QuotedLiteral, start),
                Some('\\') => {
                    self.bump();
                }
                Some(_) => {}
                None => return self.token(TokenKind::Illegal, start),
            }
        }
    }

    /// Reads an unquoted literal whose first character is already consumed.
    /// A backslash always takes the following character with it.
    fn read_unquoted(&mut self, first: char, start: Position) -> Token<'a> {
        if first == '\\' {
            self.bump();
        }
        while let Some(c) = self.peek() {
            if c == '\\' {
                self.bump();
                self.bump();
            } else if is_literal_char(c) {
                self.bump();
            } else {
                break;
            }
        }

        let kind = match_keyword(&self.input[start.offset..self.position.offset]);
        self.token(kind, start)
    }

    /// After a `*`: does a literal continue past the run of stars?
    fn star_run_continues(&self) -> bool {
        self.input[self.position.offset..]
            .chars()
            .find(|c| *c != '*')
            .is_some_and(is_literal_char)
    }
}

/// Characters that may appear unescaped in an unquoted literal.
fn is_literal_char(c: char) -> bool {
    !c.is_whitespace() && !matches!(c, '(' | ')' | ':' | '<' | '>' | '"' | '{' | '}')
}

fn match_keyword(s: &str) -> TokenKind {
    match s.to_ascii_lowercase().as_str() {
        "and" => TokenKind::And,
        "or" => TokenKind::Or,
        "not" => TokenKind::Not,
        _ => TokenKind::UnquotedLiteral,
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        self.skip_whitespace();
        let start = self.position;

        let Some(c) = self.bump() else {
            self.finished = true;
            return Some(self.token(TokenKind::Eof, start));
        };

        let token = match c {
            ':' => self.token(TokenKind::Colon, start),
            '(' => self.token(TokenKind::LParen, start),
            ')' => self.token(TokenKind::RParen, start),
            '{' => self.token(TokenKind::LBrace, start),
            '}' => self.token(TokenKind::RBrace, start),
            '<' => {
                if self.peek() == Some('=') {
                    self.bump();
                    self.token(TokenKind::Lte, start)
                } else {
                    self.token(TokenKind::Lt, start)
                }
            }
            '>' => {
                if self.peek() == Some('=') {
                    self.bump();
                    self.token(TokenKind::Gte, start)
                } else {
                    self.token(TokenKind::Gt, start)
                }
            }
            '"' => self.read_quoted(start),
            '*' if !self.star_run_continues() => self.token(TokenKind::Wildcard, start),
            c => self.read_unquoted(c, start),
        };
        Some(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        Lexer::new(input).map(|t| t.kind).collect()
    }

    fn texts(input: &str) -> Vec<&str> {
        Lexer::new(input).map(|t| t.text).collect()
    }

    #[test]
    fn test_simple_field_query() {
        let mut lexer = Lexer::new("status:open");

        assert_eq!(lexer.next().unwrap().kind, TokenKind::UnquotedLiteral);
        assert_eq!(lexer.next().unwrap().kind, TokenKind::Colon);
        let value = lexer.next().unwrap();
        assert_eq!(value.kind, TokenKind::UnquotedLiteral);
        assert_eq!(value.text, "open");
        assert_eq!(lexer.next().unwrap().kind, TokenKind::Eof);
        assert_eq!(lexer.next(), None);
    }

    #[test]
    fn test_all_punctuation() {
        assert_eq!(
            kinds(": ( ) { } < <= > >= *"),
            vec![
                TokenKind::Colon,
                TokenKind::LParen,
                TokenKind::RParen,
                TokenKind::LBrace,
                TokenKind::RBrace,
                TokenKind::Lt,
                TokenKind::Lte,
                TokenKind::Gt,
                TokenKind::Gte,
                TokenKind::Wildcard,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_keywords_are_case_insensitive() {
        assert_eq!(
            kinds("AND or nOt android oracle notes"),
            vec![
                TokenKind::And,
                TokenKind::Or,
                TokenKind::Not,
                TokenKind::UnquotedLiteral,
                TokenKind::UnquotedLiteral,
                TokenKind::UnquotedLiteral,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_escaped_keyword_is_literal() {
        let tokens = Lexer::tokenize(r"foo \and bar");
        assert_eq!(tokens[1].kind, TokenKind::UnquotedLiteral);
        assert_eq!(tokens[1].text, r"\and");
    }

    #[test]
    fn test_escaped_structural_characters_stay_in_literal() {
        assert_eq!(texts(r"foo\(bar\) a\:b \* c\ d"), vec![
            r"foo\(bar\)",
            r"a\:b",
            r"\*",
            r"c\ d",
            "",
        ]);
    }

    #[test]
    fn test_wildcards() {
        assert_eq!(
            kinds("* foo* *bar f*o ** **x"),
            vec![
                TokenKind::Wildcard,
                TokenKind::UnquotedLiteral,
                TokenKind::UnquotedLiteral,
                TokenKind::UnquotedLiteral,
                TokenKind::Wildcard,
                TokenKind::Wildcard,
                TokenKind::UnquotedLiteral,
                TokenKind::Eof,
            ]
        );
        assert_eq!(texts("**x")[0], "**x");
    }

    #[test]
    fn test_quoted_literals() {
        let tokens = Lexer::tokenize(r#"title:"hello \"world\" AND (x)""#);
        assert_eq!(tokens[2].kind, TokenKind::QuotedLiteral);
        assert_eq!(tokens[2].text, r#""hello \"world\" AND (x)""#);
        assert_eq!(tokens[3].kind, TokenKind::Eof);
    }

    #[test]
    fn test_unterminated_quote_is_illegal() {
        let tokens = Lexer::tokenize(r#"a:"open"#);
        assert_eq!(tokens[2].kind, TokenKind::Illegal);
        assert_eq!(tokens[2].text, r#""open"#);
    }

    #[test]
    fn test_positions() {
        let tokens = Lexer::tokenize("a:b\n  OR c");
        let or = tokens[3];
        assert_eq!(or.kind, TokenKind::Or);
        assert_eq!(or.position.line, 2);
        assert_eq!(or.position.column, 3);
        assert_eq!(or.span, Span::new(6, 8));
    }

    #[test]
    fn test_structural_characters_split_literals() {
        assert_eq!(
            kinds("a:(b)"),
            vec![
                TokenKind::UnquotedLiteral,
                TokenKind::Colon,
                TokenKind::LParen,
                TokenKind::UnquotedLiteral,
                TokenKind::RParen,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(kinds("   "), vec![TokenKind::Eof]);
    }
}
