//! Text extraction and wildcard detection over the literal tokens of one value.

use crate::error::{ParsingError, Result};
use crate::escape;
use crate::token::{Token, TokenKind};

const TERM_DELIMITER: &str = " ";

/// Decodes each token and joins them with a single space, in input order.
///
/// Operator keywords are accepted as plain text: once they sit in a value
/// they are ordinary words.
pub fn extract_text(tokens: &[Token<'_>]) -> Result<String> {
    let mut parts = Vec::with_capacity(tokens.len());
    for token in tokens {
        match token.kind {
            TokenKind::QuotedLiteral | TokenKind::UnquotedLiteral => {
                parts.push(escape::decode(token)?)
            }
            TokenKind::Wildcard | TokenKind::And | TokenKind::Or | TokenKind::Not => {
                parts.push(token.text.to_string())
            }
            other => {
                return Err(ParsingError::type_mismatch(
                    format!(
                        "Unable to extract text from [{}]: expected a literal but found {}",
                        token.text,
                        other.describe()
                    ),
                    token.position,
                ))
            }
        }
    }
    Ok(parts.join(TERM_DELIMITER))
}

/// True if the value asks for pattern matching: a free-standing `*`, or an
/// unquoted literal holding a `*` that is neither escaped nor preceded by a
/// backslash in the decoded text (`foo\\*` decodes to `foo\*`, an exact term).
/// Quoted literals never do.
pub fn has_wildcard(tokens: &[Token<'_>]) -> bool {
    tokens.iter().any(|token| match token.kind {
        TokenKind::Wildcard => true,
        TokenKind::UnquotedLiteral => has_unescaped_star(token.text),
        _ => false,
    })
}

fn has_unescaped_star(raw: &str) -> bool {
    let mut chars = raw.chars();
    // the last decoded character is a backslash
    let mut after_backslash = false;
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                // `\\` and a trailing `\` decode to a backslash
                after_backslash = matches!(chars.next(), Some('\\') | None);
            }
            '*' if !after_backslash => return true,
            _ => after_backslash = false,
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::lexer::Lexer;

    fn value_tokens(input: &str) -> Vec<Token<'_>> {
        Lexer::tokenize(input)
            .into_iter()
            .filter(|t| t.kind != TokenKind::Eof)
            .collect()
    }

    #[test]
    fn test_joins_with_single_space() {
        let tokens = value_tokens("foo   bar\tbaz");
        assert_eq!(extract_text(&tokens).unwrap(), "foo bar baz");
    }

    #[test]
    fn test_decodes_each_token() {
        let tokens = value_tokens(r#"foo \* "quoted \"x\"" \and"#);
        assert_eq!(extract_text(&tokens).unwrap(), r#"foo * quoted "x" and"#);
    }

    #[test]
    fn test_operators_are_text() {
        let tokens = value_tokens("AND bar or");
        assert_eq!(extract_text(&tokens).unwrap(), "AND bar or");
    }

    #[test]
    fn test_structural_token_is_a_type_mismatch() {
        let tokens = value_tokens("foo (");
        let err = extract_text(&tokens).unwrap_err();
        assert_eq!(err.kind, ErrorKind::TypeMismatch);
        assert_eq!(err.column, 5);
    }

    #[test]
    fn test_wildcard_detection() {
        assert!(has_wildcard(&value_tokens("foo*bar")));
        assert!(has_wildcard(&value_tokens("foo *")));
        assert!(has_wildcard(&value_tokens(r"\(foo*")));
        assert!(!has_wildcard(&value_tokens(r"foo\\*")));
        assert!(!has_wildcard(&value_tokens(r"foo\\\\*")));
        assert!(has_wildcard(&value_tokens(r"foo\\x*")));
        assert!(has_wildcard(&value_tokens(r"foo\\ *")));
        assert!(has_wildcard(&value_tokens(r"\q*")));
        assert!(!has_wildcard(&value_tokens(r"foo \* bar")));
        assert!(!has_wildcard(&value_tokens(r"foo\*bar")));
        assert!(!has_wildcard(&value_tokens(r#""foo*bar""#)));
        assert!(!has_wildcard(&value_tokens("foo bar")));
    }
}
