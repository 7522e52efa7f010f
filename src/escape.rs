//! Escape handling for literal tokens.
//!
//! Decoding turns the raw text of a literal token into the logical string the
//! user meant. Both quoted and unquoted literals understand `\t`, `\n`, `\r`,
//! `\"`, `\\` and `\uXXXX`. Unquoted literals additionally accept escaped
//! structural characters (`\(`, `\*`, ...) and escaped keywords (`\and`,
//! `\or`, `\not`). Any other escape is kept as backslash + character.

use crate::error::{ParsingError, Result};
use crate::token::{Position, Token, TokenKind};

const ESCAPE_CHAR: char = '\\';
const QUOTE_CHAR: char = '"';

/// Characters that only need escaping outside of quotes.
const STRUCTURAL_CHARS: [char; 8] = ['(', ')', ':', '<', '>', '*', '{', '}'];

/// Characters with a meaning in the Lucene query-string syntax.
const QUERY_STRING_SPECIAL_CHARS: [char; 19] = [
    '\\', '+', '-', '!', '(', ')', ':', '^', '[', ']', '"', '{', '}', '~', '*', '?', '|', '&', '/',
];

/// Decodes a literal token according to its quoting style.
pub fn decode(token: &Token<'_>) -> Result<String> {
    match token.kind {
        TokenKind::QuotedLiteral => unescape_quoted(token.text, token.position),
        TokenKind::UnquotedLiteral => unescape_unquoted(token.text, token.position),
        _ => Ok(token.text.to_string()),
    }
}

/// Decodes the raw text of a quoted literal, outer quotes included.
pub fn unescape_quoted(raw: &str, origin: Position) -> Result<String> {
    let inner = raw
        .strip_prefix(QUOTE_CHAR)
        .and_then(|s| s.strip_suffix(QUOTE_CHAR))
        .ok_or_else(|| {
            ParsingError::type_mismatch(format!("[{raw}] is not a quoted literal"), origin)
        })?;

    let mut cursor = Cursor::new(inner, origin.after("\""));
    let mut out = String::with_capacity(inner.len());

    while let Some(c) = cursor.bump() {
        if c != ESCAPE_CHAR || cursor.is_at_end() {
            out.push(c);
            continue;
        }
        match cursor.bump() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('u') => out.push(cursor.unicode_sequence()?),
            Some(QUOTE_CHAR) => out.push(QUOTE_CHAR),
            Some(ESCAPE_CHAR) => out.push(ESCAPE_CHAR),
            Some(other) => {
                out.push(ESCAPE_CHAR);
                out.push(other);
            }
            None => out.push(ESCAPE_CHAR),
        }
    }

    Ok(out)
}

/// Decodes the raw text of an unquoted literal.
pub fn unescape_unquoted(raw: &str, origin: Position) -> Result<String> {
    let mut cursor = Cursor::new(raw, origin);
    let mut out = String::with_capacity(raw.len());

    while let Some(c) = cursor.bump() {
        if c != ESCAPE_CHAR || cursor.is_at_end() {
            out.push(c);
            continue;
        }
        if let Some(keyword) = escaped_keyword(cursor.rest()) {
            out.push_str(keyword);
            cursor.skip(keyword.len());
            continue;
        }
        match cursor.bump() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('u') => out.push(cursor.unicode_sequence()?),
            Some(QUOTE_CHAR) => out.push(QUOTE_CHAR),
            Some(ESCAPE_CHAR) => out.push(ESCAPE_CHAR),
            Some(c) if STRUCTURAL_CHARS.contains(&c) => out.push(c),
            Some(other) => {
                out.push(ESCAPE_CHAR);
                out.push(other);
            }
            None => out.push(ESCAPE_CHAR),
        }
    }

    Ok(out)
}

/// `and`, `or` or `not` (any case) at the start of `rest`, in its original case.
fn escaped_keyword(rest: &str) -> Option<&str> {
    ["and", "or", "not"].into_iter().find_map(|keyword| {
        rest.get(..keyword.len())
            .filter(|prefix| prefix.eq_ignore_ascii_case(keyword))
    })
}

/// Walks the inside of a literal while keeping track of the source position.
struct Cursor<'a> {
    input: &'a str,
    offset: usize,
    /// Source position of `input[0]`.
    origin: Position,
}

impl<'a> Cursor<'a> {
    fn new(input: &'a str, origin: Position) -> Self {
        Self {
            input,
            offset: 0,
            origin,
        }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.offset..]
    }

    fn is_at_end(&self) -> bool {
        self.offset >= self.input.len()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.rest().chars().next();
        if let Some(c) = c {
            self.offset += c.len_utf8();
        }
        c
    }

    /// Skips `len` bytes, which must end on a character boundary.
    fn skip(&mut self, len: usize) {
        self.offset += len;
    }

    fn position(&self) -> Position {
        self.origin.after(&self.input[..self.offset])
    }

    /// Reads the four hex digits following `\u`.
    fn unicode_sequence(&mut self) -> Result<char> {
        let position = self.position();
        let hex: String = self.rest().chars().take(4).collect();

        if hex.len() != 4 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ParsingError::lexical(
                format!("Invalid unicode character code [{hex}]"),
                position,
            ));
        }

        let code = u32::from_str_radix(&hex, 16).map_err(|_| {
            ParsingError::lexical(format!("Invalid unicode character code [{hex}]"), position)
        })?;
        if (0xD800..=0xDFFF).contains(&code) {
            return Err(ParsingError::lexical(
                format!("Invalid unicode character code, [{hex}] is a surrogate code"),
                position,
            ));
        }
        let decoded = char::from_u32(code).ok_or_else(|| {
            ParsingError::lexical(format!("Invalid unicode character code [{hex}]"), position)
        })?;

        self.skip(4);
        Ok(decoded)
    }
}

/// Encodes `value` as unquoted literal text that decodes back to `value`.
///
/// Spaces are left alone: they separate literal tokens, and the text
/// extractor joins tokens back with a single space.
pub fn escape_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 8);

    for (i, word) in value.split(' ').enumerate() {
        if i > 0 {
            out.push(' ');
        }
        if ["and", "or", "not"]
            .iter()
            .any(|keyword| word.eq_ignore_ascii_case(keyword))
        {
            out.push(ESCAPE_CHAR);
            out.push_str(word);
            continue;
        }

        let mut chars = word.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '\t' => out.push_str("\\t"),
                '\r' => out.push_str("\\r"),
                '\n' => {
                    // `\n` directly followed by "ot" would read as an escaped `not`
                    let rest: String = chars.clone().take(2).collect();
                    if rest.eq_ignore_ascii_case("ot") {
                        out.push_str("\\u000A");
                    } else {
                        out.push_str("\\n");
                    }
                }
                ESCAPE_CHAR | QUOTE_CHAR => {
                    out.push(ESCAPE_CHAR);
                    out.push(c);
                }
                c if STRUCTURAL_CHARS.contains(&c) => {
                    out.push(ESCAPE_CHAR);
                    out.push(c);
                }
                c => out.push(c),
            }
        }
    }

    out
}

/// Wraps `value` into a quoted literal that decodes back to `value`.
pub fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push(QUOTE_CHAR);
    for c in value.chars() {
        match c {
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            ESCAPE_CHAR | QUOTE_CHAR => {
                out.push(ESCAPE_CHAR);
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(QUOTE_CHAR);
    out
}

/// Escapes text for the Lucene query-string syntax. With `preserve_wildcards`
/// the `*` character keeps its wildcard meaning.
pub fn escape_query_string(text: &str, preserve_wildcards: bool) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        if QUERY_STRING_SPECIAL_CHARS.contains(&c) && !(preserve_wildcards && c == '*') {
            out.push(ESCAPE_CHAR);
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use proptest::prelude::*;

    fn unquoted(raw: &str) -> String {
        unescape_unquoted(raw, Position::default()).unwrap()
    }

    fn quoted(raw: &str) -> String {
        unescape_quoted(raw, Position::default()).unwrap()
    }

    #[test]
    fn test_common_escapes() {
        assert_eq!(unquoted(r"a\tb\nc\rd"), "a\tb\nc\rd");
        assert_eq!(unquoted(r#"foo\"bar\""#), "foo\"bar\"");
        assert_eq!(unquoted(r"foo\\bar"), r"foo\bar");
        assert_eq!(unquoted(r"café"), "café");
        assert_eq!(quoted(r#""a\tb\"c\\dA""#), "a\tb\"c\\dA");
    }

    #[test]
    fn test_structural_escapes_only_apply_unquoted() {
        assert_eq!(unquoted(r"foo\(bar\)"), "foo(bar)");
        assert_eq!(unquoted(r"foo\{bar\}"), "foo{bar}");
        assert_eq!(unquoted(r"a\:b\<c\>d\*"), "a:b<c>d*");
        assert_eq!(quoted(r#""foo\*bar""#), r"foo\*bar");
        assert_eq!(quoted(r#""(a:b)""#), "(a:b)");
    }

    #[test]
    fn test_escaped_keywords() {
        assert_eq!(unquoted(r"\and"), "and");
        assert_eq!(unquoted(r"\OR"), "OR");
        assert_eq!(unquoted(r"\Not"), "Not");
        assert_eq!(unquoted(r"\order"), "order");
        // keyword escapes win over `\n`
        assert_eq!(unquoted(r"\notes"), "notes");
        assert_eq!(unquoted(r"\nope"), "\nope");
    }

    #[test]
    fn test_unknown_escape_is_kept_verbatim() {
        assert_eq!(unquoted(r"\x"), r"\x");
        assert_eq!(unquoted(r"a\ b"), r"a\ b");
        assert_eq!(quoted(r#""\q""#), r"\q");
    }

    #[test]
    fn test_trailing_backslash_is_kept() {
        assert_eq!(unquoted(r"foo\"), r"foo\");
    }

    #[test]
    fn test_invalid_unicode_escape() {
        let err = unescape_unquoted(r"ab\uZZZZ", Position::default()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Lexical);
        assert!(err.message.contains("[ZZZZ]"));
        assert_eq!((err.line, err.column), (1, 5));
    }

    #[test]
    fn test_surrogate_unicode_escape() {
        let origin = Position {
            line: 3,
            column: 10,
            offset: 40,
        };
        let err = unescape_quoted(r#""\uD800""#, origin).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Lexical);
        assert!(err.message.contains("[D800] is a surrogate code"));
        assert_eq!((err.line, err.column), (3, 13));
    }

    #[test]
    fn test_truncated_unicode_escape() {
        let err = unescape_unquoted(r"\u12", Position::default()).unwrap_err();
        assert!(err.message.contains("[12]"));
    }

    #[test]
    fn test_signed_hex_is_rejected() {
        assert!(unescape_unquoted(r"\u+123", Position::default()).is_err());
    }

    #[test]
    fn test_escape_value() {
        assert_eq!(escape_value("foo and bar"), r"foo \and bar");
        assert_eq!(escape_value("a*(b)"), r"a\*\(b\)");
        assert_eq!(escape_value("say \"hi\""), r#"say \"hi\""#);
    }

    #[test]
    fn test_escape_query_string() {
        assert_eq!(escape_query_string("foo-bar*", true), r"foo\-bar*");
        assert_eq!(escape_query_string("foo-bar*", false), r"foo\-bar\*");
        assert_eq!(escape_query_string("a:b (c)", true), r"a\:b \(c\)");
    }

    fn word() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("and".to_string()),
            Just("OR".to_string()),
            Just("Not".to_string()),
            "[a-z*():<>{}\\\\\"\t\n]{1,8}",
        ]
    }

    proptest! {
        #[test]
        fn unquoted_round_trip(words in prop::collection::vec(word(), 1..5)) {
            let value = words.concat();
            prop_assert_eq!(unquoted(&escape_value(&value)), value);
        }

        #[test]
        fn quoted_round_trip(value in "[a-z*():<>{}\\\\\" \t\n]{0,16}") {
            prop_assert_eq!(quoted(&quote(&value)), value);
        }
    }
}
