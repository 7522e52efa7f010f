//! Error types surfaced by the compiler and by configuration loading.

use std::path::PathBuf;

use thiserror::Error;

use crate::token::Position;

/// What went wrong while turning query text into a query tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed escape sequence inside a literal.
    Lexical,
    /// The token sequence does not match the grammar.
    Syntax,
    /// A grammar node reached the compiler in a role it cannot fill.
    TypeMismatch,
}

/// A compilation failure pointing at the offending character.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message} at line {line}, column {column}")]
pub struct ParsingError {
    pub kind: ErrorKind,
    pub message: String,
    /// 1-based line.
    pub line: usize,
    /// 1-based column, in characters.
    pub column: usize,
}

impl ParsingError {
    pub fn new(kind: ErrorKind, message: impl Into<String>, position: Position) -> Self {
        Self {
            kind,
            message: message.into(),
            line: position.line,
            column: position.column,
        }
    }

    pub fn lexical(message: impl Into<String>, position: Position) -> Self {
        Self::new(ErrorKind::Lexical, message, position)
    }

    pub fn syntax(message: impl Into<String>, position: Position) -> Self {
        Self::new(ErrorKind::Syntax, message, position)
    }

    pub fn type_mismatch(message: impl Into<String>, position: Position) -> Self {
        Self::new(ErrorKind::TypeMismatch, message, position)
    }
}

/// Failure while loading a JSON configuration or schema mapping file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("configuration file does not exist: {}", .0.display())]
    NotFound(PathBuf),

    #[error("unable to read configuration file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unable to parse configuration file {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Result type alias for compilation.
pub type Result<T> = std::result::Result<T, ParsingError>;
