//! Field schema lookup.
//!
//! The compiler asks a [`FieldSchemaProvider`] which concrete fields a field
//! name (or pattern) stands for, and with which declared type. Nothing is
//! cached on this side: the schema may change between two compilations.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ConfigError;

/// The declared type of a field, which decides how values are matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Keyword,
    Text,
    Numeric,
    Date,
}

/// One concrete field a name or pattern resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedField {
    pub name: String,
    pub field_type: FieldType,
}

impl ResolvedField {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
        }
    }
}

/// Resolves field names against the schema of the searched data.
pub trait FieldSchemaProvider {
    /// Concrete fields matching `pattern`. With `is_literal` the pattern is
    /// an exact name and `*` has no special meaning. An empty result is not
    /// an error.
    fn resolve(&self, pattern: &str, is_literal: bool) -> Vec<ResolvedField>;
}

impl<T: FieldSchemaProvider + ?Sized> FieldSchemaProvider for &T {
    fn resolve(&self, pattern: &str, is_literal: bool) -> Vec<ResolvedField> {
        (**self).resolve(pattern, is_literal)
    }
}

/// An in-memory schema, ordered by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticSchema {
    #[serde(flatten)]
    fields: BTreeMap<String, FieldType>,
}

impl StaticSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field, replacing any earlier declaration of the same name.
    pub fn with_field(mut self, name: impl Into<String>, field_type: FieldType) -> Self {
        self.insert(name, field_type);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, field_type: FieldType) {
        self.fields.insert(name.into(), field_type);
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, FieldType)> {
        self.fields.iter().map(|(name, ty)| (name.as_str(), *ty))
    }

    /// Loads a flat `{ "name": "keyword" | "text" | "numeric" | "date" }` mapping.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let fields: BTreeMap<String, FieldType> =
            serde_json::from_str(&content).map_err(|source| ConfigError::Json {
                path: path.to_path_buf(),
                source,
            })?;

        Ok(Self { fields })
    }

    fn lookup(&self, name: &str) -> Vec<ResolvedField> {
        self.fields
            .get_key_value(name)
            .map(|(name, ty)| ResolvedField::new(name.clone(), *ty))
            .into_iter()
            .collect()
    }
}

impl FieldSchemaProvider for StaticSchema {
    fn resolve(&self, pattern: &str, is_literal: bool) -> Vec<ResolvedField> {
        if is_literal || !pattern.contains('*') {
            return self.lookup(pattern);
        }

        let Some(matcher) = glob_to_regex(pattern) else {
            warn!(pattern, "unable to compile field pattern");
            return Vec::new();
        };

        self.fields
            .iter()
            .filter(|(name, _)| matcher.is_match(name))
            .map(|(name, ty)| ResolvedField::new(name.clone(), *ty))
            .collect()
    }
}

/// Anchored regex for a field-name glob where `*` matches any sequence.
fn glob_to_regex(pattern: &str) -> Option<Regex> {
    let body = pattern
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");
    Regex::new(&format!("^{body}$")).ok()
}
