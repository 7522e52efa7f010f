//! Compiler configuration, loadable from a JSON file.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Settings that shape the emitted query tree without changing its meaning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Keyword term and wildcard queries ignore case.
    pub case_insensitive: bool,
    /// Time zone attached to range queries on date fields, e.g. `"+01:00"`.
    pub time_zone: Option<String>,
    /// Field searched by field-less queries. `None` leaves the choice to the engine.
    pub default_field: Option<String>,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            case_insensitive: true,
            time_zone: None,
            default_field: None,
        }
    }
}

impl CompilerConfig {
    /// Loads the configuration from a JSON file. Missing keys keep their defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&content).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn with_case_insensitive(mut self, case_insensitive: bool) -> Self {
        self.case_insensitive = case_insensitive;
        self
    }

    pub fn with_time_zone(mut self, time_zone: impl Into<String>) -> Self {
        self.time_zone = Some(time_zone.into());
        self
    }

    pub fn with_default_field(mut self, field: impl Into<String>) -> Self {
        self.default_field = Some(field.into());
        self
    }
}
