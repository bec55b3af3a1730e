//! Environment variable name mapping.
//!
//! An [`EnvMapping`] mirrors part of a schema and names the variable each
//! field reads. Fields without an entry read their own key upper-cased.
//!
//! Mappings can be written in TOML:
//!
//! ```toml
//! nodeEnv = "NODE_ENV"
//!
//! [server]
//! port = "TEST_SERVICE_PORT"
//! ```

use crate::ConfigError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// An entry of an [`EnvMapping`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MappingEntry {
    /// The variable name for a field.
    Var(String),
    /// Names for a nested group.
    Group(EnvMapping),
}

/// Ordered tree of environment variable names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnvMapping {
    entries: IndexMap<String, MappingEntry>,
}

impl EnvMapping {
    /// Creates an empty mapping.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Names the variable for a field.
    #[must_use]
    pub fn var(mut self, key: impl Into<String>, name: impl Into<String>) -> Self {
        self.entries.insert(key.into(), MappingEntry::Var(name.into()));
        self
    }

    /// Adds names for a nested group.
    #[must_use]
    pub fn group(mut self, key: impl Into<String>, mapping: EnvMapping) -> Self {
        self.entries.insert(key.into(), MappingEntry::Group(mapping));
        self
    }

    /// Names the variable a field at `path` reads: its mapped name, or the
    /// last key upper-cased when the mapping has no entry there.
    ///
    /// ```
    /// use essentials_config::EnvMapping;
    ///
    /// let mapping = EnvMapping::new().group("server", EnvMapping::new().var("port", "APP_PORT"));
    /// assert_eq!(mapping.var_for(&["server", "port"]), Some("APP_PORT".to_string()));
    /// assert_eq!(mapping.var_for(&["server", "host"]), Some("HOST".to_string()));
    /// assert_eq!(mapping.var_for(&[]), None);
    /// ```
    #[must_use]
    pub fn var_for(&self, path: &[&str]) -> Option<String> {
        let (last, parents) = path.split_last()?;
        let mut mapping = Some(self);
        for key in parents {
            mapping = match mapping.and_then(|m| m.get(key)) {
                Some(MappingEntry::Group(child)) => Some(child),
                _ => None,
            };
        }
        match mapping.and_then(|m| m.get(last)) {
            Some(MappingEntry::Var(name)) => Some(name.clone()),
            _ => Some(last.to_uppercase()),
        }
    }

    /// Returns the entry for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&MappingEntry> {
        self.entries.get(key)
    }

    /// Returns the number of direct entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the mapping has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parses a mapping from TOML.
    ///
    /// ```
    /// use essentials_config::{EnvMapping, MappingEntry};
    ///
    /// let mapping = EnvMapping::from_toml_str(r#"
    ///     [server]
    ///     port = "PORT"
    /// "#).unwrap();
    ///
    /// assert!(matches!(mapping.get("server"), Some(MappingEntry::Group(_))));
    /// ```
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Parses a mapping from JSON.
    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Reads a mapping file. `.json` files are parsed as JSON, anything else
    /// as TOML.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;

        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::from_json_str(&content),
            _ => Self::from_toml_str(&content),
        }
    }
}
