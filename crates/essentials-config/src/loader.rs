//! Configuration loader with layered environment sources.
//!
//! This module provides the [`ConfigLoader`] for resolving a [`Schema`] from
//! several sources: explicit overrides, the process environment and dotenv
//! files.

use std::collections::HashMap;
use std::path::Path;

use serde::de::DeserializeOwned;

use crate::{
    load_config_from_env, ConfigError, ConfigValue, DotenvFile, EnvMapping, EnvSource,
    LayeredSource, ProcessEnv, Schema,
};

/// Configuration loader with layered sources.
///
/// Sources are consulted in priority order:
/// 1. Overrides (`with_overrides`)
/// 2. The process environment, or the source given to `with_source`
/// 3. Dotenv files, in the order they were added
///
/// # Example
///
/// ```no_run
/// use essentials_config::{ConfigLoader, EnvMapping, Field, Schema};
///
/// # fn main() -> Result<(), essentials_config::ConfigError> {
/// let schema = Schema::new().field("port", Field::integer().with_default(8080));
///
/// let config = ConfigLoader::new(schema, EnvMapping::new())
///     .with_dotenv()?
///     .load()?;
///
/// println!("Listening on port {:?}", config.get("port"));
/// # Ok(())
/// # }
/// ```
pub struct ConfigLoader {
    schema: Schema,
    mapping: EnvMapping,
    overrides: HashMap<String, String>,
    primary: Box<dyn EnvSource>,
    fallbacks: Vec<DotenvFile>,
}

impl std::fmt::Debug for ConfigLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigLoader")
            .field("schema", &self.schema)
            .field("mapping", &self.mapping)
            .field("overrides", &self.overrides.len())
            .field("dotenv_files", &self.fallbacks.len())
            .finish_non_exhaustive()
    }
}

impl ConfigLoader {
    /// Create a loader reading the process environment.
    #[must_use]
    pub fn new(schema: Schema, mapping: EnvMapping) -> Self {
        Self {
            schema,
            mapping,
            overrides: HashMap::new(),
            primary: Box::new(ProcessEnv),
            fallbacks: Vec::new(),
        }
    }

    /// Replace the process environment with another source.
    ///
    /// # Example
    ///
    /// ```
    /// use essentials_config::{ConfigLoader, EnvMapping, Field, Schema};
    /// use std::collections::HashMap;
    ///
    /// let env = HashMap::from([("PORT".to_string(), "3000".to_string())]);
    /// let config = ConfigLoader::new(Schema::new().field("port", Field::integer()), EnvMapping::new())
    ///     .with_source(env)
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.get("port").and_then(|v| v.as_u64()), Some(3000));
    /// ```
    #[must_use]
    pub fn with_source(mut self, source: impl EnvSource + 'static) -> Self {
        self.primary = Box::new(source);
        self
    }

    /// Add variables that take precedence over every other source.
    #[must_use]
    pub fn with_overrides<K, V>(mut self, overrides: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.overrides
            .extend(overrides.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Use `.env` in the working directory as a fallback source, if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file exists but cannot be parsed.
    pub fn with_dotenv(self) -> Result<Self, ConfigError> {
        let path = Path::new(".env");
        if path.exists() {
            self.with_dotenv_file(path)
        } else {
            tracing::debug!("No .env file found, skipping");
            Ok(self)
        }
    }

    /// Use a dotenv file as a fallback source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file does not exist or cannot be parsed.
    pub fn with_dotenv_file(mut self, path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        self.fallbacks.push(DotenvFile::from_path(path)?);
        Ok(self)
    }

    /// Replace the mapping with one read from a TOML or JSON file.
    pub fn with_mapping_file(mut self, path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        self.mapping = EnvMapping::from_file(path)?;
        Ok(self)
    }

    /// Resolve the schema.
    pub fn load(self) -> Result<ConfigValue, ConfigError> {
        let mut source = LayeredSource::new();
        if !self.overrides.is_empty() {
            source = source.layer(self.overrides);
        }
        source = source.layer(self.primary);
        for dotenv in self.fallbacks {
            source = source.layer(dotenv);
        }

        let config = load_config_from_env(&self.schema, &self.mapping, &source)?;
        tracing::debug!(entries = self.schema.len(), "Configuration loaded");
        Ok(config)
    }

    /// Resolve the schema and deserialize it into `T`.
    pub fn load_as<T: DeserializeOwned>(self) -> Result<T, ConfigError> {
        let mapping = self.mapping.clone();
        self.load()?.deserialize_with(&mapping)
    }
}
