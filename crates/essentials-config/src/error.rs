//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during configuration loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// An environment variable is missing or failed to decode.
    #[error("Invalid value for {field}/{var}: {reason}")]
    InvalidEnvValue {
        /// Schema key of the field.
        field: String,
        /// Environment variable the field was read from.
        var: String,
        /// `Required`, `Invalid number` or `Invalid boolean`.
        reason: String,
    },

    /// The mapping has a group where the schema has a field, or the reverse.
    #[error("mapping shape does not match schema at '{path}': {reason}")]
    ShapeMismatch {
        /// Dotted path of the offending entry.
        path: String,
        /// What was expected.
        reason: String,
    },

    /// The resolved configuration does not fit the target type.
    #[error("failed to deserialize configuration: {0}")]
    Deserialize(#[from] serde_json::Error),

    /// A dotenv file could not be parsed.
    #[error("failed to parse dotenv file {path}: {reason}")]
    Dotenv {
        /// Path to the file.
        path: PathBuf,
        /// Parser message.
        reason: String,
    },

    /// TOML parsing error.
    #[error("failed to parse TOML mapping: {0}")]
    TomlError(#[from] toml::de::Error),

    /// A required file does not exist.
    #[error("configuration file not found: {path}")]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// A file exists but could not be read.
    #[error("failed to read configuration file: {path}")]
    ReadError {
        /// Path to the file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

impl ConfigError {
    /// Create a new invalid env value error.
    pub fn invalid_env_value(
        field: impl Into<String>,
        var: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidEnvValue {
            field: field.into(),
            var: var.into(),
            reason: reason.into(),
        }
    }

    /// Create a new shape mismatch error.
    pub fn shape_mismatch(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ShapeMismatch {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a new dotenv error.
    pub fn dotenv(path: impl Into<PathBuf>, reason: impl std::fmt::Display) -> Self {
        Self::Dotenv {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a new file not found error.
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// Create a new read error.
    pub fn read_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ReadError {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_env_value_message() {
        let err = ConfigError::invalid_env_value("port", "PORT", "Invalid number");
        assert_eq!(err.to_string(), "Invalid value for port/PORT: Invalid number");
    }

    #[test]
    fn test_shape_mismatch_error() {
        let err = ConfigError::shape_mismatch("server.port", "expected a variable name");
        assert!(err.to_string().contains("server.port"));
    }

    #[test]
    fn test_file_not_found_error() {
        let err = ConfigError::file_not_found("/path/to/.env");
        assert!(err.to_string().contains("/path/to/.env"));
    }
}
