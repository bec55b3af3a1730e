//! Environment configuration.

use essentials_config::{ConfigError, ConfigLoader, EnvMapping, EnvSource, Field, Schema};
use serde::Deserialize;

/// Service identity.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServiceSection {
    /// Service name.
    pub name: String,
    /// Service version.
    pub version: String,
}

/// Listener settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerSection {
    /// Port to bind.
    pub port: u16,
    /// Public URL, logged at startup.
    pub url: String,
}

/// Resolved app configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    /// Service identity.
    pub service: ServiceSection,
    /// Listener settings.
    pub server: ServerSection,
    /// Enabled feature flags.
    pub features: Vec<String>,
    /// Deployment environment name.
    pub node_env: String,
}

impl AppConfig {
    /// The configuration schema.
    #[must_use]
    pub fn schema() -> Schema {
        Schema::new()
            .group(
                "service",
                Schema::new()
                    .field("name", Field::string())
                    .field("version", Field::string()),
            )
            .group(
                "server",
                Schema::new()
                    .field("port", Field::integer())
                    .field("url", Field::string()),
            )
            .field("features", Field::string_list())
            .field("nodeEnv", Field::string())
    }

    /// Maps each field to its variable.
    #[must_use]
    pub fn mapping() -> EnvMapping {
        EnvMapping::new()
            .group(
                "service",
                EnvMapping::new()
                    .var("name", "TEST_SERVICE_NAME")
                    .var("version", "TEST_SERVICE_VERSION"),
            )
            .group(
                "server",
                EnvMapping::new()
                    .var("port", "TEST_SERVICE_PORT")
                    .var("url", "TEST_SERVICE_URL"),
            )
            .var("features", "FEATURES")
            .var("nodeEnv", "NODE_ENV")
    }

    /// Loads from the process environment, with `.env` as a fallback.
    pub fn from_env() -> Result<Self, ConfigError> {
        ConfigLoader::new(Self::schema(), Self::mapping())
            .with_dotenv()?
            .load_as()
    }

    /// Loads from the given source.
    pub fn from_source(source: impl EnvSource + 'static) -> Result<Self, ConfigError> {
        ConfigLoader::new(Self::schema(), Self::mapping())
            .with_source(source)
            .load_as()
    }

    /// `true` when running as `production` or `prod`.
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self.node_env.as_str(), "production" | "prod")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(node_env: &str) -> HashMap<String, String> {
        [
            ("TEST_SERVICE_NAME", "test-app"),
            ("TEST_SERVICE_VERSION", "1.2.3"),
            ("TEST_SERVICE_PORT", "3000"),
            ("TEST_SERVICE_URL", "http://localhost:3000"),
            ("FEATURES", "alpha, beta"),
            ("NODE_ENV", node_env),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    #[test]
    fn test_load() {
        let config = AppConfig::from_source(env("development")).unwrap();
        assert_eq!(config.service.name, "test-app");
        assert_eq!(config.service.version, "1.2.3");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.features, vec!["alpha", "beta"]);
        assert!(!config.is_production());
    }

    #[test]
    fn test_is_production() {
        assert!(AppConfig::from_source(env("production")).unwrap().is_production());
        assert!(AppConfig::from_source(env("prod")).unwrap().is_production());
        assert!(!AppConfig::from_source(env("staging")).unwrap().is_production());
    }

    #[test]
    fn test_missing_variable() {
        let mut vars = env("development");
        vars.remove("TEST_SERVICE_URL");
        let err = AppConfig::from_source(vars).unwrap_err();
        assert!(err.to_string().contains("TEST_SERVICE_URL"));
        assert!(err.to_string().contains("Required"));
    }

    #[test]
    fn test_out_of_range_port_names_variable() {
        let mut vars = env("development");
        vars.insert("TEST_SERVICE_PORT".to_string(), "70000".to_string());
        let err = AppConfig::from_source(vars).unwrap_err();

        let message = err.to_string();
        assert!(message.contains("port"), "{message}");
        assert!(message.contains("TEST_SERVICE_PORT"), "{message}");
        assert!(matches!(err, ConfigError::InvalidEnvValue { .. }));
    }

    #[test]
    fn test_load_from_dotenv_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(
            &mut file,
            b"TEST_SERVICE_NAME=from-file\nTEST_SERVICE_VERSION=0.0.1\nTEST_SERVICE_PORT=8081\n\
              TEST_SERVICE_URL=http://localhost:8081\nFEATURES=\nNODE_ENV=prod\n",
        )
        .unwrap();

        let config: AppConfig = ConfigLoader::new(AppConfig::schema(), AppConfig::mapping())
            .with_source(HashMap::from([("TEST_SERVICE_PORT".to_string(), "9000".to_string())]))
            .with_dotenv_file(file.path())
            .unwrap()
            .load_as()
            .unwrap();

        assert_eq!(config.service.name, "from-file");
        assert_eq!(config.server.port, 9000);
        assert!(config.is_production());
    }

    #[test]
    fn test_empty_features() {
        let mut vars = env("development");
        vars.insert("FEATURES".to_string(), String::new());
        assert!(AppConfig::from_source(vars).unwrap().features.is_empty());
    }
}
