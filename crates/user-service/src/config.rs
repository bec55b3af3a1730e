//! Service configuration from the environment.
//!
//! | Variable | Default |
//! |---|---|
//! | `HOST` | `0.0.0.0` |
//! | `PORT` | `50051` |

use essentials_config::{ConfigError, ConfigLoader, EnvMapping, EnvSource, Field, Schema};
use serde::Deserialize;

/// Default bind host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default bind port.
pub const DEFAULT_PORT: u16 = 50051;

/// Resolved service configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UserServiceConfig {
    /// Interface to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
}

impl UserServiceConfig {
    /// The configuration schema.
    #[must_use]
    pub fn schema() -> Schema {
        Schema::new()
            .field("host", Field::string().with_default(DEFAULT_HOST))
            .field("port", Field::integer().with_default(u64::from(DEFAULT_PORT)))
    }

    /// Maps each field to its variable.
    #[must_use]
    pub fn mapping() -> EnvMapping {
        EnvMapping::new().var("host", "HOST").var("port", "PORT")
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
}
