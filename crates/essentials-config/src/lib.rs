//! Declarative environment configuration.
//!
//! A service describes its configuration once as a [`Schema`] (an ordered
//! tree of typed fields) plus an [`EnvMapping`] naming the environment
//! variable behind each field. [`load_config_from_env`] resolves the schema
//! against an [`EnvSource`] into a [`ConfigValue`] tree, failing fast on the
//! first missing or malformed variable.
//!
//! # Example
//!
//! ```
//! use essentials_config::{ConfigLoader, EnvMapping, Field, Schema};
//! use serde::Deserialize;
//! use std::collections::HashMap;
//!
//! #[derive(Deserialize)]
//! struct Config {
//!     service: Service,
//!     features: Vec<String>,
//! }
//!
//! #[derive(Deserialize)]
//! struct Service {
//!     name: String,
//!     port: u16,
//! }
//!
//! let schema = Schema::new()
//!     .group(
//!         "service",
//!         Schema::new()
//!             .field("name", Field::string())
//!             .field("port", Field::integer().with_default(8080)),
//!     )
//!     .field("features", Field::string_list());
//!
//! let mapping = EnvMapping::new()
//!     .group("service", EnvMapping::new().var("name", "SERVICE_NAME"));
//!
//! let env = HashMap::from([
//!     ("SERVICE_NAME".to_string(), "orders".to_string()),
//!     ("FEATURES".to_string(), "a, b".to_string()),
//! ]);
//!
//! let config: Config = ConfigLoader::new(schema, mapping)
//!     .with_source(env)
//!     .load_as()
//!     .unwrap();
//!
//! assert_eq!(config.service.name, "orders");
//! assert_eq!(config.service.port, 8080);
//! assert_eq!(config.features, vec!["a", "b"]);
//! ```
//!
//! # Decoding rules
//!
//! | Kind | Accepted | Failure reason |
//! |---|---|---|
//! | integer | `^[0-9]+$` | `Invalid number` |
//! | boolean | `true`, `True`, `false`, `False` | `Invalid boolean` |
//! | string list | anything; `""` is `[]`, elements trimmed | - |
//! | string | anything, unchanged | - |
//!
//! An unset variable takes the field's default, is omitted if the field is
//! optional, and otherwise fails with `Required`.

#![doc(html_root_url = "https://docs.rs/essentials-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod decode;
mod error;
mod loader;
mod mapping;
mod resolve;
mod schema;
mod source;
mod value;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use mapping::{EnvMapping, MappingEntry};
pub use resolve::load_config_from_env;
pub use schema::{Field, FieldKind, Node, Schema};
pub use source::{DotenvFile, EnvSource, LayeredSource, ProcessEnv};
pub use value::ConfigValue;
