//! Logging for service essentials.
//!
//! - **Logging**: structured JSON (production) or pretty (development) output
//!   through `tracing-subscriber`, see [`init_logging`]
//! - **Panics**: [`install_panic_hook`] logs panics as `Uncaught exception`
//! - **Field names**: [`fields`] lists the keys used across the workspace
//!
//! # Example
//!
//! ```rust,ignore
//! use essentials_telemetry::{init_logging, install_panic_hook, LogConfig};
//!
//! init_logging(&LogConfig::for_environment(is_production))?;
//! install_panic_hook();
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod logging;
pub mod panic;

pub use error::TelemetryError;
pub use logging::{create_env_filter, fields, init_logging, LogConfig};
pub use panic::{install_panic_hook, panic_message};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
