//! # Essentials Core
//!
//! Core types shared by the service essentials crates.
//!
//! - [`RequestContext`] - Per-request context passed explicitly to handlers
//! - [`RequestId`] - UUID v7 request identifier
//! - [`Locale`] - Negotiated response language
//! - [`ServiceError`] - Tagged union of validation, application and internal errors
//! - [`AppError`] - Coded application errors with localized messages
//! - [`HealthCheck`] / [`HealthRegistry`] - Health checks collected at startup
//! - [`Plugin`] - Dependencies connected before the server starts

#![doc(html_root_url = "https://docs.rs/essentials-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod app_error;
mod context;
mod error;
mod health;
mod locale;
mod plugin;

pub use app_error::{AppError, ErrorCode};
pub use context::{RequestContext, RequestId};
pub use error::{
    Issue, IssueCode, IssuePath, RequestValidationError, ServiceError, ServiceResult,
    ValidationErrorKind,
};
pub use health::{
    ConnectionStatus, HealthCheck, HealthCheckError, HealthFuture, HealthRegistry,
    HealthRegistryBuilder, HealthStatus,
};
pub use locale::Locale;
pub use plugin::{connect_plugins, disconnect_plugins, Plugin, PluginConnection, PluginError};

/// Boxed future used by the object-safe traits in this workspace.
pub use futures_util::future::BoxFuture;
