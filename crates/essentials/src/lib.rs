//! # Essentials
//!
//! Shared building blocks for small HTTP microservices:
//!
//! - **Configuration**: declarative environment schemas resolved fail-fast
//!   ([`config`])
//! - **Request adapter**: query, route params and body validated against
//!   declared shapes before a handler runs ([`server::adapter`])
//! - **Health**: a root route reporting service identity, uptime and plugin
//!   checks ([`server::root`])
//! - **Errors**: one tagged error union translated to HTTP in a single place
//!   ([`core::ServiceError`])
//! - **Logging**: structured `tracing` output ([`telemetry`])
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use essentials::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     init_logging(&LogConfig::development())?;
//!
//!     let mut router = Router::new();
//!     mount_root_route(&mut router, RootRouteOptions::new("orders", "1.0.0"));
//!
//!     Server::builder(ServerEssentials::new("orders", "1.0.0"))
//!         .config(ServerConfig::builder().host_port("0.0.0.0", 8080).build())
//!         .router(router)
//!         .build()
//!         .run()
//!         .await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Request flow
//!
//! ```text
//! Request → Recover → RequestId → Logging → Cors → BodyParser → Router → Endpoint
//!                                                                          ↓
//! Response ←──────────── error callback (ServiceError → HTTP) ←────────────┘
//! ```

#![doc(html_root_url = "https://docs.rs/essentials/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export core types
pub use essentials_core as core;

// Re-export the schema mapper
pub use essentials_config as config;

// Re-export logging setup
pub use essentials_telemetry as telemetry;

// Re-export middleware types
pub use essentials_middleware as middleware;

// Re-export server types
pub use essentials_server as server;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust,ignore
/// use essentials::prelude::*;
/// ```
pub mod prelude {
    pub use essentials_core::{
        connect_plugins, disconnect_plugins, AppError, ErrorCode, HealthCheck, HealthCheckError,
        HealthRegistry, HealthStatus, Locale, Plugin, PluginConnection, PluginError,
        RequestContext, ServiceError, ServiceResult,
    };

    // Schema mapper
    pub use essentials_config::{ConfigError, ConfigLoader, EnvMapping, Field, Schema};

    // Logging
    pub use essentials_telemetry::{init_logging, install_panic_hook, LogConfig};

    // Middleware
    pub use essentials_middleware::stages::CorsMiddleware;
    pub use essentials_middleware::{Middleware, Pipeline};

    // Server, router and adapter
    pub use essentials_server::adapter::{adapt, RequestEnvelope, Shapes};
    pub use essentials_server::shape::{FieldShape, Shape};
    pub use essentials_server::{
        endpoint_fn, mount_root_route, HandlerResult, RootRouteOptions, RouteRequest, Router,
        Server, ServerConfig, ServerEssentials, ShutdownSignal,
    };
}
