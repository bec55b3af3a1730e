//! # Essentials Server
//!
//! HTTP server, routing and request validation for service essentials.
//!
//! - [`Router`] - `:param` path templates, named routes, fallback endpoint
//! - [`adapter`] - validate query, params and body against [`shape`]s, then
//!   call a typed handler with a [`RequestEnvelope`](adapter::RequestEnvelope)
//! - [`mount_root_route`] - `GET /` health report and `GET /ok` liveness probe
//! - [`ServerEssentials`] - service identity and the central error callback
//! - [`Server`] - hyper HTTP/1.1 server with graceful shutdown
//!
//! ## Example
//!
//! ```rust,ignore
//! use essentials_server::adapter::{adapt, RawEnvelope, Shapes};
//! use essentials_server::{HandlerResult, Router, Server, ServerEssentials};
//! use http::{Method, StatusCode};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut router = Router::new();
//!     router.named_route(
//!         "hello",
//!         Method::GET,
//!         "/hello",
//!         adapt(
//!             |_req: RawEnvelope, _ctx| async { Ok(HandlerResult::text(StatusCode::OK, "hi")) },
//!             Shapes::new(),
//!         ),
//!     );
//!
//!     Server::builder(ServerEssentials::new("hello", "1.0.0"))
//!         .router(router)
//!         .build()
//!         .run()
//!         .await?;
//!     Ok(())
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/essentials-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod adapter;
mod config;
mod endpoint;
mod error;
mod essentials;
pub mod root;
mod router;
mod server;
pub mod shape;
pub mod shutdown;

pub use adapter::{adapt, HttpMethod, RawEnvelope, RequestEnvelope, Shapes};
pub use config::{ServerConfig, ServerConfigBuilder, DEFAULT_HTTP_ADDR, DEFAULT_SHUTDOWN_TIMEOUT_SECS};
pub use endpoint::{endpoint_fn, Endpoint, FnEndpoint, HandlerResult, ResultBody, RouteRequest};
pub use error::ServerError;
pub use essentials::{default_error_callback, ErrorCallback, ErrorScope, ServerEssentials, STARTUP_BANNER};
pub use root::{mount_root_route, process_started_at, RootRouteOptions};
pub use router::{RouteInfo, RouteMatch, Router, SharedEndpoint};
pub use server::{Server, ServerBuilder, NOT_FOUND};
pub use shape::{FieldShape, Shape};
pub use shutdown::{ShutdownHook, ShutdownSignal};
