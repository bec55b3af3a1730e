//! # Essentials Middleware
//!
//! The middleware pipeline every request of a service runs through.
//!
//! ```text
//! Request → recover → request_id → logging → [cors] → body_parser → Handler
//!                                                                      ↓
//! Response ←─────────────────────────────────────────────────────────┘
//! ```
//!
//! A [`Pipeline`] is an immutable chain of [`Middleware`] stages built once at
//! startup. Each stage receives a mutable [`MiddlewareContext`], the request,
//! and a [`Next`] callback for the rest of the chain. The terminal handler is
//! a closure supplied per request by the server's router.
//!
//! ## Example
//!
//! ```
//! use essentials_middleware::pipeline::Pipeline;
//! use essentials_middleware::stages::CorsMiddleware;
//!
//! let pipeline = Pipeline::standard(Some(CorsMiddleware::permissive()));
//! assert_eq!(
//!     pipeline.stage_names(),
//!     ["recover", "request_id", "logging", "cors", "body_parser"]
//! );
//! ```

#![doc(html_root_url = "https://docs.rs/essentials-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod context;
pub mod middleware;
pub mod pipeline;
pub mod stages;
pub mod types;

pub use context::MiddlewareContext;
pub use middleware::{BoxFuture, Handler, Middleware, Next};
pub use pipeline::{BoxedMiddleware, Pipeline, PipelineBuilder};
pub use types::{Request, Response, ResponseExt};
