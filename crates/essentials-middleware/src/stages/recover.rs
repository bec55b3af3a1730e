//! Panic recovery.
//!
//! A panic anywhere below this stage (another stage, the router, a handler)
//! is caught and answered with `500 Internal server error`, so a single bad
//! request never takes the connection task down with it.

use crate::context::MiddlewareContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{Request, Response, ResponseExt};
use essentials_telemetry::panic_message;
use futures_util::FutureExt;
use http::StatusCode;
use std::panic::AssertUnwindSafe;

/// Body sent when a request panicked.
pub const INTERNAL_SERVER_ERROR: &str = "Internal server error";

/// Middleware that converts panics into 500 responses.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecoverMiddleware;

impl RecoverMiddleware {
    /// Creates the stage.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Middleware for RecoverMiddleware {
    fn name(&self) -> &'static str {
        "recover"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let method = request.method().clone();
            let path = request.uri().path().to_string();

            let outcome = AssertUnwindSafe(next.run(ctx, request)).catch_unwind().await;
            match outcome {
                Ok(response) => response,
                Err(payload) => {
                    tracing::error!(
                        request_id = %ctx.request_id(),
                        route = ctx.route_name().unwrap_or_default(),
                        http.method = %method,
                        http.path = %path,
                        error = %panic_message(payload.as_ref()),
                        "Request handler panicked"
                    );
                    Response::text(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_SERVER_ERROR)
                }
            }
        })
    }
}
