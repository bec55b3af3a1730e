//! Request logging middleware.
//!
//! Emits one structured line per completed request:
//!
//! ```text
//! INFO Request completed request_id=0190... route=getUser http.method=GET
//!      http.path=/users/1 http.status_code=200 duration_ms=0.42
//! ```
//!
//! Server errors are logged at `warn`, everything else at `info`. Field names
//! come from [`essentials_telemetry::fields`].

use crate::context::MiddlewareContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{Request, Response};
use std::time::Instant;

/// What the logging stage recorded about a finished request.
///
/// Stored in the context as an extension so later code (and tests) can
/// inspect it.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestLog {
    /// The HTTP method.
    pub method: String,
    /// The request path.
    pub path: String,
    /// The response status code.
    pub status_code: u16,
    /// Time spent below this stage, in milliseconds.
    pub duration_ms: f64,
    /// The matched route name, if any.
    pub route: Option<String>,
}

/// Middleware that logs every request once it has a response.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingMiddleware {
    skip_health: bool,
}

impl LoggingMiddleware {
    /// Creates a logging stage that logs every request.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Skips the `/ok` liveness probe, which load balancers hit constantly.
    #[must_use]
    pub fn skip_liveness_probe(mut self) -> Self {
        self.skip_health = true;
        self
    }

    fn emit(&self, ctx: &MiddlewareContext, log: &RequestLog) {
        if self.skip_health && log.path == "/ok" {
            return;
        }

        let route = log.route.as_deref().unwrap_or_default();
        if log.status_code >= 500 {
            tracing::warn!(
                request_id = %ctx.request_id(),
                route,
                http.method = %log.method,
                http.path = %log.path,
                http.status_code = log.status_code,
                duration_ms = log.duration_ms,
                "Request failed"
            );
        } else {
            tracing::info!(
                request_id = %ctx.request_id(),
                route,
                http.method = %log.method,
                http.path = %log.path,
                http.status_code = log.status_code,
                duration_ms = log.duration_ms,
                "Request completed"
            );
        }
    }
}

impl Middleware for LoggingMiddleware {
    fn name(&self) -> &'static str {
        "logging"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let start = Instant::now();
            let method = request.method().to_string();
            let path = request.uri().path().to_string();

            let response = next.run(ctx, request).await;

            let log = RequestLog {
                method,
                path,
                status_code: response.status().as_u16(),
                duration_ms: start.elapsed().as_secs_f64() * 1000.0,
                route: ctx.route_name().map(ToString::to_string),
            };
            self.emit(ctx, &log);
            ctx.set_extension(log);

            response
        })
    }
}
