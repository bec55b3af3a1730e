//! Service identity and the central error callback.
//!
//! [`ServerEssentials`] is created once per process. It logs the startup
//! banner, stamps every [`RequestContext`] with the service name and version,
//! and owns the [`ErrorCallback`] that turns a handler's [`ServiceError`]
//! into a response.

use essentials_core::{RequestContext, ServiceError};
use essentials_middleware::stages::recover::INTERNAL_SERVER_ERROR;
use essentials_middleware::{MiddlewareContext, Response, ResponseExt};
use http::{Method, StatusCode};
use std::fmt;
use std::sync::Arc;

/// Logged once when the essentials are created.
pub const STARTUP_BANNER: &str = "--------------------> Starting server <--------------------";

/// The request an error was raised for.
#[derive(Debug, Clone, Copy)]
pub struct ErrorScope<'a> {
    /// Context of the failing request.
    pub ctx: &'a RequestContext,
    /// Request method.
    pub method: &'a Method,
    /// Request path.
    pub path: &'a str,
}

/// Turns a handler error into a response.
pub type ErrorCallback = Arc<dyn Fn(ServiceError, &ErrorScope<'_>) -> Response + Send + Sync>;

/// The error callback used unless the application supplies its own.
///
/// | Error | Response | Logged |
/// |---|---|---|
/// | `Validation` | 400, `{ status, details }` | debug |
/// | `App` | its status, `{ code, message, metadata }` in the request locale | error, with code, location and context |
/// | `Internal` | 500, `Internal server error` | error, with route, method and path |
pub fn default_error_callback(error: ServiceError, scope: &ErrorScope<'_>) -> Response {
    match error {
        ServiceError::Validation(err) => {
            tracing::debug!(
                request_id = %scope.ctx.request_id(),
                status = %err.status,
                issues = err.details.len(),
                "Request validation failed"
            );
            match serde_json::to_value(&err) {
                Ok(body) => Response::json(StatusCode::BAD_REQUEST, &body),
                Err(_) => Response::text(StatusCode::BAD_REQUEST, err.status.as_str()),
            }
        }
        ServiceError::App(err) => {
            tracing::error!(
                request_id = %scope.ctx.request_id(),
                code = %err.code(),
                location = %err.location(),
                context = %serde_json::Value::Object(err.context().clone()),
                "{}",
                err.message(scope.ctx.locale())
            );
            Response::json(err.status_code(), &err.to_body(scope.ctx.locale()))
        }
        ServiceError::Internal(err) => {
            tracing::error!(
                request_id = %scope.ctx.request_id(),
                route = scope.ctx.route_name().unwrap_or_default(),
                http.method = %scope.method,
                http.path = %scope.path,
                error = %format!("{err:#}"),
                "Unhandled error"
            );
            Response::text(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_SERVER_ERROR)
        }
    }
}

/// Service identity plus error handling, shared by every request.
///
/// # Example
///
/// ```rust
/// use essentials_server::ServerEssentials;
///
/// let essentials = ServerEssentials::new("user-service", "1.0.0");
/// assert_eq!(essentials.service_name(), "user-service");
/// ```
#[derive(Clone)]
pub struct ServerEssentials {
    service_name: Arc<str>,
    service_version: Arc<str>,
    error_callback: ErrorCallback,
}

impl ServerEssentials {
    /// Creates the essentials with the default error callback and logs the
    /// startup banner.
    pub fn new(service_name: impl Into<Arc<str>>, service_version: impl Into<Arc<str>>) -> Self {
        tracing::info!("{STARTUP_BANNER}");
        crate::root::process_started_at();
        Self {
            service_name: service_name.into(),
            service_version: service_version.into(),
            error_callback: Arc::new(default_error_callback),
        }
    }

    /// Replaces the error callback.
    #[must_use]
    pub fn with_error_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(ServiceError, &ErrorScope<'_>) -> Response + Send + Sync + 'static,
    {
        self.error_callback = Arc::new(callback);
        self
    }

    /// Service name.
    #[must_use]
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Service version.
    #[must_use]
    pub fn service_version(&self) -> &str {
        &self.service_version
    }

    /// Builds the handler-facing context for a request.
    #[must_use]
    pub fn request_context(&self, ctx: &MiddlewareContext) -> RequestContext {
        ctx.to_request_context()
            .with_service(Arc::clone(&self.service_name), Arc::clone(&self.service_version))
    }

    /// Runs the error callback.
    #[must_use]
    pub fn handle_error(&self, error: ServiceError, scope: &ErrorScope<'_>) -> Response {
        (self.error_callback)(error, scope)
    }
}

impl fmt::Debug for ServerEssentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerEssentials")
            .field("service_name", &self.service_name)
            .field("service_version", &self.service_version)
            .finish_non_exhaustive()
    }
}
