//! Endpoints and their inputs and outputs.
//!
//! The router hands every matched request to an [`Endpoint`] as a
//! [`RouteRequest`] together with the request's [`RequestContext`]. The
//! endpoint answers with a [`HandlerResult`] or a [`ServiceError`] which the
//! server's error callback turns into a response.

use crate::router::RouteInfo;
use essentials_core::{BoxFuture, RequestContext, ServiceError, ServiceResult};
use essentials_middleware::{Response, ResponseExt};
use http::{HeaderMap, Method, StatusCode};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;

/// Raw input of a matched route.
#[derive(Debug, Clone)]
pub struct RouteRequest {
    method: Method,
    path: String,
    query: Option<String>,
    headers: HeaderMap,
    params: IndexMap<String, String>,
    body: Option<Value>,
    routes: Arc<[RouteInfo]>,
}

impl RouteRequest {
    /// Creates a request with no query, headers, params or body.
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: None,
            headers: HeaderMap::new(),
            params: IndexMap::new(),
            body: None,
            routes: Arc::from(Vec::new()),
        }
    }

    /// Sets the raw query string (without the leading `?`).
    #[must_use]
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Sets the request headers.
    #[must_use]
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Adds a route parameter.
    #[must_use]
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Replaces the route parameters.
    #[must_use]
    pub fn with_params(mut self, params: IndexMap<String, String>) -> Self {
        self.params = params;
        self
    }

    /// Sets the parsed body.
    #[must_use]
    pub fn with_body(mut self, body: Option<Value>) -> Self {
        self.body = body;
        self
    }

    /// Sets the route table snapshot.
    #[must_use]
    pub fn with_routes(mut self, routes: Arc<[RouteInfo]>) -> Self {
        self.routes = routes;
        self
    }

    /// HTTP method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Request path without the query string.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Raw query string, if any.
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// Request headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Route parameters in template order.
    pub fn params(&self) -> &IndexMap<String, String> {
        &self.params
    }

    /// Parsed request body, if the body parser produced one.
    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    /// Every registered route, as known when the server was built.
    pub fn routes(&self) -> &[RouteInfo] {
        &self.routes
    }
}

/// Body of a [`HandlerResult`].
#[derive(Debug, Clone, PartialEq)]
pub enum ResultBody {
    /// Serialized as `application/json`.
    Json(Value),
    /// Sent as `text/plain`.
    Text(String),
    /// No body.
    Empty,
}

/// Status and body produced by a handler, copied verbatim to the response.
#[derive(Debug, Clone, PartialEq)]
pub struct HandlerResult {
    /// Response status.
    pub status: StatusCode,
    /// Response body.
    pub body: ResultBody,
}

impl HandlerResult {
    /// A JSON result from any serializable value.
    pub fn json<T: Serialize>(status: StatusCode, body: &T) -> ServiceResult<Self> {
        let value = serde_json::to_value(body)
            .map_err(|e| ServiceError::internal(format!("Failed to serialize response: {e}")))?;
        Ok(Self::json_value(status, value))
    }

    /// A JSON result from a value.
    #[must_use]
    pub fn json_value(status: StatusCode, body: Value) -> Self {
        Self {
            status,
            body: ResultBody::Json(body),
        }
    }

    /// A `200 OK` JSON result.
    pub fn ok<T: Serialize>(body: &T) -> ServiceResult<Self> {
        Self::json(StatusCode::OK, body)
    }

    /// A plain text result.
    #[must_use]
    pub fn text(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: ResultBody::Text(body.into()),
        }
    }

    /// A result without a body.
    #[must_use]
    pub fn empty(status: StatusCode) -> Self {
        Self {
            status,
            body: ResultBody::Empty,
        }
    }

    /// Converts the result into an HTTP response.
    #[must_use]
    pub fn into_response(self) -> Response {
        match self.body {
            ResultBody::Json(value) => Response::json(self.status, &value),
            ResultBody::Text(text) => Response::text(self.status, text),
            ResultBody::Empty => Response::empty(self.status),
        }
    }
}

/// A route target.
pub trait Endpoint: Send + Sync + 'static {
    /// Handles one matched request.
    fn call<'a>(
        &'a self,
        request: RouteRequest,
        ctx: RequestContext,
    ) -> BoxFuture<'a, ServiceResult<HandlerResult>>;
}

/// An [`Endpoint`] backed by an async function over the raw request.
///
/// Created with [`endpoint_fn`].
pub struct FnEndpoint<F> {
    f: F,
}

impl<F, Fut> Endpoint for FnEndpoint<F>
where
    F: Fn(RouteRequest, RequestContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ServiceResult<HandlerResult>> + Send + 'static,
{
    fn call<'a>(
        &'a self,
        request: RouteRequest,
        ctx: RequestContext,
    ) -> BoxFuture<'a, ServiceResult<HandlerResult>> {
        Box::pin((self.f)(request, ctx))
    }
}

impl<F> std::fmt::Debug for FnEndpoint<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnEndpoint").finish_non_exhaustive()
    }
}

/// Wraps an async function as an [`Endpoint`].
///
/// # Example
///
/// ```rust
/// use essentials_server::{endpoint_fn, HandlerResult};
/// use http::StatusCode;
///
/// let lost = endpoint_fn(|_request, _ctx| async {
///     Ok(HandlerResult::text(StatusCode::OK, "You're lost"))
/// });
/// # let _ = lost;
/// ```
pub fn endpoint_fn<F, Fut>(f: F) -> FnEndpoint<F>
where
    F: Fn(RouteRequest, RequestContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ServiceResult<HandlerResult>> + Send + 'static,
{
    FnEndpoint { f }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use serde_json::json;

    async fn body_string(response: Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn test_route_request_builders() {
        let request = RouteRequest::new(Method::GET, "/users/7")
            .with_query("page=2")
            .with_param("id", "7")
            .with_body(Some(json!({"a": 1})));

        assert_eq!(request.method(), Method::GET);
        assert_eq!(request.path(), "/users/7");
        assert_eq!(request.query(), Some("page=2"));
        assert_eq!(request.params().get("id").map(String::as_str), Some("7"));
        assert_eq!(request.body(), Some(&json!({"a": 1})));
        assert!(request.routes().is_empty());
    }

    #[tokio::test]
    async fn test_json_result_into_response() {
        let result = HandlerResult::ok(&json!({"id": "2"})).unwrap();
        let response = result.into_response();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()["content-type"],
            essentials_middleware::types::APPLICATION_JSON
        );
        assert_eq!(body_string(response).await, r#"{"id":"2"}"#);
    }

    #[tokio::test]
    async fn test_text_and_empty_results() {
        let response = HandlerResult::text(StatusCode::CREATED, "made").into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(body_string(response).await, "made");

        let response = HandlerResult::empty(StatusCode::NO_CONTENT).into_response();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(body_string(response).await, "");
    }

    #[tokio::test]
    async fn test_fn_endpoint() {
        let endpoint = endpoint_fn(|request: RouteRequest, ctx: RequestContext| async move {
            Ok(HandlerResult::text(
                StatusCode::OK,
                format!("{} {}", request.path(), ctx.service_name()),
            ))
        });

        let ctx = RequestContext::mock().with_service("svc", "1.0.0");
        let result = endpoint
            .call(RouteRequest::new(Method::GET, "/x"), ctx)
            .await
            .unwrap();
        assert_eq!(result.body, ResultBody::Text("/x svc".to_string()));
    }
}
