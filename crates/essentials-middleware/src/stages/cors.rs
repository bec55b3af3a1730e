//! CORS (Cross-Origin Resource Sharing) middleware.
//!
//! Preflight requests (`OPTIONS` carrying `Origin` and
//! `Access-Control-Request-Method`) are answered here without reaching the
//! router. Other requests from an allowed origin get the
//! `Access-Control-Allow-Origin` family of headers added to their response.
//!
//! ## Example
//!
//! ```
//! use essentials_middleware::stages::CorsMiddleware;
//! use http::Method;
//! use std::time::Duration;
//!
//! let cors = CorsMiddleware::builder()
//!     .allow_origin("https://app.example.com")
//!     .allow_methods([Method::GET, Method::POST])
//!     .allow_headers(["Content-Type", "Accept-Language"])
//!     .max_age(Duration::from_secs(600))
//!     .build();
//! # let _ = cors;
//! ```

use crate::context::MiddlewareContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{Request, Response, ResponseExt};
use http::header::{
    ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_EXPOSE_HEADERS, ACCESS_CONTROL_MAX_AGE,
    ACCESS_CONTROL_REQUEST_HEADERS, ACCESS_CONTROL_REQUEST_METHOD, ORIGIN, VARY,
};
use http::{HeaderMap, HeaderValue, Method, StatusCode};
use std::time::Duration;

/// Which origins may call the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowedOrigins {
    /// Any origin (`*`).
    Any,
    /// Exactly these origins.
    List(Vec<String>),
}

impl AllowedOrigins {
    /// Checks if an origin is allowed.
    pub fn is_allowed(&self, origin: &str) -> bool {
        match self {
            Self::Any => true,
            Self::List(origins) => origins.iter().any(|o| o == origin),
        }
    }

    fn header_value(&self, origin: &str) -> Option<HeaderValue> {
        match self {
            Self::Any => Some(HeaderValue::from_static("*")),
            Self::List(_) if self.is_allowed(origin) => HeaderValue::from_str(origin).ok(),
            Self::List(_) => None,
        }
    }
}

/// CORS policy applied by the `cors` stage.
#[derive(Debug, Clone)]
pub struct CorsMiddleware {
    origins: AllowedOrigins,
    methods: Vec<Method>,
    headers: Vec<String>,
    expose_headers: Vec<String>,
    allow_credentials: bool,
    max_age: Option<Duration>,
}

impl Default for CorsMiddleware {
    fn default() -> Self {
        Self {
            origins: AllowedOrigins::List(Vec::new()),
            methods: vec![Method::GET, Method::HEAD, Method::POST, Method::PUT, Method::DELETE],
            headers: vec![
                "content-type".to_string(),
                "accept-language".to_string(),
                "x-request-id".to_string(),
            ],
            expose_headers: vec!["x-request-id".to_string()],
            allow_credentials: false,
            max_age: Some(Duration::from_secs(86_400)),
        }
    }
}

/// Builder for [`CorsMiddleware`].
#[derive(Debug, Clone, Default)]
pub struct CorsBuilder {
    policy: CorsMiddleware,
}

impl CorsBuilder {
    /// Starts from the default policy: no origins, common methods and headers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allows any origin.
    ///
    /// Browsers reject `*` together with credentials, so combine this with
    /// `allow_credentials(true)` only if you know why.
    #[must_use]
    pub fn allow_any_origin(mut self) -> Self {
        self.policy.origins = AllowedOrigins::Any;
        self
    }

    /// Adds an allowed origin. Has no effect after [`allow_any_origin`](Self::allow_any_origin).
    #[must_use]
    pub fn allow_origin(mut self, origin: impl Into<String>) -> Self {
        if let AllowedOrigins::List(origins) = &mut self.policy.origins {
            origins.push(origin.into());
        }
        self
    }

    /// Replaces the allowed methods.
    #[must_use]
    pub fn allow_methods(mut self, methods: impl IntoIterator<Item = Method>) -> Self {
        self.policy.methods = methods.into_iter().collect();
        self
    }

    /// Replaces the allowed request headers. `*` allows any header.
    #[must_use]
    pub fn allow_headers<I, S>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.policy.headers = lowercase_all(headers);
        self
    }

    /// Replaces the headers exposed to browser scripts.
    #[must_use]
    pub fn expose_headers<I, S>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.policy.expose_headers = lowercase_all(headers);
        self
    }

    /// Sets whether credentials (cookies, authorization) are allowed.
    #[must_use]
    pub fn allow_credentials(mut self, allow: bool) -> Self {
        self.policy.allow_credentials = allow;
        self
    }

    /// Sets how long browsers may cache a preflight answer.
    #[must_use]
    pub fn max_age(mut self, duration: Duration) -> Self {
        self.policy.max_age = Some(duration);
        self
    }

    /// Builds the stage.
    #[must_use]
    pub fn build(self) -> CorsMiddleware {
        self.policy
    }
}

fn lowercase_all<I, S>(headers: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    headers.into_iter().map(|h| h.into().to_lowercase()).collect()
}

fn insert_joined(headers: &mut HeaderMap, name: http::HeaderName, values: &[&str]) {
    if values.is_empty() {
        return;
    }
    if let Ok(value) = HeaderValue::from_str(&values.join(", ")) {
        headers.insert(name, value);
    }
}

impl CorsMiddleware {
    /// Creates a builder starting from the default policy.
    #[must_use]
    pub fn builder() -> CorsBuilder {
        CorsBuilder::new()
    }

    /// Allows any origin, method and header. Meant for local development.
    #[must_use]
    pub fn permissive() -> Self {
        CorsBuilder::new()
            .allow_any_origin()
            .allow_methods([
                Method::GET,
                Method::HEAD,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::PATCH,
                Method::OPTIONS,
            ])
            .allow_headers(["*"])
            .build()
    }

    /// Returns the origin policy.
    #[must_use]
    pub fn origins(&self) -> &AllowedOrigins {
        &self.origins
    }

    fn is_preflight(request: &Request) -> bool {
        request.method() == Method::OPTIONS
            && request.headers().contains_key(ORIGIN)
            && request.headers().contains_key(ACCESS_CONTROL_REQUEST_METHOD)
    }

    fn origin(request: &Request) -> Option<&str> {
        request.headers().get(ORIGIN).and_then(|v| v.to_str().ok())
    }

    fn header_allowed(&self, header: &str) -> bool {
        self.headers.iter().any(|h| h == "*" || h == header)
    }

    fn preflight(&self, request: &Request) -> Response {
        let Some(origin) = Self::origin(request) else {
            return Response::text(StatusCode::FORBIDDEN, "Missing Origin header");
        };
        if !self.origins.is_allowed(origin) {
            return Response::text(StatusCode::FORBIDDEN, "Origin not allowed");
        }

        let requested_method = request
            .headers()
            .get(ACCESS_CONTROL_REQUEST_METHOD)
            .and_then(|v| v.to_str().ok())
            .and_then(|m| m.parse::<Method>().ok());
        match requested_method {
            Some(method) if self.methods.contains(&method) => {}
            _ => return Response::text(StatusCode::FORBIDDEN, "Method not allowed"),
        }

        if let Some(requested) = request
            .headers()
            .get(ACCESS_CONTROL_REQUEST_HEADERS)
            .and_then(|v| v.to_str().ok())
        {
            let rejected = requested
                .split(',')
                .map(|h| h.trim().to_lowercase())
                .filter(|h| !h.is_empty())
                .find(|h| !self.header_allowed(h));
            if let Some(header) = rejected {
                return Response::text(
                    StatusCode::FORBIDDEN,
                    format!("Header '{header}' not allowed"),
                );
            }
        }

        let mut response = Response::empty(StatusCode::NO_CONTENT);
        let headers = response.headers_mut();
        if let Some(value) = self.origins.header_value(origin) {
            headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, value);
        }
        let methods: Vec<&str> = self.methods.iter().map(Method::as_str).collect();
        insert_joined(headers, ACCESS_CONTROL_ALLOW_METHODS, &methods);
        let allowed: Vec<&str> = self.headers.iter().map(String::as_str).collect();
        insert_joined(headers, ACCESS_CONTROL_ALLOW_HEADERS, &allowed);
        if self.allow_credentials {
            headers.insert(ACCESS_CONTROL_ALLOW_CREDENTIALS, HeaderValue::from_static("true"));
        }
        if let Some(max_age) = self.max_age {
            headers.insert(ACCESS_CONTROL_MAX_AGE, HeaderValue::from(max_age.as_secs()));
        }
        headers.insert(
            VARY,
            HeaderValue::from_static(
                "Origin, Access-Control-Request-Method, Access-Control-Request-Headers",
            ),
        );
        response
    }

    fn decorate(&self, response: &mut Response, origin: &str) {
        let headers = response.headers_mut();
        if let Some(value) = self.origins.header_value(origin) {
            headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, value);
        }
        if self.allow_credentials {
            headers.insert(ACCESS_CONTROL_ALLOW_CREDENTIALS, HeaderValue::from_static("true"));
        }
        let exposed: Vec<&str> = self.expose_headers.iter().map(String::as_str).collect();
        insert_joined(headers, ACCESS_CONTROL_EXPOSE_HEADERS, &exposed);
        headers.append(VARY, HeaderValue::from_static("Origin"));
    }
}

impl Middleware for CorsMiddleware {
    fn name(&self) -> &'static str {
        "cors"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            if Self::is_preflight(&request) {
                return self.preflight(&request);
            }

            let origin = Self::origin(&request)
                .filter(|o| self.origins.is_allowed(o))
                .map(String::from);
            let mut response = next.run(ctx, request).await;
            if let Some(origin) = origin {
                self.decorate(&mut response, &origin);
            }
            response
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::Request as HttpRequest;
    use http_body_util::Full;

    const APP: &str = "https://app.example.com";

    fn policy() -> CorsMiddleware {
        CorsMiddleware::builder()
            .allow_origin(APP)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers(["Content-Type"])
            .allow_credentials(true)
            .max_age(Duration::from_secs(600))
            .build()
    }

    fn simple_request(origin: &str) -> Request {
        HttpRequest::builder()
            .uri("/test")
            .header(ORIGIN, origin)
            .body(Full::new(Bytes::new()))
            .unwrap()
    }

    fn preflight_request(origin: &str, method: &str, headers: Option<&str>) -> Request {
        let mut builder = HttpRequest::builder()
            .method(Method::OPTIONS)
            .uri("/test")
            .header(ORIGIN, origin)
            .header(ACCESS_CONTROL_REQUEST_METHOD, method);
        if let Some(h) = headers {
            builder = builder.header(ACCESS_CONTROL_REQUEST_HEADERS, h);
        }
        builder.body(Full::new(Bytes::new())).unwrap()
    }

    fn ok_handler<'a>() -> Next<'a> {
        Next::handler(|_ctx, _req| Box::pin(async { Response::text(StatusCode::OK, "OK") }))
    }

    fn unreachable_handler<'a>() -> Next<'a> {
        Next::handler(|_ctx, _req| -> BoxFuture<'static, Response> {
            panic!("preflight must not reach the handler")
        })
    }

    #[test]
    fn test_allowed_origins() {
        let list = AllowedOrigins::List(vec![APP.to_string()]);
        assert!(list.is_allowed(APP));
        assert!(!list.is_allowed("https://evil.example.com"));
        assert!(AllowedOrigins::Any.is_allowed("https://anything.example.com"));
    }

    #[test]
    fn test_allow_origin_after_any_is_ignored() {
        let cors = CorsMiddleware::builder()
            .allow_any_origin()
            .allow_origin(APP)
            .build();
        assert_eq!(cors.origins(), &AllowedOrigins::Any);
    }

    #[tokio::test]
    async fn test_preflight_allowed() {
        let mut ctx = MiddlewareContext::new();
        let response = policy()
            .process(
                &mut ctx,
                preflight_request(APP, "POST", Some("content-type")),
                unreachable_handler(),
            )
            .await;

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let headers = response.headers();
        assert_eq!(headers.get(ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(), APP);
        assert_eq!(headers.get(ACCESS_CONTROL_ALLOW_METHODS).unwrap(), "GET, POST");
        assert_eq!(headers.get(ACCESS_CONTROL_ALLOW_HEADERS).unwrap(), "content-type");
        assert_eq!(headers.get(ACCESS_CONTROL_ALLOW_CREDENTIALS).unwrap(), "true");
        assert_eq!(headers.get(ACCESS_CONTROL_MAX_AGE).unwrap(), "600");
    }

    #[tokio::test]
    async fn test_preflight_rejects_origin() {
        let mut ctx = MiddlewareContext::new();
        let response = policy()
            .process(
                &mut ctx,
                preflight_request("https://evil.example.com", "GET", None),
                unreachable_handler(),
            )
            .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_preflight_rejects_method() {
        let mut ctx = MiddlewareContext::new();
        let response = policy()
            .process(&mut ctx, preflight_request(APP, "DELETE", None), unreachable_handler())
            .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_preflight_rejects_header() {
        let mut ctx = MiddlewareContext::new();
        let response = policy()
            .process(
                &mut ctx,
                preflight_request(APP, "GET", Some("content-type, x-secret")),
                unreachable_handler(),
            )
            .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_permissive_allows_any_header() {
        let mut ctx = MiddlewareContext::new();
        let response = CorsMiddleware::permissive()
            .process(
                &mut ctx,
                preflight_request("https://x.example.com", "PATCH", Some("x-anything")),
                unreachable_handler(),
            )
            .await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(response.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(), "*");
    }

    #[tokio::test]
    async fn test_simple_request_decorated() {
        let mut ctx = MiddlewareContext::new();
        let response = policy()
            .process(&mut ctx, simple_request(APP), ok_handler())
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers.get(ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(), APP);
        assert_eq!(headers.get(ACCESS_CONTROL_EXPOSE_HEADERS).unwrap(), "x-request-id");
        assert_eq!(headers.get(VARY).unwrap(), "Origin");
    }

    #[tokio::test]
    async fn test_disallowed_origin_not_decorated() {
        let mut ctx = MiddlewareContext::new();
        let response = policy()
            .process(&mut ctx, simple_request("https://evil.example.com"), ok_handler())
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
    }

    #[test]
    fn test_middleware_name() {
        assert_eq!(policy().name(), "cors");
    }
}
