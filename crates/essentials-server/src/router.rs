//! Request routing and path matching.
//!
//! Routes map a method and a path template to an [`Endpoint`]. Templates use
//! `:name` segments for parameters; literal segments match case-insensitively
//! and a trailing slash is optional. Routes are tried in registration order
//! and the first match wins.
//!
//! # Example
//!
//! ```rust
//! use essentials_server::{endpoint_fn, HandlerResult, Router};
//! use http::{Method, StatusCode};
//!
//! let mut router = Router::new();
//! router.named_route(
//!     "getUser",
//!     Method::GET,
//!     "/users/:id",
//!     endpoint_fn(|_req, _ctx| async { Ok(HandlerResult::empty(StatusCode::OK)) }),
//! );
//!
//! let matched = router.match_route(&Method::GET, "/Users/42/").unwrap();
//! assert_eq!(matched.name(), Some("getUser"));
//! assert_eq!(matched.param("id"), Some("42"));
//! ```

use crate::endpoint::Endpoint;
use http::Method;
use indexmap::IndexMap;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::fmt;
use std::sync::Arc;

/// A shared endpoint.
pub type SharedEndpoint = Arc<dyn Endpoint>;

/// A matched route with extracted path parameters.
#[derive(Clone)]
pub struct RouteMatch {
    endpoint: SharedEndpoint,
    name: Option<String>,
    params: IndexMap<String, String>,
}

impl RouteMatch {
    /// The matched endpoint.
    #[must_use]
    pub fn endpoint(&self) -> &SharedEndpoint {
        &self.endpoint
    }

    /// The route name, if the route was registered with one.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Extracted path parameters in template order.
    #[must_use]
    pub fn params(&self) -> &IndexMap<String, String> {
        &self.params
    }

    /// Returns a specific path parameter by name.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Splits the match into its parts.
    #[must_use]
    pub fn into_parts(self) -> (SharedEndpoint, Option<String>, IndexMap<String, String>) {
        (self.endpoint, self.name, self.params)
    }
}

impl fmt::Debug for RouteMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteMatch")
            .field("name", &self.name)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// Public description of a registered route.
///
/// Serializes as `{ "methods": "HEAD,GET", "path": "/x", "name": null }`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteInfo {
    /// Methods the route answers, in listing order.
    pub methods: Vec<Method>,
    /// Path template as registered.
    pub path: String,
    /// Route name, if any.
    pub name: Option<String>,
}

impl RouteInfo {
    /// Comma-joined method list.
    #[must_use]
    pub fn methods_joined(&self) -> String {
        self.methods
            .iter()
            .map(Method::as_str)
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl Serialize for RouteInfo {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("RouteInfo", 3)?;
        state.serialize_field("methods", &self.methods_joined())?;
        state.serialize_field("path", &self.path)?;
        state.serialize_field("name", &self.name)?;
        state.end()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PathSegment {
    Literal(String),
    Param(String),
}

struct Route {
    methods: Vec<Method>,
    pattern: String,
    segments: Vec<PathSegment>,
    name: Option<String>,
    endpoint: SharedEndpoint,
}

impl Route {
    fn new(
        name: Option<String>,
        method: Method,
        pattern: &str,
        endpoint: SharedEndpoint,
    ) -> Self {
        // GET routes answer HEAD as well
        let methods = if method == Method::GET {
            vec![Method::HEAD, Method::GET]
        } else {
            vec![method]
        };
        Self {
            methods,
            pattern: pattern.to_string(),
            segments: Self::parse_segments(pattern),
            name,
            endpoint,
        }
    }

    fn parse_segments(pattern: &str) -> Vec<PathSegment> {
        pattern
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| match s.strip_prefix(':') {
                Some(name) if !name.is_empty() => PathSegment::Param(name.to_string()),
                _ => PathSegment::Literal(s.to_string()),
            })
            .collect()
    }

    fn match_path(&self, path: &str) -> Option<IndexMap<String, String>> {
        let path_segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        if path_segments.len() != self.segments.len() {
            return None;
        }

        let mut params = IndexMap::new();
        for (pattern, actual) in self.segments.iter().zip(path_segments) {
            match pattern {
                PathSegment::Literal(expected) => {
                    if !expected.eq_ignore_ascii_case(actual) {
                        return None;
                    }
                }
                PathSegment::Param(name) => {
                    params.insert(name.clone(), actual.to_string());
                }
            }
        }
        Some(params)
    }

    fn info(&self) -> RouteInfo {
        RouteInfo {
            methods: self.methods.clone(),
            path: self.pattern.clone(),
            name: self.name.clone(),
        }
    }
}

/// HTTP request router.
#[derive(Default)]
pub struct Router {
    routes: Vec<Route>,
    fallback: Option<SharedEndpoint>,
}

impl Router {
    /// Creates an empty router.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an unnamed route.
    pub fn route<E: Endpoint>(&mut self, method: Method, path: &str, endpoint: E) -> &mut Self {
        self.routes
            .push(Route::new(None, method, path, Arc::new(endpoint)));
        self
    }

    /// Registers a named route.
    ///
    /// The name becomes the request context's route name and shows up in
    /// logs and the route listing.
    pub fn named_route<E: Endpoint>(
        &mut self,
        name: impl Into<String>,
        method: Method,
        path: &str,
        endpoint: E,
    ) -> &mut Self {
        self.routes.push(Route::new(
            Some(name.into()),
            method,
            path,
            Arc::new(endpoint),
        ));
        self
    }

    /// Sets the endpoint for requests no route matches.
    pub fn fallback<E: Endpoint>(&mut self, endpoint: E) -> &mut Self {
        self.fallback = Some(Arc::new(endpoint));
        self
    }

    /// Returns the fallback endpoint, if set.
    #[must_use]
    pub fn fallback_endpoint(&self) -> Option<&SharedEndpoint> {
        self.fallback.as_ref()
    }

    /// Finds the first route matching the method and path.
    #[must_use]
    pub fn match_route(&self, method: &Method, path: &str) -> Option<RouteMatch> {
        self.routes
            .iter()
            .filter(|route| route.methods.contains(method))
            .find_map(|route| {
                route.match_path(path).map(|params| RouteMatch {
                    endpoint: Arc::clone(&route.endpoint),
                    name: route.name.clone(),
                    params,
                })
            })
    }

    /// Methods of every route whose template matches the path.
    #[must_use]
    pub fn allowed_methods(&self, path: &str) -> Vec<Method> {
        let mut methods: Vec<Method> = Vec::new();
        for route in &self.routes {
            if route.match_path(path).is_some() {
                for method in &route.methods {
                    if !methods.contains(method) {
                        methods.push(method.clone());
                    }
                }
            }
        }
        methods
    }

    /// Describes every registered route in registration order.
    #[must_use]
    pub fn route_infos(&self) -> Vec<RouteInfo> {
        self.routes.iter().map(Route::info).collect()
    }

    /// Returns the number of registered routes.
    #[must_use]
    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    /// Checks if a route with the given name exists.
    #[must_use]
    pub fn has_route(&self, name: &str) -> bool {
        self.routes
            .iter()
            .any(|route| route.name.as_deref() == Some(name))
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("routes", &self.route_infos())
            .field("fallback", &self.fallback.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::{endpoint_fn, HandlerResult, RouteRequest};
    use essentials_core::{RequestContext, ServiceResult};
    use http::StatusCode;

    fn tagged(tag: &'static str) -> impl Endpoint {
        endpoint_fn(move |_req: RouteRequest, _ctx: RequestContext| async move {
            ServiceResult::Ok(HandlerResult::text(StatusCode::OK, tag))
        })
    }

    async fn call(router: &Router, method: &Method, path: &str) -> Option<HandlerResult> {
        let matched = router.match_route(method, path)?;
        let result = matched
            .endpoint()
            .call(RouteRequest::new(method.clone(), path), RequestContext::mock())
            .await
            .unwrap();
        Some(result)
    }

    #[test]
    fn test_parse_segments() {
        assert_eq!(
            Route::parse_segments("/postTest/:id"),
            vec![
                PathSegment::Literal("postTest".to_string()),
                PathSegment::Param("id".to_string()),
            ]
        );
        assert!(Route::parse_segments("/").is_empty());
        assert_eq!(
            Route::parse_segments("/a/:"),
            vec![
                PathSegment::Literal("a".to_string()),
                PathSegment::Literal(":".to_string()),
            ]
        );
    }

    #[test]
    fn test_match_with_params() {
        let mut router = Router::new();
        router.named_route("getUser", Method::GET, "/users/:id", tagged("user"));

        let matched = router.match_route(&Method::GET, "/users/abc").unwrap();
        assert_eq!(matched.name(), Some("getUser"));
        assert_eq!(matched.param("id"), Some("abc"));

        assert!(router.match_route(&Method::GET, "/users").is_none());
        assert!(router.match_route(&Method::GET, "/users/abc/def").is_none());
        assert!(router.match_route(&Method::POST, "/users/abc").is_none());
    }

    #[test]
    fn test_literals_case_insensitive_and_trailing_slash() {
        let mut router = Router::new();
        router.route(Method::GET, "/getTest", tagged("t"));

        assert!(router.match_route(&Method::GET, "/gettest").is_some());
        assert!(router.match_route(&Method::GET, "/GETTEST/").is_some());
    }

    #[test]
    fn test_root_path() {
        let mut router = Router::new();
        router.named_route("health", Method::GET, "/", tagged("root"));

        assert!(router.match_route(&Method::GET, "/").is_some());
        assert!(router.match_route(&Method::GET, "").is_some());
        assert!(router.match_route(&Method::GET, "/ok").is_none());
    }

    #[test]
    fn test_get_answers_head() {
        let mut router = Router::new();
        router.route(Method::GET, "/ok", tagged("ok"));
        router.route(Method::POST, "/items", tagged("items"));

        assert!(router.match_route(&Method::HEAD, "/ok").is_some());
        assert!(router.match_route(&Method::HEAD, "/items").is_none());
    }

    #[tokio::test]
    async fn test_first_match_wins() {
        let mut router = Router::new();
        router.route(Method::GET, "/users/me", tagged("me"));
        router.route(Method::GET, "/users/:id", tagged("by-id"));

        let me = call(&router, &Method::GET, "/users/me").await.unwrap();
        assert_eq!(me.body, crate::endpoint::ResultBody::Text("me".to_string()));

        let other = call(&router, &Method::GET, "/users/7").await.unwrap();
        assert_eq!(
            other.body,
            crate::endpoint::ResultBody::Text("by-id".to_string())
        );
    }

    #[test]
    fn test_allowed_methods() {
        let mut router = Router::new();
        router.route(Method::GET, "/users", tagged("list"));
        router.route(Method::POST, "/users", tagged("create"));

        assert_eq!(
            router.allowed_methods("/users"),
            vec![Method::HEAD, Method::GET, Method::POST]
        );
        assert!(router.allowed_methods("/nope").is_empty());
    }

    #[test]
    fn test_route_infos_serialize() {
        let mut router = Router::new();
        router.named_route("health", Method::GET, "/", tagged("h"));
        router.route(Method::GET, "/ok", tagged("ok"));
        router.named_route("postTest", Method::POST, "/postTest/:id", tagged("p"));

        let value = serde_json::to_value(router.route_infos()).unwrap();
        assert_eq!(
            value,
            serde_json::json!([
                {"methods": "HEAD,GET", "path": "/", "name": "health"},
                {"methods": "HEAD,GET", "path": "/ok", "name": null},
                {"methods": "POST", "path": "/postTest/:id", "name": "postTest"},
            ])
        );
        assert_eq!(router.route_count(), 3);
        assert!(router.has_route("postTest"));
        assert!(!router.has_route("getTest"));
    }

    #[test]
    fn test_fallback() {
        let mut router = Router::new();
        assert!(router.fallback_endpoint().is_none());
        router.fallback(tagged("lost"));
        assert!(router.fallback_endpoint().is_some());
    }
}
