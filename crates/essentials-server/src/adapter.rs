//! Request adapter.
//!
//! [`adapt`] turns a typed handler into an [`Endpoint`]. At request time the
//! adapter validates the query, the route params and (for POST and PUT) the
//! body against the declared [`Shapes`], converts each part into the
//! handler's types, and calls the handler exactly once. Any failure
//! short-circuits with a [`RequestValidationError`] tagged with the failing
//! part; rendering it is left to the server's error callback.
//!
//! # Example
//!
//! ```rust
//! use essentials_server::adapter::{adapt, RequestEnvelope, Shapes};
//! use essentials_server::shape::{FieldShape, Shape};
//! use essentials_server::{HandlerResult, Router};
//! use essentials_core::RequestContext;
//! use http::Method;
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct Params {
//!     id: String,
//! }
//!
//! async fn get_user(
//!     request: RequestEnvelope<serde_json::Value, Params, serde_json::Value>,
//!     _ctx: RequestContext,
//! ) -> essentials_core::ServiceResult<HandlerResult> {
//!     HandlerResult::ok(&serde_json::json!({ "id": request.params.id }))
//! }
//!
//! let mut router = Router::new();
//! router.named_route(
//!     "getUser",
//!     Method::GET,
//!     "/users/:id",
//!     adapt(get_user, Shapes::new().params(Shape::new().field("id", FieldShape::string()))),
//! );
//! ```

use crate::endpoint::{Endpoint, HandlerResult, RouteRequest};
use crate::shape::{Coercion, Shape};
use essentials_core::{
    BoxFuture, Issue, RequestContext, RequestValidationError, ServiceError, ServiceResult,
    ValidationErrorKind,
};
use http::{HeaderMap, Method};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::future::Future;
use std::marker::PhantomData;

/// Declared shapes of a route's request parts. A missing shape means the
/// part is passed through unvalidated.
#[derive(Debug, Clone, Default)]
pub struct Shapes {
    query: Option<Shape>,
    params: Option<Shape>,
    body: Option<Shape>,
}

impl Shapes {
    /// No shapes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the query shape.
    #[must_use]
    pub fn query(mut self, shape: Shape) -> Self {
        self.query = Some(shape);
        self
    }

    /// Sets the route params shape.
    #[must_use]
    pub fn params(mut self, shape: Shape) -> Self {
        self.params = Some(shape);
        self
    }

    /// Sets the body shape.
    #[must_use]
    pub fn body(mut self, shape: Shape) -> Self {
        self.body = Some(shape);
        self
    }
}

/// Methods an adapted handler can see.
///
/// `HEAD` requests reach GET routes and are presented as [`HttpMethod::Get`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// GET (and HEAD).
    Get,
    /// POST.
    Post,
    /// PUT.
    Put,
    /// DELETE.
    Delete,
}

impl HttpMethod {
    /// Maps an HTTP method, if supported.
    #[must_use]
    pub fn from_method(method: &Method) -> Option<Self> {
        match *method {
            Method::GET | Method::HEAD => Some(Self::Get),
            Method::POST => Some(Self::Post),
            Method::PUT => Some(Self::Put),
            Method::DELETE => Some(Self::Delete),
            _ => None,
        }
    }

    /// Returns the method name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }

    /// Whether the request body is validated and handed to the handler.
    #[must_use]
    pub const fn carries_body(&self) -> bool {
        matches!(self, Self::Post | Self::Put)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validated request handed to an adapted handler.
#[derive(Debug, Clone)]
pub struct RequestEnvelope<Q, P, B> {
    /// Query values.
    pub query: Q,
    /// Route params.
    pub params: P,
    /// Request path.
    pub path: String,
    /// Request headers.
    pub headers: HeaderMap,
    /// Request method.
    pub method: HttpMethod,
    /// Body; `Some` only for POST and PUT.
    pub body: Option<B>,
}

/// An envelope without typed parts.
pub type RawEnvelope = RequestEnvelope<Value, Value, Value>;

/// Endpoint produced by [`adapt`].
pub struct Adapter<Q, P, B, H> {
    handler: H,
    shapes: Shapes,
    _parts: PhantomData<fn() -> (Q, P, B)>,
}

impl<Q, P, B, H> fmt::Debug for Adapter<Q, P, B, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Adapter")
            .field("shapes", &self.shapes)
            .finish_non_exhaustive()
    }
}

/// Wraps a handler with request validation.
pub fn adapt<Q, P, B, H, Fut>(handler: H, shapes: Shapes) -> Adapter<Q, P, B, H>
where
    Q: DeserializeOwned + Send + 'static,
    P: DeserializeOwned + Send + 'static,
    B: DeserializeOwned + Send + 'static,
    H: Fn(RequestEnvelope<Q, P, B>, RequestContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ServiceResult<HandlerResult>> + Send + 'static,
{
    Adapter {
        handler,
        shapes,
        _parts: PhantomData,
    }
}

impl<Q, P, B, H> Adapter<Q, P, B, H>
where
    Q: DeserializeOwned,
    P: DeserializeOwned,
    B: DeserializeOwned,
{
    fn envelope(&self, request: RouteRequest) -> ServiceResult<RequestEnvelope<Q, P, B>> {
        let method = HttpMethod::from_method(request.method()).ok_or_else(|| {
            ServiceError::internal(format!(
                "Method {} is not supported by adapted handlers",
                request.method()
            ))
        })?;

        let query = parse_query(request.query(), self.shapes.query.as_ref())
            .map_err(|issue| invalid(ValidationErrorKind::InvalidQueryParams, vec![issue]))?;
        let query = check(
            ValidationErrorKind::InvalidQueryParams,
            self.shapes.query.as_ref(),
            query,
            Coercion::FromStrings,
        )?;

        let params = Value::Object(
            request
                .params()
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect::<Map<_, _>>(),
        );
        let params = check(
            ValidationErrorKind::InvalidRouteParams,
            self.shapes.params.as_ref(),
            params,
            Coercion::FromStrings,
        )?;

        let body = if method.carries_body() {
            // An absent or unparsed body is validated as an empty object.
            let raw = request
                .body()
                .cloned()
                .unwrap_or_else(|| Value::Object(Map::new()));
            Some(check(
                ValidationErrorKind::InvalidRequestBody,
                self.shapes.body.as_ref(),
                raw,
                Coercion::None,
            )?)
        } else {
            None
        };

        Ok(RequestEnvelope {
            query: convert(ValidationErrorKind::InvalidQueryParams, query)?,
            params: convert(ValidationErrorKind::InvalidRouteParams, params)?,
            path: request.path().to_string(),
            headers: request.headers().clone(),
            method,
            body: body
                .map(|b| convert(ValidationErrorKind::InvalidRequestBody, b))
                .transpose()?,
        })
    }
}

impl<Q, P, B, H, Fut> Endpoint for Adapter<Q, P, B, H>
where
    Q: DeserializeOwned + Send + 'static,
    P: DeserializeOwned + Send + 'static,
    B: DeserializeOwned + Send + 'static,
    H: Fn(RequestEnvelope<Q, P, B>, RequestContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ServiceResult<HandlerResult>> + Send + 'static,
{
    fn call<'a>(
        &'a self,
        request: RouteRequest,
        ctx: RequestContext,
    ) -> BoxFuture<'a, ServiceResult<HandlerResult>> {
        match self.envelope(request) {
            Ok(envelope) => Box::pin((self.handler)(envelope, ctx)),
            Err(err) => {
                tracing::debug!(
                    route = ctx.route_name().unwrap_or_default(),
                    error = %err,
                    "Request rejected"
                );
                Box::pin(std::future::ready(Err(err)))
            }
        }
    }
}

fn invalid(kind: ValidationErrorKind, details: Vec<Issue>) -> ServiceError {
    RequestValidationError::new(kind, details).into()
}

fn check(
    kind: ValidationErrorKind,
    shape: Option<&Shape>,
    input: Value,
    coercion: Coercion,
) -> ServiceResult<Value> {
    match shape {
        Some(shape) => shape
            .validate(&input, coercion)
            .map_err(|issues| invalid(kind, issues)),
        None => Ok(input),
    }
}

fn convert<T: DeserializeOwned>(kind: ValidationErrorKind, value: Value) -> ServiceResult<T> {
    serde_json::from_value(value).map_err(|e| invalid(kind, vec![Issue::custom(Vec::new(), e.to_string())]))
}

/// Parses a raw query string into an object. Repeated keys keep their first
/// value unless the shape declares the key as an array.
fn parse_query(raw: Option<&str>, shape: Option<&Shape>) -> Result<Value, Issue> {
    let pairs: Vec<(String, String)> = match raw {
        Some(raw) => serde_urlencoded::from_str(raw)
            .map_err(|e| Issue::custom(Vec::new(), format!("Malformed query string: {e}")))?,
        None => Vec::new(),
    };

    let mut map = Map::new();
    for (key, value) in pairs {
        let is_array = shape.is_some_and(|s| s.is_array(&key));
        match map.get_mut(&key) {
            None if is_array => {
                map.insert(key, Value::Array(vec![Value::String(value)]));
            }
            None => {
                map.insert(key, Value::String(value));
            }
            Some(Value::Array(values)) if is_array => values.push(Value::String(value)),
            Some(_) => {}
        }
    }
    Ok(Value::Object(map))
}
