//! Request body parsing.
//!
//! Bodies with a JSON or `application/x-www-form-urlencoded` content type are
//! parsed into a [`serde_json::Value`] and stored in the context as
//! [`ParsedBody`]. The raw bytes stay on the request.
//!
//! | Content type | Result |
//! |---|---|
//! | `application/json`, `*+json` | the JSON document |
//! | `application/x-www-form-urlencoded` | an object; repeated keys become arrays |
//! | anything else, or an empty body | no [`ParsedBody`] |
//!
//! Malformed bodies are rejected with `400 Bad Request`, bodies above the
//! limit (1 MiB by default) with `413 Payload Too Large`.

use crate::context::MiddlewareContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{Request, Response, ResponseExt};
use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::StatusCode;
use http_body_util::{BodyExt, Full};
use serde_json::{Map, Value};

/// Default maximum body size accepted by the parser.
pub const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

/// The parsed request body.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedBody(pub Value);

impl ParsedBody {
    /// Returns the parsed value.
    #[must_use]
    pub fn value(&self) -> &Value {
        &self.0
    }

    /// Consumes the wrapper.
    #[must_use]
    pub fn into_value(self) -> Value {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyFormat {
    Json,
    Form,
}

impl BodyFormat {
    fn detect(content_type: &str) -> Option<Self> {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        if essence == "application/json" || essence.ends_with("+json") {
            Some(Self::Json)
        } else if essence == "application/x-www-form-urlencoded" {
            Some(Self::Form)
        } else {
            None
        }
    }
}

/// Middleware that parses JSON and form bodies.
#[derive(Debug, Clone, Copy)]
pub struct BodyParserMiddleware {
    limit: usize,
}

impl Default for BodyParserMiddleware {
    fn default() -> Self {
        Self {
            limit: DEFAULT_BODY_LIMIT,
        }
    }
}

impl BodyParserMiddleware {
    /// Creates a parser with the default 1 MiB limit.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum accepted body size in bytes.
    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Returns the body size limit.
    #[must_use]
    pub fn limit(&self) -> usize {
        self.limit
    }
}

/// Parses `a=1&b=2&b=3` into `{"a":"1","b":["2","3"]}`.
fn parse_form(bytes: &[u8]) -> Result<Value, serde_urlencoded::de::Error> {
    let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(bytes)?;
    let mut object = Map::new();
    for (key, value) in pairs {
        match object.get_mut(&key) {
            Some(Value::Array(values)) => values.push(Value::String(value)),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, Value::String(value)]);
            }
            None => {
                object.insert(key, Value::String(value));
            }
        }
    }
    Ok(Value::Object(object))
}

impl Middleware for BodyParserMiddleware {
    fn name(&self) -> &'static str {
        "body_parser"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let format = request
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .and_then(BodyFormat::detect);
            let Some(format) = format else {
                return next.run(ctx, request).await;
            };

            let (parts, body) = request.into_parts();
            let bytes: Bytes = match body.collect().await {
                Ok(collected) => collected.to_bytes(),
                Err(never) => match never {},
            };

            if bytes.len() > self.limit {
                tracing::debug!(
                    request_id = %ctx.request_id(),
                    size = bytes.len(),
                    limit = self.limit,
                    "Request body too large"
                );
                return Response::text(StatusCode::PAYLOAD_TOO_LARGE, "Payload Too Large");
            }

            if !bytes.is_empty() {
                let parsed = match format {
                    BodyFormat::Json => serde_json::from_slice::<Value>(&bytes)
                        .map_err(|e| format!("Invalid JSON body: {e}")),
                    BodyFormat::Form => {
                        parse_form(&bytes).map_err(|e| format!("Invalid form body: {e}"))
                    }
                };
                match parsed {
                    Ok(value) => ctx.set_extension(ParsedBody(value)),
                    Err(message) => {
                        tracing::debug!(
                            request_id = %ctx.request_id(),
                            error = %message,
                            "Rejected request body"
                        );
                        return Response::text(StatusCode::BAD_REQUEST, message);
                    }
                }
            }

            next.run(ctx, Request::from_parts(parts, Full::new(bytes)))
                .await
        })
    }
}
