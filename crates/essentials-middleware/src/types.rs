//! Common types used throughout the middleware pipeline.
//!
//! Requests and responses are fully buffered: the server collects the body
//! before the pipeline runs, so every stage can inspect it freely.

use bytes::Bytes;
use http::header::{HeaderValue, CONTENT_TYPE};
use http::StatusCode;
use http_body_util::Full;

/// The HTTP request type used in the middleware pipeline.
pub type Request = http::Request<Full<Bytes>>;

/// The HTTP response type used in the middleware pipeline.
pub type Response = http::Response<Full<Bytes>>;

/// Content type of plain text responses.
pub const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

/// Content type of JSON responses.
pub const APPLICATION_JSON: &str = "application/json; charset=utf-8";

/// Shorthand constructors for pipeline responses.
pub trait ResponseExt {
    /// Creates a plain text response.
    fn text(status: StatusCode, message: impl Into<String>) -> Response;

    /// Creates a JSON response from an already built value.
    fn json(status: StatusCode, body: &serde_json::Value) -> Response;

    /// Creates a response without a body.
    fn empty(status: StatusCode) -> Response;
}

impl ResponseExt for Response {
    fn text(status: StatusCode, message: impl Into<String>) -> Response {
        with_body(status, TEXT_PLAIN, Bytes::from(message.into()))
    }

    fn json(status: StatusCode, body: &serde_json::Value) -> Response {
        with_body(status, APPLICATION_JSON, Bytes::from(body.to_string()))
    }

    fn empty(status: StatusCode) -> Response {
        let mut response = Response::new(Full::new(Bytes::new()));
        *response.status_mut() = status;
        response
    }
}

fn with_body(status: StatusCode, content_type: &'static str, body: Bytes) -> Response {
    let mut response = Response::new(Full::new(body));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_response() {
        let response = Response::text(StatusCode::NOT_FOUND, "Not Found");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers().get(CONTENT_TYPE).unwrap(), TEXT_PLAIN);
    }

    #[test]
    fn test_json_response() {
        let response = Response::json(StatusCode::OK, &serde_json::json!({"id": "1"}));
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            APPLICATION_JSON
        );
    }

    #[test]
    fn test_empty_response() {
        let response = Response::empty(StatusCode::NO_CONTENT);
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(response.headers().get(CONTENT_TYPE).is_none());
    }
}
