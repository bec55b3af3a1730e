//! The test controller: echoes what the adapter handed it.

use essentials_core::{AppError, RequestContext, ServiceResult};
use essentials_server::adapter::{RequestEnvelope, Shapes};
use essentials_server::shape::{FieldShape, Shape};
use essentials_server::HandlerResult;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Query accepted by the controller.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TestQuery {
    /// Search term. `"error"` makes the controller fail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

/// Envelope the controller receives.
pub type TestEnvelope = RequestEnvelope<TestQuery, Value, Value>;

/// `{ search?: string }`.
#[must_use]
pub fn query_shape() -> Shape {
    Shape::new().field("search", FieldShape::string().optional())
}

/// `{ id: string }`.
#[must_use]
pub fn params_shape() -> Shape {
    Shape::new().field("id", FieldShape::string())
}

/// `{ name: string, age: number >= 0 }`.
#[must_use]
pub fn body_shape() -> Shape {
    Shape::new()
        .field("name", FieldShape::string())
        .field("age", FieldShape::number().min(0.0))
}

/// All three shapes.
#[must_use]
pub fn full_shapes() -> Shapes {
    Shapes::new()
        .query(query_shape())
        .params(params_shape())
        .body(body_shape())
}

/// Echoes the request, or fails with `RESOURCE_NOT_FOUND` when asked to.
pub async fn test_controller(request: TestEnvelope, ctx: RequestContext) -> ServiceResult<HandlerResult> {
    tracing::info!(route = ctx.route_name().unwrap_or_default(), "TestController called");

    if request.query.search.as_deref() == Some("error") {
        return Err(AppError::resource_not_found("Test").into());
    }

    Ok(HandlerResult::json_value(
        http::StatusCode::OK,
        json!({
            "query": request.query,
            "params": request.params,
            "method": request.method,
            "path": request.path,
            "body": request.body,
            "locale": ctx.locale().as_str(),
            "version": ctx.service_version(),
            "service": ctx.service_name(),
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use essentials_server::adapter::HttpMethod;
    use http::HeaderMap;

    fn envelope(search: Option<&str>) -> TestEnvelope {
        RequestEnvelope {
            query: TestQuery {
                search: search.map(str::to_string),
            },
            params: json!({"id": "7"}),
            path: "/postTest/7".to_string(),
            headers: HeaderMap::new(),
            method: HttpMethod::Post,
            body: Some(json!({"name": "Ada", "age": 36})),
        }
    }

    #[tokio::test]
    async fn test_echoes_request() {
        let ctx = RequestContext::mock().with_service("test-app", "1.0.0");
        let result = test_controller(envelope(Some("books")), ctx).await.unwrap();

        assert_eq!(result.status, http::StatusCode::OK);
        let essentials_server::ResultBody::Json(body) = result.body else {
            panic!("expected a JSON body");
        };
        assert_eq!(body["query"]["search"], "books");
        assert_eq!(body["method"], "POST");
        assert_eq!(body["locale"], "en");
        assert_eq!(body["service"], "test-app");
        assert_eq!(body["version"], "1.0.0");
    }

    #[tokio::test]
    async fn test_search_error_fails() {
        let err = test_controller(envelope(Some("error")), RequestContext::mock())
            .await
            .unwrap_err();
        assert_eq!(err.tag(), "app");
        assert_eq!(err.status_code(), http::StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_body_shape_rejects_negative_age() {
        let issues = body_shape()
            .validate(&json!({"name": "Ada", "age": -1}), essentials_server::shape::Coercion::None)
            .unwrap_err();
        assert_eq!(issues.len(), 1);
    }
}
