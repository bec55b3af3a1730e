//! Adapted routes served through the full pipeline.

use bytes::Bytes;
use essentials_core::RequestContext;
use essentials_server::adapter::{adapt, RawEnvelope, Shapes};
use essentials_server::shape::{FieldShape, Shape};
use essentials_server::{HandlerResult, Router, Server, ServerEssentials};
use http::{Method, StatusCode};
use http_body_util::{BodyExt, Full};
use serde_json::{json, Value};

const ID: &str = "0191a0e6-2b4c-7d1e-8f00-0123456789ab";

fn shapes() -> Shapes {
    Shapes::new()
        .query(
            Shape::new()
                .field("search", FieldShape::string())
                .field("page", FieldShape::integer())
                .field("active", FieldShape::boolean()),
        )
        .params(Shape::new().field("id", FieldShape::string().uuid()))
        .body(
            Shape::new()
                .field("name", FieldShape::string())
                .field("age", FieldShape::number().min(34.0)),
        )
}

async fn echo(request: RawEnvelope, _ctx: RequestContext) -> essentials_core::ServiceResult<HandlerResult> {
    HandlerResult::ok(&json!({
        "query": request.query,
        "params": request.params,
        "method": request.method,
        "path": request.path,
        "body": request.body,
    }))
}

fn server() -> Server {
    let mut router = Router::new();
    router.named_route("getTest", Method::GET, "/test/:id", adapt(echo, shapes()));
    router.named_route("postTest", Method::POST, "/test/:id", adapt(echo, shapes()));
    Server::builder(ServerEssentials::new("test-service", "0.0.1"))
        .router(router)
        .build()
}

async fn send(method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = http::Request::builder().method(method).uri(uri);
    let bytes = match body {
        Some(body) => {
            builder = builder.header("content-type", "application/json");
            Bytes::from(body.to_string())
        }
        None => Bytes::new(),
    };
    let response = server()
        .handle(builder.body(Full::new(bytes)).unwrap())
        .await;
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

#[tokio::test]
async fn test_valid_query() {
    let (status, body) = send(
        Method::GET,
        &format!("/test/{ID}?search=valid&page=1&active=true"),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["query"], json!({"search": "valid", "page": 1, "active": true}));
    assert_eq!(body["method"], "GET");
    assert_eq!(body["body"], Value::Null);
}

#[tokio::test]
async fn test_invalid_number_in_query() {
    let (status, body) = send(
        Method::GET,
        &format!("/test/{ID}?search=valid&page=invalid-number&active=true"),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "INVALID_QUERY_PARAMS");
    assert_eq!(body["details"][0]["path"], json!(["page"]));
}

#[tokio::test]
async fn test_invalid_boolean_in_query() {
    let (status, body) = send(
        Method::GET,
        &format!("/test/{ID}?search=valid&page=1&active=not-a-boolean"),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "INVALID_QUERY_PARAMS");
}

#[tokio::test]
async fn test_invalid_uuid_param() {
    let (status, body) = send(
        Method::GET,
        "/test/invalid-uuid?search=valid&page=1&active=true",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "INVALID_ROUTE_PARAMS");
    assert_eq!(body["details"][0]["message"], "Invalid uuid");
}

#[tokio::test]
async fn test_invalid_body() {
    let (status, body) = send(
        Method::POST,
        &format!("/test/{ID}?search=valid&page=1&active=true"),
        Some(json!({"name": "John", "age": 25})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "INVALID_REQUEST_BODY");
    assert_eq!(body["details"][0]["path"], json!(["age"]));
    assert_eq!(body["details"][0]["minimum"], json!(34.0));
}

#[tokio::test]
async fn test_valid_body() {
    let (status, body) = send(
        Method::POST,
        &format!("/test/{ID}?search=valid&page=1&active=true"),
        Some(json!({"name": "John", "age": 35})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["body"], json!({"name": "John", "age": 35}));
    assert_eq!(body["params"], json!({"id": ID}));
    assert_eq!(body["path"], format!("/test/{ID}"));
}

#[tokio::test]
async fn test_repeated_query_key_keeps_first_value() {
    let (status, body) = send(
        Method::GET,
        &format!("/test/{ID}?search=first&search=second&page=2&active=False"),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["query"], json!({"search": "first", "page": 2, "active": false}));
}
