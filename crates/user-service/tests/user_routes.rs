//! The user operations served through the full pipeline.

use bytes::Bytes;
use essentials_core::{connect_plugins, Plugin};
use essentials_server::{Server, ServerEssentials};
use http::{Method, StatusCode};
use http_body_util::{BodyExt, Full};
use serde_json::{json, Value};
use std::sync::Arc;
use user_service::{service_router, LocalUserStore, UserStorePlugin, SERVICE_NAME, VERSION};

async fn server() -> Server {
    let plugins: Vec<Arc<dyn Plugin>> = vec![Arc::new(UserStorePlugin::new())];
    let health = connect_plugins(&plugins).await.unwrap();
    Server::builder(ServerEssentials::new(SERVICE_NAME, VERSION))
        .router(service_router(Arc::new(LocalUserStore::new()), health))
        .build()
}

async fn send(server: &Server, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = http::Request::builder().method(method).uri(uri);
    let bytes = match body {
        Some(body) => {
            builder = builder.header("content-type", "application/json");
            Bytes::from(body.to_string())
        }
        None => Bytes::new(),
    };
    let response = server.handle(builder.body(Full::new(bytes)).unwrap()).await;
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

#[tokio::test]
async fn test_get_seed_user() {
    let server = server().await;
    let (status, body) = send(&server, Method::GET, "/users/1", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["firstName"], "John");
    assert_eq!(body["lastName"], "Doe");
    assert!(body.get("password").is_none());
}

#[tokio::test]
async fn test_get_unknown_user() {
    let server = server().await;
    let (status, body) = send(&server, Method::GET, "/users/42", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "RESOURCE_NOT_FOUND");
    assert_eq!(body["message"], "User not found");
}

#[tokio::test]
async fn test_create_then_list() {
    let server = server().await;
    let (status, body) = send(
        &server,
        Method::POST,
        "/users",
        Some(json!({
            "firstName": "Jane",
            "lastName": "Doe",
            "email": "jane.doe.example.com",
            "photoUrl": "https://example.com/jane-doe.jpg",
            "password": "password"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, json!({"id": "2"}));

    let (status, body) = send(&server, Method::GET, "/users", None).await;
    assert_eq!(status, StatusCode::OK);
    let users = body["users"].as_array().unwrap();
    assert_eq!(users.len(), 2);
    assert_eq!(users[1]["firstName"], "Jane");
}

#[tokio::test]
async fn test_create_rejects_incomplete_user() {
    let server = server().await;
    let (status, body) = send(
        &server,
        Method::POST,
        "/users",
        Some(json!({"firstName": "Jane"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "INVALID_REQUEST_BODY");
    assert_eq!(body["details"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn test_root_route_reports_store() {
    let server = server().await;
    let (status, body) = send(&server, Method::GET, "/", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["service"]["name"], "user-service");
    assert_eq!(body["checks"]["userStore"]["connected"], true);
}
