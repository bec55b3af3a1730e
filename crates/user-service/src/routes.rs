//! HTTP routes for the user operations.

use crate::store::{NewUser, User, UserRepository};
use essentials_core::{AppError, HealthRegistry, RequestContext, ServiceError};
use essentials_server::adapter::{adapt, RequestEnvelope, Shapes};
use essentials_server::shape::{FieldShape, Shape};
use essentials_server::{mount_root_route, HandlerResult, RootRouteOptions, Router};
use http::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// Name reported on the root route and in every request context.
pub const SERVICE_NAME: &str = "user-service";

/// Route parameters of `getUser`.
#[derive(Debug, Deserialize)]
pub struct UserIdParams {
    /// Requested user id.
    pub id: String,
}

/// Response of `createUser`.
#[derive(Debug, Serialize)]
pub struct CreateUserResponse {
    /// Assigned id.
    pub id: String,
}

/// Response of `listUsers`.
#[derive(Debug, Serialize)]
pub struct ListUsersResponse {
    /// All users.
    pub users: Vec<User>,
}

fn new_user_shape() -> Shape {
    Shape::new()
        .field("firstName", FieldShape::string())
        .field("lastName", FieldShape::string())
        .field("email", FieldShape::string())
        .field("photoUrl", FieldShape::string())
        .field("password", FieldShape::string())
}

/// Builds the service router: the three user operations plus the root route.
pub fn service_router(store: Arc<dyn UserRepository>, health: HealthRegistry) -> Router {
    let mut router = Router::new();

    mount_root_route(
        &mut router,
        RootRouteOptions::new(SERVICE_NAME, crate::VERSION).health(health),
    );

    let create_store = Arc::clone(&store);
    router.named_route(
        "createUser",
        Method::POST,
        "/users",
        adapt(
            move |request: RequestEnvelope<Value, Value, NewUser>, _ctx: RequestContext| {
                let store = Arc::clone(&create_store);
                async move {
                    let Some(user) = request.body else {
                        return Err(ServiceError::internal("createUser without a body"));
                    };
                    let created = store.create_user(user).await;
                    tracing::info!(user_id = %created.id, "User created");
                    HandlerResult::json(StatusCode::CREATED, &CreateUserResponse { id: created.id })
                }
            },
            Shapes::new().body(new_user_shape()),
        ),
    );

    let get_store = Arc::clone(&store);
    router.named_route(
        "getUser",
        Method::GET,
        "/users/:id",
        adapt(
            move |request: RequestEnvelope<Value, UserIdParams, Value>, _ctx: RequestContext| {
                let store = Arc::clone(&get_store);
                async move {
                    let user = store.get_user(&request.params.id).await;
                    match user {
                        Some(user) => HandlerResult::ok(&user),
                        None => Err(AppError::resource_not_found("User")
                            .with_context("id", request.params.id)
                            .into()),
                    }
                }
            },
            Shapes::new().params(Shape::new().field("id", FieldShape::string())),
        ),
    );

    router.named_route(
        "listUsers",
        Method::GET,
        "/users",
        adapt(
            move |_request: RequestEnvelope<Value, Value, Value>, _ctx: RequestContext| {
                let store = Arc::clone(&store);
                async move {
                    let users = store.list_users().await;
                    HandlerResult::ok(&ListUsersResponse { users })
                }
            },
            Shapes::new(),
        ),
    );

    router
}
