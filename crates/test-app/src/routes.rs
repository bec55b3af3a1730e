//! Route table.

use crate::controllers::test::{full_shapes, query_shape, test_controller};
use essentials_core::{HealthRegistry, RequestContext, ServiceResult};
use essentials_server::adapter::{adapt, Shapes};
use essentials_server::{
    endpoint_fn, mount_root_route, HandlerResult, RootRouteOptions, RouteRequest, Router,
};
use http::{Method, StatusCode};

/// Body of the fallback route.
pub const LOST: &str = "You're lost";

/// Builds the app router.
pub fn app_router(service_name: &str, service_version: &str, health: HealthRegistry) -> Router {
    let mut router = Router::new();

    mount_root_route(
        &mut router,
        RootRouteOptions::new(service_name, service_version)
            .show_routes(true)
            .health(health),
    );

    router
        .named_route("postTest", Method::POST, "/postTest/:id", adapt(test_controller, full_shapes()))
        .named_route(
            "getTest",
            Method::GET,
            "/getTest",
            adapt(test_controller, Shapes::new().query(query_shape())),
        )
        .fallback(endpoint_fn(|_req: RouteRequest, _ctx: RequestContext| async {
            ServiceResult::Ok(HandlerResult::text(StatusCode::OK, LOST))
        }));

    router
}
