//! Root and liveness routes.
//!
//! [`mount_root_route`] registers two routes:
//!
//! - `GET /` (named `health`) - service identity, uptime, the result of every
//!   registered health check, any extra fields and optionally the route table
//! - `GET /ok` - plain text `ok`, independent of the checks
//!
//! Checks run concurrently on every request; nothing is cached.

use crate::endpoint::{endpoint_fn, HandlerResult, RouteRequest};
use crate::router::Router;
use chrono::NaiveTime;
use essentials_core::{HealthRegistry, RequestContext, ServiceError, ServiceResult};
use http::{Method, StatusCode};
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

/// Name of the root route.
pub const ROOT_ROUTE_NAME: &str = "health";

static PROCESS_START: OnceLock<Instant> = OnceLock::new();

/// Instant the process started serving, recorded on first call.
///
/// [`ServerEssentials::new`](crate::ServerEssentials::new) calls this, so
/// uptime counts from startup rather than from when a router is built.
pub fn process_started_at() -> Instant {
    *PROCESS_START.get_or_init(Instant::now)
}

/// Options for [`mount_root_route`].
#[derive(Debug, Clone)]
pub struct RootRouteOptions {
    service_name: String,
    service_version: String,
    show_routes: bool,
    health: HealthRegistry,
    extra: Map<String, Value>,
    started_at: Instant,
}

impl RootRouteOptions {
    /// Creates options for a service with no checks and no route listing.
    #[must_use]
    pub fn new(service_name: impl Into<String>, service_version: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            service_version: service_version.into(),
            show_routes: false,
            health: HealthRegistry::default(),
            extra: Map::new(),
            started_at: process_started_at(),
        }
    }

    /// Lists every registered route in the root response.
    #[must_use]
    pub fn show_routes(mut self, show: bool) -> Self {
        self.show_routes = show;
        self
    }

    /// Sets the health checks to run.
    #[must_use]
    pub fn health(mut self, registry: HealthRegistry) -> Self {
        self.health = registry;
        self
    }

    /// Measures uptime from `started_at` instead of the process start.
    #[must_use]
    pub fn started_at(mut self, started_at: Instant) -> Self {
        self.started_at = started_at;
        self
    }

    /// Adds a top-level field to the root response.
    #[must_use]
    pub fn extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

#[derive(Serialize)]
struct ServiceInfo<'a> {
    name: &'a str,
    version: &'a str,
    status: &'static str,
    uptime: String,
}

struct RootState {
    options: RootRouteOptions,
}

impl RootState {
    async fn render(&self, request: &RouteRequest) -> ServiceResult<Value> {
        let checks = self
            .options
            .health
            .check_all()
            .await
            .map_err(|e| ServiceError::Internal(anyhow::Error::new(e)))?;

        let service = ServiceInfo {
            name: &self.options.service_name,
            version: &self.options.service_version,
            status: "ok",
            uptime: format_uptime(self.options.started_at.elapsed()),
        };

        let mut body = Map::new();
        body.insert("service".to_string(), to_value(&service)?);
        body.insert("checks".to_string(), to_value(&checks)?);
        for (key, value) in &self.options.extra {
            body.insert(key.clone(), value.clone());
        }
        if self.options.show_routes {
            body.insert("routes".to_string(), to_value(request.routes())?);
        }
        Ok(Value::Object(body))
    }
}

fn to_value<T: Serialize + ?Sized>(value: &T) -> ServiceResult<Value> {
    serde_json::to_value(value).map_err(|e| ServiceError::Internal(e.into()))
}

/// Formats an uptime as `HH:MM:SS`. Hours wrap at 24.
#[must_use]
pub fn format_uptime(uptime: Duration) -> String {
    u32::try_from(uptime.as_secs() % 86_400)
        .ok()
        .and_then(|secs| NaiveTime::from_num_seconds_from_midnight_opt(secs, 0))
        .map(|time| time.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "00:00:00".to_string())
}

/// Registers `GET /` and `GET /ok` on the router.
///
/// Uptime is measured from [`process_started_at`] unless the options say
/// otherwise.
pub fn mount_root_route(router: &mut Router, options: RootRouteOptions) {
    let state = Arc::new(RootState { options });

    router.named_route(
        ROOT_ROUTE_NAME,
        Method::GET,
        "/",
        endpoint_fn(move |request: RouteRequest, _ctx: RequestContext| {
            let state = Arc::clone(&state);
            async move {
                let body = state.render(&request).await?;
                Ok(HandlerResult::json_value(StatusCode::OK, body))
            }
        }),
    );

    router.route(
        Method::GET,
        "/ok",
        endpoint_fn(|_request: RouteRequest, _ctx: RequestContext| async {
            ServiceResult::Ok(HandlerResult::text(StatusCode::OK, "ok"))
        }),
    );
}
