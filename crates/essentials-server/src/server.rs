//! HTTP server.
//!
//! A [`Server`] owns the router, the middleware pipeline and the
//! [`ServerEssentials`]. Every request runs through the pipeline and is then
//! dispatched to the first matching route, the fallback endpoint, or a
//! `404 Not Found`.
//!
//! # Example
//!
//! ```rust,ignore
//! use essentials_server::{mount_root_route, RootRouteOptions, Router, Server, ServerEssentials};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut router = Router::new();
//!     mount_root_route(&mut router, RootRouteOptions::new("user-service", "1.0.0"));
//!
//!     Server::builder(ServerEssentials::new("user-service", "1.0.0"))
//!         .router(router)
//!         .build()
//!         .run()
//!         .await?;
//!     Ok(())
//! }
//! ```

use crate::config::ServerConfig;
use crate::endpoint::RouteRequest;
use crate::error::ServerError;
use crate::essentials::{ErrorScope, ServerEssentials};
use crate::router::{RouteInfo, Router, SharedEndpoint};
use crate::shutdown::{
    ConnectionToken, ConnectionTracker, ShutdownHook, ShutdownSignal, CLOSING_IDLE_CONNECTIONS,
};
use bytes::Bytes;
use essentials_core::{BoxFuture, Locale};
use essentials_middleware::stages::{
    BodyParserMiddleware, CorsMiddleware, LoggingMiddleware, ParsedBody, RecoverMiddleware,
    RequestIdMiddleware,
};
use essentials_middleware::{MiddlewareContext, Pipeline, Request, Response, ResponseExt};
use http::header::{ACCEPT_LANGUAGE, ALLOW};
use http::{HeaderValue, Method, StatusCode};
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use indexmap::IndexMap;
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};

/// Body of responses for unmatched routes.
pub const NOT_FOUND: &str = "Not Found";

struct ServerInner {
    config: ServerConfig,
    essentials: ServerEssentials,
    pipeline: Pipeline,
    router: Router,
    routes: Arc<[RouteInfo]>,
}

/// The HTTP server.
pub struct Server {
    inner: Arc<ServerInner>,
    on_shutdown: Option<ShutdownHook>,
}

impl Server {
    /// Starts building a server for the given service identity.
    #[must_use]
    pub fn builder(essentials: ServerEssentials) -> ServerBuilder {
        ServerBuilder::new(essentials)
    }

    /// Returns the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Returns the service essentials.
    #[must_use]
    pub fn essentials(&self) -> &ServerEssentials {
        &self.inner.essentials
    }

    /// Every registered route.
    #[must_use]
    pub fn routes(&self) -> &[RouteInfo] {
        &self.inner.routes
    }

    /// Runs one fully buffered request through the pipeline and router.
    pub async fn handle(&self, request: Request) -> Response {
        Arc::clone(&self.inner).handle(request).await
    }

    /// Binds the configured address and serves until SIGINT or SIGTERM.
    pub async fn run(self) -> Result<(), ServerError> {
        let shutdown = ShutdownSignal::with_os_signals();
        self.run_with_shutdown(shutdown).await
    }

    /// Binds the configured address and serves until `shutdown` triggers.
    pub async fn run_with_shutdown(self, shutdown: ShutdownSignal) -> Result<(), ServerError> {
        let listener = self.bind().await?;
        self.serve(listener, shutdown).await
    }

    /// Binds the configured address.
    pub async fn bind(&self) -> Result<TcpListener, ServerError> {
        let addr = self.inner.config.socket_addr()?;
        TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })
    }

    /// Serves connections from `listener` until `shutdown` triggers, then
    /// shuts down gracefully.
    ///
    /// Fails if the shutdown hook fails or connections outlive the shutdown
    /// timeout.
    pub async fn serve(self, listener: TcpListener, shutdown: ShutdownSignal) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, routes = self.inner.routes.len(), "Server listening");

        let tracker = ConnectionTracker::new();
        loop {
            tokio::select! {
                result = listener.accept() => match result {
                    Ok((stream, remote_addr)) => {
                        let inner = Arc::clone(&self.inner);
                        let token = tracker.acquire();
                        tokio::spawn(serve_connection(inner, stream, remote_addr, shutdown.clone(), token));
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to accept connection");
                    }
                },
                () = shutdown.recv() => break,
            }
        }
        drop(listener);

        // Open connections watch the same signal and close once idle
        tracing::warn!(active = tracker.active_connections(), "{CLOSING_IDLE_CONNECTIONS}");

        if let Some(hook) = self.on_shutdown {
            if let Err(e) = hook().await {
                tracing::error!(error = %format!("{e:#}"), "Error while shutting down");
                return Err(ServerError::shutdown_hook(format!("{e:#}")));
            }
        }

        if let Err(e) = tracker.drain(self.inner.config.shutdown_timeout()).await {
            tracing::error!(error = %e, "Error while shutting down");
            return Err(e);
        }

        tracing::info!("Server stopped");
        Ok(())
    }
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("config", &self.inner.config)
            .field("essentials", &self.inner.essentials)
            .field("pipeline", &self.inner.pipeline)
            .field("routes", &self.inner.routes)
            .finish_non_exhaustive()
    }
}

async fn serve_connection(
    inner: Arc<ServerInner>,
    stream: TcpStream,
    remote_addr: SocketAddr,
    shutdown: ShutdownSignal,
    _token: ConnectionToken,
) {
    let keep_alive = inner.config.keep_alive();
    let service = service_fn(move |request: hyper::Request<Incoming>| {
        let inner = Arc::clone(&inner);
        async move { Ok::<_, Infallible>(inner.handle_incoming(request).await) }
    });

    let conn = http1::Builder::new()
        .keep_alive(keep_alive)
        .serve_connection(TokioIo::new(stream), service);
    tokio::pin!(conn);

    let mut closing = false;
    loop {
        tokio::select! {
            result = conn.as_mut() => {
                if let Err(e) = result {
                    tracing::debug!(remote = %remote_addr, error = %e, "Connection error");
                }
                break;
            }
            () = shutdown.recv(), if !closing => {
                closing = true;
                conn.as_mut().graceful_shutdown();
            }
        }
    }
}

impl ServerInner {
    async fn handle_incoming(self: Arc<Self>, request: hyper::Request<Incoming>) -> Response {
        let (parts, body) = request.into_parts();
        let bytes = match Limited::new(body, self.config.body_limit()).collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
                return Response::text(StatusCode::PAYLOAD_TOO_LARGE, "Payload Too Large");
            }
            Err(e) => {
                tracing::debug!(error = %e, "Failed to read request body");
                return Response::text(StatusCode::BAD_REQUEST, "Bad Request");
            }
        };
        self.handle(Request::from_parts(parts, Full::new(bytes))).await
    }

    async fn handle(self: Arc<Self>, request: Request) -> Response {
        let mut ctx = MiddlewareContext::new();
        if let Some(header) = request
            .headers()
            .get(ACCEPT_LANGUAGE)
            .and_then(|v| v.to_str().ok())
        {
            ctx.set_locale(Locale::from_accept_language(header));
        }

        let is_head = request.method() == Method::HEAD;
        let dispatcher = Arc::clone(&self);
        let mut response = self
            .pipeline
            .process(ctx, request, move |ctx, request| dispatcher.dispatch(ctx, request))
            .await;

        if is_head {
            *response.body_mut() = Full::new(Bytes::new());
        }
        response
    }

    fn dispatch(
        self: Arc<Self>,
        ctx: &mut MiddlewareContext,
        request: Request,
    ) -> BoxFuture<'static, Response> {
        let (parts, _) = request.into_parts();
        let method = parts.method;
        let path = parts.uri.path().to_string();

        let target: Option<(SharedEndpoint, IndexMap<String, String>)> =
            match self.router.match_route(&method, &path) {
                Some(matched) => {
                    let (endpoint, name, params) = matched.into_parts();
                    if let Some(name) = name {
                        ctx.set_route_name(name);
                    }
                    Some((endpoint, params))
                }
                None => self
                    .router
                    .fallback_endpoint()
                    .map(|endpoint| (Arc::clone(endpoint), IndexMap::new())),
            };

        let Some((endpoint, params)) = target else {
            return Box::pin(std::future::ready(self.unmatched(&method, &path)));
        };

        let body = ctx
            .remove_extension::<ParsedBody>()
            .map(ParsedBody::into_value);
        let mut route_request = RouteRequest::new(method.clone(), path.clone())
            .with_headers(parts.headers)
            .with_params(params)
            .with_body(body)
            .with_routes(Arc::clone(&self.routes));
        if let Some(query) = parts.uri.query() {
            route_request = route_request.with_query(query);
        }

        let request_ctx = self.essentials.request_context(ctx);
        let essentials = self.essentials.clone();
        Box::pin(async move {
            match endpoint.call(route_request, request_ctx.clone()).await {
                Ok(result) => result.into_response(),
                Err(error) => {
                    let scope = ErrorScope {
                        ctx: &request_ctx,
                        method: &method,
                        path: &path,
                    };
                    essentials.handle_error(error, &scope)
                }
            }
        })
    }

    /// 404, or 405/OPTIONS handling when the path exists for other methods.
    fn unmatched(&self, method: &Method, path: &str) -> Response {
        let allowed = self.router.allowed_methods(path);
        if allowed.is_empty() {
            return Response::text(StatusCode::NOT_FOUND, NOT_FOUND);
        }

        let allow = allowed
            .iter()
            .map(Method::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        let mut response = if *method == Method::OPTIONS {
            Response::empty(StatusCode::OK)
        } else {
            Response::text(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed")
        };
        if let Ok(value) = HeaderValue::from_str(&allow) {
            response.headers_mut().insert(ALLOW, value);
        }
        response
    }
}

/// Builder for [`Server`].
pub struct ServerBuilder {
    config: ServerConfig,
    essentials: ServerEssentials,
    router: Router,
    cors: Option<CorsMiddleware>,
    pipeline: Option<Pipeline>,
    on_shutdown: Option<ShutdownHook>,
}

impl ServerBuilder {
    /// Creates a builder with default configuration and an empty router.
    #[must_use]
    pub fn new(essentials: ServerEssentials) -> Self {
        Self {
            config: ServerConfig::default(),
            essentials,
            router: Router::new(),
            cors: None,
            pipeline: None,
            on_shutdown: None,
        }
    }

    /// Sets the server configuration.
    #[must_use]
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the router.
    #[must_use]
    pub fn router(mut self, router: Router) -> Self {
        self.router = router;
        self
    }

    /// Adds CORS handling to the standard pipeline.
    #[must_use]
    pub fn cors(mut self, cors: CorsMiddleware) -> Self {
        self.cors = Some(cors);
        self
    }

    /// Replaces the standard pipeline.
    #[must_use]
    pub fn pipeline(mut self, pipeline: Pipeline) -> Self {
        self.pipeline = Some(pipeline);
        self
    }

    /// Runs `hook` during graceful shutdown, after the listener closes and
    /// before waiting for open connections.
    #[must_use]
    pub fn on_shutdown<F, Fut>(mut self, hook: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.on_shutdown = Some(Box::new(move || Box::pin(hook())));
        self
    }

    fn standard_pipeline(config: &ServerConfig, cors: Option<CorsMiddleware>) -> Pipeline {
        let request_id = if config.trust_request_id() {
            RequestIdMiddleware::trust_incoming()
        } else {
            RequestIdMiddleware::new()
        };
        let mut builder = Pipeline::builder()
            .stage(RecoverMiddleware::new())
            .stage(request_id)
            .stage(LoggingMiddleware::new());
        if let Some(cors) = cors {
            builder = builder.stage(cors);
        }
        builder
            .stage(BodyParserMiddleware::new().with_limit(config.body_limit()))
            .build()
    }

    /// Builds the server. The route table is frozen at this point.
    #[must_use]
    pub fn build(self) -> Server {
        let pipeline = self
            .pipeline
            .unwrap_or_else(|| Self::standard_pipeline(&self.config, self.cors));
        let routes: Arc<[RouteInfo]> = Arc::from(self.router.route_infos());

        Server {
            inner: Arc::new(ServerInner {
                config: self.config,
                essentials: self.essentials,
                pipeline,
                router: self.router,
                routes,
            }),
            on_shutdown: self.on_shutdown,
        }
    }
}
