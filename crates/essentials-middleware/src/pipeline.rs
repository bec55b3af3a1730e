//! Ordered middleware pipeline.
//!
//! A [`Pipeline`] is built once at startup and shared by every request. The
//! standard order is:
//!
//! 1. **recover** - turn handler panics into `500 Internal server error`
//! 2. **request_id** - assign the request id, echo it in `x-request-id`
//! 3. **logging** - one structured line per completed request
//! 4. **cors** - optional, answers preflights and decorates responses
//! 5. **body_parser** - JSON and form bodies into [`ParsedBody`]
//!
//! [`ParsedBody`]: crate::stages::ParsedBody

use crate::context::MiddlewareContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::stages::{
    BodyParserMiddleware, CorsMiddleware, LoggingMiddleware, RecoverMiddleware,
    RequestIdMiddleware,
};
use crate::types::{Request, Response};
use std::fmt;
use std::sync::Arc;

/// A type-erased middleware that can be stored in a vector.
pub type BoxedMiddleware = Arc<dyn Middleware>;

/// An immutable, ordered chain of middleware.
///
/// # Example
///
/// ```ignore
/// use essentials_middleware::pipeline::Pipeline;
///
/// let pipeline = Pipeline::standard(None);
/// let response = pipeline
///     .process(MiddlewareContext::new(), request, |_ctx, _req| {
///         Box::pin(async { Response::text(StatusCode::OK, "ok") })
///     })
///     .await;
/// ```
#[derive(Clone)]
pub struct Pipeline {
    stages: Vec<BoxedMiddleware>,
}

impl Pipeline {
    /// Creates a new pipeline builder.
    #[must_use]
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// Creates the standard pipeline, with CORS when a policy is given.
    #[must_use]
    pub fn standard(cors: Option<CorsMiddleware>) -> Self {
        let mut builder = Self::builder()
            .stage(RecoverMiddleware::new())
            .stage(RequestIdMiddleware::new())
            .stage(LoggingMiddleware::new());
        if let Some(cors) = cors {
            builder = builder.stage(cors);
        }
        builder.stage(BodyParserMiddleware::new()).build()
    }

    /// Processes a request through every stage, then the handler.
    pub async fn process<H>(&self, mut ctx: MiddlewareContext, request: Request, handler: H) -> Response
    where
        H: FnOnce(&mut MiddlewareContext, Request) -> BoxFuture<'static, Response> + Send + 'static,
    {
        self.process_with(&mut ctx, request, handler).await
    }

    /// Like [`process`](Self::process), but leaves the context with the caller.
    pub async fn process_with<H>(
        &self,
        ctx: &mut MiddlewareContext,
        request: Request,
        handler: H,
    ) -> Response
    where
        H: FnOnce(&mut MiddlewareContext, Request) -> BoxFuture<'static, Response> + Send + 'static,
    {
        self.build_chain(handler).run(ctx, request).await
    }

    fn build_chain<'a, H>(&'a self, handler: H) -> Next<'a>
    where
        H: FnOnce(&mut MiddlewareContext, Request) -> BoxFuture<'static, Response> + Send + 'a,
    {
        let mut next = Next::handler(handler);
        for middleware in self.stages.iter().rev() {
            next = Next::new(middleware.as_ref(), next);
        }
        next
    }

    /// Returns the names of all stages in order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|mw| mw.name()).collect()
    }

    /// Returns the number of stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::standard(None)
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stage_names())
            .finish()
    }
}

/// Builder for constructing a [`Pipeline`].
#[derive(Default)]
pub struct PipelineBuilder {
    stages: Vec<BoxedMiddleware>,
}

impl PipelineBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a stage.
    #[must_use]
    pub fn stage<M: Middleware>(mut self, middleware: M) -> Self {
        self.stages.push(Arc::new(middleware));
        self
    }

    /// Appends an already shared stage.
    #[must_use]
    pub fn shared_stage(mut self, middleware: BoxedMiddleware) -> Self {
        self.stages.push(middleware);
        self
    }

    /// Builds the pipeline.
    #[must_use]
    pub fn build(self) -> Pipeline {
        Pipeline {
            stages: self.stages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ResponseExt;
    use bytes::Bytes;
    use http::{Request as HttpRequest, StatusCode};
    use http_body_util::Full;

    struct Tag(&'static str);

    impl Middleware for Tag {
        fn name(&self) -> &'static str {
            self.0
        }

        fn process<'a>(
            &'a self,
            ctx: &'a mut MiddlewareContext,
            request: Request,
            next: Next<'a>,
        ) -> BoxFuture<'a, Response> {
            Box::pin(async move {
                let mut response = next.run(ctx, request).await;
                // Appended on the way out, so the outermost stage lands last.
                let trail = response
                    .headers()
                    .get("x-trail")
                    .and_then(|v| v.to_str().ok())
                    .map(|v| format!("{v},{}", self.0))
                    .unwrap_or_else(|| self.0.to_string());
                response
                    .headers_mut()
                    .insert("x-trail", trail.parse().unwrap());
                response
            })
        }
    }

    fn request() -> Request {
        HttpRequest::builder()
            .uri("/test")
            .body(Full::new(Bytes::new()))
            .unwrap()
    }

    #[test]
    fn test_standard_stage_order() {
        let pipeline = Pipeline::standard(None);
        assert_eq!(
            pipeline.stage_names(),
            vec!["recover", "request_id", "logging", "body_parser"]
        );
    }

    #[test]
    fn test_standard_with_cors() {
        let pipeline = Pipeline::standard(Some(CorsMiddleware::permissive()));
        assert_eq!(pipeline.stage_count(), 5);
        assert_eq!(pipeline.stage_names()[3], "cors");
    }

    #[tokio::test]
    async fn test_stages_wrap_in_order() {
        let pipeline = Pipeline::builder().stage(Tag("outer")).stage(Tag("inner")).build();

        let response = pipeline
            .process(MiddlewareContext::new(), request(), |_ctx, _req| {
                Box::pin(async { Response::text(StatusCode::OK, "ok") })
            })
            .await;

        assert_eq!(response.headers().get("x-trail").unwrap(), "inner,outer");
    }

    #[tokio::test]
    async fn test_empty_pipeline_runs_handler() {
        let pipeline = Pipeline::builder().build();
        let response = pipeline
            .process(MiddlewareContext::new(), request(), |_ctx, _req| {
                Box::pin(async { Response::empty(StatusCode::ACCEPTED) })
            })
            .await;
        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }

    #[test]
    fn test_debug_lists_stage_names() {
        let pipeline = Pipeline::builder().stage(Tag("only")).build();
        assert_eq!(format!("{pipeline:?}"), r#"Pipeline { stages: ["only"] }"#);
    }
}
