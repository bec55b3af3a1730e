//! Middleware context types.
//!
//! The [`MiddlewareContext`] carries state through the middleware pipeline.
//! It is separate from [`RequestContext`] so stages can enrich it (request id,
//! locale, parsed body, matched route) before the handler sees the final,
//! immutable context.

use essentials_core::{Locale, RequestContext, RequestId};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::time::Instant;

/// Context that flows through the middleware pipeline.
///
/// # Example
///
/// ```
/// use essentials_core::Locale;
/// use essentials_middleware::context::MiddlewareContext;
///
/// let mut ctx = MiddlewareContext::new();
/// ctx.set_locale(Locale::De);
/// ctx.set_route_name("getUser");
///
/// let request_ctx = ctx.to_request_context();
/// assert_eq!(request_ctx.locale(), Locale::De);
/// assert_eq!(request_ctx.route_name(), Some("getUser"));
/// ```
#[derive(Debug)]
pub struct MiddlewareContext {
    /// Unique identifier for this request.
    request_id: RequestId,

    /// Language negotiated from `Accept-Language`.
    locale: Locale,

    /// Name of the matched route, set during dispatch.
    route_name: Option<String>,

    /// When the request started processing.
    started_at: Instant,

    /// Type-erased extension data.
    extensions: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl MiddlewareContext {
    /// Creates a new middleware context with a fresh request ID.
    #[must_use]
    pub fn new() -> Self {
        Self::with_request_id(RequestId::new())
    }

    /// Creates a context with a specific request ID.
    #[must_use]
    pub fn with_request_id(request_id: RequestId) -> Self {
        Self {
            request_id,
            locale: Locale::default(),
            route_name: None,
            started_at: Instant::now(),
            extensions: HashMap::new(),
        }
    }

    /// Returns the request ID.
    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Sets the request ID.
    ///
    /// This should only be called by the request id stage.
    pub fn set_request_id(&mut self, request_id: RequestId) {
        self.request_id = request_id;
    }

    /// Returns the negotiated locale.
    #[must_use]
    pub fn locale(&self) -> Locale {
        self.locale
    }

    /// Sets the negotiated locale.
    pub fn set_locale(&mut self, locale: Locale) {
        self.locale = locale;
    }

    /// Returns the matched route name, if any.
    #[must_use]
    pub fn route_name(&self) -> Option<&str> {
        self.route_name.as_deref()
    }

    /// Sets the matched route name.
    pub fn set_route_name(&mut self, name: impl Into<String>) {
        self.route_name = Some(name.into());
    }

    /// Returns when the request started processing.
    #[must_use]
    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    /// Returns the elapsed time since the request started.
    #[must_use]
    pub fn elapsed(&self) -> std::time::Duration {
        self.started_at.elapsed()
    }

    /// Stores a typed extension value.
    ///
    /// # Example
    ///
    /// ```
    /// use essentials_middleware::context::MiddlewareContext;
    ///
    /// struct Tenant(&'static str);
    ///
    /// let mut ctx = MiddlewareContext::new();
    /// ctx.set_extension(Tenant("acme"));
    ///
    /// assert_eq!(ctx.get_extension::<Tenant>().unwrap().0, "acme");
    /// ```
    pub fn set_extension<T: Send + Sync + 'static>(&mut self, value: T) {
        self.extensions.insert(TypeId::of::<T>(), Box::new(value));
    }

    /// Retrieves a typed extension value.
    #[must_use]
    pub fn get_extension<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.extensions
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref())
    }

    /// Removes and returns a typed extension value.
    pub fn remove_extension<T: Send + Sync + 'static>(&mut self) -> Option<T> {
        self.extensions
            .remove(&TypeId::of::<T>())
            .and_then(|v| v.downcast().ok())
            .map(|b| *b)
    }

    /// Checks if an extension of the given type exists.
    #[must_use]
    pub fn has_extension<T: Send + Sync + 'static>(&self) -> bool {
        self.extensions.contains_key(&TypeId::of::<T>())
    }

    /// Converts this middleware context to a [`RequestContext`].
    ///
    /// The service identity is not known here; the server adds it with
    /// [`RequestContext::with_service`].
    #[must_use]
    pub fn to_request_context(&self) -> RequestContext {
        let ctx = RequestContext::with_request_id(self.request_id).with_locale(self.locale);
        match &self.route_name {
            Some(name) => ctx.with_route_name(name.clone()),
            None => ctx,
        }
    }
}

impl Default for MiddlewareContext {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for MiddlewareContext {
    fn clone(&self) -> Self {
        // Extensions are type-erased and not cloneable.
        Self {
            request_id: self.request_id,
            locale: self.locale,
            route_name: self.route_name.clone(),
            started_at: self.started_at,
            extensions: HashMap::new(),
        }
    }
}
