//! Request context types.
//!
//! The [`RequestContext`] is created once per request by the server and passed
//! explicitly to every handler. It carries the request id, the identity of the
//! running service, the negotiated locale and the matched route name.

use crate::locale::Locale;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

/// A unique identifier for each request, using UUID v7.
///
/// UUID v7 is time-ordered, which makes it ideal for request tracking
/// and log correlation.
///
/// # Example
///
/// ```
/// use essentials_core::RequestId;
///
/// let id = RequestId::new();
/// println!("Request ID: {}", id);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Creates a new unique request ID using UUID v7.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Creates a `RequestId` from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Parses a request ID from its textual form (e.g. an `x-request-id` header).
    ///
    /// Returns `None` if the value is not a UUID.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        Uuid::parse_str(value.trim()).ok().map(Self)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for RequestId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<RequestId> for Uuid {
    fn from(id: RequestId) -> Self {
        id.0
    }
}

/// Per-request context handed to handlers and error callbacks.
///
/// # Example
///
/// ```
/// use essentials_core::{Locale, RequestContext};
///
/// let ctx = RequestContext::new()
///     .with_service("test-app", "1.0.0")
///     .with_locale(Locale::De);
///
/// assert_eq!(ctx.service_name(), "test-app");
/// assert_eq!(ctx.locale(), Locale::De);
/// ```
#[derive(Debug, Clone)]
pub struct RequestContext {
    request_id: RequestId,
    service_name: Arc<str>,
    service_version: Arc<str>,
    locale: Locale,
    /// Name of the matched route, if the route was registered with one.
    route_name: Option<String>,
    started_at: Instant,
}

impl RequestContext {
    /// Creates a new request context with a fresh request ID.
    #[must_use]
    pub fn new() -> Self {
        Self::with_request_id(RequestId::new())
    }

    /// Creates a new request context with the specified request ID.
    #[must_use]
    pub fn with_request_id(request_id: RequestId) -> Self {
        Self {
            request_id,
            service_name: Arc::from(""),
            service_version: Arc::from(""),
            locale: Locale::default(),
            route_name: None,
            started_at: Instant::now(),
        }
    }

    /// Creates a context for tests, identifying the service as `test-service 0.0.0`.
    #[must_use]
    pub fn mock() -> Self {
        Self::new().with_service("test-service", "0.0.0")
    }

    /// Returns the request ID.
    #[must_use]
    pub const fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Returns a new context identifying the running service.
    #[must_use]
    pub fn with_service(mut self, name: impl Into<Arc<str>>, version: impl Into<Arc<str>>) -> Self {
        self.service_name = name.into();
        self.service_version = version.into();
        self
    }

    /// Returns the service name.
    #[must_use]
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Returns the service version.
    #[must_use]
    pub fn service_version(&self) -> &str {
        &self.service_version
    }

    /// Returns the negotiated locale.
    #[must_use]
    pub const fn locale(&self) -> Locale {
        self.locale
    }

    /// Returns a new context with the specified locale.
    #[must_use]
    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
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

    /// Returns a new context with the specified route name.
    #[must_use]
    pub fn with_route_name(mut self, name: impl Into<String>) -> Self {
        self.route_name = Some(name.into());
        self
    }

    /// Returns the elapsed time since the request started.
    #[must_use]
    pub fn elapsed(&self) -> std::time::Duration {
        self.started_at.elapsed()
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_id_new_generates_unique_ids() {
        let id1 = RequestId::new();
        let id2 = RequestId::new();
        assert_ne!(id1, id2, "Each RequestId should be unique");
    }

    #[test]
    fn test_request_id_is_v7() {
        let id = RequestId::new();
        assert_eq!(id.as_uuid().get_version_num(), 7);
        assert_eq!(id.to_string().len(), 36);
    }

    #[test]
    fn test_request_id_parse() {
        let id = RequestId::new();
        assert_eq!(RequestId::parse(&id.to_string()), Some(id));
        assert_eq!(RequestId::parse("not-a-uuid"), None);
    }

    #[test]
    fn test_request_id_serialization() {
        let id = RequestId::new();
        let json = serde_json::to_string(&id).expect("serialization should work");
        let parsed: RequestId = serde_json::from_str(&json).expect("deserialization should work");
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_request_context_defaults() {
        let ctx = RequestContext::new();
        assert_eq!(ctx.service_name(), "");
        assert_eq!(ctx.locale(), Locale::En);
        assert!(ctx.route_name().is_none());
    }

    #[test]
    fn test_request_context_builder_pattern() {
        let mut ctx = RequestContext::mock().with_locale(Locale::De);
        ctx.set_route_name("getUser");

        assert_eq!(ctx.service_name(), "test-service");
        assert_eq!(ctx.service_version(), "0.0.0");
        assert_eq!(ctx.locale(), Locale::De);
        assert_eq!(ctx.route_name(), Some("getUser"));
    }

    #[test]
    fn test_request_context_elapsed() {
        let ctx = RequestContext::new();
        std::thread::sleep(std::time::Duration::from_millis(10));
        assert!(ctx.elapsed() >= std::time::Duration::from_millis(10));
    }
}
