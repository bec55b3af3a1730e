//! Coded application errors with localized messages.
//!
//! An [`AppError`] names a well-known failure by [`ErrorCode`], carries the
//! metadata its message template needs (e.g. `resource`), optional free-form
//! context for logs, and the source location it was raised at.

use crate::locale::Locale;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::panic::Location;

/// Well-known application error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// A resource does not exist.
    ResourceNotFound,
    /// A resource with the same identity exists.
    ResourceAlreadyExists,
    /// The caller is not authenticated.
    UserUnauthenticated,
    /// The caller may not perform the operation.
    UserUnauthorized,
}

impl ErrorCode {
    /// Returns the wire code, e.g. `RESOURCE_NOT_FOUND`.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ResourceNotFound => "RESOURCE_NOT_FOUND",
            Self::ResourceAlreadyExists => "RESOURCE_ALREADY_EXISTS",
            Self::UserUnauthenticated => "USER_UNAUTHENTICATED",
            Self::UserUnauthorized => "USER_UNAUTHORIZED",
        }
    }

    /// Returns the HTTP status code for this error code.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::ResourceNotFound => StatusCode::NOT_FOUND,
            Self::ResourceAlreadyExists => StatusCode::CONFLICT,
            Self::UserUnauthenticated => StatusCode::UNAUTHORIZED,
            Self::UserUnauthorized => StatusCode::FORBIDDEN,
        }
    }

    /// Returns the message template for a locale. `{key}` placeholders are
    /// filled from metadata.
    #[must_use]
    pub const fn template(&self, locale: Locale) -> &'static str {
        match (self, locale) {
            (Self::ResourceNotFound, Locale::En) => "{resource} not found",
            (Self::ResourceNotFound, Locale::De) => "{resource} nicht gefunden",
            (Self::ResourceAlreadyExists, Locale::En) => "{resource} already exists",
            (Self::ResourceAlreadyExists, Locale::De) => "{resource} existiert bereits",
            (Self::UserUnauthenticated, Locale::En) => "User unauthenticated",
            (Self::UserUnauthenticated, Locale::De) => "Benutzer nicht authentifiziert",
            (Self::UserUnauthorized, Locale::En) => "User unauthorized",
            (Self::UserUnauthorized, Locale::De) => "Benutzer nicht autorisiert",
        }
    }

    /// Returns the metadata keys the templates reference.
    #[must_use]
    pub const fn required_metadata(&self) -> &'static [&'static str] {
        match self {
            Self::ResourceNotFound | Self::ResourceAlreadyExists => &["resource"],
            Self::UserUnauthenticated | Self::UserUnauthorized => &[],
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A coded application error.
///
/// The call site is captured with `#[track_caller]` and reported as `where`
/// when the error is logged.
///
/// # Example
///
/// ```
/// use essentials_core::{AppError, ErrorCode, Locale};
///
/// let err = AppError::resource_not_found("Test").with_context("search", "error");
///
/// assert_eq!(err.code(), ErrorCode::ResourceNotFound);
/// assert_eq!(err.message(Locale::En), "Test not found");
/// assert_eq!(err.message(Locale::De), "Test nicht gefunden");
/// ```
#[derive(Debug, Clone)]
pub struct AppError {
    code: ErrorCode,
    metadata: BTreeMap<String, String>,
    context: Map<String, Value>,
    location: &'static Location<'static>,
}

impl AppError {
    /// Creates an error with the given code and no metadata.
    #[must_use]
    #[track_caller]
    pub fn new(code: ErrorCode) -> Self {
        Self {
            code,
            metadata: BTreeMap::new(),
            context: Map::new(),
            location: Location::caller(),
        }
    }

    /// `RESOURCE_NOT_FOUND` for the named resource.
    #[must_use]
    #[track_caller]
    pub fn resource_not_found(resource: impl Into<String>) -> Self {
        Self::new(ErrorCode::ResourceNotFound).with_metadata("resource", resource)
    }

    /// `RESOURCE_ALREADY_EXISTS` for the named resource.
    #[must_use]
    #[track_caller]
    pub fn resource_already_exists(resource: impl Into<String>) -> Self {
        Self::new(ErrorCode::ResourceAlreadyExists).with_metadata("resource", resource)
    }

    /// `USER_UNAUTHENTICATED`.
    #[must_use]
    #[track_caller]
    pub fn unauthenticated() -> Self {
        Self::new(ErrorCode::UserUnauthenticated)
    }

    /// `USER_UNAUTHORIZED`.
    #[must_use]
    #[track_caller]
    pub fn unauthorized() -> Self {
        Self::new(ErrorCode::UserUnauthorized)
    }

    /// Adds a metadata entry used by the message template.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Adds a context entry. Context is logged but never sent to clients.
    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Returns the error code.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        self.code
    }

    /// Returns the HTTP status code.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        self.code.status_code()
    }

    /// Returns the metadata.
    #[must_use]
    pub const fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }

    /// Returns the context.
    #[must_use]
    pub const fn context(&self) -> &Map<String, Value> {
        &self.context
    }

    /// Returns where the error was raised, as `file:line:column`.
    #[must_use]
    pub fn location(&self) -> String {
        format!(
            "{}:{}:{}",
            self.location.file(),
            self.location.line(),
            self.location.column()
        )
    }

    /// Returns the template keys with no metadata value.
    #[must_use]
    pub fn missing_metadata(&self) -> Vec<&'static str> {
        self.code
            .required_metadata()
            .iter()
            .copied()
            .filter(|key| !self.metadata.contains_key(*key))
            .collect()
    }

    /// Renders the message for a locale. Placeholders without metadata are
    /// left in place.
    #[must_use]
    pub fn message(&self, locale: Locale) -> String {
        let mut message = self.code.template(locale).to_string();
        for (key, value) in &self.metadata {
            message = message.replace(&format!("{{{key}}}"), value);
        }
        message
    }

    /// Returns the client-facing body `{ code, message, metadata }`.
    #[must_use]
    pub fn to_body(&self, locale: Locale) -> Value {
        serde_json::json!({
            "code": self.code,
            "message": self.message(locale),
            "metadata": self.metadata,
        })
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message(Locale::En))
    }
}

impl std::error::Error for AppError {}
