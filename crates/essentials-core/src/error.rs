//! Error types shared by handlers, adapters and the error translator.
//!
//! [`ServiceError`] is a tagged union: callers match on the variant, never on
//! the concrete type of a boxed error.
//!
//! | Variant | Raised by | Default translation |
//! |---|---|---|
//! | `Validation` | request adapter | 400, serialized [`RequestValidationError`] |
//! | `App` | handlers | [`AppError::status_code`], `{code, message, metadata}` |
//! | `Internal` | anything else | 500, `Internal server error` |

use crate::app_error::AppError;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using [`ServiceError`].
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Every failure a request handler can produce.
///
/// # Example
///
/// ```
/// use essentials_core::{AppError, ServiceError};
///
/// fn lookup(id: &str) -> Result<(), ServiceError> {
///     if id.is_empty() {
///         return Err(AppError::resource_not_found("User").into());
///     }
///     Ok(())
/// }
///
/// assert!(matches!(lookup(""), Err(ServiceError::App(_))));
/// ```
#[derive(Debug, Error)]
pub enum ServiceError {
    /// A request part failed its declared shape.
    #[error(transparent)]
    Validation(#[from] RequestValidationError),

    /// A coded application error.
    #[error(transparent)]
    App(#[from] AppError),

    /// Any other failure. Details are logged, never sent to clients.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ServiceError {
    /// Creates an internal error from a message.
    pub fn internal(message: impl std::fmt::Display + std::fmt::Debug + Send + Sync + 'static) -> Self {
        Self::Internal(anyhow::Error::msg(message))
    }

    /// Returns the variant tag.
    #[must_use]
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::App(_) => "app",
            Self::Internal(_) => "internal",
        }
    }

    /// Returns the HTTP status code the default translator uses.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::App(err) => err.status_code(),
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Which request part failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationErrorKind {
    /// The query string.
    InvalidQueryParams,
    /// The path parameters.
    InvalidRouteParams,
    /// The request body.
    InvalidRequestBody,
}

impl ValidationErrorKind {
    /// Returns the wire tag, e.g. `INVALID_QUERY_PARAMS`.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidQueryParams => "INVALID_QUERY_PARAMS",
            Self::InvalidRouteParams => "INVALID_ROUTE_PARAMS",
            Self::InvalidRequestBody => "INVALID_REQUEST_BODY",
        }
    }
}

impl std::fmt::Display for ValidationErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request part failed its declared shape.
///
/// Serializes as `{ "status": "INVALID_…", "details": [...] }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
#[error("{}: {} issue(s)", .status, .details.len())]
pub struct RequestValidationError {
    /// The failing request part.
    pub status: ValidationErrorKind,
    /// Individual issues, in field order.
    pub details: Vec<Issue>,
}

impl RequestValidationError {
    /// Creates a validation error.
    #[must_use]
    pub fn new(status: ValidationErrorKind, details: Vec<Issue>) -> Self {
        Self { status, details }
    }
}

/// Machine-readable category of an [`Issue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCode {
    /// Missing value or wrong type.
    InvalidType,
    /// String format check failed (e.g. uuid).
    InvalidString,
    /// Below a lower bound.
    TooSmall,
    /// Above an upper bound.
    TooBig,
    /// Not one of the allowed values.
    InvalidEnumValue,
    /// Anything else, such as a typed conversion failure.
    Custom,
}

/// One step of an issue path: an object key or an array index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IssuePath {
    /// Array index.
    Index(usize),
    /// Object key.
    Key(String),
}

impl From<&str> for IssuePath {
    fn from(key: &str) -> Self {
        Self::Key(key.to_string())
    }
}

impl From<String> for IssuePath {
    fn from(key: String) -> Self {
        Self::Key(key)
    }
}

impl From<usize> for IssuePath {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

/// A single validation problem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    /// Issue category.
    pub code: IssueCode,
    /// Location of the offending value inside the request part.
    pub path: Vec<IssuePath>,
    /// Human-readable message.
    pub message: String,
    /// Expected type, when relevant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
    /// Received type, when relevant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub received: Option<String>,
    /// Violated lower bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    /// Violated upper bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
}

impl Issue {
    fn bare(code: IssueCode, path: Vec<IssuePath>, message: impl Into<String>) -> Self {
        Self {
            code,
            path,
            message: message.into(),
            expected: None,
            received: None,
            minimum: None,
            maximum: None,
        }
    }

    /// A required value is missing.
    #[must_use]
    pub fn required(path: Vec<IssuePath>, expected: &str) -> Self {
        Self {
            expected: Some(expected.to_string()),
            received: Some("undefined".to_string()),
            ..Self::bare(IssueCode::InvalidType, path, "Required")
        }
    }

    /// A value has the wrong type.
    #[must_use]
    pub fn invalid_type(path: Vec<IssuePath>, expected: &str, received: &str) -> Self {
        Self {
            expected: Some(expected.to_string()),
            received: Some(received.to_string()),
            ..Self::bare(
                IssueCode::InvalidType,
                path,
                format!("Expected {expected}, received {received}"),
            )
        }
    }

    /// A string is not a UUID.
    #[must_use]
    pub fn invalid_uuid(path: Vec<IssuePath>) -> Self {
        Self::bare(IssueCode::InvalidString, path, "Invalid uuid")
    }

    /// A number is below its minimum.
    #[must_use]
    pub fn number_too_small(path: Vec<IssuePath>, minimum: f64) -> Self {
        Self {
            minimum: Some(minimum),
            ..Self::bare(
                IssueCode::TooSmall,
                path,
                format!("Number must be greater than or equal to {minimum}"),
            )
        }
    }

    /// A number is above its maximum.
    #[must_use]
    pub fn number_too_big(path: Vec<IssuePath>, maximum: f64) -> Self {
        Self {
            maximum: Some(maximum),
            ..Self::bare(
                IssueCode::TooBig,
                path,
                format!("Number must be less than or equal to {maximum}"),
            )
        }
    }

    /// A string is shorter than allowed.
    #[must_use]
    pub fn string_too_short(path: Vec<IssuePath>, minimum: usize) -> Self {
        Self {
            minimum: Some(minimum as f64),
            ..Self::bare(
                IssueCode::TooSmall,
                path,
                format!("String must contain at least {minimum} character(s)"),
            )
        }
    }

    /// A string is longer than allowed.
    #[must_use]
    pub fn string_too_long(path: Vec<IssuePath>, maximum: usize) -> Self {
        Self {
            maximum: Some(maximum as f64),
            ..Self::bare(
                IssueCode::TooBig,
                path,
                format!("String must contain at most {maximum} character(s)"),
            )
        }
    }

    /// A value is not one of the allowed options.
    #[must_use]
    pub fn invalid_enum_value(path: Vec<IssuePath>, options: &[String], received: &str) -> Self {
        let expected = options
            .iter()
            .map(|o| format!("'{o}'"))
            .collect::<Vec<_>>()
            .join(" | ");
        Self {
            received: Some(received.to_string()),
            ..Self::bare(
                IssueCode::InvalidEnumValue,
                path,
                format!("Invalid enum value. Expected {expected}, received '{received}'"),
            )
        }
    }

    /// A free-form issue.
    #[must_use]
    pub fn custom(path: Vec<IssuePath>, message: impl Into<String>) -> Self {
        Self::bare(IssueCode::Custom, path, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorCode;

    fn path(key: &str) -> Vec<IssuePath> {
        vec![IssuePath::from(key)]
    }

    #[test]
    fn test_validation_error_serialization() {
        let err = RequestValidationError::new(
            ValidationErrorKind::InvalidQueryParams,
            vec![Issue::invalid_type(path("page"), "number", "string")],
        );

        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["status"], "INVALID_QUERY_PARAMS");
        assert_eq!(json["details"][0]["code"], "invalid_type");
        assert_eq!(json["details"][0]["path"][0], "page");
        assert_eq!(json["details"][0]["message"], "Expected number, received string");
        assert!(json["details"][0].get("minimum").is_none());
    }

    #[test]
    fn test_issue_messages() {
        assert_eq!(Issue::required(path("id"), "string").message, "Required");
        assert_eq!(Issue::invalid_uuid(path("id")).message, "Invalid uuid");
        assert_eq!(
            Issue::number_too_small(path("age"), 34.0).message,
            "Number must be greater than or equal to 34"
        );
        assert_eq!(
            Issue::string_too_short(path("name"), 2).message,
            "String must contain at least 2 character(s)"
        );
    }

    #[test]
    fn test_issue_path_index_serializes_as_number() {
        let issue = Issue::custom(vec![IssuePath::from("tags"), IssuePath::from(1)], "bad");
        let json = serde_json::to_value(&issue).unwrap();
        assert_eq!(json["path"], serde_json::json!(["tags", 1]));
    }

    #[test]
    fn test_service_error_tags_and_status() {
        let validation: ServiceError =
            RequestValidationError::new(ValidationErrorKind::InvalidRequestBody, vec![]).into();
        assert_eq!(validation.tag(), "validation");
        assert_eq!(validation.status_code(), StatusCode::BAD_REQUEST);

        let app: ServiceError = AppError::new(ErrorCode::UserUnauthorized).into();
        assert_eq!(app.tag(), "app");
        assert_eq!(app.status_code(), StatusCode::FORBIDDEN);

        let internal = ServiceError::internal("boom");
        assert_eq!(internal.tag(), "internal");
        assert_eq!(internal.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_question_mark_converts_anyhow() {
        fn fails() -> ServiceResult<()> {
            let err: anyhow::Error = anyhow::anyhow!("db down");
            Err(err)?
        }
        assert!(matches!(fails(), Err(ServiceError::Internal(_))));
    }

    #[test]
    fn test_validation_display() {
        let err = RequestValidationError::new(
            ValidationErrorKind::InvalidRouteParams,
            vec![Issue::invalid_uuid(path("id"))],
        );
        assert_eq!(err.to_string(), "INVALID_ROUTE_PARAMS: 1 issue(s)");
    }
}
