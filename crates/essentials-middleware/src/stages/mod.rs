//! Standard middleware stages.
//!
//! | Stage | Purpose |
//! |---|---|
//! | [`recover`] | Panics become `500 Internal server error` |
//! | [`request_id`] | UUID v7 request id, echoed in `x-request-id` |
//! | [`logging`] | One structured log line per request |
//! | [`cors`] | Preflight answers and CORS response headers |
//! | [`body_parser`] | JSON and form bodies into [`ParsedBody`] |

pub mod body_parser;
pub mod cors;
pub mod logging;
pub mod recover;
pub mod request_id;

pub use body_parser::{BodyParserMiddleware, ParsedBody, DEFAULT_BODY_LIMIT};
pub use cors::{AllowedOrigins, CorsBuilder, CorsMiddleware};
pub use logging::{LoggingMiddleware, RequestLog};
pub use recover::RecoverMiddleware;
pub use request_id::{RequestIdMiddleware, REQUEST_ID_HEADER};
