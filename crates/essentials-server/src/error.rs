//! Server error types.

use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while binding, serving or shutting down.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The configured address is not a socket address.
    #[error("Invalid address '{addr}': {reason}")]
    InvalidAddress {
        /// The configured address.
        addr: String,
        /// Parser message.
        reason: String,
    },

    /// Failed to bind to the configured address.
    #[error("Failed to bind to {addr}: {source}")]
    Bind {
        /// The address that could not be bound.
        addr: SocketAddr,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// I/O error during server operation.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// In-flight connections outlived the shutdown timeout.
    #[error("Shutdown timed out after {timeout:?} with {active} connection(s) still open")]
    ShutdownTimeout {
        /// The configured timeout.
        timeout: Duration,
        /// Connections still open when it expired.
        active: usize,
    },

    /// The `on_shutdown` hook failed.
    #[error("Error while shutting down: {reason}")]
    ShutdownHook {
        /// Hook error message.
        reason: String,
    },
}

impl ServerError {
    /// Creates an invalid address error.
    pub fn invalid_address(addr: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::InvalidAddress {
            addr: addr.into(),
            reason: reason.to_string(),
        }
    }

    /// Creates a shutdown hook error.
    pub fn shutdown_hook(reason: impl std::fmt::Display) -> Self {
        Self::ShutdownHook {
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ServerError::invalid_address("nope", "invalid socket address syntax");
        assert_eq!(
            err.to_string(),
            "Invalid address 'nope': invalid socket address syntax"
        );

        let err = ServerError::ShutdownTimeout {
            timeout: Duration::from_secs(5),
            active: 2,
        };
        assert_eq!(
            err.to_string(),
            "Shutdown timed out after 5s with 2 connection(s) still open"
        );

        let err = ServerError::shutdown_hook("db still busy");
        assert_eq!(err.to_string(), "Error while shutting down: db still busy");
    }
}
