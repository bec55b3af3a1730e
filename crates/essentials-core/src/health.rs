//! Health checks and the health registry.
//!
//! A [`HealthCheck`] is a zero-argument function, synchronous or asynchronous,
//! reporting a [`HealthStatus`]. Checks are collected into an immutable
//! [`HealthRegistry`] at startup; the request path only reads it.

use futures_util::future::{try_join_all, BoxFuture};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;

/// Connection state of a dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    /// Connected and usable.
    Connected,
    /// Not connected.
    Disconnected,
    /// Failed.
    Error,
    /// Connection in progress.
    Connecting,
    /// Disconnection in progress.
    Disconnecting,
    /// Re-establishing a lost connection.
    Reconnecting,
    /// State not known.
    Unknown,
}

/// Result of one health check. Both fields are optional on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    /// Whether the dependency is connected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connected: Option<bool>,
    /// Detailed connection state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ConnectionStatus>,
}

impl HealthStatus {
    /// `{ connected: true, status: "connected" }`.
    #[must_use]
    pub const fn connected() -> Self {
        Self {
            connected: Some(true),
            status: Some(ConnectionStatus::Connected),
        }
    }

    /// `{ connected: false, status: "disconnected" }`.
    #[must_use]
    pub const fn disconnected() -> Self {
        Self {
            connected: Some(false),
            status: Some(ConnectionStatus::Disconnected),
        }
    }

    /// A status with only the `status` field set.
    #[must_use]
    pub const fn with_status(status: ConnectionStatus) -> Self {
        Self {
            connected: None,
            status: Some(status),
        }
    }
}

/// Errors raised while running health checks.
#[derive(Debug, Error)]
pub enum HealthCheckError {
    /// The check itself reported a failure.
    #[error("{message}")]
    Failed {
        /// Failure description.
        message: String,
    },

    /// A named registry check failed.
    #[error("health check '{name}' failed: {source}")]
    Check {
        /// Registered check name.
        name: String,
        /// The underlying failure.
        #[source]
        source: Box<HealthCheckError>,
    },
}

impl HealthCheckError {
    /// Creates a failure with a message.
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }
}

/// Future returned by asynchronous health checks.
pub type HealthFuture = BoxFuture<'static, Result<HealthStatus, HealthCheckError>>;

type SyncCheck = dyn Fn() -> Result<HealthStatus, HealthCheckError> + Send + Sync;
type AsyncCheck = dyn Fn() -> HealthFuture + Send + Sync;

/// A health check function.
///
/// # Example
///
/// ```
/// use essentials_core::{HealthCheck, HealthStatus};
///
/// let sync = HealthCheck::sync(|| Ok(HealthStatus::connected()));
/// let not_sync = HealthCheck::from_async(|| async { Ok(HealthStatus::disconnected()) });
///
/// assert!(!sync.is_async());
/// assert!(not_sync.is_async());
/// ```
#[derive(Clone)]
pub enum HealthCheck {
    /// Returns its status directly.
    Sync(Arc<SyncCheck>),
    /// Returns its status through a future.
    Async(Arc<AsyncCheck>),
}

impl HealthCheck {
    /// Wraps a synchronous check.
    pub fn sync<F>(check: F) -> Self
    where
        F: Fn() -> Result<HealthStatus, HealthCheckError> + Send + Sync + 'static,
    {
        Self::Sync(Arc::new(check))
    }

    /// Wraps an asynchronous check.
    pub fn from_async<F, Fut>(check: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<HealthStatus, HealthCheckError>> + Send + 'static,
    {
        Self::Async(Arc::new(move || Box::pin(check())))
    }

    /// A check that always reports `status`.
    #[must_use]
    pub fn constant(status: HealthStatus) -> Self {
        Self::sync(move || Ok(status))
    }

    /// Returns `true` for asynchronous checks.
    #[must_use]
    pub const fn is_async(&self) -> bool {
        matches!(self, Self::Async(_))
    }

    /// Runs the check.
    pub async fn run(&self) -> Result<HealthStatus, HealthCheckError> {
        match self {
            Self::Sync(check) => check(),
            Self::Async(check) => check().await,
        }
    }
}

impl std::fmt::Debug for HealthCheck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(if self.is_async() {
            "HealthCheck::Async"
        } else {
            "HealthCheck::Sync"
        })
    }
}

/// Immutable, ordered set of named health checks.
#[derive(Debug, Clone, Default)]
pub struct HealthRegistry {
    checks: Arc<IndexMap<String, HealthCheck>>,
}

impl HealthRegistry {
    /// Creates a builder.
    #[must_use]
    pub fn builder() -> HealthRegistryBuilder {
        HealthRegistryBuilder::default()
    }

    /// Returns a builder pre-filled with this registry's checks.
    #[must_use]
    pub fn to_builder(&self) -> HealthRegistryBuilder {
        HealthRegistryBuilder {
            checks: (*self.checks).clone(),
        }
    }

    /// Returns the number of checks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.checks.len()
    }

    /// Returns `true` if no checks are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    /// Returns the check registered under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&HealthCheck> {
        self.checks.get(name)
    }

    /// Returns the registered names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.checks.keys().map(String::as_str)
    }

    /// Runs every check concurrently.
    ///
    /// Results keep registration order. The first failing check fails the
    /// whole run.
    pub async fn check_all(&self) -> Result<IndexMap<String, HealthStatus>, HealthCheckError> {
        let runs = self.checks.iter().map(|(name, check)| async move {
            check
                .run()
                .await
                .map(|status| (name.clone(), status))
                .map_err(|source| HealthCheckError::Check {
                    name: name.clone(),
                    source: Box::new(source),
                })
        });

        Ok(try_join_all(runs).await?.into_iter().collect())
    }
}

/// Builder for [`HealthRegistry`].
#[derive(Debug, Default)]
pub struct HealthRegistryBuilder {
    checks: IndexMap<String, HealthCheck>,
}

impl HealthRegistryBuilder {
    /// Registers a check. A later registration under the same name replaces
    /// the earlier one but keeps its position.
    #[must_use]
    pub fn check(mut self, name: impl Into<String>, check: HealthCheck) -> Self {
        self.checks.insert(name.into(), check);
        self
    }

    /// Returns `true` if a check is registered under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.checks.contains_key(name)
    }

    /// Freezes the registry.
    #[must_use]
    pub fn build(self) -> HealthRegistry {
        HealthRegistry {
            checks: Arc::new(self.checks),
        }
    }
}
