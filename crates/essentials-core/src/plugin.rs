//! Plugins: dependencies connected at startup that contribute health checks.
//!
//! Connecting is an explicit startup phase. [`connect_plugins`] awaits every
//! plugin and returns the resulting [`HealthRegistry`] as a value, so the
//! registry is complete before the server accepts its first request.

use crate::health::{HealthCheck, HealthRegistry};
use futures_util::future::{join_all, try_join_all, BoxFuture};
use std::sync::Arc;
use thiserror::Error;

/// Errors raised by plugins.
#[derive(Debug, Error)]
pub enum PluginError {
    /// The plugin failed to connect.
    #[error("plugin '{name}' failed to connect: {reason}")]
    Connect {
        /// Plugin name.
        name: String,
        /// Failure description.
        reason: String,
    },

    /// The plugin failed to disconnect.
    #[error("plugin '{name}' failed to disconnect: {reason}")]
    Disconnect {
        /// Plugin name.
        name: String,
        /// Failure description.
        reason: String,
    },

    /// Two plugins reported the same name.
    #[error("duplicate plugin name '{name}'")]
    Duplicate {
        /// The repeated name.
        name: String,
    },
}

impl PluginError {
    /// Creates a connect failure.
    #[must_use]
    pub fn connect(name: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Connect {
            name: name.into(),
            reason: reason.to_string(),
        }
    }

    /// Creates a disconnect failure.
    #[must_use]
    pub fn disconnect(name: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Disconnect {
            name: name.into(),
            reason: reason.to_string(),
        }
    }
}

/// What a connected plugin hands back.
#[derive(Debug, Clone)]
pub struct PluginConnection {
    /// Name the health check is registered under.
    pub name: String,
    /// The plugin's health check.
    pub health_check: HealthCheck,
}

/// A dependency with a connect/disconnect lifecycle.
pub trait Plugin: Send + Sync {
    /// Returns the plugin name.
    fn name(&self) -> &str;

    /// Connects and returns the plugin's health check.
    fn connect(&self) -> BoxFuture<'_, Result<PluginConnection, PluginError>>;

    /// Releases the plugin's resources.
    fn disconnect(&self) -> BoxFuture<'_, Result<(), PluginError>>;
}

/// Connects every plugin concurrently and builds the health registry.
///
/// Fails on the first connect error or if two connections share a name.
pub async fn connect_plugins(plugins: &[Arc<dyn Plugin>]) -> Result<HealthRegistry, PluginError> {
    let connections = try_join_all(plugins.iter().map(|plugin| plugin.connect())).await?;

    let mut builder = HealthRegistry::builder();
    for connection in connections {
        if builder.contains(&connection.name) {
            return Err(PluginError::Duplicate {
                name: connection.name,
            });
        }
        tracing::info!(plugin = %connection.name, "Plugin connected");
        builder = builder.check(connection.name, connection.health_check);
    }

    Ok(builder.build())
}

/// Disconnects every plugin.
///
/// All plugins are attempted; failures are logged and the first one is
/// returned.
pub async fn disconnect_plugins(plugins: &[Arc<dyn Plugin>]) -> Result<(), PluginError> {
    let results = join_all(plugins.iter().map(|plugin| plugin.disconnect())).await;

    let mut first_error = None;
    for (plugin, result) in plugins.iter().zip(results) {
        match result {
            Ok(()) => tracing::info!(plugin = %plugin.name(), "Plugin disconnected"),
            Err(err) => {
                tracing::error!(plugin = %plugin.name(), error = %err, "Plugin disconnect failed");
                first_error.get_or_insert(err);
            }
        }
    }

    first_error.map_or(Ok(()), Err)
}
