//! Health reporting for the user store.

use essentials_core::{BoxFuture, HealthCheck, HealthStatus, Plugin, PluginConnection, PluginError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Plugin name, also the key under `checks` on the root route.
pub const USER_STORE_PLUGIN: &str = "userStore";

/// Reports whether the user store is open.
///
/// The in-memory store has nothing to dial, so connecting only flips the
/// reported state.
#[derive(Debug, Default)]
pub struct UserStorePlugin {
    connected: Arc<AtomicBool>,
}

impl UserStorePlugin {
    /// Creates a disconnected plugin.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` between connect and disconnect.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }
}

impl Plugin for UserStorePlugin {
    fn name(&self) -> &str {
        USER_STORE_PLUGIN
    }

    fn connect(&self) -> BoxFuture<'_, Result<PluginConnection, PluginError>> {
        self.connected.store(true, Ordering::Release);
        let connected = Arc::clone(&self.connected);
        let health_check = HealthCheck::sync(move || {
            Ok(if connected.load(Ordering::Acquire) {
                HealthStatus::connected()
            } else {
                HealthStatus::disconnected()
            })
        });

        Box::pin(std::future::ready(Ok(PluginConnection {
            name: USER_STORE_PLUGIN.to_string(),
            health_check,
        })))
    }

    fn disconnect(&self) -> BoxFuture<'_, Result<(), PluginError>> {
        self.connected.store(false, Ordering::Release);
        Box::pin(std::future::ready(Ok(())))
    }
}
