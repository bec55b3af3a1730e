//! User service entry point.

use std::sync::Arc;

use essentials_core::{connect_plugins, disconnect_plugins, Plugin};
use essentials_server::{Server, ServerConfig, ServerEssentials};
use essentials_telemetry::{init_logging, install_panic_hook, LogConfig};
use tracing::{error, info};

use user_service::{service_router, LocalUserStore, UserServiceConfig, UserStorePlugin, SERVICE_NAME, VERSION};

async fn run() -> anyhow::Result<()> {
    let config = UserServiceConfig::from_env()?;

    let store = Arc::new(LocalUserStore::new());
    let plugins: Vec<Arc<dyn Plugin>> = vec![Arc::new(UserStorePlugin::new())];
    let health = connect_plugins(&plugins).await?;

    let server = Server::builder(ServerEssentials::new(SERVICE_NAME, VERSION))
        .config(
            ServerConfig::builder()
                .host_port(&config.host, config.port)
                .build(),
        )
        .router(service_router(store, health))
        .on_shutdown(move || async move {
            disconnect_plugins(&plugins).await?;
            Ok(())
        })
        .build();

    info!("Server listening on {}:{}", config.host, config.port);
    server.run().await?;
    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(e) = init_logging(&LogConfig::production().with_service_name(SERVICE_NAME)) {
        eprintln!("{e}");
        std::process::exit(1);
    }
    install_panic_hook();

    if let Err(e) = run().await {
        error!(error = %e, "User service failed");
        std::process::exit(1);
    }
}
