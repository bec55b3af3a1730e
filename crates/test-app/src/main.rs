//! Test app entry point.

use essentials_core::HealthRegistry;
use essentials_server::{Server, ServerConfig, ServerEssentials};
use essentials_telemetry::{init_logging, install_panic_hook, LogConfig};
use test_app::{app_router, AppConfig};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    let log_config = LogConfig::for_environment(config.is_production())
        .with_service_name(config.service.name.clone());
    if let Err(e) = init_logging(&log_config) {
        eprintln!("{e}");
        std::process::exit(1);
    }
    install_panic_hook();

    info!(features = ?config.features, "Features enabled");

    let server = Server::builder(ServerEssentials::new(
        config.service.name.clone(),
        config.service.version.clone(),
    ))
    .config(
        ServerConfig::builder()
            .host_port("0.0.0.0", config.server.port)
            .build(),
    )
    .router(app_router(
        &config.service.name,
        &config.service.version,
        HealthRegistry::builder().build(),
    ))
    .build();

    info!("Server listening on {}", config.server.url);
    if let Err(e) = server.run().await {
        error!(error = %e, "Server error");
        std::process::exit(1);
    }
}
