//! `insured` — the insurance policy API server.
//!
//! Usage:
//!   insured -c <context-name-or-path> [--listen <addr>]
//!
//! The context name resolves to `/etc/insure/<name>.toml`.
//! If a path with `/` or `.` is given, it's used directly.

mod bootstrap;
mod config;
mod routes;

use clap::Parser;
use insure_core::Module;
use tracing::info;

use config::ServerConfig;
use policy::service::PolicyService;

/// Insurance policy API server.
#[derive(Parser, Debug)]
#[command(name = "insured", about = "Insurance policy API server")]
struct Cli {
    /// Context name or path to config file.
    #[arg(short = 'c', long = "config", required = true)]
    config: String,

    /// Listen address.
    #[arg(long = "listen", default_value = "0.0.0.0:8080")]
    listen: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    // Load server configuration.
    let config_path = ServerConfig::resolve_path(&cli.config);
    info!("Loading configuration from {}", config_path.display());
    let server_config = ServerConfig::load(&config_path)?;

    bootstrap::verify_config(&server_config)?;

    let core_config = server_config.service_config(&cli.listen);
    let (sql, kv) = bootstrap::open_stores(&core_config)?;

    let missing = server_config.policy.missing_supplement();
    let policy_module = policy::PolicyModule::new(PolicyService::new(sql, kv, missing)?)
        .with_upload_limit(server_config.policy.max_upload_bytes);
    info!("Policy module initialized ({:?} unsupplemented policies)", missing);

    let module_routes = vec![(policy_module.name(), policy_module.routes())];
    let app = routes::build_router(module_routes);

    // Start server.
    let listener = tokio::net::TcpListener::bind(&core_config.listen).await?;
    info!("Insurance API listening on {}", core_config.listen);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
