mod config;
mod credentials;
mod handlers;
mod locations;
mod models;
mod pipeline;
mod records;
mod render;
mod router;
mod transfer;
mod utils;

use std::sync::Arc;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::Config;
use credentials::Session;
use pipeline::Pipeline;

/// Application state shared across handlers
pub struct AppState {
    pub config: Config,
    pub pipeline: Pipeline,
    /// One operator session; the lock also serializes pipeline runs
    pub session: tokio::sync::Mutex<Session>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "config_manager=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let cfg = Config::load();
    tracing::info!("Starting config-manager");
    tracing::info!("Templates: {}", cfg.templates_dir);
    tracing::info!("Network table: {}", cfg.network_table);
    tracing::info!("Output dir: {}", cfg.output_dir);
    tracing::info!(
        "File server: {} ({} port {}, dir {})",
        if cfg.file_server.is_empty() { "<not set>" } else { cfg.file_server.as_str() },
        cfg.transfer_protocol.as_str(),
        cfg.effective_port(),
        cfg.remote_dir
    );

    // Report a broken network table at startup
    match locations::LocationTable::load(&cfg.network_table).await {
        Ok(table) => tracing::info!("Loaded {} locations", table.len()),
        Err(e) => tracing::warn!("{:#}", e),
    }

    let state = Arc::new(AppState {
        config: cfg.clone(),
        pipeline: Pipeline::from_config(&cfg),
        session: tokio::sync::Mutex::new(Session::default()),
    });

    // Build router
    let app = router::build(state, &cfg.frontend_dir);

    // Start server
    let listener = tokio::net::TcpListener::bind(&cfg.listen_addr).await?;
    tracing::info!("config-manager listening on {}", cfg.listen_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("config-manager shutting down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
