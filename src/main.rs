//! Main entry point for mm-backend

use mm_backend::{api, config::LoggingConfig, config::Settings, AppState};
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Local environment file with generator credentials and endpoints
const DEV_ENV_FILE: &str = "./.dev.env";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let dotenv = dotenvy::from_filename(DEV_ENV_FILE);

    // Load configuration
    let settings = Settings::load()?;
    settings.validate()?;

    init_tracing(&settings.logging);

    match dotenv {
        Ok(path) => info!(path = %path.display(), "Loaded environment file"),
        Err(e) if e.not_found() => info!(path = DEV_ENV_FILE, "No environment file found"),
        Err(e) => warn!(path = DEV_ENV_FILE, error = %e, "Failed to load environment file"),
    }

    info!("Starting mm-backend");

    let addr = settings.bind_address();
    info!(
        "Loaded configuration: server={}, generator={} ({})",
        addr, settings.generator.name, settings.generator.protocol
    );

    let app_state = Arc::new(AppState::from_settings(settings)?);

    // Build the router
    let app = api::routes::create_router(app_state);

    info!("Server listening on {}", addr);

    // Start the server
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let registry = tracing_subscriber::registry().with(filter);

    if logging.format == "pretty" {
        registry.with(fmt::layer().pretty()).init();
    } else {
        registry.with(fmt::layer().json()).init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT, starting graceful shutdown"),
        _ = terminate => info!("Received SIGTERM, starting graceful shutdown"),
    }
}
