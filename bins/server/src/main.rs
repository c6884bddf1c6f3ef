//! Crmdesk API Server
//!
//! Main entry point for the Crmdesk backend service.

use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crmdesk_api::{AppState, create_router};
use crmdesk_core::storage::{StorageConfig, StorageService};
use crmdesk_db::connect_with;
use crmdesk_shared::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "crmdesk=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load().context("Failed to load configuration")?;
    let timezone = config.scheduler.tz().map_err(anyhow::Error::msg)?;
    let run_at = config.scheduler.run_at_time().map_err(anyhow::Error::msg)?;

    // Connect to database
    let db = connect_with(&config.database).await?;
    info!(
        max_connections = config.database.max_connections,
        "Connected to database"
    );

    // Receipt storage is optional; expenses work without it
    let storage = match StorageConfig::from_settings(&config.storage)
        .and_then(StorageService::from_config)
    {
        Ok(service) => {
            info!(provider = service.provider_name(), "Receipt storage configured");
            Some(service)
        }
        Err(e) => {
            warn!(error = %e, "Receipt storage disabled");
            None
        }
    };

    let state = AppState::new(db, storage, timezone);

    // Start the recurring expense scheduler
    let shutdown = CancellationToken::new();
    let scheduler_task = if config.scheduler.enabled {
        Some(
            state
                .scheduler
                .clone()
                .spawn(run_at, timezone, shutdown.clone()),
        )
    } else {
        info!("Recurring expense scheduler disabled by configuration");
        None
    };

    // Create router
    let app = create_router(
        state,
        Duration::from_secs(config.server.request_timeout_secs),
    );

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    shutdown.cancel();
    if let Some(task) = scheduler_task {
        if let Err(e) = task.await {
            warn!(error = %e, "Scheduler task ended abnormally");
        }
    }

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
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
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received");
}
