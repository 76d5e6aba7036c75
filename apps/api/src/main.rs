//! # Bazaar API
//!
//! HTTP server for bill preview, checkout and administration.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          API Server                                     │
//! │                                                                         │
//! │  Storefront ───► HTTP (8080) ───► routes ───► bazaar-db ───► SQLite    │
//! │  Admin UI   ───┘                                  │                     │
//! │                                                   ▼                     │
//! │                                             bazaar-core                 │
//! │                                          (pricing, no I/O)              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::Path;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use bazaar_api::{build_router, ApiConfig, AppState, JwtManager};
use bazaar_db::Database;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,bazaar_api=debug,bazaar_db=debug")),
        )
        .with_target(true)
        .init();

    info!("Starting Bazaar API server...");

    // Load configuration
    let config = ApiConfig::load()?;
    info!(
        port = config.http_port,
        database = %config.database_path,
        delivery_fee_cents = config.delivery_fee_cents,
        "Configuration loaded"
    );

    if let Some(parent) = Path::new(&config.database_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    // Open database (runs migrations)
    let db = Database::new(config.db_config())
        .await?
        .with_pricing_policy(config.pricing_policy());
    info!("Database ready");

    let jwt = JwtManager::new(config.jwt_secret.clone(), config.jwt_access_lifetime_secs);
    let app = build_router(AppState::new(db.clone(), jwt));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "Starting HTTP server");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
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

    info!("Shutdown signal received, starting graceful shutdown...");
}
