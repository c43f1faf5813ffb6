//! # Menu API Server
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Menu API Server                                  │
//! │                                                                         │
//! │  Menu / Cashier / Admin ───► HTTP (5000) ───► Services ───► SQLite     │
//! │                                                   │                     │
//! │  Consoles ◄──────────────── /ws ◄─────────── Notifier                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```bash
//! menu-api                          # defaults + menu.toml + MENU_* env
//! menu-api --config ./menu.toml     # explicit config file
//! ```

use std::path::PathBuf;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use menu_api::{build_app, AppConfig, AppState};
use menu_db::Database;
use menu_notify::BroadcastNotifier;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load(config_path())?;

    // RUST_LOG wins, then the configured filter
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_filter()))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    info!("Starting Menu API server...");

    let addr = config.socket_addr()?;

    info!(path = ?config.database.path, "Connecting to database...");
    let db = Database::new(config.db_config()).await?;
    info!("Database connected");

    let events = BroadcastNotifier::new(config.notify.channel_capacity);
    let state = AppState::new(
        db.clone(),
        events,
        config.hub_config(),
        config.orders.numbering,
    );
    info!(numbering = ?config.orders.numbering, "Order numbering configured");

    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "Menu API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// `--config <path>` wins over `MENU_CONFIG`.
fn config_path() -> Option<PathBuf> {
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" | "-c" => return args.next().map(PathBuf::from),
            other => {
                if let Some(path) = other.strip_prefix("--config=") {
                    return Some(PathBuf::from(path));
                }
            }
        }
    }
    std::env::var_os("MENU_CONFIG").map(PathBuf::from)
}

/// Waits for Ctrl+C or SIGTERM.
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
