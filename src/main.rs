//! Application entry point and server initialization
//!
//! This module contains the main function that:
//! - Loads environment configuration
//! - Opens the flat-file data directory
//! - Starts the HTTP server with graceful shutdown support

use std::sync::Arc;

use dotenvy::dotenv;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use flatmart::config::Config;
use flatmart::database::{init_db, AppState};
use flatmart::notifier::LogNotifier;
use flatmart::route::create_app;

/// Application entry point
///
/// 1. Loads environment variables from .env file
/// 2. Reads configuration (see [`Config::from_env`])
/// 3. Opens the data directory, creating missing tables
/// 4. Creates the application state and router
/// 5. Starts the HTTP server with graceful shutdown handling
#[tokio::main]
async fn main() {
    // Load environment variables from .env file if it exists
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("flatmart=debug,tower_http=debug")),
        )
        .init();

    let config = Config::from_env().expect("Invalid configuration");

    let db = init_db(&config.data_dir)
        .await
        .expect("Failed to open data directory");

    let state = AppState::new(db, Arc::new(LogNotifier))
        .with_admin_token(config.admin_token.clone());

    let app = create_app(state).layer(TraceLayer::new_for_http());

    let listener = TcpListener::bind(config.addr())
        .await
        .expect("Failed to bind listen address");

    tracing::info!(
        addr = %config.addr(),
        data_dir = %config.data_dir.display(),
        admin_guard = config.admin_token.is_some(),
        "Server running"
    );

    // Every table write is temp file + rename, so stopping mid-request never tears a file
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");
}

/// Returns when SIGINT (Ctrl+C) or, on Unix, SIGTERM is received
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, stopping server");
}
