//! Application entry point and server initialization
//!
//! Loads configuration, opens the database, seeds the admin account when
//! configured, and serves the API until SIGINT or SIGTERM.

use dotenvy::dotenv;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use jewelry_shop::config::Config;
use jewelry_shop::database::{bootstrap_admin, init_db, AppState};
use jewelry_shop::route::create_app;

const DEFAULT_LOG_FILTER: &str = "jewelry_shop=debug,tower_http=debug";

#[tokio::main]
async fn main() {
    // Load environment variables from .env file if it exists
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let config = Config::from_env();
    let port = config.port;
    let db_name = config.database_url.clone();

    let db = init_db(&db_name).expect("Failed to initialize database");
    let state = AppState::new(db, config);

    if let Err(err) = bootstrap_admin(&state).await {
        error!(error = %err, "failed to seed admin account");
    }

    let app = create_app(state).layer(TraceLayer::new_for_http());

    let addr = format!("0.0.0.0:{}", port);
    let listener = TcpListener::bind(&addr)
        .await
        .expect("Failed to bind listen address");

    info!(%addr, database = %db_name, "server listening");

    // Open connections finish before the process exits
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");
}

/// Resolves on Ctrl+C, or SIGTERM on Unix.
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

    info!("shutdown signal received, stopping server");
}
