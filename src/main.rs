//! Prensa Server
//!
//! A self-hosted document transformation server: split, merge, rotate,
//! compress, and convert PDFs through external converter backends with
//! graceful fallback.

use std::net::SocketAddr;

use axum::extract::DefaultBodyLimit;
use axum::Router;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod archive;
mod config;
mod convert;
mod error;
mod partition;
mod pdfops;
mod routes;
mod state;
mod workspace;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "prensa_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env();

    tracing::info!("Starting Prensa Server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Workspace root: {}", config.transform.temp_root.display());

    let max_upload_bytes = config.transform.max_upload_bytes;
    let port = config.server.port;

    // Create application state
    let app_state = AppState::new(config);

    // Log which backends the host has at startup; requests re-probe, this
    // is purely informational.
    let availability = app_state.prober().probe().await;
    tracing::info!(
        soffice = availability.soffice,
        ghostscript = availability.ghostscript,
        camelot = availability.camelot,
        tabula = availability.tabula,
        "Initial converter backend probe"
    );

    // Build CORS layer
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build router
    let app = Router::new()
        .nest("/health", routes::health::router())
        .nest("/api/v1/health", routes::health::router())
        .nest("/api/v1/tools", routes::tools::router())
        .nest("/api/v1/split", routes::split::router())
        .nest("/api/v1/merge", routes::merge::router())
        .nest("/api/v1/rotate", routes::rotate::router())
        .nest("/api/v1/compress", routes::compress::router())
        .nest("/api/v1/convert", routes::convert::router())
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state);

    // Start server with graceful shutdown
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Prensa Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();

    tracing::info!("Server shutdown complete");
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown...");
        },
    }
}
