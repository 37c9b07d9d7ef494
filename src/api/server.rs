//! Sheetbridge API Server implementation
//!
//! HTTP server using Axum: upload import, JSON export, schema and health.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use super::handlers;
use crate::bridge::SheetBridge;
use crate::config::SheetConfig;

/// Uploads above this size are rejected before parsing.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// API Server configuration
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// YAML or JSON sheet configuration
    pub config_path: PathBuf,
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            config_path: PathBuf::from("sheetbridge.yaml"),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

/// Shared application state
pub struct AppState {
    pub bridge: Arc<SheetBridge>,
    pub version: String,
}

impl AppState {
    pub fn new(bridge: SheetBridge) -> Self {
        Self {
            bridge: Arc::new(bridge),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Routes and middleware around `state`.
pub fn build_router(state: Arc<AppState>, max_upload_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/schema", get(handlers::schema))
        .route("/api/v1/import", post(handlers::import_excel))
        .route("/api/v1/export", post(handlers::export))
        .with_state(state)
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Run the API server
pub async fn run_api_server(config: ServerConfig) -> anyhow::Result<()> {
    // a subscriber may already be installed by an embedding application
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "sheetbridge_server=info,royalbit_sheetbridge=info,tower_http=info".into()
            }),
        )
        .try_init();

    let sheet_config = SheetConfig::from_path(&config.config_path)?;
    let bridge = SheetBridge::new(sheet_config)?;
    info!(
        config = %config.config_path.display(),
        columns = bridge.schema().len(),
        upload_key = bridge.upload_key(),
        "sheet configuration loaded"
    );

    let app = build_router(Arc::new(AppState::new(bridge)), config.max_upload_bytes);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Sheetbridge API Server starting on http://{}", addr);
    info!("   Endpoints: /api/v1/import, /api/v1/export");
    info!("   Info: /health, /schema");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Sheetbridge API Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
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
                tracing::error!(error = %e, "failed to install SIGTERM handler");
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

    info!("Shutdown signal received, stopping server...");
}
