//! REST + WebSocket API server over the live token store.
//!
//! Uses `axum` for HTTP/WS routing with CORS support.

pub mod error;
pub mod routes;
pub mod ws;

use std::sync::Arc;

use axum::{routing::get, Router};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::config::AppConfig;
use crate::core::pipeline::FeedPipeline;
use crate::core::store::SharedStore;

pub use error::ApiError;

/// Shared application state for the HTTP/WS server.
#[derive(Clone)]
pub struct AppState {
    pub store: SharedStore,
    /// Write path for inbound feed frames; also the source of WS events
    pub pipeline: FeedPipeline,
    pub config: Arc<AppConfig>,
    /// Cancelled on shutdown so WS sessions end promptly
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(pipeline: FeedPipeline, config: Arc<AppConfig>, shutdown: CancellationToken) -> Self {
        Self {
            store: pipeline.store().clone(),
            pipeline,
            config,
            shutdown,
        }
    }
}

/// Build the router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health_handler))
        .route("/tokens", get(routes::tokens_handler))
        .route("/tokens/:id", get(routes::token_handler))
        .route("/sections/:status", get(routes::section_handler))
        .route("/ws", get(ws::ws_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve on an already-bound listener until the state's shutdown token
/// is cancelled.
pub async fn serve(listener: TcpListener, state: AppState) -> anyhow::Result<()> {
    let shutdown = state.shutdown.clone();
    let app = router(state);
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;
    info!("API server stopped");
    Ok(())
}

/// Bind the configured address and serve.
///
/// Blocks until the server shuts down.
pub async fn start_server(state: AppState) -> anyhow::Result<()> {
    let addr = state.config.api.bind_addr();
    info!(address = %addr, "Starting API server");

    let listener = TcpListener::bind(&addr).await?;
    serve(listener, state).await
}
