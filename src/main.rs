//! Pulse Board entry point
//!
//! 1. Loads configuration (YAML + env overrides)
//! 2. Loads the token catalogue into the shared store
//! 3. Starts the mock tick source feeding the store
//! 4. Serves the REST/WebSocket API
//! 5. Runs the terminal dashboard (LOG_FORMAT=tui) or waits for Ctrl+C

use std::path::Path;
use std::sync::{Arc, Mutex};

use pulse_board::config::{self, constants, logging};
use pulse_board::core::loader::{load_into, loader_from_config};
use pulse_board::core::pipeline::FeedPipeline;
use pulse_board::core::store::{read_store, TokenStore};
use pulse_board::core::ticker::MockTickSource;
use pulse_board::server;
use pulse_board::tui::{self, TuiLayer};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file (if it exists)
    dotenvy::dotenv().ok();

    let tui_mode = logging::is_tui_mode();
    let config_path = constants::config_path();

    // Config is needed to build the dashboard state, which the TUI logging
    // layer writes into, so it is loaded before any subscriber exists.
    let config = match config::load_config_or_default(Path::new(&config_path)) {
        Ok(cfg) => Arc::new(cfg),
        Err(e) => {
            eprintln!("Configuration failed ({}): {}", config_path, e);
            std::process::exit(1);
        }
    };

    let dashboard = if tui_mode {
        let state = Arc::new(Mutex::new(tui::AppState::new(
            &config.view,
            constants::max_logs_in_memory(),
        )));
        tracing_subscriber::registry()
            .with(logging::env_filter())
            .with(TuiLayer::new(Arc::clone(&state)))
            .init();
        Some(state)
    } else {
        logging::init_logging();
        None
    };

    info!(event_type = "STARTUP", config = %config_path, "Pulse Board starting");
    constants::log_configuration();

    // Shared store + change fan-out
    let store = TokenStore::new().shared();
    let (events_tx, _) = broadcast::channel(config.api.event_channel_capacity);
    let pipeline = FeedPipeline::new(store.clone(), events_tx);
    let shutdown = CancellationToken::new();

    // Catalogue
    match loader_from_config(&config.catalog, &config.api) {
        Ok(loader) => {
            if let Err(e) = load_into(&store, loader.as_ref()).await {
                warn!(event_type = "LOAD_FAILED", error = %e, "Starting with an empty board");
            }
        }
        Err(e) => {
            error!(event_type = "LOAD_FAILED", error = %e, "Catalogue loader misconfigured");
            return Err(e.into());
        }
    }

    // Tick only what was actually loaded
    let loaded_ids: Vec<String> = read_store(&store).ids().iter().map(|id| id.to_string()).collect();
    let mut source = MockTickSource::from_config(&config.feed);
    if !loaded_ids.is_empty() {
        source = source.with_candidates(loaded_ids);
    }
    let mut ticks = source.spawn(pipeline.tick_callback());

    // API server
    let state = server::AppState::new(pipeline.clone(), Arc::clone(&config), shutdown.clone());
    let server_shutdown = shutdown.clone();
    let server_task = tokio::spawn(async move {
        if let Err(e) = server::start_server(state).await {
            error!(event_type = "SERVER_ERROR", error = %e, "API server failed");
            server_shutdown.cancel();
        }
    });

    match dashboard {
        Some(app_state) => {
            let ctrl_c_shutdown = shutdown.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    ctrl_c_shutdown.cancel();
                }
            });
            if let Err(e) = tui::run_dashboard(app_state, store.clone(), shutdown.clone()).await {
                error!(event_type = "TUI_ERROR", error = %e, "Dashboard failed");
            }
        }
        None => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    info!(event_type = "SHUTDOWN", "Ctrl+C received, shutting down");
                }
                _ = shutdown.cancelled() => {}
            }
        }
    }

    // Ordered shutdown: feed first, then the server
    shutdown.cancel();
    ticks.stop().await;
    if let Err(e) = server_task.await {
        warn!(error = %e, "Server task join failed");
    }

    let stats = pipeline.stats();
    info!(
        event_type = "SHUTDOWN",
        applied = stats.applied,
        dropped = stats.dropped,
        rejected = stats.rejected,
        "Pulse Board stopped"
    );
    Ok(())
}
