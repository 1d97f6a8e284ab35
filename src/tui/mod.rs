//! Terminal dashboard, activated via LOG_FORMAT=tui
//!
//! # Usage
//! ```bash
//! LOG_FORMAT=tui cargo run --release
//! ```
//!
//! # Keyboard Controls
//! - `q` or `Ctrl+C`: Quit
//! - `Tab`/`←`/`→`: Focus section
//! - `↑/k` `↓/j`, `PgUp/PgDn`, `g/G`: Move selection
//! - `s`: Cycle sort field, `d`: Toggle sort direction
//! - `[` `]`: Scroll logs, `l`: Toggle DEBUG logs

pub mod app;
pub mod event;
pub mod logging;
pub mod ui;

use std::io;
use std::sync::{Arc, Mutex};

use crossterm::event::EventStream;
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::core::store::{read_store, SharedStore};

pub use app::{AppState, LogEntry, MAX_LOG_ENTRIES};
pub use event::EventResult;
pub use logging::TuiLayer;

/// Run the dashboard until the user quits or `shutdown` is cancelled.
///
/// Quitting from the keyboard cancels `shutdown` so the rest of the
/// process winds down with it.
pub async fn run_dashboard(
    app_state: Arc<Mutex<AppState>>,
    store: SharedStore,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    let result = dashboard_loop(&mut terminal, &app_state, &store, &shutdown).await;

    // Restore the terminal even if the loop failed
    if let Err(e) = disable_raw_mode() {
        warn!(event_type = "TERMINAL_IO_ERROR", error = %e, "Failed to disable raw mode");
    }
    if let Err(e) = execute!(terminal.backend_mut(), LeaveAlternateScreen) {
        warn!(event_type = "TERMINAL_IO_ERROR", error = %e, "Failed to leave alternate screen");
    }
    terminal.show_cursor()?;

    info!(event_type = "TUI_STOPPED", "Dashboard closed");
    result
}

async fn dashboard_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app_state: &Arc<Mutex<AppState>>,
    store: &SharedStore,
    shutdown: &CancellationToken,
) -> anyhow::Result<()> {
    let mut events = EventStream::new();

    while !shutdown.is_cancelled() {
        if let Ok(mut state) = app_state.lock() {
            // Store guard is a temporary, released before drawing
            state.refresh(&read_store(store));
            terminal.draw(|frame| ui::draw(frame, &mut state))?;
        }

        if event::handle_events_async(app_state, shutdown, &mut events).await == EventResult::Quit {
            break;
        }
    }
    Ok(())
}
