//! Async keyboard event handling for the dashboard
//!
//! Uses crossterm's EventStream so polling never blocks a tokio worker.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use crossterm::event::{Event, EventStream, KeyCode, KeyEventKind, KeyModifiers};
use futures_util::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use super::app::AppState;

/// How long one poll waits for input before the loop redraws.
pub const POLL_TIMEOUT: Duration = Duration::from_millis(50);

/// Result of processing a single event poll cycle
#[derive(Debug, PartialEq, Eq)]
pub enum EventResult {
    Continue,
    Quit,
}

/// Wait up to [`POLL_TIMEOUT`] for one terminal event and apply it.
pub async fn handle_events_async(
    app_state: &Arc<Mutex<AppState>>,
    shutdown: &CancellationToken,
    event_stream: &mut EventStream,
) -> EventResult {
    match tokio::time::timeout(POLL_TIMEOUT, event_stream.next()).await {
        Err(_) => EventResult::Continue,
        // Terminal closed
        Ok(None) => EventResult::Quit,
        Ok(Some(Err(e))) => {
            warn!(event_type = "TERMINAL_IO_ERROR", error = %e, "Terminal I/O error during event polling");
            EventResult::Continue
        }
        Ok(Some(Ok(Event::Key(key)))) if key.kind != KeyEventKind::Release => {
            process_key_event(key.code, key.modifiers, app_state, shutdown)
        }
        Ok(Some(Ok(_))) => EventResult::Continue,
    }
}

fn quit(app_state: &Arc<Mutex<AppState>>, shutdown: &CancellationToken) -> EventResult {
    if let Ok(mut state) = app_state.lock() {
        state.should_quit = true;
    }
    shutdown.cancel();
    EventResult::Quit
}

/// Apply a single key press to the dashboard state.
fn process_key_event(
    code: KeyCode,
    modifiers: KeyModifiers,
    app_state: &Arc<Mutex<AppState>>,
    shutdown: &CancellationToken,
) -> EventResult {
    match code {
        KeyCode::Char('q') | KeyCode::Char('Q') => return quit(app_state, shutdown),
        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
            return quit(app_state, shutdown)
        }
        _ => {}
    }

    let Ok(mut state) = app_state.lock() else {
        return EventResult::Continue;
    };

    match code {
        // Section focus
        KeyCode::Tab | KeyCode::Right => state.focus_next(),
        KeyCode::BackTab | KeyCode::Left => state.focus_prev(),

        // Row selection in the focused section
        KeyCode::Char('j') | KeyCode::Down => state.focused_mut().move_selection(1),
        KeyCode::Char('k') | KeyCode::Up => state.focused_mut().move_selection(-1),
        KeyCode::PageDown => {
            let rows = state.focused().page_rows() as isize;
            state.focused_mut().move_selection(rows);
        }
        KeyCode::PageUp => {
            let rows = state.focused().page_rows() as isize;
            state.focused_mut().move_selection(-rows);
        }
        KeyCode::Char('g') | KeyCode::Home => state.focused_mut().select_first(),
        KeyCode::Char('G') | KeyCode::End => state.focused_mut().select_last(),

        // Sorting
        KeyCode::Char('s') | KeyCode::Char('S') => state.cycle_sort_field(),
        KeyCode::Char('d') | KeyCode::Char('D') => state.toggle_sort_direction(),

        // Filters and density
        KeyCode::Char('c') | KeyCode::Char('C') => state.cycle_chain_filter(),
        KeyCode::Char('r') | KeyCode::Char('R') => state.reset_filters(),
        KeyCode::Char('v') | KeyCode::Char('V') => state.toggle_compact_rows(),

        // Log panel
        KeyCode::Char('[') => {
            let max_offset = state.recent_logs.len().saturating_sub(1);
            if state.log_scroll_offset < max_offset {
                state.log_scroll_offset += 1;
            }
        }
        KeyCode::Char(']') => {
            state.log_scroll_offset = state.log_scroll_offset.saturating_sub(1);
        }
        KeyCode::Char('l') | KeyCode::Char('L') => {
            state.show_debug_logs = !state.show_debug_logs;
            super::logging::set_show_debug(state.show_debug_logs);
        }

        _ => {}
    }
    EventResult::Continue
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ViewConfig;
    use crate::core::projection::{SortDirection, SortField};
    use crate::core::store::TokenStore;
    use crate::core::types::test_support::token;
    use crate::core::types::{Chain, TokenStatus};

    fn state_with_rows(n: usize) -> Arc<Mutex<AppState>> {
        let mut store = TokenStore::new();
        store.replace_all(
            (0..n)
                .map(|i| token(&format!("t{}", i), TokenStatus::New, 1.0))
                .collect(),
        );
        let mut state = AppState::new(&ViewConfig::default(), 10);
        state.refresh(&store);
        state.focused_mut().set_extent(5);
        Arc::new(Mutex::new(state))
    }

    fn press(state: &Arc<Mutex<AppState>>, code: KeyCode) -> EventResult {
        process_key_event(code, KeyModifiers::empty(), state, &CancellationToken::new())
    }

    #[test]
    fn test_process_quit_q() {
        let state = state_with_rows(0);
        let shutdown = CancellationToken::new();

        let result = process_key_event(KeyCode::Char('q'), KeyModifiers::empty(), &state, &shutdown);
        assert_eq!(result, EventResult::Quit);
        assert!(state.lock().unwrap().should_quit);
        assert!(shutdown.is_cancelled());
    }

    #[test]
    fn test_process_ctrl_c() {
        let state = state_with_rows(0);
        let shutdown = CancellationToken::new();

        let result = process_key_event(KeyCode::Char('c'), KeyModifiers::CONTROL, &state, &shutdown);
        assert_eq!(result, EventResult::Quit);
        assert!(shutdown.is_cancelled());
    }

    #[test]
    fn test_selection_keys() {
        let state = state_with_rows(30);

        press(&state, KeyCode::Char('j'));
        press(&state, KeyCode::Down);
        assert_eq!(state.lock().unwrap().focused().selected, 2);

        press(&state, KeyCode::Char('k'));
        assert_eq!(state.lock().unwrap().focused().selected, 1);

        press(&state, KeyCode::PageDown);
        assert_eq!(state.lock().unwrap().focused().selected, 6);

        press(&state, KeyCode::Char('G'));
        {
            let s = state.lock().unwrap();
            assert_eq!(s.focused().selected, 29);
            assert_eq!(s.focused().viewport.offset, 25);
        }

        press(&state, KeyCode::Home);
        assert_eq!(state.lock().unwrap().focused().selected, 0);
    }

    #[test]
    fn test_focus_and_sort_keys() {
        let state = state_with_rows(3);

        press(&state, KeyCode::Tab);
        press(&state, KeyCode::Char('s'));
        press(&state, KeyCode::Char('d'));
        {
            let s = state.lock().unwrap();
            assert_eq!(s.focus, 1);
            assert_eq!(s.focused().sort().field, SortField::MarketCap);
            assert_eq!(s.focused().sort().direction, SortDirection::Asc);
        }

        press(&state, KeyCode::Left);
        assert_eq!(state.lock().unwrap().focus, 0);
    }

    #[test]
    fn test_filter_and_density_keys() {
        let state = state_with_rows(3);
        let shutdown = CancellationToken::new();

        let result = process_key_event(KeyCode::Char('c'), KeyModifiers::empty(), &state, &shutdown);
        assert_eq!(result, EventResult::Continue);
        assert!(!shutdown.is_cancelled());
        assert_eq!(state.lock().unwrap().chain_filter, Some(Chain::Sol));

        press(&state, KeyCode::Char('c'));
        assert_eq!(state.lock().unwrap().chain_filter, Some(Chain::Eth));
        press(&state, KeyCode::Char('r'));
        assert_eq!(state.lock().unwrap().chain_filter, None);

        press(&state, KeyCode::Char('v'));
        assert!(state.lock().unwrap().compact_rows);
    }

    #[test]
    fn test_log_scroll_and_debug_toggle() {
        let state = state_with_rows(0);
        for i in 0..4 {
            state.lock().unwrap().push_log(super::super::app::LogEntry {
                timestamp: "12:00:00".to_string(),
                level: "INFO".to_string(),
                message: format!("Log {}", i),
            });
        }

        press(&state, KeyCode::Char('['));
        press(&state, KeyCode::Char('['));
        assert_eq!(state.lock().unwrap().log_scroll_offset, 2);
        press(&state, KeyCode::Char(']'));
        assert_eq!(state.lock().unwrap().log_scroll_offset, 1);

        press(&state, KeyCode::Char('l'));
        assert!(state.lock().unwrap().show_debug_logs);
        press(&state, KeyCode::Char('l'));
        assert!(!state.lock().unwrap().show_debug_logs);
    }
}
