//! TUI Application State
//!
//! Three board sections (New Pairs, Final Stretch, Migrated), each with its
//! own cached projection, virtualizer and scroll position, plus the log ring
//! buffer fed by [`super::TuiLayer`]. Wrapped in `Arc<Mutex<>>` for sharing
//! between the render loop and the logging layer.

use std::collections::VecDeque;
use std::time::Instant;

use crate::config::ViewConfig;
use crate::core::projection::{DisplayFilters, SectionView, SortConfig, ViewSpec};
use crate::core::store::TokenStore;
use crate::core::types::{Chain, TokenStatus};
use crate::core::window::{ScrollAlign, Viewport, VirtualItem, Virtualizer};

/// Default maximum number of log entries kept in memory
pub const MAX_LOG_ENTRIES: usize = 100;

/// Board columns, left to right
pub const SECTION_STATUSES: [TokenStatus; 3] = [
    TokenStatus::New,
    TokenStatus::FinalStretch,
    TokenStatus::Migrated,
];

/// Single log entry for display
#[derive(Clone, Debug)]
pub struct LogEntry {
    pub timestamp: String,
    pub level: String,
    pub message: String,
}

/// One scrollable board column.
#[derive(Debug)]
pub struct Section {
    pub status: TokenStatus,
    pub view: SectionView,
    pub virtualizer: Virtualizer,
    pub viewport: Viewport,
    /// Highlighted row
    pub selected: usize,
    row_height: usize,
}

impl Section {
    fn new(status: TokenStatus, view_config: &ViewConfig) -> Self {
        let spec = ViewSpec {
            status: Some(status),
            filters: view_config.filters.clone(),
            sort: view_config.sort,
        };
        let row_height = usize::from(view_config.row_height);
        let mut virtualizer = Virtualizer::new(0, row_height, view_config.overscan);
        virtualizer.attach();
        Self {
            status,
            view: SectionView::new(spec),
            virtualizer,
            viewport: Viewport::default(),
            selected: 0,
            row_height,
        }
    }

    pub fn title(&self) -> &'static str {
        match self.status {
            TokenStatus::New => "New Pairs",
            TokenStatus::FinalStretch => "Final Stretch",
            TokenStatus::Migrated => "Migrated",
            TokenStatus::Graduated => "Graduated",
        }
    }

    pub fn len(&self) -> usize {
        self.view.rows().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Recompute if the store or the section config moved.
    fn refresh(&mut self, store: &TokenStore) -> bool {
        if !self.view.refresh(store) {
            return false;
        }
        let count = self.len();
        self.virtualizer.set_count(count);
        self.selected = self.selected.min(count.saturating_sub(1));
        self.viewport.offset = self
            .virtualizer
            .clamp_offset(self.viewport.offset, self.viewport.extent);
        true
    }

    /// Update the visible extent after a resize.
    pub fn set_extent(&mut self, extent: usize) {
        self.viewport.extent = extent;
        self.virtualizer
            .scroll_to_index(&mut self.viewport, self.selected, ScrollAlign::Auto);
    }

    /// Rows to draw for the current viewport.
    pub fn visible_items(&self) -> Vec<VirtualItem> {
        self.virtualizer.virtual_items(&self.viewport)
    }

    /// Move the selection by `delta` rows (clamped) and keep it in view.
    pub fn move_selection(&mut self, delta: isize) {
        if self.is_empty() {
            self.selected = 0;
            return;
        }
        let last = self.len() - 1;
        self.selected = self.selected.saturating_add_signed(delta).min(last);
        self.virtualizer
            .scroll_to_index(&mut self.viewport, self.selected, ScrollAlign::Auto);
    }

    pub fn select_first(&mut self) {
        self.selected = 0;
        self.virtualizer
            .scroll_to_index(&mut self.viewport, 0, ScrollAlign::Start);
    }

    pub fn select_last(&mut self) {
        if let Some(last) = self.len().checked_sub(1) {
            self.selected = last;
            self.virtualizer
                .scroll_to_index(&mut self.viewport, last, ScrollAlign::End);
        }
    }

    /// Rows per page, for PageUp/PageDown.
    pub fn page_rows(&self) -> usize {
        (self.viewport.extent / self.row_height.max(1)).max(1)
    }

    pub fn row_height(&self) -> usize {
        self.row_height
    }

    /// Change the row height. Offsets are rebuilt and the selection kept
    /// in view.
    pub fn set_row_height(&mut self, row_height: usize) {
        self.row_height = row_height.max(1);
        self.virtualizer.set_estimate(self.row_height);
        self.viewport.offset = self
            .virtualizer
            .clamp_offset(self.viewport.offset, self.viewport.extent);
        self.virtualizer
            .scroll_to_index(&mut self.viewport, self.selected, ScrollAlign::Auto);
    }

    pub fn sort(&self) -> SortConfig {
        self.view.spec().sort
    }

    pub fn filters(&self) -> &DisplayFilters {
        &self.view.spec().filters
    }

    pub fn set_sort(&mut self, sort: SortConfig) {
        self.view.set_sort(sort);
    }
}

/// Central dashboard state
#[derive(Debug)]
pub struct AppState {
    pub sections: Vec<Section>,
    /// Index into `sections`
    pub focus: usize,

    // Board-wide filters: configured base plus the chain toggle
    base_filters: DisplayFilters,
    pub chain_filter: Option<Chain>,
    configured_row_height: usize,
    pub compact_rows: bool,

    // Store summary (copied on refresh)
    pub store_version: u64,
    pub token_count: usize,
    pub loading: bool,
    pub error: Option<String>,
    pub uptime_start: Instant,

    // Logs (ring buffer)
    pub recent_logs: VecDeque<LogEntry>,
    pub max_logs: usize,
    pub dropped_logs_count: u64,

    // Control
    pub should_quit: bool,
    pub log_scroll_offset: usize,
    pub show_debug_logs: bool,
}

impl AppState {
    pub fn new(view_config: &ViewConfig, max_logs: usize) -> Self {
        let max_logs = if max_logs == 0 { MAX_LOG_ENTRIES } else { max_logs };
        Self {
            sections: SECTION_STATUSES
                .iter()
                .map(|status| Section::new(*status, view_config))
                .collect(),
            focus: 0,
            base_filters: view_config.filters.clone(),
            chain_filter: None,
            configured_row_height: usize::from(view_config.row_height),
            compact_rows: false,
            store_version: 0,
            token_count: 0,
            loading: false,
            error: None,
            uptime_start: Instant::now(),
            recent_logs: VecDeque::with_capacity(max_logs),
            max_logs,
            dropped_logs_count: 0,
            should_quit: false,
            log_scroll_offset: 0,
            show_debug_logs: false,
        }
    }

    /// Pull the latest store state into every section. Returns `true` if
    /// any section was recomputed.
    pub fn refresh(&mut self, store: &TokenStore) -> bool {
        self.store_version = store.version();
        self.token_count = store.len();
        self.loading = store.is_loading();
        self.error = store.error().map(str::to_string);

        let mut any = false;
        for section in &mut self.sections {
            any |= section.refresh(store);
        }
        any
    }

    /// Add a log entry with automatic rotation
    pub fn push_log(&mut self, entry: LogEntry) {
        if self.recent_logs.len() >= self.max_logs {
            self.recent_logs.pop_front();
        }
        self.recent_logs.push_back(entry);
    }

    /// Get formatted uptime string
    pub fn uptime_str(&self) -> String {
        let elapsed = self.uptime_start.elapsed();
        let hours = elapsed.as_secs() / 3600;
        let minutes = (elapsed.as_secs() % 3600) / 60;
        format!("{}h{:02}m", hours, minutes)
    }

    pub fn focused(&self) -> &Section {
        &self.sections[self.focus]
    }

    pub fn focused_mut(&mut self) -> &mut Section {
        &mut self.sections[self.focus]
    }

    pub fn focus_next(&mut self) {
        self.focus = (self.focus + 1) % self.sections.len();
    }

    pub fn focus_prev(&mut self) {
        self.focus = (self.focus + self.sections.len() - 1) % self.sections.len();
    }

    /// Cycle the focused section's sort field.
    pub fn cycle_sort_field(&mut self) {
        let section = self.focused_mut();
        let mut sort = section.sort();
        sort.field = sort.field.next();
        section.set_sort(sort);
    }

    /// Step the chain filter: every chain, then each chain alone, then back.
    /// Applies to all sections.
    pub fn cycle_chain_filter(&mut self) {
        self.chain_filter = match self.chain_filter {
            None => Some(Chain::ALL[0]),
            Some(chain) => Chain::ALL
                .iter()
                .position(|c| *c == chain)
                .and_then(|i| Chain::ALL.get(i + 1))
                .copied(),
        };
        self.apply_filters();
    }

    /// Back to the configured filters.
    pub fn reset_filters(&mut self) {
        self.chain_filter = None;
        self.apply_filters();
    }

    fn apply_filters(&mut self) {
        let mut filters = self.base_filters.clone();
        if let Some(chain) = self.chain_filter {
            filters.chains = vec![chain];
        }
        for section in &mut self.sections {
            section.view.set_filters(filters.clone());
        }
    }

    /// Switch every section between one-line rows and the configured height.
    pub fn toggle_compact_rows(&mut self) {
        self.compact_rows = !self.compact_rows;
        let row_height = if self.compact_rows {
            1
        } else {
            self.configured_row_height
        };
        for section in &mut self.sections {
            section.set_row_height(row_height);
        }
    }

    /// Flip the focused section's sort direction.
    pub fn toggle_sort_direction(&mut self) {
        let section = self.focused_mut();
        let mut sort = section.sort();
        sort.direction = sort.direction.toggle();
        section.set_sort(sort);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::projection::{SortDirection, SortField};
    use crate::core::types::test_support::token;
    use crate::core::types::TokenRecord;

    fn records(n_new: usize) -> Vec<TokenRecord> {
        let mut records: Vec<_> = (0..n_new)
            .map(|i| {
                let mut t = token(&format!("n{}", i), TokenStatus::New, 1.0);
                t.volume_24h = i as f64;
                t
            })
            .collect();
        records.push(token("m0", TokenStatus::Migrated, 1.0));
        records.push(token("g0", TokenStatus::Graduated, 1.0));
        records
    }

    fn store_with(n_new: usize) -> TokenStore {
        let mut store = TokenStore::new();
        store.replace_all(records(n_new));
        store
    }

    #[test]
    fn test_app_state_creation() {
        let state = AppState::new(&ViewConfig::default(), 0);
        assert_eq!(state.sections.len(), 3);
        assert_eq!(state.sections[1].title(), "Final Stretch");
        assert_eq!(state.max_logs, MAX_LOG_ENTRIES);
        assert!(state.recent_logs.is_empty());
    }

    #[test]
    fn test_refresh_splits_sections() {
        let mut state = AppState::new(&ViewConfig::default(), 10);
        let store = store_with(5);
        assert!(state.refresh(&store));
        assert_eq!(state.sections[0].len(), 5);
        assert_eq!(state.sections[1].len(), 0);
        assert_eq!(state.sections[2].len(), 1);
        assert_eq!(state.token_count, 7);

        // default sort: volume desc
        assert_eq!(state.sections[0].view.rows()[0].id.as_ref(), "n4");

        // unchanged store: nothing recomputed
        assert!(!state.refresh(&store));
    }

    #[test]
    fn test_selection_keeps_row_visible() {
        let mut state = AppState::new(&ViewConfig::default(), 10);
        state.refresh(&store_with(100));

        let section = state.focused_mut();
        section.set_extent(10);
        section.move_selection(25);
        assert_eq!(section.selected, 25);
        assert_eq!(section.viewport.offset, 16);

        let items = section.visible_items();
        assert!(items.iter().any(|i| i.index == 25));
        assert!(items.len() <= 10 + 1 + 2 * 5);

        section.move_selection(-1_000);
        assert_eq!(section.selected, 0);
        assert_eq!(section.viewport.offset, 0);

        section.select_last();
        assert_eq!(section.selected, 99);
        assert_eq!(section.viewport.offset, 90);
    }

    #[test]
    fn test_selection_clamped_after_shrink() {
        let mut state = AppState::new(&ViewConfig::default(), 10);
        let mut store = store_with(50);
        state.refresh(&store);
        state.focused_mut().set_extent(10);
        state.focused_mut().select_last();

        store.replace_all(records(3));
        assert!(state.refresh(&store));
        assert_eq!(state.focused().selected, 2);
        assert_eq!(state.focused().viewport.offset, 0);
    }

    #[test]
    fn test_sort_controls() {
        let mut state = AppState::new(&ViewConfig::default(), 10);
        state.focus_next();
        assert_eq!(state.focus, 1);
        state.focus_prev();
        state.focus_prev();
        assert_eq!(state.focus, 2);

        state.toggle_sort_direction();
        assert_eq!(state.focused().sort().direction, SortDirection::Asc);
        state.cycle_sort_field();
        assert_eq!(state.focused().sort().field, SortField::MarketCap);
        // other sections untouched
        assert_eq!(state.sections[0].sort(), SortConfig::default());
    }

    #[test]
    fn test_chain_filter_cycle_and_reset() {
        let mut eth = token("eth", TokenStatus::New, 1.0);
        eth.chain = Chain::Eth;
        let mut all = records(3);
        all.push(eth);
        let mut store = TokenStore::new();
        store.replace_all(all);

        let mut state = AppState::new(&ViewConfig::default(), 10);
        state.refresh(&store);
        assert_eq!(state.sections[0].len(), 4);

        state.cycle_chain_filter();
        assert_eq!(state.chain_filter, Some(Chain::Sol));
        assert!(state.refresh(&store));
        assert_eq!(state.sections[0].len(), 3);

        state.cycle_chain_filter();
        assert_eq!(state.chain_filter, Some(Chain::Eth));
        assert!(state.refresh(&store));
        assert_eq!(state.sections[0].len(), 1);
        assert!(state.sections.iter().all(|s| s.filters().chains == vec![Chain::Eth]));

        state.cycle_chain_filter();
        state.cycle_chain_filter();
        assert_eq!(state.chain_filter, Some(Chain::Btc));
        state.cycle_chain_filter();
        assert_eq!(state.chain_filter, None);

        state.cycle_chain_filter();
        state.reset_filters();
        assert!(state.refresh(&store));
        assert_eq!(state.sections[0].len(), 4);
        assert_eq!(state.sections[0].filters(), &DisplayFilters::default());

        // no filter change: cached rows reused
        state.reset_filters();
        assert!(!state.refresh(&store));
    }

    #[test]
    fn test_compact_rows_rebuild_offsets() {
        let view_config = ViewConfig {
            row_height: 2,
            ..Default::default()
        };
        let mut state = AppState::new(&view_config, 10);
        state.refresh(&store_with(40));
        let configured = state.focused().row_height();
        assert_eq!(configured, 2);

        let section = state.focused_mut();
        section.set_extent(10);
        section.select_last();
        assert_eq!(section.virtualizer.total_size(), 40 * configured);

        state.toggle_compact_rows();
        let section = state.focused();
        assert_eq!(section.row_height(), 1);
        assert_eq!(section.virtualizer.total_size(), 40);
        assert_eq!(section.viewport.offset, 30);
        assert!(section.visible_items().iter().any(|i| i.index == 39));

        state.toggle_compact_rows();
        assert_eq!(state.focused().row_height(), configured);
        assert_eq!(state.focused().virtualizer.total_size(), 40 * configured);
    }

    #[test]
    fn test_log_rotation() {
        let mut state = AppState::new(&ViewConfig::default(), 20);
        for i in 0..30 {
            state.push_log(LogEntry {
                timestamp: "12:00:00".to_string(),
                level: "INFO".to_string(),
                message: format!("Log {}", i),
            });
        }
        assert_eq!(state.recent_logs.len(), 20);
        assert!(state.recent_logs.front().unwrap().message.contains("10"));
    }

    #[test]
    fn test_uptime_str_format() {
        let state = AppState::new(&ViewConfig::default(), 10);
        let uptime = state.uptime_str();
        assert!(uptime.contains('h'));
        assert!(uptime.contains('m'));
    }
}
