//! Dashboard rendering
//!
//! Three zones:
//! - Header: store summary and key hints
//! - Board: one column per section, only the virtualized window is drawn
//! - Logs: scrollable log entries

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use crate::core::types::{PriceDirection, TokenRecord};

use super::app::{AppState, Section};

/// Main draw function. Takes `&mut` because each column's viewport
/// follows the terminal size.
pub fn draw(frame: &mut Frame, state: &mut AppState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),  // Header
            Constraint::Min(6),     // Board
            Constraint::Length(10), // Logs
        ])
        .split(frame.area());

    draw_header(frame, chunks[0], state);
    draw_board(frame, chunks[1], state);
    draw_logs(frame, chunks[2], state);
}

fn draw_header(frame: &mut Frame, area: Rect, state: &AppState) {
    let (status_text, status_color) = match (&state.error, state.loading) {
        (Some(error), _) => (format!("✗ {}", error), Color::Red),
        (None, true) => ("… loading".to_string(), Color::Yellow),
        (None, false) => ("● live".to_string(), Color::Green),
    };

    let mut spans = vec![
        Span::styled(
            format!("{} tokens", state.token_count),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::raw("  │  v"),
        Span::styled(state.store_version.to_string(), Style::default().fg(Color::White)),
        Span::raw("  │  "),
        Span::styled(status_text, Style::default().fg(status_color)),
        Span::raw("  │  Uptime: "),
        Span::styled(state.uptime_str(), Style::default().fg(Color::Cyan)),
    ];
    if let Some(chain) = state.chain_filter {
        spans.push(Span::raw("  │  Chain: "));
        spans.push(Span::styled(chain.as_str(), Style::default().fg(Color::Magenta)));
    }
    if state.dropped_logs_count > 0 {
        spans.push(Span::styled(
            format!("  │  {} logs dropped", state.dropped_logs_count),
            Style::default().fg(Color::DarkGray),
        ));
    }

    let header = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Pulse (Tab focus, j/k move, s/d sort, c chain, r reset, v compact, q quit)"),
    );
    frame.render_widget(header, area);
}

fn draw_board(frame: &mut Frame, area: Rect, state: &mut AppState) {
    let count = state.sections.len().max(1) as u32;
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints((0..count).map(|_| Constraint::Ratio(1, count)))
        .split(area);

    let focus = state.focus;
    for (idx, (section, column)) in state.sections.iter_mut().zip(columns.iter()).enumerate() {
        draw_section(frame, *column, section, idx == focus);
    }
}

fn draw_section(frame: &mut Frame, area: Rect, section: &mut Section, focused: bool) {
    let sort = section.sort();
    let arrow = match sort.direction {
        crate::core::projection::SortDirection::Asc => "↑",
        crate::core::projection::SortDirection::Desc => "↓",
    };
    let title = format!("{} ({}) {} {}", section.title(), section.len(), sort.field, arrow);
    let border_style = if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(title);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    section.set_extent(inner.height as usize);
    if section.is_empty() {
        frame.render_widget(
            Paragraph::new(Span::styled("No tokens", Style::default().fg(Color::DarkGray))),
            inner,
        );
        return;
    }

    let offset = section.viewport.offset;
    let window_end = offset + inner.height as usize;
    let rows = section.view.rows();

    for item in section.visible_items() {
        // Overscanned rows are computed but fall outside the frame
        if item.start < offset || item.end() > window_end {
            continue;
        }
        let Some(token) = rows.get(item.index) else {
            continue;
        };
        let rect = Rect {
            x: inner.x,
            y: inner.y + (item.start - offset) as u16,
            width: inner.width,
            height: item.size as u16,
        };
        let selected = focused && item.index == section.selected;
        frame.render_widget(Paragraph::new(token_lines(token, item.size, selected)), rect);
    }
}

/// One board row; the second line only shows when rows are two high.
fn token_lines(token: &TokenRecord, height: usize, selected: bool) -> Vec<Line<'static>> {
    let price_color = match token.last_price_direction {
        PriceDirection::Up => Color::Green,
        PriceDirection::Down => Color::Red,
        PriceDirection::Neutral => Color::White,
    };
    let change_color = if token.price_change_24h >= 0.0 {
        Color::Green
    } else {
        Color::Red
    };
    let base = if selected {
        Style::default().add_modifier(Modifier::REVERSED)
    } else {
        Style::default()
    };

    let mut lines = vec![Line::from(vec![
        Span::styled(
            format!("{:<8}", truncate(&token.symbol, 8)),
            base.fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!(" {:>10}", format!("${:.2}", token.current_price)), base.fg(price_color)),
        Span::styled(format!(" {:>+7.2}%", token.price_change_24h), base.fg(change_color)),
        Span::styled(format!(" V {:>7}", compact(token.volume_24h)), base.fg(Color::Gray)),
    ])];

    if height > 1 {
        lines.push(Line::from(vec![
            Span::styled(format!("{:<8}", token.chain.as_str()), base.fg(Color::DarkGray)),
            Span::styled(format!(" MC {:>7}", compact(token.market_cap)), base.fg(Color::Gray)),
            Span::styled(format!(" L {:>7}", compact(token.liquidity)), base.fg(Color::Gray)),
            Span::styled(format!(" {:>4}m", token.age_minutes), base.fg(Color::DarkGray)),
        ]));
    }
    lines
}

fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// `1234567.0` -> `$1.23M`
fn compact(value: f64) -> String {
    let abs = value.abs();
    if abs >= 1e9 {
        format!("${:.2}B", value / 1e9)
    } else if abs >= 1e6 {
        format!("${:.2}M", value / 1e6)
    } else if abs >= 1e3 {
        format!("${:.1}K", value / 1e3)
    } else {
        format!("${:.0}", value)
    }
}

/// Draw scrollable log panel
fn draw_logs(frame: &mut Frame, area: Rect, state: &AppState) {
    let log_items: Vec<ListItem> = state
        .recent_logs
        .iter()
        .rev() // Most recent first
        .skip(state.log_scroll_offset)
        .take(area.height.saturating_sub(2) as usize)
        .map(|entry| {
            let level_color = match entry.level.as_str() {
                "ERROR" => Color::Red,
                "WARN" => Color::Yellow,
                "INFO" => Color::Cyan,
                "DEBUG" => Color::DarkGray,
                _ => Color::White,
            };

            ListItem::new(Line::from(vec![
                Span::styled(&entry.timestamp, Style::default().fg(Color::DarkGray)),
                Span::raw(" "),
                Span::styled(format!("{:5}", entry.level), Style::default().fg(level_color)),
                Span::raw(" "),
                Span::raw(&entry.message),
            ]))
        })
        .collect();

    let debug_indicator = if state.show_debug_logs { " [DEBUG ON]" } else { "" };
    let title = format!("Logs ([/] scroll, L=debug){}", debug_indicator);

    let logs = List::new(log_items).block(Block::default().borders(Borders::ALL).title(title));
    frame.render_widget(logs, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ViewConfig;
    use crate::core::store::TokenStore;
    use crate::core::types::test_support::token;
    use crate::core::types::TokenStatus;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn render(state: &mut AppState, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|frame| draw(frame, state)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_compact() {
        assert_eq!(compact(950.0), "$950");
        assert_eq!(compact(12_300.0), "$12.3K");
        assert_eq!(compact(4_560_000.0), "$4.56M");
        assert_eq!(compact(2_000_000_000.0), "$2.00B");
    }

    #[test]
    fn test_only_visible_rows_drawn() {
        let mut store = TokenStore::new();
        store.replace_all(
            (0..100)
                .map(|i| token(&format!("row{:03}", i), TokenStatus::New, 1.0))
                .collect(),
        );
        let mut state = AppState::new(&ViewConfig::default(), 10);
        state.refresh(&store);

        let screen = render(&mut state, 150, 40);
        assert!(screen.contains("ROW000"));
        assert!(screen.contains("New Pairs (100)"));
        assert!(!screen.contains("ROW099"));
        // 40 - header 3 - logs 10 - borders 2
        assert_eq!(state.sections[0].viewport.extent, 25);
        assert!(screen.contains("No tokens"));
    }

    #[test]
    fn test_scrolled_window_follows_selection() {
        let mut store = TokenStore::new();
        store.replace_all(
            (0..100)
                .map(|i| token(&format!("row{:03}", i), TokenStatus::New, 1.0))
                .collect(),
        );
        let mut state = AppState::new(&ViewConfig::default(), 10);
        state.refresh(&store);
        render(&mut state, 150, 40);

        state.focused_mut().select_last();
        let screen = render(&mut state, 150, 40);
        assert!(screen.contains("ROW099"));
        assert!(!screen.contains("ROW000"));
    }
}
