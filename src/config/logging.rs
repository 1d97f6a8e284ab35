//! Logging configuration
//!
//! Provides configurable JSON/Pretty/TUI logging output
//!
//! # Environment Variables
//! - `LOG_FORMAT`: Output format - `json` (default), `pretty`, or `tui`
//! - `RUST_LOG`: Log level filter (default: `info`)

use tracing_subscriber::EnvFilter;

/// Output format selected by `LOG_FORMAT`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
    Tui,
}

impl LogFormat {
    /// Unknown or missing values fall back to JSON. Case sensitive.
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("pretty") => LogFormat::Pretty,
            Some("tui") => LogFormat::Tui,
            _ => LogFormat::Json,
        }
    }

    pub fn from_env() -> Self {
        Self::parse(std::env::var("LOG_FORMAT").ok().as_deref())
    }
}

/// Check if TUI mode is requested
///
/// When TUI mode is requested, caller should initialize logging manually
/// with the `TuiLayer`.
pub fn is_tui_mode() -> bool {
    LogFormat::from_env() == LogFormat::Tui
}

/// `RUST_LOG` filter, defaulting to `info`
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initialize logging with configurable format
///
/// - `json` (default): Machine-parseable JSON output
/// - `pretty`: Human-readable output for development
/// - `tui`: Skip initialization (caller sets up `TuiLayer` manually)
pub fn init_logging() {
    match LogFormat::from_env() {
        LogFormat::Pretty => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .pretty()
                .init();
        }
        LogFormat::Tui => {
            // main.rs installs the subscriber with TuiLayer; logs are dropped
            // until it does.
            debug_assert!(
                false,
                "init_logging() called in TUI mode, subscriber must be set up by caller via TuiLayer"
            );
        }
        LogFormat::Json => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .json()
                .init();
        }
    }
}

#[cfg(test)]
mod tests {
    // tracing_subscriber can only be initialized once per process, so
    // init_logging() itself is exercised by running the binary:
    //   `LOG_FORMAT=json cargo run 2>&1 | head -1 | jq .`
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_log_format_parse() {
        let cases = [
            (None, LogFormat::Json),
            (Some("json"), LogFormat::Json),
            (Some("pretty"), LogFormat::Pretty),
            (Some("tui"), LogFormat::Tui),
            (Some("PRETTY"), LogFormat::Json),
            (Some(""), LogFormat::Json),
        ];
        for (input, expected) in cases {
            assert_eq!(LogFormat::parse(input), expected, "input: {:?}", input);
        }
    }

    #[test]
    #[serial(env)]
    fn test_is_tui_mode_reads_env() {
        std::env::set_var("LOG_FORMAT", "tui");
        assert!(is_tui_mode());
        std::env::set_var("LOG_FORMAT", "pretty");
        assert!(!is_tui_mode());
        std::env::remove_var("LOG_FORMAT");
        assert!(!is_tui_mode());
    }
}
