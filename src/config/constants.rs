//! Application-wide constants and configuration defaults
//!
//! Values can be overridden via environment variables; an override wins
//! over both the built-in default and the YAML file.

use std::str::FromStr;
use std::time::Duration;

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 8080;

/// Default mock tick period
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 1000;

/// Default capacity of the store-change broadcast channel
pub const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 256;

/// Default path of the YAML configuration file
pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.parse().ok())
}

// =============================================================================
// Server
// =============================================================================

/// HTTP port override
///
/// Environment variable: `PORT`
pub fn port_override() -> Option<u16> {
    env_parse("PORT")
}

/// HTTP port (default: 8080)
pub fn port() -> u16 {
    port_override().unwrap_or(DEFAULT_PORT)
}

/// Broadcast channel capacity override
///
/// Environment variable: `EVENT_CHANNEL_CAPACITY`
pub fn event_channel_capacity_override() -> Option<usize> {
    env_parse("EVENT_CHANNEL_CAPACITY")
}

/// Broadcast channel capacity (default: 256 events)
pub fn event_channel_capacity() -> usize {
    event_channel_capacity_override().unwrap_or(DEFAULT_EVENT_CHANNEL_CAPACITY)
}

// =============================================================================
// Feed
// =============================================================================

/// Tick period override in milliseconds
///
/// Environment variable: `TICK_INTERVAL_MS`
pub fn tick_interval_override() -> Option<u64> {
    env_parse("TICK_INTERVAL_MS")
}

/// Tick period (default: 1000ms)
pub fn tick_interval() -> Duration {
    Duration::from_millis(tick_interval_override().unwrap_or(DEFAULT_TICK_INTERVAL_MS))
}

// =============================================================================
// Dashboard
// =============================================================================

/// Maximum log lines kept by the dashboard (default: 50)
///
/// Environment variable: `MAX_LOGS_IN_MEMORY`
pub fn max_logs_in_memory() -> usize {
    env_parse("MAX_LOGS_IN_MEMORY").unwrap_or(50)
}

/// Config file path (default: `config.yaml`)
///
/// Environment variable: `PULSE_CONFIG`
pub fn config_path() -> String {
    std::env::var("PULSE_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string())
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Print the effective environment-derived values at startup
pub fn log_configuration() {
    tracing::info!("=== Pulse Board Configuration ===");
    tracing::info!("  - Config path: {}", config_path());
    tracing::info!("  - Port: {}", port());
    tracing::info!("  - Tick interval: {:?}", tick_interval());
    tracing::info!("  - Event channel capacity: {}", event_channel_capacity());
    tracing::info!("  - Max logs in memory: {}", max_logs_in_memory());
    tracing::info!("=================================");
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial(env)]
    fn test_default_values() {
        std::env::remove_var("PORT");
        std::env::remove_var("TICK_INTERVAL_MS");
        std::env::remove_var("EVENT_CHANNEL_CAPACITY");
        std::env::remove_var("PULSE_CONFIG");

        assert_eq!(port(), 8080);
        assert_eq!(tick_interval(), Duration::from_millis(1000));
        assert_eq!(event_channel_capacity(), 256);
        assert_eq!(config_path(), "config.yaml");
        assert!(port_override().is_none());
    }

    #[test]
    #[serial(env)]
    fn test_env_override() {
        std::env::set_var("TICK_INTERVAL_MS", "250");
        assert_eq!(tick_interval(), Duration::from_millis(250));
        std::env::remove_var("TICK_INTERVAL_MS");
    }

    #[test]
    #[serial(env)]
    fn test_unparseable_env_falls_back() {
        std::env::set_var("PORT", "not-a-port");
        assert_eq!(port(), DEFAULT_PORT);
        std::env::remove_var("PORT");
    }
}
