//! Configuration loader for YAML files
//!
//! Load order: built-in defaults, then the YAML file, then environment
//! overrides from [`super::constants`].

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use tracing::warn;

use crate::error::AppError;

use super::constants;
use super::types::AppConfig;

/// Load configuration from a YAML file
///
/// # Returns
/// * `Ok(AppConfig)` - Successfully loaded and validated configuration
/// * `Err(AppError)` - File not found, parse error, or validation failure
pub fn load_config(path: &Path) -> Result<AppConfig, AppError> {
    if !path.exists() {
        return Err(AppError::Config(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let file = File::open(path)?;
    let reader = BufReader::new(file);

    let mut config: AppConfig = serde_yaml::from_reader(reader).map_err(|e| {
        AppError::Config(format!("YAML parse error in '{}': {}", path.display(), e))
    })?;

    apply_env_overrides(&mut config);
    config.validate()?;

    Ok(config)
}

/// Like [`load_config`], but a missing file yields the defaults (with a
/// warning). Parse and validation errors still fail.
pub fn load_config_or_default(path: &Path) -> Result<AppConfig, AppError> {
    if !path.exists() {
        warn!(
            path = %path.display(),
            "Configuration file not found, using defaults"
        );
        let mut config = AppConfig::default();
        apply_env_overrides(&mut config);
        config.validate()?;
        return Ok(config);
    }
    load_config(path)
}

/// Load configuration from a YAML string (useful for testing)
pub fn load_config_from_str(yaml_content: &str) -> Result<AppConfig, AppError> {
    let config: AppConfig = serde_yaml::from_str(yaml_content)
        .map_err(|e| AppError::Config(format!("YAML parse error: {}", e)))?;

    config.validate()?;

    Ok(config)
}

fn apply_env_overrides(config: &mut AppConfig) {
    if let Some(port) = constants::port_override() {
        config.api.port = port;
    }
    if let Some(ms) = constants::tick_interval_override() {
        config.feed.interval_ms = ms;
    }
    if let Some(capacity) = constants::event_channel_capacity_override() {
        config.api.event_channel_capacity = capacity;
    }
}

// ============================================================================
// Tests
// ============================================================================
