//! Configuration module for board settings and YAML loading
//!
//! This module provides:
//! - Configuration types (`AppConfig`, `FeedConfig`, `ApiConfig`, `ViewConfig`, `CatalogConfig`)
//! - YAML loading functionality (`load_config`, `load_config_or_default`)
//! - Logging setup (`logging::init_logging`)
//! - Application constants with environment variable overrides

pub mod constants;
mod loader;
pub mod logging;
mod types;

// Re-export types
pub use types::{ApiConfig, AppConfig, CatalogConfig, CatalogSource, FeedConfig, ViewConfig};

// Re-export loader functions
pub use loader::{load_config, load_config_from_str, load_config_or_default};
