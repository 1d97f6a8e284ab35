//! Configuration types for the board
//!
//! Every section has serde defaults, so an empty YAML document (or no file
//! at all) yields a runnable configuration.

use serde::{Deserialize, Serialize};

use crate::core::projection::{DisplayFilters, SortConfig};
use crate::error::AppError;

use super::constants;

// ============================================================================
// Enums
// ============================================================================

/// Where the initial token list comes from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CatalogSource {
    /// Generated fixture catalogue
    #[default]
    Fixtures,
    /// Another board's `GET /tokens`
    Rest,
}

impl std::fmt::Display for CatalogSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogSource::Fixtures => write!(f, "fixtures"),
            CatalogSource::Rest => write!(f, "rest"),
        }
    }
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Mock tick source settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FeedConfig {
    /// Emission period in milliseconds
    pub interval_ms: u64,
    /// Ticks target `tkn-0` .. `tkn-{candidate_count - 1}`
    pub candidate_count: usize,
    pub price_min: f64,
    pub price_max: f64,
    /// Fixed RNG seed for reproducible runs
    pub seed: Option<u64>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            interval_ms: constants::DEFAULT_TICK_INTERVAL_MS,
            candidate_count: 20,
            price_min: 50.0,
            price_max: 250.0,
            seed: None,
        }
    }
}

impl FeedConfig {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.interval_ms == 0 {
            return Err(AppError::Config("feed.interval_ms must be > 0".to_string()));
        }
        if !self.price_min.is_finite() || !self.price_max.is_finite() || self.price_min < 0.0 {
            return Err(AppError::Config(format!(
                "feed price range must be finite and non-negative (got {}..{})",
                self.price_min, self.price_max
            )));
        }
        if self.price_min > self.price_max {
            return Err(AppError::Config(format!(
                "feed.price_min ({}) must be <= feed.price_max ({})",
                self.price_min, self.price_max
            )));
        }
        Ok(())
    }
}

/// HTTP / WebSocket server settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    pub default_page_size: usize,
    pub max_page_size: usize,
    /// Capacity of the store-change broadcast channel
    pub event_channel_capacity: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: constants::DEFAULT_PORT,
            default_page_size: 20,
            max_page_size: 100,
            event_channel_capacity: constants::DEFAULT_EVENT_CHANNEL_CAPACITY,
        }
    }
}

impl ApiConfig {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.default_page_size == 0 || self.max_page_size == 0 {
            return Err(AppError::Config("api page sizes must be > 0".to_string()));
        }
        if self.default_page_size > self.max_page_size {
            return Err(AppError::Config(format!(
                "api.default_page_size ({}) must be <= api.max_page_size ({})",
                self.default_page_size, self.max_page_size
            )));
        }
        if self.event_channel_capacity == 0 {
            return Err(AppError::Config(
                "api.event_channel_capacity must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Dashboard view settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ViewConfig {
    /// Estimated rows per token entry
    pub row_height: u16,
    /// Extra rows materialised beyond each viewport edge
    pub overscan: usize,
    pub sort: SortConfig,
    pub filters: DisplayFilters,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            row_height: 1,
            overscan: 5,
            sort: SortConfig::default(),
            filters: DisplayFilters::default(),
        }
    }
}

impl ViewConfig {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.row_height == 0 {
            return Err(AppError::Config("view.row_height must be > 0".to_string()));
        }
        let f = &self.filters;
        if f.age_min > f.age_max {
            return Err(AppError::Config(format!(
                "view.filters: ageMin ({}) must be <= ageMax ({})",
                f.age_min, f.age_max
            )));
        }
        Ok(())
    }
}

/// Initial catalogue settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CatalogConfig {
    pub source: CatalogSource,
    /// Base URL of the upstream board when `source: rest`
    pub rest_url: Option<String>,
    /// Fixed seed for fixture generation
    pub seed: Option<u64>,
    /// Simulated network latency for fixtures
    pub latency_ms: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            source: CatalogSource::Fixtures,
            rest_url: None,
            seed: None,
            latency_ms: 300,
        }
    }
}

impl CatalogConfig {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.source == CatalogSource::Rest
            && self.rest_url.as_deref().map_or(true, |u| u.trim().is_empty())
        {
            return Err(AppError::Config(
                "catalog.rest_url is required when catalog.source is 'rest'".to_string(),
            ));
        }
        Ok(())
    }
}

/// Root configuration loaded from YAML
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct AppConfig {
    pub feed: FeedConfig,
    pub api: ApiConfig,
    pub view: ViewConfig,
    pub catalog: CatalogConfig,
}

impl AppConfig {
    /// Validate every section
    pub fn validate(&self) -> Result<(), AppError> {
        self.feed.validate()?;
        self.api.validate()?;
        self.view.validate()?;
        self.catalog.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.feed.candidate_count, 20);
        assert_eq!(config.api.default_page_size, 20);
        assert_eq!(config.view.row_height, 1);
    }

    #[test]
    fn test_feed_price_range_validation() {
        let feed = FeedConfig {
            price_min: 300.0,
            ..Default::default()
        };
        let err = feed.validate().unwrap_err();
        assert!(err.to_string().contains("price_min"));
    }

    #[test]
    fn test_api_page_size_validation() {
        let api = ApiConfig {
            default_page_size: 500,
            ..Default::default()
        };
        assert!(api.validate().is_err());
    }

    #[test]
    fn test_rest_catalog_requires_url() {
        let catalog = CatalogConfig {
            source: CatalogSource::Rest,
            ..Default::default()
        };
        assert!(catalog.validate().is_err());

        let catalog = CatalogConfig {
            source: CatalogSource::Rest,
            rest_url: Some("http://localhost:8080".into()),
            ..Default::default()
        };
        assert!(catalog.validate().is_ok());
    }

    #[test]
    fn test_bind_addr() {
        let api = ApiConfig {
            host: "127.0.0.1".into(),
            port: 9000,
            ..Default::default()
        };
        assert_eq!(api.bind_addr(), "127.0.0.1:9000");
    }
}
