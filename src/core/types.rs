//! Core data types for the token board.
//!
//! `TokenRecord` is the unit stored by [`TokenStore`](crate::core::store::TokenStore)
//! and served over the API. The JSON shape uses camelCase keys so the board
//! can talk to the existing web front-end unchanged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

// =============================================================================
// Enums
// =============================================================================

/// Lifecycle stage of a token listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TokenStatus {
    New,
    FinalStretch,
    Migrated,
    Graduated,
}

impl TokenStatus {
    pub const ALL: [TokenStatus; 4] = [
        TokenStatus::New,
        TokenStatus::FinalStretch,
        TokenStatus::Migrated,
        TokenStatus::Graduated,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TokenStatus::New => "new",
            TokenStatus::FinalStretch => "final-stretch",
            TokenStatus::Migrated => "migrated",
            TokenStatus::Graduated => "graduated",
        }
    }
}

impl fmt::Display for TokenStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TokenStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TokenStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown token status '{}'", s))
    }
}

/// Blockchain network a token lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Chain {
    Sol,
    Eth,
    Base,
    Btc,
}

impl Chain {
    pub const ALL: [Chain; 4] = [Chain::Sol, Chain::Eth, Chain::Base, Chain::Btc];

    pub fn as_str(&self) -> &'static str {
        match self {
            Chain::Sol => "SOL",
            Chain::Eth => "ETH",
            Chain::Base => "BASE",
            Chain::Btc => "BTC",
        }
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Chain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Chain::ALL
            .into_iter()
            .find(|chain| chain.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown chain '{}'", s))
    }
}

/// Direction of the most recent price move, used for flash animations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceDirection {
    Up,
    Down,
    #[default]
    Neutral,
}

impl PriceDirection {
    /// Derive the direction from two consecutive prices.
    ///
    /// `previous == None` is a first observation and always yields `Neutral`.
    #[inline]
    pub fn between(previous: Option<f64>, next: f64) -> Self {
        match previous {
            Some(prev) if next > prev => PriceDirection::Up,
            Some(prev) if next < prev => PriceDirection::Down,
            _ => PriceDirection::Neutral,
        }
    }
}

// =============================================================================
// Token Record
// =============================================================================

/// One tradable asset listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRecord {
    /// Unique identifier (e.g. "tkn-3")
    pub id: Arc<str>,
    pub symbol: String,
    pub name: String,
    pub contract_address: String,
    pub chain: Chain,
    pub status: TokenStatus,

    // Price data
    /// USD price
    pub current_price: f64,
    /// Percent change over 24h (can be negative)
    pub price_change_24h: f64,
    pub volume_24h: f64,
    pub market_cap: f64,
    /// Liquidity in USD
    pub liquidity: f64,

    // Holder metrics
    pub age_minutes: u32,
    pub top10_holders_percent: f64,
    pub dev_holding_percent: f64,
    pub snipers_percent: f64,
    pub insiders_percent: f64,

    // Metadata
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub launchpad: Option<String>,

    // Real-time state (animations only)
    #[serde(default)]
    pub last_price_direction: PriceDirection,
    #[serde(default, rename = "lastUpdateTime", skip_serializing_if = "Option::is_none")]
    pub last_update_ms: Option<u64>,
}

impl TokenRecord {
    /// Check the record invariants: non-empty id, finite metrics,
    /// non-negative amounts and 0–100 holder percentages.
    pub fn validate(&self) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("token id cannot be empty".to_string());
        }

        let amounts = [
            ("currentPrice", self.current_price),
            ("volume24h", self.volume_24h),
            ("marketCap", self.market_cap),
            ("liquidity", self.liquidity),
        ];
        for (field, value) in amounts {
            if !value.is_finite() || value < 0.0 {
                return Err(format!(
                    "token '{}': {} must be a finite non-negative number (got {})",
                    self.id, field, value
                ));
            }
        }

        if !self.price_change_24h.is_finite() {
            return Err(format!(
                "token '{}': priceChange24h must be finite (got {})",
                self.id, self.price_change_24h
            ));
        }

        let percents = [
            ("top10HoldersPercent", self.top10_holders_percent),
            ("devHoldingPercent", self.dev_holding_percent),
            ("snipersPercent", self.snipers_percent),
            ("insidersPercent", self.insiders_percent),
        ];
        for (field, value) in percents {
            if !(0.0..=100.0).contains(&value) {
                return Err(format!(
                    "token '{}': {} must be within 0-100 (got {})",
                    self.id, field, value
                ));
            }
        }

        Ok(())
    }
}

// =============================================================================
// Utility
// =============================================================================

/// Get current time in milliseconds since epoch.
#[inline]
pub fn current_time_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Minimal valid record for tests.
    pub fn token(id: &str, status: TokenStatus, price: f64) -> TokenRecord {
        TokenRecord {
            id: Arc::from(id),
            symbol: id.to_uppercase(),
            name: format!("Token {}", id),
            contract_address: format!("0x{:0>40}", id.len()),
            chain: Chain::Sol,
            status,
            current_price: price,
            price_change_24h: 0.0,
            volume_24h: 1_000.0,
            market_cap: 100_000.0,
            liquidity: 5_000.0,
            age_minutes: 10,
            top10_holders_percent: 30.0,
            dev_holding_percent: 5.0,
            snipers_percent: 2.0,
            insiders_percent: 4.0,
            logo: None,
            created_at: DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap_or_default(),
            launchpad: Some("pump.fun".to_string()),
            last_price_direction: PriceDirection::Neutral,
            last_update_ms: None,
        }
    }
}
