//! Feed message boundary and outbound broadcast events.
//!
//! Inbound feed frames are JSON objects tagged by `type`:
//!
//! ```json
//! { "type": "price_update", "timestamp": "...", "payload": { "tokenId": "tkn-3", "price": 101.5 } }
//! ```
//!
//! They are parsed into the closed [`FeedMessage`] enum and validated here,
//! before anything reaches the store.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::store::{ChangeSet, TokenStore};
use crate::core::types::{TokenRecord, TokenStatus};

// =============================================================================
// Errors
// =============================================================================

#[derive(Error, Debug)]
pub enum FeedError {
    #[error("Malformed feed message: {0}")]
    Malformed(String),

    #[error("Unknown feed message type: {0}")]
    UnknownType(String),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),
}

// =============================================================================
// Price Tick
// =============================================================================

/// A single price update for one token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceTick {
    pub token_id: String,
    pub price: f64,
    /// New 24h change; `None` keeps the stored value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_24h: Option<f64>,
    /// New 24h volume; `None` keeps the stored value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_24h: Option<f64>,
}

impl PriceTick {
    pub fn new(token_id: impl Into<String>, price: f64) -> Self {
        Self {
            token_id: token_id.into(),
            price,
            change_24h: None,
            volume_24h: None,
        }
    }

    fn validate(&self) -> Result<(), FeedError> {
        if self.token_id.trim().is_empty() {
            return Err(FeedError::InvalidRecord("tokenId cannot be empty".into()));
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(FeedError::InvalidRecord(format!(
                "tick for '{}': price must be a finite non-negative number (got {})",
                self.token_id, self.price
            )));
        }
        if let Some(change) = self.change_24h {
            if !change.is_finite() {
                return Err(FeedError::InvalidRecord(format!(
                    "tick for '{}': change24h must be finite",
                    self.token_id
                )));
            }
        }
        if let Some(volume) = self.volume_24h {
            if !volume.is_finite() || volume < 0.0 {
                return Err(FeedError::InvalidRecord(format!(
                    "tick for '{}': volume24h must be a finite non-negative number (got {})",
                    self.token_id, volume
                )));
            }
        }
        Ok(())
    }
}

// =============================================================================
// Feed Message
// =============================================================================

/// Validated inbound feed message.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedMessage {
    PriceUpdate(PriceTick),
    NewToken(TokenRecord),
    StatusChange {
        token_id: String,
        old_status: TokenStatus,
        new_status: TokenStatus,
    },
    BulkLoad(Vec<TokenRecord>),
    /// Token delisted
    TokenRemoved {
        token_id: String,
    },
    ClearTokens,
    Error {
        message: String,
    },
}

#[derive(Deserialize)]
struct RawFeedMessage {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    payload: serde_json::Value,
}

#[derive(Deserialize)]
struct NewTokenPayload {
    token: TokenRecord,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatusChangePayload {
    token_id: String,
    old_status: TokenStatus,
    new_status: TokenStatus,
}

#[derive(Deserialize)]
struct BulkLoadPayload {
    tokens: Vec<TokenRecord>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenRemovedPayload {
    token_id: String,
}

#[derive(Deserialize)]
struct ErrorPayload {
    message: String,
}

fn payload<T: serde::de::DeserializeOwned>(kind: &str, value: serde_json::Value) -> Result<T, FeedError> {
    serde_json::from_value(value).map_err(|e| FeedError::Malformed(format!("{} payload: {}", kind, e)))
}

impl FeedMessage {
    /// Parse and validate a raw JSON frame.
    pub fn parse(raw: &str) -> Result<Self, FeedError> {
        let raw: RawFeedMessage =
            serde_json::from_str(raw).map_err(|e| FeedError::Malformed(e.to_string()))?;

        let message = match raw.kind.as_str() {
            "price_update" => FeedMessage::PriceUpdate(payload(&raw.kind, raw.payload)?),
            "new_token" => {
                let p: NewTokenPayload = payload(&raw.kind, raw.payload)?;
                FeedMessage::NewToken(p.token)
            }
            "status_change" => {
                let p: StatusChangePayload = payload(&raw.kind, raw.payload)?;
                FeedMessage::StatusChange {
                    token_id: p.token_id,
                    old_status: p.old_status,
                    new_status: p.new_status,
                }
            }
            "bulk_load" => {
                let p: BulkLoadPayload = payload(&raw.kind, raw.payload)?;
                FeedMessage::BulkLoad(p.tokens)
            }
            "token_removed" => {
                let p: TokenRemovedPayload = payload(&raw.kind, raw.payload)?;
                FeedMessage::TokenRemoved { token_id: p.token_id }
            }
            "clear_tokens" => FeedMessage::ClearTokens,
            "error" => {
                let p: ErrorPayload = payload(&raw.kind, raw.payload)?;
                FeedMessage::Error { message: p.message }
            }
            other => return Err(FeedError::UnknownType(other.to_string())),
        };

        message.validate()?;
        Ok(message)
    }

    fn validate(&self) -> Result<(), FeedError> {
        match self {
            FeedMessage::PriceUpdate(tick) => tick.validate(),
            FeedMessage::NewToken(token) => token.validate().map_err(FeedError::InvalidRecord),
            FeedMessage::StatusChange { token_id, .. } | FeedMessage::TokenRemoved { token_id }
                if token_id.trim().is_empty() =>
            {
                Err(FeedError::InvalidRecord("tokenId cannot be empty".into()))
            }
            FeedMessage::StatusChange { .. } | FeedMessage::TokenRemoved { .. } => Ok(()),
            FeedMessage::BulkLoad(tokens) => tokens
                .iter()
                .try_for_each(|t| t.validate())
                .map_err(FeedError::InvalidRecord),
            FeedMessage::ClearTokens | FeedMessage::Error { .. } => Ok(()),
        }
    }

    /// Message type label used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            FeedMessage::PriceUpdate(_) => "price_update",
            FeedMessage::NewToken(_) => "new_token",
            FeedMessage::StatusChange { .. } => "status_change",
            FeedMessage::BulkLoad(_) => "bulk_load",
            FeedMessage::TokenRemoved { .. } => "token_removed",
            FeedMessage::ClearTokens => "clear_tokens",
            FeedMessage::Error { .. } => "error",
        }
    }

    /// Merge the message into the store.
    ///
    /// An `error` message is recorded as a load failure and produces no
    /// change set.
    pub fn apply(self, store: &mut TokenStore) -> Option<ChangeSet> {
        match self {
            FeedMessage::PriceUpdate(tick) => store.apply_tick(&tick),
            FeedMessage::NewToken(token) => store.insert(token),
            FeedMessage::StatusChange {
                token_id,
                new_status,
                ..
            } => store.set_status(&token_id, new_status),
            FeedMessage::BulkLoad(tokens) => Some(store.replace_all(tokens)),
            FeedMessage::TokenRemoved { token_id } => store.remove(&token_id),
            FeedMessage::ClearTokens if store.is_empty() => None,
            FeedMessage::ClearTokens => Some(store.clear()),
            FeedMessage::Error { message } => {
                store.fail_load(message);
                None
            }
        }
    }
}

// =============================================================================
// Broadcast Event (outbound to WebSocket clients)
// =============================================================================

/// Events broadcast to WebSocket clients.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum BroadcastEvent {
    /// Fresh state of a token after a tick
    #[serde(rename = "token_updated")]
    TokenUpdated(TokenRecord),
    /// Any other store mutation
    #[serde(rename = "changes")]
    Changes(ChangeSet),
    /// Bulk load or upstream feed failure
    #[serde(rename = "load_error")]
    LoadError { message: String },
}
