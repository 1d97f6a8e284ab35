//! Pulse Board: real-time token discovery backend
//!
//! - Normalised token store with an incremental price-tick merge step
//! - Mock tick source and feed message boundary
//! - Per-section view projection (filter + stable sort) and list windowing
//! - REST/WebSocket API server and terminal dashboard

pub mod config;
pub mod core;
pub mod error;
pub mod server;
pub mod tui;

pub use error::AppError;
