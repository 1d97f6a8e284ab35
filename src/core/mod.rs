//! Core module - token store, tick merge, feed pipeline, projection, windowing
//!
//! This module uses **explicit re-exports** instead of glob exports
//! (`pub use module::*`) so the public API only grows deliberately.
//!
//! ## Usage
//! Prefer importing from `crate::core`:
//! ```ignore
//! use pulse_board::core::{TokenStore, ViewSpec, project_store};
//! ```

pub mod envelope;
pub mod events;
pub mod fixtures;
pub mod loader;
pub mod pipeline;
pub mod projection;
pub mod store;
pub mod ticker;
pub mod types;
pub mod window;

// Explicit re-exports for types module
pub use types::{current_time_ms, Chain, PriceDirection, TokenRecord, TokenStatus};

// Explicit re-exports for store module
pub use store::{read_store, write_store, ChangeKind, ChangeSet, SharedStore, TokenStore};

// Explicit re-exports for events module
pub use events::{BroadcastEvent, FeedError, FeedMessage, PriceTick};

// Explicit re-exports for ticker module
pub use ticker::{MockTickSource, TickHandle, DEFAULT_TICK_INTERVAL};

// Explicit re-exports for pipeline module
pub use pipeline::{FeedPipeline, PipelineStats};

// Explicit re-exports for projection module
pub use projection::{
    locale_compare, project, project_store, CatalogQuery, DisplayFilters, Page, SectionView,
    SortConfig, SortDirection, SortField, ViewSpec, DEFAULT_PAGE_SIZE,
};

// Explicit re-exports for window module
pub use window::{ScrollAlign, ScrollContainer, Viewport, VirtualItem, Virtualizer};

// Explicit re-exports for loader module
pub use loader::{load_into, loader_from_config, FixtureLoader, RestLoader, TokenLoader};

// Explicit re-exports for envelope module
pub use envelope::{ApiResponse, ErrorBody, ResponseMeta};
