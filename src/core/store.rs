//! Token store: normalised token state plus the price-tick merge step.
//!
//! Holds `HashMap<id, TokenRecord>` for O(1) lookup and an explicit ordered
//! id list for stable iteration. Every mutation that changes state bumps a
//! version counter and returns a [`ChangeSet`] naming the touched ids, so
//! observers can decide what to recompute without deep-diffing.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::Serialize;
use tracing::warn;

use crate::core::events::PriceTick;
use crate::core::types::{current_time_ms, PriceDirection, TokenRecord, TokenStatus};

/// Store shared between the tick pipeline, the API server and the dashboard.
///
/// The lock is never held across an `.await`.
pub type SharedStore = Arc<RwLock<TokenStore>>;

/// Shared read access. A poisoned lock still yields the last written state.
pub fn read_store(store: &SharedStore) -> RwLockReadGuard<'_, TokenStore> {
    store.read().unwrap_or_else(|poisoned| {
        warn!("Token store lock poisoned, serving last written state");
        PoisonError::into_inner(poisoned)
    })
}

/// Exclusive write access, tolerating a poisoned lock like [`read_store`].
pub fn write_store(store: &SharedStore) -> RwLockWriteGuard<'_, TokenStore> {
    store.write().unwrap_or_else(|poisoned| {
        warn!("Token store lock poisoned, continuing with last written state");
        PoisonError::into_inner(poisoned)
    })
}

/// What kind of mutation produced a [`ChangeSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Replaced,
    Updated,
    Inserted,
    Removed,
    StatusChanged,
    Cleared,
}

/// Changed-keys diff returned by every state-changing store operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeSet {
    /// Store version after the change
    pub version: u64,
    pub kind: ChangeKind,
    /// Ids whose records changed (for `Replaced`/`Cleared`: the whole new/old set)
    pub ids: Vec<Arc<str>>,
}

/// Authoritative in-memory token set.
#[derive(Debug, Default)]
pub struct TokenStore {
    /// id → record
    items: HashMap<Arc<str>, TokenRecord>,
    /// Ordered ids (newest inserts first)
    ids: Vec<Arc<str>>,
    loading: bool,
    error: Option<String>,
    /// Monotonic mutation counter
    version: u64,
    /// Monotonic wall-clock stamp of the last mutation
    last_update_ms: u64,
}

impl TokenStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a store for sharing across tasks.
    pub fn shared(self) -> SharedStore {
        Arc::new(RwLock::new(self))
    }

    // -------------------------------------------------------------------------
    // Mutations
    // -------------------------------------------------------------------------

    /// Replace the whole token set.
    ///
    /// Duplicate ids collapse last-write-wins in the mapping and keep the
    /// position of their first occurrence in the ordered list.
    pub fn replace_all(&mut self, records: Vec<TokenRecord>) -> ChangeSet {
        let mut items = HashMap::with_capacity(records.len());
        let mut ids = Vec::with_capacity(records.len());

        for mut record in records {
            // First observation for this generation
            record.last_price_direction = PriceDirection::Neutral;
            if !items.contains_key(&record.id) {
                ids.push(record.id.clone());
            }
            items.insert(record.id.clone(), record);
        }

        self.items = items;
        self.ids = ids;
        self.loading = false;
        self.error = None;

        let ids = self.ids.clone();
        self.change(ChangeKind::Replaced, ids)
    }

    /// Merge a price tick into an existing record.
    ///
    /// Returns `None` when the id is unknown: ticks may race ahead of a
    /// delisting, so they are dropped rather than reported.
    pub fn apply_price_tick(
        &mut self,
        id: &str,
        price: f64,
        change_24h: f64,
        volume_24h: f64,
    ) -> Option<ChangeSet> {
        let now = self.next_timestamp();
        let record = self.items.get_mut(id)?;

        record.last_price_direction =
            PriceDirection::between(Some(record.current_price), price);
        record.current_price = price;
        record.price_change_24h = change_24h;
        record.volume_24h = volume_24h;
        record.last_update_ms = Some(now);

        let key = record.id.clone();
        Some(self.change_at(ChangeKind::Updated, vec![key], now))
    }

    /// Merge a [`PriceTick`], keeping the current 24h change / volume for
    /// any field the tick leaves out.
    pub fn apply_tick(&mut self, tick: &PriceTick) -> Option<ChangeSet> {
        let (change_24h, volume_24h) = {
            let current = self.items.get(tick.token_id.as_str())?;
            (
                tick.change_24h.unwrap_or(current.price_change_24h),
                tick.volume_24h.unwrap_or(current.volume_24h),
            )
        };
        self.apply_price_tick(&tick.token_id, tick.price, change_24h, volume_24h)
    }

    /// Insert a record if its id is not already present. New ids are
    /// prepended to the ordered list.
    pub fn insert(&mut self, mut record: TokenRecord) -> Option<ChangeSet> {
        if self.items.contains_key(&record.id) {
            return None;
        }
        record.last_price_direction = PriceDirection::Neutral;
        let key = record.id.clone();
        self.ids.insert(0, key.clone());
        self.items.insert(key.clone(), record);
        Some(self.change(ChangeKind::Inserted, vec![key]))
    }

    /// Remove a record. No-op if absent.
    pub fn remove(&mut self, id: &str) -> Option<ChangeSet> {
        let (key, _) = self.items.remove_entry(id)?;
        self.ids.retain(|existing| existing.as_ref() != id);
        Some(self.change(ChangeKind::Removed, vec![key]))
    }

    /// Move a record to another lifecycle stage. No-op if absent or unchanged.
    pub fn set_status(&mut self, id: &str, status: TokenStatus) -> Option<ChangeSet> {
        let now = self.next_timestamp();
        let record = self.items.get_mut(id)?;
        if record.status == status {
            return None;
        }
        record.status = status;
        record.last_update_ms = Some(now);
        let key = record.id.clone();
        Some(self.change_at(ChangeKind::StatusChanged, vec![key], now))
    }

    /// Drop every record.
    pub fn clear(&mut self) -> ChangeSet {
        let removed = std::mem::take(&mut self.ids);
        self.items.clear();
        self.change(ChangeKind::Cleared, removed)
    }

    /// Mark a bulk load as in flight.
    pub fn begin_load(&mut self) {
        self.loading = true;
        self.error = None;
    }

    /// Record a bulk load failure. Existing data is left untouched.
    pub fn fail_load(&mut self, message: impl Into<String>) {
        self.loading = false;
        self.error = Some(message.into());
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    pub fn get(&self, id: &str) -> Option<&TokenRecord> {
        self.items.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.items.contains_key(id)
    }

    /// Records in id order.
    pub fn iter(&self) -> impl Iterator<Item = &TokenRecord> + '_ {
        self.ids.iter().filter_map(move |id| self.items.get(id))
    }

    /// Owned copy of all records in id order.
    pub fn snapshot(&self) -> Vec<TokenRecord> {
        self.iter().cloned().collect()
    }

    pub fn ids(&self) -> &[Arc<str>] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn last_update_ms(&self) -> u64 {
        self.last_update_ms
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    /// Wall clock, clamped so the store stamp never goes backwards.
    fn next_timestamp(&self) -> u64 {
        current_time_ms().max(self.last_update_ms)
    }

    fn change(&mut self, kind: ChangeKind, ids: Vec<Arc<str>>) -> ChangeSet {
        let now = self.next_timestamp();
        self.change_at(kind, ids, now)
    }

    fn change_at(&mut self, kind: ChangeKind, ids: Vec<Arc<str>>, now: u64) -> ChangeSet {
        self.version += 1;
        self.last_update_ms = now;
        ChangeSet {
            version: self.version,
            kind,
            ids,
        }
    }

    #[cfg(test)]
    fn assert_consistent(&self) {
        assert_eq!(self.ids.len(), self.items.len());
        let unique: std::collections::HashSet<&Arc<str>> = self.ids.iter().collect();
        assert_eq!(unique.len(), self.ids.len(), "duplicate ids in order list");
        assert!(self.ids.iter().all(|id| self.items.contains_key(id)));
    }
}
