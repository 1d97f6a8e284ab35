//! Feed pipeline: the single write path from ticks and feed frames into the
//! store, fanning each resulting change out to WebSocket subscribers.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::core::events::{BroadcastEvent, FeedMessage, PriceTick};
use crate::core::store::{write_store, ChangeSet, SharedStore};

#[derive(Debug, Default)]
struct Counters {
    applied: AtomicU64,
    dropped: AtomicU64,
    rejected: AtomicU64,
    errors: AtomicU64,
}

/// Point-in-time pipeline counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PipelineStats {
    /// Messages that changed the store
    pub applied: u64,
    /// Valid messages that changed nothing (unknown id, duplicate insert, ...)
    pub dropped: u64,
    /// Frames that failed to parse or validate
    pub rejected: u64,
    /// `error` messages reported by the feed
    pub errors: u64,
}

#[derive(Debug, Clone)]
pub struct FeedPipeline {
    store: SharedStore,
    events: broadcast::Sender<BroadcastEvent>,
    counters: Arc<Counters>,
}

impl FeedPipeline {
    pub fn new(store: SharedStore, events: broadcast::Sender<BroadcastEvent>) -> Self {
        Self {
            store,
            events,
            counters: Arc::new(Counters::default()),
        }
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BroadcastEvent> {
        self.events.subscribe()
    }

    // Send errors only mean nobody is subscribed.
    fn publish(&self, event: BroadcastEvent) {
        let _ = self.events.send(event);
    }

    /// Merge one price tick. Unknown ids are dropped.
    pub fn on_tick(&self, tick: PriceTick) -> Option<ChangeSet> {
        let (change, updated) = {
            let mut store = write_store(&self.store);
            match store.apply_tick(&tick) {
                Some(change) => {
                    let updated = store.get(&tick.token_id).cloned();
                    (Some(change), updated)
                }
                None => (None, None),
            }
        };

        match (&change, updated) {
            (Some(_), Some(record)) => {
                self.counters.applied.fetch_add(1, Ordering::Relaxed);
                self.publish(BroadcastEvent::TokenUpdated(record));
            }
            _ => {
                self.counters.dropped.fetch_add(1, Ordering::Relaxed);
                debug!(
                    event_type = "TICK_DROPPED",
                    token_id = %tick.token_id,
                    "Tick for unknown token dropped"
                );
            }
        }
        change
    }

    /// Apply a validated feed message.
    pub fn ingest(&self, message: FeedMessage) -> Option<ChangeSet> {
        let kind = message.kind();
        match message {
            FeedMessage::PriceUpdate(tick) => self.on_tick(tick),
            FeedMessage::Error { message } => {
                warn!(event_type = "FEED_ERROR", error = %message, "Feed reported an error");
                write_store(&self.store).fail_load(message.clone());
                self.counters.errors.fetch_add(1, Ordering::Relaxed);
                self.publish(BroadcastEvent::LoadError { message });
                None
            }
            other => {
                let change = other.apply(&mut write_store(&self.store));
                match &change {
                    Some(change) => {
                        self.counters.applied.fetch_add(1, Ordering::Relaxed);
                        self.publish(BroadcastEvent::Changes(change.clone()));
                    }
                    None => {
                        self.counters.dropped.fetch_add(1, Ordering::Relaxed);
                        debug!(event_type = "FEED_NOOP", kind = kind, "Feed message changed nothing");
                    }
                }
                change
            }
        }
    }

    /// Parse, validate and apply a raw JSON frame. Malformed frames are
    /// logged and discarded without touching the store.
    pub fn ingest_raw(&self, raw: &str) -> Option<ChangeSet> {
        match FeedMessage::parse(raw) {
            Ok(message) => self.ingest(message),
            Err(e) => {
                self.counters.rejected.fetch_add(1, Ordering::Relaxed);
                warn!(event_type = "FEED_REJECTED", error = %e, "Discarding feed frame");
                None
            }
        }
    }

    /// Callback for [`crate::core::ticker::MockTickSource::spawn`].
    pub fn tick_callback(&self) -> impl FnMut(PriceTick) + Send + 'static {
        let pipeline = self.clone();
        move |tick| {
            pipeline.on_tick(tick);
        }
    }

    pub fn stats(&self) -> PipelineStats {
        PipelineStats {
            applied: self.counters.applied.load(Ordering::Relaxed),
            dropped: self.counters.dropped.load(Ordering::Relaxed),
            rejected: self.counters.rejected.load(Ordering::Relaxed),
            errors: self.counters.errors.load(Ordering::Relaxed),
        }
    }
}
