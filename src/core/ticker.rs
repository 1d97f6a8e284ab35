//! Mock tick source.
//!
//! Once per period, picks one candidate token id uniformly at random and
//! emits a new price drawn uniformly from a fixed range. The new price is
//! independent of the previous one; this stands in for a live feed and can
//! be swapped out without touching the store's merge contract.

use std::ops::Range;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::FeedConfig;
use crate::core::events::PriceTick;

/// Default emission period.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(1000);

/// Configuration + RNG for the mock feed.
#[derive(Debug)]
pub struct MockTickSource {
    period: Duration,
    candidates: Vec<String>,
    price_range: Range<f64>,
    rng: StdRng,
}

impl MockTickSource {
    /// `tkn-0` .. `tkn-{candidate_count - 1}`, prices in `50..250`.
    pub fn new(candidate_count: usize) -> Self {
        Self {
            period: DEFAULT_TICK_INTERVAL,
            candidates: (0..candidate_count).map(|i| format!("tkn-{}", i)).collect(),
            price_range: 50.0..250.0,
            rng: StdRng::from_entropy(),
        }
    }

    pub fn from_config(config: &FeedConfig) -> Self {
        let source = Self::new(config.candidate_count)
            .with_period(Duration::from_millis(config.interval_ms))
            .with_price_range(config.price_min..config.price_max);
        match config.seed {
            Some(seed) => source.with_seed(seed),
            None => source,
        }
    }

    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    pub fn with_price_range(mut self, range: Range<f64>) -> Self {
        self.price_range = range;
        self
    }

    pub fn with_candidates(mut self, candidates: Vec<String>) -> Self {
        self.candidates = candidates;
        self
    }

    /// Deterministic RNG for reproducible runs.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Draw the next tick. `None` if there are no candidates.
    pub fn next_tick(&mut self) -> Option<PriceTick> {
        if self.candidates.is_empty() {
            return None;
        }
        let idx = self.rng.gen_range(0..self.candidates.len());
        let raw = if self.price_range.is_empty() {
            self.price_range.start
        } else {
            self.rng.gen_range(self.price_range.clone())
        };
        let price = (raw * 100.0).round() / 100.0;
        Some(PriceTick::new(self.candidates[idx].clone(), price))
    }

    /// Run the source on the tokio runtime, calling `on_tick` once per period.
    ///
    /// The first tick fires one full period after spawning.
    pub fn spawn<F>(mut self, mut on_tick: F) -> TickHandle
    where
        F: FnMut(PriceTick) + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let period = self.period;

        let task = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // interval() completes its first tick immediately
            ticker.tick().await;

            info!(
                candidates = self.candidates.len(),
                period_ms = period.as_millis() as u64,
                "Mock tick source started"
            );

            let mut emitted: u64 = 0;
            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        match self.next_tick() {
                            Some(tick) => {
                                emitted += 1;
                                debug!(token_id = %tick.token_id, price = tick.price, "Mock tick");
                                on_tick(tick);
                            }
                            None => {
                                warn!("Mock tick source has no candidates, stopping");
                                break;
                            }
                        }
                    }
                }
            }

            info!(emitted = emitted, "Mock tick source stopped");
        });

        TickHandle {
            cancel,
            task: Some(task),
        }
    }
}

/// Handle to a running tick source.
///
/// Dropping the handle cancels the source without waiting for it.
#[derive(Debug)]
pub struct TickHandle {
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl TickHandle {
    /// Stop the source and wait for its task to finish. Once this returns
    /// the callback will not be invoked again. Idempotent.
    pub async fn stop(&mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                if e.is_panic() {
                    warn!(error = %e, "Mock tick source task panicked");
                }
            }
        }
    }

    /// Token cancelled when the source stops, for tying other tasks to it.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }
}

impl Drop for TickHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_next_tick_within_bounds() {
        let mut source = MockTickSource::new(20).with_seed(7);
        for _ in 0..500 {
            let tick = source.next_tick().unwrap();
            assert!(tick.price >= 50.0 && tick.price <= 250.0, "price {}", tick.price);
            let idx: usize = tick.token_id.trim_start_matches("tkn-").parse().unwrap();
            assert!(idx < 20);
            // rounded to cents
            assert!(((tick.price * 100.0).round() - tick.price * 100.0).abs() < 1e-6);
            assert!(tick.change_24h.is_none() && tick.volume_24h.is_none());
        }
    }

    #[test]
    fn test_next_tick_covers_candidates() {
        let mut source = MockTickSource::new(5).with_seed(42);
        let seen: HashSet<String> = (0..500).filter_map(|_| source.next_tick()).map(|t| t.token_id).collect();
        assert_eq!(seen.len(), 5);
    }

    #[test]
    fn test_seeded_sources_are_reproducible() {
        let mut a = MockTickSource::new(20).with_seed(3);
        let mut b = MockTickSource::new(20).with_seed(3);
        for _ in 0..50 {
            assert_eq!(a.next_tick(), b.next_tick());
        }
    }

    #[test]
    fn test_no_candidates() {
        let mut source = MockTickSource::new(0);
        assert!(source.next_tick().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_spawn_emits_once_per_period() {
        let received = Arc::new(Mutex::new(Vec::new()));
        let sink = received.clone();

        let mut handle = MockTickSource::new(20)
            .with_seed(1)
            .with_period(Duration::from_millis(1000))
            .spawn(move |tick| sink.lock().unwrap().push(tick));

        tokio::time::sleep(Duration::from_millis(3500)).await;
        handle.stop().await;

        assert_eq!(received.lock().unwrap().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_ticks_after_stop() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = count.clone();

        let mut handle = MockTickSource::new(20)
            .with_period(Duration::from_millis(10))
            .spawn(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            });

        tokio::time::sleep(Duration::from_millis(105)).await;
        handle.stop().await;
        assert!(!handle.is_running());
        let at_stop = count.load(Ordering::SeqCst);
        assert!(at_stop > 0);

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(count.load(Ordering::SeqCst), at_stop);

        // second stop is a no-op
        handle.stop().await;
        assert_eq!(count.load(Ordering::SeqCst), at_stop);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_source() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = count.clone();

        let handle = MockTickSource::new(3)
            .with_period(Duration::from_millis(10))
            .spawn(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        let token = handle.cancellation_token();
        drop(handle);
        assert!(token.is_cancelled());

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }
}
