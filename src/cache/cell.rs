//! Generic TTL-bound cache cell.
//!
//! A cell holds one snapshot behind an `Arc`, the instant it was fetched,
//! and a fixed time-to-live. Freshness is a pure elapsed-time check; the
//! snapshot is replaced wholesale under a write lock, so concurrent readers
//! observe either the entire old or entire new value, never a mix.
//!
//! Repopulation is single-flight: concurrent `get` calls during a stale
//! window share one in-flight populate through a per-cell flight lock with a
//! freshness re-check after acquisition. The state lock is synchronous and
//! never held across an await; only the flight lock spans the populate
//! future.

use std::future::Future;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use metrics::counter;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

use super::lock::{rw_read, rw_write};

const SOURCE: &str = "cache::cell";

const METRIC_CACHE_HIT: &str = "vitrina_cache_hit_total";
const METRIC_CACHE_MISS: &str = "vitrina_cache_miss_total";
const METRIC_CACHE_REFRESH: &str = "vitrina_cache_refresh_total";

struct CellState<T> {
    value: Option<Arc<T>>,
    fetched_at: Option<Instant>,
}

/// A single-value cache cell with TTL-based staleness.
pub struct TtlCell<T> {
    name: &'static str,
    ttl: Duration,
    state: RwLock<CellState<T>>,
    flight: Mutex<()>,
}

impl<T> TtlCell<T> {
    /// Create an empty cell. Nothing is fetched until the first `get` or
    /// `refresh`.
    pub fn new(name: &'static str, ttl: Duration) -> Self {
        Self {
            name,
            ttl,
            state: RwLock::new(CellState {
                value: None,
                fetched_at: None,
            }),
            flight: Mutex::new(()),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return the fresh snapshot, or repopulate through `populate` when the
    /// cell is stale or empty. Populate failures propagate unchanged; the
    /// previous snapshot (if any) is left in place for `peek`.
    pub async fn get<F, Fut, E>(&self, populate: F) -> Result<Arc<T>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(value) = self.fresh_value() {
            counter!(METRIC_CACHE_HIT, "cache" => self.name).increment(1);
            return Ok(value);
        }

        let _flight = self.flight.lock().await;

        // Another caller may have repopulated while this one waited on the
        // flight lock.
        if let Some(value) = self.fresh_value() {
            counter!(METRIC_CACHE_HIT, "cache" => self.name).increment(1);
            debug!(cache = self.name, "populated by shared in-flight fetch");
            return Ok(value);
        }

        counter!(METRIC_CACHE_MISS, "cache" => self.name).increment(1);
        let value = populate().await?;
        Ok(self.store(value))
    }

    /// Repopulate regardless of freshness and swap in the new snapshot.
    pub async fn refresh<F, Fut, E>(&self, populate: F) -> Result<Arc<T>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let _flight = self.flight.lock().await;
        counter!(METRIC_CACHE_REFRESH, "cache" => self.name).increment(1);
        let value = populate().await?;
        Ok(self.store(value))
    }

    /// Mark the cell stale without dropping its snapshot: the next `get`
    /// must repopulate, but `peek` still observes the old value until then.
    pub fn invalidate(&self) {
        rw_write(&self.state, SOURCE, "invalidate").fetched_at = None;
        debug!(cache = self.name, "cell invalidated");
    }

    /// Current snapshot regardless of freshness.
    pub fn peek(&self) -> Option<Arc<T>> {
        rw_read(&self.state, SOURCE, "peek").value.clone()
    }

    pub fn is_fresh(&self) -> bool {
        self.fresh_value().is_some()
    }

    fn fresh_value(&self) -> Option<Arc<T>> {
        let state = rw_read(&self.state, SOURCE, "fresh_value");
        let fetched_at = state.fetched_at?;
        if fetched_at.elapsed() < self.ttl {
            state.value.clone()
        } else {
            None
        }
    }

    fn store(&self, value: T) -> Arc<T> {
        let snapshot = Arc::new(value);
        let mut state = rw_write(&self.state, SOURCE, "store");
        state.value = Some(Arc::clone(&snapshot));
        state.fetched_at = Some(Instant::now());
        snapshot
    }
}
