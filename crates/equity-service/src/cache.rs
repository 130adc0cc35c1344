//! Per-symbol TTL cache guarding upstream fetches
//!
//! Each symbol owns an async slot. A lookup holds the slot for the whole
//! fetch, so concurrent misses on one symbol wait for the first caller and
//! then read its result instead of fetching again. Other symbols are not
//! blocked. A failed refresh leaves the previous entry in place and, for
//! retryable errors, hands it back marked stale.

use crate::clock::Clock;
use crate::error::Result;
use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, warn};

/// Where a cached value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Freshness {
    /// Fetched by this call
    Fetched,
    /// Served from a fresh entry
    Cached,
    /// Served from an expired entry because the refresh failed
    Stale,
}

#[derive(Debug, Clone)]
pub struct CachedValue<V> {
    pub value: V,
    pub fetched_at: DateTime<Utc>,
    pub freshness: Freshness,
}

#[derive(Debug, Clone)]
struct Entry<V> {
    value: V,
    fetched_at: DateTime<Utc>,
}

type Slot<V> = Arc<tokio::sync::Mutex<Option<Entry<V>>>>;

/// Expired entries are kept this many TTLs as stale fallbacks before eviction
pub const STALE_RETENTION_FACTOR: i32 = 24;

/// Thread-safe cache keyed by symbol
pub struct SymbolCache<V> {
    ttl: TimeDelta,
    retention: TimeDelta,
    clock: Arc<dyn Clock>,
    slots: Arc<Mutex<HashMap<String, Slot<V>>>>,
}

impl<V: Clone + Send> SymbolCache<V> {
    /// Cache whose entries stay fresh for `ttl`
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        let ttl = TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX);
        Self {
            retention: ttl.checked_mul(STALE_RETENTION_FACTOR).unwrap_or(TimeDelta::MAX),
            ttl,
            clock,
            slots: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn slot(&self, symbol: &str) -> Slot<V> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(slots.entry(symbol.to_string()).or_default())
    }

    fn existing_slot(&self, symbol: &str) -> Option<Slot<V>> {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.get(symbol).cloned()
    }

    fn is_fresh(&self, entry: &Entry<V>) -> bool {
        self.clock.now() - entry.fetched_at < self.ttl
    }

    /// Return the cached value for `symbol`, fetching it when missing or expired
    pub async fn get_or_fetch<F, Fut>(&self, symbol: &str, fetch: F) -> Result<CachedValue<V>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>>,
    {
        let slot = self.slot(symbol);
        let result = self.load(&slot, symbol, fetch).await;
        drop(slot);

        if !matches!(&result, Ok(value) if value.freshness == Freshness::Cached) {
            self.prune();
        }
        result
    }

    async fn load<F, Fut>(&self, slot: &Slot<V>, symbol: &str, fetch: F) -> Result<CachedValue<V>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>>,
    {
        let mut guard = slot.lock().await;

        if let Some(entry) = guard.as_ref().filter(|e| self.is_fresh(e)) {
            debug!(symbol, "Cache hit");
            return Ok(CachedValue {
                value: entry.value.clone(),
                fetched_at: entry.fetched_at,
                freshness: Freshness::Cached,
            });
        }

        debug!(symbol, "Cache miss");
        match fetch().await {
            Ok(value) => {
                let fetched_at = self.clock.now();
                *guard = Some(Entry {
                    value: value.clone(),
                    fetched_at,
                });
                Ok(CachedValue {
                    value,
                    fetched_at,
                    freshness: Freshness::Fetched,
                })
            },
            Err(err) if err.is_retryable() => match guard.as_ref() {
                Some(entry) => {
                    warn!(symbol, error = %err, "Refresh failed, serving stale entry");
                    Ok(CachedValue {
                        value: entry.value.clone(),
                        fetched_at: entry.fetched_at,
                        freshness: Freshness::Stale,
                    })
                },
                None => Err(err),
            },
            Err(err) => Err(err),
        }
    }

    /// Drop idle slots that are empty or past the stale retention period
    ///
    /// A slot is idle when only the map references it; callers clone the
    /// slot under the map lock, so an idle slot cannot be picked up while
    /// this runs.
    fn prune(&self) {
        let now = self.clock.now();
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        let before = slots.len();
        slots.retain(|_, slot| {
            if Arc::strong_count(slot) > 1 {
                return true;
            }
            match slot.try_lock() {
                Ok(entry) => entry.as_ref().is_some_and(|e| now - e.fetched_at < self.retention),
                Err(_) => true,
            }
        });
        let evicted = before - slots.len();
        if evicted > 0 {
            debug!(evicted, remaining = slots.len(), "Pruned cache slots");
        }
    }

    /// Current entry without fetching, fresh or not
    pub async fn peek(&self, symbol: &str) -> Option<CachedValue<V>> {
        let slot = self.existing_slot(symbol)?;
        let guard = slot.lock().await;
        guard.as_ref().map(|entry| CachedValue {
            value: entry.value.clone(),
            fetched_at: entry.fetched_at,
            freshness: if self.is_fresh(entry) {
                Freshness::Cached
            } else {
                Freshness::Stale
            },
        })
    }

    /// Drop the entry for `symbol`
    ///
    /// Waits for an in-flight fetch of the symbol, then clears its slot under
    /// the slot lock. Callers already queued keep sharing that lock.
    pub async fn invalidate(&self, symbol: &str) {
        if let Some(slot) = self.existing_slot(symbol) {
            *slot.lock().await = None;
            debug!(symbol, "Cache entry invalidated");
        }
        self.prune();
    }

    /// Clear all cached entries
    pub async fn clear(&self) {
        let slots: Vec<Slot<V>> = {
            let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            slots.values().cloned().collect()
        };
        for slot in slots {
            *slot.lock().await = None;
        }
        self.prune();
    }

    /// Symbols currently holding a slot
    pub fn len(&self) -> usize {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<V> Clone for SymbolCache<V> {
    fn clone(&self) -> Self {
        Self {
            ttl: self.ttl,
            retention: self.retention,
            clock: Arc::clone(&self.clock),
            slots: Arc::clone(&self.slots),
        }
    }
}

impl<V> std::fmt::Debug for SymbolCache<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SymbolCache").field("ttl", &self.ttl).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::error::ServiceError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn setup() -> (Arc<ManualClock>, SymbolCache<u32>) {
        let clock = Arc::new(ManualClock::new(DateTime::from_timestamp(1_700_000_000, 0).unwrap()));
        let cache = SymbolCache::new(Duration::from_secs(3600), clock.clone());
        (clock, cache)
    }

    #[tokio::test]
    async fn test_hit_within_ttl() {
        let (clock, cache) = setup();
        let calls = &AtomicUsize::new(0);
        let fetch = || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(7)
        };

        let first = cache.get_or_fetch("AAPL", fetch).await.unwrap();
        assert_eq!(first.freshness, Freshness::Fetched);

        clock.advance(TimeDelta::minutes(59));
        let second = cache
            .get_or_fetch("AAPL", || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(8)
            })
            .await
            .unwrap();
        assert_eq!(second.value, 7);
        assert_eq!(second.freshness, Freshness::Cached);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_refetch_after_ttl() {
        let (clock, cache) = setup();
        cache.get_or_fetch("AAPL", || async { Ok(1) }).await.unwrap();

        clock.advance(TimeDelta::hours(1));
        let refreshed = cache.get_or_fetch("AAPL", || async { Ok(2) }).await.unwrap();
        assert_eq!(refreshed.value, 2);
        assert_eq!(refreshed.freshness, Freshness::Fetched);
    }

    #[tokio::test]
    async fn test_stale_entry_served_on_retryable_failure() {
        let (clock, cache) = setup();
        cache.get_or_fetch("MSFT", || async { Ok(5) }).await.unwrap();
        clock.advance(TimeDelta::hours(2));

        let stale = cache
            .get_or_fetch("MSFT", || async { Err(ServiceError::upstream("MSFT", "503")) })
            .await
            .unwrap();
        assert_eq!(stale.value, 5);
        assert_eq!(stale.freshness, Freshness::Stale);

        let err = cache
            .get_or_fetch("MSFT", || async { Err(ServiceError::InvalidSymbol("MSFT".into())) })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidSymbol(_)));
    }

    #[tokio::test]
    async fn test_failure_without_entry_propagates() {
        let (_, cache) = setup();
        let err = cache
            .get_or_fetch("NVDA", || async { Err(ServiceError::upstream("NVDA", "down")) })
            .await
            .unwrap_err();
        assert!(err.is_retryable());
        assert!(cache.peek("NVDA").await.is_none());
    }

    #[tokio::test]
    async fn test_concurrent_misses_fetch_once() {
        let (_, cache) = setup();
        let calls = Arc::new(AtomicUsize::new(0));

        let fetch = |calls: Arc<AtomicUsize>| async move {
            calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok(42)
        };

        let (a, b) = tokio::join!(
            cache.get_or_fetch("TSLA", || fetch(calls.clone())),
            cache.get_or_fetch("TSLA", || fetch(calls.clone())),
        );
        assert_eq!(a.unwrap().value, 42);
        assert_eq!(b.unwrap().value, 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_other_symbols_not_blocked() {
        let (_, cache) = setup();
        let slow = cache.get_or_fetch("SLOW", || async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok(1)
        });
        let fast = async {
            let started = std::time::Instant::now();
            cache.get_or_fetch("FAST", || async { Ok(2) }).await.unwrap();
            started.elapsed()
        };
        let (_, fast_elapsed) = tokio::join!(slow, fast);
        assert!(fast_elapsed < Duration::from_millis(150));
    }

    #[tokio::test]
    async fn test_invalidate_and_clear() {
        let (_, cache) = setup();
        cache.get_or_fetch("A", || async { Ok(1) }).await.unwrap();
        cache.get_or_fetch("B", || async { Ok(2) }).await.unwrap();
        assert_eq!(cache.len(), 2);

        cache.invalidate("A").await;
        assert!(cache.peek("A").await.is_none());
        assert_eq!(cache.peek("B").await.unwrap().value, 2);

        cache.clear().await;
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_invalidate_during_fetch_keeps_fetches_serial() {
        let (_, cache) = setup();
        let calls = Arc::new(AtomicUsize::new(0));
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let fetch = || {
            let (calls, in_flight, peak) = (calls.clone(), in_flight.clone(), peak.clone());
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(100)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
                Ok(1)
            }
        };

        let first = cache.get_or_fetch("AAPL", fetch);
        let second = async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            cache.invalidate("AAPL").await;
            cache.get_or_fetch("AAPL", fetch).await
        };
        let (a, b) = tokio::join!(first, second);

        assert_eq!(a.unwrap().value, 1);
        assert_eq!(b.unwrap().freshness, Freshness::Fetched);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(peak.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_first_fetch_leaves_no_slot() {
        let (_, cache) = setup();
        for symbol in ["BAD1", "BAD2", "BAD3"] {
            let result = cache
                .get_or_fetch(symbol, || async move { Err(ServiceError::InvalidSymbol(symbol.to_string())) })
                .await;
            assert!(result.is_err());
        }
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_entries_past_retention_are_evicted() {
        let (clock, cache) = setup();
        cache.get_or_fetch("OLD", || async { Ok(1) }).await.unwrap();

        clock.advance(TimeDelta::hours(2));
        cache.get_or_fetch("NEW", || async { Ok(2) }).await.unwrap();
        // expired but still within retention, kept as a stale fallback
        assert_eq!(cache.len(), 2);

        clock.advance(TimeDelta::hours(i64::from(STALE_RETENTION_FACTOR)));
        cache.get_or_fetch("NEWER", || async { Ok(3) }).await.unwrap();
        assert!(cache.peek("OLD").await.is_none());
        assert!(cache.peek("NEW").await.is_none());
        assert_eq!(cache.len(), 1);
    }
}
