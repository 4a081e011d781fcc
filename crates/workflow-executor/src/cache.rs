//! Executor cache (spec.md §4.E, component E): keeps a bounded number of
//! warm `WorkflowExecutor`s around so a continuation task can skip replay.
//! Grounded on `original_source/internal/workflow/cache/cache.go`'s
//! `LruCache` wrapping a TTL-cache with an eviction callback.

use std::time::{Duration, Instant};

use lru::LruCache;
use tracing::debug;

use crate::executor::WorkflowExecutor;

/// Why an entry left the cache. Passed to [`EvictionSink::on_evict`] so the
/// host can distinguish "just LRU pressure" from "this executor went stale
/// and needs a fresh replay next time" for metrics purposes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EvictionReason {
    /// Idle past `ttl` and reaped by [`ExecutorCache::sweep_expired`].
    Expired,
    /// Pushed out by `lru`'s own capacity bound on insert.
    Capacity,
}

/// Observes evictions and current size, mirroring `cache.go`'s `OnEviction`
/// callback plus its metrics gauge update on every `Store`. Default is a
/// no-op so callers that don't care about metrics pay nothing.
pub trait EvictionSink {
    fn on_evict(&self, _key: &str, _reason: EvictionReason) {}
    fn on_size(&self, _size: usize) {}
}

/// An [`EvictionSink`] that does nothing, for callers with no metrics
/// backend wired up.
#[derive(Default)]
pub struct NoopSink;

impl EvictionSink for NoopSink {}

struct CacheEntry {
    executor: WorkflowExecutor,
    stored_at: Instant,
}

/// Bounded, TTL-aware cache of warm [`WorkflowExecutor`]s keyed by
/// [`workflow_types::WorkflowInstance::cache_key`] (spec.md §4.E).
pub struct ExecutorCache<S: EvictionSink = NoopSink> {
    entries: LruCache<String, CacheEntry>,
    ttl: Duration,
    sink: S,
}

impl ExecutorCache<NoopSink> {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self::with_sink(capacity, ttl, NoopSink)
    }
}

impl<S: EvictionSink> ExecutorCache<S> {
    pub fn with_sink(capacity: usize, ttl: Duration, sink: S) -> Self {
        let capacity = std::num::NonZeroUsize::new(capacity.max(1)).expect("capacity is at least 1");
        Self {
            entries: LruCache::new(capacity),
            ttl,
            sink,
        }
    }

    /// Remove and return a warm executor for `key`, if present and not
    /// expired. An expired hit counts as a miss and is evicted — and
    /// closed — on the way out (spec.md §4.E "a stale entry behaves as
    /// absent"; §8 property 4 "the evicted executor has received Close
    /// exactly once").
    pub fn take(&mut self, key: &str) -> Option<WorkflowExecutor> {
        let entry = self.entries.pop(key)?;
        if entry.stored_at.elapsed() > self.ttl {
            let mut executor = entry.executor;
            executor.close();
            self.sink.on_evict(key, EvictionReason::Expired);
            self.sink.on_size(self.entries.len());
            return None;
        }
        Some(entry.executor)
    }

    /// Store (or replace) a warm executor, resetting its idle clock. May
    /// evict the least-recently-used entry if this pushes the cache over
    /// capacity, in which case the evicted executor is closed.
    pub fn store(&mut self, key: String, executor: WorkflowExecutor) {
        let evicted = self.entries.push(
            key,
            CacheEntry {
                executor,
                stored_at: Instant::now(),
            },
        );
        if let Some((evicted_key, mut evicted_entry)) = evicted {
            evicted_entry.executor.close();
            self.sink.on_evict(&evicted_key, EvictionReason::Capacity);
        }
        self.sink.on_size(self.entries.len());
    }

    /// Drop and close a specific entry without treating it as an eviction —
    /// used when an instance completes and its executor should never be
    /// reused.
    pub fn remove(&mut self, key: &str) {
        if let Some(mut entry) = self.entries.pop(key) {
            entry.executor.close();
            self.sink.on_size(self.entries.len());
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Reap every entry idle past `ttl`. Intended to run periodically on a
    /// host-owned timer (`cache.go`'s `StartEviction` loop); this crate
    /// never spawns its own timer, since the cooperative layer has no real
    /// clock of its own (spec.md §5).
    pub fn sweep_expired(&mut self) {
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.stored_at.elapsed() > self.ttl)
            .map(|(key, _)| key.clone())
            .collect();

        if expired.is_empty() {
            return;
        }

        for key in &expired {
            if let Some(mut entry) = self.entries.pop(key) {
                entry.executor.close();
            }
            self.sink.on_evict(key, EvictionReason::Expired);
        }
        debug!(evicted = expired.len(), remaining = self.entries.len(), "cache sweep complete");
        self.sink.on_size(self.entries.len());
    }
}
