//! AI response cache with per-namespace TTL, batch eviction and JSON snapshots.
//!
//! Entries live in a concurrent map so single-key reads and writes never
//! block each other. Bulk mutations (clear, batch eviction, snapshot write)
//! are serialized by a separate lock. Every `put()` rewrites the full
//! snapshot; expired or corrupt entries dropped during `get()` are flushed
//! with the next `put()` or `clear()`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Duration;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::clock::Clock;
use crate::persist::{load_or_default, persist, SnapshotStore};

use super::keys::Namespace;
use super::payload::{decode, encode, Cacheable};

/// Default entry cap before a batch eviction runs.
pub const DEFAULT_MAX_ENTRIES: usize = 500;

/// A single cached result in its serialized form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Tagged JSON payload (see [`super::payload::CachedPayload`]).
    pub payload: String,
    /// Unix epoch milliseconds when the entry was written.
    pub created_at: i64,
}

/// Persistent snapshot layout.
#[derive(Debug, Serialize, Deserialize, Default)]
struct CacheSnapshot {
    entries: HashMap<String, CacheEntry>,
}

/// TTL-keyed response cache backed by a whole-table snapshot.
pub struct ResponseCache {
    entries: DashMap<String, CacheEntry>,
    bulk: Mutex<()>,
    store: Arc<dyn SnapshotStore>,
    clock: Arc<dyn Clock>,
    max_entries: usize,
}

impl ResponseCache {
    /// Create a cache and load the existing snapshot from `store`.
    ///
    /// A missing or unreadable snapshot yields an empty cache.
    /// `max_entries` is clamped to a minimum of 1.
    pub fn new(store: Arc<dyn SnapshotStore>, clock: Arc<dyn Clock>, max_entries: usize) -> Self {
        let snapshot: CacheSnapshot = load_or_default(store.as_ref(), "response cache");
        let entries: DashMap<String, CacheEntry> = snapshot.entries.into_iter().collect();
        debug!(entries = entries.len(), "Loaded response cache snapshot");
        Self {
            entries,
            bulk: Mutex::new(()),
            store,
            clock,
            max_entries: max_entries.max(1),
        }
    }

    /// Look up `key` and decode it as `T`.
    ///
    /// Expired entries and entries that fail to decode are evicted and
    /// reported as a miss.
    pub fn get<T: Cacheable>(&self, key: &str, ttl: Duration) -> Option<T> {
        // Clone out of the map so no shard guard is held during removal.
        let entry = self.entries.get(key).map(|e| e.value().clone())?;
        let now = self.clock.now_millis();

        if now.saturating_sub(entry.created_at) > ttl.num_milliseconds() {
            debug!(key = %key, "Cache entry expired, removing");
            self.remove_if_unchanged(key, entry.created_at);
            return None;
        }

        match decode::<T>(&entry.payload) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key = %key, error = %e, "Cached entry is corrupt, evicting");
                self.remove_if_unchanged(key, entry.created_at);
                None
            }
        }
    }

    /// Store `value` under `key`, evict a batch if over capacity, then
    /// write the snapshot.
    pub fn put<T: Cacheable>(&self, key: &str, value: T) {
        let payload = match encode(value) {
            Ok(p) => p,
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to encode cache value, skipping");
                return;
            }
        };
        self.entries.insert(
            key.to_string(),
            CacheEntry {
                payload,
                created_at: self.clock.now_millis(),
            },
        );

        let _bulk = self.bulk.lock().unwrap_or_else(|e| e.into_inner());
        if self.entries.len() > self.max_entries {
            self.evict_oldest_batch();
        }
        self.save_snapshot();
    }

    /// Remove a single entry. Returns whether it existed.
    pub fn remove(&self, key: &str) -> bool {
        let removed = self.entries.remove(key).is_some();
        if removed {
            let _bulk = self.bulk.lock().unwrap_or_else(|e| e.into_inner());
            self.save_snapshot();
        }
        removed
    }

    /// Remove all entries and persist the empty table.
    pub fn clear(&self) {
        let _bulk = self.bulk.lock().unwrap_or_else(|e| e.into_inner());
        self.entries.clear();
        self.save_snapshot();
    }

    /// Drop every expired entry belonging to `namespace`. Returns the count.
    pub fn purge_expired(&self, namespace: Namespace) -> usize {
        let _bulk = self.bulk.lock().unwrap_or_else(|e| e.into_inner());
        let now = self.clock.now_millis();
        let ttl_ms = namespace.ttl().num_milliseconds();
        let before = self.entries.len();
        self.entries.retain(|key, entry| {
            !(namespace.owns_key(key) && now.saturating_sub(entry.created_at) > ttl_ms)
        });
        let purged = before.saturating_sub(self.entries.len());
        if purged > 0 {
            self.save_snapshot();
        }
        purged
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    pub fn stats(&self) -> CacheStats {
        let now = self.clock.now_millis();
        let oldest = self.entries.iter().map(|e| e.value().created_at).min();
        let newest = self.entries.iter().map(|e| e.value().created_at).max();
        let mut per_namespace = HashMap::new();
        for entry in self.entries.iter() {
            if let Some(ns) = Namespace::ALL.iter().find(|ns| ns.owns_key(entry.key())) {
                *per_namespace.entry(ns.as_str()).or_insert(0usize) += 1;
            }
        }
        CacheStats {
            total_entries: self.entries.len(),
            max_entries: self.max_entries,
            oldest_entry_age_secs: oldest.map(|t| now.saturating_sub(t) / 1000),
            newest_entry_age_secs: newest.map(|t| now.saturating_sub(t) / 1000),
            per_namespace,
        }
    }

    // -- private helpers ---------------------------------------------------

    fn remove_if_unchanged(&self, key: &str, created_at: i64) {
        // A concurrent put may have replaced the entry; leave that one alone.
        self.entries
            .remove_if(key, |_, current| current.created_at == created_at);
    }

    /// Evict the oldest quarter of capacity in one pass. Caller holds `bulk`.
    fn evict_oldest_batch(&self) {
        let batch = (self.max_entries / 4).max(1);
        let overflow = self.entries.len().saturating_sub(self.max_entries);
        let count = batch.max(overflow);

        let mut by_age: Vec<(String, i64)> = self
            .entries
            .iter()
            .map(|e| (e.key().clone(), e.value().created_at))
            .collect();
        by_age.sort_by_key(|(_, created_at)| *created_at);

        for (key, _) in by_age.into_iter().take(count) {
            self.entries.remove(&key);
        }
        debug!(evicted = count, remaining = self.entries.len(), "Evicted oldest cache entries");
    }

    /// Write the whole table. Caller holds `bulk`.
    fn save_snapshot(&self) {
        let snapshot = CacheSnapshot {
            entries: self
                .entries
                .iter()
                .map(|e| (e.key().clone(), e.value().clone()))
                .collect(),
        };
        persist(self.store.as_ref(), "response cache", &snapshot);
    }
}

/// Aggregate cache statistics.
#[derive(Debug, Clone)]
pub struct CacheStats {
    pub total_entries: usize,
    pub max_entries: usize,
    /// Age of the oldest entry, `None` when empty.
    pub oldest_entry_age_secs: Option<i64>,
    pub newest_entry_age_secs: Option<i64>,
    /// Entry count keyed by namespace tag.
    pub per_namespace: HashMap<&'static str, usize>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::features::{DailyWisdom, JournalInsight};
    use crate::persist::{JsonFileStore, MemoryStore};
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    fn clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2026, 5, 4, 9, 0, 0).unwrap(),
        ))
    }

    fn wisdom(n: usize) -> DailyWisdom {
        DailyWisdom {
            wisdom: format!("wisdom {n}"),
            reflection: "r".into(),
            action: "a".into(),
        }
    }

    fn test_cache(max: usize) -> (Arc<ManualClock>, Arc<MemoryStore>, ResponseCache) {
        let clock = clock();
        let store = Arc::new(MemoryStore::new());
        let cache = ResponseCache::new(store.clone(), clock.clone(), max);
        (clock, store, cache)
    }

    #[test]
    fn test_put_then_get_returns_value() {
        let (_clock, _store, cache) = test_cache(10);
        assert!(cache.get::<DailyWisdom>("k", Duration::hours(1)).is_none());
        cache.put("k", wisdom(1));
        assert_eq!(
            cache.get::<DailyWisdom>("k", Duration::hours(1)),
            Some(wisdom(1))
        );
    }

    #[test]
    fn test_entry_expires_after_ttl() {
        let (clock, _store, cache) = test_cache(10);
        cache.put("k", wisdom(1));
        clock.advance(Duration::hours(1));
        // Exactly at the TTL boundary the entry is still fresh.
        assert!(cache.get::<DailyWisdom>("k", Duration::hours(1)).is_some());
        clock.advance(Duration::milliseconds(1));
        assert!(cache.get::<DailyWisdom>("k", Duration::hours(1)).is_none());
        assert!(cache.is_empty(), "expired entry should be evicted");
    }

    #[test]
    fn test_wrong_type_is_evicted_as_corrupt() {
        let (_clock, _store, cache) = test_cache(10);
        cache.put("k", wisdom(1));
        assert!(cache.get::<JournalInsight>("k", Duration::hours(1)).is_none());
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_malformed_payload_is_evicted() {
        let (_clock, _store, cache) = test_cache(10);
        cache.entries.insert(
            "bad".into(),
            CacheEntry {
                payload: "{not json".into(),
                created_at: cache.clock.now_millis(),
            },
        );
        assert!(cache.get::<DailyWisdom>("bad", Duration::hours(1)).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_batch_eviction_removes_oldest_quarter() {
        let (clock, _store, cache) = test_cache(8);
        for i in 0..8 {
            cache.put(&format!("k{i}"), wisdom(i));
            clock.advance(Duration::seconds(1));
        }
        assert_eq!(cache.len(), 8);

        cache.put("k8", wisdom(8));
        // 9 entries > 8, evict 8 / 4 = 2 oldest.
        assert_eq!(cache.len(), 7);
        assert!(cache.get::<DailyWisdom>("k0", Duration::days(1)).is_none());
        assert!(cache.get::<DailyWisdom>("k1", Duration::days(1)).is_none());
        assert!(cache.get::<DailyWisdom>("k2", Duration::days(1)).is_some());
        assert!(cache.get::<DailyWisdom>("k8", Duration::days(1)).is_some());
    }

    #[test]
    fn test_size_never_exceeds_cap_after_put() {
        let (clock, _store, cache) = test_cache(20);
        for i in 0..200 {
            cache.put(&format!("k{i}"), wisdom(i));
            clock.advance(Duration::milliseconds(5));
            assert!(cache.len() <= cache.max_entries());
        }
    }

    #[test]
    fn test_every_put_writes_snapshot() {
        let (_clock, store, cache) = test_cache(10);
        cache.put("a", wisdom(1));
        cache.put("b", wisdom(2));
        assert_eq!(store.save_count(), 2);
        let doc = store.contents().unwrap();
        assert!(doc.contains("\"a\""));
        assert!(doc.contains("\"b\""));
    }

    #[test]
    fn test_snapshot_survives_restart() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("cache").join("ai_responses.json");
        let clock = clock();
        {
            let cache = ResponseCache::new(Arc::new(JsonFileStore::new(&path)), clock.clone(), 10);
            cache.put("daily_wisdom_2026-124", wisdom(7));
        }
        let reloaded = ResponseCache::new(Arc::new(JsonFileStore::new(&path)), clock, 10);
        assert_eq!(
            reloaded.get::<DailyWisdom>("daily_wisdom_2026-124", Duration::hours(24)),
            Some(wisdom(7))
        );
    }

    #[test]
    fn test_corrupt_snapshot_starts_empty() {
        let store = Arc::new(MemoryStore::with_contents("]]] definitely not json"));
        let cache = ResponseCache::new(store, clock(), 10);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_clear_persists_empty_table() {
        let (_clock, store, cache) = test_cache(10);
        cache.put("a", wisdom(1));
        cache.clear();
        assert!(cache.is_empty());
        let reloaded = ResponseCache::new(store, clock(), 10);
        assert!(reloaded.is_empty());
    }

    #[test]
    fn test_purge_expired_only_touches_namespace() {
        let (clock, _store, cache) = test_cache(10);
        cache.put("message_abc", wisdom(1));
        cache.put("journal_abc", wisdom(2));
        clock.advance(Duration::hours(2));
        assert_eq!(cache.purge_expired(Namespace::MessageHelper), 1);
        assert_eq!(cache.purge_expired(Namespace::JournalInsight), 0);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_stats_by_namespace() {
        let (clock, _store, cache) = test_cache(10);
        cache.put("journal_1", wisdom(1));
        cache.put("journal_2", wisdom(2));
        clock.advance(Duration::seconds(10));
        cache.put("vocab_1", wisdom(3));
        clock.advance(Duration::seconds(20));
        let stats = cache.stats();
        assert_eq!(stats.total_entries, 3);
        assert_eq!(stats.per_namespace.get("journal_insight"), Some(&2));
        assert_eq!(stats.per_namespace.get("vocabulary_context"), Some(&1));
        assert_eq!(stats.oldest_entry_age_secs, Some(30));
        assert_eq!(stats.newest_entry_age_secs, Some(20));
    }

    #[test]
    fn test_max_entries_zero_clamped() {
        let (_clock, _store, cache) = test_cache(0);
        assert_eq!(cache.max_entries(), 1);
        cache.put("a", wisdom(1));
        cache.put("b", wisdom(2));
        assert_eq!(cache.len(), 1);
    }
}
