//! AI usage statistics.
//!
//! Counters for cache hits and misses, rate-limit denials and provider calls,
//! plus details of the most recent call. Every mutation is applied and
//! persisted under the same lock, so the snapshot on disk never lags the
//! in-memory counters by more than one write.

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::clock::Clock;
use crate::persist::{load_or_default, persist, SnapshotStore};

/// Persisted usage counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UsageStats {
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub rate_limit_hits: u64,
    pub total_api_calls: u64,
    pub last_latency_ms: Option<u64>,
    pub last_provider: Option<String>,
    pub last_prompt_type: Option<String>,
    /// Error from the most recent call; cleared by a successful call.
    pub last_error: Option<String>,
    /// Unix epoch milliseconds of the most recent call.
    pub last_call_timestamp: Option<i64>,
}

impl UsageStats {
    /// Fraction of lookups served from cache, `0.0` with no lookups.
    pub fn cache_hit_rate(&self) -> f64 {
        let lookups = self.cache_hits + self.cache_misses;
        if lookups == 0 {
            0.0
        } else {
            self.cache_hits as f64 / lookups as f64
        }
    }
}

/// Details of one completed (or abandoned) provider call.
#[derive(Debug, Clone)]
pub struct ApiCall<'a> {
    pub latency_ms: u64,
    pub provider: &'a str,
    pub prompt_type: &'a str,
    pub error: Option<String>,
}

/// Thread-safe, write-through stats recorder.
pub struct StatsRecorder {
    stats: Mutex<UsageStats>,
    store: Arc<dyn SnapshotStore>,
    clock: Arc<dyn Clock>,
}

impl StatsRecorder {
    /// Load persisted stats from `store`. A corrupt snapshot starts from zero.
    pub fn new(store: Arc<dyn SnapshotStore>, clock: Arc<dyn Clock>) -> Self {
        let stats: UsageStats = load_or_default(store.as_ref(), "usage stats");
        Self {
            stats: Mutex::new(stats),
            store,
            clock,
        }
    }

    pub fn record_cache_hit(&self) {
        self.update(|s| s.cache_hits += 1);
    }

    pub fn record_cache_miss(&self) {
        self.update(|s| s.cache_misses += 1);
    }

    pub fn record_rate_limit_hit(&self) {
        self.update(|s| s.rate_limit_hits += 1);
    }

    pub fn record_api_call(&self, call: ApiCall<'_>) {
        let now = self.clock.now_millis();
        debug!(
            provider = %call.provider,
            prompt_type = %call.prompt_type,
            latency_ms = call.latency_ms,
            failed = call.error.is_some(),
            "Recording API call"
        );
        self.update(|s| {
            s.total_api_calls += 1;
            s.last_latency_ms = Some(call.latency_ms);
            s.last_provider = Some(call.provider.to_string());
            s.last_prompt_type = Some(call.prompt_type.to_string());
            s.last_error = call.error;
            s.last_call_timestamp = Some(now);
        });
    }

    pub fn snapshot(&self) -> UsageStats {
        self.stats.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Zero every counter and persist.
    pub fn reset(&self) {
        self.update(|s| *s = UsageStats::default());
    }

    fn update(&self, f: impl FnOnce(&mut UsageStats)) {
        let mut stats = self.stats.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut stats);
        persist(self.store.as_ref(), "usage stats", &*stats);
    }
}
