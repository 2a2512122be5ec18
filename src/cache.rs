use crate::aggregator::AggregateResult;
use crate::clock::{Clock, SystemClock};
use crate::config::CacheConfig;
use crate::utils::percentage;
use chrono::{DateTime, Duration, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub key: String,
    pub value: AggregateResult,
    pub created_at: DateTime<Utc>,
    /// Insertion order, breaking ties between entries created in the same instant.
    pub seq: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Entries removed by `invalidate`.
    pub invalidations: u64,
    /// Entries removed by TTL expiry or size overflow.
    pub evictions: u64,
    pub entries: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        percentage(self.hits as f64, (self.hits + self.misses) as f64)
    }
}

/// Time-boxed memoization of aggregate results.
///
/// Not synchronized: one owner mutates it at a time. Wrap it in a mutex if
/// several threads need to share an engine.
pub struct ResultCache {
    entries: HashMap<String, CacheEntry>,
    ttl: Duration,
    max_entries: usize,
    eviction_batch: usize,
    clock: Arc<dyn Clock>,
    stats: CacheStats,
    next_seq: u64,
}

impl ResultCache {
    pub fn new(config: &CacheConfig, clock: Arc<dyn Clock>) -> Self {
        let ttl_seconds = i64::try_from(config.ttl_seconds)
            .unwrap_or(i64::MAX)
            .min(i64::MAX / 1000);
        Self {
            entries: HashMap::new(),
            ttl: Duration::seconds(ttl_seconds),
            max_entries: config.max_entries.max(1),
            eviction_batch: config.eviction_batch.max(1),
            clock,
            stats: CacheStats::default(),
            next_seq: 0,
        }
    }

    pub fn with_system_clock(config: &CacheConfig) -> Self {
        Self::new(config, Arc::new(SystemClock))
    }

    /// Returns a fresh entry, or `None` after dropping a stale one.
    pub fn get(&mut self, key: &str) -> Option<AggregateResult> {
        let now = self.clock.now();

        let fresh = self
            .entries
            .get(key)
            .map(|entry| now - entry.created_at < self.ttl);

        match fresh {
            Some(true) => {
                self.stats.hits += 1;
                debug!("Cache hit for {}", key);
                return self.entries.get(key).map(|entry| entry.value.clone());
            }
            Some(false) => {
                self.entries.remove(key);
                self.stats.evictions += 1;
                debug!("Cache entry {} expired", key);
            }
            None => {}
        }

        self.stats.misses += 1;
        debug!("Cache miss for {}", key);
        None
    }

    pub fn set(&mut self, key: impl Into<String>, value: AggregateResult) {
        let key = key.into();
        let entry = CacheEntry {
            key: key.clone(),
            value,
            created_at: self.clock.now(),
            seq: self.next_seq,
        };
        self.next_seq += 1;
        self.entries.insert(key, entry);

        if self.entries.len() > self.max_entries {
            self.evict_oldest();
        }
    }

    /// Drops every entry, leaving the counters alone.
    pub fn clear(&mut self) {
        let removed = self.entries.len();
        self.entries.clear();
        info!("Cleared {} cached results", removed);
    }

    /// Drops every entry whose key contains `pattern`. Returns how many went.
    pub fn invalidate(&mut self, pattern: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| !key.contains(pattern));
        let removed = before - self.entries.len();

        self.stats.invalidations += removed as u64;
        info!("Invalidated {} cached results matching '{}'", removed, pattern);
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            ..self.stats
        }
    }

    pub fn hit_rate(&self) -> f64 {
        self.stats.hit_rate()
    }

    fn evict_oldest(&mut self) {
        let mut by_age: Vec<(DateTime<Utc>, u64, String)> = self
            .entries
            .values()
            .map(|e| (e.created_at, e.seq, e.key.clone()))
            .collect();
        by_age.sort_by_key(|(created_at, seq, _)| (*created_at, *seq));

        let count = self.eviction_batch.min(by_age.len());
        for (_, _, key) in by_age.into_iter().take(count) {
            self.entries.remove(&key);
        }

        self.stats.evictions += count as u64;
        debug!(
            "Cache over {} entries, evicted {} oldest",
            self.max_entries, count
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::MonthlyTrend;
    use crate::clock::ManualClock;

    fn value(tag: &str) -> AggregateResult {
        AggregateResult::MonthlyTrends {
            months: vec![MonthlyTrend {
                month: tag.to_string(),
                income: 1.0,
                expenses: 0.0,
                net: 1.0,
                transaction_count: 1,
            }],
        }
    }

    fn cache_with(config: CacheConfig) -> (ResultCache, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(
            DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
        ));
        (ResultCache::new(&config, clock.clone()), clock)
    }

    #[test]
    fn test_hit_within_ttl_and_expiry() {
        let (mut cache, clock) = cache_with(CacheConfig::default());
        cache.set("a", value("a"));

        clock.advance(Duration::seconds(299));
        assert_eq!(cache.get("a"), Some(value("a")));

        clock.advance(Duration::seconds(1));
        assert_eq!(cache.get("a"), None);
        assert!(!cache.contains_key("a"));

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.evictions, 1);
        assert_eq!(stats.entries, 0);
    }

    #[test]
    fn test_overflow_evicts_oldest_batch() {
        let config = CacheConfig {
            ttl_seconds: 300,
            max_entries: 5,
            eviction_batch: 2,
        };
        let (mut cache, clock) = cache_with(config);

        for i in 0..6 {
            cache.set(format!("key-{}", i), value("v"));
            clock.advance(Duration::seconds(1));
        }

        assert_eq!(cache.len(), 4);
        assert!(!cache.contains_key("key-0"));
        assert!(!cache.contains_key("key-1"));
        assert!(cache.contains_key("key-2"));
        assert!(cache.contains_key("key-5"));
        assert_eq!(cache.stats().evictions, 2);
    }

    #[test]
    fn test_overflow_with_frozen_clock_evicts_first_inserted() {
        let config = CacheConfig {
            ttl_seconds: 300,
            max_entries: 2,
            eviction_batch: 1,
        };
        let (mut cache, _clock) = cache_with(config);

        cache.set("b", value("b"));
        cache.set("c", value("c"));
        cache.set("a", value("a"));

        assert_eq!(cache.len(), 2);
        assert!(!cache.contains_key("b"));
        assert!(cache.contains_key("c"));
        assert!(cache.contains_key("a"));
    }

    #[test]
    fn test_invalidate_by_substring() {
        let (mut cache, _clock) = cache_with(CacheConfig::default());
        cache.set("category_breakdown:jan", value("1"));
        cache.set("category_breakdown:feb", value("2"));
        cache.set("income_vs_expenses:jan", value("3"));

        assert_eq!(cache.invalidate("category_breakdown"), 2);
        assert_eq!(cache.len(), 1);
        assert!(cache.contains_key("income_vs_expenses:jan"));
        assert_eq!(cache.stats().invalidations, 2);

        assert_eq!(cache.invalidate("nothing"), 0);
    }

    #[test]
    fn test_clear_forces_recompute() {
        let (mut cache, _clock) = cache_with(CacheConfig::default());
        cache.set("a", value("a"));
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.get("a"), None);
    }

    #[test]
    fn test_hit_rate() {
        let (mut cache, _clock) = cache_with(CacheConfig::default());
        assert_eq!(cache.hit_rate(), 0.0);

        cache.set("a", value("a"));
        cache.get("a");
        cache.get("a");
        cache.get("a");
        cache.get("missing");
        assert_eq!(cache.hit_rate(), 75.0);
    }
}
