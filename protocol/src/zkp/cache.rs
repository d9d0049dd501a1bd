//! Sharded, time-bounded cache of proof verdicts.
//!
//! Proof verification costs several pairings, and clients resubmit the same
//! proof on retries, so verdicts (including negative ones) are remembered
//! for a while.
//!
//! Entries live in a `DashMap` keyed by the BLAKE3 digest of the
//! length-prefixed input tuple, so shifting bytes between components never
//! yields the same key. The map is bounded: once it grows past
//! `max_entries`, expired entries are dropped and, if that is not enough,
//! the oldest verdicts are evicted down to three quarters of capacity.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::debug;

use super::verifier::ZkSetupError;
use crate::config::{
    PROOF_CACHE_CLEAN_WINDOW, PROOF_CACHE_LIFE_WINDOW, PROOF_CACHE_MAX_ENTRIES, PROOF_CACHE_SHARDS,
};
use crate::crypto::hash::blake3_hash;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProofCacheConfig {
    /// Number of map shards. A power of two greater than one.
    pub shards: usize,
    /// How long a verdict stays valid after insertion.
    pub life_window: Duration,
    /// Janitor sweep period.
    pub clean_window: Duration,
    pub max_entries: usize,
}

impl Default for ProofCacheConfig {
    fn default() -> Self {
        Self {
            shards: PROOF_CACHE_SHARDS,
            life_window: PROOF_CACHE_LIFE_WINDOW,
            clean_window: PROOF_CACHE_CLEAN_WINDOW,
            max_entries: PROOF_CACHE_MAX_ENTRIES,
        }
    }
}

impl ProofCacheConfig {
    pub fn validate(&self) -> Result<(), ZkSetupError> {
        if self.shards < 2 || !self.shards.is_power_of_two() {
            return Err(ZkSetupError::InvalidCacheConfig(format!(
                "shards must be a power of two > 1, got {}",
                self.shards
            )));
        }
        if self.max_entries == 0 {
            return Err(ZkSetupError::InvalidCacheConfig("max_entries must be > 0".into()));
        }
        if self.life_window.is_zero() {
            return Err(ZkSetupError::InvalidCacheConfig("life_window must be > 0".into()));
        }
        if self.clean_window.is_zero() {
            return Err(ZkSetupError::InvalidCacheConfig("clean_window must be > 0".into()));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Key
// ---------------------------------------------------------------------------

/// Cache key: BLAKE3 of each component as `u32 BE length || bytes`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey([u8; 32]);

impl CacheKey {
    pub fn new(sender: &str, public_key: &str, proof: &str, witness: &str) -> Self {
        let parts = [sender, public_key, proof, witness];
        let mut buf = Vec::with_capacity(parts.iter().map(|p| p.len() + 4).sum());
        for part in parts {
            buf.extend_from_slice(&(part.len() as u32).to_be_bytes());
            buf.extend_from_slice(part.as_bytes());
        }
        Self(blake3_hash(&buf))
    }
}

// ---------------------------------------------------------------------------
// Cache
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
struct CacheEntry {
    verdict: bool,
    inserted_at: Instant,
}

pub struct ProofCache {
    entries: DashMap<CacheKey, CacheEntry>,
    shards: usize,
    life_window: Duration,
    max_entries: usize,
}

impl ProofCache {
    pub fn new(config: &ProofCacheConfig) -> Result<Self, ZkSetupError> {
        config.validate()?;
        Ok(Self {
            entries: DashMap::with_capacity_and_shard_amount(0, config.shards),
            shards: config.shards,
            life_window: config.life_window,
            max_entries: config.max_entries,
        })
    }

    fn is_live(&self, entry: &CacheEntry, now: Instant) -> bool {
        now.duration_since(entry.inserted_at) < self.life_window
    }

    /// The cached verdict, if present and not expired.
    pub fn get(&self, key: &CacheKey) -> Option<bool> {
        let now = Instant::now();
        self.entries
            .get(key)
            .filter(|entry| self.is_live(entry, now))
            .map(|entry| entry.verdict)
    }

    /// Record a verdict, replacing any previous one for the same key.
    pub fn insert(&self, key: CacheKey, verdict: bool) {
        self.entries.insert(
            key,
            CacheEntry {
                verdict,
                inserted_at: Instant::now(),
            },
        );
        self.maybe_evict();
    }

    /// Brings the map back under `max_entries`: expired entries first, then
    /// the oldest down to 75% of capacity.
    fn maybe_evict(&self) {
        if self.entries.len() <= self.max_entries {
            return;
        }

        let purged = self.purge_expired();
        if self.entries.len() <= self.max_entries {
            debug!(purged, "proof cache over capacity, dropped expired verdicts");
            return;
        }

        let target = self.max_entries * 3 / 4;
        let mut entries: Vec<(CacheKey, Instant)> = self
            .entries
            .iter()
            .map(|entry| (*entry.key(), entry.value().inserted_at))
            .collect();
        entries.sort_by_key(|(_, inserted_at)| *inserted_at);

        let to_remove = entries.len().saturating_sub(target);
        for (key, _) in entries.iter().take(to_remove) {
            self.entries.remove(key);
        }
        debug!(purged, evicted = to_remove, "proof cache over capacity, evicted oldest verdicts");
    }

    /// Drop every expired entry. Returns the number removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| self.is_live(entry, now));
        before.saturating_sub(self.entries.len())
    }

    /// Entries currently held, expired or not.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn shard_count(&self) -> usize {
        self.shards
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    fn config(shards: usize, max: usize, life: Duration) -> ProofCacheConfig {
        ProofCacheConfig {
            shards,
            life_window: life,
            clean_window: Duration::from_secs(1),
            max_entries: max,
        }
    }

    #[test]
    fn default_config_is_valid() {
        let cfg = ProofCacheConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(ProofCache::new(&cfg).unwrap().shard_count(), 128);
    }

    #[test]
    fn rejects_degenerate_config() {
        assert!(config(0, 1, Duration::from_secs(1)).validate().is_err());
        assert!(config(1, 1, Duration::from_secs(1)).validate().is_err());
        assert!(config(2, 0, Duration::from_secs(1)).validate().is_err());
        assert!(config(2, 1, Duration::ZERO).validate().is_err());
    }

    #[test]
    fn shard_count_must_be_power_of_two() {
        assert!(matches!(
            ProofCache::new(&config(48, 16, Duration::from_secs(1))),
            Err(ZkSetupError::InvalidCacheConfig(_))
        ));
        assert_eq!(
            ProofCache::new(&config(64, 16, Duration::from_secs(1)))
                .unwrap()
                .shard_count(),
            64
        );
    }

    #[test]
    fn config_from_json_fills_defaults() {
        let cfg: ProofCacheConfig = serde_json::from_str(r#"{"shards": 4}"#).unwrap();
        assert_eq!(cfg.shards, 4);
        assert_eq!(cfg.life_window, PROOF_CACHE_LIFE_WINDOW);
        assert_eq!(cfg.max_entries, PROOF_CACHE_MAX_ENTRIES);
    }

    #[test]
    fn key_components_cannot_shift() {
        // Concatenation without lengths would make these equal.
        assert_ne!(
            CacheKey::new("ab", "c", "p", "w"),
            CacheKey::new("a", "bc", "p", "w")
        );
        assert_ne!(
            CacheKey::new("a|b", "c", "p", "w"),
            CacheKey::new("a", "b|c", "p", "w")
        );
        assert_eq!(
            CacheKey::new("a", "b", "c", "d"),
            CacheKey::new("a", "b", "c", "d")
        );
    }

    #[test]
    fn stores_both_verdicts() {
        let cache = ProofCache::new(&ProofCacheConfig::default()).unwrap();
        let yes = CacheKey::new("s", "k", "p1", "w");
        let no = CacheKey::new("s", "k", "p2", "w");
        assert_eq!(cache.get(&yes), None);

        cache.insert(yes, true);
        cache.insert(no, false);
        assert_eq!(cache.get(&yes), Some(true));
        assert_eq!(cache.get(&no), Some(false));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn expired_entries_are_misses_and_get_purged() {
        let cache = ProofCache::new(&config(4, 16, Duration::from_millis(30))).unwrap();
        let key = CacheKey::new("s", "k", "p", "w");
        cache.insert(key, true);
        assert_eq!(cache.get(&key), Some(true));

        sleep(Duration::from_millis(60));
        assert_eq!(cache.get(&key), None);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.purge_expired(), 1);
        assert!(cache.is_empty());
    }

    #[test]
    fn over_capacity_evicts_oldest() {
        let cache = ProofCache::new(&config(2, 4, Duration::from_secs(60))).unwrap();
        let keys: Vec<CacheKey> = ["a", "b", "c", "d", "e"]
            .iter()
            .map(|s| CacheKey::new(s, "", "", ""))
            .collect();

        for key in &keys {
            cache.insert(*key, true);
            sleep(Duration::from_millis(2));
        }

        // Five entries against a cap of four: trimmed back to three.
        assert_eq!(cache.len(), 3);
        assert_eq!(cache.get(&keys[0]), None);
        assert_eq!(cache.get(&keys[1]), None);
        for key in &keys[2..] {
            assert_eq!(cache.get(key), Some(true));
        }
    }

    #[test]
    fn over_capacity_prefers_dropping_expired() {
        let cache = ProofCache::new(&config(2, 2, Duration::from_millis(30))).unwrap();
        cache.insert(CacheKey::new("old1", "", "", ""), true);
        cache.insert(CacheKey::new("old2", "", "", ""), true);
        sleep(Duration::from_millis(60));

        let fresh = CacheKey::new("fresh", "", "", "");
        cache.insert(fresh, true);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&fresh), Some(true));
    }

    #[test]
    fn overwrite_does_not_evict() {
        let cache = ProofCache::new(&config(2, 1, Duration::from_secs(60))).unwrap();
        let key = CacheKey::new("a", "", "", "");
        cache.insert(key, false);
        cache.insert(key, true);
        assert_eq!(cache.get(&key), Some(true));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn concurrent_inserts_respect_capacity() {
        let cache = std::sync::Arc::new(
            ProofCache::new(&config(8, 64, Duration::from_secs(60))).unwrap(),
        );
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let cache = std::sync::Arc::clone(&cache);
                std::thread::spawn(move || {
                    for i in 0..100 {
                        cache.insert(CacheKey::new(&format!("{t}-{i}"), "", "", ""), i % 2 == 0);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert!(cache.len() <= 64 + 4);
        assert!(!cache.is_empty());
    }
}
