//! Concurrent heat-point store.

use std::collections::VecDeque;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::HeatKey;

/// Heat-point store configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeatConfig {
    /// Expiry for points added without an explicit duration. `None` keeps
    /// them until reset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_ttl_secs: Option<u64>,
    /// Oldest points are dropped once a key holds this many.
    pub max_points_per_key: usize,
}

impl Default for HeatConfig {
    fn default() -> Self {
        Self {
            default_ttl_secs: None,
            max_points_per_key: 1000,
        }
    }
}

impl HeatConfig {
    pub fn default_ttl(&self) -> Option<Duration> {
        self.default_ttl_secs
            .and_then(|secs| Duration::try_seconds(i64::try_from(secs).ok()?))
    }
}

#[derive(Debug, Default)]
struct HeatEntry {
    /// One slot per point, oldest first. `None` never expires.
    expiries: VecDeque<Option<DateTime<Utc>>>,
}

impl HeatEntry {
    fn live(&self, now: DateTime<Utc>) -> usize {
        self.expiries
            .iter()
            .filter(|expiry| expiry.map_or(true, |at| at > now))
            .count()
    }

    fn drop_expired(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.expiries.len();
        self.expiries.retain(|expiry| expiry.map_or(true, |at| at > now));
        before - self.expiries.len()
    }
}

/// Heat counters for every mode, guild and subject.
///
/// Writes to one key are serialized by the map's shard lock; distinct keys
/// proceed concurrently. Expiry is evaluated when a key is read or written.
#[derive(Debug, Default)]
pub struct HeatStore {
    entries: DashMap<HeatKey, HeatEntry>,
    config: HeatConfig,
}

impl HeatStore {
    pub fn new(config: HeatConfig) -> Self {
        Self {
            entries: DashMap::new(),
            config,
        }
    }

    pub fn config(&self) -> &HeatConfig {
        &self.config
    }

    /// Add one point expiring after the configured default.
    pub fn increase(&self, key: &HeatKey) -> usize {
        self.increase_by(key, 1, self.config.default_ttl())
    }

    /// Add `amount` points expiring after `ttl`. Returns the new count.
    pub fn increase_by(&self, key: &HeatKey, amount: u32, ttl: Option<Duration>) -> usize {
        let now = Utc::now();
        let expiry = ttl.and_then(|ttl| now.checked_add_signed(ttl));

        let cap = self.config.max_points_per_key;
        // Points beyond the cap would be dropped right away.
        let added = usize::try_from(amount).map_or(cap, |amount| amount.min(cap));

        let mut entry = self.entries.entry(key.clone()).or_default();
        entry.drop_expired(now);
        let overflow = (entry.expiries.len() + added).saturating_sub(cap);
        entry.expiries.drain(..overflow);
        entry.expiries.extend(std::iter::repeat(expiry).take(added));

        let count = entry.expiries.len();
        trace!(name = %key.name, mode = %key.mode, guild_id = key.guild, count, "heat increased");
        count
    }

    /// Current number of unexpired points; zero for unknown keys.
    pub fn get(&self, key: &HeatKey) -> usize {
        let now = Utc::now();
        self.entries
            .get(key)
            .map(|entry| entry.live(now))
            .unwrap_or(0)
    }

    pub fn reset(&self, key: &HeatKey) {
        if self.entries.remove(key).is_some() {
            debug!(name = %key.name, mode = %key.mode, guild_id = key.guild, "heat reset");
        }
    }

    /// Drop expired points and empty keys. Returns how many points were dropped.
    pub fn prune_expired(&self) -> usize {
        let now = Utc::now();
        let mut dropped = 0;
        self.entries.retain(|_, entry| {
            dropped += entry.drop_expired(now);
            !entry.expiries.is_empty()
        });
        if dropped > 0 {
            debug!(dropped, keys = self.entries.len(), "pruned expired heat");
        }
        dropped
    }

    /// Number of keys holding points (expired or not).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::heat::Mode;

    fn key(mode: Mode) -> HeatKey {
        HeatKey::user(mode, 1, 42)
    }

    #[test]
    fn test_missing_key_is_zero() {
        let store = HeatStore::default();
        assert_eq!(store.get(&key(Mode::Production)), 0);
        assert!(store.is_empty());
    }

    #[test]
    fn test_increase_and_reset() {
        let store = HeatStore::default();
        assert_eq!(store.increase(&key(Mode::Production)), 1);
        assert_eq!(store.increase_by(&key(Mode::Production), 4, None), 5);
        assert_eq!(store.get(&key(Mode::Production)), 5);
        store.reset(&key(Mode::Production));
        assert_eq!(store.get(&key(Mode::Production)), 0);
    }

    #[test]
    fn test_modes_are_isolated() {
        let store = HeatStore::default();
        store.increase_by(&key(Mode::Sandbox), 3, None);
        assert_eq!(store.get(&key(Mode::Sandbox)), 3);
        assert_eq!(store.get(&key(Mode::Production)), 0);
        store.reset(&key(Mode::Production));
        assert_eq!(store.get(&key(Mode::Sandbox)), 3);
    }

    #[test]
    fn test_expired_points_are_not_counted() {
        let store = HeatStore::default();
        store.increase_by(&key(Mode::Production), 2, Some(Duration::seconds(-1)));
        store.increase_by(&key(Mode::Production), 1, Some(Duration::hours(1)));
        assert_eq!(store.get(&key(Mode::Production)), 1);
    }

    #[test]
    fn test_prune_expired() {
        let store = HeatStore::default();
        store.increase_by(&HeatKey::custom(Mode::Production, 1, "gone"), 2, Some(Duration::seconds(-1)));
        store.increase_by(&HeatKey::custom(Mode::Production, 1, "kept"), 1, None);
        assert_eq!(store.len(), 2);
        assert_eq!(store.prune_expired(), 2);
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(&HeatKey::custom(Mode::Production, 1, "kept")), 1);
    }

    #[test]
    fn test_cap_drops_oldest() {
        let store = HeatStore::new(HeatConfig {
            default_ttl_secs: None,
            max_points_per_key: 3,
        });
        assert_eq!(store.increase_by(&key(Mode::Production), 5, None), 3);
    }

    #[test]
    fn test_huge_increase_is_capped_up_front() {
        let store = HeatStore::new(HeatConfig {
            default_ttl_secs: None,
            max_points_per_key: 10,
        });
        store.increase_by(&key(Mode::Production), 4, Some(Duration::seconds(-1)));
        store.increase_by(&key(Mode::Production), 2, Some(Duration::hours(1)));

        let started = std::time::Instant::now();
        assert_eq!(store.increase_by(&key(Mode::Production), u32::MAX, None), 10);
        assert!(started.elapsed() < std::time::Duration::from_secs(1));
        assert_eq!(store.get(&key(Mode::Production)), 10);

        // Older points make room for newer ones.
        assert_eq!(store.increase_by(&key(Mode::Production), 3, Some(Duration::seconds(-1))), 10);
        assert_eq!(store.get(&key(Mode::Production)), 7);
    }

    #[test]
    fn test_default_ttl_from_config() {
        let config = HeatConfig {
            default_ttl_secs: Some(60),
            ..HeatConfig::default()
        };
        assert_eq!(config.default_ttl(), Some(Duration::seconds(60)));
        assert_eq!(HeatConfig::default().default_ttl(), None);
    }

    #[test]
    fn test_concurrent_increments() {
        let store = Arc::new(HeatStore::default());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for _ in 0..50 {
                        store.increase(&key(Mode::Production));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(store.get(&key(Mode::Production)), 400);
    }
}
