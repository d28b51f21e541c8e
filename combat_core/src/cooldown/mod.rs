//! Cooldowns - Per-entity "ready at" timestamps keyed by (bucket, action key)

use crate::types::Timestamp;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Namespace a cooldown key lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CooldownBucket {
    Ability,
    Spell,
    Item,
    Dispel,
    Global,
}

impl fmt::Display for CooldownBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CooldownBucket::Ability => "ability",
            CooldownBucket::Spell => "spell",
            CooldownBucket::Item => "item",
            CooldownBucket::Dispel => "dispel",
            CooldownBucket::Global => "global",
        };
        f.write_str(name)
    }
}

/// A recorded cooldown
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CooldownEntry {
    pub bucket: CooldownBucket,
    pub key: String,
    pub ready_at: Timestamp,
}

/// Cooldowns owned by one entity
///
/// Entries are only written by the casting gate on a successful pass. Elapsed
/// entries are harmless and never need deleting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CooldownTable {
    entries: BTreeMap<(CooldownBucket, String), Timestamp>,
}

impl CooldownTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a table from persisted entries
    pub fn from_entries(entries: impl IntoIterator<Item = CooldownEntry>) -> Self {
        CooldownTable {
            entries: entries
                .into_iter()
                .map(|e| ((e.bucket, e.key), e.ready_at))
                .collect(),
        }
    }

    pub fn ready_at(&self, bucket: CooldownBucket, key: &str) -> Option<Timestamp> {
        // BTreeMap lookup needs an owned tuple key
        self.entries.get(&(bucket, key.to_string())).copied()
    }

    /// Milliseconds until the action is ready (0 when ready or never used)
    pub fn remaining(&self, bucket: CooldownBucket, key: &str, now: Timestamp) -> u64 {
        self.ready_at(bucket, key)
            .map(|ready_at| ready_at.saturating_sub(now))
            .unwrap_or(0)
    }

    pub fn is_ready(&self, bucket: CooldownBucket, key: &str, now: Timestamp) -> bool {
        self.remaining(bucket, key, now) == 0
    }

    pub(crate) fn start(&mut self, bucket: CooldownBucket, key: &str, now: Timestamp, cooldown_ms: u64) {
        self.entries
            .insert((bucket, key.to_string()), now.saturating_add(cooldown_ms));
    }

    /// Drop entries that have already elapsed. Returns how many were removed.
    pub fn purge_elapsed(&mut self, now: Timestamp) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, ready_at| *ready_at > now);
        before - self.entries.len()
    }

    /// All entries, in (bucket, key) order
    pub fn entries(&self) -> impl Iterator<Item = CooldownEntry> + '_ {
        self.entries.iter().map(|((bucket, key), ready_at)| CooldownEntry {
            bucket: *bucket,
            key: key.clone(),
            ready_at: *ready_at,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unused_key_is_ready() {
        let table = CooldownTable::new();
        assert_eq!(table.remaining(CooldownBucket::Spell, "fireball", 1_000), 0);
        assert!(table.is_ready(CooldownBucket::Spell, "fireball", 1_000));
    }

    #[test]
    fn test_remaining_counts_down() {
        let mut table = CooldownTable::new();
        table.start(CooldownBucket::Spell, "fireball", 1_000, 3_000);
        assert_eq!(table.ready_at(CooldownBucket::Spell, "fireball"), Some(4_000));
        assert_eq!(table.remaining(CooldownBucket::Spell, "fireball", 2_500), 1_500);
        assert_eq!(table.remaining(CooldownBucket::Spell, "fireball", 4_000), 0);
        assert_eq!(table.remaining(CooldownBucket::Spell, "fireball", 9_000), 0);
    }

    #[test]
    fn test_buckets_are_independent() {
        let mut table = CooldownTable::new();
        table.start(CooldownBucket::Ability, "kick", 0, 5_000);
        assert!(!table.is_ready(CooldownBucket::Ability, "kick", 100));
        assert!(table.is_ready(CooldownBucket::Item, "kick", 100));
    }

    #[test]
    fn test_purge_elapsed() {
        let mut table = CooldownTable::new();
        table.start(CooldownBucket::Ability, "kick", 0, 1_000);
        table.start(CooldownBucket::Ability, "bash", 0, 5_000);
        assert_eq!(table.purge_elapsed(2_000), 1);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_entries_round_trip() {
        let mut table = CooldownTable::new();
        table.start(CooldownBucket::Dispel, "cleanse", 10, 8_000);
        let restored = CooldownTable::from_entries(table.entries());
        assert_eq!(restored, table);
    }
}
