//! Threat - Per-NPC aggression bookkeeping and forced targeting

pub mod select;

pub use select::{select_threat_target, TargetSelection};

use crate::types::{EntityId, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Time-limited override that pins an NPC's target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForcedTarget {
    pub entity: EntityId,
    pub until: Timestamp,
}

/// Threat accrued against one NPC
///
/// Keys are ids only. The table never holds the attacking entities themselves.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreatState {
    #[serde(default)]
    pub threat: BTreeMap<EntityId, u64>,
    #[serde(default)]
    pub last_attacker: Option<EntityId>,
    #[serde(default)]
    pub last_aggro_at: Option<Timestamp>,
    #[serde(default)]
    pub forced: Option<ForcedTarget>,
}

impl ThreatState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add threat for `entity` (saturating) and record it as the last attacker
    pub fn add_threat(&mut self, entity: EntityId, amount: u64, now: Timestamp) {
        let entry = self.threat.entry(entity).or_insert(0);
        *entry = entry.saturating_add(amount);
        self.last_attacker = Some(entity);
        self.last_aggro_at = Some(now);
    }

    /// Pin the target to `entity` for `duration_ms`
    pub fn force_target(&mut self, entity: EntityId, duration_ms: u64, now: Timestamp) {
        self.forced = Some(ForcedTarget {
            entity,
            until: now.saturating_add(duration_ms),
        });
    }

    pub fn clear_forced(&mut self) {
        self.forced = None;
    }

    /// Forget an entity entirely (death, leaving combat)
    pub fn remove(&mut self, entity: EntityId) -> Option<u64> {
        if self.forced.is_some_and(|f| f.entity == entity) {
            self.forced = None;
        }
        if self.last_attacker == Some(entity) {
            self.last_attacker = None;
        }
        self.threat.remove(&entity)
    }

    pub fn threat_of(&self, entity: EntityId) -> u64 {
        self.threat.get(&entity).copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.threat.is_empty()
    }

    /// Nonzero entries by threat descending, lowest id first on ties
    pub fn ranked(&self, limit: usize, excluding: &[EntityId]) -> Vec<(EntityId, u64)> {
        let mut entries: Vec<(EntityId, u64)> = self
            .threat
            .iter()
            .filter(|(id, threat)| **threat > 0 && !excluding.contains(id))
            .map(|(id, threat)| (*id, *threat))
            .collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        entries.truncate(limit);
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_threat_accumulates() {
        let mut state = ThreatState::new();
        state.add_threat(EntityId(1), 10, 100);
        state.add_threat(EntityId(1), 5, 200);
        state.add_threat(EntityId(2), 3, 300);
        assert_eq!(state.threat_of(EntityId(1)), 15);
        assert_eq!(state.last_attacker, Some(EntityId(2)));
        assert_eq!(state.last_aggro_at, Some(300));
    }

    #[test]
    fn test_add_threat_saturates() {
        let mut state = ThreatState::new();
        state.add_threat(EntityId(1), u64::MAX, 0);
        state.add_threat(EntityId(1), 10, 0);
        assert_eq!(state.threat_of(EntityId(1)), u64::MAX);
    }

    #[test]
    fn test_ranked_order_and_filters() {
        let mut state = ThreatState::new();
        state.add_threat(EntityId(4), 50, 0);
        state.add_threat(EntityId(2), 50, 0);
        state.add_threat(EntityId(3), 80, 0);
        state.add_threat(EntityId(9), 0, 0);

        let ranked = state.ranked(10, &[]);
        assert_eq!(
            ranked,
            vec![(EntityId(3), 80), (EntityId(2), 50), (EntityId(4), 50)]
        );
        assert_eq!(state.ranked(1, &[EntityId(3)]), vec![(EntityId(2), 50)]);
    }

    #[test]
    fn test_remove_clears_forced() {
        let mut state = ThreatState::new();
        state.add_threat(EntityId(1), 10, 0);
        state.force_target(EntityId(1), 5_000, 0);
        assert_eq!(state.remove(EntityId(1)), Some(10));
        assert!(state.forced.is_none());
        assert!(state.is_empty());
    }
}
