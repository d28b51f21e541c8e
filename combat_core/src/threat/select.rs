//! Target selection - Pure choice of an NPC's next target

use super::ThreatState;
use crate::types::{EntityId, Timestamp};
use tracing::debug;

/// Chosen target plus the corrected threat state to store back
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetSelection {
    pub target_id: Option<EntityId>,
    pub next_threat: ThreatState,
}

/// Pick the entity an NPC should attack.
///
/// A live, valid forced target always wins. A forced target that expired or
/// failed `is_valid` is cleared from `next_threat`. Otherwise the highest
/// threat valid entity is chosen, lowest id on ties. Invalid entries are
/// skipped but stay in the table.
pub fn select_threat_target(
    threat: &ThreatState,
    now: Timestamp,
    is_valid: impl Fn(EntityId) -> bool,
) -> TargetSelection {
    let mut next_threat = threat.clone();

    if let Some(forced) = threat.forced {
        if forced.until > now && is_valid(forced.entity) {
            return TargetSelection {
                target_id: Some(forced.entity),
                next_threat,
            };
        }
        debug!(entity = %forced.entity, until = forced.until, now, "dropping stale forced target");
        next_threat.clear_forced();
    }

    // BTreeMap iteration is ascending by id, so strict `>` keeps the lowest id on ties
    let mut best: Option<(EntityId, u64)> = None;
    for (&entity, &value) in &threat.threat {
        if !is_valid(entity) {
            continue;
        }
        if best.map_or(true, |(_, top)| value > top) {
            best = Some((entity, value));
        }
    }

    TargetSelection {
        target_id: best.map(|(entity, _)| entity),
        next_threat,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(entries: &[(u64, u64)]) -> ThreatState {
        let mut state = ThreatState::new();
        for (id, amount) in entries {
            state.add_threat(EntityId(*id), *amount, 0);
        }
        state
    }

    #[test]
    fn test_forced_target_wins_while_valid() {
        let mut state = table(&[(1, 100), (2, 5)]);
        state.force_target(EntityId(2), 3_000, 1_000);
        let selection = select_threat_target(&state, 2_000, |_| true);
        assert_eq!(selection.target_id, Some(EntityId(2)));
        assert_eq!(selection.next_threat, state);
    }

    #[test]
    fn test_invalid_forced_target_is_cleared() {
        let mut state = table(&[(1, 100), (2, 50), (3, 10)]);
        state.force_target(EntityId(1), 10_000, 0);
        let stealthed = EntityId(1);

        let selection = select_threat_target(&state, 1_000, |e| e != stealthed);
        assert_eq!(selection.target_id, Some(EntityId(2)));
        assert!(selection.next_threat.forced.is_none());
        // Skipped, not deleted
        assert_eq!(selection.next_threat.threat_of(stealthed), 100);

        // Re-invoking with the stale input still never picks the invalid entity
        let again = select_threat_target(&state, 1_000, |e| e != stealthed);
        assert_eq!(again.target_id, Some(EntityId(2)));
        assert!(again.next_threat.forced.is_none());
    }

    #[test]
    fn test_expired_forced_target_is_cleared() {
        let mut state = table(&[(1, 10), (2, 50)]);
        state.force_target(EntityId(1), 1_000, 0);
        let selection = select_threat_target(&state, 1_000, |_| true);
        assert_eq!(selection.target_id, Some(EntityId(2)));
        assert!(selection.next_threat.forced.is_none());
    }

    #[test]
    fn test_tie_picks_lowest_id() {
        let state = table(&[(7, 40), (3, 40), (5, 40)]);
        let selection = select_threat_target(&state, 0, |_| true);
        assert_eq!(selection.target_id, Some(EntityId(3)));
    }

    #[test]
    fn test_no_valid_target() {
        let state = table(&[(1, 40)]);
        let selection = select_threat_target(&state, 0, |_| false);
        assert_eq!(selection.target_id, None);
        assert_eq!(selection.next_threat, state);
    }
}
