//! Absorb resolution - Consuming shields before damage reaches health

use super::instance::StatusEffectInstance;
use super::store::StatusEffectStore;
use crate::types::{DamageSchool, Timestamp};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One shield's contribution to an absorbed hit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbsorbBreakdown {
    pub effect_id: String,
    pub name: String,
    pub priority: i32,
    pub absorbed: u32,
}

/// Result of running a hit through absorb shields
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbsorbResult {
    pub absorbed: u32,
    /// Damage left over for health
    pub effective_damage: u32,
    /// In consumption order
    pub breakdown: Vec<AbsorbBreakdown>,
}

impl AbsorbResult {
    fn unabsorbed(amount: u32) -> Self {
        AbsorbResult {
            absorbed: 0,
            effective_damage: amount,
            breakdown: Vec::new(),
        }
    }
}

/// Consume eligible shields for an incoming hit
///
/// Shields are walked by priority (highest first, earliest applied on ties).
/// A shield whose school list excludes `school` is never touched. Depleted
/// shields flagged `remove_when_depleted` are removed before returning.
pub fn resolve_incoming_damage(
    store: &mut StatusEffectStore,
    amount: u32,
    school: DamageSchool,
    now: Timestamp,
) -> AbsorbResult {
    if amount == 0 {
        return AbsorbResult::unabsorbed(0);
    }

    let mut eligible: Vec<&mut StatusEffectInstance> = store
        .iter_mut()
        .filter(|i| i.is_active(now))
        .filter(|i| i.absorb().is_some_and(|s| s.remaining > 0 && s.allows(school)))
        .collect();
    if eligible.is_empty() {
        return AbsorbResult::unabsorbed(amount);
    }
    eligible.sort_by(|a, b| {
        let pa = a.absorb().map_or(0, |s| s.priority);
        let pb = b.absorb().map_or(0, |s| s.priority);
        pb.cmp(&pa).then(a.sequence.cmp(&b.sequence))
    });

    let mut left = amount;
    let mut breakdown = Vec::new();
    for instance in eligible {
        if left == 0 {
            break;
        }
        let effect_id = instance.effect_id.clone();
        let name = instance.name.clone();
        let Some(shield) = instance.absorb_mut() else {
            continue;
        };
        let taken = shield.consume(left);
        left -= taken;
        breakdown.push(AbsorbBreakdown {
            effect_id,
            name,
            priority: shield.priority,
            absorbed: taken,
        });
    }

    let depleted = store.remove_where(|i| {
        i.absorb()
            .is_some_and(|s| s.is_depleted() && s.remove_when_depleted)
    });

    let result = AbsorbResult {
        absorbed: amount - left,
        effective_damage: left,
        breakdown,
    };
    debug!(
        amount,
        school = ?school,
        absorbed = result.absorbed,
        shields = result.breakdown.len(),
        depleted = depleted.len(),
        "resolved incoming damage"
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::engine::apply_effect;
    use crate::effect::spec::EffectSpec;
    use proptest::prelude::*;

    fn remaining(store: &StatusEffectStore, id: &str) -> Option<u32> {
        store
            .iter()
            .find(|i| i.effect_id == id)
            .and_then(|i| i.absorb())
            .map(|s| s.remaining)
    }

    fn fire_and_any_wards() -> StatusEffectStore {
        let mut store = StatusEffectStore::new();
        let a = EffectSpec::new("fire_ward", "Fire Ward")
            .with_duration(60_000)
            .with_absorb(5, 2, &[DamageSchool::Fire]);
        let b = EffectSpec::new("barrier", "Barrier")
            .with_duration(60_000)
            .with_absorb(5, 1, &[]);
        apply_effect(&mut store, &a, 0);
        apply_effect(&mut store, &b, 0);
        store
    }

    #[test]
    fn test_restricted_shield_skipped_for_other_school() {
        let mut store = fire_and_any_wards();
        let result = resolve_incoming_damage(&mut store, 4, DamageSchool::Physical, 100);

        assert_eq!(result.absorbed, 4);
        assert_eq!(result.effective_damage, 0);
        assert_eq!(result.breakdown.len(), 1);
        assert_eq!(result.breakdown[0].effect_id, "barrier");
        assert_eq!(remaining(&store, "fire_ward"), Some(5));
        assert_eq!(remaining(&store, "barrier"), Some(1));
    }

    #[test]
    fn test_matching_school_spills_by_priority() {
        let mut store = fire_and_any_wards();
        resolve_incoming_damage(&mut store, 4, DamageSchool::Physical, 100);
        let result = resolve_incoming_damage(&mut store, 6, DamageSchool::Fire, 200);

        assert_eq!(result.absorbed, 6);
        assert_eq!(result.effective_damage, 0);
        let order: Vec<(&str, u32)> = result
            .breakdown
            .iter()
            .map(|b| (b.effect_id.as_str(), b.absorbed))
            .collect();
        assert_eq!(order, vec![("fire_ward", 5), ("barrier", 1)]);
        // Both shields are used up and removed
        assert!(store.is_empty());
    }

    #[test]
    fn test_overflow_reaches_health() {
        let mut store = fire_and_any_wards();
        let result = resolve_incoming_damage(&mut store, 12, DamageSchool::Fire, 0);
        assert_eq!(result.absorbed, 10);
        assert_eq!(result.effective_damage, 2);
    }

    #[test]
    fn test_equal_priority_consumes_earliest_first() {
        let mut store = StatusEffectStore::new();
        apply_effect(&mut store, &EffectSpec::new("first", "First").with_absorb(3, 1, &[]), 0);
        apply_effect(&mut store, &EffectSpec::new("second", "Second").with_absorb(3, 1, &[]), 10);
        let result = resolve_incoming_damage(&mut store, 2, DamageSchool::Arcane, 20);
        assert_eq!(result.breakdown[0].effect_id, "first");
        assert_eq!(remaining(&store, "second"), Some(3));
    }

    #[test]
    fn test_expired_shield_is_ignored() {
        let mut store = StatusEffectStore::new();
        apply_effect(
            &mut store,
            &EffectSpec::new("short", "Short Ward").with_duration(1_000).with_absorb(50, 1, &[]),
            0,
        );
        let result = resolve_incoming_damage(&mut store, 10, DamageSchool::Physical, 1_000);
        assert_eq!(result.absorbed, 0);
        assert_eq!(result.effective_damage, 10);
        assert!(result.breakdown.is_empty());
    }

    #[test]
    fn test_kept_when_depleted_if_configured() {
        let mut spec = EffectSpec::new("sticky", "Sticky Ward").with_absorb(5, 1, &[]);
        if let Some(absorb) = spec.absorb.as_mut() {
            absorb.remove_when_depleted = false;
        }
        let mut store = StatusEffectStore::new();
        apply_effect(&mut store, &spec, 0);
        resolve_incoming_damage(&mut store, 20, DamageSchool::Physical, 1);
        assert_eq!(remaining(&store, "sticky"), Some(0));
        let second = resolve_incoming_damage(&mut store, 3, DamageSchool::Physical, 2);
        assert!(second.breakdown.is_empty());
    }

    proptest! {
        #[test]
        fn prop_absorb_accounting(
            shields in prop::collection::vec((1u32..200, -3i32..3, any::<bool>()), 0..6),
            hits in prop::collection::vec((0u32..300, any::<bool>()), 1..8),
        ) {
            let mut store = StatusEffectStore::new();
            for (idx, (amount, priority, fire_only)) in shields.iter().enumerate() {
                let schools: &[DamageSchool] = if *fire_only { &[DamageSchool::Fire] } else { &[] };
                let spec = EffectSpec::new(format!("ward_{idx}"), "Ward").with_absorb(*amount, *priority, schools);
                apply_effect(&mut store, &spec, 0);
            }
            for (now, (amount, fire)) in hits.iter().enumerate() {
                let school = if *fire { DamageSchool::Fire } else { DamageSchool::Frost };
                let fire_only_before: Vec<(String, u32)> = store
                    .iter()
                    .filter_map(|i| i.absorb().filter(|s| !s.schools.is_empty()).map(|s| (i.effect_id.clone(), s.remaining)))
                    .collect();

                let result = resolve_incoming_damage(&mut store, *amount, school, now as u64 + 1);
                prop_assert_eq!(result.absorbed + result.effective_damage, *amount);
                let listed: u32 = result.breakdown.iter().map(|b| b.absorbed).sum();
                prop_assert_eq!(listed, result.absorbed);
                for instance in store.iter() {
                    let shield = instance.absorb().unwrap();
                    prop_assert!(shield.remaining <= shield.amount);
                }
                if !fire {
                    for (id, before) in fire_only_before {
                        let after = remaining(&store, &id);
                        prop_assert_eq!(after, Some(before));
                        prop_assert!(result.breakdown.iter().all(|b| b.effect_id != id));
                    }
                }
            }
        }
    }
}
