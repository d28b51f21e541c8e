//! StatusEffectInstance - A live effect on an entity

use super::spec::{EffectSource, EffectSpec, ModifierBag, PeriodicKind, StackingRule};
use crate::types::{DamageSchool, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::warn;

/// Current and maximum stack count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackCount {
    pub current: u32,
    pub max: u32,
}

/// Remaining capacity of an absorb shield
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbsorbShield {
    pub amount: u32,
    /// Always `<= amount`
    pub remaining: u32,
    pub priority: i32,
    /// Empty means any school
    pub schools: Vec<DamageSchool>,
    pub remove_when_depleted: bool,
}

impl AbsorbShield {
    pub fn allows(&self, school: DamageSchool) -> bool {
        self.schools.is_empty() || self.schools.contains(&school)
    }

    pub fn is_depleted(&self) -> bool {
        self.remaining == 0
    }

    /// Consume up to `amount`, returning what was absorbed
    pub(crate) fn consume(&mut self, amount: u32) -> u32 {
        let taken = self.remaining.min(amount);
        self.remaining -= taken;
        taken
    }
}

/// Schedule of a damage/heal over time effect
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodicTicker {
    pub interval_ms: u64,
    pub per_tick: u32,
    pub next_tick_at: Timestamp,
    pub spread_across_ticks: bool,
    /// Leftover of a spread total, paid one point per fire on the first fires
    #[serde(default)]
    pub remainder: u32,
    /// Fires that still owe one point of `remainder` in the current window
    #[serde(default)]
    pub carry_left: u32,
    pub kind: PeriodicKind,
    pub school: DamageSchool,
}

impl PeriodicTicker {
    /// Amount of the next fire, consuming one point of carry if any is owed
    pub(crate) fn take_fire_amount(&mut self) -> u32 {
        if self.carry_left > 0 {
            self.carry_left -= 1;
            self.per_tick + 1
        } else {
            self.per_tick
        }
    }
}

/// What an effect does, resolved once when it is applied
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EffectBehavior {
    /// Only carries tags/modifiers
    Modifier,
    Absorb(AbsorbShield),
    Periodic(PeriodicTicker),
}

impl EffectBehavior {
    /// Resolve the optional content sub-objects into exactly one behavior.
    ///
    /// Malformed content degrades to a safe behavior instead of failing.
    pub fn resolve(spec: &EffectSpec, now: Timestamp) -> Self {
        let periodic = spec.periodic.as_ref().filter(|p| {
            if p.tick_interval_ms == 0 {
                warn!(effect = %spec.id, "periodic effect without tick interval, ignoring periodic part");
                false
            } else if p.amount == 0 {
                warn!(effect = %spec.id, "periodic effect with zero amount, ignoring periodic part");
                false
            } else if p.spread_across_ticks && spec.duration_ms.is_none() {
                warn!(effect = %spec.id, "spread periodic effect without duration, ignoring periodic part");
                false
            } else {
                true
            }
        });

        if let Some(p) = periodic {
            if spec.absorb.is_some() {
                warn!(effect = %spec.id, "effect has both periodic and absorb parts, using periodic");
            }
            let (per_tick, remainder) = match spec.duration_ms {
                Some(duration) if p.spread_across_ticks => {
                    let ticks = (duration / p.tick_interval_ms).max(1);
                    let amount = p.amount as u64;
                    ((amount / ticks) as u32, (amount % ticks) as u32)
                }
                _ => (p.amount, 0),
            };
            return EffectBehavior::Periodic(PeriodicTicker {
                interval_ms: p.tick_interval_ms,
                per_tick,
                next_tick_at: now.saturating_add(p.tick_interval_ms),
                spread_across_ticks: p.spread_across_ticks,
                remainder,
                carry_left: remainder,
                kind: p.kind,
                school: p.school,
            });
        }

        match &spec.absorb {
            Some(a) if a.amount > 0 => EffectBehavior::Absorb(AbsorbShield {
                amount: a.amount,
                remaining: a.amount,
                priority: a.priority,
                schools: a.schools.clone(),
                remove_when_depleted: a.remove_when_depleted,
            }),
            _ => EffectBehavior::Modifier,
        }
    }
}

/// An active effect on an entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusEffectInstance {
    pub effect_id: String,
    pub name: String,
    pub source: EffectSource,
    pub applied_at: Timestamp,
    pub duration_ms: Option<u64>,
    pub expires_at: Timestamp,
    pub stacks: StackCount,
    pub tags: BTreeSet<String>,
    pub modifiers: ModifierBag,
    pub behavior: EffectBehavior,
    pub stacking: Option<StackingRule>,
    /// Application order within the owning store
    pub sequence: u64,
}

impl StatusEffectInstance {
    /// Build a fresh instance with full duration and full shield capacity
    pub fn from_spec(spec: &EffectSpec, now: Timestamp, sequence: u64) -> Self {
        StatusEffectInstance {
            effect_id: spec.id.clone(),
            name: spec.name.clone(),
            source: spec.source.clone(),
            applied_at: now,
            duration_ms: spec.duration_ms,
            expires_at: expiry(now, spec.duration_ms),
            stacks: StackCount {
                current: 1,
                max: spec.max_stacks.max(1),
            },
            tags: spec.tags.clone(),
            modifiers: spec.modifiers.clone(),
            behavior: EffectBehavior::resolve(spec, now),
            stacking: spec.stacking.clone(),
            sequence,
        }
    }

    pub fn is_expired(&self, now: Timestamp) -> bool {
        now >= self.expires_at
    }

    pub fn is_active(&self, now: Timestamp) -> bool {
        !self.is_expired(now)
    }

    /// Dead instances must be removed by the next prune
    pub fn is_dead(&self, now: Timestamp) -> bool {
        if self.is_expired(now) {
            return true;
        }
        matches!(&self.behavior, EffectBehavior::Absorb(shield) if shield.is_depleted() && shield.remove_when_depleted)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// Milliseconds left before expiry (`u64::MAX` for permanent effects)
    pub fn remaining_ms(&self, now: Timestamp) -> u64 {
        self.expires_at.saturating_sub(now)
    }

    pub fn absorb(&self) -> Option<&AbsorbShield> {
        match &self.behavior {
            EffectBehavior::Absorb(shield) => Some(shield),
            _ => None,
        }
    }

    pub fn absorb_mut(&mut self) -> Option<&mut AbsorbShield> {
        match &mut self.behavior {
            EffectBehavior::Absorb(shield) => Some(shield),
            _ => None,
        }
    }

    pub fn periodic(&self) -> Option<&PeriodicTicker> {
        match &self.behavior {
            EffectBehavior::Periodic(ticker) => Some(ticker),
            _ => None,
        }
    }

    /// Reset the timing window as if applied at `now`
    pub(crate) fn refresh(&mut self, now: Timestamp) {
        self.applied_at = now;
        self.expires_at = expiry(now, self.duration_ms);
        if let EffectBehavior::Periodic(ticker) = &mut self.behavior {
            ticker.next_tick_at = now.saturating_add(ticker.interval_ms);
            ticker.carry_left = ticker.remainder;
        }
    }
}

fn expiry(now: Timestamp, duration_ms: Option<u64>) -> Timestamp {
    match duration_ms {
        Some(d) => now.saturating_add(d),
        None => Timestamp::MAX,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::spec::PeriodicSpec;

    fn dot_spec(amount: u32, spread: bool) -> EffectSpec {
        EffectSpec::new("corruption", "Corruption")
            .with_duration(12_000)
            .with_periodic(PeriodicSpec {
                tick_interval_ms: 3_000,
                amount,
                spread_across_ticks: spread,
                kind: PeriodicKind::Damage,
                school: DamageSchool::Shadow,
            })
    }

    #[test]
    fn test_spread_divides_amount_over_ticks() {
        let instance = StatusEffectInstance::from_spec(&dot_spec(100, true), 0, 0);
        // 12000 / 3000 = 4 ticks, 100 / 4 = 25
        assert_eq!(instance.periodic().unwrap().per_tick, 25);
        assert_eq!(instance.periodic().unwrap().next_tick_at, 3_000);
    }

    fn spread_fires(amount: u32) -> Vec<u32> {
        let mut instance = StatusEffectInstance::from_spec(&dot_spec(amount, true), 0, 0);
        let EffectBehavior::Periodic(ticker) = &mut instance.behavior else {
            return Vec::new();
        };
        (0..4).map(|_| ticker.take_fire_amount()).collect()
    }

    #[test]
    fn test_spread_pays_remainder_on_first_fires() {
        assert_eq!(spread_fires(10), vec![3, 3, 2, 2]);
        assert_eq!(spread_fires(2), vec![1, 1, 0, 0]);
        assert_eq!(spread_fires(10).iter().sum::<u32>(), 10);
        assert_eq!(spread_fires(101).iter().sum::<u32>(), 101);
    }

    #[test]
    fn test_zero_amount_periodic_is_modifier() {
        let instance = StatusEffectInstance::from_spec(&dot_spec(0, true), 0, 0);
        assert_eq!(instance.behavior, EffectBehavior::Modifier);
    }

    #[test]
    fn test_spread_without_duration_is_modifier() {
        let mut spec = dot_spec(40, true);
        spec.duration_ms = None;
        let instance = StatusEffectInstance::from_spec(&spec, 0, 0);
        assert_eq!(instance.behavior, EffectBehavior::Modifier);

        // Unspread periodic effects may run forever
        let mut spec = dot_spec(40, false);
        spec.duration_ms = None;
        let instance = StatusEffectInstance::from_spec(&spec, 0, 0);
        assert_eq!(instance.periodic().unwrap().per_tick, 40);
    }

    #[test]
    fn test_refresh_restores_spread_carry() {
        let mut instance = StatusEffectInstance::from_spec(&dot_spec(10, true), 0, 0);
        if let EffectBehavior::Periodic(ticker) = &mut instance.behavior {
            ticker.take_fire_amount();
            ticker.take_fire_amount();
            assert_eq!(ticker.carry_left, 0);
        }
        instance.refresh(6_000);
        assert_eq!(instance.periodic().unwrap().carry_left, 2);
    }

    #[test]
    fn test_unspread_uses_full_amount_per_tick() {
        let instance = StatusEffectInstance::from_spec(&dot_spec(100, false), 0, 0);
        assert_eq!(instance.periodic().unwrap().per_tick, 100);
    }

    #[test]
    fn test_zero_interval_degrades_to_modifier() {
        let mut spec = dot_spec(100, false);
        spec.periodic.as_mut().unwrap().tick_interval_ms = 0;
        let instance = StatusEffectInstance::from_spec(&spec, 0, 0);
        assert_eq!(instance.behavior, EffectBehavior::Modifier);
    }

    #[test]
    fn test_periodic_wins_over_absorb() {
        let spec = dot_spec(10, false).with_absorb(50, 1, &[]);
        let instance = StatusEffectInstance::from_spec(&spec, 0, 0);
        assert!(instance.periodic().is_some());
        assert!(instance.absorb().is_none());
    }

    #[test]
    fn test_zero_absorb_is_modifier() {
        let spec = EffectSpec::new("empty", "Empty Ward").with_absorb(0, 1, &[]);
        let instance = StatusEffectInstance::from_spec(&spec, 0, 0);
        assert_eq!(instance.behavior, EffectBehavior::Modifier);
    }

    #[test]
    fn test_expiry_boundary() {
        let spec = EffectSpec::new("haste", "Haste").with_duration(5_000);
        let instance = StatusEffectInstance::from_spec(&spec, 1_000, 0);
        assert!(instance.is_active(5_999));
        assert!(instance.is_expired(6_000));
    }

    #[test]
    fn test_permanent_effect_never_expires() {
        let instance = StatusEffectInstance::from_spec(&EffectSpec::new("aura", "Aura"), 0, 0);
        assert!(instance.is_active(u64::MAX - 1));
    }

    #[test]
    fn test_depleted_shield_is_dead() {
        let spec = EffectSpec::new("ward", "Ward").with_absorb(10, 0, &[]);
        let mut instance = StatusEffectInstance::from_spec(&spec, 0, 0);
        assert!(!instance.is_dead(1));
        instance.absorb_mut().unwrap().consume(10);
        assert!(instance.is_dead(1));

        instance.absorb_mut().unwrap().remove_when_depleted = false;
        assert!(!instance.is_dead(1));
    }

    #[test]
    fn test_refresh_reanchors_ticks() {
        let mut instance = StatusEffectInstance::from_spec(&dot_spec(30, false), 0, 0);
        instance.refresh(5_000);
        assert_eq!(instance.expires_at, 17_000);
        assert_eq!(instance.periodic().unwrap().next_tick_at, 8_000);
    }
}
