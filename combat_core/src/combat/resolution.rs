//! Attack resolution - Hit roll, crit roll, absorbs, health and threat

use super::result::{CombatResult, HitOutcome};
use crate::combatant::Combatant;
use crate::config::HitConstants;
use crate::types::{DamageSchool, EntityId, Timestamp};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One incoming attack
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttackPacket {
    pub amount: u32,
    pub school: DamageSchool,
    /// Chance to land (0.0 - 1.0)
    pub hit_chance: f64,
    /// Chance for a landed attack to crit (0.0 - 1.0)
    pub crit_chance: f64,
    pub crit_multiplier: f64,
    /// Threat per point of damage landed (absorbed damage counts)
    pub threat_multiplier: f64,
}

impl AttackPacket {
    /// An attack that always lands and never crits
    pub fn new(amount: u32, school: DamageSchool) -> Self {
        AttackPacket {
            amount,
            school,
            hit_chance: 1.0,
            crit_chance: 0.0,
            crit_multiplier: 1.5,
            threat_multiplier: 1.0,
        }
    }

    /// An attack using the configured base chances
    pub fn from_rules(amount: u32, school: DamageSchool, rules: &HitConstants) -> Self {
        AttackPacket {
            amount,
            school,
            hit_chance: rules.base_hit_chance,
            crit_chance: rules.base_crit_chance,
            crit_multiplier: rules.crit_multiplier,
            threat_multiplier: rules.threat_per_damage,
        }
    }

    fn crit_amount(&self) -> u32 {
        let scaled = (self.amount as f64 * self.crit_multiplier.max(1.0)).floor();
        scaled.min(u32::MAX as f64) as u32
    }
}

/// Resolve an attack using the thread RNG
pub fn resolve_attack(
    attacker: EntityId,
    defender: &mut Combatant,
    packet: &AttackPacket,
    now: Timestamp,
) -> CombatResult {
    let mut rng = rand::thread_rng();
    resolve_attack_with_rng(attacker, defender, packet, now, &mut rng)
}

/// Resolve an attack with a provided RNG (for deterministic runs and tests)
///
/// 1. Hit roll, then a crit roll for landed attacks
/// 2. Damage through the defender's absorb shields, then health
/// 3. NPC defenders record threat on the attacker, including on a miss
pub fn resolve_attack_with_rng(
    attacker: EntityId,
    defender: &mut Combatant,
    packet: &AttackPacket,
    now: Timestamp,
    rng: &mut impl Rng,
) -> CombatResult {
    let mut result = CombatResult::new();
    result.attacker = Some(attacker);
    result.defender = Some(defender.id);
    result.school = packet.school;
    result.life_before = defender.health.current;
    result.life_after = defender.health.current;

    // Step 1: Rolls
    result.outcome = if rng.gen::<f64>() >= packet.hit_chance {
        HitOutcome::Miss
    } else if rng.gen::<f64>() < packet.crit_chance {
        HitOutcome::Critical
    } else {
        HitOutcome::Hit
    };

    // Step 2: Absorbs then health
    if result.outcome.landed() {
        result.raw_damage = match result.outcome {
            HitOutcome::Critical => packet.crit_amount(),
            _ => packet.amount,
        };
        let applied = defender.apply_damage(result.raw_damage, packet.school, now);
        result.absorbed = applied.absorb.absorbed;
        result.absorb_breakdown = applied.absorb.breakdown;
        result.effective_damage = applied.dealt;
        result.life_after = applied.life_after;
        result.is_killing_blow = applied.is_killing_blow;
    }

    // Step 3: Threat
    if defender.is_npc() {
        let landed = (result.absorbed + result.effective_damage) as f64;
        let threat = ((landed * packet.threat_multiplier.max(0.0)).floor() as u64).max(1);
        defender.threat.add_threat(attacker, threat, now);
        result.threat_generated = threat;
    }

    debug!(
        attacker = %attacker,
        defender = %defender.id,
        outcome = ?result.outcome,
        raw = result.raw_damage,
        absorbed = result.absorbed,
        dealt = result.effective_damage,
        "attack resolved"
    );
    result
}
