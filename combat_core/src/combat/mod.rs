//! Combat resolution - Run attack packets against combatants

mod resolution;
mod result;

pub use resolution::{resolve_attack, resolve_attack_with_rng, AttackPacket};
pub use result::{CombatResult, HitOutcome};
