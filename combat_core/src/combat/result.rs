//! CombatResult - Outcome of one resolved attack

use crate::effect::AbsorbBreakdown;
use crate::types::{DamageSchool, EntityId};
use serde::{Deserialize, Serialize};

/// How the attack roll went
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HitOutcome {
    #[default]
    Miss,
    Hit,
    Critical,
}

impl HitOutcome {
    pub fn landed(self) -> bool {
        !matches!(self, HitOutcome::Miss)
    }
}

/// Result of resolving an attack against a combatant
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatResult {
    pub attacker: Option<EntityId>,
    pub defender: Option<EntityId>,
    pub outcome: HitOutcome,
    pub school: DamageSchool,

    // === Damage Breakdown ===
    /// Damage after the crit roll, before absorbs
    pub raw_damage: u32,
    /// Damage soaked by absorb shields
    pub absorbed: u32,
    /// Per-shield absorb breakdown, in consumption order
    pub absorb_breakdown: Vec<AbsorbBreakdown>,
    /// Health actually lost
    pub effective_damage: u32,

    // === State Changes ===
    pub life_before: u32,
    pub life_after: u32,
    /// Threat added to the defender's table for the attacker
    pub threat_generated: u64,

    // === Flags ===
    pub is_killing_blow: bool,
}

impl CombatResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Short human-readable summary for logs
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();

        match self.outcome {
            HitOutcome::Miss => return "Missed".to_string(),
            HitOutcome::Critical => parts.push("CRIT".to_string()),
            HitOutcome::Hit => {}
        }

        if self.effective_damage > 0 {
            parts.push(format!("{} damage taken", self.effective_damage));
        }

        if self.absorbed > 0 {
            parts.push(format!("{} absorbed", self.absorbed));
        }

        if self.is_killing_blow {
            parts.push("FATAL".to_string());
        }

        if parts.is_empty() {
            "No damage".to_string()
        } else {
            parts.join(", ")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary() {
        let mut result = CombatResult::new();
        assert_eq!(result.summary(), "Missed");

        result.outcome = HitOutcome::Critical;
        result.effective_damage = 12;
        result.absorbed = 3;
        assert_eq!(result.summary(), "CRIT, 12 damage taken, 3 absorbed");

        result.outcome = HitOutcome::Hit;
        result.effective_damage = 0;
        result.absorbed = 0;
        assert_eq!(result.summary(), "No damage");
    }
}
