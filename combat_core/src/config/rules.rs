//! Combat rules - Tunable numbers for assist, resources and hit rolls

use crate::assist::AssistConfig;
use crate::resource::{ResourcePools, ResourceProfile};
use crate::types::ResourceKind;
use serde::{Deserialize, Serialize};

/// Tunable combat rules
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CombatRules {
    #[serde(default)]
    pub assist: AssistConfig,
    #[serde(default)]
    pub resources: ResourceRules,
    #[serde(default)]
    pub hit: HitConstants,
}

/// Per-kind overrides of the built-in resource profiles
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceRules {
    #[serde(default)]
    pub mana: Option<ResourceProfile>,
    #[serde(default)]
    pub energy: Option<ResourceProfile>,
    #[serde(default)]
    pub rage: Option<ResourceProfile>,
    #[serde(default)]
    pub focus: Option<ResourceProfile>,
}

impl ResourceRules {
    pub fn profile(&self, kind: ResourceKind) -> ResourceProfile {
        let configured = match kind {
            ResourceKind::Mana => self.mana,
            ResourceKind::Energy => self.energy,
            ResourceKind::Rage => self.rage,
            ResourceKind::Focus => self.focus,
        };
        configured.unwrap_or_else(|| ResourceProfile::default_for(kind))
    }

    /// Fresh pools using these profiles
    pub fn new_pools(&self) -> ResourcePools {
        ResourcePools::with_profiles(|kind| self.profile(kind))
    }
}

/// Defaults for attack rolls when content does not say otherwise
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HitConstants {
    /// Chance for an attack to land (0.0 - 1.0)
    #[serde(default = "default_hit_chance")]
    pub base_hit_chance: f64,
    /// Chance for a landed attack to crit (0.0 - 1.0)
    #[serde(default = "default_crit_chance")]
    pub base_crit_chance: f64,
    /// Damage multiplier on crit
    #[serde(default = "default_crit_multiplier")]
    pub crit_multiplier: f64,
    /// Threat generated per point of health damage
    #[serde(default = "default_threat_per_damage")]
    pub threat_per_damage: f64,
}

impl Default for HitConstants {
    fn default() -> Self {
        HitConstants {
            base_hit_chance: default_hit_chance(),
            base_crit_chance: default_crit_chance(),
            crit_multiplier: default_crit_multiplier(),
            threat_per_damage: default_threat_per_damage(),
        }
    }
}

fn default_hit_chance() -> f64 {
    0.95
}
fn default_crit_chance() -> f64 {
    0.05
}
fn default_crit_multiplier() -> f64 {
    1.5
}
fn default_threat_per_damage() -> f64 {
    1.0
}
