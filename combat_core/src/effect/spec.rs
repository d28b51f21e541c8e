//! EffectSpec - Content-supplied description of a status effect

use crate::types::{DamageSchool, SourceKind};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Conflict resolution among effects sharing a stacking group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StackingPolicy {
    /// Each application is kept as its own instance, up to max stacks
    Stack,
    /// A new application replaces everything in the group
    Overwrite,
    /// Same source resets the timer, a new source adds an instance
    Refresh,
}

/// Stacking group membership
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StackingRule {
    pub group: String,
    pub policy: StackingPolicy,
}

/// Who granted an effect
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EffectSource {
    #[serde(default)]
    pub kind: SourceKind,
    /// Ability/spell/item id (e.g. "power_word_shield_r2")
    pub id: String,
}

impl EffectSource {
    pub fn new(kind: SourceKind, id: impl Into<String>) -> Self {
        EffectSource { kind, id: id.into() }
    }
}

/// Numeric adjustments consumed by damage math elsewhere. Opaque here.
pub type ModifierBag = BTreeMap<String, f64>;

/// Absorb shield parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbsorbSpec {
    pub amount: u32,
    /// Higher priority shields are consumed first
    #[serde(default)]
    pub priority: i32,
    /// Schools this shield absorbs. Empty means any school.
    #[serde(default)]
    pub schools: Vec<DamageSchool>,
    /// Remove the effect as soon as the shield is used up
    #[serde(default = "default_remove_when_depleted")]
    pub remove_when_depleted: bool,
}

fn default_remove_when_depleted() -> bool {
    true
}

/// Direction of a periodic effect
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodicKind {
    #[default]
    Damage,
    Heal,
}

/// Damage/heal over time parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodicSpec {
    /// Zero or missing disables periodic behavior
    #[serde(default)]
    pub tick_interval_ms: u64,
    /// Configured amount (total if spread, per tick otherwise)
    pub amount: u32,
    /// Divide `amount` across the ticks of the effect's duration
    #[serde(default)]
    pub spread_across_ticks: bool,
    #[serde(default)]
    pub kind: PeriodicKind,
    #[serde(default)]
    pub school: DamageSchool,
}

/// Full effect definition as supplied by ability/spell content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectSpec {
    /// Unique effect identifier (e.g. "renew_r1")
    pub id: String,
    /// Display name
    pub name: String,
    #[serde(default)]
    pub source: EffectSource,
    /// Lifetime in milliseconds. Missing means it never expires on its own.
    #[serde(default)]
    pub duration_ms: Option<u64>,
    #[serde(default = "default_max_stacks")]
    pub max_stacks: u32,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub modifiers: ModifierBag,
    #[serde(default)]
    pub absorb: Option<AbsorbSpec>,
    #[serde(default)]
    pub periodic: Option<PeriodicSpec>,
    #[serde(default)]
    pub stacking: Option<StackingRule>,
}

fn default_max_stacks() -> u32 {
    1
}

impl EffectSpec {
    /// Create a plain modifier effect with no stacking group
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        EffectSpec {
            id: id.into(),
            name: name.into(),
            source: EffectSource::default(),
            duration_ms: None,
            max_stacks: 1,
            tags: BTreeSet::new(),
            modifiers: ModifierBag::new(),
            absorb: None,
            periodic: None,
            stacking: None,
        }
    }

    pub fn with_source(mut self, kind: SourceKind, id: impl Into<String>) -> Self {
        self.source = EffectSource::new(kind, id);
        self
    }

    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    pub fn with_modifier(mut self, name: impl Into<String>, value: f64) -> Self {
        self.modifiers.insert(name.into(), value);
        self
    }

    pub fn with_absorb(mut self, amount: u32, priority: i32, schools: &[DamageSchool]) -> Self {
        self.absorb = Some(AbsorbSpec {
            amount,
            priority,
            schools: schools.to_vec(),
            remove_when_depleted: true,
        });
        self
    }

    pub fn with_periodic(mut self, periodic: PeriodicSpec) -> Self {
        self.periodic = Some(periodic);
        self
    }

    pub fn with_stacking(mut self, group: impl Into<String>, policy: StackingPolicy, max_stacks: u32) -> Self {
        self.stacking = Some(StackingRule {
            group: group.into(),
            policy,
        });
        self.max_stacks = max_stacks;
        self
    }
}
