//! Status effects - Buffs, debuffs, periodic effects and absorb shields
//!
//! Content supplies an [`EffectSpec`]; applying it produces a
//! [`StatusEffectInstance`] whose behavior is resolved once into an
//! [`EffectBehavior`]. Instances live in a per-entity [`StatusEffectStore`]
//! and are driven by the free functions in [`engine`] and [`absorb`].

pub mod absorb;
pub mod engine;
mod instance;
mod spec;
pub mod store;

pub use absorb::{resolve_incoming_damage, AbsorbBreakdown, AbsorbResult};
pub use engine::{
    apply_effect, prune_expired, query_active, tick_and_prune, tick_effects, ApplyOutcome, PeriodicFire,
    TickReport,
};
pub use instance::{AbsorbShield, EffectBehavior, PeriodicTicker, StackCount, StatusEffectInstance};
pub use spec::{
    AbsorbSpec, EffectSource, EffectSpec, ModifierBag, PeriodicKind, PeriodicSpec, StackingPolicy, StackingRule,
};
pub use store::{ActiveEffectsBucket, BucketKey, StatusEffectStore};

/// Tags that block every action while active
pub const INCAPACITATING_TAGS: &[&str] = &["stunned", "knocked_down", "incapacitated"];

/// Tag that hides an entity from NPC targeting
pub const STEALTH_TAG: &str = "stealth";
