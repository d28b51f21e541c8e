//! Prelude module for convenient imports
//!
//! ```rust
//! use combat_core::prelude::*;
//! ```

// Core types
pub use crate::types::{DamageSchool, EntityId, ResourceKind, RoomId, SourceKind, Timestamp};
pub use crate::combatant::{Combatant, CombatantKind};

// Effects
pub use crate::effect::{
    apply_effect, prune_expired, query_active, resolve_incoming_damage, tick_and_prune, tick_effects, ApplyOutcome,
    EffectSpec, PeriodicKind, PeriodicSpec, StackingPolicy, StatusEffectStore,
};

// Gate
pub use crate::cooldown::CooldownBucket;
pub use crate::gate::{ActionCost, Denial, GateRequest};

// Threat and assist
pub use crate::assist::{AssistConfig, AssistCoordinator};
pub use crate::threat::{select_threat_target, ThreatState};

// Combat
pub use crate::combat::{AttackPacket, CombatResult, HitOutcome};
pub use crate::roster::Roster;

// Config
pub use crate::config::{CombatRules, EffectCatalog};
