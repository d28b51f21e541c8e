//! combat_core - Combat resolution runtime for a persistent text world
//!
//! This library provides:
//! - StatusEffectStore / engine: Buffs, debuffs, DoT/HoT ticking and absorb shields
//! - CastingGate: Atomic cooldown + resource check-then-commit for actions
//! - ThreatState / TargetSelector: NPC threat tables and forced targeting
//! - AssistCoordinator: Pulling nearby social NPCs into a fight
//! - Roster: Entity registry driving all of the above by id
//!
//! Time is always supplied by the caller as milliseconds and randomness is
//! injected, so identical inputs give identical outcomes.

pub mod assist;
pub mod combat;
pub mod combatant;
pub mod config;
pub mod cooldown;
pub mod effect;
pub mod gate;
pub mod persist;
pub mod prelude;
pub mod resource;
pub mod roster;
pub mod threat;
pub mod types;

// Re-export core types for convenience
pub use assist::{AssistConfig, AssistContext, AssistCoordinator};
pub use combat::{AttackPacket, CombatResult, HitOutcome};
pub use combatant::{Combatant, CombatantKind, Health};
pub use config::{CombatRules, ConfigError, EffectCatalog};
pub use cooldown::{CooldownBucket, CooldownTable};
pub use effect::{AbsorbResult, ApplyOutcome, EffectSpec, StatusEffectInstance, StatusEffectStore};
pub use gate::{ActionCost, Denial, GateRequest};
pub use persist::{CombatantSnapshot, JsonLinesSink, PersistError, SnapshotSink};
pub use resource::{PowerResourcePool, ResourcePools, ResourceProfile};
pub use roster::{Roster, WorldTickReport};
pub use threat::{select_threat_target, TargetSelection, ThreatState};
pub use types::{DamageSchool, EntityId, ResourceKind, RoomId, SourceKind, Timestamp};
