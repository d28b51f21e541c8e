//! Combatant - Everything the combat runtime owns for one character or NPC

use crate::cooldown::CooldownTable;
use crate::effect::{
    self, AbsorbResult, ApplyOutcome, EffectSpec, PeriodicFire, PeriodicKind, StatusEffectInstance,
    StatusEffectStore, TickReport, STEALTH_TAG,
};
use crate::gate::{self, Denial, GateRequest};
use crate::resource::ResourcePools;
use crate::threat::ThreatState;
use crate::types::{DamageSchool, EntityId, RoomId, Timestamp};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Player or NPC
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CombatantKind {
    Player,
    /// `social` NPCs answer assist calls from allies in the same room
    Npc { social: bool },
}

/// Hit points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    pub current: u32,
    pub max: u32,
}

impl Health {
    pub fn full(max: u32) -> Self {
        Health { current: max, max }
    }

    pub fn is_alive(&self) -> bool {
        self.current > 0
    }

    /// Remove up to `amount`, returning what was actually removed
    pub fn damage(&mut self, amount: u32) -> u32 {
        let dealt = amount.min(self.current);
        self.current -= dealt;
        dealt
    }

    /// Restore up to `amount` (capped at max), returning what was restored
    pub fn heal(&mut self, amount: u32) -> u32 {
        let healed = amount.min(self.max - self.current.min(self.max));
        self.current += healed;
        healed
    }
}

/// Damage after absorbs have had their turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DamageApplied {
    pub absorb: AbsorbResult,
    /// Health actually lost
    pub dealt: u32,
    pub life_before: u32,
    pub life_after: u32,
    pub is_killing_blow: bool,
}

/// Outcome of one periodic maintenance pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaintenanceReport {
    pub ticks: TickReport,
    pub damage_dealt: u32,
    pub damage_absorbed: u32,
    pub healed: u32,
    pub expired: Vec<StatusEffectInstance>,
    pub died: bool,
}

/// A character or NPC as seen by the combat runtime
#[derive(Debug, Clone, PartialEq)]
pub struct Combatant {
    pub id: EntityId,
    pub kind: CombatantKind,
    pub room: RoomId,
    pub health: Health,
    pub resources: ResourcePools,
    pub cooldowns: CooldownTable,
    pub effects: StatusEffectStore,
    /// Only meaningful for NPCs
    pub threat: ThreatState,
}

impl Combatant {
    pub fn new(id: EntityId, kind: CombatantKind, room: RoomId, max_health: u32, resources: ResourcePools) -> Self {
        Combatant {
            id,
            kind,
            room,
            health: Health::full(max_health),
            resources,
            cooldowns: CooldownTable::new(),
            effects: StatusEffectStore::new(),
            threat: ThreatState::new(),
        }
    }

    pub fn player(id: EntityId, room: RoomId, max_health: u32) -> Self {
        Self::new(id, CombatantKind::Player, room, max_health, ResourcePools::new())
    }

    pub fn npc(id: EntityId, room: RoomId, max_health: u32, social: bool) -> Self {
        Self::new(id, CombatantKind::Npc { social }, room, max_health, ResourcePools::new())
    }

    pub fn is_npc(&self) -> bool {
        matches!(self.kind, CombatantKind::Npc { .. })
    }

    pub fn is_social(&self) -> bool {
        matches!(self.kind, CombatantKind::Npc { social: true })
    }

    pub fn is_alive(&self) -> bool {
        self.health.is_alive()
    }

    pub fn is_stealthed(&self, now: Timestamp) -> bool {
        self.effects.has_active_tag(STEALTH_TAG, now)
    }

    pub fn apply_status_effect(&mut self, spec: &EffectSpec, now: Timestamp) -> ApplyOutcome {
        effect::apply_effect(&mut self.effects, spec, now)
    }

    pub fn resolve_incoming_damage(&mut self, amount: u32, school: DamageSchool, now: Timestamp) -> AbsorbResult {
        effect::resolve_incoming_damage(&mut self.effects, amount, school, now)
    }

    pub fn tick_effects(&mut self, now: Timestamp, on_fire: impl FnMut(&PeriodicFire)) -> TickReport {
        effect::tick_effects(&mut self.effects, now, on_fire)
    }

    pub fn prune_expired_effects(&mut self, now: Timestamp) -> Vec<StatusEffectInstance> {
        effect::prune_expired(&mut self.effects, now)
    }

    pub fn query_active_effects(&self, now: Timestamp, tag: Option<&str>) -> Vec<&StatusEffectInstance> {
        effect::query_active(&self.effects, now, tag)
    }

    /// Strip every instance of `effect_id` (dispel, cleanse, cancel-aura)
    pub fn dispel_effect(&mut self, effect_id: &str) -> Vec<StatusEffectInstance> {
        let removed = self.effects.remove_effect(effect_id);
        if !removed.is_empty() {
            debug!(entity = %self.id, effect = effect_id, count = removed.len(), "dispelled");
        }
        removed
    }

    /// Cooldown and resource gate only
    pub fn attempt_action_gate(&mut self, request: &GateRequest, now: Timestamp) -> Result<(), Denial> {
        gate::attempt(&mut self.cooldowns, &mut self.resources, request, now)
    }

    /// Incapacitation pre-check, then the gate
    pub fn attempt_action(&mut self, request: &GateRequest, now: Timestamp) -> Result<(), Denial> {
        gate::check_incapacitated(&self.effects, now)?;
        self.attempt_action_gate(request, now)
    }

    /// Run damage through absorb shields, then into health
    pub fn apply_damage(&mut self, amount: u32, school: DamageSchool, now: Timestamp) -> DamageApplied {
        let life_before = self.health.current;
        let absorb = self.resolve_incoming_damage(amount, school, now);
        let dealt = self.health.damage(absorb.effective_damage);
        let is_killing_blow = life_before > 0 && !self.health.is_alive();
        if is_killing_blow {
            debug!(entity = %self.id, "combatant died");
        }
        DamageApplied {
            absorb,
            dealt,
            life_before,
            life_after: self.health.current,
            is_killing_blow,
        }
    }

    /// Heal a living combatant. The dead stay dead.
    pub fn heal(&mut self, amount: u32) -> u32 {
        if !self.is_alive() {
            return 0;
        }
        self.health.heal(amount)
    }

    /// Fire due periodic effects into health, then prune.
    ///
    /// Periodic damage goes through absorb shields like any other hit.
    pub fn run_maintenance(&mut self, now: Timestamp) -> MaintenanceReport {
        let mut fires = Vec::new();
        let ticks = effect::tick_effects(&mut self.effects, now, |fire| fires.push(fire.clone()));
        // Catch-up fires land in boundary order across all effects
        fires.sort_by_key(|fire| fire.at);

        let mut report = MaintenanceReport {
            ticks,
            ..MaintenanceReport::default()
        };
        for fire in fires {
            match fire.kind {
                PeriodicKind::Damage => {
                    let applied = self.apply_damage(fire.amount, fire.school, now);
                    report.damage_dealt += applied.dealt;
                    report.damage_absorbed += applied.absorb.absorbed;
                    report.died |= applied.is_killing_blow;
                }
                PeriodicKind::Heal => report.healed += self.heal(fire.amount),
            }
        }
        report.expired = effect::prune_expired(&mut self.effects, now);
        report
    }
}
