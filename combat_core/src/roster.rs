//! Roster - Entity registry exposing the combat runtime by id
//!
//! Every lookup miss (an entity that despawned mid-resolution) is a no-op:
//! `None`, an empty list, a zero report, or `Denial::NotFound` from the gate.

use crate::assist::AssistContext;
use crate::combat::{resolve_attack_with_rng, AttackPacket, CombatResult};
use crate::combatant::Combatant;
use crate::effect::{AbsorbResult, ApplyOutcome, EffectSpec, PeriodicFire, StatusEffectInstance, TickReport};
use crate::gate::{Denial, GateRequest};
use crate::persist::CombatantSnapshot;
use crate::threat::{select_threat_target, ThreatState};
use crate::types::{DamageSchool, EntityId, Timestamp};
use rand::Rng;
use std::collections::BTreeMap;
use tracing::debug;

/// Totals from one world tick
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorldTickReport {
    pub fires: u32,
    pub damage_dealt: u64,
    pub damage_absorbed: u64,
    pub healed: u64,
    pub expired: usize,
    /// Entities killed by periodic damage this tick
    pub deaths: Vec<EntityId>,
}

/// All combatants known to the runtime
#[derive(Debug, Clone, Default)]
pub struct Roster {
    combatants: BTreeMap<EntityId, Combatant>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a combatant
    pub fn insert(&mut self, combatant: Combatant) -> Option<Combatant> {
        self.combatants.insert(combatant.id, combatant)
    }

    /// Despawn a combatant
    pub fn remove(&mut self, id: EntityId) -> Option<Combatant> {
        self.combatants.remove(&id)
    }

    pub fn get(&self, id: EntityId) -> Option<&Combatant> {
        self.combatants.get(&id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Combatant> {
        self.combatants.get_mut(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Combatant> {
        self.combatants.values()
    }

    pub fn len(&self) -> usize {
        self.combatants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.combatants.is_empty()
    }

    pub fn apply_status_effect(&mut self, id: EntityId, spec: &EffectSpec, now: Timestamp) -> Option<ApplyOutcome> {
        self.get_mut(id).map(|c| c.apply_status_effect(spec, now))
    }

    pub fn resolve_incoming_damage(
        &mut self,
        id: EntityId,
        amount: u32,
        school: DamageSchool,
        now: Timestamp,
    ) -> Option<AbsorbResult> {
        self.get_mut(id)
            .map(|c| c.resolve_incoming_damage(amount, school, now))
    }

    pub fn tick_entity_effects(
        &mut self,
        id: EntityId,
        now: Timestamp,
        on_fire: impl FnMut(&PeriodicFire),
    ) -> TickReport {
        self.get_mut(id)
            .map(|c| c.tick_effects(now, on_fire))
            .unwrap_or_default()
    }

    pub fn prune_expired_effects(&mut self, id: EntityId, now: Timestamp) -> Vec<StatusEffectInstance> {
        self.get_mut(id)
            .map(|c| c.prune_expired_effects(now))
            .unwrap_or_default()
    }

    pub fn query_active_effects(&self, id: EntityId, now: Timestamp, tag: Option<&str>) -> Vec<&StatusEffectInstance> {
        self.get(id)
            .map(|c| c.query_active_effects(now, tag))
            .unwrap_or_default()
    }

    pub fn dispel_effect(&mut self, id: EntityId, effect_id: &str) -> Vec<StatusEffectInstance> {
        self.get_mut(id)
            .map(|c| c.dispel_effect(effect_id))
            .unwrap_or_default()
    }

    pub fn attempt_action_gate(&mut self, id: EntityId, request: &GateRequest, now: Timestamp) -> Result<(), Denial> {
        self.get_mut(id)
            .ok_or(Denial::NotFound)?
            .attempt_action_gate(request, now)
    }

    /// Incapacitation pre-check, then the gate
    pub fn attempt_action(&mut self, id: EntityId, request: &GateRequest, now: Timestamp) -> Result<(), Denial> {
        self.get_mut(id)
            .ok_or(Denial::NotFound)?
            .attempt_action(request, now)
    }

    /// Resolve an attack from `attacker` on `defender`
    pub fn resolve_attack(
        &mut self,
        attacker: EntityId,
        defender: EntityId,
        packet: &AttackPacket,
        now: Timestamp,
        rng: &mut impl Rng,
    ) -> Option<CombatResult> {
        if !self.combatants.contains_key(&attacker) {
            return None;
        }
        let target = self.get_mut(defender)?;
        Some(resolve_attack_with_rng(attacker, target, packet, now, rng))
    }

    /// Record aggression on an NPC without a damage roll (taunts, pulls)
    pub fn record_aggression(&mut self, npc: EntityId, attacker: EntityId, amount: u64, now: Timestamp) -> bool {
        match self.get_mut(npc) {
            Some(c) if c.is_npc() => {
                c.threat.add_threat(attacker, amount, now);
                true
            }
            _ => false,
        }
    }

    /// Whether `npc` may currently attack `target`
    pub fn is_valid_target(&self, npc: EntityId, target: EntityId, now: Timestamp) -> bool {
        if npc == target {
            return false;
        }
        let (Some(npc), Some(target)) = (self.get(npc), self.get(target)) else {
            return false;
        };
        target.is_alive() && target.room == npc.room && !target.is_stealthed(now)
    }

    /// Choose an NPC's target and store the corrected threat state
    pub fn select_npc_target(&mut self, npc: EntityId, now: Timestamp) -> Option<EntityId> {
        let state = &self.get(npc)?.threat;
        let selection = select_threat_target(state, now, |target| self.is_valid_target(npc, target, now));

        let combatant = self.get_mut(npc)?;
        if combatant.threat.forced != selection.next_threat.forced {
            debug!(npc = %npc, "forced target cleared");
        }
        combatant.threat = selection.next_threat;
        selection.target_id
    }

    /// Tick and prune every combatant, routing periodic damage through absorbs
    pub fn world_tick(&mut self, now: Timestamp) -> WorldTickReport {
        let mut report = WorldTickReport::default();
        for combatant in self.combatants.values_mut() {
            let maintenance = combatant.run_maintenance(now);
            report.fires += maintenance.ticks.fires;
            report.damage_dealt += maintenance.damage_dealt as u64;
            report.damage_absorbed += maintenance.damage_absorbed as u64;
            report.healed += maintenance.healed as u64;
            report.expired += maintenance.expired.len();
            if maintenance.died {
                report.deaths.push(combatant.id);
            }
        }
        if !report.deaths.is_empty() {
            debug!(deaths = ?report.deaths, "combatants died to periodic damage");
        }
        report
    }

    /// Snapshots of every combatant for out-of-band persistence
    pub fn snapshots(&self) -> Vec<CombatantSnapshot> {
        self.combatants.values().map(CombatantSnapshot::capture).collect()
    }
}

impl AssistContext for Roster {
    fn assist_candidates(&self, npc: EntityId) -> Vec<EntityId> {
        let Some(origin) = self.get(npc) else {
            return Vec::new();
        };
        self.combatants
            .values()
            .filter(|c| c.id != npc && c.room == origin.room && c.is_social() && c.is_alive())
            .map(|c| c.id)
            .collect()
    }

    fn threat_table(&self, npc: EntityId) -> Option<&ThreatState> {
        self.get(npc).filter(|c| c.is_npc()).map(|c| &c.threat)
    }

    fn record_threat(&mut self, assister: EntityId, target: EntityId, amount: u64, now: Timestamp) {
        self.record_aggression(assister, target, amount, now);
    }
}
