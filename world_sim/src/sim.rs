//! Simulation - A small party against a wolf pack, driven one world tick at a time

use combat_core::config::EffectCatalog;
use combat_core::prelude::*;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeSet;
use tracing::{debug, info};

const ROOM: RoomId = RoomId(1);

/// One ability in a player's rotation
#[derive(Debug, Clone)]
struct Action {
    key: &'static str,
    bucket: CooldownBucket,
    cooldown_ms: u64,
    cost: ActionCost,
    on_self: &'static [&'static str],
    on_target: &'static [&'static str],
    damage: Option<(u32, DamageSchool)>,
    /// Effect stripped from an afflicted ally; the action is skipped when nobody has it
    cleanse: Option<&'static str>,
}

impl Action {
    fn request(&self) -> GateRequest {
        GateRequest::new(self.bucket, self.key, self.cooldown_ms, self.cost)
    }
}

struct PartyMember {
    id: EntityId,
    name: &'static str,
    rotation: Vec<Action>,
}

fn priest_rotation() -> Vec<Action> {
    vec![
        Action {
            key: "purify",
            bucket: CooldownBucket::Spell,
            cooldown_ms: 8_000,
            cost: ActionCost::new(ResourceKind::Mana, 15),
            on_self: &[],
            on_target: &[],
            damage: None,
            cleanse: Some("knockdown"),
        },
        Action {
            key: "power_word_shield",
            bucket: CooldownBucket::Spell,
            cooldown_ms: 12_000,
            cost: ActionCost::new(ResourceKind::Mana, 30),
            on_self: &["power_word_shield_r2"],
            on_target: &[],
            damage: None,
            cleanse: None,
        },
        Action {
            key: "renew",
            bucket: CooldownBucket::Spell,
            cooldown_ms: 6_000,
            cost: ActionCost::new(ResourceKind::Mana, 20),
            on_self: &["renew"],
            on_target: &[],
            damage: None,
            cleanse: None,
        },
        Action {
            key: "smite",
            bucket: CooldownBucket::Spell,
            cooldown_ms: 2_500,
            cost: ActionCost::new(ResourceKind::Mana, 10),
            on_self: &[],
            on_target: &[],
            damage: Some((14, DamageSchool::Holy)),
            cleanse: None,
        },
    ]
}

fn mage_rotation() -> Vec<Action> {
    vec![
        Action {
            key: "fire_ward",
            bucket: CooldownBucket::Spell,
            cooldown_ms: 30_000,
            cost: ActionCost::new(ResourceKind::Mana, 25),
            on_self: &["fire_ward"],
            on_target: &[],
            damage: None,
            cleanse: None,
        },
        Action {
            key: "fireball",
            bucket: CooldownBucket::Spell,
            cooldown_ms: 3_000,
            cost: ActionCost::new(ResourceKind::Mana, 15),
            on_self: &[],
            on_target: &["ignite"],
            damage: Some((22, DamageSchool::Fire)),
            cleanse: None,
        },
    ]
}

fn rogue_rotation() -> Vec<Action> {
    vec![
        Action {
            key: "hunters_mark",
            bucket: CooldownBucket::Ability,
            cooldown_ms: 10_000,
            cost: ActionCost::new(ResourceKind::Energy, 20),
            on_self: &[],
            on_target: &["hunters_mark"],
            damage: None,
            cleanse: None,
        },
        Action {
            key: "sinister_strike",
            bucket: CooldownBucket::Ability,
            cooldown_ms: 1_000,
            cost: ActionCost::new(ResourceKind::Energy, 40),
            on_self: &[],
            on_target: &[],
            damage: Some((16, DamageSchool::Physical)),
            cleanse: None,
        },
        Action {
            key: "vanish",
            bucket: CooldownBucket::Ability,
            cooldown_ms: 25_000,
            cost: ActionCost::free(ResourceKind::Energy),
            on_self: &["vanish"],
            on_target: &[],
            damage: None,
            cleanse: None,
        },
    ]
}

fn warrior_rotation() -> Vec<Action> {
    vec![
        Action {
            key: "battle_shout",
            bucket: CooldownBucket::Ability,
            cooldown_ms: 60_000,
            cost: ActionCost::new(ResourceKind::Rage, 10),
            on_self: &["battle_shout"],
            on_target: &[],
            damage: None,
            cleanse: None,
        },
        Action {
            key: "sunder_armor",
            bucket: CooldownBucket::Ability,
            cooldown_ms: 1_500,
            cost: ActionCost::new(ResourceKind::Rage, 15),
            on_self: &[],
            on_target: &["sunder_armor"],
            damage: Some((8, DamageSchool::Physical)),
            cleanse: None,
        },
        Action {
            key: "heroic_strike",
            bucket: CooldownBucket::Ability,
            cooldown_ms: 2_000,
            cost: ActionCost::new(ResourceKind::Rage, 20),
            on_self: &[],
            on_target: &[],
            damage: Some((20, DamageSchool::Physical)),
            cleanse: None,
        },
    ]
}

fn pounce() -> GateRequest {
    GateRequest::new(CooldownBucket::Ability, "pounce", 8_000, ActionCost::free(ResourceKind::Focus))
}

/// What happened during one step
#[derive(Debug, Clone, Default)]
pub struct StepSummary {
    pub actions: u32,
    pub denials: u32,
    pub attacks: u32,
    pub assists: usize,
    pub periodic_fires: u32,
    pub deaths: Vec<EntityId>,
}

/// The whole encounter
pub struct Simulation {
    catalog: EffectCatalog,
    rules: CombatRules,
    roster: Roster,
    assist: AssistCoordinator,
    rng: ChaCha8Rng,
    party: Vec<PartyMember>,
    pack: Vec<EntityId>,
    engaged: BTreeSet<EntityId>,
}

impl Simulation {
    pub fn new(catalog: EffectCatalog, rules: CombatRules, seed: u64) -> Self {
        let mut roster = Roster::new();
        let party = vec![
            PartyMember { id: EntityId(1), name: "priest", rotation: priest_rotation() },
            PartyMember { id: EntityId(2), name: "mage", rotation: mage_rotation() },
            PartyMember { id: EntityId(3), name: "rogue", rotation: rogue_rotation() },
            PartyMember { id: EntityId(4), name: "warrior", rotation: warrior_rotation() },
        ];
        for member in &party {
            roster.insert(Combatant::new(member.id, CombatantKind::Player, ROOM, 160, rules.resources.new_pools()));
        }

        // Three social wolves and a bear that keeps to itself
        let pack = vec![EntityId(100), EntityId(101), EntityId(102), EntityId(110)];
        for id in &pack {
            let social = id.as_u64() < 110;
            let health = if social { 140 } else { 260 };
            roster.insert(Combatant::new(*id, CombatantKind::Npc { social }, ROOM, health, rules.resources.new_pools()));
        }

        Simulation {
            catalog,
            assist: AssistCoordinator::new(rules.assist.clone()),
            rules,
            roster,
            rng: ChaCha8Rng::seed_from_u64(seed),
            party,
            pack,
            engaged: BTreeSet::new(),
        }
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    /// Swap in reloaded rules; throttle state carries over
    pub fn set_rules(&mut self, rules: CombatRules) {
        self.assist.set_config(rules.assist.clone());
        self.rules = rules;
    }

    /// Whether either side has been wiped out
    pub fn is_over(&self) -> bool {
        let alive = |id: EntityId| self.roster.get(id).is_some_and(|c| c.is_alive());
        !self.party.iter().any(|m| alive(m.id)) || !self.pack.iter().any(|id| alive(*id))
    }

    pub fn step(&mut self, now: Timestamp) -> StepSummary {
        let mut summary = StepSummary::default();
        self.regenerate();
        self.players_act(now, &mut summary);
        self.npcs_act(now, &mut summary);

        self.assist.purge_throttles(now);
        let tick = self.roster.world_tick(now);
        summary.periodic_fires = tick.fires;
        summary.deaths.extend(tick.deaths);
        summary
    }

    fn regenerate(&mut self) {
        for member in &self.party {
            if let Some(c) = self.roster.get_mut(member.id).filter(|c| c.is_alive()) {
                c.resources.pool_mut(ResourceKind::Mana).gain(4);
                c.resources.pool_mut(ResourceKind::Energy).gain(20);
                c.resources.pool_mut(ResourceKind::Rage).gain(8);
            }
        }
    }

    fn first_living_npc(&self) -> Option<EntityId> {
        self.pack
            .iter()
            .copied()
            .find(|id| self.roster.get(*id).is_some_and(|c| c.is_alive()))
    }

    fn players_act(&mut self, now: Timestamp, summary: &mut StepSummary) {
        for idx in 0..self.party.len() {
            let actor = self.party[idx].id;
            if !self.roster.get(actor).is_some_and(|c| c.is_alive()) {
                continue;
            }
            let Some(target) = self.first_living_npc() else {
                return;
            };

            let rotation = self.party[idx].rotation.clone();
            let mut chosen = None;
            for action in &rotation {
                if action.cleanse.is_some_and(|effect| self.afflicted_ally(effect, now).is_none()) {
                    continue;
                }
                match self.roster.attempt_action(actor, &action.request(), now) {
                    Ok(()) => {
                        chosen = Some(action);
                        break;
                    }
                    Err(denial) => {
                        summary.denials += 1;
                        debug!(actor = %actor, action = action.key, reason = denial.code(), "action denied");
                    }
                }
            }
            let Some(action) = chosen else {
                continue;
            };
            summary.actions += 1;
            debug!(actor = self.party[idx].name, action = action.key, "action used");
            self.execute(actor, target, action, now, summary);
        }
    }

    /// First living party member carrying an active `effect_id`
    fn afflicted_ally(&self, effect_id: &str, now: Timestamp) -> Option<EntityId> {
        self.party.iter().map(|m| m.id).find(|id| {
            self.roster
                .get(*id)
                .is_some_and(|c| c.is_alive() && c.effects.active(now).any(|i| i.effect_id == effect_id))
        })
    }

    fn execute(&mut self, actor: EntityId, target: EntityId, action: &Action, now: Timestamp, summary: &mut StepSummary) {
        if let Some(effect) = action.cleanse {
            if let Some(ally) = self.afflicted_ally(effect, now) {
                let removed = self.roster.dispel_effect(ally, effect);
                debug!(actor = %actor, ally = %ally, effect, count = removed.len(), "cleansed");
            }
        }
        for id in action.on_self {
            if let Some(spec) = self.catalog.get(id) {
                self.roster.apply_status_effect(actor, spec, now);
            }
        }
        for id in action.on_target {
            if let Some(spec) = self.catalog.get(id) {
                self.roster.apply_status_effect(target, spec, now);
            }
        }

        let Some((amount, school)) = action.damage else {
            return;
        };
        let packet = AttackPacket::from_rules(amount, school, &self.rules.hit);
        let Some(result) = self.roster.resolve_attack(actor, target, &packet, now, &mut self.rng) else {
            return;
        };
        summary.attacks += 1;
        if result.is_killing_blow {
            summary.deaths.push(target);
        }

        // First aggression on an NPC calls its friends
        if self.engaged.insert(target) {
            let seed = result.threat_generated.max(1);
            let joined = self.assist.try_assist(&mut self.roster, target, actor, now, seed);
            if joined > 0 {
                info!(npc = %target, attacker = %actor, joined, "pack joins the fight");
            }
            summary.assists += joined;
        }
    }

    fn npcs_act(&mut self, now: Timestamp, summary: &mut StepSummary) {
        for npc in self.pack.clone() {
            if !self.roster.get(npc).is_some_and(|c| c.is_alive()) {
                continue;
            }
            let Some(target) = self.roster.select_npc_target(npc, now) else {
                continue;
            };
            self.engaged.insert(npc);

            if self.rng.gen_bool(0.2) && self.roster.attempt_action(npc, &pounce(), now).is_ok() {
                if let Some(spec) = self.catalog.get("knockdown") {
                    self.roster.apply_status_effect(target, spec, now);
                    debug!(npc = %npc, target = %target, "pounce");
                }
            }

            let bite = AttackPacket::from_rules(11, DamageSchool::Physical, &self.rules.hit);
            if let Some(result) = self.roster.resolve_attack(npc, target, &bite, now, &mut self.rng) {
                summary.attacks += 1;
                if result.is_killing_blow {
                    summary.deaths.push(target);
                }
            }
        }
    }
}
