//! Integration test: Load content -> Gate -> Apply effects -> Attack -> World tick -> NPC AI
//!
//! Drives the runtime through the roster the way a command handler and the
//! world tick would, using the shipped content files.

use combat_core::config::{load_effect_catalog, load_toml, EffectCatalog, EFFECTS_FILE, RULES_FILE};
use combat_core::effect::{BucketKey, PeriodicKind};
use combat_core::persist::{persist_best_effort, JsonLinesSink};
use combat_core::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::path::{Path, PathBuf};

const PRIEST: EntityId = EntityId(1);
const ROGUE: EntityId = EntityId(2);
const WARRIOR: EntityId = EntityId(3);
const WOLF: EntityId = EntityId(100);
const PACKMATE: EntityId = EntityId(101);

fn content_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../content")
}

fn catalog() -> EffectCatalog {
    load_effect_catalog(&content_dir().join(EFFECTS_FILE)).expect("effects.toml should load")
}

fn spec(catalog: &EffectCatalog, id: &str) -> EffectSpec {
    catalog.lookup(id).expect("effect should exist").clone()
}

fn world(rules: &CombatRules) -> Roster {
    let mut roster = Roster::new();
    for (id, kind, hp) in [
        (PRIEST, CombatantKind::Player, 120),
        (ROGUE, CombatantKind::Player, 100),
        (WARRIOR, CombatantKind::Player, 150),
        (WOLF, CombatantKind::Npc { social: true }, 200),
        (PACKMATE, CombatantKind::Npc { social: true }, 200),
    ] {
        roster.insert(Combatant::new(id, kind, RoomId(7), hp, rules.resources.new_pools()));
    }
    roster
}

fn shield_remaining(roster: &Roster, id: EntityId) -> Vec<(String, u32)> {
    roster
        .get(id)
        .unwrap()
        .effects
        .iter()
        .filter_map(|i| i.absorb().map(|s| (i.source.id.clone(), s.remaining)))
        .collect()
}

#[test]
fn test_content_files_load() {
    let catalog = catalog();
    assert!(catalog.len() >= 10);
    let rules: CombatRules = load_toml(&content_dir().join(RULES_FILE)).unwrap();
    assert_eq!(rules.assist.throttle_ms, 4_000);
    assert_eq!(rules.resources.profile(ResourceKind::Rage).max, 100);
}

#[test]
fn test_gate_then_apply_flow() {
    let catalog = catalog();
    let rules = CombatRules::default();
    let mut roster = world(&rules);

    let cast = GateRequest::new(CooldownBucket::Spell, "power_word_shield", 4_000, ActionCost::new(ResourceKind::Mana, 30));
    assert!(roster.attempt_action(PRIEST, &cast, 0).is_ok());
    roster.apply_status_effect(PRIEST, &spec(&catalog, "power_word_shield_r1"), 0);

    // Recast inside the cooldown: denied, mana untouched
    let denial = roster.attempt_action(PRIEST, &cast, 1_000).unwrap_err();
    assert_eq!(denial.code(), "on_cooldown");
    assert_eq!(roster.get(PRIEST).unwrap().resources.current(ResourceKind::Mana), 70);

    // Drain mana and wait out the cooldown: denied for cost, no cooldown restarted
    roster.get_mut(PRIEST).unwrap().resources.pool_mut(ResourceKind::Mana).spend(50);
    let ready_at = roster.get(PRIEST).unwrap().cooldowns.ready_at(CooldownBucket::Spell, "power_word_shield");
    let denial = roster.attempt_action(PRIEST, &cast, 5_000).unwrap_err();
    assert_eq!(denial.code(), "insufficient_resource");
    assert_eq!(
        roster.get(PRIEST).unwrap().cooldowns.ready_at(CooldownBucket::Spell, "power_word_shield"),
        ready_at
    );
}

#[test]
fn test_absorb_priority_and_school_filter() {
    let mut store = StatusEffectStore::new();
    let a = EffectSpec::new("a", "Fire Ward").with_duration(60_000).with_absorb(5, 2, &[DamageSchool::Fire]);
    let b = EffectSpec::new("b", "Barrier").with_duration(60_000).with_absorb(5, 1, &[]);
    apply_effect(&mut store, &a, 0);
    apply_effect(&mut store, &b, 0);

    let first = resolve_incoming_damage(&mut store, 4, DamageSchool::Physical, 10);
    assert_eq!(first.absorbed, 4);
    assert_eq!(first.breakdown.len(), 1);
    assert_eq!(first.breakdown[0].effect_id, "b");

    let second = resolve_incoming_damage(&mut store, 6, DamageSchool::Fire, 20);
    assert_eq!(second.effective_damage, 0);
    let consumed: Vec<(&str, u32)> = second.breakdown.iter().map(|x| (x.effect_id.as_str(), x.absorbed)).collect();
    assert_eq!(consumed, vec![("a", 5), ("b", 1)]);
}

#[test]
fn test_stacking_overwrite_upgrade() {
    let catalog = catalog();
    let mut roster = world(&CombatRules::default());
    roster.apply_status_effect(PRIEST, &spec(&catalog, "power_word_shield_r1"), 0);
    roster.resolve_incoming_damage(PRIEST, 35, DamageSchool::Physical, 1_000);
    assert_eq!(shield_remaining(&roster, PRIEST), vec![("power_word_shield_r1".to_string(), 15)]);

    let outcome = roster
        .apply_status_effect(PRIEST, &spec(&catalog, "power_word_shield_r2"), 2_000)
        .unwrap();
    assert!(matches!(outcome, ApplyOutcome::Replaced { .. }));

    let priest = roster.get(PRIEST).unwrap();
    let bucket = priest
        .effects
        .bucket(&BucketKey::Group("power_word_shield".to_string()))
        .unwrap();
    assert_eq!(bucket.len(), 1);
    assert_eq!(shield_remaining(&roster, PRIEST), vec![("power_word_shield_r2".to_string(), 90)]);
}

#[test]
fn test_dot_tick_count_is_deterministic() {
    let per_tick = 7;
    let dot = EffectSpec::new("ignite", "Ignite").with_duration(60_000).with_periodic(PeriodicSpec {
        tick_interval_ms: 2_000,
        amount: per_tick,
        spread_across_ticks: false,
        kind: PeriodicKind::Damage,
        school: DamageSchool::Fire,
    });
    let mut store = StatusEffectStore::new();
    apply_effect(&mut store, &dot, 0);

    let t0 = 2_000;
    let mut total = 0;
    for now in [t0, t0 + 2_000, t0 + 4_000] {
        tick_effects(&mut store, now, |fire| total += fire.amount);
    }
    assert_eq!(total, 3 * per_tick);
}

#[test]
fn test_stale_forced_target_never_reselected() {
    let mut state = ThreatState::new();
    state.add_threat(ROGUE, 500, 0);
    state.add_threat(WARRIOR, 300, 0);
    state.add_threat(PRIEST, 100, 0);
    state.force_target(ROGUE, 10_000, 0);

    let is_valid = |e: EntityId| e != ROGUE;
    let first = select_threat_target(&state, 1_000, is_valid);
    assert_eq!(first.target_id, Some(WARRIOR));
    assert!(first.next_threat.forced.is_none());

    let stale_again = select_threat_target(&state, 1_100, is_valid);
    assert_eq!(stale_again.target_id, Some(WARRIOR));

    let from_next = select_threat_target(&first.next_threat, 1_200, is_valid);
    assert_eq!(from_next.target_id, Some(WARRIOR));
}

#[test]
fn test_assist_throttle_one_seed() {
    let mut roster = world(&CombatRules::default());
    roster.record_aggression(WOLF, WARRIOR, 40, 0);
    let mut coordinator = AssistCoordinator::new(AssistConfig::default());

    assert_eq!(coordinator.try_assist(&mut roster, WOLF, WARRIOR, 10_000, 10), 1);
    assert_eq!(coordinator.try_assist(&mut roster, WOLF, WARRIOR, 11_000, 10), 0);
    assert_eq!(roster.get(PACKMATE).unwrap().threat.threat_of(WARRIOR), 20);
}

#[test]
fn test_knockdown_precheck_leaves_state_untouched() {
    let catalog = catalog();
    let mut roster = world(&CombatRules::default());
    roster.apply_status_effect(WARRIOR, &spec(&catalog, "knockdown"), 0);
    roster.get_mut(WARRIOR).unwrap().resources.pool_mut(ResourceKind::Rage).gain(50);

    let before = roster.get(WARRIOR).unwrap().clone();
    let strike = GateRequest::new(CooldownBucket::Ability, "heroic_strike", 1_500, ActionCost::new(ResourceKind::Rage, 15));
    let denial = roster.attempt_action(WARRIOR, &strike, 1_000).unwrap_err();
    assert_eq!(denial.code(), "incapacitated");

    let after = roster.get(WARRIOR).unwrap();
    assert_eq!(after.cooldowns, before.cooldowns);
    assert_eq!(after.resources, before.resources);
}

#[test]
fn test_full_encounter_is_reproducible() {
    fn run(seed: u64) -> (Vec<String>, Vec<u8>) {
        let catalog = catalog();
        let rules = CombatRules::default();
        let mut roster = world(&rules);
        let mut coordinator = AssistCoordinator::new(rules.assist.clone());
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut log = Vec::new();

        roster.apply_status_effect(WARRIOR, &spec(&catalog, "power_word_shield_r1"), 0);
        for step in 0..20u64 {
            let now = step * 1_000;
            let packet = AttackPacket::from_rules(18, DamageSchool::Physical, &rules.hit);
            if let Some(result) = roster.resolve_attack(WARRIOR, WOLF, &packet, now, &mut rng) {
                log.push(result.summary());
            }
            if step == 0 {
                coordinator.try_assist(&mut roster, WOLF, WARRIOR, now, 10);
                roster.apply_status_effect(WOLF, &spec(&catalog, "ignite"), now);
            }
            for npc in [WOLF, PACKMATE] {
                if let Some(target) = roster.select_npc_target(npc, now) {
                    let bite = AttackPacket::from_rules(9, DamageSchool::Physical, &rules.hit);
                    roster.resolve_attack(npc, target, &bite, now, &mut rng);
                }
            }
            roster.world_tick(now);
        }

        let mut sink = JsonLinesSink::new(Vec::new());
        persist_best_effort(&mut sink, &roster.snapshots());
        (log, sink.into_inner())
    }

    let (log_a, snap_a) = run(2024);
    let (log_b, snap_b) = run(2024);
    assert_eq!(log_a, log_b);
    assert_eq!(snap_a, snap_b);
    assert!(!snap_a.is_empty());
}
