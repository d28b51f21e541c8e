//! World Sim - A headless encounter demonstrating combat_core on a world tick
//!
//! This binary shows:
//! - Loading effect content and combat rules from TOML
//! - A command handler: incapacitation pre-check, gate, effects, attack roll
//! - NPC AI: threat-based target selection and pack assist
//! - Best-effort JSON-lines snapshots on stdout

mod cli;
mod sim;

use anyhow::{Context, Result};
use combat_core::config::{content_paths, load_effect_catalog, CachedRules, ManualClock, TomlRulesFile};
use combat_core::persist::{persist_best_effort, JsonLinesSink};
use sim::Simulation;
use std::io;
use tracing::info;

/// Rules are re-read from disk at most this often (game time)
const RULES_TTL_MS: u64 = 30_000;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = cli::parse_args();

    let (effects_path, rules_path) = content_paths(&args.content_dir);
    let catalog = load_effect_catalog(&effects_path)
        .with_context(|| format!("loading effects from {}", effects_path.display()))?;

    let clock = ManualClock::new(0);
    let mut rules = CachedRules::new(TomlRulesFile::new(&rules_path), clock.clone(), RULES_TTL_MS);
    let initial = rules
        .current()
        .with_context(|| format!("loading rules from {}", rules_path.display()))?
        .clone();

    info!(effects = catalog.len(), seed = args.seed, ticks = args.ticks, "starting simulation");
    let mut sim = Simulation::new(catalog, initial, args.seed);

    let stdout = io::stdout();
    let mut sink = JsonLinesSink::new(stdout.lock());
    let mut written = 0;

    for tick in 0..args.ticks {
        let now = tick as u64 * args.tick_ms;
        clock.set(now);
        if rules.refresh_if_stale(now)? {
            if let Some(reloaded) = rules.cached() {
                sim.set_rules(reloaded.clone());
            }
        }

        let summary = sim.step(now);
        info!(
            tick,
            actions = summary.actions,
            denials = summary.denials,
            attacks = summary.attacks,
            assists = summary.assists,
            dots = summary.periodic_fires,
            deaths = ?summary.deaths,
            "tick"
        );

        if args.snapshot_every > 0 && (tick + 1) % args.snapshot_every == 0 {
            written += persist_best_effort(&mut sink, &sim.roster().snapshots());
        }
        if sim.is_over() {
            info!(tick, "encounter over");
            break;
        }
    }

    written += persist_best_effort(&mut sink, &sim.roster().snapshots());
    for combatant in sim.roster().iter() {
        info!(
            entity = %combatant.id,
            alive = combatant.is_alive(),
            health = combatant.health.current,
            effects = combatant.effects.len(),
            "final state"
        );
    }
    info!(snapshots = written, "done");
    Ok(())
}
