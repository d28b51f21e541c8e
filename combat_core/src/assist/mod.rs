//! Assist - Propagating aggression from an attacked NPC to nearby allies

use crate::threat::ThreatState;
use crate::types::{EntityId, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, trace};

/// World access needed to run an assist pass
pub trait AssistContext {
    /// Socially tagged NPCs sharing a room with `npc`
    fn assist_candidates(&self, npc: EntityId) -> Vec<EntityId>;

    /// Threat table of `npc`, or `None` if it no longer exists
    fn threat_table(&self, npc: EntityId) -> Option<&ThreatState>;

    /// Add threat on `target` to `assister`'s own table
    fn record_threat(&mut self, assister: EntityId, target: EntityId, amount: u64, now: Timestamp);
}

/// Tuning for assist propagation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssistConfig {
    /// Minimum time between two assists by the same NPC
    #[serde(default = "default_throttle_ms")]
    pub throttle_ms: u64,
    /// Multiplier applied to the base seed on the attacker
    #[serde(default = "default_attacker_multiplier")]
    pub attacker_multiplier: u64,
    /// Share of existing threat copied for other combatants
    #[serde(default = "default_share_pct")]
    pub share_pct: f64,
    /// Cap on extra entities seeded besides the attacker
    #[serde(default = "default_max_extra_targets")]
    pub max_extra_targets: usize,
}

fn default_throttle_ms() -> u64 {
    4_000
}

fn default_attacker_multiplier() -> u64 {
    2
}

fn default_share_pct() -> f64 {
    0.5
}

fn default_max_extra_targets() -> usize {
    3
}

impl Default for AssistConfig {
    fn default() -> Self {
        AssistConfig {
            throttle_ms: default_throttle_ms(),
            attacker_multiplier: default_attacker_multiplier(),
            share_pct: default_share_pct(),
            max_extra_targets: default_max_extra_targets(),
        }
    }
}

impl AssistConfig {
    /// Share of `threat` copied to an assister, at least 1 for a nonzero source
    pub fn share_of(&self, threat: u64) -> u64 {
        if threat == 0 {
            return 0;
        }
        let pct = self.share_pct.clamp(0.0, 1.0);
        ((threat as f64 * pct).floor() as u64).max(1)
    }
}

/// Tracks per-assister throttles across assist passes
#[derive(Debug, Clone, Default)]
pub struct AssistCoordinator {
    config: AssistConfig,
    last_assist: BTreeMap<EntityId, Timestamp>,
}

impl AssistCoordinator {
    pub fn new(config: AssistConfig) -> Self {
        AssistCoordinator {
            config,
            last_assist: BTreeMap::new(),
        }
    }

    pub fn config(&self) -> &AssistConfig {
        &self.config
    }

    /// Swap in new tuning without losing throttle state
    pub fn set_config(&mut self, config: AssistConfig) {
        self.config = config;
    }

    pub fn last_assist(&self, npc: EntityId) -> Option<Timestamp> {
        self.last_assist.get(&npc).copied()
    }

    fn is_throttled(&self, npc: EntityId, now: Timestamp) -> bool {
        self.last_assist
            .get(&npc)
            .is_some_and(|last| now.saturating_sub(*last) < self.config.throttle_ms)
    }

    /// Pull nearby allies of `npc_id` into its fight with `attacker_id`.
    ///
    /// Returns how many allies joined. A despawned `npc_id` is a no-op.
    pub fn try_assist(
        &mut self,
        ctx: &mut impl AssistContext,
        npc_id: EntityId,
        attacker_id: EntityId,
        now: Timestamp,
        base_seed: u64,
    ) -> usize {
        // Snapshot the attacked NPC's table so seeding never feeds back into it
        let Some(table) = ctx.threat_table(npc_id) else {
            debug!(npc = %npc_id, "assist skipped: npc not found");
            return 0;
        };
        let others = table.ranked(usize::MAX, &[attacker_id]);
        let attacker_seed = base_seed.saturating_mul(self.config.attacker_multiplier);

        let mut joined = 0;
        for assister in ctx.assist_candidates(npc_id) {
            if assister == npc_id || assister == attacker_id {
                continue;
            }
            if self.is_throttled(assister, now) {
                trace!(assister = %assister, "assist throttled");
                continue;
            }

            ctx.record_threat(assister, attacker_id, attacker_seed, now);
            let extra = others
                .iter()
                .filter(|(entity, _)| *entity != assister)
                .take(self.config.max_extra_targets);
            for (entity, threat) in extra {
                ctx.record_threat(assister, *entity, self.config.share_of(*threat), now);
            }

            self.last_assist.insert(assister, now);
            joined += 1;
            debug!(assister = %assister, npc = %npc_id, attacker = %attacker_id, seed = attacker_seed, "npc assisted");
        }
        joined
    }

    /// Forget throttles that can no longer block anything
    pub fn purge_throttles(&mut self, now: Timestamp) {
        let window = self.config.throttle_ms;
        self.last_assist
            .retain(|_, last| now.saturating_sub(*last) < window);
    }
}
