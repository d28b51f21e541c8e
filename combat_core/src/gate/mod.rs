//! Casting gate - Atomic cooldown + resource check-then-commit
//!
//! The gate is the only place where an action's resource spend and cooldown
//! become observable. A denied attempt leaves both untouched; a passing attempt
//! commits both.

use crate::cooldown::{CooldownBucket, CooldownTable};
use crate::effect::{StatusEffectStore, INCAPACITATING_TAGS};
use crate::resource::ResourcePools;
use crate::types::{ResourceKind, Timestamp};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Why an action attempt was refused
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum Denial {
    #[error("on cooldown for another {remaining_ms}ms")]
    OnCooldown { remaining_ms: u64 },
    #[error("not enough {kind}: need {required}, have {available}")]
    InsufficientResource {
        kind: ResourceKind,
        required: u32,
        available: u32,
    },
    #[error("incapacitated by {effect}")]
    Incapacitated { effect: String },
    #[error("entity not found")]
    NotFound,
}

impl Denial {
    /// Short machine-readable reason
    pub fn code(&self) -> &'static str {
        match self {
            Denial::OnCooldown { .. } => "on_cooldown",
            Denial::InsufficientResource { .. } => "insufficient_resource",
            Denial::Incapacitated { .. } => "incapacitated",
            Denial::NotFound => "not_found",
        }
    }
}

/// Resource price of an action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionCost {
    pub kind: ResourceKind,
    pub amount: u32,
}

impl ActionCost {
    pub fn new(kind: ResourceKind, amount: u32) -> Self {
        ActionCost { kind, amount }
    }

    pub fn free(kind: ResourceKind) -> Self {
        ActionCost { kind, amount: 0 }
    }
}

/// One action attempt as seen by the gate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateRequest {
    pub bucket: CooldownBucket,
    pub key: String,
    pub cooldown_ms: u64,
    pub cost: ActionCost,
}

impl GateRequest {
    pub fn new(bucket: CooldownBucket, key: impl Into<String>, cooldown_ms: u64, cost: ActionCost) -> Self {
        GateRequest {
            bucket,
            key: key.into(),
            cooldown_ms,
            cost,
        }
    }
}

/// Check cooldown, then resource, then commit both.
///
/// 1. Cooldown still running: `OnCooldown`, resources untouched.
/// 2. Pool below cost: `InsufficientResource`, no cooldown started.
/// 3. Otherwise spend the cost and set `ready_at = now + cooldown_ms`.
pub fn attempt(
    cooldowns: &mut CooldownTable,
    resources: &mut ResourcePools,
    request: &GateRequest,
    now: Timestamp,
) -> Result<(), Denial> {
    let remaining_ms = cooldowns.remaining(request.bucket, &request.key, now);
    if remaining_ms > 0 {
        debug!(bucket = %request.bucket, key = %request.key, remaining_ms, "gate denied: cooldown");
        return Err(Denial::OnCooldown { remaining_ms });
    }

    let pool = resources.pool_mut(request.cost.kind);
    let available = pool.current();
    if !pool.spend(request.cost.amount) {
        debug!(
            bucket = %request.bucket,
            key = %request.key,
            kind = %request.cost.kind,
            required = request.cost.amount,
            available,
            "gate denied: resource"
        );
        return Err(Denial::InsufficientResource {
            kind: request.cost.kind,
            required: request.cost.amount,
            available,
        });
    }

    cooldowns.start(request.bucket, &request.key, now, request.cooldown_ms);
    debug!(bucket = %request.bucket, key = %request.key, cost = request.cost.amount, "gate passed");
    Ok(())
}

/// Caller-side pre-check for effects that block every action.
///
/// Never touches cooldowns or resources.
pub fn check_incapacitated(effects: &StatusEffectStore, now: Timestamp) -> Result<(), Denial> {
    let blocking = effects
        .active(now)
        .find(|i| INCAPACITATING_TAGS.iter().any(|tag| i.has_tag(tag)));
    match blocking {
        Some(instance) => {
            debug!(effect = %instance.effect_id, "action blocked by incapacitating effect");
            Err(Denial::Incapacitated {
                effect: instance.effect_id.clone(),
            })
        }
        None => Ok(()),
    }
}
