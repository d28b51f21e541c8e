//! Effect engine - Applying, ticking, pruning and querying status effects

use super::instance::{EffectBehavior, StatusEffectInstance};
use super::spec::{EffectSource, EffectSpec, PeriodicKind, StackingPolicy};
use super::store::{sync_stack_counts, ActiveEffectsBucket, BucketKey, StatusEffectStore};
use crate::types::{DamageSchool, Timestamp};
use tracing::{debug, trace};

/// What `apply_effect` did to the store
#[derive(Debug, Clone, PartialEq)]
pub enum ApplyOutcome {
    /// A new instance was added to an empty bucket or appended to a list
    Inserted,
    /// An existing same-source instance had its timer reset
    Refreshed,
    /// The bucket's previous instances were removed wholesale
    Replaced { previous: Vec<StatusEffectInstance> },
    /// Appended to a stack; `evicted` holds the oldest instance if the cap was hit
    Stacked {
        stacks: u32,
        evicted: Option<StatusEffectInstance>,
    },
}

/// Apply an effect to a store, resolving stacking conflicts
///
/// Identity-keyed effects (no stacking group) refresh on reapplication from the
/// same source and are replaced when a different source applies them. Group
/// effects follow their `StackingPolicy`. When a `stack` group is full the
/// oldest instance is evicted and handed back in the outcome.
pub fn apply_effect(store: &mut StatusEffectStore, spec: &EffectSpec, now: Timestamp) -> ApplyOutcome {
    let sequence = store.next_sequence();
    let fresh = StatusEffectInstance::from_spec(spec, now, sequence);
    let key = BucketKey::for_instance(&fresh);
    let existing = store.take_bucket(&key);

    let policy = spec.stacking.as_ref().map(|rule| rule.policy);
    let (bucket, outcome) = match (policy, existing) {
        (_, None) => (ActiveEffectsBucket::fresh(fresh), ApplyOutcome::Inserted),
        (None, Some(bucket)) => apply_identity(bucket, fresh, now),
        (Some(StackingPolicy::Overwrite), Some(bucket)) => (
            ActiveEffectsBucket::Single(fresh),
            ApplyOutcome::Replaced {
                previous: bucket.into_instances(),
            },
        ),
        (Some(StackingPolicy::Stack), Some(bucket)) => append_capped(bucket.into_instances(), fresh),
        (Some(StackingPolicy::Refresh), Some(bucket)) => {
            let mut list = bucket.into_instances();
            match list.iter().position(|i| i.source == fresh.source) {
                Some(pos) => {
                    list[pos].refresh(now);
                    (ActiveEffectsBucket::Stack(list), ApplyOutcome::Refreshed)
                }
                None => match append_capped(list, fresh) {
                    (bucket, ApplyOutcome::Stacked { evicted: None, .. }) => (bucket, ApplyOutcome::Inserted),
                    other => other,
                },
            }
        }
    };

    let mut bucket = bucket;
    sync_stack_counts(&mut bucket);
    debug!(effect = %spec.id, bucket = ?key, outcome = outcome_name(&outcome), "applied status effect");
    store.put_bucket(key, bucket);
    outcome
}

fn apply_identity(
    bucket: ActiveEffectsBucket,
    fresh: StatusEffectInstance,
    now: Timestamp,
) -> (ActiveEffectsBucket, ApplyOutcome) {
    let mut previous = bucket.into_instances();
    if let Some(pos) = previous.iter().position(|i| i.source == fresh.source) {
        let mut kept = previous.swap_remove(pos);
        kept.refresh(now);
        return (ActiveEffectsBucket::Single(kept), ApplyOutcome::Refreshed);
    }
    (ActiveEffectsBucket::Single(fresh), ApplyOutcome::Replaced { previous })
}

fn append_capped(
    mut list: Vec<StatusEffectInstance>,
    fresh: StatusEffectInstance,
) -> (ActiveEffectsBucket, ApplyOutcome) {
    let cap = fresh.stacks.max.max(1) as usize;
    let mut evicted = None;
    while list.len() >= cap {
        // Oldest first; the list is kept in application order
        let oldest = list
            .iter()
            .enumerate()
            .min_by_key(|(_, i)| i.sequence)
            .map(|(idx, _)| idx)
            .unwrap_or(0);
        evicted = Some(list.remove(oldest));
    }
    list.push(fresh);
    let stacks = list.len() as u32;
    (ActiveEffectsBucket::Stack(list), ApplyOutcome::Stacked { stacks, evicted })
}

fn outcome_name(outcome: &ApplyOutcome) -> &'static str {
    match outcome {
        ApplyOutcome::Inserted => "inserted",
        ApplyOutcome::Refreshed => "refreshed",
        ApplyOutcome::Replaced { .. } => "replaced",
        ApplyOutcome::Stacked { evicted: Some(_), .. } => "stacked_evicted",
        ApplyOutcome::Stacked { .. } => "stacked",
    }
}

/// A single periodic fire handed to the tick callback
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodicFire {
    pub effect_id: String,
    pub source: EffectSource,
    pub kind: PeriodicKind,
    pub school: DamageSchool,
    pub amount: u32,
    /// The boundary this fire belongs to
    pub at: Timestamp,
}

/// Totals from one `tick_effects` call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub fires: u32,
    pub total_damage: u64,
    pub total_healing: u64,
}

impl TickReport {
    fn record(&mut self, fire: &PeriodicFire) {
        self.fires += 1;
        match fire.kind {
            PeriodicKind::Damage => self.total_damage += fire.amount as u64,
            PeriodicKind::Heal => self.total_healing += fire.amount as u64,
        }
    }
}

/// Fire every periodic boundary that has been reached
///
/// One fire per interval boundary crossed, never per call. Boundaries past the
/// effect's expiry instant never fire; a boundary exactly at expiry does.
pub fn tick_effects(
    store: &mut StatusEffectStore,
    now: Timestamp,
    mut on_fire: impl FnMut(&PeriodicFire),
) -> TickReport {
    let mut report = TickReport::default();
    for instance in store.iter_mut() {
        let expires_at = instance.expires_at;
        let EffectBehavior::Periodic(ticker) = &mut instance.behavior else {
            continue;
        };
        if ticker.interval_ms == 0 {
            continue;
        }
        while ticker.next_tick_at <= now && ticker.next_tick_at <= expires_at {
            let fire = PeriodicFire {
                effect_id: instance.effect_id.clone(),
                source: instance.source.clone(),
                kind: ticker.kind,
                school: ticker.school,
                amount: ticker.take_fire_amount(),
                at: ticker.next_tick_at,
            };
            trace!(effect = %fire.effect_id, at = fire.at, amount = fire.amount, "periodic tick");
            on_fire(&fire);
            report.record(&fire);
            match ticker.next_tick_at.checked_add(ticker.interval_ms) {
                Some(next) => ticker.next_tick_at = next,
                None => break,
            }
        }
    }
    report
}

/// Remove expired instances and depleted shields
pub fn prune_expired(store: &mut StatusEffectStore, now: Timestamp) -> Vec<StatusEffectInstance> {
    let removed = store.remove_where(|i| i.is_dead(now));
    if !removed.is_empty() {
        debug!(count = removed.len(), now, "pruned status effects");
    }
    removed
}

/// Tick then prune, so nothing fires after its expiry
pub fn tick_and_prune(
    store: &mut StatusEffectStore,
    now: Timestamp,
    on_fire: impl FnMut(&PeriodicFire),
) -> (TickReport, Vec<StatusEffectInstance>) {
    let report = tick_effects(store, now, on_fire);
    let removed = prune_expired(store, now);
    (report, removed)
}

/// Active instances, optionally only those carrying `tag`
pub fn query_active<'a>(
    store: &'a StatusEffectStore,
    now: Timestamp,
    tag: Option<&str>,
) -> Vec<&'a StatusEffectInstance> {
    store
        .active(now)
        .filter(|i| tag.map_or(true, |t| i.has_tag(t)))
        .collect()
}
