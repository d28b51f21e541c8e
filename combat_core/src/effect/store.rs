//! StatusEffectStore - Per-entity container of active effect instances

use super::instance::StatusEffectInstance;
use super::spec::StackingPolicy;
use crate::types::Timestamp;
use std::collections::BTreeMap;

/// Where an instance lives in the store
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BucketKey {
    /// Identity-keyed, for effects without a stacking group
    Effect(String),
    /// Shared by every member of a stacking group
    Group(String),
}

impl BucketKey {
    pub fn for_instance(instance: &StatusEffectInstance) -> Self {
        match &instance.stacking {
            Some(rule) => BucketKey::Group(rule.group.clone()),
            None => BucketKey::Effect(instance.effect_id.clone()),
        }
    }
}

/// Instances sharing a bucket key
#[derive(Debug, Clone, PartialEq)]
pub enum ActiveEffectsBucket {
    Single(StatusEffectInstance),
    /// Ordered by application, oldest first
    Stack(Vec<StatusEffectInstance>),
}

impl ActiveEffectsBucket {
    /// Bucket shape for a first instance: a list for `stack`/`refresh` groups
    pub fn fresh(instance: StatusEffectInstance) -> Self {
        match instance.stacking.as_ref().map(|rule| rule.policy) {
            Some(StackingPolicy::Stack) | Some(StackingPolicy::Refresh) => ActiveEffectsBucket::Stack(vec![instance]),
            _ => ActiveEffectsBucket::Single(instance),
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, StatusEffectInstance> {
        match self {
            ActiveEffectsBucket::Single(instance) => std::slice::from_ref(instance).iter(),
            ActiveEffectsBucket::Stack(list) => list.iter(),
        }
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, StatusEffectInstance> {
        match self {
            ActiveEffectsBucket::Single(instance) => std::slice::from_mut(instance).iter_mut(),
            ActiveEffectsBucket::Stack(list) => list.iter_mut(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ActiveEffectsBucket::Single(_) => 1,
            ActiveEffectsBucket::Stack(list) => list.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Consume the bucket into its instances
    pub fn into_instances(self) -> Vec<StatusEffectInstance> {
        match self {
            ActiveEffectsBucket::Single(instance) => vec![instance],
            ActiveEffectsBucket::Stack(list) => list,
        }
    }
}

/// All active effects owned by one entity
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusEffectStore {
    buckets: BTreeMap<BucketKey, ActiveEffectsBucket>,
    next_sequence: u64,
}

impl StatusEffectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a store from a flattened snapshot
    pub fn restore(instances: impl IntoIterator<Item = StatusEffectInstance>) -> Self {
        let mut store = StatusEffectStore::new();
        let mut instances: Vec<_> = instances.into_iter().collect();
        instances.sort_by_key(|i| i.sequence);
        for instance in instances {
            store.next_sequence = store.next_sequence.max(instance.sequence + 1);
            let key = BucketKey::for_instance(&instance);
            let bucket = match store.buckets.remove(&key) {
                None => ActiveEffectsBucket::fresh(instance),
                Some(existing) => {
                    let mut list = existing.into_instances();
                    list.push(instance);
                    ActiveEffectsBucket::Stack(list)
                }
            };
            store.buckets.insert(key, bucket);
        }
        store
    }

    /// Reserve the next application sequence number
    pub(crate) fn next_sequence(&mut self) -> u64 {
        let seq = self.next_sequence;
        self.next_sequence += 1;
        seq
    }

    pub fn bucket(&self, key: &BucketKey) -> Option<&ActiveEffectsBucket> {
        self.buckets.get(key)
    }

    pub(crate) fn take_bucket(&mut self, key: &BucketKey) -> Option<ActiveEffectsBucket> {
        self.buckets.remove(key)
    }

    pub(crate) fn put_bucket(&mut self, key: BucketKey, bucket: ActiveEffectsBucket) {
        if !bucket.is_empty() {
            self.buckets.insert(key, bucket);
        }
    }

    /// Every instance, in bucket key order then application order
    pub fn iter(&self) -> impl Iterator<Item = &StatusEffectInstance> {
        self.buckets.values().flat_map(|b| b.iter())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut StatusEffectInstance> {
        self.buckets.values_mut().flat_map(|b| b.iter_mut())
    }

    /// Remove every instance matching `dead`, returning the removed instances
    pub fn remove_where(&mut self, mut dead: impl FnMut(&StatusEffectInstance) -> bool) -> Vec<StatusEffectInstance> {
        let mut removed = Vec::new();
        let keys: Vec<BucketKey> = self.buckets.keys().cloned().collect();
        for key in keys {
            let Some(bucket) = self.buckets.remove(&key) else {
                continue;
            };
            let bucket = match bucket {
                ActiveEffectsBucket::Single(instance) => {
                    if dead(&instance) {
                        removed.push(instance);
                        continue;
                    }
                    ActiveEffectsBucket::Single(instance)
                }
                ActiveEffectsBucket::Stack(list) => {
                    let (gone, kept): (Vec<_>, Vec<_>) = list.into_iter().partition(|i| dead(i));
                    removed.extend(gone);
                    let mut bucket = ActiveEffectsBucket::Stack(kept);
                    sync_stack_counts(&mut bucket);
                    bucket
                }
            };
            self.put_bucket(key, bucket);
        }
        removed
    }

    /// Remove every instance of an effect id (dispel/cancel)
    pub fn remove_effect(&mut self, effect_id: &str) -> Vec<StatusEffectInstance> {
        self.remove_where(|i| i.effect_id == effect_id)
    }

    /// Active instances at `now`
    pub fn active(&self, now: Timestamp) -> impl Iterator<Item = &StatusEffectInstance> {
        self.iter().filter(move |i| i.is_active(now))
    }

    pub fn has_active_tag(&self, tag: &str, now: Timestamp) -> bool {
        self.active(now).any(|i| i.has_tag(tag))
    }

    /// Number of instances (including ones awaiting prune)
    pub fn len(&self) -> usize {
        self.buckets.values().map(|b| b.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Flattened copy for persistence
    pub fn instances(&self) -> Vec<StatusEffectInstance> {
        self.iter().cloned().collect()
    }
}

/// Keep every member of a stack bucket reporting the bucket size
pub(crate) fn sync_stack_counts(bucket: &mut ActiveEffectsBucket) {
    if let ActiveEffectsBucket::Stack(list) = bucket {
        let count = list.len() as u32;
        for instance in list.iter_mut() {
            instance.stacks.current = count;
        }
    }
}
