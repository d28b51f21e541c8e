//! Power resources - Per-entity mana-like pools spent by actions

use crate::types::ResourceKind;
use serde::{Deserialize, Serialize};

/// Starting shape of a resource pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceProfile {
    /// Maximum value the pool is normalized to
    pub max: u32,
    /// Whether a fresh pool starts at max (mana) or empty (rage)
    pub starts_full: bool,
}

impl ResourceProfile {
    /// Built-in profile for a resource kind
    pub fn default_for(kind: ResourceKind) -> Self {
        match kind {
            ResourceKind::Mana | ResourceKind::Energy | ResourceKind::Focus => ResourceProfile {
                max: 100,
                starts_full: true,
            },
            ResourceKind::Rage => ResourceProfile {
                max: 100,
                starts_full: false,
            },
        }
    }
}

/// A single clamped resource pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerResourcePool {
    current: u32,
    max: u32,
}

impl PowerResourcePool {
    /// Create a pool from its profile
    pub fn new(profile: ResourceProfile) -> Self {
        PowerResourcePool {
            current: if profile.starts_full { profile.max } else { 0 },
            max: profile.max,
        }
    }

    /// Create a pool with explicit values, clamping current to max
    pub fn with_values(current: u32, max: u32) -> Self {
        PowerResourcePool {
            current: current.min(max),
            max,
        }
    }

    pub fn current(&self) -> u32 {
        self.current
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    pub fn can_afford(&self, cost: u32) -> bool {
        self.current >= cost
    }

    /// Spend `cost` if affordable. Leaves the pool untouched on failure.
    pub fn spend(&mut self, cost: u32) -> bool {
        if !self.can_afford(cost) {
            return false;
        }
        self.current -= cost;
        true
    }

    /// Gain up to `amount`, clamped at max. Returns the amount actually gained.
    pub fn gain(&mut self, amount: u32) -> u32 {
        let before = self.current;
        self.current = self.current.saturating_add(amount).min(self.max);
        self.current - before
    }

    /// Change the maximum, pulling current down if needed
    pub fn set_max(&mut self, max: u32) {
        self.max = max;
        self.current = self.current.min(max);
    }

    /// Percentage full, 0-100
    pub fn percent(&self) -> f64 {
        if self.max == 0 {
            return 0.0;
        }
        (self.current as f64 / self.max as f64 * 100.0).clamp(0.0, 100.0)
    }
}

/// Every resource pool owned by one entity
///
/// All kinds are populated at construction so callers never see a missing pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourcePools {
    pools: [PowerResourcePool; ResourceKind::COUNT],
}

impl Default for ResourcePools {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourcePools {
    /// Create pools using the built-in profile for each kind
    pub fn new() -> Self {
        Self::with_profiles(ResourceProfile::default_for)
    }

    /// Create pools using a profile lookup (e.g. from rules config)
    pub fn with_profiles(profile: impl Fn(ResourceKind) -> ResourceProfile) -> Self {
        let all = *ResourceKind::all();
        ResourcePools {
            pools: all.map(|kind| PowerResourcePool::new(profile(kind))),
        }
    }

    pub fn pool(&self, kind: ResourceKind) -> &PowerResourcePool {
        &self.pools[kind.index()]
    }

    pub fn pool_mut(&mut self, kind: ResourceKind) -> &mut PowerResourcePool {
        &mut self.pools[kind.index()]
    }

    pub fn current(&self, kind: ResourceKind) -> u32 {
        self.pool(kind).current()
    }

    /// Iterate (kind, pool) pairs in kind order
    pub fn iter(&self) -> impl Iterator<Item = (ResourceKind, &PowerResourcePool)> {
        ResourceKind::all().iter().copied().zip(self.pools.iter())
    }
}
