//! Rules repository - TTL-cached combat rules with an injected clock

use super::{load_toml, CombatRules, ConfigError};
use crate::types::Timestamp;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

/// Source of the current time in milliseconds
pub trait Clock {
    fn now_ms(&self) -> Timestamp;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> Timestamp {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as Timestamp)
            .unwrap_or_default()
    }
}

/// Hand-driven clock for tests and simulations. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        ManualClock {
            now: Arc::new(AtomicU64::new(start)),
        }
    }

    pub fn set(&self, now: Timestamp) {
        self.now.store(now, Ordering::Relaxed);
    }

    pub fn advance(&self, ms: u64) {
        self.now.fetch_add(ms, Ordering::Relaxed);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> Timestamp {
        self.now.load(Ordering::Relaxed)
    }
}

/// Somewhere combat rules can be loaded from
pub trait RulesSource {
    fn load(&self) -> Result<CombatRules, ConfigError>;
}

/// Fixed in-memory rules
#[derive(Debug, Clone, Default)]
pub struct StaticRules(pub CombatRules);

impl RulesSource for StaticRules {
    fn load(&self) -> Result<CombatRules, ConfigError> {
        Ok(self.0.clone())
    }
}

/// Rules read from a TOML file on every refresh
#[derive(Debug, Clone)]
pub struct TomlRulesFile {
    pub path: PathBuf,
}

impl TomlRulesFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        TomlRulesFile { path: path.into() }
    }
}

impl RulesSource for TomlRulesFile {
    fn load(&self) -> Result<CombatRules, ConfigError> {
        load_toml(&self.path)
    }
}

/// Rules cached for `ttl_ms` and reloaded lazily when stale
pub struct CachedRules<S, C> {
    source: S,
    clock: C,
    ttl_ms: u64,
    rules: Option<CombatRules>,
    loaded_at: Option<Timestamp>,
}

impl<S: RulesSource, C: Clock> CachedRules<S, C> {
    /// Nothing is loaded until the first refresh
    pub fn new(source: S, clock: C, ttl_ms: u64) -> Self {
        CachedRules {
            source,
            clock,
            ttl_ms,
            rules: None,
            loaded_at: None,
        }
    }

    pub fn is_stale(&self, now: Timestamp) -> bool {
        match self.loaded_at {
            Some(at) => now.saturating_sub(at) >= self.ttl_ms,
            None => true,
        }
    }

    /// Reload if the TTL has elapsed. Returns whether new rules were loaded.
    ///
    /// A failed reload keeps the previous rules and is only an error when
    /// nothing has ever loaded.
    pub fn refresh_if_stale(&mut self, now: Timestamp) -> Result<bool, ConfigError> {
        if !self.is_stale(now) {
            return Ok(false);
        }
        match self.source.load() {
            Ok(rules) => {
                debug!(now, "combat rules reloaded");
                self.rules = Some(rules);
                self.loaded_at = Some(now);
                Ok(true)
            }
            Err(e) if self.rules.is_some() => {
                warn!(error = %e, "combat rules reload failed, keeping previous rules");
                self.loaded_at = Some(now);
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Current rules, refreshed against the injected clock
    pub fn current(&mut self) -> Result<&CombatRules, ConfigError> {
        let now = self.clock.now_ms();
        self.refresh_if_stale(now)?;
        self.rules
            .as_ref()
            .ok_or(ConfigError::RulesUnavailable)
    }

    /// Last loaded rules without touching the source
    pub fn cached(&self) -> Option<&CombatRules> {
        self.rules.as_ref()
    }
}
