//! Effect catalog - Content-defined effect specs keyed by id

use super::ConfigError;
use crate::effect::EffectSpec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::warn;

/// File layout: a list of `[[effects]]` tables
#[derive(Debug, Clone, Serialize, Deserialize)]
struct EffectsFile {
    #[serde(default)]
    effects: Vec<EffectSpec>,
}

/// Registry of effect specs
#[derive(Debug, Clone, Default)]
pub struct EffectCatalog {
    effects: BTreeMap<String, EffectSpec>,
}

impl EffectCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a spec, rejecting empty and duplicate ids
    pub fn register(&mut self, spec: EffectSpec) -> Result<(), ConfigError> {
        if spec.id.trim().is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "effect '{}' has an empty id",
                spec.name
            )));
        }
        if self.effects.contains_key(&spec.id) {
            return Err(ConfigError::ValidationError(format!(
                "duplicate effect id '{}'",
                spec.id
            )));
        }
        lint(&spec);
        self.effects.insert(spec.id.clone(), spec);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&EffectSpec> {
        self.effects.get(id)
    }

    /// Like `get`, but a miss is an error
    pub fn lookup(&self, id: &str) -> Result<&EffectSpec, ConfigError> {
        self.get(id)
            .ok_or_else(|| ConfigError::UnknownEffect(id.to_string()))
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.effects.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }
}

/// Content mistakes that are tolerated at runtime but worth flagging on load
fn lint(spec: &EffectSpec) {
    if let Some(periodic) = &spec.periodic {
        if periodic.tick_interval_ms == 0 {
            warn!(effect = %spec.id, "periodic effect has no tick interval");
        }
    }
    if spec.periodic.is_some() && spec.absorb.is_some() {
        warn!(effect = %spec.id, "effect defines both periodic and absorb parts");
    }
    if spec.max_stacks == 0 {
        warn!(effect = %spec.id, "max_stacks of 0 will be treated as 1");
    }
}

fn build(file: EffectsFile) -> Result<EffectCatalog, ConfigError> {
    let mut catalog = EffectCatalog::new();
    for spec in file.effects {
        catalog.register(spec)?;
    }
    Ok(catalog)
}

/// Load an effect catalog from a TOML file
pub fn load_effect_catalog(path: &Path) -> Result<EffectCatalog, ConfigError> {
    build(super::load_toml(path)?)
}

/// Load an effect catalog from a TOML string
pub fn parse_effect_catalog(content: &str) -> Result<EffectCatalog, ConfigError> {
    build(super::parse_toml(content)?)
}
