//! Config - Effect content and combat rules from TOML files
//!
//! A content directory holds two files: [`EFFECTS_FILE`] with the effect
//! catalog and [`RULES_FILE`] with the tunable combat rules. Missing fields
//! fall back to defaults; unreadable or malformed files are errors.

mod catalog;
mod repository;
mod rules;

pub use catalog::{load_effect_catalog, parse_effect_catalog, EffectCatalog};
pub use repository::{CachedRules, Clock, ManualClock, RulesSource, StaticRules, SystemClock, TomlRulesFile};
pub use rules::{CombatRules, HitConstants, ResourceRules};

use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Effect catalog file name inside a content directory
pub const EFFECTS_FILE: &str = "effects.toml";
/// Combat rules file name inside a content directory
pub const RULES_FILE: &str = "rules.toml";

/// Content and rules loading error
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", .path.display())]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{origin}: invalid TOML: {source}")]
    ParseError {
        origin: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid combat content: {0}")]
    ValidationError(String),
    #[error("no effect with id '{0}'")]
    UnknownEffect(String),
    #[error("combat rules have not been loaded")]
    RulesUnavailable,
}

/// Read and decode a TOML file; errors name the file
pub fn load_toml<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::IoError {
        path: path.to_path_buf(),
        source,
    })?;
    decode(&content, &path.display().to_string())
}

/// Decode inline TOML (tests, embedded content)
pub fn parse_toml<T: DeserializeOwned>(content: &str) -> Result<T, ConfigError> {
    decode(content, "<inline>")
}

fn decode<T: DeserializeOwned>(content: &str, origin: &str) -> Result<T, ConfigError> {
    toml::from_str(content).map_err(|source| ConfigError::ParseError {
        origin: origin.to_string(),
        source,
    })
}

/// Locations of the effect catalog and rules files under `dir`
pub fn content_paths(dir: &Path) -> (PathBuf, PathBuf) {
    (dir.join(EFFECTS_FILE), dir.join(RULES_FILE))
}
