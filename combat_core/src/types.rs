//! Shared identifiers and units used across the combat runtime

use serde::{Deserialize, Serialize};
use std::fmt;

/// Wall-clock time in milliseconds, always supplied by the caller
pub type Timestamp = u64;

/// Identifier for a character or NPC
///
/// Ordering is numeric and is relied on for deterministic iteration and
/// tie-breaks (e.g. equal threat picks the lowest id).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u64);

impl EntityId {
    pub const fn new(id: u64) -> Self {
        EntityId(id)
    }

    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u64> for EntityId {
    fn from(id: u64) -> Self {
        EntityId(id)
    }
}

/// Identifier for a room in the text world
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RoomId(pub u32);

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "room:{}", self.0)
    }
}

/// School of incoming damage, used by absorb allow-lists
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DamageSchool {
    #[default]
    Physical,
    Fire,
    Frost,
    Nature,
    Shadow,
    Holy,
    Arcane,
}

/// Named power resource spent by actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Mana,
    Energy,
    Rage,
    Focus,
}

impl ResourceKind {
    pub const COUNT: usize = 4;

    /// Get all resource kinds, in storage order
    pub fn all() -> &'static [ResourceKind; ResourceKind::COUNT] {
        &[
            ResourceKind::Mana,
            ResourceKind::Energy,
            ResourceKind::Rage,
            ResourceKind::Focus,
        ]
    }

    pub(crate) const fn index(self) -> usize {
        match self {
            ResourceKind::Mana => 0,
            ResourceKind::Energy => 1,
            ResourceKind::Rage => 2,
            ResourceKind::Focus => 3,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ResourceKind::Mana => "mana",
            ResourceKind::Energy => "energy",
            ResourceKind::Rage => "rage",
            ResourceKind::Focus => "focus",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What kind of thing granted an effect
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    #[default]
    Ability,
    Spell,
    Item,
    Npc,
    World,
}
