//! Persistence snapshots - Serializable per-combatant state and best-effort sinks
//!
//! Nothing in the combat API writes to a sink. Callers take snapshots after a
//! synchronous call returns and hand them to [`persist_best_effort`].

use crate::combatant::{Combatant, CombatantKind, Health};
use crate::cooldown::{CooldownEntry, CooldownTable};
use crate::effect::{StatusEffectInstance, StatusEffectStore};
use crate::resource::ResourcePools;
use crate::threat::ThreatState;
use crate::types::{EntityId, RoomId};
use serde::{Deserialize, Serialize};
use std::io::Write;
use thiserror::Error;
use tracing::warn;

/// Persistence error
#[derive(Error, Debug)]
pub enum PersistError {
    #[error("Failed to write snapshot: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to serialize snapshot: {0}")]
    SerializeError(#[from] serde_json::Error),
}

/// Durable view of one combatant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatantSnapshot {
    pub id: EntityId,
    pub kind: CombatantKind,
    pub room: RoomId,
    pub health: Health,
    pub resources: ResourcePools,
    #[serde(default)]
    pub cooldowns: Vec<CooldownEntry>,
    #[serde(default)]
    pub effects: Vec<StatusEffectInstance>,
    #[serde(default)]
    pub threat: ThreatState,
}

impl CombatantSnapshot {
    pub fn capture(combatant: &Combatant) -> Self {
        CombatantSnapshot {
            id: combatant.id,
            kind: combatant.kind,
            room: combatant.room,
            health: combatant.health,
            resources: combatant.resources.clone(),
            cooldowns: combatant.cooldowns.entries().collect(),
            effects: combatant.effects.instances(),
            threat: combatant.threat.clone(),
        }
    }

    /// Rebuild the live combatant
    pub fn restore(self) -> Combatant {
        Combatant {
            id: self.id,
            kind: self.kind,
            room: self.room,
            health: self.health,
            resources: self.resources,
            cooldowns: CooldownTable::from_entries(self.cooldowns),
            effects: StatusEffectStore::restore(self.effects),
            threat: self.threat,
        }
    }
}

impl Combatant {
    pub fn snapshot(&self) -> CombatantSnapshot {
        CombatantSnapshot::capture(self)
    }
}

/// Destination for snapshots
pub trait SnapshotSink {
    fn write(&mut self, snapshot: &CombatantSnapshot) -> Result<(), PersistError>;

    fn flush(&mut self) -> Result<(), PersistError> {
        Ok(())
    }
}

/// One JSON document per line
#[derive(Debug)]
pub struct JsonLinesSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        JsonLinesSink { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> SnapshotSink for JsonLinesSink<W> {
    fn write(&mut self, snapshot: &CombatantSnapshot) -> Result<(), PersistError> {
        serde_json::to_writer(&mut self.writer, snapshot)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), PersistError> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Write every snapshot, logging and swallowing failures.
///
/// Returns how many snapshots were written.
pub fn persist_best_effort<'a>(
    sink: &mut impl SnapshotSink,
    snapshots: impl IntoIterator<Item = &'a CombatantSnapshot>,
) -> usize {
    let mut written = 0;
    for snapshot in snapshots {
        match sink.write(snapshot) {
            Ok(()) => written += 1,
            Err(e) => warn!(entity = %snapshot.id, error = %e, "snapshot write failed"),
        }
    }
    if let Err(e) = sink.flush() {
        warn!(error = %e, "snapshot flush failed");
    }
    written
}
