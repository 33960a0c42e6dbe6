//! Snapshot of the sync queue for persistence.
//!
//! The snapshot is what a local store writes to disk between runs. It carries
//! a format version so older builds refuse files they cannot read.

use crate::{error::Result, EntryId, Error, QueuedPlan};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Version of the snapshot format for future compatibility.
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

/// A point-in-time copy of a [`crate::SyncQueue`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueSnapshot {
    /// Snapshot format version
    pub format_version: u32,
    /// Next entry id the queue will hand out
    pub next_entry: EntryId,
    /// Queued entries in order
    pub entries: Vec<QueuedPlan>,
}

impl QueueSnapshot {
    pub fn new(next_entry: EntryId, entries: Vec<QueuedPlan>) -> Self {
        Self {
            format_version: SNAPSHOT_FORMAT_VERSION,
            next_entry,
            entries,
        }
    }

    /// Check the snapshot can be loaded into a queue.
    pub fn validate(&self) -> Result<()> {
        if self.format_version > SNAPSHOT_FORMAT_VERSION {
            return Err(Error::InvalidSnapshot(format!(
                "unsupported snapshot format version: {} (max supported: {})",
                self.format_version, SNAPSHOT_FORMAT_VERSION
            )));
        }

        let mut seen = HashSet::with_capacity(self.entries.len());
        for entry in &self.entries {
            if !seen.insert(entry.entry_id) {
                return Err(Error::InvalidSnapshot(format!(
                    "duplicate entry id: {}",
                    entry.entry_id
                )));
            }
            if entry.entry_id >= self.next_entry {
                return Err(Error::InvalidSnapshot(format!(
                    "entry id {} is not below next entry {}",
                    entry.entry_id, self.next_entry
                )));
            }
        }

        Ok(())
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| Error::InvalidSnapshot(e.to_string()))
    }

    /// Serialize to pretty JSON.
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::InvalidSnapshot(e.to_string()))
    }

    /// Deserialize and validate.
    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: Self =
            serde_json::from_str(json).map_err(|e| Error::InvalidSnapshot(e.to_string()))?;
        snapshot.validate()?;
        Ok(snapshot)
    }
}
