//! The sync queue: floor plans saved locally and waiting for the remote.
//!
//! Entries are appended by the client and only leave the queue when a sync
//! run acknowledges them.

use crate::{error::Result, EntryId, FloorPlan, Timestamp};
use serde::{Deserialize, Serialize};

/// A plan waiting to be synced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuedPlan {
    /// Position-independent id of this entry
    pub entry_id: EntryId,
    /// The plan as it was saved
    pub plan: FloorPlan,
    /// When it was saved locally
    pub queued_at: Timestamp,
}

/// Ordered queue of plans pending confirmation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncQueue {
    next_entry: EntryId,
    entries: Vec<QueuedPlan>,
}

impl SyncQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a plan and return its entry id.
    pub fn push(&mut self, plan: FloorPlan, queued_at: Timestamp) -> EntryId {
        let entry_id = self.next_entry;
        self.next_entry += 1;
        self.entries.push(QueuedPlan {
            entry_id,
            plan,
            queued_at,
        });
        entry_id
    }

    /// Queued entries in insertion order.
    pub fn entries(&self) -> &[QueuedPlan] {
        &self.entries
    }

    /// Queued plans in insertion order.
    pub fn plans(&self) -> impl Iterator<Item = &FloorPlan> {
        self.entries.iter().map(|e| &e.plan)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove confirmed entries. Unknown ids are ignored.
    pub fn acknowledge(&mut self, entry_ids: &[EntryId]) {
        self.entries.retain(|e| !entry_ids.contains(&e.entry_id));
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Export the queue for persistence.
    pub fn export_state(&self) -> crate::snapshot::QueueSnapshot {
        crate::snapshot::QueueSnapshot::new(self.next_entry, self.entries.clone())
    }

    /// Replace the queue with a snapshot's contents.
    pub fn import_state(&mut self, snapshot: crate::snapshot::QueueSnapshot) -> Result<()> {
        snapshot.validate()?;
        self.next_entry = snapshot.next_entry;
        self.entries = snapshot.entries;
        Ok(())
    }

    /// Build a queue straight from a snapshot.
    pub fn from_snapshot(snapshot: crate::snapshot::QueueSnapshot) -> Result<Self> {
        let mut queue = Self::new();
        queue.import_state(snapshot)?;
        Ok(queue)
    }
}
