//! Local store: the durable queue of plans waiting for the remote.
//!
//! Wraps a [`SyncQueue`] behind an async mutex. When opened with a path, every
//! mutation is written to disk as a [`QueueSnapshot`] before it becomes
//! visible, so a failed write leaves both memory and disk as they were.

use crate::error::StoreError;
use floorplan_engine::{Clock, EntryId, FloorPlan, QueueSnapshot, QueuedPlan, SyncQueue};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Queue of floor plans saved while offline.
pub struct LocalStore {
    queue: Mutex<SyncQueue>,
    path: Option<PathBuf>,
    clock: Arc<dyn Clock>,
}

impl LocalStore {
    /// A store that lives only in memory.
    pub fn in_memory(clock: Arc<dyn Clock>) -> Self {
        Self {
            queue: Mutex::new(SyncQueue::new()),
            path: None,
            clock,
        }
    }

    /// Open a file-backed store, loading the queue if the file exists.
    pub async fn open(path: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Result<Self, StoreError> {
        let path = path.into();
        let queue = match tokio::fs::read_to_string(&path).await {
            Ok(json) => SyncQueue::from_snapshot(QueueSnapshot::from_json(&json)?)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => SyncQueue::new(),
            Err(e) => return Err(e.into()),
        };

        tracing::info!(path = %path.display(), pending = queue.len(), "Opened local store");

        Ok(Self {
            queue: Mutex::new(queue),
            path: Some(path),
            clock,
        })
    }

    /// Queue a plan for the next sync run.
    pub async fn save_locally(&self, plan: FloorPlan) -> Result<EntryId, StoreError> {
        let mut queue = self.queue.lock().await;
        let mut next = queue.clone();
        let name = plan.name().to_string();
        let entry_id = next.push(plan, self.clock.now());
        self.persist(&next).await?;
        *queue = next;

        tracing::info!(plan = %name, entry_id, "Plan saved in local storage");
        Ok(entry_id)
    }

    /// A copy of everything currently queued.
    pub async fn pending(&self) -> Vec<QueuedPlan> {
        self.queue.lock().await.entries().to_vec()
    }

    pub async fn len(&self) -> usize {
        self.queue.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.queue.lock().await.is_empty()
    }

    /// Remove confirmed entries.
    pub async fn acknowledge(&self, entry_ids: &[EntryId]) -> Result<(), StoreError> {
        let mut queue = self.queue.lock().await;
        let mut next = queue.clone();
        next.acknowledge(entry_ids);
        self.persist(&next).await?;
        *queue = next;

        tracing::debug!(acknowledged = entry_ids.len(), remaining = queue.len(), "Cleared synced plans");
        Ok(())
    }

    /// Path of the backing file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    async fn persist(&self, queue: &SyncQueue) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let json = queue.export_state().to_json_pretty()?;

        // Write beside the target, then swap in
        let tmp = tmp_path(path);
        let written = match tokio::fs::write(&tmp, json).await {
            Ok(()) => tokio::fs::rename(&tmp, path).await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            if let Err(cleanup) = tokio::fs::remove_file(&tmp).await {
                tracing::debug!(path = %tmp.display(), error = %cleanup, "No temporary file to clean up");
            }
            return Err(e.into());
        }
        Ok(())
    }
}

/// `queue.json` -> `queue.json.tmp`; never the target itself.
fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}
