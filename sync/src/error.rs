//! Unified error handling for the sync service.

use floorplan_engine::EntryId;
use std::time::Duration;

/// Failure reported by the remote authority or its transport.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Remote rejected plan: {0}")]
    Rejected(String),

    #[error("Remote did not answer within {0:?}")]
    Timeout(Duration),
}

/// Failure reported by the storage collaborator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    #[error("Couldn't connect to storage: {0}")]
    Connection(String),

    #[error("Couldn't load rooms: {0}")]
    Query(String),
}

/// Failure of the local store's persistence.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Local store IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Local store snapshot error: {0}")]
    Snapshot(#[from] floorplan_engine::Error),
}

/// Why a single queued plan did not confirm.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PlanFailureCause {
    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error(transparent)]
    Conflict(#[from] floorplan_engine::Error),

    #[error("cancelled before the plan was pushed")]
    Cancelled,
}

/// A queued plan that did not confirm during a sync run.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanFailure {
    pub entry_id: EntryId,
    pub plan_name: String,
    pub cause: PlanFailureCause,
}

/// Sync run error type.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("Synchronization failed due to no connection; please try again later")]
    Unavailable,

    #[error("Synchronization failed for {} queued plan(s); local store left unchanged", .failures.len())]
    PartialFailure { failures: Vec<PlanFailure> },

    #[error("Synchronization cancelled; local store left unchanged")]
    Cancelled,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Engine(#[from] floorplan_engine::Error),
}

/// Result type alias for sync operations.
pub type Result<T> = std::result::Result<T, SyncError>;
