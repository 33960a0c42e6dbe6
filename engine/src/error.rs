//! Error types for the floor plan engine.

use crate::scheduler::SchedulingFailure;
use crate::{PlanName, RoomId, Timestamp, UserId};
use thiserror::Error;

/// All possible errors from the engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    // Validation errors
    #[error("invalid interval: end {end} is not after start {start}")]
    InvalidInterval { start: Timestamp, end: Timestamp },

    #[error("invalid capacity for room {0}: must be at least 1")]
    InvalidCapacity(RoomId),

    #[error("invalid plan reference: {0}")]
    InvalidPlanReference(String),

    #[error("plans describe different logical plans: '{local}' vs '{remote}'")]
    PlanMismatch { local: PlanName, remote: PlanName },

    #[error("user {0} is not allowed to resolve conflicts")]
    NotAuthorized(UserId),

    // Room index errors
    #[error("room already exists in plan: {0}")]
    DuplicateRoom(RoomId),

    #[error("room not found: {0}")]
    RoomNotFound(RoomId),

    // Scheduling
    #[error(transparent)]
    Scheduling(#[from] SchedulingFailure),

    // Conflict resolution
    #[error("admin intervention required to resolve '{0}': priority and last-modified are equal")]
    AdminInterventionRequired(PlanName),

    // State errors
    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;
