//! The remote authority boundary.
//!
//! The service never talks to a network directly; it talks to a
//! [`RemoteAuthority`]. Transport, retries inside a call and wire formats
//! belong to the implementation.

use crate::error::RemoteError;
use async_trait::async_trait;
use floorplan_engine::FloorPlan;
use std::sync::Arc;

/// What the remote said about a pushed plan.
#[derive(Debug, Clone, PartialEq)]
pub enum PushOutcome {
    /// The remote took the plan as-is
    Accepted,
    /// The remote holds a different version of the same logical plan
    Diverged(FloorPlan),
}

/// The remote side of synchronization.
#[async_trait]
pub trait RemoteAuthority: Send + Sync {
    /// Whether the remote can be reached right now.
    async fn check_connectivity(&self) -> bool;

    /// Offer a plan to the remote.
    async fn push_plan(&self, plan: &FloorPlan) -> Result<PushOutcome, RemoteError>;
}

#[async_trait]
impl<R: RemoteAuthority + ?Sized> RemoteAuthority for Arc<R> {
    async fn check_connectivity(&self) -> bool {
        (**self).check_connectivity().await
    }

    async fn push_plan(&self, plan: &FloorPlan) -> Result<PushOutcome, RemoteError> {
        (**self).push_plan(plan).await
    }
}
