//! The storage boundary for rooms.

use crate::error::StorageError;
use async_trait::async_trait;
use floorplan_engine::Room;

/// Which rooms a booking may consider.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoomQuery {
    /// Restrict to rooms of one logical plan
    pub plan: Option<String>,
    /// Skip rooms smaller than this
    pub min_capacity: Option<u32>,
}

impl RoomQuery {
    /// Every room the source knows about.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn in_plan(plan: impl Into<String>) -> Self {
        Self {
            plan: Some(plan.into()),
            ..Self::default()
        }
    }

    pub fn with_min_capacity(mut self, min_capacity: u32) -> Self {
        self.min_capacity = Some(min_capacity);
        self
    }
}

/// Where rooms come from (a database, a file, a test fixture).
#[async_trait]
pub trait RoomSource: Send + Sync {
    async fn fetch_rooms(&self, query: &RoomQuery) -> Result<Vec<Room>, StorageError>;
}
