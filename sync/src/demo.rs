//! In-process collaborators for the demo binary.

use crate::error::{RemoteError, StorageError};
use crate::remote::{PushOutcome, RemoteAuthority};
use crate::storage::{RoomQuery, RoomSource};
use async_trait::async_trait;
use dashmap::DashMap;
use floorplan_engine::{FloorPlan, Room};
use rand::Rng;

/// A remote that is reachable only some of the time.
///
/// It stores the latest plan per name and reports divergence whenever a push
/// carries a different version than the one it holds.
pub struct FlakyRemote {
    online_ratio: f64,
    plans: DashMap<String, FloorPlan>,
}

impl FlakyRemote {
    pub fn new(online_ratio: f64) -> Self {
        Self {
            online_ratio: online_ratio.clamp(0.0, 1.0),
            plans: DashMap::new(),
        }
    }

    /// Store a plan as the remote's current copy.
    pub fn record(&self, plan: FloorPlan) {
        self.plans.insert(plan.name().to_string(), plan);
    }

    pub fn get(&self, name: &str) -> Option<FloorPlan> {
        self.plans.get(name).map(|p| p.value().clone())
    }
}

#[async_trait]
impl RemoteAuthority for FlakyRemote {
    async fn check_connectivity(&self) -> bool {
        rand::thread_rng().gen_bool(self.online_ratio)
    }

    async fn push_plan(&self, plan: &FloorPlan) -> Result<PushOutcome, RemoteError> {
        if let Some(existing) = self.plans.get(plan.name()) {
            if existing.version() != plan.version() {
                return Ok(PushOutcome::Diverged(existing.value().clone()));
            }
        }
        self.record(plan.clone());
        Ok(PushOutcome::Accepted)
    }
}

/// Rooms drawn from a fixed set of plans.
pub struct PlanRooms {
    plans: Vec<FloorPlan>,
}

impl PlanRooms {
    pub fn new(plans: Vec<FloorPlan>) -> Self {
        Self { plans }
    }
}

#[async_trait]
impl RoomSource for PlanRooms {
    async fn fetch_rooms(&self, query: &RoomQuery) -> Result<Vec<Room>, StorageError> {
        let rooms = self
            .plans
            .iter()
            .filter(|p| query.plan.as_deref().map_or(true, |name| p.name() == name))
            .flat_map(|p| p.rooms().iter())
            .filter(|r| query.min_capacity.map_or(true, |min| r.capacity() >= min))
            .cloned()
            .collect();
        Ok(rooms)
    }
}
