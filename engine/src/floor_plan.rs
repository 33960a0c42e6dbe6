//! Versioned floor plans and their room index.

use crate::{
    error::Result, Clock, Error, PlanId, PlanName, PlanVersion, Room, RoomId, Timestamp, UserId,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Key under which a room is indexed.
pub fn room_key(id: RoomId) -> String {
    format!("room-{id}")
}

/// Room key to position in the plan's room list.
#[derive(Debug, Clone, Default, PartialEq)]
struct RoomIndex {
    positions: HashMap<String, usize>,
}

impl RoomIndex {
    fn get(&self, id: RoomId) -> Option<usize> {
        self.positions.get(&room_key(id)).copied()
    }

    fn contains(&self, id: RoomId) -> bool {
        self.positions.contains_key(&room_key(id))
    }

    fn rebuild(rooms: &[Room]) -> Result<Self> {
        let mut positions = HashMap::with_capacity(rooms.len());
        for (pos, room) in rooms.iter().enumerate() {
            if positions.insert(room_key(room.id()), pos).is_some() {
                return Err(Error::DuplicateRoom(room.id()));
            }
        }
        Ok(Self { positions })
    }

    fn len(&self) -> usize {
        self.positions.len()
    }
}

/// One version of a floor plan.
///
/// Plans with the same `name` are versions of the same logical plan; the
/// numeric `id` is only the local instance id. `version` and `last_modified`
/// change only through [`FloorPlan::upload_plan`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "PlanRecord")]
pub struct FloorPlan {
    id: PlanId,
    name: PlanName,
    version: PlanVersion,
    description: String,
    created_at: Timestamp,
    last_modified: Timestamp,
    creator: UserId,
    priority: i32,
    rooms: Vec<Room>,
    #[serde(skip)]
    index: RoomIndex,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlanRecord {
    id: PlanId,
    name: PlanName,
    version: PlanVersion,
    #[serde(default)]
    description: String,
    created_at: Timestamp,
    last_modified: Timestamp,
    creator: UserId,
    priority: i32,
    #[serde(default)]
    rooms: Vec<Room>,
}

impl TryFrom<PlanRecord> for FloorPlan {
    type Error = Error;

    fn try_from(record: PlanRecord) -> Result<Self> {
        let index = RoomIndex::rebuild(&record.rooms)?;
        Ok(Self {
            id: record.id,
            name: record.name,
            version: record.version,
            description: record.description,
            created_at: record.created_at,
            last_modified: record.last_modified,
            creator: record.creator,
            priority: record.priority,
            rooms: record.rooms,
            index,
        })
    }
}

impl FloorPlan {
    /// Create an empty plan at version 1.0, stamped with the clock's time.
    pub fn new(
        id: PlanId,
        name: impl Into<PlanName>,
        creator: UserId,
        priority: i32,
        clock: &dyn Clock,
    ) -> Self {
        let now = clock.now();
        Self {
            id,
            name: name.into(),
            version: 1.0,
            description: String::new(),
            created_at: now,
            last_modified: now,
            creator,
            priority,
            rooms: Vec::new(),
            index: RoomIndex::default(),
        }
    }

    /// Start from a specific version, e.g. when loading a copy from elsewhere.
    pub fn with_version(mut self, version: PlanVersion) -> Self {
        self.version = version;
        self
    }

    /// Override the last-modified stamp of a freshly built plan.
    pub fn with_last_modified(mut self, last_modified: Timestamp) -> Self {
        self.last_modified = last_modified;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn id(&self) -> PlanId {
        self.id
    }

    /// Logical plan identity shared by all versions.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> PlanVersion {
        self.version
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn last_modified(&self) -> Timestamp {
        self.last_modified
    }

    pub fn creator(&self) -> UserId {
        self.creator
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn set_priority(&mut self, priority: i32) {
        self.priority = priority;
    }

    /// Rooms in insertion order.
    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    /// Mutable access to every room, e.g. to book across the whole plan.
    ///
    /// Room ids are immutable, so the index stays valid.
    pub fn rooms_mut(&mut self) -> impl Iterator<Item = &mut Room> {
        self.rooms.iter_mut()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Append a room. Rejects a second room with the same id.
    pub fn add_room(&mut self, room: Room) -> Result<()> {
        if self.index.contains(room.id()) {
            return Err(Error::DuplicateRoom(room.id()));
        }
        self.index
            .positions
            .insert(room_key(room.id()), self.rooms.len());
        self.rooms.push(room);
        Ok(())
    }

    /// Remove a room from both the list and the index.
    pub fn remove_room(&mut self, id: RoomId) -> Result<Room> {
        let pos = self.index.get(id).ok_or(Error::RoomNotFound(id))?;
        self.index.positions.remove(&room_key(id));
        let room = self.rooms.remove(pos);
        // Everything after `pos` shifted down by one
        for later in &self.rooms[pos..] {
            if let Some(p) = self.index.positions.get_mut(&room_key(later.id())) {
                *p -= 1;
            }
        }
        Ok(room)
    }

    /// Look a room up through the index.
    ///
    /// There is no linear-scan fallback: every mutation keeps the index exact,
    /// and deserialization rebuilds it.
    pub fn get_room_by_id(&self, id: RoomId) -> Option<&Room> {
        self.index.get(id).map(|pos| &self.rooms[pos])
    }

    pub fn get_room_by_id_mut(&mut self, id: RoomId) -> Option<&mut Room> {
        let pos = self.index.get(id)?;
        self.rooms.get_mut(pos)
    }

    /// Commit this version: bump by exactly one and stamp the clock's time.
    ///
    /// Returns the new version.
    pub fn upload_plan(&mut self, clock: &dyn Clock) -> PlanVersion {
        self.version += 1.0;
        self.last_modified = clock.now();
        self.version
    }

    #[cfg(test)]
    fn index_is_consistent(&self) -> bool {
        self.index.len() == self.rooms.len()
            && self
                .rooms
                .iter()
                .enumerate()
                .all(|(pos, room)| self.index.get(room.id()) == Some(pos))
    }
}
