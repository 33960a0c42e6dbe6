//! Rooms: bookable units with a capacity and a committed schedule.

use crate::interval::subtract;
use crate::scheduler::FailureReason;
use crate::{error::Result, Error, Interval, Reservation, RoomId};
use serde::{Deserialize, Serialize};

/// A bookable room.
///
/// Committed reservations are kept in booking order and never overlap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RoomRecord")]
pub struct Room {
    id: RoomId,
    capacity: u32,
    location: String,
    description: String,
    reservations: Vec<Reservation>,
    booked: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RoomRecord {
    id: RoomId,
    capacity: u32,
    location: String,
    description: String,
    #[serde(default)]
    reservations: Vec<Reservation>,
    #[serde(default)]
    booked: bool,
}

impl TryFrom<RoomRecord> for Room {
    type Error = Error;

    fn try_from(record: RoomRecord) -> Result<Self> {
        let mut room = Room::new(record.id, record.description, record.capacity, record.location)?;
        for reservation in record.reservations {
            if !room.is_available(&reservation.span()) {
                return Err(Error::InvalidSnapshot(format!(
                    "room {} has overlapping reservation {}",
                    room.id,
                    reservation.id()
                )));
            }
            room.reservations.push(reservation);
        }
        room.booked = record.booked || !room.reservations.is_empty();
        Ok(room)
    }
}

impl Room {
    /// Create an empty room. Capacity must be at least one seat.
    pub fn new(
        id: RoomId,
        description: impl Into<String>,
        capacity: u32,
        location: impl Into<String>,
    ) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::InvalidCapacity(id));
        }
        Ok(Self {
            id,
            capacity,
            location: location.into(),
            description: description.into(),
            reservations: Vec::new(),
            booked: false,
        })
    }

    pub fn id(&self) -> RoomId {
        self.id
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Committed reservations in booking order.
    pub fn reservations(&self) -> &[Reservation] {
        &self.reservations
    }

    /// Whether the room has ever had a reservation committed.
    pub fn is_booked(&self) -> bool {
        self.booked
    }

    /// True iff no committed reservation overlaps `span`.
    pub fn is_available(&self, span: &Interval) -> bool {
        !self.reservations.iter().any(|r| r.span().overlaps(span))
    }

    pub fn has_enough_capacity(&self, attendees: u32) -> bool {
        self.capacity >= attendees
    }

    /// Check whether `reservation` could be committed here.
    ///
    /// Availability is checked before capacity, so a busy room that is also
    /// too small reports [`FailureReason::NotAvailable`].
    pub fn evaluate(&self, reservation: &Reservation) -> std::result::Result<(), FailureReason> {
        if !self.is_available(&reservation.span()) {
            return Err(FailureReason::NotAvailable);
        }
        if !self.has_enough_capacity(reservation.attendees()) {
            return Err(FailureReason::NoCapacity);
        }
        Ok(())
    }

    /// Check and commit in one step. On failure the room is unchanged.
    pub fn book(&mut self, reservation: &Reservation) -> std::result::Result<(), FailureReason> {
        self.evaluate(reservation)?;
        self.reservations.push(reservation.clone());
        self.booked = true;
        Ok(())
    }

    /// Adopt `authoritative` as this room's state.
    ///
    /// Its attributes and reservations replace ours. Local reservations it does
    /// not know about are kept when they still fit; the rest are returned.
    pub fn merge_from(&mut self, authoritative: Room) -> Vec<Reservation> {
        let local = std::mem::replace(&mut self.reservations, authoritative.reservations);
        self.capacity = authoritative.capacity;
        self.location = authoritative.location;
        self.description = authoritative.description;

        let mut dropped = Vec::new();
        for reservation in local {
            if self.reservations.iter().any(|r| r.id() == reservation.id()) {
                continue;
            }
            if self.is_available(&reservation.span()) {
                self.reservations.push(reservation);
            } else {
                dropped.push(reservation);
            }
        }
        self.booked = self.booked || authoritative.booked || !self.reservations.is_empty();
        dropped
    }

    /// Free sub-intervals of `window`, in order.
    pub fn free_slots(&self, window: &Interval) -> Vec<Interval> {
        let busy: Vec<Interval> = self.reservations.iter().map(|r| r.span()).collect();
        subtract(window, &busy)
    }
}
