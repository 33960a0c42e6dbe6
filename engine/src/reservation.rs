//! Reservations: time-bounded booking requests against rooms.

use crate::{error::Result, Interval, ReservationId, Timestamp, UserId};
use serde::{Deserialize, Serialize};

/// A booking request, and once committed, an entry in a room's schedule.
///
/// Fields are read-only after construction; a committed reservation never changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    id: ReservationId,
    owner: UserId,
    description: String,
    span: Interval,
    attendees: u32,
}

impl Reservation {
    /// Create a reservation for `[start, end)`.
    ///
    /// Fails with [`crate::Error::InvalidInterval`] when `end <= start`.
    pub fn new(
        id: ReservationId,
        owner: UserId,
        description: impl Into<String>,
        start: Timestamp,
        end: Timestamp,
        attendees: u32,
    ) -> Result<Self> {
        Ok(Self::with_span(id, owner, description, Interval::new(start, end)?, attendees))
    }

    /// Create a reservation from an already validated interval.
    pub fn with_span(
        id: ReservationId,
        owner: UserId,
        description: impl Into<String>,
        span: Interval,
        attendees: u32,
    ) -> Self {
        Self {
            id,
            owner,
            description: description.into(),
            span,
            attendees,
        }
    }

    pub fn id(&self) -> ReservationId {
        self.id
    }

    pub fn owner(&self) -> UserId {
        self.owner
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn span(&self) -> Interval {
        self.span
    }

    pub fn start(&self) -> Timestamp {
        self.span.start()
    }

    pub fn end(&self) -> Timestamp {
        self.span.end()
    }

    /// Expected number of attendees.
    pub fn attendees(&self) -> u32 {
        self.attendees
    }
}
