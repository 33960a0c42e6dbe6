//! Turns reservation requests into committed room bookings.
//!
//! # Algorithm
//!
//! 1. Walk the candidate rooms in the order given
//! 2. For each room, check availability, then capacity
//! 3. Commit to the first room that passes both and stop
//! 4. If none pass, report every per-room rejection

use crate::{Reservation, ReservationId, Room, RoomId};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Why a room could not take a reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FailureReason {
    /// The room is free in the window but too small
    NoCapacity,
    /// The window overlaps a committed reservation
    NotAvailable,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::NoCapacity => write!(f, "no room with enough capacity"),
            FailureReason::NotAvailable => write!(f, "no room available in the requested window"),
        }
    }
}

/// A single room's rejection of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomRejection {
    pub room_id: RoomId,
    pub reason: FailureReason,
}

/// No candidate room could take the reservation.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[error("scheduling failed: {reason}")]
pub struct SchedulingFailure {
    /// Aggregate reason across all rooms
    pub reason: FailureReason,
    /// What each evaluated room said, in evaluation order
    pub rejections: Vec<RoomRejection>,
}

impl SchedulingFailure {
    /// Build a failure from per-room rejections.
    ///
    /// The aggregate is `NoCapacity` only when every evaluated room was free
    /// but too small. Anything else, including an empty candidate list, is
    /// `NotAvailable`.
    pub fn from_rejections(rejections: Vec<RoomRejection>) -> Self {
        let all_capacity = !rejections.is_empty()
            && rejections
                .iter()
                .all(|r| r.reason == FailureReason::NoCapacity);
        let reason = if all_capacity {
            FailureReason::NoCapacity
        } else {
            FailureReason::NotAvailable
        };
        Self { reason, rejections }
    }

    /// The reason a particular room gave, if it was evaluated.
    pub fn reason_for(&self, room_id: RoomId) -> Option<FailureReason> {
        self.rejections
            .iter()
            .find(|r| r.room_id == room_id)
            .map(|r| r.reason)
    }
}

/// A committed booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub reservation_id: ReservationId,
    pub room_id: RoomId,
}

/// Book `reservation` into the first suitable room among `candidates`.
///
/// Only the booked room is modified. A failed request commits nothing and the
/// reservation is dropped.
pub fn book_room<'a, I>(reservation: Reservation, candidates: I) -> Result<Booking, SchedulingFailure>
where
    I: IntoIterator<Item = &'a mut Room>,
{
    let mut rejections = Vec::new();
    for room in candidates {
        match room.book(&reservation) {
            Ok(()) => {
                return Ok(Booking {
                    reservation_id: reservation.id(),
                    room_id: room.id(),
                })
            }
            Err(reason) => rejections.push(RoomRejection {
                room_id: room.id(),
                reason,
            }),
        }
    }
    Err(SchedulingFailure::from_rejections(rejections))
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR: u64 = 3_600_000;

    fn reservation(id: u32, start_h: u64, end_h: u64, attendees: u32) -> Reservation {
        Reservation::new(id, 1, "event", start_h * HOUR, end_h * HOUR, attendees).unwrap()
    }

    fn rooms() -> Vec<Room> {
        vec![
            Room::new(1, "Huddle", 4, "1F").unwrap(),
            Room::new(2, "Boardroom", 12, "2F").unwrap(),
            Room::new(3, "Hall", 40, "3F").unwrap(),
        ]
    }

    #[test]
    fn books_first_suitable_room() {
        let mut rooms = rooms();
        let booking = book_room(reservation(1, 9, 10, 10), rooms.iter_mut()).unwrap();
        assert_eq!(booking.room_id, 2);
        assert_eq!(booking.reservation_id, 1);
        // Only room 2 changed
        assert!(!rooms[0].is_booked());
        assert!(rooms[1].is_booked());
        assert!(!rooms[2].is_booked());
        assert!(rooms[2].reservations().is_empty());
    }

    #[test]
    fn stops_after_first_commit() {
        let mut rooms = rooms();
        book_room(reservation(1, 9, 10, 2), rooms.iter_mut()).unwrap();
        assert_eq!(rooms[0].reservations().len(), 1);
        assert!(rooms[1].reservations().is_empty());
    }

    #[test]
    fn falls_through_busy_rooms() {
        let mut rooms = rooms();
        book_room(reservation(1, 9, 10, 2), rooms.iter_mut()).unwrap();
        let booking = book_room(reservation(2, 9, 10, 2), rooms.iter_mut()).unwrap();
        assert_eq!(booking.room_id, 2);
    }

    #[test]
    fn all_too_small_is_no_capacity() {
        let mut rooms = rooms();
        let failure = book_room(reservation(1, 9, 10, 100), rooms.iter_mut()).unwrap_err();
        assert_eq!(failure.reason, FailureReason::NoCapacity);
        assert_eq!(failure.rejections.len(), 3);
        assert!(rooms.iter().all(|r| !r.is_booked()));
    }

    #[test]
    fn mixed_rejections_report_each_room() {
        let mut rooms = vec![
            Room::new(1, "Huddle", 4, "1F").unwrap(),
            Room::new(2, "Boardroom", 12, "2F").unwrap(),
        ];
        book_room(reservation(1, 9, 10, 10), rooms.iter_mut()).unwrap();

        let failure = book_room(reservation(2, 9, 10, 10), rooms.iter_mut()).unwrap_err();
        assert_eq!(failure.reason, FailureReason::NotAvailable);
        assert_eq!(failure.reason_for(1), Some(FailureReason::NoCapacity));
        assert_eq!(failure.reason_for(2), Some(FailureReason::NotAvailable));
    }

    #[test]
    fn no_candidates_is_not_available() {
        let failure = book_room(reservation(1, 9, 10, 1), Vec::<&mut Room>::new()).unwrap_err();
        assert_eq!(failure.reason, FailureReason::NotAvailable);
        assert!(failure.rejections.is_empty());
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_committed_intervals_never_overlap(
                requests in proptest::collection::vec((0u64..48, 1u64..6, 0u32..20), 1..40)
            ) {
                let mut rooms = vec![
                    Room::new(1, "A", 10, "1F").unwrap(),
                    Room::new(2, "B", 10, "1F").unwrap(),
                ];
                for (i, (start, len, attendees)) in requests.into_iter().enumerate() {
                    let r = Reservation::new(i as u32, 1, "p", start, start + len, attendees).unwrap();
                    let _ = book_room(r, rooms.iter_mut());
                }
                for room in &rooms {
                    let spans: Vec<_> = room.reservations().iter().map(|r| r.span()).collect();
                    for (i, a) in spans.iter().enumerate() {
                        for b in &spans[i + 1..] {
                            prop_assert!(!a.overlaps(b));
                        }
                    }
                }
            }

            #[test]
            fn prop_disjoint_requests_always_succeed(count in 1usize..30, attendees in 0u32..=10) {
                let mut rooms = vec![Room::new(1, "A", 10, "1F").unwrap()];
                for i in 0..count {
                    let start = i as u64 * 10;
                    let r = Reservation::new(i as u32, 1, "p", start, start + 10, attendees).unwrap();
                    prop_assert!(book_room(r, rooms.iter_mut()).is_ok());
                }
                prop_assert_eq!(rooms[0].reservations().len(), count);
            }

            #[test]
            fn prop_overlap_reports_not_available(attendees in 0u32..100, offset in 0u64..10) {
                let mut rooms = vec![Room::new(1, "A", 10, "1F").unwrap()];
                let first = Reservation::new(1, 1, "p", 100, 110, 1).unwrap();
                book_room(first, rooms.iter_mut()).unwrap();

                let clash = Reservation::new(2, 1, "p", 100 + offset, 111 + offset, attendees).unwrap();
                prop_assert!(!rooms[0].is_available(&clash.span()));
                let failure = book_room(clash, rooms.iter_mut()).unwrap_err();
                prop_assert_eq!(failure.reason, FailureReason::NotAvailable);
            }
        }
    }
}
