//! Reservation desk: books rooms under concurrent requests.
//!
//! Each room lives behind its own mutex. The availability check and the
//! commit for one room run under that room's lock, so two requests racing for
//! the same slot cannot both see it free.

use crate::storage::{RoomQuery, RoomSource};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use floorplan_engine::{
    Booking, FloorPlan, Interval, Reservation, Room, RoomId, RoomRejection, SchedulingFailure,
};
use std::sync::Arc;
use tokio::sync::Mutex;

/// A room shared between concurrent bookings.
pub type SharedRoom = Arc<Mutex<Room>>;

/// Books reservations against rooms loaded from a [`RoomSource`].
///
/// Rooms are kept between requests so their committed reservations outlive a
/// single call. Each fetch, and each applied plan, refreshes them.
pub struct ReservationDesk<S> {
    source: S,
    rooms: DashMap<RoomId, SharedRoom>,
}

impl<S: RoomSource> ReservationDesk<S> {
    /// Create a desk over a room source.
    pub fn new(source: S) -> Self {
        Self {
            source,
            rooms: DashMap::new(),
        }
    }

    /// Create a desk wrapped in Arc for sharing between tasks.
    pub fn new_shared(source: S) -> Arc<Self> {
        Arc::new(Self::new(source))
    }

    /// Candidate rooms for a query, in the order the source returned them.
    ///
    /// Freshly fetched state is merged into rooms the desk already holds. A
    /// storage failure means no rooms are available for this call.
    pub async fn candidates(&self, query: &RoomQuery) -> Vec<SharedRoom> {
        let fetched = match self.source.fetch_rooms(query).await {
            Ok(rooms) => rooms,
            Err(e) => {
                tracing::warn!(error = %e, "Couldn't load rooms; treating as none available");
                return Vec::new();
            }
        };

        let mut candidates = Vec::with_capacity(fetched.len());
        for room in fetched {
            candidates.push(self.upsert(room).await);
        }
        candidates
    }

    /// Make a confirmed plan's rooms authoritative for later bookings.
    pub async fn apply_plan(&self, plan: &FloorPlan) {
        for room in plan.rooms() {
            self.upsert(room.clone()).await;
        }
        tracing::debug!(plan = plan.name(), version = plan.version(), "Applied plan to desk");
    }

    async fn upsert(&self, room: Room) -> SharedRoom {
        let id = room.id();
        let (shared, fresh) = match self.rooms.entry(id) {
            Entry::Occupied(entry) => (entry.get().clone(), Some(room)),
            Entry::Vacant(entry) => (entry.insert(Arc::new(Mutex::new(room))).value().clone(), None),
        };

        if let Some(fresh) = fresh {
            let dropped = shared.lock().await.merge_from(fresh);
            for reservation in dropped {
                tracing::warn!(
                    room = id,
                    reservation = reservation.id(),
                    "Reservation clashes with authoritative schedule; dropped"
                );
            }
        }
        shared
    }

    /// Book into the first suitable candidate.
    pub async fn book(
        &self,
        reservation: Reservation,
        query: &RoomQuery,
    ) -> Result<Booking, SchedulingFailure> {
        let candidates = self.candidates(query).await;
        let mut rejections = Vec::with_capacity(candidates.len());

        for shared in candidates {
            let mut room = shared.lock().await;
            match room.book(&reservation) {
                Ok(()) => {
                    tracing::info!(
                        reservation = reservation.id(),
                        room = room.id(),
                        "Booked room"
                    );
                    return Ok(Booking {
                        reservation_id: reservation.id(),
                        room_id: room.id(),
                    });
                }
                Err(reason) => {
                    tracing::debug!(
                        reservation = reservation.id(),
                        room = room.id(),
                        %reason,
                        "Room rejected reservation"
                    );
                    rejections.push(RoomRejection {
                        room_id: room.id(),
                        reason,
                    });
                }
            }
        }

        let failure = SchedulingFailure::from_rejections(rejections);
        tracing::info!(reservation = reservation.id(), reason = %failure.reason, "Booking failed");
        Err(failure)
    }

    /// A copy of a room's current state, if the desk has loaded it.
    pub async fn room(&self, id: RoomId) -> Option<Room> {
        let shared = self.rooms.get(&id).map(|r| r.value().clone())?;
        let room = shared.lock().await;
        Some(room.clone())
    }

    /// Free slots of a loaded room inside `window`.
    pub async fn free_slots(&self, id: RoomId, window: &Interval) -> Option<Vec<Interval>> {
        let shared = self.rooms.get(&id).map(|r| r.value().clone())?;
        let room = shared.lock().await;
        Some(room.free_slots(window))
    }

    /// Number of rooms loaded so far.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StorageError;
    use async_trait::async_trait;
    use floorplan_engine::FailureReason;

    const HOUR: u64 = 3_600_000;

    struct FixedRooms(Vec<Room>);

    #[async_trait]
    impl RoomSource for FixedRooms {
        async fn fetch_rooms(&self, query: &RoomQuery) -> Result<Vec<Room>, StorageError> {
            Ok(self
                .0
                .iter()
                .filter(|r| query.min_capacity.map_or(true, |min| r.capacity() >= min))
                .cloned()
                .collect())
        }
    }

    /// A source whose rooms can change between fetches.
    struct ChangingRooms(std::sync::Mutex<Vec<Room>>);

    #[async_trait]
    impl RoomSource for ChangingRooms {
        async fn fetch_rooms(&self, _query: &RoomQuery) -> Result<Vec<Room>, StorageError> {
            Ok(self.0.lock().unwrap().clone())
        }
    }

    struct BrokenStorage;

    #[async_trait]
    impl RoomSource for BrokenStorage {
        async fn fetch_rooms(&self, _query: &RoomQuery) -> Result<Vec<Room>, StorageError> {
            Err(StorageError::Connection("refused".into()))
        }
    }

    fn rooms() -> FixedRooms {
        FixedRooms(vec![
            Room::new(1, "Huddle", 4, "1F").unwrap(),
            Room::new(2, "Boardroom", 12, "2F").unwrap(),
        ])
    }

    fn reservation(id: u32, attendees: u32) -> Reservation {
        Reservation::new(id, 1, "meeting", 9 * HOUR, 10 * HOUR, attendees).unwrap()
    }

    #[tokio::test]
    async fn books_and_remembers_rooms() {
        let desk = ReservationDesk::new(rooms());
        let booking = desk.book(reservation(1, 3), &RoomQuery::all()).await.unwrap();
        assert_eq!(booking.room_id, 1);

        // A second fetch must not reset the schedule
        let booking = desk.book(reservation(2, 3), &RoomQuery::all()).await.unwrap();
        assert_eq!(booking.room_id, 2);
        assert_eq!(desk.room(1).await.unwrap().reservations().len(), 1);
        assert_eq!(desk.room_count(), 2);
    }

    #[tokio::test]
    async fn reports_per_room_reasons() {
        let desk = ReservationDesk::new(rooms());
        desk.book(reservation(1, 10), &RoomQuery::all()).await.unwrap();

        let failure = desk
            .book(reservation(2, 10), &RoomQuery::all())
            .await
            .unwrap_err();
        assert_eq!(failure.reason, FailureReason::NotAvailable);
        assert_eq!(failure.reason_for(1), Some(FailureReason::NoCapacity));
        assert_eq!(failure.reason_for(2), Some(FailureReason::NotAvailable));
    }

    #[tokio::test]
    async fn storage_failure_means_no_rooms() {
        let desk = ReservationDesk::new(BrokenStorage);
        let failure = desk
            .book(reservation(1, 1), &RoomQuery::all())
            .await
            .unwrap_err();
        assert_eq!(failure.reason, FailureReason::NotAvailable);
        assert!(failure.rejections.is_empty());
    }

    #[tokio::test]
    async fn free_slots_for_loaded_room() {
        let desk = ReservationDesk::new(rooms());
        desk.book(reservation(1, 2), &RoomQuery::all()).await.unwrap();

        let window = Interval::new(8 * HOUR, 11 * HOUR).unwrap();
        let free = desk.free_slots(1, &window).await.unwrap();
        assert_eq!(free.len(), 2);
        assert!(desk.free_slots(99, &window).await.is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_requests_for_one_slot_book_once() {
        let desk = ReservationDesk::new_shared(FixedRooms(vec![
            Room::new(1, "Only", 10, "1F").unwrap(),
        ]));

        let mut handles = Vec::new();
        for id in 0..16 {
            let desk = Arc::clone(&desk);
            handles.push(tokio::spawn(async move {
                desk.book(reservation(id, 1), &RoomQuery::all()).await
            }));
        }

        let mut booked = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                booked += 1;
            }
        }
        assert_eq!(booked, 1);
        assert_eq!(desk.room(1).await.unwrap().reservations().len(), 1);
    }

    #[tokio::test]
    async fn later_fetches_refresh_cached_rooms() {
        let only = Room::new(1, "Only", 10, "1F").unwrap();
        let desk = ReservationDesk::new(ChangingRooms(std::sync::Mutex::new(vec![only])));
        let early = Reservation::new(1, 1, "early", 0, 10, 2).unwrap();
        desk.book(early, &RoomQuery::all()).await.unwrap();

        // Storage now knows about a booking made elsewhere
        let mut updated = Room::new(1, "Only", 10, "1F").unwrap();
        updated
            .book(&Reservation::new(9, 2, "remote", 100, 200, 2).unwrap())
            .unwrap();
        *desk.source.0.lock().unwrap() = vec![updated];

        let clash = Reservation::new(2, 1, "clash", 150, 160, 2).unwrap();
        let failure = desk.book(clash, &RoomQuery::all()).await.unwrap_err();
        assert_eq!(failure.reason, FailureReason::NotAvailable);

        // The desk's own earlier booking is still there
        let room = desk.room(1).await.unwrap();
        let ids: Vec<_> = room.reservations().iter().map(|r| r.id()).collect();
        assert_eq!(ids, vec![9, 1]);
    }

    #[tokio::test]
    async fn applied_plan_becomes_authoritative() {
        let desk = ReservationDesk::new(rooms());
        desk.candidates(&RoomQuery::all()).await;

        let clock = floorplan_engine::ManualClock::new(0);
        let mut winner = FloorPlan::new(1, "Floor1", 1, 5, &clock);
        let mut shrunk = Room::new(2, "Boardroom", 2, "2F").unwrap();
        shrunk.book(&reservation(7, 2)).unwrap();
        winner.add_room(shrunk).unwrap();

        desk.apply_plan(&winner).await;

        let room = desk.room(2).await.unwrap();
        assert_eq!(room.capacity(), 2);
        assert!(!room.is_available(&Interval::new(9 * HOUR, 10 * HOUR).unwrap()));
        assert_eq!(desk.room_count(), 2);
    }
}
