//! Edge case and scenario tests for floorplan-engine
//!
//! These tests cover boundary conditions and the end-to-end flows between
//! rooms, plans, conflict resolution and the sync queue.

use floorplan_engine::{
    book_room, Clock, ConflictResolution, ConflictResolver, Error, FailureReason, FloorPlan, Interval,
    ManualClock, QueueSnapshot, Reservation, Room, SyncQueue,
};

const HOUR: u64 = 3_600_000;

fn at(hour: u64, minute: u64) -> u64 {
    hour * HOUR + minute * 60_000
}

// ============================================================================
// Reservation boundaries
// ============================================================================

#[test]
fn room_scenario_adjacent_and_overlapping() {
    let mut rooms = vec![Room::new(1, "R1", 10, "1F").unwrap()];
    let first = Reservation::new(1, 1, "morning", at(9, 0), at(10, 0), 5).unwrap();
    book_room(first, rooms.iter_mut()).unwrap();

    let adjacent = Reservation::new(2, 1, "next", at(10, 0), at(11, 0), 5).unwrap();
    assert!(book_room(adjacent, rooms.iter_mut()).is_ok());

    let overlapping = Reservation::new(3, 1, "clash", at(9, 30), at(10, 30), 5).unwrap();
    let failure = book_room(overlapping, rooms.iter_mut()).unwrap_err();
    assert_eq!(failure.reason, FailureReason::NotAvailable);
    assert_eq!(rooms[0].reservations().len(), 2);
}

#[test]
fn adjacent_before_existing() {
    let mut room = Room::new(1, "R1", 10, "1F").unwrap();
    room.book(&Reservation::new(1, 1, "a", at(10, 0), at(11, 0), 1).unwrap())
        .unwrap();
    assert!(room.is_available(&Interval::new(at(9, 0), at(10, 0)).unwrap()));
}

#[test]
fn enclosing_request_is_not_available() {
    let mut room = Room::new(1, "R1", 10, "1F").unwrap();
    room.book(&Reservation::new(1, 1, "a", at(10, 0), at(10, 15), 1).unwrap())
        .unwrap();
    assert!(!room.is_available(&Interval::new(at(9, 0), at(12, 0)).unwrap()));
}

#[test]
fn equal_start_and_end_rejected_before_booking() {
    let result = Reservation::new(1, 1, "empty", at(9, 0), at(9, 0), 1);
    assert!(matches!(result, Err(Error::InvalidInterval { .. })));
}

#[test]
fn busy_and_small_room_reports_not_available() {
    let mut rooms = vec![Room::new(1, "R1", 4, "1F").unwrap()];
    rooms[0]
        .book(&Reservation::new(1, 1, "a", at(9, 0), at(10, 0), 2).unwrap())
        .unwrap();

    let big = Reservation::new(2, 1, "party", at(9, 0), at(10, 0), 50).unwrap();
    let failure = book_room(big, rooms.iter_mut()).unwrap_err();
    assert_eq!(failure.reason, FailureReason::NotAvailable);
}

#[test]
fn booking_through_plan_index() {
    let clock = ManualClock::new(0);
    let mut plan = FloorPlan::new(1, "Floor1", 1, 1, &clock);
    plan.add_room(Room::new(1, "Small", 2, "1F").unwrap()).unwrap();
    plan.add_room(Room::new(2, "Large", 20, "1F").unwrap()).unwrap();

    let req = Reservation::new(1, 1, "all hands", at(14, 0), at(15, 0), 15).unwrap();
    let booking = book_room(req, plan.rooms_mut()).unwrap();

    assert_eq!(booking.room_id, 2);
    assert!(plan.get_room_by_id(2).unwrap().is_booked());
    assert!(!plan.get_room_by_id(1).unwrap().is_booked());
}

// ============================================================================
// Conflict scenarios
// ============================================================================

#[test]
fn lower_priority_local_loses() {
    let clock = ManualClock::new(10_000);
    let mut a = FloorPlan::new(1, "Floor1", 1, 3, &clock).with_last_modified(9_999);
    let mut b = FloorPlan::new(2, "Floor1", 1, 5, &clock).with_last_modified(1);
    let a_before = a.clone();

    let resolution = ConflictResolver::new(&clock).resolve(&mut a, &mut b).unwrap();

    assert_eq!(resolution.resolution, ConflictResolution::RemoteWins);
    assert_eq!(b.version(), 2.0);
    assert_eq!(a, a_before);
}

#[test]
fn identical_priority_and_timestamp_needs_admin() {
    let clock = ManualClock::new(10_000);
    let mut a = FloorPlan::new(1, "Floor1", 1, 2, &clock).with_last_modified(5_000);
    let mut b = FloorPlan::new(2, "Floor1", 1, 2, &clock)
        .with_version(1.1)
        .with_last_modified(5_000);

    let err = ConflictResolver::new(&clock)
        .resolve(&mut a, &mut b)
        .unwrap_err();

    assert_eq!(err, Error::AdminInterventionRequired("Floor1".into()));
    assert_eq!(a.version(), 1.0);
    assert_eq!(b.version(), 1.1);
}

#[test]
fn admin_tie_break_then_retry() {
    let clock = ManualClock::new(10_000);
    let resolver = ConflictResolver::new(&clock);
    let mut a = FloorPlan::new(1, "Floor1", 1, 2, &clock).with_last_modified(5_000);
    let mut b = FloorPlan::new(2, "Floor1", 1, 2, &clock).with_last_modified(5_000);

    assert!(resolver.resolve(&mut a, &mut b).is_err());

    // The admin decides the local copy matters more
    a.set_priority(3);
    let resolution = resolver.resolve(&mut a, &mut b).unwrap();
    assert_eq!(resolution.resolution, ConflictResolution::LocalWins);
    assert_eq!(a.version(), 2.0);
}

#[test]
fn repeated_resolution_keeps_bumping_winner() {
    let clock = ManualClock::new(1_000);
    let resolver = ConflictResolver::new(&clock);
    let mut a = FloorPlan::new(1, "Floor1", 1, 9, &clock);
    let mut b = FloorPlan::new(2, "Floor1", 1, 1, &clock);

    for expected in [2.0, 3.0, 4.0] {
        clock.advance(10);
        resolver.resolve(&mut a, &mut b).unwrap();
        assert_eq!(a.version(), expected);
        assert_eq!(a.last_modified(), clock.now());
    }
    assert_eq!(b.version(), 1.0);
}

// ============================================================================
// Queue persistence
// ============================================================================

#[test]
fn queue_survives_snapshot_with_booked_rooms() {
    let clock = ManualClock::new(0);
    let mut plan = FloorPlan::new(1, "Floor1", 1, 1, &clock);
    plan.add_room(Room::new(1, "R1", 10, "1F").unwrap()).unwrap();
    book_room(
        Reservation::new(1, 1, "a", at(9, 0), at(10, 0), 3).unwrap(),
        plan.rooms_mut(),
    )
    .unwrap();

    let mut queue = SyncQueue::new();
    queue.push(plan.clone(), 42);

    let json = queue.export_state().to_json().unwrap();
    let restored = SyncQueue::from_snapshot(QueueSnapshot::from_json(&json).unwrap()).unwrap();

    assert_eq!(restored.entries()[0].plan, plan);
    assert_eq!(
        restored.entries()[0]
            .plan
            .get_room_by_id(1)
            .unwrap()
            .reservations()
            .len(),
        1
    );
}

#[test]
fn empty_queue_snapshot() {
    let queue = SyncQueue::new();
    let json = queue.export_state().to_json().unwrap();
    let restored = SyncQueue::from_snapshot(QueueSnapshot::from_json(&json).unwrap()).unwrap();
    assert!(restored.is_empty());
}

#[test]
fn unicode_plan_and_room_names() {
    let clock = ManualClock::new(0);
    let names = ["日本語フロア", "Этаж 1", "🏢 HQ", "Tab\tName"];
    for (i, name) in names.iter().enumerate() {
        let mut plan = FloorPlan::new(i as u32, *name, 1, 1, &clock);
        plan.add_room(Room::new(1, *name, 1, *name).unwrap()).unwrap();
        let json = serde_json::to_string(&plan).unwrap();
        let parsed: FloorPlan = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.name(), *name);
        assert_eq!(parsed.get_room_by_id(1).unwrap().description(), *name);
    }
}
