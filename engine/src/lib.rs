//! # Floor plan engine
//!
//! Deterministic core for versioned floor plans, room reservations and
//! offline-first conflict resolution.
//!
//! ## Design Principles
//!
//! - **No IO**: the engine has no knowledge of files, network or databases
//! - **Deterministic**: time comes from an injected [`Clock`]
//! - **Validate first**: malformed input is rejected before any mutation
//!
//! ## Core Concepts
//!
//! ### Rooms and reservations
//!
//! A [`Room`] keeps its committed [`Reservation`]s in booking order. Intervals
//! are half-open (`[start, end)`), so back-to-back bookings do not clash.
//! [`book_room`] commits a reservation into the first candidate room that is
//! both free and large enough.
//!
//! ### Floor plans
//!
//! A [`FloorPlan`] is one version of a logical plan (identified by name). It
//! owns its rooms plus an index for O(1) lookup. [`FloorPlan::upload_plan`] is
//! the only way its version and last-modified stamp change.
//!
//! ### Conflict resolution
//!
//! The [`ConflictResolver`] picks the surviving version of two diverged copies:
//! higher priority wins, then the later last-modified stamp. A full tie needs
//! an admin.
//!
//! ### Sync queue
//!
//! The [`SyncQueue`] holds plans saved while offline until a sync run
//! acknowledges them. [`QueueSnapshot`] is its persistence format.
//!
//! ## Quick Start
//!
//! ```rust
//! use floorplan_engine::{book_room, FloorPlan, ManualClock, Reservation, Room};
//!
//! let clock = ManualClock::new(1_700_000_000_000);
//! let mut plan = FloorPlan::new(1, "Floor1", 1, 2, &clock);
//! plan.add_room(Room::new(10, "Boardroom", 10, "2F").unwrap()).unwrap();
//!
//! let hour = 3_600_000;
//! let standup = Reservation::new(1, 1, "standup", 9 * hour, 10 * hour, 5).unwrap();
//! let booking = book_room(standup, plan.rooms_mut()).unwrap();
//! assert_eq!(booking.room_id, 10);
//!
//! let version = plan.upload_plan(&clock);
//! assert_eq!(version, 2.0);
//! ```

pub mod clock;
pub mod conflict;
pub mod error;
pub mod floor_plan;
pub mod interval;
pub mod queue;
pub mod reservation;
pub mod room;
pub mod scheduler;
pub mod snapshot;
pub mod user;

// Re-export main types at crate root
pub use clock::{Clock, ManualClock, SystemClock};
pub use conflict::{ConflictResolution, ConflictResolver, DecidedBy, Decision, Resolution};
pub use error::Error;
pub use floor_plan::{room_key, FloorPlan};
pub use interval::Interval;
pub use queue::{QueuedPlan, SyncQueue};
pub use reservation::Reservation;
pub use room::Room;
pub use scheduler::{book_room, Booking, FailureReason, RoomRejection, SchedulingFailure};
pub use snapshot::{QueueSnapshot, SNAPSHOT_FORMAT_VERSION};
pub use user::{CredentialProtector, ProtectedToken, Role, User};

/// Type aliases for clarity
pub type RoomId = u32;
pub type PlanId = u32;
pub type ReservationId = u32;
pub type UserId = u32;
pub type EntryId = u64;
pub type PlanName = String;
pub type PlanVersion = f64;
/// Milliseconds since the Unix epoch
pub type Timestamp = u64;
