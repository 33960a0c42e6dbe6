//! # Floor plan sync
//!
//! Async service layer over [`floorplan_engine`]: an offline queue that
//! survives restarts, a [`Synchronizer`] that drains it against a remote
//! authority, and a [`ReservationDesk`] that books rooms under concurrent
//! requests.
//!
//! A sync run commits the whole batch or nothing. Any failure (unreachable
//! remote, push error, timeout, unresolvable conflict, cancellation) leaves
//! the local store exactly as it was.

pub mod config;
pub mod credentials;
pub mod demo;
pub mod desk;
pub mod error;
pub mod local_store;
pub mod remote;
pub mod storage;
pub mod synchronizer;

pub use config::{Config, ConfigError};
pub use credentials::Blake3Protector;
pub use desk::{ReservationDesk, SharedRoom};
pub use error::{
    PlanFailure, PlanFailureCause, RemoteError, Result, StorageError, StoreError, SyncError,
};
pub use local_store::LocalStore;
pub use remote::{PushOutcome, RemoteAuthority};
pub use storage::{RoomQuery, RoomSource};
pub use synchronizer::{PlanConfirmation, PlanOutcome, SyncReport, Synchronizer};

pub use tokio_util::sync::CancellationToken;
