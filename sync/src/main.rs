//! Floor plan sync demo.
//!
//! Books a few rooms, edits plans while "offline", then syncs them against a
//! remote that is only reachable some of the time.

use chrono::NaiveDateTime;
use floorplan_engine::{Clock, FloorPlan, Reservation, Role, Room, SystemClock, Timestamp, User};
use floorplan_sync::demo::{FlakyRemote, PlanRooms};
use floorplan_sync::{
    Blake3Protector, CancellationToken, Config, LocalStore, PlanOutcome, ReservationDesk,
    RoomQuery, SyncError, Synchronizer,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "floorplan_sync=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let store = Arc::new(match &config.local_store_path {
        Some(path) => LocalStore::open(path, Arc::clone(&clock)).await?,
        None => LocalStore::in_memory(Arc::clone(&clock)),
    });

    let protector = Blake3Protector::from_config(config.auth_secret.as_deref());
    let admin = User::new(1, "admin", Role::Admin, "admin-pw", &protector);
    let member = User::new(2, "member", Role::Member, "member-pw", &protector);
    if !admin.authenticate("admin-pw", &protector) {
        return Err("admin credentials rejected".into());
    }

    // Plans as the office knows them
    let mut floor1 = FloorPlan::new(1, "Floor1", member.id(), 1, clock.as_ref())
        .with_description("Ground floor");
    floor1.add_room(Room::new(101, "Huddle", 4, "1F-East")?)?;
    floor1.add_room(Room::new(102, "Boardroom", 12, "1F-West")?)?;

    let mut floor2 = FloorPlan::new(2, "Floor2", admin.id(), 2, clock.as_ref());
    floor2.add_room(Room::new(201, "Library", 6, "2F")?)?;

    // Bookings
    let desk = ReservationDesk::new(PlanRooms::new(vec![floor1.clone(), floor2.clone()]));
    let bookings = [
        ("standup", "2024-05-06 09:00", "2024-05-06 09:30", 3, "Floor1"),
        ("planning", "2024-05-06 09:00", "2024-05-06 11:00", 8, "Floor1"),
        ("all-hands", "2024-05-06 10:00", "2024-05-06 11:00", 30, "Floor1"),
        ("reading", "2024-05-06 09:15", "2024-05-06 10:00", 2, "Floor2"),
    ];
    for (id, (what, start, end, attendees, plan)) in (1..).zip(bookings) {
        let (start, end) = (parse_time(start)?, parse_time(end)?);
        let reservation = Reservation::new(id, member.id(), what, start, end, attendees)?;
        match desk.book(reservation, &RoomQuery::in_plan(plan)).await {
            Ok(booking) => tracing::info!(what, room = booking.room_id, "Reserved"),
            Err(failure) => tracing::info!(what, reason = %failure.reason, "Couldn't reserve"),
        }
    }

    // The remote already holds a higher priority edit of Floor2
    let remote = Arc::new(FlakyRemote::new(config.demo_online_ratio));
    let mut remote_floor2 = floor2.clone();
    remote_floor2.set_priority(5);
    remote_floor2.upload_plan(clock.as_ref());
    remote.record(remote_floor2);

    // Offline edits
    floor1.upload_plan(clock.as_ref());
    floor2.set_description("Quiet floor");
    floor2.upload_plan(clock.as_ref());
    store.save_locally(floor1).await?;
    store.save_locally(floor2).await?;

    let clock_ref = Arc::clone(&clock);
    let synchronizer = Synchronizer::new(Arc::clone(&remote), Arc::clone(&store), clock, &config);

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_signal.cancel();
        }
    });

    for attempt in 1..=config.retry_attempts.max(1) {
        match synchronizer.server_sync(&cancel).await {
            Ok(report) => {
                tracing::debug!(report = %serde_json::to_string(&report)?, "Sync report");
                for confirmation in report.confirmed {
                    if let PlanOutcome::Resolved(resolution) = &confirmation.outcome {
                        tracing::info!(
                            plan = %confirmation.plan_name,
                            resolution = ?resolution.resolution,
                            "Conflict settled"
                        );
                    }
                    desk.apply_plan(&confirmation.surviving).await;
                    remote.record(confirmation.surviving);
                }
                break;
            }
            Err(SyncError::Unavailable) if attempt < config.retry_attempts => {
                tracing::info!(attempt, "Remote offline; retrying");
                tokio::time::sleep(config.retry_delay).await;
            }
            Err(SyncError::PartialFailure { failures }) => {
                for failure in &failures {
                    tracing::warn!(plan = %failure.plan_name, cause = %failure.cause, "Plan not synced");
                }
                break;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Sync gave up");
                break;
            }
        }
    }

    tracing::info!(pending = store.len().await, "Done");

    // Two copies with equal priority and stamp need an admin
    let mut local = FloorPlan::new(3, "Annex", member.id(), 1, clock_ref.as_ref());
    let mut other = local.clone();
    match synchronizer.resolve_manually(&mut local, &mut other).await {
        Err(e) => tracing::info!(error = %e, "Tie left for an admin"),
        Ok(_) => return Err("identical copies resolved without an admin".into()),
    }
    if let Err(e) = synchronizer
        .resolve_as(&member, Some(&mut local), Some(&mut other))
        .await
    {
        tracing::info!(error = %e, "Member may not settle conflicts");
    }
    local.set_priority(2);
    let resolution = synchronizer
        .resolve_as(&admin, Some(&mut local), Some(&mut other))
        .await?;
    tracing::info!(version = resolution.winning_version, "Admin settled Annex");

    Ok(())
}

fn parse_time(raw: &str) -> Result<Timestamp, Box<dyn std::error::Error>> {
    let parsed = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M")?;
    Ok(Timestamp::try_from(parsed.and_utc().timestamp_millis())?)
}
