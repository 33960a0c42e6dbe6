//! Drains the local store against the remote authority.
//!
//! # Algorithm
//!
//! 1. Probe connectivity; unreachable means nothing is touched
//! 2. Copy the queued entries (the batch)
//! 3. Push each plan, up to `concurrency` at a time
//! 4. On divergence, resolve (local, remote) under the plan's lock
//! 5. All confirmed: acknowledge exactly the batch. Anything else: leave the
//!    store as it was and report why
//!
//! Resolution runs on copies of the queued plans, so a failed run leaves no
//! trace in the queue.

use crate::config::Config;
use crate::error::{PlanFailure, PlanFailureCause, RemoteError, Result, SyncError};
use crate::local_store::LocalStore;
use crate::remote::{PushOutcome, RemoteAuthority};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use floorplan_engine::{
    Clock, ConflictResolution, ConflictResolver, EntryId, FloorPlan, QueuedPlan, Resolution, User,
};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// How a queued plan was confirmed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "resolution", rename_all = "camelCase")]
pub enum PlanOutcome {
    /// The remote accepted the local copy
    Accepted,
    /// The copies diverged and were resolved
    Resolved(Resolution),
}

/// A queued plan that was confirmed during a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanConfirmation {
    pub entry_id: EntryId,
    pub plan_name: String,
    pub outcome: PlanOutcome,
    /// The version that is now authoritative
    pub surviving: FloorPlan,
}

/// Result of a successful sync run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    /// One confirmation per drained entry, in queue order
    pub confirmed: Vec<PlanConfirmation>,
}

impl SyncReport {
    /// How many plans needed conflict resolution.
    pub fn resolved_count(&self) -> usize {
        self.confirmed
            .iter()
            .filter(|c| matches!(c.outcome, PlanOutcome::Resolved(_)))
            .count()
    }
}

/// Reconciles the local store with a remote authority.
pub struct Synchronizer<R> {
    remote: R,
    store: Arc<LocalStore>,
    clock: Arc<dyn Clock>,
    /// One lock per logical plan name
    plan_locks: DashMap<String, Arc<Mutex<()>>>,
    concurrency: usize,
    push_timeout: Duration,
    connectivity_timeout: Duration,
}

impl<R: RemoteAuthority> Synchronizer<R> {
    /// Create a synchronizer.
    pub fn new(remote: R, store: Arc<LocalStore>, clock: Arc<dyn Clock>, config: &Config) -> Self {
        Self {
            remote,
            store,
            clock,
            plan_locks: DashMap::new(),
            concurrency: config.concurrency.max(1),
            push_timeout: config.push_timeout,
            connectivity_timeout: config.connectivity_timeout,
        }
    }

    /// Sync every queued plan, or none.
    ///
    /// Cancellation is checked before each plan is pushed. A cancelled or
    /// failed run leaves the store exactly as it found it.
    pub async fn server_sync(&self, cancel: &CancellationToken) -> Result<SyncReport> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();

        if !self.is_reachable().await {
            tracing::warn!(%run_id, "Remote unreachable; sync postponed");
            return Err(SyncError::Unavailable);
        }

        let batch = self.store.pending().await;
        let entry_ids: Vec<EntryId> = batch.iter().map(|e| e.entry_id).collect();
        tracing::info!(%run_id, plans = batch.len(), "Starting sync run");

        let results: Vec<std::result::Result<PlanConfirmation, PlanFailure>> = stream::iter(batch)
            .map(|entry| self.sync_entry(entry, cancel))
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut confirmed = Vec::with_capacity(results.len());
        let mut failures = Vec::new();
        for result in results {
            match result {
                Ok(confirmation) => confirmed.push(confirmation),
                Err(failure) => failures.push(failure),
            }
        }

        if !failures.is_empty() {
            failures.sort_by_key(|f| f.entry_id);
            let cancelled = failures
                .iter()
                .all(|f| f.cause == PlanFailureCause::Cancelled);
            if cancelled {
                tracing::info!(%run_id, skipped = failures.len(), "Sync run cancelled");
                return Err(SyncError::Cancelled);
            }
            tracing::warn!(
                %run_id,
                failed = failures.len(),
                confirmed = confirmed.len(),
                "Sync run failed; keeping queue"
            );
            return Err(SyncError::PartialFailure { failures });
        }

        self.store.acknowledge(&entry_ids).await?;
        confirmed.sort_by_key(|c| c.entry_id);

        let report = SyncReport {
            run_id,
            started_at,
            completed_at: Utc::now(),
            confirmed,
        };
        tracing::info!(
            %run_id,
            synced = report.confirmed.len(),
            resolved = report.resolved_count(),
            "Sync run complete"
        );
        Ok(report)
    }

    /// Resolve two copies of a plan under the same lock sync runs use.
    pub async fn resolve_manually(
        &self,
        local: &mut FloorPlan,
        remote: &mut FloorPlan,
    ) -> Result<Resolution> {
        Ok(self.resolve_locked(local, remote).await?)
    }

    /// Resolve on behalf of a user; only admins may.
    pub async fn resolve_as(
        &self,
        actor: &User,
        local: Option<&mut FloorPlan>,
        remote: Option<&mut FloorPlan>,
    ) -> Result<Resolution> {
        let resolver = ConflictResolver::new(self.clock.as_ref());
        let name = local.as_deref().or(remote.as_deref()).map(|p| p.name().to_string());
        let resolution = match name {
            Some(name) => {
                self.with_plan_lock(&name, || resolver.resolve_as(actor, local, remote))
                    .await?
            }
            None => resolver.resolve_as(actor, local, remote)?,
        };
        tracing::info!(
            plan = %resolution.plan,
            actor = actor.username(),
            resolution = ?resolution.resolution,
            "Resolved conflict on behalf of user"
        );
        Ok(resolution)
    }

    async fn sync_entry(
        &self,
        entry: QueuedPlan,
        cancel: &CancellationToken,
    ) -> std::result::Result<PlanConfirmation, PlanFailure> {
        let QueuedPlan { entry_id, plan, .. } = entry;
        let plan_name = plan.name().to_string();
        let fail = |cause: PlanFailureCause| PlanFailure {
            entry_id,
            plan_name: plan_name.clone(),
            cause,
        };

        if cancel.is_cancelled() {
            return Err(fail(PlanFailureCause::Cancelled));
        }

        tracing::debug!(plan = %plan_name, entry_id, version = plan.version(), "Updating plan on server");
        let outcome = match timeout(self.push_timeout, self.remote.push_plan(&plan)).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) => {
                tracing::warn!(plan = %plan_name, entry_id, error = %e, "Push failed");
                return Err(fail(e.into()));
            }
            Err(_) => {
                tracing::warn!(plan = %plan_name, entry_id, "Push timed out");
                return Err(fail(RemoteError::Timeout(self.push_timeout).into()));
            }
        };

        let (outcome, surviving) = match outcome {
            PushOutcome::Accepted => (PlanOutcome::Accepted, plan),
            PushOutcome::Diverged(remote) => {
                let mut local = plan;
                let mut remote = remote;
                let resolution = self
                    .resolve_locked(&mut local, &mut remote)
                    .await
                    .map_err(|e| {
                        tracing::warn!(plan = %plan_name, entry_id, error = %e, "Conflict unresolved");
                        fail(e.into())
                    })?;
                let surviving = match resolution.resolution {
                    ConflictResolution::LocalWins => local,
                    ConflictResolution::RemoteWins => remote,
                };
                (PlanOutcome::Resolved(resolution), surviving)
            }
        };

        tracing::info!(plan = %plan_name, entry_id, version = surviving.version(), "Plan synced with server");
        Ok(PlanConfirmation {
            entry_id,
            plan_name,
            outcome,
            surviving,
        })
    }

    async fn resolve_locked(
        &self,
        local: &mut FloorPlan,
        remote: &mut FloorPlan,
    ) -> floorplan_engine::error::Result<Resolution> {
        let name = local.name().to_string();
        let resolver = ConflictResolver::new(self.clock.as_ref());
        let resolution = self
            .with_plan_lock(&name, || resolver.resolve(local, remote))
            .await?;
        tracing::info!(
            plan = %resolution.plan,
            resolution = ?resolution.resolution,
            decided_by = ?resolution.decided_by,
            version = resolution.winning_version,
            "Resolved conflict"
        );
        Ok(resolution)
    }

    /// Run `f` while holding the lock for plan `name`.
    ///
    /// The lock entry is dropped once no other caller holds or waits on it.
    async fn with_plan_lock<T>(&self, name: &str, f: impl FnOnce() -> T) -> T {
        let lock = self
            .plan_locks
            .entry(name.to_string())
            .or_default()
            .value()
            .clone();

        let result = {
            let _guard = lock.lock().await;
            f()
        };

        drop(lock);
        self.plan_locks
            .remove_if(name, |_, lock| Arc::strong_count(lock) == 1);
        result
    }

    /// Number of plans with a resolution in flight or waiting.
    pub fn locked_plans(&self) -> usize {
        self.plan_locks.len()
    }

    async fn is_reachable(&self) -> bool {
        timeout(self.connectivity_timeout, self.remote.check_connectivity())
            .await
            .unwrap_or(false)
    }
}
