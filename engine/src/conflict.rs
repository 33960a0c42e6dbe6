//! Conflict resolution between two versions of the same logical plan.
//!
//! Whole-version selection, never a merge. Given a local and a remote copy:
//!
//! 1. Higher `priority` wins
//! 2. Equal priority: strictly later `last_modified` wins
//! 3. Both equal: undecidable, an admin has to pick
//!
//! The winner is committed with [`FloorPlan::upload_plan`]; the loser is never
//! touched. A failed resolution touches neither.

use crate::{error::Result, Clock, Error, FloorPlan, PlanName, PlanVersion, Timestamp, User};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Which side won.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConflictResolution {
    /// Local copy survives
    LocalWins,
    /// Remote copy survives
    RemoteWins,
}

/// Which rule settled the conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DecidedBy {
    Priority,
    LastModified,
}

/// Outcome of [`ConflictResolver::decide`], before anything is committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Decision {
    pub resolution: ConflictResolution,
    pub decided_by: DecidedBy,
}

/// A committed resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resolution {
    /// Logical plan that was in conflict
    pub plan: PlanName,
    pub resolution: ConflictResolution,
    pub decided_by: DecidedBy,
    /// Version of the winner after its upload
    pub winning_version: PlanVersion,
    /// Last-modified stamp of the winner after its upload
    pub committed_at: Timestamp,
}

/// Picks and commits the surviving version of a plan.
pub struct ConflictResolver<'a> {
    clock: &'a dyn Clock,
}

impl<'a> ConflictResolver<'a> {
    /// Create a resolver that stamps winners with `clock`.
    pub fn new(clock: &'a dyn Clock) -> Self {
        Self { clock }
    }

    /// Decide without committing. Pure and deterministic.
    pub fn decide(local: &FloorPlan, remote: &FloorPlan) -> Result<Decision> {
        check_same_plan(local, remote)?;

        let by_priority = local.priority().cmp(&remote.priority());
        let (ordering, decided_by) = match by_priority {
            Ordering::Equal => (
                local.last_modified().cmp(&remote.last_modified()),
                DecidedBy::LastModified,
            ),
            other => (other, DecidedBy::Priority),
        };

        let resolution = match ordering {
            Ordering::Greater => ConflictResolution::LocalWins,
            Ordering::Less => ConflictResolution::RemoteWins,
            Ordering::Equal => {
                return Err(Error::AdminInterventionRequired(local.name().to_string()))
            }
        };

        Ok(Decision {
            resolution,
            decided_by,
        })
    }

    /// Decide and commit the winner. Exactly one `upload_plan` on success,
    /// none on failure.
    pub fn resolve(&self, local: &mut FloorPlan, remote: &mut FloorPlan) -> Result<Resolution> {
        let decision = Self::decide(local, remote)?;

        let winner = match decision.resolution {
            ConflictResolution::LocalWins => local,
            ConflictResolution::RemoteWins => remote,
        };
        let winning_version = winner.upload_plan(self.clock);

        Ok(Resolution {
            plan: winner.name().to_string(),
            resolution: decision.resolution,
            decided_by: decision.decided_by,
            winning_version,
            committed_at: winner.last_modified(),
        })
    }

    /// Resolve on behalf of `actor`.
    ///
    /// Missing plans are rejected first, then non-admin actors. Nothing is
    /// mutated unless both checks pass.
    pub fn resolve_as(
        &self,
        actor: &User,
        local: Option<&mut FloorPlan>,
        remote: Option<&mut FloorPlan>,
    ) -> Result<Resolution> {
        let (local, remote) = match (local, remote) {
            (Some(local), Some(remote)) => (local, remote),
            (None, None) => return Err(Error::InvalidPlanReference("both plans are absent".into())),
            (None, _) => return Err(Error::InvalidPlanReference("local plan is absent".into())),
            (_, None) => return Err(Error::InvalidPlanReference("remote plan is absent".into())),
        };
        if !actor.is_admin() {
            return Err(Error::NotAuthorized(actor.id()));
        }
        self.resolve(local, remote)
    }
}

fn check_same_plan(local: &FloorPlan, remote: &FloorPlan) -> Result<()> {
    if local.name() != remote.name() {
        return Err(Error::PlanMismatch {
            local: local.name().to_string(),
            remote: remote.name().to_string(),
        });
    }
    Ok(())
}
