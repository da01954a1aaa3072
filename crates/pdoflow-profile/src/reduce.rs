//! Attaches a captured profile to a job record and persists it.

use pdoflow_core::{JobProfile, ResourceId};
use pdoflow_db::{ProfileRepo, ReducedProfile};
use sqlx::{Postgres, Transaction};

use crate::{CapturedProfile, ProfileResult};

/// Persist `captured` for `job_record_id` inside `tx`, which must be the
/// same transaction as the unit's success/failure write so profile rows
/// are never visible without their owning outcome, and vice versa.
pub async fn reduce_and_persist<'t>(
    repo: &dyn ProfileRepo,
    tx: &mut Transaction<'t, Postgres>,
    job_record_id: ResourceId,
    captured: CapturedProfile,
) -> ProfileResult<JobProfile> {
    let reduced = ReducedProfile {
        job_record_id,
        total_calls: captured.total_calls,
        total_time: captured.total_time,
        stats: captured.stats,
        edges: captured.edges,
    };
    let profile = repo.persist(tx, reduced).await?;
    Ok(profile)
}
