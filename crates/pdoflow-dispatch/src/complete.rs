//! Completion: writes a unit's outcome and recomputes its posting's status.

use pdoflow_core::{ResourceId, Status};
use sqlx::{PgPool, Postgres, Transaction};
use tracing::debug;

use crate::{DispatchError, DispatchResult};

/// The result of executing a claimed unit.
#[derive(Debug, Clone)]
pub enum JobOutcome {
    Success,
    Failure,
}

async fn apply_outcome<'t>(
    tx: &mut Transaction<'t, Postgres>,
    job_id: ResourceId,
    outcome: &JobOutcome,
) -> DispatchResult<ResourceId> {
    let row: Option<(ResourceId, i32)> = sqlx::query_as(
        "SELECT posting_id, tries_remaining FROM job_records WHERE id = $1 FOR UPDATE",
    )
    .bind(job_id)
    .fetch_optional(&mut **tx)
    .await?;
    let (posting_id, tries_remaining) =
        row.ok_or_else(|| DispatchError::NotFound(format!("job record {job_id}")))?;

    match outcome {
        JobOutcome::Success => {
            sqlx::query("UPDATE job_records SET status = 'done', updated_on = NOW() WHERE id = $1")
                .bind(job_id)
                .execute(&mut **tx)
                .await?;
        }
        JobOutcome::Failure => {
            let remaining = tries_remaining - 1;
            let status = if remaining > 0 {
                Status::Waiting
            } else {
                Status::ErroredOut
            };
            sqlx::query(
                "UPDATE job_records SET status = $2, tries_remaining = $3, updated_on = NOW() WHERE id = $1",
            )
            .bind(job_id)
            .bind(status)
            .bind(remaining)
            .execute(&mut **tx)
            .await?;
        }
    }

    Ok(posting_id)
}

/// Recompute a posting's derived status from its units, but only when none
/// remain waiting or executing, and only when the posting is currently
/// `waiting` or `executing` itself. A posting administratively moved to
/// `paused` or `cancelled` keeps running its already-`executing` units to
/// completion (§5), but that completion must not flip it to `done` or
/// `errored_out` afterward — status transitions are monotone for the
/// terminal states, and `cancelled` is one of them.
async fn recompute_posting<'t>(
    tx: &mut Transaction<'t, Postgres>,
    posting_id: ResourceId,
) -> DispatchResult<()> {
    let (waiting, executing, errored_out): (i64, i64, i64) = sqlx::query_as(
        r#"
        SELECT
            COUNT(*) FILTER (WHERE status = 'waiting') AS waiting,
            COUNT(*) FILTER (WHERE status = 'executing') AS executing,
            COUNT(*) FILTER (WHERE status = 'errored_out') AS errored_out
        FROM job_records
        WHERE posting_id = $1
        "#,
    )
    .bind(posting_id)
    .fetch_one(&mut **tx)
    .await?;

    if waiting + executing > 0 {
        return Ok(());
    }

    let new_status = if errored_out > 0 {
        Status::ErroredOut
    } else {
        Status::Done
    };

    sqlx::query("UPDATE postings SET status = $2 WHERE id = $1 AND status IN ('waiting', 'executing')")
        .bind(posting_id)
        .bind(new_status)
        .execute(&mut **tx)
        .await?;

    Ok(())
}

/// Apply `outcome` to a single unit and recompute its posting, within a
/// transaction the caller already holds open. Lets a worker share this
/// write with a profile persist so outcome and profile are never visible
/// independently of each other.
pub async fn complete_job_in_tx<'t>(
    tx: &mut Transaction<'t, Postgres>,
    job_id: ResourceId,
    outcome: JobOutcome,
) -> DispatchResult<()> {
    let posting_id = apply_outcome(tx, job_id, &outcome).await?;
    recompute_posting(tx, posting_id).await?;
    debug!(job_id = %job_id, ?outcome, "completed unit");
    Ok(())
}

/// Apply `outcome` to a single unit and recompute its posting in one
/// transaction.
pub async fn complete_job(
    pool: &PgPool,
    job_id: ResourceId,
    outcome: JobOutcome,
) -> DispatchResult<()> {
    let mut tx = pool.begin().await?;
    complete_job_in_tx(&mut tx, job_id, outcome).await?;
    tx.commit().await?;
    Ok(())
}

/// Release a claimed unit back to `waiting` without touching
/// `tries_remaining`, for a worker that chooses not to execute a unit it
/// already holds (e.g. its failure cache recognizes the unit as one this
/// worker just watched fail). Unlike [`complete_job`], this does not
/// consume a retry: the unit was never actually re-attempted, so another
/// worker gets the same budget the first worker had.
pub async fn release_job(pool: &PgPool, job_id: ResourceId) -> DispatchResult<()> {
    let mut tx = pool.begin().await?;

    let updated = sqlx::query(
        "UPDATE job_records SET status = 'waiting', updated_on = NOW() WHERE id = $1 AND status = 'executing'",
    )
    .bind(job_id)
    .execute(&mut *tx)
    .await?;

    if updated.rows_affected() == 0 {
        tx.rollback().await?;
        return Err(DispatchError::NotFound(format!(
            "job record {job_id} not in executing status"
        )));
    }

    tx.commit().await?;
    debug!(job_id = %job_id, "released claimed unit back to waiting");
    Ok(())
}

/// Apply outcomes for a whole batch inside one transaction, recomputing
/// each distinct posting exactly once afterward.
pub async fn complete_batch(
    pool: &PgPool,
    outcomes: Vec<(ResourceId, JobOutcome)>,
) -> DispatchResult<()> {
    let mut tx = pool.begin().await?;
    let mut postings = std::collections::HashSet::new();

    for (job_id, outcome) in outcomes {
        let posting_id = apply_outcome(&mut tx, job_id, &outcome).await?;
        postings.insert(posting_id);
    }

    for posting_id in postings {
        recompute_posting(&mut tx, posting_id).await?;
    }

    tx.commit().await?;
    Ok(())
}
