//! Batch claim: the transactional heart of the dispatch protocol.

use pdoflow_core::JobRecord;
use sqlx::PgPool;
use tracing::debug;

use crate::DispatchResult;

/// A claimed unit together with the resolution address carried by its
/// owning posting, since a worker needs both to invoke the callable.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ClaimedJob {
    #[sqlx(flatten)]
    pub job: JobRecord,
    pub entry_point: String,
    pub target_function: String,
}

/// Atomically claim up to `batch_size` waiting job records, ordered by
/// `(priority DESC, created_on ASC, id)`, and flip the owning posting to
/// `executing` if it was still `waiting`.
///
/// `FOR UPDATE SKIP LOCKED` means concurrent claimers never block each
/// other: a row locked by another in-flight claim is simply invisible to
/// this one, so two workers never end up with the same job record. A
/// worker that crashes between claiming and committing leaves its rows
/// locked only until its connection drops, at which point Postgres rolls
/// the update back and the rows reappear as waiting.
pub async fn claim_batch(
    pool: &PgPool,
    worker_id: &str,
    batch_size: i64,
) -> DispatchResult<Vec<ClaimedJob>> {
    let mut tx = pool.begin().await?;

    let claimed = sqlx::query_as::<_, ClaimedJob>(
        r#"
        WITH claimable AS (
            SELECT jr.id
            FROM job_records jr
            JOIN postings p ON p.id = jr.posting_id
            WHERE jr.status = 'waiting'
              AND p.status IN ('waiting', 'executing')
            ORDER BY jr.priority DESC, jr.created_on ASC, jr.id
            LIMIT $1
            FOR UPDATE OF jr SKIP LOCKED
        ),
        updated AS (
            UPDATE job_records
            SET status = 'executing', updated_on = NOW()
            FROM claimable
            WHERE job_records.id = claimable.id
            RETURNING job_records.*
        )
        SELECT updated.*, postings.entry_point, postings.target_function
        FROM updated
        JOIN postings ON postings.id = updated.posting_id
        ORDER BY updated.priority DESC, updated.created_on ASC, updated.id
        "#,
    )
    .bind(batch_size)
    .fetch_all(&mut *tx)
    .await?;

    if !claimed.is_empty() {
        let posting_ids: std::collections::HashSet<_> =
            claimed.iter().map(|c| c.job.posting_id).collect();
        for posting_id in posting_ids {
            sqlx::query(
                "UPDATE postings SET status = 'executing' WHERE id = $1 AND status = 'waiting'",
            )
            .bind(posting_id)
            .execute(&mut *tx)
            .await?;
        }
    }

    tx.commit().await?;

    debug!(worker_id, claimed = claimed.len(), "claimed batch");
    Ok(claimed)
}
