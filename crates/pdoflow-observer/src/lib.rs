//! Observer API: lazy sequences over database state.
//!
//! Every operation here performs exactly one `SELECT` per poll and holds
//! no transaction or lock between yields. Callers drive the pace by
//! sleeping between pulls; nothing in this crate sleeps on their behalf
//! except [`await_for_status_threshold`], which is a convenience that
//! blocks until a predicate is satisfied.

mod error;

pub use error::{ObserverError, ObserverResult};

use std::time::Duration;

use async_stream::try_stream;
use futures::Stream;
use pdoflow_core::{Posting, ResourceId, Status};
use pdoflow_db::{PgPostingRepo, PostingRepo};
use sqlx::PgPool;

/// Successive `Posting` snapshots, terminating once the posting reaches a
/// terminal status.
pub fn poll_posting(pool: PgPool, posting_id: ResourceId) -> impl Stream<Item = ObserverResult<Posting>> {
    try_stream! {
        let repo = PgPostingRepo::new(pool);
        loop {
            let posting = repo.get(posting_id).await?;
            let terminal = posting.status.is_terminal();
            yield posting;
            if terminal {
                break;
            }
        }
    }
}

/// Percentage of units in a terminal status, in `[0.0, 100.0]`.
/// Terminates once it reaches 100.0. Fails with `NotFound` if the
/// posting id is unknown on the first pull. A posting with zero units
/// yields 100.0 immediately.
pub fn poll_posting_percent(
    pool: PgPool,
    posting_id: ResourceId,
) -> impl Stream<Item = ObserverResult<f64>> {
    try_stream! {
        let repo = PgPostingRepo::new(pool);
        loop {
            let counts = repo.counts(posting_id).await?;
            let total = counts.total();
            let percent = if total == 0 {
                100.0
            } else {
                (counts.terminal() as f64 / total as f64) * 100.0
            };
            yield percent;
            if percent >= 100.0 {
                break;
            }
        }
    }
}

/// Count of units in `status` for a posting. Infinite; the caller
/// terminates by dropping the stream.
pub fn poll_job_status_count(
    pool: PgPool,
    posting_id: ResourceId,
    status: Status,
) -> impl Stream<Item = ObserverResult<i64>> {
    try_stream! {
        loop {
            let count: (i64,) = sqlx::query_as(
                "SELECT COUNT(*) FROM job_records WHERE posting_id = $1 AND status = $2",
            )
            .bind(posting_id)
            .bind(status)
            .fetch_one(&pool)
            .await?;
            yield count.0;
        }
    }
}

/// Poll `poll_job_status_count` at `poll_interval` until `predicate`
/// returns true for the observed count, or `max_wait` elapses.
pub async fn await_for_status_threshold(
    pool: &PgPool,
    posting_id: ResourceId,
    status: Status,
    poll_interval: Duration,
    max_wait: Option<Duration>,
    predicate: impl Fn(i64) -> bool,
) -> ObserverResult<i64> {
    let deadline = max_wait.map(|wait| tokio::time::Instant::now() + wait);

    loop {
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM job_records WHERE posting_id = $1 AND status = $2",
        )
        .bind(posting_id)
        .bind(status)
        .fetch_one(pool)
        .await?;

        if predicate(count.0) {
            return Ok(count.0);
        }

        if let Some(deadline) = deadline {
            if tokio::time::Instant::now() >= deadline {
                return Err(ObserverError::Timeout(format!(
                    "posting {posting_id} did not reach threshold for {status:?}"
                )));
            }
        }

        tokio::time::sleep(poll_interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    /// Needs a live Postgres with migrations applied.
    #[tokio::test]
    #[ignore]
    async fn empty_posting_percent_is_immediately_done() {
        let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let pool = pdoflow_db::create_pool(&database_url, 5).await.unwrap();
        pdoflow_db::run_migrations(&pool).await.unwrap();

        let postings = PgPostingRepo::new(pool.clone());
        let posting = PostingRepo::create(&postings, "tester", "noop", "tests::noop")
            .await
            .unwrap();

        let mut stream = Box::pin(poll_posting_percent(pool, posting.id));
        let first = stream.next().await.unwrap().unwrap();
        assert_eq!(first, 100.0);
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    #[ignore]
    async fn unknown_posting_fails_with_not_found() {
        let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let pool = pdoflow_db::create_pool(&database_url, 5).await.unwrap();
        pdoflow_db::run_migrations(&pool).await.unwrap();

        let mut stream = Box::pin(poll_posting_percent(pool, ResourceId::new()));
        let first = stream.next().await.unwrap();
        assert!(matches!(first, Err(ObserverError::NotFound(_))));
    }
}
