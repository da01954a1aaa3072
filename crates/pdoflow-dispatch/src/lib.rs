//! Dispatch protocol for PDOFlow: atomic batch claim and unit completion.
//!
//! The central invariant enforced here is that at most one worker ever
//! holds a given job record in `executing` at a time, without serializing
//! workers against each other. `FOR UPDATE SKIP LOCKED` partitions the
//! waiting queue across concurrent claimers instead.

mod claim;
mod complete;
mod error;

pub use claim::{ClaimedJob, claim_batch};
pub use complete::{JobOutcome, complete_batch, complete_job, complete_job_in_tx, release_job};
pub use error::{DispatchError, DispatchResult};

use pdoflow_core::ResourceId;
use sqlx::PgPool;

/// Thin wrapper around a pool exposing the dispatch protocol as methods,
/// generalized from a single-job queue to batch claims.
#[derive(Clone)]
pub struct Dispatcher {
    pool: PgPool,
}

impl Dispatcher {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn claim_batch(&self, worker_id: &str, batch_size: i64) -> DispatchResult<Vec<ClaimedJob>> {
        claim::claim_batch(&self.pool, worker_id, batch_size).await
    }

    pub async fn complete_job(&self, job_id: ResourceId, outcome: JobOutcome) -> DispatchResult<()> {
        complete::complete_job(&self.pool, job_id, outcome).await
    }

    pub async fn complete_batch(&self, outcomes: Vec<(ResourceId, JobOutcome)>) -> DispatchResult<()> {
        complete::complete_batch(&self.pool, outcomes).await
    }

    pub async fn release_job(&self, job_id: ResourceId) -> DispatchResult<()> {
        complete::release_job(&self.pool, job_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Exercises the claim/complete cycle against a live database. Ignored
    /// by default since it needs `DATABASE_URL` pointed at a running
    /// Postgres with migrations applied.
    #[tokio::test]
    #[ignore]
    async fn claim_then_complete_round_trip() {
        let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let pool = pdoflow_db::create_pool(&database_url, 5).await.unwrap();
        pdoflow_db::run_migrations(&pool).await.unwrap();

        let postings = pdoflow_db::PgPostingRepo::new(pool.clone());
        let job_records = pdoflow_db::PgJobRecordRepo::new(pool.clone());
        let dispatcher = Dispatcher::new(pool.clone());

        let posting = pdoflow_db::PostingRepo::create(&postings, "tester", "add", "tests::add")
            .await
            .unwrap();
        pdoflow_db::JobRecordRepo::create_batch(
            &job_records,
            posting.id,
            vec![pdoflow_db::NewJobRecord::new(
                serde_json::json!([1, 2]),
                serde_json::json!({}),
            )],
        )
        .await
        .unwrap();

        let claimed = dispatcher.claim_batch("test-worker", 10).await.unwrap();
        assert_eq!(claimed.len(), 1);

        dispatcher
            .complete_job(claimed[0].job.id, JobOutcome::Success)
            .await
            .unwrap();

        let reloaded = pdoflow_db::PostingRepo::get(&postings, posting.id).await.unwrap();
        assert_eq!(reloaded.status, pdoflow_core::Status::Done);
    }

    #[tokio::test]
    #[ignore]
    async fn exhausted_retries_mark_posting_errored_out() {
        let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let pool = pdoflow_db::create_pool(&database_url, 5).await.unwrap();
        pdoflow_db::run_migrations(&pool).await.unwrap();

        let postings = pdoflow_db::PgPostingRepo::new(pool.clone());
        let job_records = pdoflow_db::PgJobRecordRepo::new(pool.clone());
        let dispatcher = Dispatcher::new(pool.clone());

        let posting = pdoflow_db::PostingRepo::create(&postings, "tester", "flaky", "tests::flaky")
            .await
            .unwrap();
        pdoflow_db::JobRecordRepo::create_batch(
            &job_records,
            posting.id,
            vec![pdoflow_db::NewJobRecord::new(
                serde_json::json!([]),
                serde_json::json!({}),
            )
            .with_tries(1)],
        )
        .await
        .unwrap();

        let claimed = dispatcher.claim_batch("test-worker", 10).await.unwrap();
        dispatcher
            .complete_job(claimed[0].job.id, JobOutcome::Failure)
            .await
            .unwrap();

        let job = pdoflow_db::JobRecordRepo::get(&job_records, claimed[0].job.id)
            .await
            .unwrap();
        assert_eq!(job.status, pdoflow_core::Status::ErroredOut);
        assert_eq!(job.tries_remaining, 0);

        let reloaded = pdoflow_db::PostingRepo::get(&postings, posting.id).await.unwrap();
        assert_eq!(reloaded.status, pdoflow_core::Status::ErroredOut);
    }

    #[tokio::test]
    #[ignore]
    async fn release_job_does_not_consume_a_retry() {
        let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let pool = pdoflow_db::create_pool(&database_url, 5).await.unwrap();
        pdoflow_db::run_migrations(&pool).await.unwrap();

        let postings = pdoflow_db::PgPostingRepo::new(pool.clone());
        let job_records = pdoflow_db::PgJobRecordRepo::new(pool.clone());
        let dispatcher = Dispatcher::new(pool.clone());

        let posting = pdoflow_db::PostingRepo::create(&postings, "tester", "add", "tests::add")
            .await
            .unwrap();
        pdoflow_db::JobRecordRepo::create_batch(
            &job_records,
            posting.id,
            vec![pdoflow_db::NewJobRecord::new(
                serde_json::json!([1, 2]),
                serde_json::json!({}),
            )
            .with_tries(3)],
        )
        .await
        .unwrap();

        let claimed = dispatcher.claim_batch("test-worker", 10).await.unwrap();
        dispatcher.release_job(claimed[0].job.id).await.unwrap();

        let job = pdoflow_db::JobRecordRepo::get(&job_records, claimed[0].job.id)
            .await
            .unwrap();
        assert_eq!(job.status, pdoflow_core::Status::Waiting);
        assert_eq!(job.tries_remaining, 3);
    }
}
