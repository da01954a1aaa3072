//! Posting repository.

use async_trait::async_trait;
use pdoflow_core::{Posting, ResourceId, Status};
use sqlx::PgPool;

use crate::{DbError, DbResult};

/// Per-status unit counts for one posting, used by the observer API.
#[derive(Debug, Clone, Copy, Default, sqlx::FromRow)]
pub struct PostingCounts {
    pub waiting: i64,
    pub executing: i64,
    pub done: i64,
    pub errored_out: i64,
    pub paused: i64,
    pub cancelled: i64,
}

impl PostingCounts {
    pub fn total(&self) -> i64 {
        self.waiting
            + self.executing
            + self.done
            + self.errored_out
            + self.paused
            + self.cancelled
    }

    pub fn terminal(&self) -> i64 {
        self.done + self.errored_out + self.cancelled
    }
}

#[async_trait]
pub trait PostingRepo: Send + Sync {
    /// Create a posting and materialize its job records in `waiting`.
    async fn create(
        &self,
        poster: &str,
        target_function: &str,
        entry_point: &str,
    ) -> DbResult<Posting>;

    async fn get(&self, id: ResourceId) -> DbResult<Posting>;
    async fn list(&self) -> DbResult<Vec<Posting>>;
    async fn set_status(&self, id: ResourceId, status: Status) -> DbResult<Posting>;
    async fn counts(&self, id: ResourceId) -> DbResult<PostingCounts>;
}

/// PostgreSQL implementation of `PostingRepo`.
pub struct PgPostingRepo {
    pool: PgPool,
}

impl PgPostingRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PostingRepo for PgPostingRepo {
    async fn create(
        &self,
        poster: &str,
        target_function: &str,
        entry_point: &str,
    ) -> DbResult<Posting> {
        let posting = sqlx::query_as::<_, Posting>(
            r#"
            INSERT INTO postings (id, poster, target_function, entry_point, status, created_on)
            VALUES ($1, $2, $3, $4, 'waiting', NOW())
            RETURNING *
            "#,
        )
        .bind(ResourceId::new())
        .bind(poster)
        .bind(target_function)
        .bind(entry_point)
        .fetch_one(&self.pool)
        .await?;
        Ok(posting)
    }

    async fn get(&self, id: ResourceId) -> DbResult<Posting> {
        sqlx::query_as::<_, Posting>("SELECT * FROM postings WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("posting {id}")))
    }

    async fn list(&self) -> DbResult<Vec<Posting>> {
        let postings =
            sqlx::query_as::<_, Posting>("SELECT * FROM postings ORDER BY created_on DESC")
                .fetch_all(&self.pool)
                .await?;
        Ok(postings)
    }

    async fn set_status(&self, id: ResourceId, status: Status) -> DbResult<Posting> {
        sqlx::query_as::<_, Posting>(
            "UPDATE postings SET status = $2 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::NotFound(format!("posting {id}")))
    }

    async fn counts(&self, id: ResourceId) -> DbResult<PostingCounts> {
        // `get` first so that an unknown posting id surfaces NotFound instead
        // of a silent all-zero PostingCounts.
        self.get(id).await?;

        let counts = sqlx::query_as::<_, PostingCounts>(
            r#"
            SELECT
                COUNT(*) FILTER (WHERE status = 'waiting') AS waiting,
                COUNT(*) FILTER (WHERE status = 'executing') AS executing,
                COUNT(*) FILTER (WHERE status = 'done') AS done,
                COUNT(*) FILTER (WHERE status = 'errored_out') AS errored_out,
                COUNT(*) FILTER (WHERE status = 'paused') AS paused,
                COUNT(*) FILTER (WHERE status = 'cancelled') AS cancelled
            FROM job_records
            WHERE posting_id = $1
            "#,
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(counts)
    }
}
