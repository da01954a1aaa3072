//! JobRecord repository.
//!
//! CRUD only — the dispatch protocol's claim/completion transactions
//! live in `pdoflow-dispatch`, which composes its own SQL directly
//! against the pool rather than through this trait, since the claim's
//! `FOR UPDATE SKIP LOCKED` + cross-table `Posting` bump doesn't fit a
//! single-table CRUD shape.

use async_trait::async_trait;
use pdoflow_core::{JobRecord, ResourceId, Status};
use serde_json::Value;
use sqlx::PgPool;

use crate::{DbError, DbResult};

/// One unit to materialize for a freshly created posting.
pub struct NewJobRecord {
    pub priority: i32,
    pub positional_arguments: Value,
    pub keyword_arguments: Value,
    pub tries_remaining: i32,
}

impl NewJobRecord {
    pub fn new(positional_arguments: Value, keyword_arguments: Value) -> Self {
        Self {
            priority: JobRecord::DEFAULT_PRIORITY,
            positional_arguments,
            keyword_arguments,
            tries_remaining: JobRecord::DEFAULT_TRIES,
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_tries(mut self, tries: i32) -> Self {
        self.tries_remaining = tries;
        self
    }
}

#[async_trait]
pub trait JobRecordRepo: Send + Sync {
    /// Materialize a batch of job records for a posting, all starting in
    /// `waiting`. Returns them in insertion order.
    async fn create_batch(
        &self,
        posting_id: ResourceId,
        units: Vec<NewJobRecord>,
    ) -> DbResult<Vec<JobRecord>>;

    async fn get(&self, id: ResourceId) -> DbResult<JobRecord>;
    async fn list_by_posting(&self, posting_id: ResourceId) -> DbResult<Vec<JobRecord>>;
    async fn count_by_status(&self, posting_id: ResourceId, status: Status) -> DbResult<i64>;

    /// Waiting-unit counts grouped by priority, highest priority first.
    /// Backs the `priority-stats` CLI command's view into the shape of the
    /// claimable queue.
    async fn priority_stats(&self) -> DbResult<Vec<PriorityStat>>;
}

/// Count of `waiting` job records sharing one priority value.
#[derive(Debug, Clone, Copy, sqlx::FromRow)]
pub struct PriorityStat {
    pub priority: i32,
    pub waiting: i64,
}

/// PostgreSQL implementation of `JobRecordRepo`.
pub struct PgJobRecordRepo {
    pool: PgPool,
}

impl PgJobRecordRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobRecordRepo for PgJobRecordRepo {
    async fn create_batch(
        &self,
        posting_id: ResourceId,
        units: Vec<NewJobRecord>,
    ) -> DbResult<Vec<JobRecord>> {
        let mut tx = self.pool.begin().await?;
        let mut created = Vec::with_capacity(units.len());

        for unit in units {
            let record = sqlx::query_as::<_, JobRecord>(
                r#"
                INSERT INTO job_records
                    (id, posting_id, priority, positional_arguments, keyword_arguments,
                     tries_remaining, status, created_on, updated_on)
                VALUES ($1, $2, $3, $4, $5, $6, 'waiting', NOW(), NOW())
                RETURNING *
                "#,
            )
            .bind(ResourceId::new())
            .bind(posting_id)
            .bind(unit.priority)
            .bind(unit.positional_arguments)
            .bind(unit.keyword_arguments)
            .bind(unit.tries_remaining)
            .fetch_one(&mut *tx)
            .await?;
            created.push(record);
        }

        tx.commit().await?;
        Ok(created)
    }

    async fn get(&self, id: ResourceId) -> DbResult<JobRecord> {
        sqlx::query_as::<_, JobRecord>("SELECT * FROM job_records WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("job record {id}")))
    }

    async fn list_by_posting(&self, posting_id: ResourceId) -> DbResult<Vec<JobRecord>> {
        let records = sqlx::query_as::<_, JobRecord>(
            "SELECT * FROM job_records WHERE posting_id = $1 ORDER BY priority DESC, created_on ASC, id",
        )
        .bind(posting_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }

    async fn count_by_status(&self, posting_id: ResourceId, status: Status) -> DbResult<i64> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM job_records WHERE posting_id = $1 AND status = $2",
        )
        .bind(posting_id)
        .bind(status)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn priority_stats(&self) -> DbResult<Vec<PriorityStat>> {
        let stats = sqlx::query_as::<_, PriorityStat>(
            r#"
            SELECT priority, COUNT(*) AS waiting
            FROM job_records
            WHERE status = 'waiting'
            GROUP BY priority
            ORDER BY priority DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(stats)
    }
}
