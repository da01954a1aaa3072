//! Profile repository: JobProfile, Function, FunctionStat, FunctionCallMap.

use async_trait::async_trait;
use pdoflow_core::{FunctionCallMap, FunctionStat, JobProfile, ResourceId};
use sqlx::{PgPool, Postgres, Transaction};

use crate::DbResult;

/// A single function's aggregate stats within a profile, keyed by the
/// `(file, name, lineno)` tuple the function will be upserted under.
#[derive(Debug)]
pub struct StatRow {
    pub file: String,
    pub name: String,
    pub lineno: i32,
    pub primitive_calls: i64,
    pub total_calls: i64,
    pub total_time: f64,
    pub cumulative_time: f64,
}

/// A caller -> callee edge, referencing the same `(file, name, lineno)` keys.
#[derive(Debug)]
pub struct CallEdgeRow {
    pub caller: (String, String, i32),
    pub callee: (String, String, i32),
    pub calls: i64,
    pub time: f64,
}

/// A fully reduced profile, ready to persist in one transaction.
#[derive(Debug)]
pub struct ReducedProfile {
    pub job_record_id: ResourceId,
    pub total_calls: i64,
    pub total_time: f64,
    pub stats: Vec<StatRow>,
    pub edges: Vec<CallEdgeRow>,
}

#[async_trait]
pub trait ProfileRepo: Send + Sync {
    /// Persist a reduced profile. Must be called within the same
    /// transaction as the unit's outcome write; takes an explicit
    /// `&mut Transaction` rather than owning the pool for that reason.
    async fn persist<'t>(
        &self,
        tx: &mut Transaction<'t, Postgres>,
        profile: ReducedProfile,
    ) -> DbResult<JobProfile>;

    async fn get_by_job_record(&self, job_record_id: ResourceId) -> DbResult<Option<JobProfile>>;
    async fn get_stats(&self, job_profile_id: ResourceId) -> DbResult<Vec<FunctionStat>>;
    async fn get_call_map(&self, job_profile_id: ResourceId) -> DbResult<Vec<FunctionCallMap>>;
}

/// PostgreSQL implementation of `ProfileRepo`.
pub struct PgProfileRepo {
    pool: PgPool,
}

impl PgProfileRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Upsert a `Function` row by its content-addressed `(file, name, lineno)`
    /// key, returning its id either way.
    async fn upsert_function<'t>(
        tx: &mut Transaction<'t, Postgres>,
        file: &str,
        name: &str,
        lineno: i32,
    ) -> DbResult<ResourceId> {
        let row: (ResourceId,) = sqlx::query_as(
            r#"
            INSERT INTO functions (id, file, name, lineno)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (file, name, lineno) DO UPDATE SET file = EXCLUDED.file
            RETURNING id
            "#,
        )
        .bind(ResourceId::new())
        .bind(file)
        .bind(name)
        .bind(lineno)
        .fetch_one(&mut **tx)
        .await?;
        Ok(row.0)
    }
}

#[async_trait]
impl ProfileRepo for PgProfileRepo {
    async fn persist<'t>(
        &self,
        tx: &mut Transaction<'t, Postgres>,
        profile: ReducedProfile,
    ) -> DbResult<JobProfile> {
        let job_profile = sqlx::query_as::<_, JobProfile>(
            r#"
            INSERT INTO job_profiles (id, job_record_id, total_calls, total_time, created_on)
            VALUES ($1, $2, $3, $4, NOW())
            RETURNING *
            "#,
        )
        .bind(ResourceId::new())
        .bind(profile.job_record_id)
        .bind(profile.total_calls)
        .bind(profile.total_time)
        .fetch_one(&mut **tx)
        .await?;

        // Dedup-upsert every function touched by this profile's stats and
        // edges, building a lookup from the (file, name, lineno) key to the
        // id Functions got assigned (existing or new).
        let mut function_ids = std::collections::HashMap::new();
        for stat in &profile.stats {
            let key = (stat.file.clone(), stat.name.clone(), stat.lineno);
            if !function_ids.contains_key(&key) {
                let id = Self::upsert_function(tx, &stat.file, &stat.name, stat.lineno).await?;
                function_ids.insert(key, id);
            }
        }
        for edge in &profile.edges {
            for key in [&edge.caller, &edge.callee] {
                if !function_ids.contains_key(key) {
                    let id = Self::upsert_function(tx, &key.0, &key.1, key.2).await?;
                    function_ids.insert(key.clone(), id);
                }
            }
        }

        for stat in &profile.stats {
            let key = (stat.file.clone(), stat.name.clone(), stat.lineno);
            let function_id = function_ids[&key];
            sqlx::query(
                r#"
                INSERT INTO function_stats
                    (job_profile_id, function_id, primitive_calls, total_calls, total_time, cumulative_time)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(job_profile.id)
            .bind(function_id)
            .bind(stat.primitive_calls)
            .bind(stat.total_calls)
            .bind(stat.total_time)
            .bind(stat.cumulative_time)
            .execute(&mut **tx)
            .await?;
        }

        for edge in &profile.edges {
            let caller_id = function_ids[&edge.caller];
            let callee_id = function_ids[&edge.callee];
            sqlx::query(
                r#"
                INSERT INTO function_call_maps
                    (job_profile_id, caller_function_id, callee_function_id, calls, time)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(job_profile.id)
            .bind(caller_id)
            .bind(callee_id)
            .bind(edge.calls)
            .bind(edge.time)
            .execute(&mut **tx)
            .await?;
        }

        Ok(job_profile)
    }

    async fn get_by_job_record(&self, job_record_id: ResourceId) -> DbResult<Option<JobProfile>> {
        let profile =
            sqlx::query_as::<_, JobProfile>("SELECT * FROM job_profiles WHERE job_record_id = $1")
                .bind(job_record_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(profile)
    }

    async fn get_stats(&self, job_profile_id: ResourceId) -> DbResult<Vec<FunctionStat>> {
        let stats = sqlx::query_as::<_, FunctionStat>(
            "SELECT * FROM function_stats WHERE job_profile_id = $1",
        )
        .bind(job_profile_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(stats)
    }

    async fn get_call_map(&self, job_profile_id: ResourceId) -> DbResult<Vec<FunctionCallMap>> {
        let edges = sqlx::query_as::<_, FunctionCallMap>(
            "SELECT * FROM function_call_maps WHERE job_profile_id = $1",
        )
        .bind(job_profile_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(edges)
    }
}
