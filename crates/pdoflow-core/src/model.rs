//! The data model: Posting, JobRecord, and the profile tables.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{ResourceId, Status};

/// A named batch of work.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Posting {
    pub id: ResourceId,
    pub poster: String,
    pub target_function: String,
    pub entry_point: String,
    pub status: Status,
    pub created_on: DateTime<Utc>,
}

/// A single work unit belonging to a `Posting`.
///
/// Invariant: `tries_remaining >= 0`; once it reaches 0 and execution has
/// failed, `status` becomes `errored_out` and never changes again.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct JobRecord {
    pub id: ResourceId,
    pub posting_id: ResourceId,
    pub priority: i32,
    pub positional_arguments: serde_json::Value,
    pub keyword_arguments: serde_json::Value,
    pub tries_remaining: i32,
    pub status: Status,
    pub created_on: DateTime<Utc>,
    pub updated_on: DateTime<Utc>,
}

impl JobRecord {
    pub const DEFAULT_TRIES: i32 = 3;
    pub const DEFAULT_PRIORITY: i32 = 0;
}

/// A profile captured for exactly one `JobRecord` (1:1, only when sampled).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct JobProfile {
    pub id: ResourceId,
    pub job_record_id: ResourceId,
    pub total_calls: i64,
    pub total_time: f64,
    pub created_on: DateTime<Utc>,
}

/// A unique `(file, name, lineno)` tuple, deduplicated and shared across
/// profiles by content address.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Function {
    pub id: ResourceId,
    pub file: String,
    pub name: String,
    pub lineno: i32,
}

/// Per-function aggregate timing within one `JobProfile`.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct FunctionStat {
    pub job_profile_id: ResourceId,
    pub function_id: ResourceId,
    pub primitive_calls: i64,
    pub total_calls: i64,
    pub total_time: f64,
    pub cumulative_time: f64,
}

/// A caller -> callee edge observed within one `JobProfile`.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct FunctionCallMap {
    pub job_profile_id: ResourceId,
    pub caller_function_id: ResourceId,
    pub callee_function_id: ResourceId,
    pub calls: i64,
    pub time: f64,
}
