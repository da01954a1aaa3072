//! Database layer for PDOFlow.
//!
//! Provides the repository traits and PostgreSQL implementations for the
//! data model in `pdoflow_core::model`, plus pool construction and
//! migrations.

pub mod error;
pub mod repo;

pub use error::{DbError, DbResult};
pub use repo::*;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

/// Create a new database connection pool.
///
/// Workers must pass `max_connections = 1`: the worker runtime's one
/// connection per process invariant is easiest to enforce by simply
/// never handing out a second one.
pub async fn create_pool(database_url: &str, max_connections: u32) -> DbResult<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;
    Ok(pool)
}

/// Run database migrations.
pub async fn run_migrations(pool: &PgPool) -> DbResult<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}
