//! Database error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("duplicate: {0}")]
    Duplicate(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

pub type DbResult<T> = std::result::Result<T, DbError>;

impl From<DbError> for pdoflow_core::Error {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound(msg) => pdoflow_core::Error::NotFound(msg),
            DbError::Duplicate(msg) => pdoflow_core::Error::InvalidInput(msg),
            DbError::Database(e) => pdoflow_core::Error::Database(e),
            DbError::Migration(e) => pdoflow_core::Error::Internal(e.to_string()),
        }
    }
}
