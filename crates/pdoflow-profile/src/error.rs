//! Errors for profile capture and reduction.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("profiler error: {0}")]
    Capture(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type ProfileResult<T> = std::result::Result<T, ProfileError>;

impl From<pdoflow_db::DbError> for ProfileError {
    fn from(err: pdoflow_db::DbError) -> Self {
        match err {
            pdoflow_db::DbError::Database(e) => ProfileError::Database(e),
            other => ProfileError::Capture(other.to_string()),
        }
    }
}
