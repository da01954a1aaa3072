//! Errors surfaced by observer sequences.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ObserverError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("timeout waiting for {0}")]
    Timeout(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("internal error: {0}")]
    Internal(String),
}

pub type ObserverResult<T> = std::result::Result<T, ObserverError>;

impl From<pdoflow_db::DbError> for ObserverError {
    fn from(err: pdoflow_db::DbError) -> Self {
        match err {
            pdoflow_db::DbError::NotFound(msg) => ObserverError::NotFound(msg),
            pdoflow_db::DbError::Database(e) => ObserverError::Database(e),
            other => ObserverError::Internal(other.to_string()),
        }
    }
}

impl From<ObserverError> for pdoflow_core::Error {
    fn from(err: ObserverError) -> Self {
        match err {
            ObserverError::NotFound(msg) => pdoflow_core::Error::NotFound(msg),
            ObserverError::Timeout(msg) => pdoflow_core::Error::Timeout(msg),
            ObserverError::Database(e) => pdoflow_core::Error::Database(e),
            ObserverError::Internal(msg) => pdoflow_core::Error::Internal(msg),
        }
    }
}
