//! Errors for the dispatch protocol.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type DispatchResult<T> = std::result::Result<T, DispatchError>;

impl From<DispatchError> for pdoflow_core::Error {
    fn from(err: DispatchError) -> Self {
        match err {
            DispatchError::NotFound(msg) => pdoflow_core::Error::NotFound(msg),
            DispatchError::Database(e) => pdoflow_core::Error::Database(e),
        }
    }
}
