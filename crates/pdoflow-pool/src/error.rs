//! Errors for the pool supervisor.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PoolError {
    #[error("failed to spawn worker: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("timeout: {0}")]
    Timeout(String),
}

pub type PoolResult<T> = std::result::Result<T, PoolError>;

impl From<pdoflow_observer::ObserverError> for PoolError {
    fn from(err: pdoflow_observer::ObserverError) -> Self {
        match err {
            pdoflow_observer::ObserverError::Timeout(msg) => PoolError::Timeout(msg),
            other => PoolError::Timeout(other.to_string()),
        }
    }
}
