//! CLI-local error type mapping onto the exit code contract: 0 success,
//! 1 generic error, 2 invalid argument, 3 not found.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::InvalidArgument(_) => 2,
            CliError::NotFound(_) => 3,
            CliError::Other(_) => 1,
        }
    }
}

impl From<pdoflow_core::Error> for CliError {
    fn from(err: pdoflow_core::Error) -> Self {
        match err {
            pdoflow_core::Error::NotFound(msg) => CliError::NotFound(msg),
            pdoflow_core::Error::InvalidInput(msg) => CliError::InvalidArgument(msg),
            other => CliError::Other(other.into()),
        }
    }
}

impl From<pdoflow_db::DbError> for CliError {
    fn from(err: pdoflow_db::DbError) -> Self {
        CliError::from(pdoflow_core::Error::from(err))
    }
}

impl From<pdoflow_dispatch::DispatchError> for CliError {
    fn from(err: pdoflow_dispatch::DispatchError) -> Self {
        CliError::from(pdoflow_core::Error::from(err))
    }
}

impl From<pdoflow_config::ConfigError> for CliError {
    fn from(err: pdoflow_config::ConfigError) -> Self {
        CliError::Other(err.into())
    }
}

pub type CliResult<T> = std::result::Result<T, CliError>;
