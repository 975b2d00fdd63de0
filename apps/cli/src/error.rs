//! CLI error type. Every library error is printed as-is.

use thiserror::Error;

use liftlog_db::DbError;
use liftlog_sync::SyncError;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error(transparent)]
    Db(#[from] DbError),

    #[error("No database path configured and no platform data directory found")]
    NoDatabasePath,

    #[error("Could not create data directory: {0}")]
    DataDir(#[from] std::io::Error),
}
