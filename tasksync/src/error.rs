use sea_orm::DbErr;
use thiserror::Error;

use crate::config::ConfigError;
use crate::store::StoreError;
use crate::task::TaskId;

#[derive(Error, Debug)]
pub enum SyncError {
    /// The remote snapshot could not be read; nothing was merged or written.
    #[error("Failed to fetch remote tasks: {0}")]
    Fetch(#[source] StoreError),

    #[error("Failed to read local tasks: {0}")]
    LocalRead(#[source] StoreError),

    #[error("Failed to write task {id}: {source}")]
    Propagation {
        id: TaskId,
        #[source]
        source: StoreError,
    },

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Database connection failed: {0}")]
    Database(#[from] DbErr),
}
