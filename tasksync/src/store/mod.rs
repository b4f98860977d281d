//! Task stores.
//!
//! Both sides of a reconciliation are plain [`TaskStore`]s: an async
//! collection that can list every record and upsert one record by id. The
//! local on-device store is normally a [`DatabaseStore`]; the remote store is
//! whatever the surrounding application talks to.

mod database;
mod memory;

use async_trait::async_trait;
use sea_orm::DbErr;
use thiserror::Error;

use crate::task::{Task, TaskId};

pub use database::DatabaseStore;
pub use memory::MemoryStore;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Stored task {id} is corrupt: {reason}")]
    Corrupt { id: TaskId, reason: String },
}

/// An async key-value collection of tasks keyed by [`Task::id`].
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Return every task in the store, in no particular order.
    async fn get_all(&self) -> Result<Vec<Task>, StoreError>;

    /// Insert the task, replacing any existing record with the same id.
    async fn put(&self, task: &Task) -> Result<(), StoreError>;
}
