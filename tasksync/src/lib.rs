//! # TaskSync
//!
//! Offline-first personal task list.
//!
//! Tasks are written to a local store while offline and to both stores while
//! online. Whenever the app loads or connectivity returns, the local and
//! remote snapshots are reconciled by task id. Local records win, unsynced
//! records are pushed, and the merged set is written back locally. The
//! result is bucketed by calendar day for display, with earlier days folded
//! into a single "past" bucket.
//!
//! ## Quick start
//!
//! ```ignore
//! use std::sync::Arc;
//! use tasksync::{TaskDraft, TaskSyncBuilder};
//!
//! let sync = Arc::new(
//!     TaskSyncBuilder::new()
//!         .local_url("sqlite:./tasks.db?mode=rwc")
//!         .remote_url("sqlite:./remote.db?mode=rwc")
//!         .build()
//!         .await?,
//! );
//! sync.spawn_connectivity_watcher();
//! sync.load().await?;
//!
//! let draft = TaskDraft::parse_local("Dentist", "2024-06-10T15:30", sync.utc_offset(), false)?;
//! sync.add_task(draft).await?;
//!
//! for (day, tasks) in sync.grouped_today().await.days() {
//!     println!("{day}: {} tasks", tasks.len());
//! }
//! ```
//!
//! ## Key types
//!
//! - [`reconcile()`] merges two snapshots and propagates the differences
//! - [`group_by_date()`] buckets tasks by day
//! - [`TaskStore`] is the async collection interface both stores implement
//! - [`TaskSync`] / [`TaskSyncBuilder`] wire stores, connectivity and the task view together
//! - [`Connectivity`] is the online/offline signal

pub mod config;
pub mod connectivity;
pub mod error;
pub mod grouping;
pub mod reconcile;
pub mod service;
pub mod store;
pub mod task;
pub mod telemetry;

pub use config::{ConfigError, TaskSyncConfig};
pub use connectivity::{Connectivity, ConnectivityEvent};
pub use error::SyncError;
pub use grouping::{DateKey, TaskGroups, group_by_date, group_by_date_in};
pub use reconcile::reconcile;
pub use service::{TaskSync, TaskSyncBuilder};
pub use store::{DatabaseStore, MemoryStore, StoreError, TaskStore};
pub use task::{ChangeNotification, Task, TaskDraft, TaskId, ValidationError};

// Re-export for callers that hand in their own connections
pub use sea_orm;
