//! Local/remote reconciliation.
//!
//! A reconciliation merges the local snapshot with the remote snapshot by
//! task id, then propagates what is missing in both directions: unsynced
//! records are pushed to the remote store, and the whole merged set is
//! written back to the local store.
//!
//! Local records always win over remote records with the same id. A task
//! created offline must survive a stale or partial remote read.

use std::collections::BTreeMap;

use futures::future::join_all;

use crate::error::SyncError;
use crate::store::TaskStore;
use crate::task::{Task, TaskId};
use crate::telemetry::{self, TelemetryEvent};

/// Determine whether a remote record should enter the merge.
///
/// Returns `true` only if no local record with the same id is present.
pub fn should_insert_remote(local: Option<&Task>) -> bool {
    local.is_none()
}

/// Merge two snapshots by id, local first.
///
/// Records keep their own `synced` flag; a remote copy stored with
/// `synced = false` is pushed again like any other unsynced record.
pub fn merge(local: Vec<Task>, remote: Vec<Task>) -> BTreeMap<TaskId, Task> {
    let mut merged: BTreeMap<TaskId, Task> = local.into_iter().map(|t| (t.id, t)).collect();
    for task in remote {
        if should_insert_remote(merged.get(&task.id)) {
            merged.insert(task.id, task);
        }
    }
    merged
}

/// Reconcile `local` with the remote store.
///
/// When `remote_available` is `false` the local snapshot is returned as-is
/// and neither store is touched. Otherwise the remote snapshot is fetched and
/// merged, and every merged record is propagated. Propagation is best-effort
/// per record: a failed `put` is logged and the remaining records carry on.
///
/// Returns the merged tasks ordered by id. A failed remote fetch aborts before
/// any write and is returned as [`SyncError::Fetch`].
pub async fn reconcile<R, L>(
    local: Vec<Task>,
    remote_available: bool,
    remote: &R,
    local_store: &L,
) -> Result<Vec<Task>, SyncError>
where
    R: TaskStore + ?Sized,
    L: TaskStore + ?Sized,
{
    if !remote_available {
        log::debug!("Offline, keeping {} local tasks", local.len());
        return Ok(local);
    }

    let remote_tasks = remote.get_all().await.map_err(SyncError::Fetch)?;
    log::debug!(
        "Merging {} local tasks with {} remote tasks",
        local.len(),
        remote_tasks.len()
    );

    let merged = merge(local, remote_tasks);
    let results = join_all(
        merged
            .into_values()
            .map(|task| propagate(task, remote, local_store)),
    )
    .await;

    let pushed = results.iter().filter(|(_, pushed)| *pushed).count();
    let tasks: Vec<Task> = results.into_iter().map(|(task, _)| task).collect();

    log::info!(
        "Reconciled {} tasks ({} pushed to remote)",
        tasks.len(),
        pushed
    );
    telemetry::emit(&TelemetryEvent::TasksReconciled {
        merged: tasks.len(),
        pushed,
    });

    Ok(tasks)
}

/// Push `task` to the remote store if unsynced, then write it locally.
/// Returns the task with its final sync flag and whether a push happened.
async fn propagate<R, L>(mut task: Task, remote: &R, local_store: &L) -> (Task, bool)
where
    R: TaskStore + ?Sized,
    L: TaskStore + ?Sized,
{
    let mut pushed = false;
    if !task.synced {
        match remote.put(&task).await {
            Ok(()) => {
                task.synced = true;
                pushed = true;
            }
            Err(e) => log::warn!("Failed to push task {} to remote store: {}", task.id, e),
        }
    }

    if let Err(e) = local_store.put(&task).await {
        log::error!("Failed to write task {} to local store: {}", task.id, e);
    }

    (task, pushed)
}
