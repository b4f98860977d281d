use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Weak};

use chrono::{FixedOffset, NaiveDate, Utc};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use crate::config::{ConfigError, TaskSyncConfig};
use crate::connectivity::{Connectivity, ConnectivityEvent};
use crate::error::SyncError;
use crate::grouping::{TaskGroups, group_by_date_in};
use crate::reconcile::reconcile;
use crate::store::{DatabaseStore, MemoryStore, TaskStore};
use crate::task::{ChangeNotification, Task, TaskDraft, TaskId};
use crate::telemetry::{self, TelemetryEvent};

/// Owns both stores, the connectivity signal and the last known-good view of
/// the task list.
///
/// The view is only replaced by a successful [`load()`](TaskSync::load); a
/// failed reconciliation leaves it untouched. Overlapping loads are not
/// serialized. Every store write is an upsert by id, so interleaving can
/// only cause redundant writes.
pub struct TaskSync {
    local: Arc<dyn TaskStore>,
    remote: Arc<dyn TaskStore>,
    connectivity: Arc<Connectivity>,
    utc_offset: FixedOffset,
    tasks: RwLock<Vec<Task>>,
    change_tx: broadcast::Sender<ChangeNotification>,
    last_id: AtomicI64,
}

impl TaskSync {
    /// Get a handle to the change notification broadcast channel.
    pub fn change_rx(&self) -> broadcast::Receiver<ChangeNotification> {
        self.change_tx.subscribe()
    }

    pub fn connectivity(&self) -> &Arc<Connectivity> {
        &self.connectivity
    }

    pub fn local_store(&self) -> &Arc<dyn TaskStore> {
        &self.local
    }

    pub fn remote_store(&self) -> &Arc<dyn TaskStore> {
        &self.remote
    }

    pub fn utc_offset(&self) -> FixedOffset {
        self.utc_offset
    }

    /// Snapshot of the current task view.
    pub async fn tasks(&self) -> Vec<Task> {
        self.tasks.read().await.clone()
    }

    /// Current view grouped by calendar day in the configured offset.
    pub async fn grouped(&self, today: NaiveDate) -> TaskGroups {
        let tasks = self.tasks.read().await;
        group_by_date_in(&tasks, today, &self.utc_offset)
    }

    pub async fn grouped_today(&self) -> TaskGroups {
        self.grouped(self.today()).await
    }

    /// Today's date in the configured offset.
    pub fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.utc_offset).date_naive()
    }

    /// Read the local snapshot and reconcile it with the remote store if online.
    ///
    /// On success the view is replaced and a [`ChangeNotification`] is sent.
    /// On failure the error is logged and returned, and the view keeps its
    /// previous contents.
    pub async fn load(&self) -> Result<Vec<Task>, SyncError> {
        match self.reconcile_stores().await {
            Ok(tasks) => {
                if let Some(max_id) = tasks.iter().map(|t| t.id).max() {
                    self.last_id.fetch_max(max_id, Ordering::SeqCst);
                }
                *self.tasks.write().await = tasks.clone();
                let _ = self.change_tx.send(ChangeNotification {
                    task_count: tasks.len(),
                });
                Ok(tasks)
            }
            Err(e) => {
                log::error!("Failed to load tasks: {e}");
                Err(e)
            }
        }
    }

    async fn reconcile_stores(&self) -> Result<Vec<Task>, SyncError> {
        let local = self.local.get_all().await.map_err(SyncError::LocalRead)?;
        reconcile(
            local,
            self.connectivity.is_online(),
            self.remote.as_ref(),
            self.local.as_ref(),
        )
        .await
    }

    /// Create a task from `draft`, write it to every reachable store, then reload.
    ///
    /// While online the task goes to the remote store first. If that write
    /// fails the task is kept unsynced, and the next reconciliation pushes
    /// it. The local write always happens, and its failure is the only
    /// error returned.
    pub async fn add_task(&self, draft: TaskDraft) -> Result<Task, SyncError> {
        let online = self.connectivity.is_online();
        let mut task = Task::from_draft(self.next_id(), draft, online);

        if online {
            match self.remote.put(&task).await {
                Ok(()) => {
                    log::info!("Added task {} to remote store", task.id);
                    telemetry::emit(&TelemetryEvent::AddNewTask {
                        task_id: task.id,
                        task_title: task.title.clone(),
                        created_at: Utc::now(),
                    });
                }
                Err(e) => {
                    log::warn!("Failed to add task {} to remote store: {}", task.id, e);
                    task.synced = false;
                }
            }
        }

        self.local
            .put(&task)
            .await
            .map_err(|source| SyncError::Propagation {
                id: task.id,
                source,
            })?;

        // Already logged; the task itself is safely stored.
        let _ = self.load().await;
        Ok(task)
    }

    /// Allocate a creation-time id, bumped past the last one handed out so
    /// ids stay unique within a millisecond.
    fn next_id(&self) -> TaskId {
        let now = Utc::now().timestamp_millis();
        let previous = self
            .last_id
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(now.max(last + 1))
            })
            .unwrap_or_else(|last| last);
        now.max(previous + 1)
    }

    /// Spawn a background task that reconciles on every transition to online.
    ///
    /// The watcher holds only a weak reference and stops once the service is
    /// dropped or the connectivity channel closes.
    pub fn spawn_connectivity_watcher(self: &Arc<Self>) -> JoinHandle<()> {
        let this: Weak<Self> = Arc::downgrade(self);
        let mut rx = self.connectivity.subscribe();

        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(ConnectivityEvent::BecameOnline) => {
                        let Some(sync) = this.upgrade() else { break };
                        log::info!("Back online, reconciling tasks");
                        let _ = sync.load().await;
                    }
                    Ok(ConnectivityEvent::BecameOffline) => {
                        log::warn!("Offline: new tasks stay local until connectivity returns");
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        log::debug!("Connectivity watcher skipped {skipped} events");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }
}

enum StoreSource {
    Url(String),
    Store(Arc<dyn TaskStore>),
}

impl StoreSource {
    async fn open(self) -> Result<Arc<dyn TaskStore>, SyncError> {
        match self {
            StoreSource::Url(url) => Ok(Arc::new(DatabaseStore::connect(&url).await?)),
            StoreSource::Store(store) => Ok(store),
        }
    }
}

/// Builder for [`TaskSync`].
///
/// ```ignore
/// let sync = TaskSyncBuilder::new()
///     .local_url("sqlite:./tasks.db?mode=rwc")
///     .remote_store(Arc::new(MemoryStore::new()))
///     .online(false)
///     .build()
///     .await?;
/// ```
pub struct TaskSyncBuilder {
    local: Option<StoreSource>,
    remote: Option<StoreSource>,
    connectivity: Option<Arc<Connectivity>>,
    online: bool,
    utc_offset: Option<FixedOffset>,
}

impl Default for TaskSyncBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskSyncBuilder {
    pub fn new() -> Self {
        Self {
            local: None,
            remote: None,
            connectivity: None,
            online: true,
            utc_offset: None,
        }
    }

    /// Start from a [`TaskSyncConfig`]. Without a remote URL the remote side
    /// is an in-process [`MemoryStore`].
    pub fn from_config(config: &TaskSyncConfig) -> Self {
        let builder = Self::new()
            .local_url(&config.local_url)
            .online(config.start_online)
            .utc_offset(config.utc_offset);
        match &config.remote_url {
            Some(url) => builder.remote_url(url),
            None => builder.remote_store(Arc::new(MemoryStore::new())),
        }
    }

    pub fn local_url(mut self, url: &str) -> Self {
        self.local = Some(StoreSource::Url(url.to_string()));
        self
    }

    pub fn local_store(mut self, store: Arc<dyn TaskStore>) -> Self {
        self.local = Some(StoreSource::Store(store));
        self
    }

    pub fn remote_url(mut self, url: &str) -> Self {
        self.remote = Some(StoreSource::Url(url.to_string()));
        self
    }

    pub fn remote_store(mut self, store: Arc<dyn TaskStore>) -> Self {
        self.remote = Some(StoreSource::Store(store));
        self
    }

    /// Initial connectivity state. Ignored when a shared signal is supplied.
    pub fn online(mut self, online: bool) -> Self {
        self.online = online;
        self
    }

    /// Share an existing connectivity signal.
    pub fn connectivity(mut self, connectivity: Arc<Connectivity>) -> Self {
        self.connectivity = Some(connectivity);
        self
    }

    /// Offset used to derive calendar days. Defaults to the machine's offset.
    pub fn utc_offset(mut self, offset: FixedOffset) -> Self {
        self.utc_offset = Some(offset);
        self
    }

    pub async fn build(self) -> Result<TaskSync, SyncError> {
        let local = self
            .local
            .ok_or(ConfigError::MissingStore("local"))?
            .open()
            .await?;
        let remote = self
            .remote
            .ok_or(ConfigError::MissingStore("remote"))?
            .open()
            .await?;
        let connectivity = self
            .connectivity
            .unwrap_or_else(|| Arc::new(Connectivity::new(self.online)));
        let utc_offset = self
            .utc_offset
            .unwrap_or_else(|| TaskSyncConfig::default().utc_offset);

        let (change_tx, _) = broadcast::channel::<ChangeNotification>(64);

        log::debug!(
            "TaskSync ready (online: {}, offset: {})",
            connectivity.is_online(),
            utc_offset
        );

        Ok(TaskSync {
            local,
            remote,
            connectivity,
            utc_offset,
            tasks: RwLock::new(Vec::new()),
            change_tx,
            last_id: AtomicI64::new(0),
        })
    }
}
