use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use super::{StoreError, TaskStore};
use crate::task::{Task, TaskId};

/// In-process store backed by a `BTreeMap`.
///
/// Records every `put` and counts every `get_all`, and can be told to fail
/// either call. Serves as the remote store when none is configured and as a
/// double in tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tasks: Mutex<BTreeMap<TaskId, Task>>,
    put_log: Mutex<Vec<TaskId>>,
    failing_puts: Mutex<HashSet<TaskId>>,
    fail_fetches: AtomicBool,
    fail_all_puts: AtomicBool,
    fetches: AtomicUsize,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store already holding `tasks`. Seeding is not recorded in the put log.
    pub fn with_tasks(tasks: impl IntoIterator<Item = Task>) -> Self {
        let store = Self::new();
        lock(&store.tasks).extend(tasks.into_iter().map(|t| (t.id, t)));
        store
    }

    /// Make every subsequent `get_all` fail (or succeed again).
    pub fn fail_fetches(&self, fail: bool) {
        self.fail_fetches.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent `put` fail (or succeed again, except for ids
    /// registered with [`fail_puts_for`](Self::fail_puts_for)).
    pub fn fail_puts(&self, fail: bool) {
        self.fail_all_puts.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent `put` of `id` fail.
    pub fn fail_puts_for(&self, id: TaskId) {
        lock(&self.failing_puts).insert(id);
    }

    /// Ids of every successful `put`, in call order.
    pub fn put_log(&self) -> Vec<TaskId> {
        lock(&self.put_log).clone()
    }

    /// Number of `get_all` calls, failed ones included.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn get(&self, id: TaskId) -> Option<Task> {
        lock(&self.tasks).get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        lock(&self.tasks).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn get_all(&self) -> Result<Vec<Task>, StoreError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.fail_fetches.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store is failing fetches".into()));
        }
        Ok(lock(&self.tasks).values().cloned().collect())
    }

    async fn put(&self, task: &Task) -> Result<(), StoreError> {
        if self.fail_all_puts.load(Ordering::SeqCst) || lock(&self.failing_puts).contains(&task.id) {
            return Err(StoreError::Unavailable(format!(
                "memory store rejected task {}",
                task.id
            )));
        }
        lock(&self.tasks).insert(task.id, task.clone());
        lock(&self.put_log).push(task.id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn task(id: TaskId, title: &str) -> Task {
        Task {
            id,
            title: title.into(),
            date: Utc.with_ymd_and_hms(2024, 6, 10, 8, 0, 0).unwrap(),
            completed: false,
            synced: false,
        }
    }

    #[tokio::test]
    async fn test_put_upserts_by_id() {
        let store = MemoryStore::new();
        store.put(&task(1, "first")).await.unwrap();
        store.put(&task(1, "second")).await.unwrap();

        let all = store.get_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].title, "second");
        assert_eq!(store.put_log(), vec![1, 1]);
    }

    #[tokio::test]
    async fn test_seeded_tasks_not_logged() {
        let store = MemoryStore::with_tasks([task(1, "a"), task(2, "b")]);
        assert_eq!(store.len(), 2);
        assert!(store.put_log().is_empty());
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let store = MemoryStore::new();
        store.fail_fetches(true);
        store.fail_puts_for(7);

        assert!(store.get_all().await.is_err());
        assert!(store.put(&task(7, "x")).await.is_err());
        assert!(store.put(&task(8, "y")).await.is_ok());
        assert_eq!(store.fetch_count(), 1);
        assert_eq!(store.put_log(), vec![8]);

        store.fail_fetches(false);
        assert_eq!(store.get_all().await.unwrap().len(), 1);
    }
}
