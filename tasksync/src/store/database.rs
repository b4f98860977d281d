//! SeaORM-backed task store.
//!
//! Tasks live in a single `tasks` table, created on connect if it does not
//! exist. Dates are stored as RFC 3339 text so the table stays readable from
//! any SQLite client.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, DbErr,
    ExecResult, FromQueryResult, Statement,
};

use super::{StoreError, TaskStore};
use crate::task::Task;

pub struct DatabaseStore {
    db: DatabaseConnection,
}

impl DatabaseStore {
    /// Connect to `url` and make sure the `tasks` table exists.
    ///
    /// In-memory SQLite URLs are pinned to one pooled connection, since every
    /// connection would otherwise open its own empty database.
    pub async fn connect(url: &str) -> Result<Self, DbErr> {
        let mut opts = ConnectOptions::new(url);
        if url.contains(":memory:") {
            opts.max_connections(1).min_connections(1);
        }
        let db = Database::connect(opts).await?;
        Self::new(db).await
    }

    /// Wrap an existing connection, creating the `tasks` table if needed.
    pub async fn new(db: DatabaseConnection) -> Result<Self, DbErr> {
        create_task_table(&db).await?;
        Ok(Self { db })
    }

    /// Get a reference to the underlying SeaORM connection.
    pub fn inner(&self) -> &DatabaseConnection {
        &self.db
    }
}

/// Create the `tasks` table if it does not already exist.
pub async fn create_task_table(db: &impl ConnectionTrait) -> Result<ExecResult, DbErr> {
    db.execute_unprepared(
        "CREATE TABLE IF NOT EXISTS tasks (
            id INTEGER PRIMARY KEY,
            title TEXT NOT NULL,
            date TEXT NOT NULL,
            completed BOOLEAN NOT NULL,
            synced BOOLEAN NOT NULL DEFAULT 0
        )",
    )
    .await
}

#[derive(Debug, FromQueryResult)]
struct TaskRow {
    id: i64,
    title: String,
    date: String,
    completed: bool,
    synced: bool,
}

impl TaskRow {
    fn into_task(self) -> Result<Task, StoreError> {
        let date = DateTime::parse_from_rfc3339(&self.date)
            .map_err(|e| StoreError::Corrupt {
                id: self.id,
                reason: format!("unparseable date '{}': {e}", self.date),
            })?
            .with_timezone(&Utc);

        Ok(Task {
            id: self.id,
            title: self.title,
            date,
            completed: self.completed,
            synced: self.synced,
        })
    }
}

#[async_trait]
impl TaskStore for DatabaseStore {
    async fn get_all(&self) -> Result<Vec<Task>, StoreError> {
        let rows = TaskRow::find_by_statement(Statement::from_string(
            DatabaseBackend::Sqlite,
            "SELECT id, title, date, completed, synced FROM tasks ORDER BY id ASC",
        ))
        .all(&self.db)
        .await?;

        rows.into_iter().map(TaskRow::into_task).collect()
    }

    async fn put(&self, task: &Task) -> Result<(), StoreError> {
        self.db
            .execute_raw(Statement::from_sql_and_values(
                DatabaseBackend::Sqlite,
                "INSERT OR REPLACE INTO tasks (id, title, date, completed, synced)
                 VALUES (?, ?, ?, ?, ?)",
                [
                    task.id.into(),
                    task.title.clone().into(),
                    task.date.to_rfc3339().into(),
                    task.completed.into(),
                    task.synced.into(),
                ],
            ))
            .await?;
        Ok(())
    }
}
