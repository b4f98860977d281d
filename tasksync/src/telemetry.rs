//! Optional process-wide telemetry.
//!
//! A sink is installed at most once. Until then every [`emit`] is a no-op,
//! so library code can report events without knowing whether anyone listens.

use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::task::TaskId;

static SINK: OnceLock<Box<dyn TelemetrySink>> = OnceLock::new();

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TelemetryEvent {
    /// A new task reached the remote store.
    AddNewTask {
        task_id: TaskId,
        task_title: String,
        created_at: DateTime<Utc>,
    },
    /// A reconciliation finished.
    TasksReconciled { merged: usize, pushed: usize },
}

pub trait TelemetrySink: Send + Sync {
    fn record(&self, event: &TelemetryEvent);
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum TelemetryError {
    #[error("A telemetry sink is already installed")]
    AlreadyInstalled,
}

/// Sink that writes each event as a JSON line through `log`.
#[derive(Debug, Default)]
pub struct LogSink;

impl TelemetrySink for LogSink {
    fn record(&self, event: &TelemetryEvent) {
        match serde_json::to_string(event) {
            Ok(json) => log::info!(target: "tasksync::telemetry", "{json}"),
            Err(e) => log::warn!("Failed to serialize telemetry event: {e}"),
        }
    }
}

/// Install the process-wide sink.
pub fn install(sink: impl TelemetrySink + 'static) -> Result<(), TelemetryError> {
    SINK.set(Box::new(sink))
        .map_err(|_| TelemetryError::AlreadyInstalled)
}

pub fn is_installed() -> bool {
    SINK.get().is_some()
}

/// Hand `event` to the installed sink, if any.
pub fn emit(event: &TelemetryEvent) {
    if let Some(sink) = SINK.get() {
        sink.record(event);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    #[derive(Clone, Default)]
    struct Recorder(Arc<Mutex<Vec<TelemetryEvent>>>);

    impl TelemetrySink for Recorder {
        fn record(&self, event: &TelemetryEvent) {
            self.0.lock().unwrap().push(event.clone());
        }
    }

    // The sink is process-wide, so installation is exercised in one test.
    #[test]
    fn test_install_once_and_emit() {
        let recorder = Recorder::default();
        let event = TelemetryEvent::AddNewTask {
            task_id: 424_242,
            task_title: "telemetry probe".into(),
            created_at: Utc::now(),
        };

        install(recorder.clone()).unwrap();
        assert!(is_installed());
        assert_eq!(install(LogSink), Err(TelemetryError::AlreadyInstalled));

        emit(&event);
        assert!(recorder.0.lock().unwrap().contains(&event));
    }

    #[test]
    fn test_event_json_shape() {
        let json = serde_json::to_value(TelemetryEvent::TasksReconciled {
            merged: 3,
            pushed: 1,
        })
        .unwrap();
        assert_eq!(
            json,
            serde_json::json!({"event": "tasks_reconciled", "merged": 3, "pushed": 1})
        );
    }
}
