//! Task Store and Event Store interfaces and their Google implementations.
//!
//! The engine only ever talks to the two traits here; the Google clients are
//! thin blocking HTTP adapters. A failed remote call is mapped to a
//! [`StoreError`] naming the operation and is never retried.

pub mod google_calendar;
pub mod google_tasks;

pub use google_calendar::GoogleCalendarClient;
pub use google_tasks::GoogleTasksClient;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::scheduling::EventDraft;

/// A task list ("project") as the Task Store reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskList {
    pub id: String,
    pub title: String,
}

/// A task as the Task Store reports it, before normalization.
/// Unknown wire fields are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawTask {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Due timestamp as the store sent it; parsed during normalization.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Payload for inserting a new task (used by the move capability).
#[derive(Debug, Clone, Serialize)]
pub struct TaskDraft {
    pub title: String,
    pub notes: Option<String>,
    pub due: Option<DateTime<Utc>>,
}

/// A calendar event as the Event Store reports it after creation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EventRecord {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(rename = "htmlLink", skip_serializing_if = "Option::is_none")]
    pub html_link: Option<String>,
}

/// Map a non-success response to `StoreError::Api`, pulling the message out
/// of the Google error JSON body when present.
pub(crate) fn check_status(
    operation: &'static str,
    resp: reqwest::blocking::Response,
) -> Result<reqwest::blocking::Response, StoreError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| {
            v.get("error")?
                .get("message")?
                .as_str()
                .map(String::from)
        })
        .unwrap_or(body);
    Err(StoreError::Api {
        operation,
        status: status.as_u16(),
        message,
    })
}

pub(crate) fn decode_json<T: serde::de::DeserializeOwned>(
    operation: &'static str,
    resp: reqwest::blocking::Response,
) -> Result<T, StoreError> {
    resp.json().map_err(|e| StoreError::Decode {
        operation,
        detail: e.to_string(),
    })
}

/// External service holding task lists and tasks.
pub trait TaskStore {
    /// List all task lists (projects).
    fn list_tasklists(&self) -> Result<Vec<TaskList>, StoreError>;

    /// List open (non-completed, non-hidden) tasks within a list.
    fn list_open_tasks(&self, list_id: &str) -> Result<Vec<RawTask>, StoreError>;

    /// Mark a task completed.
    fn complete_task(&self, list_id: &str, task_id: &str) -> Result<(), StoreError>;

    /// Patch a task's due date.
    fn set_due(
        &self,
        list_id: &str,
        task_id: &str,
        due: DateTime<Utc>,
    ) -> Result<RawTask, StoreError>;

    /// Insert a new task into a list.
    fn insert_task(&self, list_id: &str, draft: &TaskDraft) -> Result<RawTask, StoreError>;

    /// Delete a task.
    fn delete_task(&self, list_id: &str, task_id: &str) -> Result<(), StoreError>;
}

/// External calendar service accepting event creation requests.
pub trait EventStore {
    /// Insert one calendar event. Each call creates one new event; callers
    /// must not call twice for the same intent.
    fn insert_event(&self, draft: &EventDraft) -> Result<EventRecord, StoreError>;
}
