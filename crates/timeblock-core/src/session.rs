//! Explicit session state.
//!
//! Everything that used to be ambient (credentials, the loaded task set,
//! normalizer settings) lives on a [`Session`] constructed at start and
//! dropped at exit. A task leaves the in-memory working set only after the
//! remote mutation fully succeeds; it is never re-synced in place.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tracing::{debug, info};

use crate::auth::CredentialProvider;
use crate::clock;
use crate::error::{CoreError, CredentialError, MoveError, Result, ScheduleError};
use crate::scheduling;
use crate::stores::{EventRecord, EventStore, RawTask, TaskDraft, TaskList, TaskStore};
use crate::task::{Task, TaskNormalizer};
use crate::triage::{self, TriageFilter};

/// How to schedule one task.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScheduleOptions {
    /// Mark the task completed after the event is created.
    pub mark_complete: bool,
    /// Explicit start instant; `None` schedules now, rounded up to the next
    /// slot.
    pub start: Option<DateTime<Utc>>,
}

/// Result of a successful schedule action.
#[derive(Debug, Clone)]
pub struct ScheduleOutcome {
    pub event: EventRecord,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub completed: bool,
}

/// One interactive decision session over a Task Store and an Event Store.
pub struct Session<TS, ES> {
    auth: Arc<dyn CredentialProvider>,
    task_store: TS,
    event_store: ES,
    normalizer: TaskNormalizer,
    timezone: Tz,
    default_duration_min: u32,
    working: Vec<Task>,
    loaded: bool,
}

impl<TS: TaskStore, ES: EventStore> Session<TS, ES> {
    pub fn new(
        auth: Arc<dyn CredentialProvider>,
        task_store: TS,
        event_store: ES,
        timezone: Tz,
        routines_list: impl Into<String>,
        default_duration_min: u32,
    ) -> Self {
        Self {
            auth,
            task_store,
            event_store,
            normalizer: TaskNormalizer::new(timezone, routines_list),
            timezone,
            default_duration_min,
            working: Vec::new(),
            loaded: false,
        }
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Check that a credential is available. Idempotent; never starts an
    /// interactive flow on its own.
    pub fn connect(&self) -> Result<(), CredentialError> {
        self.auth.credential(false).map(|_| ())
    }

    /// Force fresh credential acquisition.
    pub fn reconnect(&self) -> Result<(), CredentialError> {
        self.auth.credential(true).map(|_| ())
    }

    /// The task lists (projects) as the store reports them.
    pub fn tasklists(&self) -> Result<Vec<TaskList>> {
        Ok(self.task_store.list_tasklists()?)
    }

    /// Fetch a fresh snapshot of every open task across all lists.
    /// Returns the number of tasks loaded. Safe to call repeatedly; each
    /// call replaces the working set.
    pub fn load(&mut self) -> Result<usize> {
        let lists = self.task_store.list_tasklists()?;
        let mut pages = Vec::with_capacity(lists.len());
        for list in lists {
            let raws = self.task_store.list_open_tasks(&list.id)?;
            pages.push((list, raws));
        }
        let today = clock::today_in(self.timezone, Utc::now());
        self.working = self.normalizer.normalize_all(&pages, today);
        self.loaded = true;
        debug!(count = self.working.len(), "task snapshot loaded");
        Ok(self.working.len())
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// The current working set, in the normalizer's stable order.
    pub fn tasks(&self) -> &[Task] {
        &self.working
    }

    /// Filter the working set. The surviving order is the load order.
    pub fn select(&self, filter: &TriageFilter) -> Vec<&Task> {
        let today = clock::today_in(self.timezone, Utc::now());
        triage::select(&self.working, filter, today, self.timezone)
    }

    /// Find a task by exact id, or by a unique id prefix.
    pub fn find(&self, id: &str) -> Option<&Task> {
        if let Some(task) = self.working.iter().find(|t| t.id == id) {
            return Some(task);
        }
        let mut matches = self.working.iter().filter(|t| t.id.starts_with(id));
        match (matches.next(), matches.next()) {
            (Some(task), None) => Some(task),
            _ => None,
        }
    }

    /// Schedule one task into a calendar slot.
    ///
    /// The event is created first; if `mark_complete` then fails, the
    /// partial failure is surfaced as
    /// [`ScheduleError::CompletionAfterEvent`] carrying the created event.
    /// No compensating deletion is attempted. The task is removed from the
    /// working set only on full success.
    pub fn schedule(&mut self, task_id: &str, options: ScheduleOptions) -> Result<ScheduleOutcome> {
        let task = self
            .find(task_id)
            .cloned()
            .ok_or_else(|| CoreError::UnknownTask(task_id.to_string()))?;

        let draft = scheduling::plan_event(
            &task,
            options.start,
            Utc::now(),
            self.timezone,
            self.default_duration_min,
        );
        let event = self
            .event_store
            .insert_event(&draft)
            .map_err(ScheduleError::Event)?;
        info!(task = %task.id, event = %event.id, start = %draft.start, "calendar event created");

        if options.mark_complete {
            self.task_store
                .complete_task(&task.tasklist, &task.id)
                .map_err(|source| ScheduleError::CompletionAfterEvent {
                    event: event.clone(),
                    source,
                })?;
            info!(task = %task.id, "task marked completed");
        }

        self.remove_from_working_set(&task.id);
        Ok(ScheduleOutcome {
            event,
            start: draft.start,
            end: draft.end,
            completed: options.mark_complete,
        })
    }

    /// Defer a task `days` forward. The new due date is midnight in the
    /// reference timezone; the original time-of-day is discarded.
    pub fn snooze(&mut self, task_id: &str, days: u32) -> Result<DateTime<Utc>> {
        let task = self
            .find(task_id)
            .cloned()
            .ok_or_else(|| CoreError::UnknownTask(task_id.to_string()))?;

        let due = scheduling::snoozed_due(Utc::now(), days, self.timezone);
        self.task_store.set_due(&task.tasklist, &task.id, due)?;
        info!(task = %task.id, due = %due, "task snoozed");

        self.remove_from_working_set(&task.id);
        Ok(due)
    }

    /// Move a task to another list: insert a copy, then delete the original.
    /// A delete failure after a successful insert is surfaced as
    /// [`MoveError::DeleteAfterInsert`] carrying the created copy; the
    /// source task stays in the working set.
    pub fn move_task(&mut self, task_id: &str, dest_list_id: &str) -> Result<RawTask> {
        let task = self
            .find(task_id)
            .cloned()
            .ok_or_else(|| CoreError::UnknownTask(task_id.to_string()))?;

        let draft = TaskDraft {
            title: task.title.clone(),
            notes: task.notes.clone(),
            due: task.due,
        };
        let copy = self
            .task_store
            .insert_task(dest_list_id, &draft)
            .map_err(MoveError::Insert)?;
        self.task_store
            .delete_task(&task.tasklist, &task.id)
            .map_err(|source| MoveError::DeleteAfterInsert {
                copy: copy.clone(),
                source,
            })?;
        info!(task = %task.id, dest = dest_list_id, "task moved");

        self.remove_from_working_set(&task.id);
        Ok(copy)
    }

    /// Delete a task remotely, then drop it from the working set.
    pub fn delete(&mut self, task_id: &str) -> Result<()> {
        let task = self
            .find(task_id)
            .cloned()
            .ok_or_else(|| CoreError::UnknownTask(task_id.to_string()))?;

        self.task_store.delete_task(&task.tasklist, &task.id)?;
        info!(task = %task.id, "task deleted");

        self.remove_from_working_set(&task.id);
        Ok(())
    }

    /// Clear credentials and the working set.
    pub fn sign_out(&mut self) -> Result<(), CredentialError> {
        self.auth.clear()?;
        self.working.clear();
        self.loaded = false;
        Ok(())
    }

    fn remove_from_working_set(&mut self, task_id: &str) {
        self.working.retain(|t| t.id != task_id);
    }
}
