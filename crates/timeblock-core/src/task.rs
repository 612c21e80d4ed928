//! Canonical task model and normalization.
//!
//! The normalizer maps raw Task Store records into [`Task`] snapshots:
//! duration is inferred from the text, the due timestamp is parsed into a
//! timezone-aware instant, and the routine/overdue flags are derived. One
//! malformed task never aborts the batch; malformed fields degrade to `None`
//! with a warning.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use chrono_tz::Tz;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::{debug, warn};

use crate::clock;
use crate::markers;
use crate::stores::{RawTask, TaskList};

static TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"#([A-Za-z0-9][A-Za-z0-9_-]*)").expect("valid tag regex"));

/// A normalized task: a read-mostly snapshot rebuilt on every load.
#[derive(Debug, Clone, Serialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub notes: Option<String>,
    /// Title of the owning task list.
    pub project: String,
    /// Id of the owning task list; needed for later mutation calls.
    pub tasklist: String,
    /// Inferred minutes; `None` means unknown.
    pub duration_min: Option<u32>,
    pub due: Option<DateTime<Utc>>,
    pub is_routine: bool,
    pub is_overdue: bool,
}

impl Task {
    /// Hash-prefixed tags scanned from title and notes, case-folded.
    pub fn tags(&self) -> BTreeSet<String> {
        let mut tags = extract_tags(&self.title);
        if let Some(notes) = &self.notes {
            tags.extend(extract_tags(notes));
        }
        tags
    }

    /// The due calendar date as seen from the given timezone.
    pub fn due_date(&self, tz: Tz) -> Option<NaiveDate> {
        self.due.map(|due| clock::local_date(due, tz))
    }
}

fn extract_tags(text: &str) -> BTreeSet<String> {
    TAG_RE
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_lowercase())
        .collect()
}

/// Maps raw Task Store records into canonical [`Task`]s.
#[derive(Debug, Clone)]
pub struct TaskNormalizer {
    timezone: Tz,
    routines_list: String,
}

impl TaskNormalizer {
    pub fn new(timezone: Tz, routines_list: impl Into<String>) -> Self {
        Self {
            timezone,
            routines_list: routines_list.into(),
        }
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Normalize one raw task. Returns `None` for tasks that must be dropped
    /// (missing id, missing owning list, or already completed).
    pub fn normalize(&self, raw: &RawTask, list: &TaskList, today: NaiveDate) -> Option<Task> {
        if raw.id.is_empty() || list.id.is_empty() {
            debug!(title = %raw.title, "dropping task without id or tasklist");
            return None;
        }
        if raw.status.as_deref() == Some("completed") {
            return None;
        }

        let duration_min = markers::infer_duration(&raw.title, raw.notes.as_deref(), None);
        let due = raw
            .due
            .as_deref()
            .and_then(|text| self.parse_due(&raw.id, text));
        let is_routine = list.title.eq_ignore_ascii_case(&self.routines_list);
        let is_overdue = due
            .map(|due| clock::local_date(due, self.timezone) < today)
            .unwrap_or(false);

        Some(Task {
            id: raw.id.clone(),
            title: raw.title.clone(),
            notes: raw.notes.clone(),
            project: list.title.clone(),
            tasklist: list.id.clone(),
            duration_min,
            due,
            is_routine,
            is_overdue,
        })
    }

    /// Normalize every page of `(list, tasks)` and sort the result: overdue
    /// first, then routine, then title (case-insensitive). The sort is stable
    /// and other components rely on it for deterministic output.
    pub fn normalize_all(
        &self,
        pages: &[(TaskList, Vec<RawTask>)],
        today: NaiveDate,
    ) -> Vec<Task> {
        let mut tasks: Vec<Task> = pages
            .iter()
            .flat_map(|(list, raws)| {
                raws.iter()
                    .filter_map(|raw| self.normalize(raw, list, today))
            })
            .collect();
        tasks.sort_by_key(|t| (!t.is_overdue, !t.is_routine, t.title.to_lowercase()));
        tasks
    }

    /// Parse a due string from the store. Accepts RFC 3339; a naive
    /// `YYYY-MM-DDTHH:MM:SS` is interpreted in the reference timezone and a
    /// bare `YYYY-MM-DD` is midnight in that zone. Anything else is `None`.
    fn parse_due(&self, task_id: &str, text: &str) -> Option<DateTime<Utc>> {
        if let Ok(instant) = DateTime::parse_from_rfc3339(text) {
            return Some(instant.with_timezone(&Utc));
        }
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S") {
            return Some(clock::attach_zone(naive, self.timezone));
        }
        if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
            return Some(clock::attach_zone(date.and_time(NaiveTime::MIN), self.timezone));
        }
        warn!(task_id, due = text, "unparseable due timestamp, treating as no due date");
        None
    }
}
