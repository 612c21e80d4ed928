//! Pure planning for calendar placement and snoozing.
//!
//! These functions compute the event window and the snooze target; the
//! remote side effects live in [`crate::session::Session`].

use chrono::{DateTime, Days, Duration, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;
use serde::Serialize;

use crate::clock;
use crate::markers::DEFAULT_DURATION_MIN;
use crate::task::Task;

/// A calendar event ready to submit to the Event Store.
#[derive(Debug, Clone, Serialize)]
pub struct EventDraft {
    pub summary: String,
    pub description: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// IANA timezone the event is rendered in on the wire.
    pub timezone: Tz,
    /// Ask the store not to send attendee notifications.
    pub suppress_notifications: bool,
}

/// Compute the event window and descriptor for one task.
///
/// `start` defaults to `now` rounded up to the next slot; a caller-supplied
/// start is taken as-is (naive user input is interpreted in the reference
/// timezone before it gets here). The window always has a concrete length:
/// the task's inferred minutes, or `fallback_min` when unknown.
pub fn plan_event(
    task: &Task,
    start: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    tz: Tz,
    fallback_min: u32,
) -> EventDraft {
    let start = start.unwrap_or_else(|| clock::round_up_to_slot(Some(now)));
    let minutes = task.duration_min.unwrap_or(if fallback_min > 0 {
        fallback_min
    } else {
        DEFAULT_DURATION_MIN
    });
    let end = start + Duration::minutes(i64::from(minutes));

    let project = if task.project.trim().is_empty() {
        "Inbox"
    } else {
        task.project.as_str()
    };

    EventDraft {
        summary: task.title.clone(),
        description: format!("From timeblock list: {project}"),
        start,
        end,
        timezone: tz,
        suppress_notifications: true,
    }
}

/// The new due instant after snoozing `days` forward from `now`: midnight in
/// the reference timezone, `days` after today in that zone. The original due
/// time-of-day is discarded. `days >= 1` is the caller's contract.
pub fn snoozed_due(now: DateTime<Utc>, days: u32, tz: Tz) -> DateTime<Utc> {
    let today = clock::today_in(tz, now);
    let target = today
        .checked_add_days(Days::new(u64::from(days)))
        .unwrap_or(today);
    clock::attach_zone(target.and_time(NaiveTime::MIN), tz)
}

/// Days to snooze so the task lands on `target`; never less than one.
pub fn snooze_days_until(target: NaiveDate, today: NaiveDate) -> u32 {
    let days = (target - today).num_days();
    u32::try_from(days).unwrap_or(0).max(1)
}
