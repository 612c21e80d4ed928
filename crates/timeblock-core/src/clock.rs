//! Time rounding and reference-timezone helpers.
//!
//! Calendar placement works on 5-minute boundaries; everything date-shaped
//! (due-today, overdue, snooze targets) is computed in the configured
//! reference timezone, never in the machine's local zone.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;

/// Width of a scheduling slot in minutes.
pub const SLOT_MINUTES: u32 = 5;

/// Round an instant up to the next slot boundary.
///
/// Defaults to now (UTC) when no instant is given. Sub-minute precision is
/// discarded first; an instant already on a boundary is returned unchanged.
/// The result is never earlier than the input and never more than one slot
/// after it.
pub fn round_up_to_slot(instant: Option<DateTime<Utc>>) -> DateTime<Utc> {
    let moment = instant.unwrap_or_else(Utc::now);

    let mut rounded = moment
        - Duration::nanoseconds(i64::from(moment.nanosecond()))
        - Duration::seconds(i64::from(moment.second()));
    let remainder = rounded.minute() % SLOT_MINUTES;
    if remainder != 0 {
        rounded += Duration::minutes(i64::from(SLOT_MINUTES - remainder));
    }
    if rounded < moment {
        rounded += Duration::minutes(i64::from(SLOT_MINUTES));
    }
    rounded
}

/// Today's calendar date as seen from the reference timezone.
pub fn today_in(tz: Tz, now: DateTime<Utc>) -> NaiveDate {
    now.with_timezone(&tz).date_naive()
}

/// The calendar date of an instant in the reference timezone.
pub fn local_date(instant: DateTime<Utc>, tz: Tz) -> NaiveDate {
    instant.with_timezone(&tz).date_naive()
}

/// Interpret a naive timestamp in the reference timezone.
///
/// An ambiguous local time (clocks rolled back) resolves to the earlier
/// instant; a skipped local time (clocks rolled forward) resolves to the
/// first instant after the gap.
pub fn attach_zone(naive: NaiveDateTime, tz: Tz) -> DateTime<Utc> {
    match tz.from_local_datetime(&naive).earliest() {
        Some(instant) => instant.with_timezone(&Utc),
        None => {
            let shifted = naive + Duration::hours(1);
            tz.from_local_datetime(&shifted)
                .earliest()
                .map(|instant| instant.with_timezone(&Utc))
                .unwrap_or_else(|| Utc.from_utc_datetime(&naive))
        }
    }
}
