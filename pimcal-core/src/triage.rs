//! Automatic triage from event timing.

use chrono::{NaiveDateTime, TimeDelta};

use crate::error::PimResult;
use crate::item::{NoteWrite, TriageStatus};
use crate::stamp::{ALL_DAY, ANY_TIME, DURATION, EVENT_STAMP, START_DATE};

/// The status an event should have at `now`: later before it starts, now while
/// it runs, done once it has ended. All-day and any-time events span a day.
pub fn triage_status_at(
    start: NaiveDateTime,
    end: NaiveDateTime,
    now: NaiveDateTime,
) -> TriageStatus {
    if now < start {
        TriageStatus::Later
    } else if now <= end {
        TriageStatus::Now
    } else {
        TriageStatus::Done
    }
}

/// Re-triage `note` if it opted in to automatic triage and has a timed event
/// stamp. Works on masters and occurrences alike; on an occurrence a changed
/// status becomes an override. Returns whether the status changed.
pub fn auto_triage<N: NoteWrite + ?Sized>(note: &mut N, now: NaiveDateTime) -> PimResult<bool> {
    if !note.auto_triage() || !note.has_stamp(EVENT_STAMP) {
        return Ok(false);
    }

    let event = |property| note.stamp_value(EVENT_STAMP, property).unwrap_or_default();
    let Some(start) = event(START_DATE).as_datetime() else {
        return Ok(false);
    };

    let spans_day = event(ALL_DAY).as_bool().unwrap_or(false) || event(ANY_TIME).as_bool().unwrap_or(false);
    let end = if spans_day {
        start + TimeDelta::days(1)
    } else {
        event(DURATION)
            .as_duration()
            .and_then(|d| d.add_to(start))
            .unwrap_or(start)
    };

    let status = triage_status_at(start, end, now);
    if note.triage_status() == Some(status) {
        return Ok(false);
    }

    note.set_triage_status(status)?;
    Ok(true)
}
