//! RRULE expansion of recurring notes.
//!
//! Expands a master note's event stamp into the recurrence ids of its
//! occurrences within a date range, respecting EXDATEs.

use chrono::{NaiveDateTime, TimeDelta, Utc};
use rrule::RRuleSet;
use tracing::debug;

use crate::date_range::DateRange;
use crate::error::{PimError, PimResult};
use crate::item::NoteRead;
use crate::note::Note;
use crate::recurrence_id::RecurrenceId;
use crate::stamp::{EVENT_STAMP, EventFields};

use super::RecurrenceRule;

/// Build an iCalendar-format rule set string for the rrule crate parser.
/// Floating times are handed over as UTC and read back the same way.
fn build_rrule_string(start: NaiveDateTime, rule: &RecurrenceRule, exdates: &[NaiveDateTime]) -> String {
    let mut lines = Vec::with_capacity(exdates.len() + 2);

    lines.push(format!("DTSTART:{}Z", start.format("%Y%m%dT%H%M%S")));
    lines.push(format!("RRULE:{}", rule.rrule_body()));

    for exdate in exdates {
        lines.push(format!("EXDATE:{}Z", exdate.format("%Y%m%dT%H%M%S")));
    }

    lines.join("\n")
}

/// Expand a recurring master into the ids of its occurrences within `range`
/// (inclusive at both ends), returning at most `limit` of them.
///
/// Masters without an event stamp, a start date or a rule have no
/// occurrences. Unsupported rules are expanded from their preserved payload.
pub fn expand_occurrences(master: &Note, range: &DateRange, limit: u16) -> PimResult<Vec<RecurrenceId>> {
    let Some(event) = master.stamp(EVENT_STAMP) else {
        return Ok(Vec::new());
    };
    let (Some(start), Some(rule)) = (event.start_date(), event.rrule()) else {
        return Ok(Vec::new());
    };

    let rrule_str = build_rrule_string(start, &rule, &event.exdates());

    let mut rrule_set: RRuleSet = rrule_str.parse().map_err(|e| {
        PimError::Recurrence(format!(
            "Failed to parse RRULE for note '{}': {}",
            master.uid(),
            e
        ))
    })?;

    // after/before are exclusive; widen by a second to make the range inclusive.
    let tz: rrule::Tz = Utc.into();
    if let Some(from) = range.from {
        rrule_set = rrule_set.after((from - TimeDelta::seconds(1)).with_timezone(&tz));
    }
    if let Some(to) = range.to {
        rrule_set = rrule_set.before((to + TimeDelta::seconds(1)).with_timezone(&tz));
    }

    let result = rrule_set.all(limit);
    if result.limited {
        debug!(uid = %master.uid(), limit, "occurrence expansion hit its limit");
    }

    Ok(result
        .dates
        .iter()
        .map(|dt| RecurrenceId::new(dt.naive_utc()))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recurrence::Frequency;
    use crate::stamp::EventFieldsMut;
    use chrono::{NaiveDate, TimeZone};

    fn at(d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn range(from_day: u32, to_day: u32) -> DateRange {
        DateRange {
            from: Some(Utc.with_ymd_and_hms(2024, 3, from_day, 0, 0, 0).unwrap()),
            to: Some(Utc.with_ymd_and_hms(2024, 3, to_day, 23, 59, 59).unwrap()),
        }
    }

    fn recurring(rule: RecurrenceRule) -> Note {
        let mut note = Note::new(Default::default(), &Default::default());
        let event = note.get_stamp(EVENT_STAMP, true, None).unwrap().unwrap();
        event.set_start_date(at(4, 9)).unwrap();
        event.set_rrule(Some(rule)).unwrap();
        note
    }

    #[test]
    fn test_build_rrule_string() {
        let rule = RecurrenceRule::supported(Frequency::Weekly, None);
        let s = build_rrule_string(at(4, 9), &rule, &[at(11, 9)]);

        assert_eq!(
            s,
            "DTSTART:20240304T090000Z\nRRULE:FREQ=WEEKLY\nEXDATE:20240311T090000Z"
        );
    }

    #[test]
    fn test_expand_weekly() {
        let note = recurring(RecurrenceRule::supported(Frequency::Weekly, None));
        let ids = expand_occurrences(&note, &range(1, 31), 365).unwrap();

        let expected: Vec<RecurrenceId> = [4, 11, 18, 25]
            .into_iter()
            .map(|d| RecurrenceId::new(at(d, 9)))
            .collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn test_expand_respects_exdates_and_until() {
        let until = Utc.with_ymd_and_hms(2024, 3, 20, 0, 0, 0).unwrap();
        let mut note = recurring(RecurrenceRule::supported(Frequency::Weekly, Some(until)));
        note.get_stamp(EVENT_STAMP, false, None)
            .unwrap()
            .unwrap()
            .set_exdates(vec![at(11, 9)])
            .unwrap();

        let ids = expand_occurrences(&note, &range(1, 31), 365).unwrap();

        assert_eq!(
            ids,
            vec![RecurrenceId::new(at(4, 9)), RecurrenceId::new(at(18, 9))]
        );
    }

    #[test]
    fn test_expand_unsupported_rule_from_payload() {
        let note = recurring(RecurrenceRule::classify("FREQ=DAILY;COUNT=3"));
        let ids = expand_occurrences(&note, &range(1, 31), 365).unwrap();

        assert_eq!(ids.len(), 3);
        assert_eq!(ids[2], RecurrenceId::new(at(6, 9)));
    }

    #[test]
    fn test_expand_honours_limit() {
        let note = recurring(RecurrenceRule::supported(Frequency::Daily, None));
        let ids = expand_occurrences(&note, &range(1, 31), 5).unwrap();
        assert_eq!(ids.len(), 5);
    }

    #[test]
    fn test_non_recurring_note_has_no_occurrences() {
        let note = Note::new(Default::default(), &Default::default());
        assert!(expand_occurrences(&note, &range(1, 31), 365).unwrap().is_empty());
    }
}
