//! Behaviour of occurrences of a recurring note, exercised through the
//! public API only.

use chrono::{NaiveDate, NaiveDateTime};
use pimcal_core::item::{DISPLAY_NAME, UID, VERSION};
use pimcal_core::resolver::{NoteScope, resolve_get, resolve_set};
use pimcal_core::stamp::{EVENT_STAMP, EventFields, EventFieldsMut, LOCATION};
use pimcal_core::{
    DateRange, Frequency, Modification, Note, NoteRead, NoteWrite, PimConfig, PimError, PropertyMap,
    PropertyValue, RecurrenceId, RecurrenceRule, Session,
};

fn at(day: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, day)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap()
}

fn rid(day: u32) -> RecurrenceId {
    RecurrenceId::new(at(day))
}

/// "Standup", weekly from Monday 2024-03-04 09:00.
fn standup() -> Note {
    let session = Session::new(PimConfig::default());
    let mut initial = PropertyMap::new();
    initial.insert(DISPLAY_NAME.into(), "Standup".into());
    initial.insert(VERSION.into(), PropertyValue::Integer(1));

    let mut note = session.new_note(&initial);
    let event = note.get_stamp(EVENT_STAMP, true, None).unwrap().unwrap();
    event.set_start_date(at(4)).unwrap();
    event.set_location(Some("Room 1")).unwrap();
    event
        .set_rrule(Some(RecurrenceRule::supported(Frequency::Weekly, None)))
        .unwrap();
    note
}

#[test]
fn test_noop_write_stays_overlay_free() {
    let mut note = standup();

    let mut occurrence = note.note_occurrence_mut(rid(11));
    occurrence.set_display_name("Standup").unwrap();
    occurrence
        .stamp_mut(EVENT_STAMP, false)
        .unwrap()
        .set_location(Some("Room 1"))
        .unwrap();
    occurrence.set_body(PropertyValue::Null).unwrap();

    assert_eq!(note.modifications().count(), 0);
}

#[test]
fn test_first_divergence_allocates_exactly_one_override() {
    let mut note = standup();

    note.note_occurrence_mut(rid(11))
        .set_display_name("Planning")
        .unwrap();

    assert_eq!(note.modifications().count(), 1);
    let modification = note.get_modification(&rid(11)).unwrap();
    assert_eq!(modification.recurrence_id(), rid(11));
    assert_eq!(modification.modified_properties().len(), 1);
    assert!(modification.modified_stamps().is_empty());
}

#[test]
fn test_uid_and_version_are_never_overridden() {
    let mut note = standup();

    // A modification that (wrongly) carries uid and version overrides.
    let mut modification = Modification::new(rid(11));
    modification.set_modified_property(UID, "forged".into());
    modification.set_modified_property(VERSION, PropertyValue::Integer(99));
    modification.set_modified_property(DISPLAY_NAME, "Planning".into());
    note.add_modification(modification).unwrap();

    let occurrence = note.note_occurrence(rid(11));
    assert_eq!(occurrence.uid(), note.uid());
    assert_eq!(occurrence.version(), Some(1));
    assert_eq!(occurrence.display_name().as_deref(), Some("Planning"));

    for property in [UID, VERSION] {
        let err = resolve_set(&mut note, rid(18), &NoteScope, property, PropertyValue::Null).unwrap_err();
        assert!(matches!(err, PimError::InvalidOperation(_)), "{property}");

        let err = note
            .note_occurrence_mut(rid(11))
            .set_property(property, "anything".into())
            .unwrap_err();
        assert!(matches!(err, PimError::InvalidOperation(_)), "{property}");
    }
    assert!(note.get_modification(&rid(18)).is_none());
}

#[test]
fn test_repeated_override_write_is_idempotent() {
    let mut note = standup();
    let mut occurrence = note.note_occurrence_mut(rid(11));

    occurrence.set_display_name("Planning").unwrap();
    occurrence.set_display_name("Planning").unwrap();

    let modification = note.get_modification(&rid(11)).unwrap();
    assert_eq!(modification.override_count(), 1);
}

#[test]
fn test_unsupported_rules_round_trip_verbatim() {
    let payloads = [
        "FREQ=WEEKLY;BYDAY=MO,WE",
        "FREQ=MONTHLY;BYMONTHDAY=-1",
        "FREQ=DAILY;COUNT=5",
        "FREQ=SECONDLY",
        "FREQ=MINUTELY;INTERVAL=30",
        "FREQ=YEARLY;INTERVAL=4",
        "FREQ=weekly;interval=3;x-name=keep",
    ];

    for payload in payloads {
        let mut note = standup();
        note.stamp_mut(EVENT_STAMP)
            .unwrap()
            .set_rrule(Some(RecurrenceRule::classify(payload)))
            .unwrap();

        let rule = note.recurrence_rule().unwrap();
        assert!(!rule.is_supported(), "{payload}");
        assert_eq!(rule.unsupported_rule(), Some(payload));

        let json = serde_json::to_string(&rule).unwrap();
        let back: RecurrenceRule = serde_json::from_str(&json).unwrap();
        assert_eq!(back.to_ical(), payload);
    }
}

#[test]
fn test_supported_rules_never_come_back_unsupported() {
    for frequency in [
        Frequency::Daily,
        Frequency::Weekly,
        Frequency::Biweekly,
        Frequency::Monthly,
        Frequency::Yearly,
    ] {
        let rule = RecurrenceRule::supported(frequency, None);
        assert!(RecurrenceRule::classify(&rule.to_ical()).is_supported());
    }
}

#[test]
fn test_standup_scenario() {
    let mut note = standup();
    let moved = RecurrenceId::parse("2024-03-04T09:00").unwrap();

    note.note_occurrence_mut(moved)
        .set_display_name("Standup (moved)")
        .unwrap();

    let modification = note.get_modification(&moved).expect("modification created");
    assert_eq!(modification.recurrence_id().key(), "2024-03-04 09:00:00");
    assert_eq!(modification.modified_properties().len(), 1);
    assert_eq!(
        modification
            .modified_property(DISPLAY_NAME)
            .and_then(|v| v.as_text()),
        Some("Standup (moved)")
    );

    let next_week = RecurrenceId::parse("2024-03-11T09:00").unwrap();
    assert_eq!(
        note.note_occurrence(next_week).display_name().as_deref(),
        Some("Standup")
    );
    assert_eq!(
        resolve_get(&note, next_week, &NoteScope, DISPLAY_NAME).as_text(),
        Some("Standup")
    );
    assert_eq!(note.display_name().as_deref(), Some("Standup"));
}

#[test]
fn test_expanded_occurrences_resolve_independently() {
    let mut note = standup();
    note.note_occurrence_mut(rid(18))
        .stamp_mut(EVENT_STAMP, false)
        .unwrap()
        .set_location(Some("Room 2"))
        .unwrap();

    let range = DateRange {
        from: Some(at(1).and_utc()),
        to: Some(at(31).and_utc()),
    };
    let locations: Vec<(NaiveDateTime, String)> = note
        .occurrences(&range, 10)
        .unwrap()
        .iter()
        .map(|occurrence| {
            let event = occurrence.stamp(EVENT_STAMP).unwrap();
            (event.start_date().unwrap(), event.location().unwrap())
        })
        .collect();

    assert_eq!(
        locations,
        vec![
            (at(4), "Room 1".to_string()),
            (at(11), "Room 1".to_string()),
            (at(18), "Room 2".to_string()),
            (at(25), "Room 1".to_string()),
        ]
    );
}
