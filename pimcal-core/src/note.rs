//! The master note: properties, stamps and the sparse map of modifications.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{NaiveDateTime, TimeDelta, Utc};
use tracing::debug;

use crate::date_range::DateRange;
use crate::error::{PimError, PimResult};
use crate::item::{self, ITEM_SCHEMA, NOTE_SCHEMA, NoteRead, NoteWrite};
use crate::modification::Modification;
use crate::occurrence::OccurrenceView;
use crate::property::PropertyStore;
use crate::recurrence::{RecurrenceRule, expand_occurrences};
use crate::recurrence_id::RecurrenceId;
use crate::stamp::{EVENT_STAMP, EventFields, EventFieldsMut, Stamp, StampRead, StampRegistry};
use crate::value::{PropertyMap, PropertyValue};

/// A master note.
///
/// Owns its stamps and the modifications of its occurrences, keyed by
/// recurrence id. Occurrences themselves are never stored; see
/// [`Note::note_occurrence`].
#[derive(Debug, Clone)]
pub struct Note {
    registry: Arc<StampRegistry>,
    properties: PropertyStore,
    stamps: BTreeMap<String, Stamp>,
    modifications: BTreeMap<RecurrenceId, Modification>,
    deleted_stamps: Vec<String>,
}

impl Note {
    /// Create a note bound to `registry`, filling undeclared properties with
    /// their defaults.
    pub fn new(registry: Arc<StampRegistry>, initial: &PropertyMap) -> Self {
        Note {
            registry,
            properties: PropertyStore::with_schema(&[ITEM_SCHEMA, NOTE_SCHEMA], initial),
            stamps: BTreeMap::new(),
            modifications: BTreeMap::new(),
            deleted_stamps: Vec::new(),
        }
    }

    pub fn registry(&self) -> &Arc<StampRegistry> {
        &self.registry
    }

    /// Raw stored value, without any resolution.
    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }

    pub fn set(&mut self, name: &str, value: PropertyValue) {
        self.properties.set(name, value);
    }

    pub fn properties(&self) -> &PropertyStore {
        &self.properties
    }

    pub fn stamp(&self, name: &str) -> Option<&Stamp> {
        self.stamps.get(name)
    }

    pub fn stamp_mut(&mut self, name: &str) -> Option<&mut Stamp> {
        self.stamps.get_mut(name)
    }

    /// Return the named stamp, creating and attaching it first when `create`
    /// is set. Creating a stamp the registry does not know is an error.
    pub fn get_stamp(
        &mut self,
        name: &str,
        create: bool,
        initial: Option<&PropertyMap>,
    ) -> PimResult<Option<&mut Stamp>> {
        if self.stamps.contains_key(name) {
            return Ok(self.stamps.get_mut(name));
        }
        if !create {
            return Ok(None);
        }

        let descriptor = self
            .registry
            .get(name)
            .ok_or_else(|| PimError::UnknownStamp(name.to_string()))?;
        let empty = PropertyMap::new();
        let stamp = descriptor.instantiate(initial.unwrap_or(&empty));

        self.deleted_stamps.retain(|deleted| deleted != name);
        Ok(Some(self.stamps.entry(name.to_string()).or_insert(stamp)))
    }

    pub fn stamps(&self) -> impl Iterator<Item = &Stamp> {
        self.stamps.values()
    }

    /// Names of stamps removed from this note since it was loaded, for sync.
    pub fn deleted_stamps(&self) -> &[String] {
        &self.deleted_stamps
    }

    pub fn get_modification(&self, recurrence_id: &RecurrenceId) -> Option<&Modification> {
        self.modifications.get(recurrence_id)
    }

    pub fn modifications(&self) -> impl Iterator<Item = &Modification> {
        self.modifications.values()
    }

    pub(crate) fn modification_mut(&mut self, recurrence_id: &RecurrenceId) -> Option<&mut Modification> {
        self.modifications.get_mut(recurrence_id)
    }

    pub(crate) fn insert_modification(&mut self, modification: Modification) {
        self.modifications
            .insert(modification.recurrence_id(), modification);
    }

    pub(crate) fn drop_modification(&mut self, recurrence_id: &RecurrenceId) -> Option<Modification> {
        self.modifications.remove(recurrence_id)
    }

    /// View of one occurrence of this note.
    pub fn note_occurrence(&self, recurrence_id: RecurrenceId) -> OccurrenceView<&Note> {
        OccurrenceView::new(self, recurrence_id)
    }

    /// Editable view of one occurrence of this note.
    pub fn note_occurrence_mut(&mut self, recurrence_id: RecurrenceId) -> OccurrenceView<&mut Note> {
        OccurrenceView::new(self, recurrence_id)
    }

    pub fn recurrence_rule(&self) -> Option<RecurrenceRule> {
        self.stamp(EVENT_STAMP)?.rrule()
    }

    pub fn has_recurrence(&self) -> bool {
        self.recurrence_rule().is_some()
    }

    /// Start of the series: the event stamp's start date.
    pub fn series_start(&self) -> Option<NaiveDateTime> {
        self.stamp(EVENT_STAMP)?.start_date()
    }

    /// A series cannot end before it begins; the rule would have UNTIL
    /// earlier than DTSTART and never expand again.
    fn require_after_start(&self, operation: &str, recurrence_id: RecurrenceId) -> PimResult<()> {
        match self.series_start() {
            Some(start) if recurrence_id.datetime() <= start => Err(PimError::InvalidOperation(format!(
                "{operation}: {recurrence_id} is not after the series start {start}"
            ))),
            _ => Ok(()),
        }
    }

    /// Occurrences within `range`, at most `limit` of them.
    pub fn occurrences(&self, range: &DateRange, limit: u16) -> PimResult<Vec<OccurrenceView<&Note>>> {
        let ids = expand_occurrences(self, range, limit)?;
        Ok(ids.into_iter().map(|id| self.note_occurrence(id)).collect())
    }

    fn require_rule(&self, operation: &str) -> PimResult<RecurrenceRule> {
        self.recurrence_rule().ok_or_else(|| {
            PimError::InvalidOperation(format!("{operation}: note '{}' does not recur", self.uid()))
        })
    }

    /// Delete one occurrence: exclude it from the series and drop its
    /// modification.
    pub fn remove_occurrence(&mut self, recurrence_id: RecurrenceId) -> PimResult<()> {
        self.require_rule("removeOccurrence")?;

        if let Some(event) = self.stamps.get_mut(EVENT_STAMP) {
            let mut exdates = event.exdates();
            if !exdates.contains(&recurrence_id.datetime()) {
                exdates.push(recurrence_id.datetime());
                exdates.sort();
            }
            event.set_exdates(exdates)?;
        }

        if self.modifications.remove(&recurrence_id).is_some() {
            debug!(%recurrence_id, "removed modification of deleted occurrence");
        }
        Ok(())
    }

    /// End the series just before `recurrence_id`, dropping the modifications
    /// of every occurrence at or after it. Returns how many were dropped.
    pub fn end_series_before(&mut self, recurrence_id: RecurrenceId) -> PimResult<usize> {
        let rule = self.require_rule("endSeriesBefore")?;
        self.require_after_start("endSeriesBefore", recurrence_id)?;
        let end = recurrence_id.datetime().and_utc() - TimeDelta::seconds(1);
        let ended = rule.with_end_date(Some(end))?;

        if let Some(event) = self.stamps.get_mut(EVENT_STAMP) {
            event.set_rrule(Some(ended))?;
        }

        let dropped = self.modifications.split_off(&recurrence_id);
        debug!(
            %recurrence_id,
            dropped = dropped.len(),
            "ended series"
        );
        Ok(dropped.len())
    }

    /// Split the series at `recurrence_id` ("this and all future").
    ///
    /// Returns a new master with a fresh uid that starts at `recurrence_id`
    /// and carries the modifications from there on; this note's series ends
    /// just before it.
    pub fn split_at(&mut self, recurrence_id: RecurrenceId) -> PimResult<Note> {
        let rule = self.require_rule("splitAt")?;
        if !rule.is_supported() {
            return Err(PimError::InvalidOperation(format!(
                "splitAt: cannot split unsupported rule '{}'",
                rule.to_ical()
            )));
        }
        self.require_after_start("splitAt", recurrence_id)?;

        let mut future = self.clone();
        future.set(item::UID, item::generate_uid());
        future.set(item::CREATION_DATE, Utc::now().into());
        future.set(item::MODIFIED_DATE, Utc::now().into());
        future.deleted_stamps.clear();
        future.modifications = self.modifications.split_off(&recurrence_id);

        if let Some(event) = future.stamps.get_mut(EVENT_STAMP) {
            event.set_start_date(recurrence_id.datetime())?;
            let exdates = event
                .exdates()
                .into_iter()
                .filter(|d| *d >= recurrence_id.datetime())
                .collect();
            event.set_exdates(exdates)?;
        }

        self.end_series_before(recurrence_id)?;
        debug!(%recurrence_id, new_uid = %future.uid(), "split series");
        Ok(future)
    }
}

impl NoteRead for Note {
    fn master(&self) -> &Note {
        self
    }

    fn recurrence_id(&self) -> Option<RecurrenceId> {
        None
    }

    fn property(&self, name: &str) -> PropertyValue {
        self.get(name).cloned().unwrap_or_default()
    }

    fn has_stamp(&self, stamp: &str) -> bool {
        self.stamps.contains_key(stamp)
    }

    fn stamp_value(&self, stamp: &str, property: &str) -> Option<PropertyValue> {
        self.stamp(stamp).map(|s| s.value(property))
    }

    fn modification(&self, recurrence_id: &RecurrenceId) -> PimResult<Option<&Modification>> {
        Ok(self.get_modification(recurrence_id))
    }

    fn occurrence(&self, recurrence_id: RecurrenceId) -> PimResult<OccurrenceView<&Note>> {
        Ok(self.note_occurrence(recurrence_id))
    }

    fn try_clone(&self) -> PimResult<Note> {
        Ok(self.clone())
    }
}

impl NoteWrite for Note {
    fn set_property(&mut self, name: &str, value: PropertyValue) -> PimResult<()> {
        self.set(name, value);
        Ok(())
    }

    fn set_stamp_value(&mut self, stamp: &str, property: &str, value: PropertyValue) -> PimResult<()> {
        if let Some(stamp) = self.get_stamp(stamp, true, None)? {
            stamp.set(property, value);
        }
        Ok(())
    }

    /// Attach a modification, replacing any existing one for the same
    /// occurrence. An empty modification removes the existing one instead.
    fn add_modification(&mut self, modification: Modification) -> PimResult<()> {
        let recurrence_id = modification.recurrence_id();
        if modification.is_empty() {
            self.modifications.remove(&recurrence_id);
        } else {
            self.modifications.insert(recurrence_id, modification);
        }
        Ok(())
    }

    fn remove_modification(&mut self, recurrence_id: &RecurrenceId) -> PimResult<Option<Modification>> {
        let removed = self.modifications.remove(recurrence_id);
        if removed.is_some() {
            debug!(%recurrence_id, "removed modification");
        }
        Ok(removed)
    }

    fn remove_stamp(&mut self, stamp: &str) -> PimResult<()> {
        if self.stamps.remove(stamp).is_some() && !self.deleted_stamps.iter().any(|s| s == stamp) {
            self.deleted_stamps.push(stamp.to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::DISPLAY_NAME;
    use crate::recurrence::Frequency;
    use crate::stamp::{LOCATION, TASK_STAMP};
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, day)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    fn rid(day: u32) -> RecurrenceId {
        RecurrenceId::new(at(day))
    }

    fn weekly() -> Note {
        let mut note = Note::new(Default::default(), &Default::default());
        note.set_display_name("Standup").unwrap();
        let event = note.get_stamp(EVENT_STAMP, true, None).unwrap().unwrap();
        event.set_start_date(at(4)).unwrap();
        event
            .set_rrule(Some(RecurrenceRule::supported(Frequency::Weekly, None)))
            .unwrap();
        note
    }

    fn modification(day: u32, name: &str) -> Modification {
        let mut m = Modification::new(rid(day));
        m.set_modified_property(DISPLAY_NAME, name.into());
        m
    }

    #[test]
    fn test_get_stamp_without_create() {
        let mut note = Note::new(Default::default(), &Default::default());
        assert!(note.get_stamp(EVENT_STAMP, false, None).unwrap().is_none());
        assert!(!note.has_stamp(EVENT_STAMP));
    }

    #[test]
    fn test_get_stamp_with_initial_properties() {
        let mut note = Note::new(Default::default(), &Default::default());
        let mut initial = PropertyMap::new();
        initial.insert(LOCATION.into(), "Room 1".into());

        note.get_stamp(EVENT_STAMP, true, Some(&initial)).unwrap();

        assert_eq!(
            note.stamp_value(EVENT_STAMP, LOCATION).and_then(|v| v.as_text().map(str::to_string)),
            Some("Room 1".to_string())
        );
    }

    #[test]
    fn test_get_stamp_unknown_name() {
        let mut note = Note::new(Default::default(), &Default::default());
        let err = note.get_stamp("calendar", true, None).unwrap_err();
        assert!(matches!(err, PimError::UnknownStamp(name) if name == "calendar"));
    }

    #[test]
    fn test_remove_stamp_records_deletion_once() {
        let mut note = Note::new(Default::default(), &Default::default());
        note.get_stamp(TASK_STAMP, true, None).unwrap();

        note.remove_stamp(TASK_STAMP).unwrap();
        note.remove_stamp(TASK_STAMP).unwrap();
        assert_eq!(note.deleted_stamps(), &[TASK_STAMP.to_string()]);

        note.get_stamp(TASK_STAMP, true, None).unwrap();
        assert!(note.deleted_stamps().is_empty(), "re-adding cancels the deletion");
    }

    #[test]
    fn test_add_empty_modification_removes_existing() {
        let mut note = weekly();
        note.add_modification(modification(11, "Planning")).unwrap();
        assert!(note.get_modification(&rid(11)).is_some());

        note.add_modification(Modification::new(rid(11))).unwrap();
        assert!(note.get_modification(&rid(11)).is_none());
    }

    #[test]
    fn test_remove_occurrence_adds_exdate() {
        let mut note = weekly();
        note.add_modification(modification(11, "Planning")).unwrap();

        note.remove_occurrence(rid(11)).unwrap();
        note.remove_occurrence(rid(11)).unwrap();

        assert!(note.get_modification(&rid(11)).is_none());
        assert_eq!(note.stamp(EVENT_STAMP).unwrap().exdates(), vec![at(11)]);
    }

    #[test]
    fn test_series_edits_need_a_recurring_note() {
        let mut note = Note::new(Default::default(), &Default::default());
        assert!(matches!(
            note.remove_occurrence(rid(11)),
            Err(PimError::InvalidOperation(_))
        ));
        assert!(matches!(
            note.end_series_before(rid(11)),
            Err(PimError::InvalidOperation(_))
        ));
    }

    #[test]
    fn test_end_series_before() {
        let mut note = weekly();
        for (day, name) in [(11, "a"), (18, "b"), (25, "c")] {
            note.add_modification(modification(day, name)).unwrap();
        }

        let dropped = note.end_series_before(rid(18)).unwrap();

        assert_eq!(dropped, 2);
        assert_eq!(note.modifications().count(), 1);
        assert_eq!(
            note.recurrence_rule().unwrap().end_date(),
            Some(at(18).and_utc() - TimeDelta::seconds(1))
        );
    }

    #[test]
    fn test_end_series_rejects_unsupported_rule() {
        let mut note = weekly();
        note.stamp_mut(EVENT_STAMP)
            .unwrap()
            .set_rrule(Some(RecurrenceRule::classify("FREQ=WEEKLY;BYDAY=MO,TU")))
            .unwrap();
        note.add_modification(modification(18, "b")).unwrap();

        assert!(note.end_series_before(rid(18)).is_err());
        assert_eq!(note.modifications().count(), 1, "nothing changed");
    }

    #[test]
    fn test_series_cannot_end_at_or_before_its_start() {
        let mut note = weekly();
        note.add_modification(modification(11, "a")).unwrap();
        let range = DateRange {
            from: Some(at(1).and_utc()),
            to: Some(at(31).and_utc()),
        };

        for day in [4, 1] {
            assert!(matches!(
                note.end_series_before(rid(day)),
                Err(PimError::InvalidOperation(_))
            ));
            assert!(matches!(note.split_at(rid(day)), Err(PimError::InvalidOperation(_))));
        }

        assert!(note.recurrence_rule().unwrap().end_date().is_none());
        assert!(note.get_modification(&rid(11)).is_some());
        assert_eq!(note.occurrences(&range, 10).unwrap().len(), 4);
    }

    #[test]
    fn test_split_at() {
        let mut note = weekly();
        note.add_modification(modification(11, "a")).unwrap();
        note.add_modification(modification(25, "c")).unwrap();

        let future = note.split_at(rid(18)).unwrap();

        assert_ne!(future.uid(), note.uid());
        assert_eq!(future.display_name().as_deref(), Some("Standup"));
        assert_eq!(future.stamp(EVENT_STAMP).unwrap().start_date(), Some(at(18)));
        assert!(future.get_modification(&rid(25)).is_some());
        assert!(future.get_modification(&rid(11)).is_none());
        assert!(note.get_modification(&rid(25)).is_none());
        assert!(note.get_modification(&rid(11)).is_some());
        assert!(note.recurrence_rule().unwrap().end_date().is_some());
        assert!(future.recurrence_rule().unwrap().end_date().is_none());
    }

    #[test]
    fn test_try_clone_is_deep() {
        let mut note = weekly();
        note.add_modification(modification(11, "a")).unwrap();

        let mut copy = note.try_clone().unwrap();
        copy.remove_modification(&rid(11)).unwrap();
        copy.set_display_name("Copy").unwrap();

        assert!(note.get_modification(&rid(11)).is_some());
        assert_eq!(note.display_name().as_deref(), Some("Standup"));
        assert_eq!(copy.uid(), note.uid());
    }

    #[test]
    fn test_occurrences_within_range() {
        let note = weekly();
        let range = DateRange {
            from: Some(at(1).and_utc()),
            to: Some(at(20).and_utc()),
        };

        let occurrences = note.occurrences(&range, 10).unwrap();
        let ids: Vec<RecurrenceId> = occurrences.iter().map(|o| o.occurrence_id()).collect();

        assert_eq!(ids, vec![rid(4), rid(11), rid(18)]);
    }
}
