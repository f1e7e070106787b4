//! Occurrence views.
//!
//! An occurrence is a `(master, recurrence id)` pair. [`OccurrenceView`] and
//! [`OccurrenceStampView`] are generic over how the master is held: any
//! `Deref<Target = Note>` gives read access and any `DerefMut` adds writes,
//! so `&Note`, `&mut Note` and owned handles all work.

use std::ops::{Deref, DerefMut};

use crate::error::{PimError, PimResult};
use crate::item::{NoteRead, NoteWrite};
use crate::modification::Modification;
use crate::note::Note;
use crate::recurrence_id::RecurrenceId;
use crate::resolver::{NoteScope, StampScope, clear_override, resolve_get, resolve_set};
use crate::stamp::{EVENT_STAMP, EventFields, StampRead, StampWrite};
use crate::value::PropertyValue;

/// One occurrence of a recurring master note.
#[derive(Debug)]
pub struct OccurrenceView<M> {
    master: M,
    recurrence_id: RecurrenceId,
}

impl<M: Deref<Target = Note>> OccurrenceView<M> {
    pub fn new(master: M, recurrence_id: RecurrenceId) -> Self {
        OccurrenceView {
            master,
            recurrence_id,
        }
    }

    pub fn occurrence_id(&self) -> RecurrenceId {
        self.recurrence_id
    }

    /// Whether this occurrence has any override.
    pub fn has_modification(&self) -> bool {
        self.master.get_modification(&self.recurrence_id).is_some()
    }

    /// Whether this occurrence starts the series.
    pub fn is_first_occurrence(&self) -> bool {
        self.master
            .stamp(EVENT_STAMP)
            .and_then(|event| event.start_date())
            == Some(self.recurrence_id.datetime())
    }

    /// The stamp as seen from this occurrence.
    ///
    /// Visible when the master has the stamp or this occurrence's
    /// modification overrides properties of it.
    pub fn stamp(&self, name: &str) -> Option<OccurrenceStampView<&Note>> {
        self.stamp_visible(name)
            .then(|| OccurrenceStampView::new(&*self.master, self.recurrence_id, name))
    }

    fn stamp_visible(&self, name: &str) -> bool {
        self.master.stamp(name).is_some()
            || self
                .master
                .get_modification(&self.recurrence_id)
                .is_some_and(|m| m.modified_stamp(name).is_some())
    }
}

impl<M: DerefMut<Target = Note>> OccurrenceView<M> {
    /// Editable stamp view. With `create`, a view is returned for any
    /// registered stamp even when it is not yet visible; writes through it
    /// become stamp overrides.
    pub fn stamp_mut(&mut self, name: &str, create: bool) -> Option<OccurrenceStampView<&mut Note>> {
        let available = self.stamp_visible(name) || (create && self.master.registry().contains(name));
        if !available {
            return None;
        }
        let recurrence_id = self.recurrence_id;
        Some(OccurrenceStampView::new(&mut *self.master, recurrence_id, name))
    }

    /// Drop the override of a note property, returning to the master value.
    pub fn clear_override(&mut self, property: &str) -> PimResult<Option<PropertyValue>> {
        clear_override(&mut self.master, self.recurrence_id, &NoteScope, property)
    }
}

impl<M: Deref<Target = Note>> NoteRead for OccurrenceView<M> {
    fn master(&self) -> &Note {
        &self.master
    }

    fn recurrence_id(&self) -> Option<RecurrenceId> {
        Some(self.recurrence_id)
    }

    fn property(&self, name: &str) -> PropertyValue {
        resolve_get(&self.master, self.recurrence_id, &NoteScope, name)
    }

    fn has_stamp(&self, stamp: &str) -> bool {
        self.stamp_visible(stamp)
    }

    fn stamp_value(&self, stamp: &str, property: &str) -> Option<PropertyValue> {
        self.stamp(stamp).map(|view| view.value(property))
    }

    fn modification(&self, _recurrence_id: &RecurrenceId) -> PimResult<Option<&Modification>> {
        Err(PimError::only_master("getModification"))
    }

    fn occurrence(&self, _recurrence_id: RecurrenceId) -> PimResult<OccurrenceView<&Note>> {
        Err(PimError::only_master("getNoteOccurrence"))
    }

    fn try_clone(&self) -> PimResult<Note> {
        Err(PimError::InvalidOperation(
            "clone: an occurrence has no identity of its own".to_string(),
        ))
    }
}

impl<M: DerefMut<Target = Note>> NoteWrite for OccurrenceView<M> {
    fn set_property(&mut self, name: &str, value: PropertyValue) -> PimResult<()> {
        resolve_set(&mut self.master, self.recurrence_id, &NoteScope, name, value)
    }

    fn set_stamp_value(&mut self, stamp: &str, property: &str, value: PropertyValue) -> PimResult<()> {
        let mut view = self
            .stamp_mut(stamp, true)
            .ok_or_else(|| PimError::UnknownStamp(stamp.to_string()))?;
        view.set_value(property, value)
    }

    fn add_modification(&mut self, _modification: Modification) -> PimResult<()> {
        Err(PimError::only_master("addModification"))
    }

    fn remove_modification(&mut self, _recurrence_id: &RecurrenceId) -> PimResult<Option<Modification>> {
        Err(PimError::only_master("removeModification"))
    }

    fn remove_stamp(&mut self, stamp: &str) -> PimResult<()> {
        Err(PimError::InvalidOperation(format!(
            "removeStamp: cannot remove stamp '{stamp}' from a single occurrence"
        )))
    }
}

/// A master stamp as seen from one occurrence.
#[derive(Debug)]
pub struct OccurrenceStampView<M> {
    master: M,
    recurrence_id: RecurrenceId,
    stamp: String,
}

impl<M: Deref<Target = Note>> OccurrenceStampView<M> {
    fn new(master: M, recurrence_id: RecurrenceId, stamp: &str) -> Self {
        OccurrenceStampView {
            master,
            recurrence_id,
            stamp: stamp.to_string(),
        }
    }

    pub fn occurrence_id(&self) -> RecurrenceId {
        self.recurrence_id
    }
}

impl<M: DerefMut<Target = Note>> OccurrenceStampView<M> {
    pub fn clear_override(&mut self, property: &str) -> PimResult<Option<PropertyValue>> {
        let scope = StampScope::new(&self.stamp);
        clear_override(&mut self.master, self.recurrence_id, &scope, property)
    }
}

impl<M: Deref<Target = Note>> StampRead for OccurrenceStampView<M> {
    fn stamp_name(&self) -> &str {
        &self.stamp
    }

    fn value(&self, property: &str) -> PropertyValue {
        resolve_get(&self.master, self.recurrence_id, &StampScope::new(&self.stamp), property)
    }

    fn is_occurrence_stamp(&self) -> bool {
        true
    }
}

impl<M: DerefMut<Target = Note>> StampWrite for OccurrenceStampView<M> {
    fn set_value(&mut self, property: &str, value: PropertyValue) -> PimResult<()> {
        let scope = StampScope::new(&self.stamp);
        resolve_set(&mut self.master, self.recurrence_id, &scope, property, value)
    }
}
