//! Change sets applied to a series with an explicit scope.
//!
//! Editing a recurring note asks which occurrences a change is for: only
//! this one, this one and all future ones, or the whole series. A [`Delta`]
//! collects the edited values once and applies them with the chosen
//! [`ChangeScope`].

use tracing::debug;

use crate::error::{PimError, PimResult};
use crate::item::{NON_OVERRIDABLE, NoteWrite};
use crate::note::Note;
use crate::occurrence::OccurrenceView;
use crate::recurrence_id::RecurrenceId;
use crate::value::PropertyValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeScope {
    /// Every occurrence: edit the master.
    Master,
    /// Only the given occurrence: record overrides.
    Occurrence,
    /// The given occurrence and every later one: split the series.
    OccurrenceAndFuture,
}

#[derive(Debug, Clone)]
struct StampChange {
    stamp: String,
    property: String,
    value: PropertyValue,
}

/// An ordered set of note and stamp property changes.
#[derive(Debug, Clone, Default)]
pub struct Delta {
    properties: Vec<(String, PropertyValue)>,
    stamp_properties: Vec<StampChange>,
}

impl Delta {
    pub fn new() -> Self {
        Delta::default()
    }

    pub fn with_property(mut self, name: &str, value: impl Into<PropertyValue>) -> Self {
        self.add_property(name, value);
        self
    }

    pub fn with_stamp_property(mut self, stamp: &str, name: &str, value: impl Into<PropertyValue>) -> Self {
        self.add_stamp_property(stamp, name, value);
        self
    }

    pub fn add_property(&mut self, name: &str, value: impl Into<PropertyValue>) {
        self.properties.push((name.to_string(), value.into()));
    }

    pub fn add_stamp_property(&mut self, stamp: &str, name: &str, value: impl Into<PropertyValue>) {
        self.stamp_properties.push(StampChange {
            stamp: stamp.to_string(),
            property: name.to_string(),
            value: value.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty() && self.stamp_properties.is_empty()
    }

    /// Write every change to `note`, in the order they were added.
    pub fn apply_to<N: NoteWrite + ?Sized>(&self, note: &mut N) -> PimResult<()> {
        for (name, value) in &self.properties {
            note.set_property(name, value.clone())?;
        }
        for change in &self.stamp_properties {
            note.set_stamp_value(&change.stamp, &change.property, change.value.clone())?;
        }
        Ok(())
    }

    pub fn apply_to_master(&self, master: &mut Note) -> PimResult<()> {
        self.apply_to(master)
    }

    /// Apply as overrides of one occurrence.
    ///
    /// All or nothing: a change to a property occurrences cannot override is
    /// rejected before anything is written, and any later failure restores
    /// the occurrence's modification as it was.
    pub fn apply_to_occurrence(&self, master: &mut Note, recurrence_id: RecurrenceId) -> PimResult<()> {
        if let Some((name, _)) = self
            .properties
            .iter()
            .find(|(name, _)| NON_OVERRIDABLE.contains(&name.as_str()))
        {
            return Err(PimError::InvalidOperation(format!(
                "'{name}' cannot be changed for a single occurrence"
            )));
        }

        let before = master.get_modification(&recurrence_id).cloned();
        let result = self.apply_to(&mut OccurrenceView::new(&mut *master, recurrence_id));
        if result.is_err() {
            match before {
                Some(modification) => master.insert_modification(modification),
                None => {
                    master.drop_modification(&recurrence_id);
                }
            }
            debug!(%recurrence_id, "rolled back partially applied occurrence change");
        }
        result
    }

    /// Apply to `recurrence_id` and every later occurrence.
    ///
    /// At or before the series start this is the same as editing the master
    /// and returns `None`. Otherwise the series is split there and the
    /// returned new master carries the change.
    pub fn apply_to_occurrence_and_future(
        &self,
        master: &mut Note,
        recurrence_id: RecurrenceId,
    ) -> PimResult<Option<Note>> {
        if master
            .series_start()
            .is_some_and(|start| recurrence_id.datetime() <= start)
        {
            self.apply_to_master(master)?;
            return Ok(None);
        }

        let mut future = master.split_at(recurrence_id)?;
        self.apply_to_master(&mut future)?;
        debug!(%recurrence_id, "applied change to occurrence and future");
        Ok(Some(future))
    }

    /// Apply with `scope`. Only [`ChangeScope::OccurrenceAndFuture`] can
    /// produce a new master.
    pub fn apply(
        &self,
        scope: ChangeScope,
        master: &mut Note,
        recurrence_id: RecurrenceId,
    ) -> PimResult<Option<Note>> {
        match scope {
            ChangeScope::Master => self.apply_to_master(master).map(|_| None),
            ChangeScope::Occurrence => self.apply_to_occurrence(master, recurrence_id).map(|_| None),
            ChangeScope::OccurrenceAndFuture => self.apply_to_occurrence_and_future(master, recurrence_id),
        }
    }
}
