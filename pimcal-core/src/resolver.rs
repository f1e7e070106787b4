//! Occurrence resolution.
//!
//! An occurrence has no storage of its own. Reads merge the master with the
//! occurrence's [`Modification`]; writes decide whether an override is needed
//! and allocate the modification lazily on the first value that diverges from
//! the master. Whether a property lives on the note or on one of its stamps is
//! abstracted by [`OccurrenceScope`].

use tracing::{debug, trace};

use crate::error::{PimError, PimResult};
use crate::item::NON_OVERRIDABLE;
use crate::modification::Modification;
use crate::note::Note;
use crate::recurrence_id::RecurrenceId;
use crate::value::PropertyValue;

/// Where an occurrence property's master value and override live.
pub trait OccurrenceScope {
    fn is_overridable(&self, property: &str) -> bool;

    /// The value an occurrence inherits when it has no override.
    fn master_value(&self, master: &Note, recurrence_id: RecurrenceId, property: &str) -> PropertyValue;

    fn modified_value<'m>(&self, modification: &'m Modification, property: &str) -> Option<&'m PropertyValue>;

    fn set_modified(&self, modification: &mut Modification, property: &str, value: PropertyValue);

    fn clear_modified(&self, modification: &mut Modification, property: &str) -> Option<PropertyValue>;
}

/// Note properties, overridden through `modifiedProperties`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoteScope;

impl OccurrenceScope for NoteScope {
    fn is_overridable(&self, property: &str) -> bool {
        !NON_OVERRIDABLE.contains(&property)
    }

    fn master_value(&self, master: &Note, _recurrence_id: RecurrenceId, property: &str) -> PropertyValue {
        master.get(property).cloned().unwrap_or_default()
    }

    fn modified_value<'m>(&self, modification: &'m Modification, property: &str) -> Option<&'m PropertyValue> {
        modification.modified_property(property)
    }

    fn set_modified(&self, modification: &mut Modification, property: &str, value: PropertyValue) {
        modification.set_modified_property(property, value);
    }

    fn clear_modified(&self, modification: &mut Modification, property: &str) -> Option<PropertyValue> {
        modification.remove_modified_property(property)
    }
}

/// Properties of one stamp, overridden through `modifiedStamps[stamp]`.
///
/// Master values come from the registry's master getter for the property when
/// the stamp kind declares one, otherwise from the master's stamp.
#[derive(Debug, Clone, Copy)]
pub struct StampScope<'a> {
    stamp: &'a str,
}

impl<'a> StampScope<'a> {
    pub fn new(stamp: &'a str) -> Self {
        StampScope { stamp }
    }

    pub fn stamp(&self) -> &'a str {
        self.stamp
    }
}

impl OccurrenceScope for StampScope<'_> {
    fn is_overridable(&self, _property: &str) -> bool {
        true
    }

    fn master_value(&self, master: &Note, recurrence_id: RecurrenceId, property: &str) -> PropertyValue {
        let getter = master
            .registry()
            .get(self.stamp)
            .and_then(|descriptor| descriptor.master_getter(property));
        if let Some(getter) = getter {
            return getter(master, recurrence_id);
        }

        master
            .stamp(self.stamp)
            .and_then(|stamp| stamp.get(property))
            .cloned()
            .unwrap_or_default()
    }

    fn modified_value<'m>(&self, modification: &'m Modification, property: &str) -> Option<&'m PropertyValue> {
        modification.modified_stamp_property(self.stamp, property)
    }

    fn set_modified(&self, modification: &mut Modification, property: &str, value: PropertyValue) {
        modification.set_modified_stamp_property(self.stamp, property, value);
    }

    fn clear_modified(&self, modification: &mut Modification, property: &str) -> Option<PropertyValue> {
        modification.remove_modified_stamp_property(self.stamp, property)
    }
}

fn not_overridable(property: &str) -> PimError {
    PimError::InvalidOperation(format!(
        "'{property}' always comes from the master and cannot be set on an occurrence"
    ))
}

/// Effective value of `property` on the occurrence `recurrence_id`.
pub fn resolve_get<S: OccurrenceScope + ?Sized>(
    master: &Note,
    recurrence_id: RecurrenceId,
    scope: &S,
    property: &str,
) -> PropertyValue {
    let master_value = scope.master_value(master, recurrence_id, property);
    if !scope.is_overridable(property) {
        return master_value;
    }

    master
        .get_modification(&recurrence_id)
        .and_then(|modification| scope.modified_value(modification, property))
        .cloned()
        .unwrap_or(master_value)
}

/// Write `value` to `property` on the occurrence `recurrence_id`.
///
/// An existing override is always updated. Otherwise an override is only
/// recorded when `value` differs from the inherited master value, and the
/// occurrence's modification is created on demand.
pub fn resolve_set<S: OccurrenceScope + ?Sized>(
    master: &mut Note,
    recurrence_id: RecurrenceId,
    scope: &S,
    property: &str,
    value: PropertyValue,
) -> PimResult<()> {
    if !scope.is_overridable(property) {
        return Err(not_overridable(property));
    }

    let master_value = scope.master_value(master, recurrence_id, property);

    if let Some(modification) = master.modification_mut(&recurrence_id) {
        if scope.modified_value(modification, property).is_some() || !value.equals(&master_value)? {
            scope.set_modified(modification, property, value);
        } else {
            trace!(%recurrence_id, property, "write matches master value");
        }
        return Ok(());
    }

    if value.equals(&master_value)? {
        trace!(%recurrence_id, property, "write matches master value");
        return Ok(());
    }

    let mut modification = Modification::new(recurrence_id);
    scope.set_modified(&mut modification, property, value);
    debug!(%recurrence_id, property, "allocating modification for occurrence");
    master.insert_modification(modification);
    Ok(())
}

/// Cancel the override of `property` on `recurrence_id`, returning it.
///
/// A modification left without overrides is removed from the master.
pub fn clear_override<S: OccurrenceScope + ?Sized>(
    master: &mut Note,
    recurrence_id: RecurrenceId,
    scope: &S,
    property: &str,
) -> PimResult<Option<PropertyValue>> {
    if !scope.is_overridable(property) {
        return Err(not_overridable(property));
    }

    let Some(modification) = master.modification_mut(&recurrence_id) else {
        return Ok(None);
    };
    let removed = scope.clear_modified(modification, property);

    if modification.is_empty() {
        debug!(%recurrence_id, "last override cleared, dropping modification");
        master.drop_modification(&recurrence_id);
    }
    Ok(removed)
}
