//! Stamps: named, typed facets of a note (event, task, mail).

mod event;
mod mail;
mod registry;
mod task;

pub use event::*;
pub use mail::*;
pub use registry::{MasterGetter, StampDescriptor, StampRegistry};
pub use task::*;

use crate::error::PimResult;
use crate::property::PropertyStore;
use crate::value::PropertyValue;

/// A stamp attached to a master note.
#[derive(Debug, Clone)]
pub struct Stamp {
    name: String,
    properties: PropertyStore,
}

impl Stamp {
    pub(crate) fn new(name: &str, properties: PropertyStore) -> Self {
        Stamp {
            name: name.to_string(),
            properties,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self, property: &str) -> Option<&PropertyValue> {
        self.properties.get(property)
    }

    pub fn set(&mut self, property: &str, value: PropertyValue) {
        self.properties.set(property, value);
    }

    pub fn properties(&self) -> &PropertyStore {
        &self.properties
    }
}

/// Read access to stamp properties, on a master stamp or an occurrence view
/// of one.
pub trait StampRead {
    fn stamp_name(&self) -> &str;

    /// Effective value of a property. Absent properties read as `Null`.
    fn value(&self, property: &str) -> PropertyValue;

    fn is_occurrence_stamp(&self) -> bool;
}

/// Write access to stamp properties.
pub trait StampWrite: StampRead {
    fn set_value(&mut self, property: &str, value: PropertyValue) -> PimResult<()>;
}

impl StampRead for Stamp {
    fn stamp_name(&self) -> &str {
        &self.name
    }

    fn value(&self, property: &str) -> PropertyValue {
        self.get(property).cloned().unwrap_or_default()
    }

    fn is_occurrence_stamp(&self) -> bool {
        false
    }
}

impl StampWrite for Stamp {
    fn set_value(&mut self, property: &str, value: PropertyValue) -> PimResult<()> {
        self.set(property, value);
        Ok(())
    }
}
