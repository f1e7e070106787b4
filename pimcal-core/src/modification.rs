//! Per-occurrence overrides of a recurring note.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::recurrence_id::RecurrenceId;
use crate::value::{PropertyMap, PropertyValue};

/// A sparse overlay of the properties and stamp properties that differ from
/// the master for one occurrence.
///
/// The recurrence id is fixed at creation; it is the join key back to the
/// occurrence in the master's recurrence expansion.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Modification {
    recurrence_id: RecurrenceId,
    #[serde(default)]
    modified_properties: PropertyMap,
    #[serde(default)]
    modified_stamps: BTreeMap<String, PropertyMap>,
    #[serde(default)]
    deleted_stamps: Vec<String>,
}

impl Modification {
    pub fn new(recurrence_id: RecurrenceId) -> Self {
        Modification {
            recurrence_id,
            modified_properties: PropertyMap::new(),
            modified_stamps: BTreeMap::new(),
            deleted_stamps: Vec::new(),
        }
    }

    /// Build a modification from already-decoded data, e.g. by a serializer.
    pub fn from_parts(
        recurrence_id: RecurrenceId,
        modified_properties: PropertyMap,
        modified_stamps: BTreeMap<String, PropertyMap>,
        deleted_stamps: Vec<String>,
    ) -> Self {
        Modification {
            recurrence_id,
            modified_properties,
            modified_stamps,
            deleted_stamps,
        }
    }

    pub fn recurrence_id(&self) -> RecurrenceId {
        self.recurrence_id
    }

    pub fn modified_properties(&self) -> &PropertyMap {
        &self.modified_properties
    }

    pub fn modified_property(&self, name: &str) -> Option<&PropertyValue> {
        self.modified_properties.get(name)
    }

    pub fn set_modified_property(&mut self, name: &str, value: PropertyValue) {
        self.modified_properties.insert(name.to_string(), value);
    }

    pub fn remove_modified_property(&mut self, name: &str) -> Option<PropertyValue> {
        self.modified_properties.remove(name)
    }

    pub fn modified_stamps(&self) -> &BTreeMap<String, PropertyMap> {
        &self.modified_stamps
    }

    pub fn modified_stamp(&self, stamp: &str) -> Option<&PropertyMap> {
        self.modified_stamps.get(stamp)
    }

    pub fn modified_stamp_property(&self, stamp: &str, name: &str) -> Option<&PropertyValue> {
        self.modified_stamps.get(stamp)?.get(name)
    }

    pub fn set_modified_stamp_property(&mut self, stamp: &str, name: &str, value: PropertyValue) {
        self.modified_stamps
            .entry(stamp.to_string())
            .or_default()
            .insert(name.to_string(), value);
    }

    /// Remove a stamp override. A stamp left with no overrides is dropped.
    pub fn remove_modified_stamp_property(&mut self, stamp: &str, name: &str) -> Option<PropertyValue> {
        let overrides = self.modified_stamps.get_mut(stamp)?;
        let removed = overrides.remove(name);
        if overrides.is_empty() {
            self.modified_stamps.remove(stamp);
        }
        removed
    }

    pub fn deleted_stamps(&self) -> &[String] {
        &self.deleted_stamps
    }

    pub fn add_deleted_stamp(&mut self, stamp: &str) {
        if !self.deleted_stamps.iter().any(|s| s == stamp) {
            self.deleted_stamps.push(stamp.to_string());
        }
    }

    /// Number of overridden values, counting note and stamp properties.
    pub fn override_count(&self) -> usize {
        self.modified_properties.len() + self.modified_stamps.values().map(|m| m.len()).sum::<usize>()
    }

    /// An empty modification is equivalent to having no modification at all.
    pub fn is_empty(&self) -> bool {
        self.override_count() == 0 && self.deleted_stamps.is_empty()
    }
}
