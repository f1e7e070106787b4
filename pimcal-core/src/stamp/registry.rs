use std::collections::BTreeMap;

use crate::note::Note;
use crate::property::{PropertyDef, PropertyStore};
use crate::recurrence_id::RecurrenceId;
use crate::value::{PropertyMap, PropertyValue};

use super::Stamp;
use super::event::event_descriptor;
use super::mail::mail_descriptor;
use super::task::task_descriptor;

/// Computes the inherited value of a stamp property for one occurrence,
/// replacing a plain lookup on the master stamp.
pub type MasterGetter = fn(&Note, RecurrenceId) -> PropertyValue;

/// How to build a stamp, and how its occurrence views read master values.
#[derive(Debug, Clone)]
pub struct StampDescriptor {
    name: String,
    schema: &'static [PropertyDef],
    master_getters: BTreeMap<&'static str, MasterGetter>,
}

impl StampDescriptor {
    pub fn new(name: impl Into<String>, schema: &'static [PropertyDef]) -> Self {
        StampDescriptor {
            name: name.into(),
            schema,
            master_getters: BTreeMap::new(),
        }
    }

    pub fn with_master_getter(mut self, property: &'static str, getter: MasterGetter) -> Self {
        self.master_getters.insert(property, getter);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &'static [PropertyDef] {
        self.schema
    }

    pub fn master_getter(&self, property: &str) -> Option<MasterGetter> {
        self.master_getters.get(property).copied()
    }

    /// Create a master stamp with defaults filled from the schema.
    pub fn instantiate(&self, initial: &PropertyMap) -> Stamp {
        Stamp::new(&self.name, PropertyStore::with_schema(&[self.schema], initial))
    }
}

/// The stamp kinds known to a session.
///
/// Built once at session start and shared by every note created in it. The
/// default registry is [`StampRegistry::standard`].
#[derive(Debug, Clone)]
pub struct StampRegistry {
    descriptors: BTreeMap<String, StampDescriptor>,
}

impl Default for StampRegistry {
    fn default() -> Self {
        StampRegistry::standard()
    }
}

impl StampRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        StampRegistry {
            descriptors: BTreeMap::new(),
        }
    }

    /// Registry with the event, task and mail stamps.
    pub fn standard() -> Self {
        let mut registry = StampRegistry::new();
        registry.register(event_descriptor());
        registry.register(task_descriptor());
        registry.register(mail_descriptor());
        registry
    }

    /// Register a stamp kind, returning the descriptor it replaced.
    pub fn register(&mut self, descriptor: StampDescriptor) -> Option<StampDescriptor> {
        self.descriptors
            .insert(descriptor.name().to_string(), descriptor)
    }

    pub fn get(&self, name: &str) -> Option<&StampDescriptor> {
        self.descriptors.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.descriptors.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.descriptors.keys().map(String::as_str)
    }
}
