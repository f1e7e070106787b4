//! Declared properties and their storage.
//!
//! Every entity kind (item, note, each stamp) declares a static schema table of
//! [`PropertyDef`]s. The table drives default population when an entity is
//! created; after that, reads and writes go straight to the [`PropertyStore`].

use std::collections::BTreeMap;

use tracing::trace;

use crate::value::{PropertyMap, PropertyValue};

/// How a property's default is produced.
#[derive(Debug, Clone, Copy)]
pub enum PropertyDefault {
    /// No value.
    Null,
    Bool(bool),
    Integer(i64),
    Decimal(f64),
    /// Computed when the entity is initialized (fresh uid, current time, ...).
    Generate(fn() -> PropertyValue),
}

impl PropertyDefault {
    pub fn produce(&self) -> PropertyValue {
        match self {
            PropertyDefault::Null => PropertyValue::Null,
            PropertyDefault::Bool(b) => PropertyValue::Bool(*b),
            PropertyDefault::Integer(i) => PropertyValue::Integer(*i),
            PropertyDefault::Decimal(d) => PropertyValue::Decimal(*d),
            PropertyDefault::Generate(f) => f(),
        }
    }
}

/// One entry of a schema table.
#[derive(Debug, Clone, Copy)]
pub struct PropertyDef {
    pub name: &'static str,
    pub default: PropertyDefault,
}

impl PropertyDef {
    pub const fn new(name: &'static str, default: PropertyDefault) -> Self {
        PropertyDef { name, default }
    }
}

/// Per-entity property storage.
#[derive(Debug, Clone, Default)]
pub struct PropertyStore {
    values: BTreeMap<String, PropertyValue>,
}

impl PropertyStore {
    /// Build a store populated from one or more schema tables.
    pub fn with_schema(schemas: &[&[PropertyDef]], initial: &PropertyMap) -> Self {
        let mut store = PropertyStore::default();
        for schema in schemas {
            store.initialize_properties(schema, initial);
        }

        for name in initial.keys() {
            if !store.contains(name) {
                trace!(property = %name, "ignoring undeclared initial property");
            }
        }
        store
    }

    /// For every declared property take the supplied initial value if there is
    /// one, otherwise the declared default. Undeclared initial values are
    /// ignored.
    pub fn initialize_properties(&mut self, schema: &[PropertyDef], initial: &PropertyMap) {
        for def in schema {
            let value = match initial.get(def.name) {
                Some(value) => value.clone(),
                None => def.default.produce(),
            };
            self.values.insert(def.name.to_string(), value);
        }
    }

    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.values.get(name)
    }

    pub fn set(&mut self, name: &str, value: PropertyValue) {
        self.values.insert(name.to_string(), value);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn forty_two() -> PropertyValue {
        PropertyValue::Integer(42)
    }

    const SCHEMA: &[PropertyDef] = &[
        PropertyDef::new("title", PropertyDefault::Null),
        PropertyDef::new("done", PropertyDefault::Bool(false)),
        PropertyDef::new("answer", PropertyDefault::Generate(forty_two)),
    ];

    #[test]
    fn test_defaults_fill_missing_properties() {
        let store = PropertyStore::with_schema(&[SCHEMA], &PropertyMap::new());

        assert!(store.get("title").unwrap().is_null());
        assert_eq!(store.get("done").unwrap().as_bool(), Some(false));
        assert_eq!(store.get("answer").unwrap().as_f64(), Some(42.0));
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_initial_values_win_over_defaults() {
        let mut initial = PropertyMap::new();
        initial.insert("title".into(), "Hello".into());
        initial.insert("unknown".into(), PropertyValue::Bool(true));

        let store = PropertyStore::with_schema(&[SCHEMA], &initial);

        assert_eq!(store.get("title").unwrap().as_text(), Some("Hello"));
        assert!(!store.contains("unknown"), "undeclared values are dropped");
    }

    #[test]
    fn test_generated_defaults_run_per_initialization() {
        fn counter() -> PropertyValue {
            use std::sync::atomic::{AtomicI64, Ordering};
            static NEXT: AtomicI64 = AtomicI64::new(0);
            PropertyValue::Integer(NEXT.fetch_add(1, Ordering::SeqCst))
        }
        let schema = [PropertyDef::new("n", PropertyDefault::Generate(counter))];

        let a = PropertyStore::with_schema(&[&schema[..]], &PropertyMap::new());
        let b = PropertyStore::with_schema(&[&schema[..]], &PropertyMap::new());

        assert_ne!(
            a.get("n").unwrap().as_f64(),
            b.get("n").unwrap().as_f64()
        );
    }
}
