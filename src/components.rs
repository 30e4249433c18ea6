//! Component registry: already-converted reusable schemas.

use serde_json::{Map, Value};

use crate::schema::{ReferenceSchema, Schema};
use crate::types::DEFAULT_COLLECTION;

/// Table of converted components keyed by `(collection, name)`.
///
/// Read-only during a conversion; populated before any schema that
/// references its entries is converted.
#[derive(Debug, Clone, Default)]
pub struct Components {
    entries: Vec<(String, String, Schema)>,
}

impl Components {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Register or replace a component.
    pub fn register(&mut self, collection: &str, name: &str, schema: Schema) {
        match self
            .entries
            .iter_mut()
            .find(|(c, n, _)| c == collection && n == name)
        {
            Some(entry) => entry.2 = schema,
            None => self
                .entries
                .push((collection.to_string(), name.to_string(), schema)),
        }
    }

    pub fn get(&self, collection: &str, name: &str) -> Option<&Schema> {
        self.entries
            .iter()
            .find(|(c, n, _)| c == collection && n == name)
            .map(|(_, _, schema)| schema)
    }

    /// Look up the target of a reference descriptor.
    pub fn lookup(&self, reference: &ReferenceSchema) -> Option<&Schema> {
        self.get(&reference.collection, &reference.name)
    }

    /// Render as `{ "<collection>": { "<name>": <schema> } }`.
    pub fn to_value(&self, prefix: &str) -> Value {
        let mut out = Map::new();
        for (collection, name, schema) in &self.entries {
            let entry = out
                .entry(collection.clone())
                .or_insert_with(|| Value::Object(Map::new()));
            if let Value::Object(items) = entry {
                items.insert(name.clone(), schema.to_value(prefix));
            }
        }
        Value::Object(out)
    }
}

/// Split `collection/name` (or a bare name) into its parts.
pub fn split_component_name(raw: &str) -> (&str, &str) {
    match raw.split_once('/') {
        Some((collection, name)) if !collection.is_empty() && !name.is_empty() => {
            (collection, name)
        }
        _ => (DEFAULT_COLLECTION, raw),
    }
}
