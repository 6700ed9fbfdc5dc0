//! Schema metadata registry
//!
//! Maps schema identities to user metadata. Lookups take a shared lock,
//! registration takes an exclusive one. Entries are held weakly: once every
//! copy of a schema is dropped its entry stops resolving and is pruned on the
//! next registration.

use crate::validators::base::Schema;
use crate::validators::internals::SchemaId;
use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use tracing::debug;

/// User metadata attached to a schema
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    /// Identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Human-readable title
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Example values
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<serde_json::Value>,
    /// Deprecation marker
    #[serde(default)]
    pub deprecated: bool,
    /// Free-form extra entries
    #[serde(default, flatten)]
    pub extra: IndexMap<String, serde_json::Value>,
}

impl Metadata {
    /// Create empty metadata
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Add an example value
    pub fn with_example(mut self, example: serde_json::Value) -> Self {
        self.examples.push(example);
        self
    }

    /// Add an extra entry
    pub fn with_extra(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

#[derive(Debug)]
struct Entry {
    metadata: Metadata,
    alive: Weak<()>,
}

impl Entry {
    fn is_live(&self) -> bool {
        self.alive.strong_count() > 0
    }
}

/// Registry keyed by schema identity
#[derive(Debug, Default)]
pub struct Registry {
    entries: RwLock<HashMap<SchemaId, Entry>>,
}

impl Registry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register metadata for a schema, replacing any previous entry
    pub fn add(&self, schema: &dyn Schema, metadata: Metadata) {
        let internals = schema.internals();
        debug!(schema = %internals.id, "registering schema metadata");

        let mut entries = self.entries.write();
        entries.retain(|_, entry| entry.is_live());
        entries.insert(
            internals.id,
            Entry {
                metadata,
                alive: Arc::downgrade(&internals.liveness),
            },
        );
    }

    /// Metadata registered for a schema
    pub fn get(&self, schema: &dyn Schema) -> Option<Metadata> {
        self.entries
            .read()
            .get(&schema.internals().id)
            .filter(|entry| entry.is_live())
            .map(|entry| entry.metadata.clone())
    }

    /// Whether a schema has metadata
    pub fn has(&self, schema: &dyn Schema) -> bool {
        self.get(schema).is_some()
    }

    /// Remove a schema's metadata
    pub fn remove(&self, schema: &dyn Schema) -> Option<Metadata> {
        self.entries
            .write()
            .remove(&schema.internals().id)
            .map(|entry| entry.metadata)
    }

    /// Drop entries whose schemas no longer exist; returns how many were dropped
    pub fn prune(&self) -> usize {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, entry| entry.is_live());
        before - entries.len()
    }

    /// Number of registered schemas still alive
    pub fn len(&self) -> usize {
        self.entries.read().values().filter(|e| e.is_live()).count()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

lazy_static::lazy_static! {
    static ref GLOBAL: Registry = Registry::new();
}

/// The process-global registry used by `meta` and `describe`
pub fn global() -> &'static Registry {
    &GLOBAL
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validators::base::SchemaExt;
    use crate::{int, string};

    #[test]
    fn test_add_get_remove() {
        let registry = Registry::new();
        let schema = string();
        registry.add(&schema, Metadata::new().with_title("Name"));

        assert!(registry.has(&schema));
        assert_eq!(registry.get(&schema).unwrap().title.as_deref(), Some("Name"));
        assert_eq!(registry.len(), 1);

        registry.remove(&schema);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_identity_not_structure() {
        let registry = Registry::new();
        let a = int();
        let b = int();
        registry.add(&a, Metadata::new().with_title("a"));
        assert!(!registry.has(&b));
    }

    #[test]
    fn test_dropped_schemas_are_pruned() {
        let registry = Registry::new();
        let kept = string();
        let copy = {
            let dropped = int();
            registry.add(&dropped, Metadata::new().with_title("gone"));
            let copy = dropped.clone();
            drop(dropped);
            copy
        };
        assert!(registry.has(&copy));

        drop(copy);
        registry.add(&kept, Metadata::new().with_title("kept"));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.prune(), 0);
        assert!(registry.has(&kept));
    }

    #[test]
    fn test_prune_reports_dead_entries() {
        let registry = Registry::new();
        registry.add(&string(), Metadata::new());
        assert_eq!(registry.len(), 0);
        assert_eq!(registry.prune(), 1);
        assert_eq!(registry.prune(), 0);
    }

    #[test]
    fn test_describe_registers_globally() {
        let base = string();
        let described = base.describe("user name");
        assert!(!global().has(&base));
        assert_eq!(
            global().get(&described).unwrap().description.as_deref(),
            Some("user name")
        );
    }

    #[test]
    fn test_metadata_serialization_flattens_extra() {
        let meta = Metadata::new()
            .with_title("T")
            .with_extra("x-unit", serde_json::json!("cm"));
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["title"], "T");
        assert_eq!(json["x-unit"], "cm");
    }
}
