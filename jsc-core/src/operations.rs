//! Operation Binder
//!
//! Each component may have an operations payload prepared for it by code
//! outside the engine (walker names, endpoints, whatever the component
//! needs to act on its own). The engine never interprets the payload. It
//! looks it up once by component name when the component mounts and stores
//! it on the element.

use dashmap::DashMap;
use serde_json::Value;

/// Source of per-component operations payloads.
pub trait OperationsProvider: Send + Sync {
    /// The payload registered for `name`, if any.
    fn lookup(&self, name: &str) -> Option<Value>;
}

/// Process-wide operations table.
///
/// Populated by collaborators, possibly from other threads, before the
/// components that need it mount.
#[derive(Debug, Default)]
pub struct OperationsTable {
    entries: DashMap<String, Value>,
}

impl OperationsTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a payload, returning the one it replaced.
    pub fn insert(&self, name: impl Into<String>, operations: Value) -> Option<Value> {
        self.entries.insert(name.into(), operations)
    }

    pub fn remove(&self, name: &str) -> Option<Value> {
        self.entries.remove(name).map(|(_, operations)| operations)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl OperationsProvider for OperationsTable {
    fn lookup(&self, name: &str) -> Option<Value> {
        self.entries.get(name).map(|entry| entry.value().clone())
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for OperationsTable {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let table = Self::new();
        for (name, operations) in iter {
            table.insert(name, operations);
        }
        table
    }
}

/// Operations payload for the component `name`.
pub fn get_operations(provider: &dyn OperationsProvider, name: &str) -> Option<Value> {
    let operations = provider.lookup(name);
    if operations.is_none() {
        tracing::trace!(component = name, "no operations registered");
    }
    operations
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn lookup_by_name() {
        let table: OperationsTable = [("grid", json!({"walker": "list_rows"}))]
            .into_iter()
            .collect();
        assert_eq!(get_operations(&table, "grid"), Some(json!({"walker": "list_rows"})));
        assert_eq!(get_operations(&table, "other"), None);
    }

    #[test]
    fn insert_replaces_and_remove_clears() {
        let table = OperationsTable::new();
        assert!(table.insert("a", json!(1)).is_none());
        assert_eq!(table.insert("a", json!(2)), Some(json!(1)));
        assert_eq!(table.len(), 1);
        assert_eq!(table.remove("a"), Some(json!(2)));
        assert!(table.is_empty());
    }

    #[test]
    fn populated_from_other_threads() {
        let table = Arc::new(OperationsTable::new());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let table = Arc::clone(&table);
                thread::spawn(move || {
                    table.insert(format!("component-{i}"), json!({"index": i}));
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(table.len(), 4);
        assert_eq!(table.lookup("component-2"), Some(json!({"index": 2})));
    }
}
