//! Component Registry
//!
//! Components find each other only by their declared names. The registry is
//! the flat name → element index that makes that possible. It is owned by
//! the engine and indexes mounted elements with a declared `name` only;
//! tree-assigned names are never entered. It never keeps an element
//! alive: unmounting removes the entries, and lookups are re-checked against
//! the document by the engine.
//!
//! Names are expected to be unique, but nothing upstream guarantees it. When
//! several mounted elements share a name, the registry keeps all of them in
//! document order and resolves to the first, the way a `[name=...]` selector
//! query would.

use std::collections::HashMap;

use smallvec::SmallVec;

use crate::config::DuplicateNamePolicy;
use crate::document::ElementId;
use crate::error::{EngineError, Result};

/// Name → mounted element index.
#[derive(Debug, Default)]
pub struct ComponentRegistry {
    names: HashMap<String, SmallVec<[ElementId; 1]>>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether registering `name` for `id` is allowed under `policy`.
    pub fn check(&self, name: &str, id: ElementId, policy: DuplicateNamePolicy) -> Result<()> {
        if policy == DuplicateNamePolicy::Reject {
            if let Some(ids) = self.names.get(name) {
                if ids.iter().any(|existing| *existing != id) {
                    return Err(EngineError::DuplicateName(name.to_owned()));
                }
            }
        }
        Ok(())
    }

    /// Index `id` under `name`.
    pub fn register(
        &mut self,
        name: &str,
        id: ElementId,
        policy: DuplicateNamePolicy,
    ) -> Result<()> {
        self.check(name, id, policy)?;

        let ids = self.names.entry(name.to_owned()).or_default();
        if ids.contains(&id) {
            return Ok(());
        }
        if !ids.is_empty() {
            tracing::warn!(
                component = name,
                "duplicate component name, lookups resolve to the first"
            );
        }

        // Ids grow in creation order, which is document order.
        let position = ids.partition_point(|existing| *existing < id);
        ids.insert(position, id);
        Ok(())
    }

    /// Remove the entry for `id` under `name`, if present.
    pub fn unregister(&mut self, name: &str, id: ElementId) {
        if let Some(ids) = self.names.get_mut(name) {
            ids.retain(|existing| *existing != id);
            if ids.is_empty() {
                self.names.remove(name);
            }
        }
    }

    /// The first mounted element named `name`.
    pub fn resolve(&self, name: &str) -> Option<ElementId> {
        self.names.get(name).and_then(|ids| ids.first().copied())
    }

    /// Every element registered under `name`, in document order.
    pub fn resolve_all(&self, name: &str) -> &[ElementId] {
        self.names.get(name).map(|ids| ids.as_slice()).unwrap_or(&[])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    /// Number of distinct registered names.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
