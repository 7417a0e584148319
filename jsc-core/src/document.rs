//! Live Element Tree
//!
//! The document owns every element the renderer has materialized, whether or
//! not it is mounted yet. Elements refer to each other by [`ElementId`], never
//! by reference: a parent lists its children per slot, a child remembers its
//! parent.
//!
//! # Render State
//!
//! Each element carries a render state, the same clean/dirty scheme a
//! dependency graph node uses:
//!
//! - `Clean`: the rendered text reflects the current attributes.
//! - `Dirty`: an attribute was written since the last render cycle.
//!
//! The engine's flush pass re-renders dirty elements in document order.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::component::ComponentKind;
use crate::error::{EngineError, Result};
use crate::events::EventBindings;

/// Identifier of an element within one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementId(u64);

impl ElementId {
    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl From<u64> for ElementId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Render state of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderState {
    /// Rendered output is up-to-date.
    Clean,

    /// Attributes changed; needs a render pass.
    Dirty,
}

/// A live component instance.
#[derive(Debug, Clone)]
pub struct Element {
    id: ElementId,
    kind: ComponentKind,
    name: String,
    pub(crate) declared_name: bool,
    parent: Option<ElementId>,
    pub(crate) attributes: IndexMap<String, Value>,
    pub(crate) slots: IndexMap<String, Vec<ElementId>>,
    pub(crate) bindings: EventBindings,
    pub(crate) operations: Option<Value>,
    pub(crate) style: Map<String, Value>,
    pub(crate) text: Option<String>,
    pub(crate) mounted: bool,
    render_state: RenderState,
    render_count: usize,
}

impl Element {
    fn new(id: ElementId, kind: ComponentKind, name: String) -> Self {
        Self {
            id,
            kind,
            name,
            declared_name: false,
            parent: None,
            attributes: IndexMap::new(),
            slots: IndexMap::new(),
            bindings: EventBindings::default(),
            operations: None,
            style: Map::new(),
            text: None,
            mounted: false,
            render_state: RenderState::Dirty,
            render_count: 0,
        }
    }

    pub fn id(&self) -> ElementId {
        self.id
    }

    pub fn kind(&self) -> ComponentKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the name came from a `name` prop rather than the tree
    /// position. Only declared names are registered for lookup.
    pub fn has_declared_name(&self) -> bool {
        self.declared_name
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = name;
        self.declared_name = true;
    }

    pub fn parent(&self) -> Option<ElementId> {
        self.parent
    }

    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    pub fn attributes(&self) -> &IndexMap<String, Value> {
        &self.attributes
    }

    /// Children in the named slot, in display order.
    pub fn slot(&self, name: &str) -> &[ElementId] {
        self.slots.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn slots(&self) -> &IndexMap<String, Vec<ElementId>> {
        &self.slots
    }

    pub fn bindings(&self) -> &EventBindings {
        &self.bindings
    }

    /// The operations payload bound at mount.
    pub fn operations(&self) -> Option<&Value> {
        self.operations.as_ref()
    }

    /// Resolved style: kind defaults with `css` overrides applied at mount.
    pub fn style(&self) -> &Map<String, Value> {
        &self.style
    }

    /// Visible text produced by the last render pass.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn render_state(&self) -> RenderState {
        self.render_state
    }

    pub fn is_dirty(&self) -> bool {
        self.render_state == RenderState::Dirty
    }

    pub fn render_count(&self) -> usize {
        self.render_count
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.render_state = RenderState::Dirty;
    }

    /// Record a completed render pass.
    pub(crate) fn mark_rendered(&mut self, text: Option<String>) {
        self.text = text;
        self.render_state = RenderState::Clean;
        self.render_count += 1;
    }
}

/// Structural view of an element subtree, free of ids.
///
/// Two renders of the same tree produce equal snapshots.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElementSnapshot {
    pub kind: ComponentKind,
    pub name: String,
    pub attributes: IndexMap<String, Value>,
    pub text: Option<String>,
    pub slots: IndexMap<String, Vec<ElementSnapshot>>,
}

/// Arena of live elements, in creation order.
#[derive(Debug, Default)]
pub struct Document {
    elements: IndexMap<ElementId, Element>,
    next_id: u64,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a detached element.
    pub fn insert(&mut self, kind: ComponentKind, name: impl Into<String>) -> ElementId {
        let id = ElementId(self.next_id);
        self.next_id += 1;
        self.elements.insert(id, Element::new(id, kind, name.into()));
        id
    }

    pub fn get(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(&id)
    }

    pub fn get_mut(&mut self, id: ElementId) -> Option<&mut Element> {
        self.elements.get_mut(&id)
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.elements.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// All elements in document order.
    pub fn iter(&self) -> impl Iterator<Item = &Element> {
        self.elements.values()
    }

    /// Append `child` at the end of `parent`'s named slot.
    pub fn append_child(&mut self, parent: ElementId, slot: &str, child: ElementId) -> Result<()> {
        if !self.elements.contains_key(&parent) {
            return Err(EngineError::UnknownElement(parent));
        }
        let child_element = self
            .elements
            .get_mut(&child)
            .ok_or(EngineError::UnknownElement(child))?;
        child_element.parent = Some(parent);

        if let Some(parent_element) = self.elements.get_mut(&parent) {
            parent_element
                .slots
                .entry(slot.to_owned())
                .or_default()
                .push(child);
        }
        Ok(())
    }

    /// Ids of `root` and its descendants, parents before children.
    pub fn subtree(&self, root: ElementId) -> Vec<ElementId> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let Some(element) = self.elements.get(&id) else {
                continue;
            };
            out.push(id);
            // Reverse so the first child is visited first.
            for child in element.slots.values().flatten().rev() {
                stack.push(*child);
            }
        }
        out
    }

    /// Ids of `root` and its descendants, children before parents.
    pub fn subtree_post_order(&self, root: ElementId) -> Vec<ElementId> {
        let mut out = Vec::new();
        self.collect_post_order(root, &mut out);
        out
    }

    fn collect_post_order(&self, id: ElementId, out: &mut Vec<ElementId>) {
        let Some(element) = self.elements.get(&id) else {
            return;
        };
        for child in element.slots.values().flatten() {
            self.collect_post_order(*child, out);
        }
        out.push(id);
    }

    /// Ids of dirty elements in document order.
    pub fn dirty(&self) -> Vec<ElementId> {
        self.elements
            .values()
            .filter(|element| element.is_dirty())
            .map(Element::id)
            .collect()
    }

    /// Detach `root` from its parent and remove it with all descendants.
    pub fn remove_subtree(&mut self, root: ElementId) -> Result<Vec<Element>> {
        let parent = self
            .elements
            .get(&root)
            .ok_or(EngineError::UnknownElement(root))?
            .parent;

        if let Some(parent) = parent.and_then(|p| self.elements.get_mut(&p)) {
            for children in parent.slots.values_mut() {
                children.retain(|child| *child != root);
            }
        }

        let ids = self.subtree(root);
        Ok(ids
            .into_iter()
            .filter_map(|id| self.elements.shift_remove(&id))
            .collect())
    }

    /// Structural snapshot of the subtree rooted at `id`.
    pub fn snapshot(&self, id: ElementId) -> Option<ElementSnapshot> {
        let element = self.elements.get(&id)?;
        let slots = element
            .slots
            .iter()
            .map(|(slot, children)| {
                let children = children.iter().filter_map(|child| self.snapshot(*child)).collect();
                (slot.clone(), children)
            })
            .collect();

        Some(ElementSnapshot {
            kind: element.kind,
            name: element.name.clone(),
            attributes: element.attributes.clone(),
            text: element.text.clone(),
            slots,
        })
    }
}
