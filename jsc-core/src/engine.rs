//! Engine
//!
//! The engine is the one long-lived context object of the composition
//! runtime. It owns the live element tree, the name registry, the kind table
//! and the rendering host, and it is passed explicitly to everything that
//! needs them: the renderer, the dispatcher, and the methods listeners call.
//!
//! # Lifecycle
//!
//! 1. [`Engine::render`] validates a component tree and materializes it as a
//!    detached subtree, creating each element through the host, applying its
//!    props and appending its slot children in order.
//!
//! 2. [`Engine::mount`] attaches the subtree: declared names are registered,
//!    then every element (children before parents) resolves its style,
//!    wires its events and binds its operations payload.
//!
//! 3. The host reports native events through [`Engine::dispatch_event`],
//!    which emits the bound targets. [`Engine::emit`] resolves the target by
//!    name and applies its listener's effects.
//!
//! 4. Attribute writes mark elements dirty. [`Engine::flush`] runs the
//!    re-render cycle; by default it runs when the outermost dispatch returns.
//!
//! # Re-entrancy
//!
//! A method invoked through `$call` receives `&mut Engine` and may emit
//! again. Nested dispatch is bounded by `EngineConfig::max_dispatch_depth`,
//! which turns a listener cycle into a `DispatchDepthExceeded` error instead
//! of unbounded recursion. The outermost `emit` is never refused.

use std::collections::HashSet;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;
use smallvec::SmallVec;

use crate::component::{ComponentKind, JaseciComponent, KindTable, MethodFn};
use crate::config::{DuplicateNamePolicy, EngineConfig};
use crate::dispatch::{listener_effects, Effect, Target, LISTENERS_ATTRIBUTE};
use crate::document::{Document, Element, ElementId};
use crate::error::{EngineError, Result};
use crate::events::set_up_events;
use crate::operations::{get_operations, OperationsProvider, OperationsTable};
use crate::props::{attribute_text, encode_attribute};
use crate::registry::ComponentRegistry;
use crate::render::{NullHost, RenderHost};

/// The composition runtime.
pub struct Engine {
    config: EngineConfig,
    document: Document,
    registry: ComponentRegistry,
    kinds: KindTable,
    operations: Arc<dyn OperationsProvider>,
    host: Box<dyn RenderHost>,
    dispatch_depth: usize,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Engine {
    /// Create an engine with the standard kinds, an empty operations table
    /// and a host that draws nothing.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            document: Document::new(),
            registry: ComponentRegistry::new(),
            kinds: KindTable::standard(),
            operations: Arc::new(OperationsTable::new()),
            host: Box::new(NullHost),
            dispatch_depth: 0,
        }
    }

    pub fn with_host(mut self, host: impl RenderHost + 'static) -> Self {
        self.host = Box::new(host);
        self
    }

    pub fn with_operations(mut self, operations: Arc<dyn OperationsProvider>) -> Self {
        self.operations = operations;
        self
    }

    pub fn with_kinds(mut self, kinds: KindTable) -> Self {
        self.kinds = kinds;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    pub fn kinds(&self) -> &KindTable {
        &self.kinds
    }

    pub fn kinds_mut(&mut self) -> &mut KindTable {
        &mut self.kinds
    }

    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.document.get(id)
    }

    /// Register or replace a method callable through `$call` on every
    /// element of `kind`.
    pub fn define_method<F>(&mut self, kind: ComponentKind, name: impl Into<String>, f: F) -> bool
    where
        F: Fn(&mut Engine, ElementId) -> Result<()> + Send + Sync + 'static,
    {
        let f: MethodFn = Arc::new(f);
        self.kinds.define_method(kind, name, f)
    }

    // ------------------------------------------------------------------------
    // Rendering
    // ------------------------------------------------------------------------

    /// Materialize `node` as a detached subtree and return its root.
    ///
    /// The whole tree is validated first: an unknown kind anywhere fails the
    /// call before anything is created.
    pub fn render(&mut self, node: &JaseciComponent) -> Result<ElementId> {
        self.validate(node)?;
        let fallback_name = self.kinds.resolve(&node.component)?.tag().to_owned();
        self.build(node, fallback_name)
    }

    /// Render `node` and mount the result.
    pub fn render_and_mount(&mut self, node: &JaseciComponent) -> Result<ElementId> {
        let root = self.render(node)?;
        if let Err(err) = self.mount(root) {
            self.discard(root);
            return Err(err);
        }
        Ok(root)
    }

    /// Parse a component tree from JSON, render it and mount it.
    pub fn render_json(&mut self, json: &str) -> Result<ElementId> {
        let node = JaseciComponent::from_json(json)?;
        self.render_and_mount(&node)
    }

    fn validate(&self, node: &JaseciComponent) -> Result<()> {
        self.kinds.resolve(&node.component)?;
        for child in node.slots.values().flatten() {
            self.validate(child)?;
        }
        Ok(())
    }

    fn build(&mut self, node: &JaseciComponent, fallback_name: String) -> Result<ElementId> {
        let spec = self.kinds.resolve(&node.component)?;
        let kind = spec.kind();

        let declared = node
            .props
            .get("name")
            .and_then(|name| attribute_text(Some(name)));
        let declared_name = declared.is_some();
        let name = declared.unwrap_or(fallback_name);

        let attributes: IndexMap<String, Value> = node
            .props
            .iter()
            .map(|(key, value)| {
                let value = if spec.is_encoded(key) {
                    encode_attribute(value.clone())
                } else {
                    value.clone()
                };
                (key.clone(), value)
            })
            .collect();

        let id = self.document.insert(kind, name.clone());
        self.host.create(id, kind, spec.tag());
        for (key, value) in &attributes {
            self.host.set_attribute(id, key, value);
        }

        if let Some(element) = self.document.get_mut(id) {
            element.declared_name = declared_name;
            element.attributes = attributes;
            let text = spec.render_text(element);
            element.mark_rendered(text);
        }

        for (slot, children) in &node.slots {
            for (index, child) in children.iter().enumerate() {
                let child_id = self.build(child, format!("{name}/{slot}/{index}"))?;
                self.document.append_child(id, slot, child_id)?;
                self.host.append_to_slot(id, slot, child_id);
            }
        }

        tracing::trace!(component = %name, %kind, %id, "rendered");
        Ok(id)
    }

    /// Drop a subtree that never made it into the registry.
    fn discard(&mut self, root: ElementId) {
        if let Ok(removed) = self.document.remove_subtree(root) {
            for element in removed {
                self.host.remove(element.id());
            }
        }
    }

    // ------------------------------------------------------------------------
    // Mounting
    // ------------------------------------------------------------------------

    /// Attach a rendered subtree.
    ///
    /// Registers every declared name, then runs the load hook of each
    /// element, children first: style resolution, event wiring and
    /// operations binding. Elements that are already mounted are skipped.
    /// Elements without a `name` prop keep their tree-assigned name for
    /// display but are not registered, so nothing can resolve them.
    ///
    /// Under the reject policy a clash between declared names fails the
    /// mount before anything is registered.
    pub fn mount(&mut self, root: ElementId) -> Result<()> {
        if !self.document.contains(root) {
            return Err(EngineError::UnknownElement(root));
        }

        let pending: Vec<ElementId> = self
            .document
            .subtree(root)
            .into_iter()
            .filter(|id| self.document.get(*id).is_some_and(|element| !element.is_mounted()))
            .collect();

        self.check_names(&pending)?;
        for id in &pending {
            if let Some(element) = self.document.get(*id) {
                if element.has_declared_name() {
                    self.registry.register(element.name(), *id, self.config.duplicate_names)?;
                }
            }
        }

        for id in self.document.subtree_post_order(root) {
            if self.document.get(id).is_some_and(|element| !element.is_mounted()) {
                self.did_load(id);
            }
        }
        Ok(())
    }

    fn check_names(&self, pending: &[ElementId]) -> Result<()> {
        let policy = self.config.duplicate_names;
        let mut seen: HashSet<&str> = HashSet::with_capacity(pending.len());
        for id in pending {
            let Some(element) = self.document.get(*id) else {
                continue;
            };
            if !element.has_declared_name() {
                continue;
            }
            self.registry.check(element.name(), *id, policy)?;
            if !seen.insert(element.name()) && policy == DuplicateNamePolicy::Reject {
                return Err(EngineError::DuplicateName(element.name().to_owned()));
            }
        }
        Ok(())
    }

    fn did_load(&mut self, id: ElementId) {
        let Some(element) = self.document.get_mut(id) else {
            return;
        };

        if let Some(spec) = self.kinds.get(element.kind()) {
            element.style = spec.resolve_style(element);
        }

        let events = element
            .attribute("events")
            .and_then(Value::as_str)
            .map(str::to_owned);
        set_up_events(element, events.as_deref());

        element.operations = get_operations(self.operations.as_ref(), element.name());
        element.mounted = true;
    }

    /// Remove an element and its descendants from the document.
    pub fn unmount(&mut self, id: ElementId) -> Result<()> {
        let removed = self.document.remove_subtree(id)?;
        for element in removed {
            if element.is_mounted() && element.has_declared_name() {
                self.registry.unregister(element.name(), element.id());
            }
            self.host.remove(element.id());
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Resolution
    // ------------------------------------------------------------------------

    /// The mounted element named `name`, if any.
    pub fn get_component_by_name(&self, name: &str) -> Option<ElementId> {
        self.registry
            .resolve(name)
            .filter(|id| self.document.contains(*id))
    }

    pub fn element_by_name(&self, name: &str) -> Option<&Element> {
        self.get_component_by_name(name)
            .and_then(|id| self.document.get(id))
    }

    // ------------------------------------------------------------------------
    // Mutation
    // ------------------------------------------------------------------------

    /// Write an attribute on a live element and mark it for re-render.
    ///
    /// Values for string-encoded attributes are JSON-stringified. Writing
    /// `name` re-indexes a mounted element under its new name.
    pub fn set_attribute(&mut self, id: ElementId, name: &str, value: Value) -> Result<()> {
        let element = self
            .document
            .get(id)
            .ok_or(EngineError::UnknownElement(id))?;

        let value = match self.kinds.get(element.kind()) {
            Some(spec) if spec.is_encoded(name) => encode_attribute(value),
            _ => value,
        };

        if name == "name" {
            if let Some(new_name) = attribute_text(Some(&value)) {
                self.rename(id, new_name)?;
            }
        }

        if let Some(element) = self.document.get_mut(id) {
            element.attributes.insert(name.to_owned(), value.clone());
            element.mark_dirty();
        }
        self.host.set_attribute(id, name, &value);
        Ok(())
    }

    fn rename(&mut self, id: ElementId, new_name: String) -> Result<()> {
        let Some(element) = self.document.get(id) else {
            return Err(EngineError::UnknownElement(id));
        };
        if element.has_declared_name() && element.name() == new_name {
            return Ok(());
        }

        if element.is_mounted() {
            self.registry.check(&new_name, id, self.config.duplicate_names)?;
            if element.has_declared_name() {
                self.registry.unregister(element.name(), id);
            }
            self.registry.register(&new_name, id, self.config.duplicate_names)?;
        }

        if let Some(element) = self.document.get_mut(id) {
            element.set_name(new_name);
        }
        Ok(())
    }

    /// Mark an element for re-render without changing it.
    pub fn mark_dirty(&mut self, id: ElementId) -> Result<()> {
        self.document
            .get_mut(id)
            .ok_or(EngineError::UnknownElement(id))?
            .mark_dirty();
        Ok(())
    }

    /// Invoke a method from the element's kind table.
    pub fn invoke(&mut self, id: ElementId, method: &str) -> Result<()> {
        let element = self
            .document
            .get(id)
            .ok_or(EngineError::UnknownElement(id))?;

        let handler = self
            .kinds
            .get(element.kind())
            .and_then(|spec| spec.method(method))
            .cloned()
            .ok_or_else(|| EngineError::MethodNotFound {
                component: element.name().to_owned(),
                method: method.to_owned(),
            })?;

        self.host.invoke_method(id, method);
        handler(self, id)
    }

    /// Run the re-render cycle for every dirty element, in document order.
    ///
    /// Returns the number of elements rendered.
    pub fn flush(&mut self) -> usize {
        let dirty = self.document.dirty();
        for id in &dirty {
            let Some(element) = self.document.get_mut(*id) else {
                continue;
            };
            let text = self
                .kinds
                .get(element.kind())
                .and_then(|spec| spec.render_text(element));
            element.mark_rendered(text);
        }
        dirty.len()
    }

    // ------------------------------------------------------------------------
    // Dispatch
    // ------------------------------------------------------------------------

    /// Apply the listener named by `target_listener` to its component.
    ///
    /// A target whose component is not mounted, or whose listener is not
    /// declared, is a no-op. Method lookup failures propagate.
    pub fn emit(&mut self, target_listener: &str) -> Result<()> {
        let target = Target::parse(target_listener);

        if self.dispatch_depth > 0 && self.dispatch_depth >= self.config.max_dispatch_depth {
            return Err(EngineError::DispatchDepthExceeded {
                target: target_listener.to_owned(),
                limit: self.config.max_dispatch_depth,
            });
        }

        self.dispatch_depth += 1;
        let result = self.apply_listener(&target);
        self.dispatch_depth -= 1;

        if self.dispatch_depth == 0 && self.config.auto_flush {
            self.flush();
        }
        result
    }

    fn apply_listener(&mut self, target: &Target<'_>) -> Result<()> {
        let Some(id) = self.get_component_by_name(target.component()) else {
            tracing::debug!(%target, "dispatch target is not mounted");
            return Ok(());
        };
        let Some(listener) = target.listener() else {
            return Ok(());
        };

        let element = self
            .document
            .get(id)
            .ok_or(EngineError::UnknownElement(id))?;
        let effects = listener_effects(
            element.attribute(LISTENERS_ATTRIBUTE),
            element.name(),
            listener,
        )?;
        tracing::trace!(%target, effects = effects.len(), depth = self.dispatch_depth, "emit");

        for effect in effects {
            if !self.document.contains(id) {
                tracing::warn!(%target, "dispatch target removed while applying its effects");
                break;
            }
            match effect {
                Effect::AttributeWrite { name, value } => self.set_attribute(id, &name, value)?,
                Effect::MethodCall { method } => self.invoke(id, &method)?,
            }
        }
        Ok(())
    }

    /// Deliver a native event reported by the host for element `id`.
    pub fn dispatch_event(&mut self, id: ElementId, event: &str) -> Result<()> {
        let element = self
            .document
            .get(id)
            .ok_or(EngineError::UnknownElement(id))?;
        let targets: SmallVec<[String; 2]> = element
            .bindings()
            .targets(event)
            .map(str::to_owned)
            .collect();

        for target in targets {
            self.emit(&target)?;
        }
        Ok(())
    }

    /// Deliver a native event to the mounted element named `name`.
    ///
    /// Events for names that are not mounted are dropped.
    pub fn dispatch_event_by_name(&mut self, name: &str, event: &str) -> Result<()> {
        match self.get_component_by_name(name) {
            Some(id) => self.dispatch_event(id, event),
            None => Ok(()),
        }
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("elements", &self.document.len())
            .field("names", &self.registry.len())
            .field("dispatch_depth", &self.dispatch_depth)
            .finish()
    }
}
