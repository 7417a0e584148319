//! Kind Table
//!
//! Every component kind has exactly one rendering strategy, described by a
//! [`KindSpec`]: the tag a host creates, which attributes carry
//! string-encoded JSON, the default style, how visible text is derived from
//! attributes, and the methods a listener may call through `$call`.
//!
//! The specs live in a [`KindTable`] built once when the engine starts.
//! Adding a kind or a method is a registration, not a new branch in the
//! renderer or the dispatcher.
//!
//! # Built-in Methods
//!
//! | Kind | Methods |
//! |------|---------|
//! | every kind | `refresh`, `show`, `hide` |
//! | `Button`, `NavLink` | `click` |
//! | `Chip` | `dismiss` |
//! | `Inputbox` | `clear` |

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{json, Map, Value};

use super::ComponentKind;
use crate::document::{Element, ElementId};
use crate::engine::Engine;
use crate::error::{EngineError, Result};
use crate::props::{attribute_text, decode_attribute};

/// Attributes every kind stores as JSON-encoded strings.
pub const COMMON_ENCODED_ATTRIBUTES: [&str; 3] = ["css", "events", "listeners"];

/// A method callable on a live element.
///
/// Methods receive the engine so they can write attributes or emit further
/// dispatches of their own.
pub type MethodFn = Arc<dyn Fn(&mut Engine, ElementId) -> Result<()> + Send + Sync>;

/// Derives an element's visible text from its attributes.
pub type TextFn = fn(&Element) -> Option<String>;

/// Wrap a closure as a [`MethodFn`].
pub fn method<F>(f: F) -> MethodFn
where
    F: Fn(&mut Engine, ElementId) -> Result<()> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Rendering strategy for one component kind.
#[derive(Clone)]
pub struct KindSpec {
    kind: ComponentKind,
    encoded_attributes: Vec<&'static str>,
    default_style: Map<String, Value>,
    text: TextFn,
    methods: HashMap<String, MethodFn>,
}

impl KindSpec {
    /// A spec with no text, no default style and no methods.
    pub fn new(kind: ComponentKind) -> Self {
        Self {
            kind,
            encoded_attributes: Vec::new(),
            default_style: Map::new(),
            text: no_text,
            methods: HashMap::new(),
        }
    }

    /// A spec carrying the methods every kind shares.
    pub fn with_common_methods(kind: ComponentKind) -> Self {
        Self::new(kind)
            .with_method("refresh", method(|engine, id| engine.mark_dirty(id)))
            .with_method("show", method(|engine, id| set_hidden(engine, id, false)))
            .with_method("hide", method(|engine, id| set_hidden(engine, id, true)))
    }

    pub fn kind(&self) -> ComponentKind {
        self.kind
    }

    pub fn tag(&self) -> &'static str {
        self.kind.tag()
    }

    /// Declare an additional kind-specific string-encoded attribute.
    pub fn with_encoded_attribute(mut self, name: &'static str) -> Self {
        self.encoded_attributes.push(name);
        self
    }

    pub fn with_default_style(mut self, property: &str, value: &str) -> Self {
        self.default_style
            .insert(property.to_owned(), Value::String(value.to_owned()));
        self
    }

    pub fn with_text(mut self, text: TextFn) -> Self {
        self.text = text;
        self
    }

    pub fn with_method(mut self, name: impl Into<String>, f: MethodFn) -> Self {
        self.methods.insert(name.into(), f);
        self
    }

    /// Register or replace a method on an existing spec.
    pub fn define_method(&mut self, name: impl Into<String>, f: MethodFn) {
        self.methods.insert(name.into(), f);
    }

    /// Whether values for `attribute` are stored as JSON-encoded strings.
    pub fn is_encoded(&self, attribute: &str) -> bool {
        COMMON_ENCODED_ATTRIBUTES.contains(&attribute)
            || self.encoded_attributes.contains(&attribute)
    }

    pub fn method(&self, name: &str) -> Option<&MethodFn> {
        self.methods.get(name)
    }

    pub fn has_method(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    pub fn default_style(&self) -> &Map<String, Value> {
        &self.default_style
    }

    /// Style for a mounted element: defaults first, then `css` overrides.
    pub fn resolve_style(&self, element: &Element) -> Map<String, Value> {
        let mut style = self.default_style.clone();
        if let Value::Object(overrides) = decode_attribute(element.attribute("css"), json!({})) {
            style.extend(overrides);
        }
        style
    }

    pub fn render_text(&self, element: &Element) -> Option<String> {
        (self.text)(element)
    }
}

impl std::fmt::Debug for KindSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut methods: Vec<_> = self.methods.keys().collect();
        methods.sort();
        f.debug_struct("KindSpec")
            .field("kind", &self.kind)
            .field("encoded_attributes", &self.encoded_attributes)
            .field("methods", &methods)
            .finish()
    }
}

/// Registered kind → strategy table.
#[derive(Debug, Clone, Default)]
pub struct KindTable {
    specs: HashMap<ComponentKind, KindSpec>,
}

impl KindTable {
    /// A table with no kinds registered.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The table with every built-in kind.
    pub fn standard() -> Self {
        let mut table = Self::empty();

        table.register(
            KindSpec::with_common_methods(ComponentKind::App)
                .with_default_style("display", "block")
                .with_default_style("min-height", "100%"),
        );
        table.register(
            KindSpec::with_common_methods(ComponentKind::Navbar)
                .with_encoded_attribute("links")
                .with_default_style("display", "flex")
                .with_default_style("align-items", "center"),
        );
        table.register(
            KindSpec::with_common_methods(ComponentKind::NavLink)
                .with_text(label_text)
                .with_method("click", method(|engine, id| engine.dispatch_event(id, "click"))),
        );
        table.register(
            KindSpec::with_common_methods(ComponentKind::Container)
                .with_default_style("box-sizing", "border-box")
                .with_default_style("margin", "0 auto"),
        );
        table.register(
            KindSpec::with_common_methods(ComponentKind::Row)
                .with_default_style("display", "flex")
                .with_default_style("flex-direction", "row"),
        );
        table.register(
            KindSpec::with_common_methods(ComponentKind::Column)
                .with_default_style("display", "flex")
                .with_default_style("flex-direction", "column"),
        );
        table.register(
            KindSpec::with_common_methods(ComponentKind::Card)
                .with_default_style("box-sizing", "border-box")
                .with_default_style("overflow-x", "auto"),
        );
        table.register(
            KindSpec::with_common_methods(ComponentKind::Button)
                .with_text(label_text)
                .with_method("click", method(|engine, id| engine.dispatch_event(id, "click"))),
        );
        table.register(KindSpec::with_common_methods(ComponentKind::Text).with_text(value_text));
        table.register(
            KindSpec::with_common_methods(ComponentKind::Chip)
                .with_text(label_text)
                .with_method("dismiss", method(|engine, id| set_hidden(engine, id, true))),
        );
        table.register(KindSpec::with_common_methods(ComponentKind::Divider));
        table.register(
            KindSpec::with_common_methods(ComponentKind::Breadcrumbs)
                .with_encoded_attribute("links")
                .with_text(breadcrumbs_text),
        );
        table.register(
            KindSpec::with_common_methods(ComponentKind::Inputbox)
                .with_text(input_text)
                .with_method(
                    "clear",
                    method(|engine, id| engine.set_attribute(id, "value", json!(""))),
                ),
        );

        table
    }

    /// Register a spec, returning the one it replaced.
    pub fn register(&mut self, spec: KindSpec) -> Option<KindSpec> {
        self.specs.insert(spec.kind(), spec)
    }

    pub fn get(&self, kind: ComponentKind) -> Option<&KindSpec> {
        self.specs.get(&kind)
    }

    pub fn get_mut(&mut self, kind: ComponentKind) -> Option<&mut KindSpec> {
        self.specs.get_mut(&kind)
    }

    /// Resolve a wire kind name to its registered spec.
    pub fn resolve(&self, name: &str) -> Result<&KindSpec> {
        let kind: ComponentKind = name.parse()?;
        self.specs
            .get(&kind)
            .ok_or_else(|| EngineError::UnknownComponentKind(name.to_owned()))
    }

    /// Register or replace a method on a registered kind.
    ///
    /// Returns `false` if the kind is not in the table.
    pub fn define_method(
        &mut self,
        kind: ComponentKind,
        name: impl Into<String>,
        f: MethodFn,
    ) -> bool {
        match self.specs.get_mut(&kind) {
            Some(spec) => {
                spec.define_method(name, f);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

fn set_hidden(engine: &mut Engine, id: ElementId, hidden: bool) -> Result<()> {
    engine.set_attribute(id, "hidden", json!(hidden))
}

// ----------------------------------------------------------------------------
// Text strategies
// ----------------------------------------------------------------------------

fn no_text(_: &Element) -> Option<String> {
    None
}

fn label_text(element: &Element) -> Option<String> {
    attribute_text(element.attribute("label"))
}

fn value_text(element: &Element) -> Option<String> {
    attribute_text(element.attribute("value"))
}

fn input_text(element: &Element) -> Option<String> {
    attribute_text(element.attribute("value"))
        .filter(|value| !value.is_empty())
        .or_else(|| attribute_text(element.attribute("placeholder")))
}

fn breadcrumbs_text(element: &Element) -> Option<String> {
    let Value::Array(links) = decode_attribute(element.attribute("links"), json!([])) else {
        return None;
    };

    let labels: Vec<String> = links
        .iter()
        .filter_map(|link| match link {
            Value::String(label) => Some(label.clone()),
            Value::Object(link) => attribute_text(link.get("label")),
            _ => None,
        })
        .collect();

    if labels.is_empty() {
        None
    } else {
        Some(labels.join(" / "))
    }
}
