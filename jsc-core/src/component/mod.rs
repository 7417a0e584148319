//! Component Trees
//!
//! This module defines the wire description of a backend-authored UI tree
//! and the closed set of component kinds the engine can materialize.
//!
//! # Tree Shape
//!
//! A tree node names its kind, carries a flat prop mapping, and optionally a
//! set of named slots, each holding an ordered list of child nodes:
//!
//! ```json
//! {
//!   "component": "Row",
//!   "props": {"name": "toolbar"},
//!   "slots": {
//!     "children": [
//!       {"component": "NavLink", "props": {"label": "Home"}}
//!     ]
//!   }
//! }
//! ```
//!
//! The `component` field stays a string on the wire. Resolving it against
//! the kind table is the renderer's job, so an unrecognized kind is reported
//! as `UnknownComponentKind` instead of a JSON schema error.

mod kinds;

pub use kinds::{method, KindSpec, KindTable, MethodFn, TextFn, COMMON_ENCODED_ATTRIBUTES};

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::EngineError;

/// One node of a backend-authored UI tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JaseciComponent {
    /// Kind name, e.g. `"Row"`.
    pub component: String,

    /// Props applied as attributes on the live element.
    #[serde(default)]
    pub props: IndexMap<String, Value>,

    /// Named slots, each an ordered list of children.
    #[serde(default)]
    pub slots: IndexMap<String, Vec<JaseciComponent>>,
}

impl JaseciComponent {
    pub fn new(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            props: IndexMap::new(),
            slots: IndexMap::new(),
        }
    }

    /// Parse a tree from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn with_prop(mut self, key: impl Into<String>, value: Value) -> Self {
        self.props.insert(key.into(), value);
        self
    }

    /// Append a child to the named slot.
    pub fn with_child(mut self, slot: impl Into<String>, child: JaseciComponent) -> Self {
        self.slots.entry(slot.into()).or_default().push(child);
        self
    }

    /// Number of nodes in this tree, including the root.
    pub fn node_count(&self) -> usize {
        1 + self
            .slots
            .values()
            .flatten()
            .map(JaseciComponent::node_count)
            .sum::<usize>()
    }
}

/// The closed set of renderable component kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComponentKind {
    App,
    Navbar,
    NavLink,
    Container,
    Row,
    Column,
    Card,
    Button,
    Text,
    Chip,
    Divider,
    Breadcrumbs,
    Inputbox,
}

impl ComponentKind {
    pub const ALL: [ComponentKind; 13] = [
        ComponentKind::App,
        ComponentKind::Navbar,
        ComponentKind::NavLink,
        ComponentKind::Container,
        ComponentKind::Row,
        ComponentKind::Column,
        ComponentKind::Card,
        ComponentKind::Button,
        ComponentKind::Text,
        ComponentKind::Chip,
        ComponentKind::Divider,
        ComponentKind::Breadcrumbs,
        ComponentKind::Inputbox,
    ];

    /// The name used for this kind in component trees.
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentKind::App => "App",
            ComponentKind::Navbar => "Navbar",
            ComponentKind::NavLink => "NavLink",
            ComponentKind::Container => "Container",
            ComponentKind::Row => "Row",
            ComponentKind::Column => "Column",
            ComponentKind::Card => "Card",
            ComponentKind::Button => "Button",
            ComponentKind::Text => "Text",
            ComponentKind::Chip => "Chip",
            ComponentKind::Divider => "Divider",
            ComponentKind::Breadcrumbs => "Breadcrumbs",
            ComponentKind::Inputbox => "Inputbox",
        }
    }

    /// The element tag a host creates for this kind.
    pub fn tag(&self) -> &'static str {
        match self {
            ComponentKind::App => "jsc-app",
            ComponentKind::Navbar => "jsc-nav-bar",
            ComponentKind::NavLink => "jsc-nav-link",
            ComponentKind::Container => "jsc-container",
            ComponentKind::Row => "jsc-row",
            ComponentKind::Column => "jsc-column",
            ComponentKind::Card => "jsc-card",
            ComponentKind::Button => "jsc-button",
            ComponentKind::Text => "jsc-text",
            ComponentKind::Chip => "jsc-chip",
            ComponentKind::Divider => "jsc-divider",
            ComponentKind::Breadcrumbs => "jsc-breadcrumbs",
            ComponentKind::Inputbox => "jsc-inputbox",
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComponentKind {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ComponentKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| EngineError::UnknownComponentKind(s.to_owned()))
    }
}
