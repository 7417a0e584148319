//! JSC Core
//!
//! This crate provides the runtime composition engine for Jaseci UI
//! components. Components are not wired by hand: a graph-execution backend
//! sends a JSON tree, and the engine turns it into live elements that find
//! each other by name and trigger each other through declarative listeners.
//!
//! It implements:
//!
//! - An attribute store that decodes JSON-encoded props with safe fallbacks
//! - A name registry through which components resolve each other
//! - Operations binding from an externally populated table
//! - Event wiring from native events to dispatch targets
//! - The `"component.listener"` dispatch protocol
//! - A tree renderer driven by a registered kind table
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `props`: attribute decoding
//! - `registry`: name → element index
//! - `operations`: operations payload lookup
//! - `events`: native event bindings
//! - `dispatch`: target parsing and effect decoding
//! - `component`: tree description and kind table
//! - `document`: the live element tree
//! - `render`: rendering host interface and patch recording
//! - `engine`: the context object tying everything together
//!
//! # Example
//!
//! ```rust,ignore
//! use jsc_core::{Engine, EngineConfig};
//!
//! let mut engine = Engine::new(EngineConfig::default());
//! engine.render_json(r#"{
//!     "component": "Row",
//!     "props": {},
//!     "slots": {"children": [
//!         {"component": "Button", "props": {
//!             "name": "save",
//!             "label": "Save",
//!             "events": {"click": "status.saved"}
//!         }},
//!         {"component": "Text", "props": {
//!             "name": "status",
//!             "listeners": {"saved": {"value": "Saved!"}}
//!         }}
//!     ]}
//! }"#)?;
//!
//! engine.dispatch_event_by_name("save", "click")?;
//! assert_eq!(engine.element_by_name("status").unwrap().text(), Some("Saved!"));
//! ```

pub mod component;
pub mod config;
pub mod dispatch;
pub mod document;
pub mod engine;
pub mod error;
pub mod events;
pub mod operations;
pub mod props;
pub mod registry;
pub mod render;

#[cfg(feature = "python")]
mod python;

pub use component::{ComponentKind, JaseciComponent, KindSpec, KindTable};
pub use config::{DuplicateNamePolicy, EngineConfig};
pub use dispatch::{Effect, Target};
pub use document::{Element, ElementId, ElementSnapshot};
pub use engine::Engine;
pub use error::EngineError;
pub use operations::{OperationsProvider, OperationsTable};
pub use props::get_prop;
pub use render::{NullHost, Patch, PatchRecorder, RenderHost};

#[cfg(feature = "python")]
use pyo3::prelude::*;

/// Python module definition.
///
/// This function is called by Python when importing the module.
/// It registers all Python-exposed types and functions.
#[cfg(feature = "python")]
#[pymodule]
fn _core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<python::PyEngine>()?;

    // Add version info
    m.add("__version__", env!("CARGO_PKG_VERSION"))?;

    Ok(())
}
