//! Rendering Host
//!
//! The engine keeps its own live element tree, but something else draws it:
//! a DOM bridge, a terminal renderer, a process on the other end of a socket.
//! That collaborator is a [`RenderHost`]. The engine calls it for every
//! structural mutation, in the order the mutations happen:
//!
//! - `create` when the renderer materializes an element,
//! - `set_attribute` for every prop applied and every attribute write,
//! - `append_to_slot` when a child is placed into a parent's slot,
//! - `invoke_method` before a listener's `$call` method runs,
//! - `remove` when an element subtree is unmounted.
//!
//! [`NullHost`] ignores everything. [`PatchRecorder`] records the calls as
//! [`Patch`] values that can be shipped elsewhere as MessagePack.

mod patch;

pub use patch::{Patch, PatchRecorder};

use serde_json::Value;

use crate::component::ComponentKind;
use crate::document::ElementId;

/// Element creation and mutation primitives of a rendering backend.
pub trait RenderHost {
    fn create(&mut self, id: ElementId, kind: ComponentKind, tag: &str);

    fn set_attribute(&mut self, id: ElementId, name: &str, value: &Value);

    fn append_to_slot(&mut self, parent: ElementId, slot: &str, child: ElementId);

    fn invoke_method(&mut self, id: ElementId, method: &str);

    fn remove(&mut self, _id: ElementId) {}
}

/// A host that draws nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullHost;

impl RenderHost for NullHost {
    fn create(&mut self, _id: ElementId, _kind: ComponentKind, _tag: &str) {}

    fn set_attribute(&mut self, _id: ElementId, _name: &str, _value: &Value) {}

    fn append_to_slot(&mut self, _parent: ElementId, _slot: &str, _child: ElementId) {}

    fn invoke_method(&mut self, _id: ElementId, _method: &str) {}
}
