//! Recorded host mutations.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::RenderHost;
use crate::component::ComponentKind;
use crate::document::ElementId;
use crate::error::Result;

/// One host-level mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Patch {
    Create {
        id: ElementId,
        kind: ComponentKind,
        tag: String,
    },
    SetAttribute {
        id: ElementId,
        name: String,
        value: Value,
    },
    AppendToSlot {
        parent: ElementId,
        slot: String,
        child: ElementId,
    },
    InvokeMethod {
        id: ElementId,
        method: String,
    },
    Remove {
        id: ElementId,
    },
}

impl Patch {
    /// Replay this patch on another host.
    pub fn apply_to(&self, host: &mut dyn RenderHost) {
        match self {
            Patch::Create { id, kind, tag } => host.create(*id, *kind, tag),
            Patch::SetAttribute { id, name, value } => host.set_attribute(*id, name, value),
            Patch::AppendToSlot {
                parent,
                slot,
                child,
            } => host.append_to_slot(*parent, slot, *child),
            Patch::InvokeMethod { id, method } => host.invoke_method(*id, method),
            Patch::Remove { id } => host.remove(*id),
        }
    }
}

/// A host that records every mutation as a [`Patch`].
///
/// Clones share the same buffer, so a recorder handed to the engine can be
/// drained from outside it.
#[derive(Debug, Clone, Default)]
pub struct PatchRecorder {
    patches: Arc<Mutex<Vec<Patch>>>,
}

impl PatchRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the recorded patches.
    pub fn patches(&self) -> Vec<Patch> {
        self.patches.lock().clone()
    }

    /// Take the recorded patches, leaving the buffer empty.
    pub fn drain(&self) -> Vec<Patch> {
        std::mem::take(&mut *self.patches.lock())
    }

    pub fn len(&self) -> usize {
        self.patches.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.patches.lock().is_empty()
    }

    /// Drain the buffer and encode it as MessagePack.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let patches = self.drain();
        Ok(rmp_serde::to_vec_named(&patches)?)
    }

    fn record(&self, patch: Patch) {
        self.patches.lock().push(patch);
    }
}

impl RenderHost for PatchRecorder {
    fn create(&mut self, id: ElementId, kind: ComponentKind, tag: &str) {
        self.record(Patch::Create {
            id,
            kind,
            tag: tag.to_owned(),
        });
    }

    fn set_attribute(&mut self, id: ElementId, name: &str, value: &Value) {
        self.record(Patch::SetAttribute {
            id,
            name: name.to_owned(),
            value: value.clone(),
        });
    }

    fn append_to_slot(&mut self, parent: ElementId, slot: &str, child: ElementId) {
        self.record(Patch::AppendToSlot {
            parent,
            slot: slot.to_owned(),
            child,
        });
    }

    fn invoke_method(&mut self, id: ElementId, method: &str) {
        self.record(Patch::InvokeMethod {
            id,
            method: method.to_owned(),
        });
    }

    fn remove(&mut self, id: ElementId) {
        self.record(Patch::Remove { id });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn clones_share_the_buffer() {
        let recorder = PatchRecorder::new();
        let mut host = recorder.clone();
        host.create(ElementId::from(0), ComponentKind::Row, "jsc-row");
        host.set_attribute(ElementId::from(0), "name", &json!("toolbar"));

        assert_eq!(recorder.len(), 2);
        assert_eq!(
            recorder.patches()[0],
            Patch::Create {
                id: ElementId::from(0),
                kind: ComponentKind::Row,
                tag: "jsc-row".into()
            }
        );
    }

    #[test]
    fn drain_empties_the_buffer() {
        let recorder = PatchRecorder::new();
        recorder.clone().remove(ElementId::from(3));
        assert_eq!(recorder.drain(), vec![Patch::Remove { id: ElementId::from(3) }]);
        assert!(recorder.is_empty());
    }

    #[test]
    fn replay_onto_another_host() {
        let source = PatchRecorder::new();
        let mut host = source.clone();
        host.create(ElementId::from(1), ComponentKind::Chip, "jsc-chip");
        host.invoke_method(ElementId::from(1), "dismiss");

        let mirror = PatchRecorder::new();
        let mut mirror_host = mirror.clone();
        for patch in source.patches() {
            patch.apply_to(&mut mirror_host);
        }
        assert_eq!(mirror.patches(), source.patches());
    }

    #[test]
    fn encode_produces_decodable_msgpack() {
        let recorder = PatchRecorder::new();
        let mut host = recorder.clone();
        host.append_to_slot(ElementId::from(0), "children", ElementId::from(1));

        let bytes = recorder.encode().unwrap();
        assert!(!bytes.is_empty());
        assert!(recorder.is_empty());

        let decoded: Vec<Patch> = rmp_serde::from_slice(&bytes).unwrap();
        assert_eq!(
            decoded,
            vec![Patch::AppendToSlot {
                parent: ElementId::from(0),
                slot: "children".into(),
                child: ElementId::from(1)
            }]
        );
    }
}
