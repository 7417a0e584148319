//! Event Wiring
//!
//! A component declares which of its native events should trigger which
//! dispatch target through its `events` attribute:
//!
//! ```json
//! {"click": "sidebar.toggle", "change": "results.reload"}
//! ```
//!
//! At mount, [`set_up_events`] turns that descriptor into [`EventBindings`]
//! on the element. When the host later reports a native event, the engine
//! emits every target bound to that event name, in binding order.

use serde_json::{json, Value};
use smallvec::SmallVec;

use crate::document::Element;
use crate::props::get_prop;

/// Native event → dispatch target bindings of one element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventBindings {
    bindings: SmallVec<[(String, String); 2]>,
}

impl EventBindings {
    /// Bind `target` to fire when `event` occurs.
    pub fn bind(&mut self, event: impl Into<String>, target: impl Into<String>) {
        self.bindings.push((event.into(), target.into()));
    }

    /// Targets bound to `event`, in binding order.
    pub fn targets<'a>(&'a self, event: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.bindings
            .iter()
            .filter(move |(bound, _)| bound == event)
            .map(|(_, target)| target.as_str())
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// Wire the `events` descriptor of `host`.
///
/// Malformed or absent descriptors wire nothing. Entries whose target is not
/// a string are skipped. Calling this again adds the bindings a second time;
/// nothing is unwired.
pub fn set_up_events(host: &mut Element, events_json: Option<&str>) {
    let Value::Object(events) = get_prop(events_json, json!({})) else {
        tracing::debug!(component = host.name(), "events descriptor is not a mapping");
        return;
    };

    for (event, target) in events {
        match target {
            Value::String(target) => host.bindings.bind(event, target),
            other => {
                tracing::warn!(
                    component = host.name(),
                    event = %event,
                    target = %other,
                    "ignoring event binding with a non-string target"
                );
            }
        }
    }
}
