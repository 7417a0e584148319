//! Dispatch Protocol
//!
//! One component triggers effects on another by emitting a target string of
//! the form `"component.listener"`. The named component carries a listener
//! table in its `listeners` attribute:
//!
//! ```json
//! {
//!   "notify":  {"label": "Saved", "variant": "success"},
//!   "reload":  {"$call": [{"method": "refresh"}]},
//!   "reset":   {"value": "", "$call": [{"method": "refresh"}]}
//! }
//! ```
//!
//! Each listener maps to an effect descriptor. Plain keys are attribute
//! writes. The reserved `$call` key holds a list of methods to invoke with
//! no arguments. Both may appear in one descriptor; everything is applied in
//! key order.
//!
//! # How Dispatch Works
//!
//! 1. Parse the target into component and listener names.
//! 2. Resolve the component through the registry. Unknown names are a no-op.
//! 3. Decode the listener's descriptor into a list of [`Effect`]s.
//! 4. Apply each effect to the target, in order.
//!
//! This module covers steps 1 and 3. Resolution and application live on the
//! engine, which owns the registry and the document.

use std::fmt;

use serde_json::{json, Value};
use smallvec::SmallVec;

use crate::error::{EngineError, Result};
use crate::props::decode_attribute;

/// Attribute holding a component's listener table.
pub const LISTENERS_ATTRIBUTE: &str = "listeners";

/// Reserved descriptor key for method calls.
pub const CALL_KEY: &str = "$call";

/// A parsed `"component.listener"` dispatch target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Target<'a> {
    component: &'a str,
    listener: Option<&'a str>,
}

impl<'a> Target<'a> {
    /// Parse a target string.
    ///
    /// Segments after the second are ignored. A target without a listener
    /// segment parses but selects no effects. The component segment is taken
    /// as written, so `""` is an ordinary name like any other.
    pub fn parse(raw: &'a str) -> Self {
        let mut segments = raw.split('.');
        let component = segments.next().unwrap_or_default();
        let listener = segments.next().filter(|listener| !listener.is_empty());

        Self {
            component,
            listener,
        }
    }

    pub fn component(&self) -> &'a str {
        self.component
    }

    pub fn listener(&self) -> Option<&'a str> {
        self.listener
    }
}

impl fmt::Display for Target<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.listener {
            Some(listener) => write!(f, "{}.{}", self.component, listener),
            None => f.write_str(self.component),
        }
    }
}

/// One effect a listener applies to its component.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Set an attribute on the target.
    AttributeWrite { name: String, value: Value },

    /// Invoke a method on the target with no arguments.
    MethodCall { method: String },
}

/// Effects of one listener, in application order.
pub type EffectList = SmallVec<[Effect; 4]>;

/// Decode the effects of `listener` from a stored `listeners` attribute.
///
/// Malformed tables and unknown listeners decode to no effects. A malformed
/// `$call` list is an authoring error and fails the whole decode. Decoding
/// finishes before anything is applied, so unlike a step-by-step walk of the
/// descriptor, attribute writes that precede the bad `$call` in key order
/// are not applied either.
pub fn listener_effects(
    listeners: Option<&Value>,
    component: &str,
    listener: &str,
) -> Result<EffectList> {
    let table = decode_attribute(listeners, json!({}));
    match table.get(listener) {
        Some(descriptor) => decode_effects(descriptor, component, listener),
        None => {
            tracing::trace!(component, listener, "listener not declared");
            Ok(EffectList::new())
        }
    }
}

/// Decode one effect descriptor.
pub fn decode_effects(descriptor: &Value, component: &str, listener: &str) -> Result<EffectList> {
    let Value::Object(entries) = descriptor else {
        tracing::warn!(component, listener, "listener descriptor is not a mapping, ignoring");
        return Ok(EffectList::new());
    };

    let mut effects = EffectList::new();
    for (key, value) in entries {
        if key == CALL_KEY {
            let malformed = || EngineError::MalformedCallList {
                component: component.to_owned(),
                listener: listener.to_owned(),
            };
            let Value::Array(calls) = value else {
                return Err(malformed());
            };
            for call in calls {
                let method = call
                    .get("method")
                    .and_then(Value::as_str)
                    .ok_or_else(malformed)?;
                effects.push(Effect::MethodCall {
                    method: method.to_owned(),
                });
            }
        } else {
            effects.push(Effect::AttributeWrite {
                name: key.clone(),
                value: value.clone(),
            });
        }
    }
    Ok(effects)
}
