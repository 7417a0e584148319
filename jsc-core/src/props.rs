//! Attribute Store
//!
//! Component configuration arrives as attributes. Scalars are stored as-is,
//! but structured props (`css`, `events`, `listeners`, `links`, ...) travel
//! as JSON-encoded strings, exactly as a DOM attribute would carry them.
//! This module decodes those strings.
//!
//! Decoding is total: a prop that is absent, not yet populated, or malformed
//! resolves to the caller's fallback instead of failing. A broken prop should
//! render as "nothing configured", never abort the render.

use serde::de::DeserializeOwned;
use serde_json::Value;

/// Parse a JSON-encoded prop, returning `fallback` when `raw` is absent or
/// malformed.
pub fn get_prop(raw: Option<&str>, fallback: Value) -> Value {
    let Some(raw) = raw else {
        return fallback;
    };

    match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(err) => {
            tracing::debug!(error = %err, "malformed prop, using fallback");
            fallback
        }
    }
}

/// Typed variant of [`get_prop`].
///
/// A prop that parses as JSON but does not fit `T` also yields the fallback.
pub fn get_prop_as<T: DeserializeOwned>(raw: Option<&str>, fallback: T) -> T {
    let Some(raw) = raw else {
        return fallback;
    };

    match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(err) => {
            tracing::debug!(error = %err, "prop does not match expected shape, using fallback");
            fallback
        }
    }
}

/// Decode a stored attribute that is expected to hold JSON-encoded data.
///
/// Encoded attributes are always stored as strings; anything else is treated
/// like a malformed prop.
pub fn decode_attribute(value: Option<&Value>, fallback: Value) -> Value {
    match value {
        Some(Value::String(raw)) => get_prop(Some(raw), fallback),
        Some(Value::Null) | None => fallback,
        Some(other) => {
            tracing::debug!(value = %other, "encoded attribute is not a string, using fallback");
            fallback
        }
    }
}

/// JSON-stringify a value bound for a string-encoded attribute.
///
/// Strings pass through untouched so already-encoded props are not
/// double-encoded.
pub fn encode_attribute(value: Value) -> Value {
    match value {
        Value::String(_) => value,
        other => Value::String(other.to_string()),
    }
}

/// Read a scalar attribute as display text.
pub(crate) fn attribute_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}
