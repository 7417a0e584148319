//! Engine Errors
//!
//! Only structural authoring errors surface as `EngineError`. Malformed
//! prop, event or listener JSON and dispatches to components that are not
//! mounted are recovered where they happen and never reach the caller.

use thiserror::Error;

use crate::document::ElementId;

/// Errors surfaced by rendering, mounting and dispatch.
#[derive(Error, Debug)]
pub enum EngineError {
    /// A tree node names a kind the kind table does not know.
    #[error("unknown component kind `{0}`")]
    UnknownComponentKind(String),

    /// A `$call` entry names a method the target's kind does not expose.
    #[error("component `{component}` has no method `{method}`")]
    MethodNotFound { component: String, method: String },

    /// A `$call` value that is not a list of `{"method": "..."}` entries.
    #[error("listener `{listener}` on `{component}` has a malformed `$call` list")]
    MalformedCallList { component: String, listener: String },

    /// Re-entrant emission nested deeper than the configured limit.
    #[error("dispatch depth limit of {limit} exceeded while emitting `{target}`")]
    DispatchDepthExceeded { target: String, limit: usize },

    /// A second element claimed a name under the reject policy.
    #[error("component name `{0}` is already mounted")]
    DuplicateName(String),

    /// The id does not refer to an element in the document.
    #[error("no element with id {0}")]
    UnknownElement(ElementId),

    /// The component tree or configuration is not valid JSON for its schema.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Patches could not be encoded for transport.
    #[error("patch encoding failed: {0}")]
    Encode(#[from] rmp_serde::encode::Error),
}

/// Result alias used throughout the engine.
pub type Result<T, E = EngineError> = std::result::Result<T, E>;
