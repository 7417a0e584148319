//! Engine Configuration
//!
//! Policies the engine applies where the component protocol itself leaves
//! behavior open: how deep re-entrant dispatch may nest, what happens when
//! two mounted elements share a name, and whether the re-render cycle runs
//! automatically after each dispatch.
//!
//! Configuration is plain data. It can be built in code or read from the
//! same JSON channel the component trees arrive on:
//!
//! ```rust,ignore
//! let config = EngineConfig::from_json(r#"{"max_dispatch_depth": 8}"#)?;
//! let engine = Engine::new(config);
//! ```

use serde::{Deserialize, Serialize};

/// Default nesting limit for re-entrant `emit` calls.
pub const DEFAULT_MAX_DISPATCH_DEPTH: usize = 32;

/// How the registry treats a second element mounted under an existing name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateNamePolicy {
    /// Keep both; lookups resolve to the first one in document order.
    #[default]
    FirstMatch,
    /// Fail the mount with `EngineError::DuplicateName`.
    Reject,
}

/// Engine-wide settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum number of nested `emit` calls in flight at once.
    ///
    /// Only re-entrant emits count against it: an outermost `emit` always
    /// runs, even with a limit of 0.
    pub max_dispatch_depth: usize,

    /// Policy for duplicate component names.
    pub duplicate_names: DuplicateNamePolicy,

    /// Run the re-render cycle when the outermost dispatch returns.
    pub auto_flush: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_dispatch_depth: DEFAULT_MAX_DISPATCH_DEPTH,
            duplicate_names: DuplicateNamePolicy::FirstMatch,
            auto_flush: true,
        }
    }
}

impl EngineConfig {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn with_max_dispatch_depth(mut self, depth: usize) -> Self {
        self.max_dispatch_depth = depth;
        self
    }

    pub fn with_duplicate_names(mut self, policy: DuplicateNamePolicy) -> Self {
        self.duplicate_names = policy;
        self
    }

    pub fn with_auto_flush(mut self, auto_flush: bool) -> Self {
        self.auto_flush = auto_flush;
        self
    }
}
