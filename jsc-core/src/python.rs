//! Python-exposed engine.
//!
//! The engine holds a boxed rendering host and is not `Send`, so the class
//! is `unsendable`: it stays on the thread that created it, which matches the
//! single-threaded UI model anyway.

use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;

use crate::config::EngineConfig;
use crate::engine::Engine;
use crate::error::EngineError;
use crate::render::PatchRecorder;

fn to_py_err(err: EngineError) -> PyErr {
    match err {
        EngineError::Json(_) | EngineError::UnknownComponentKind(_) => {
            PyValueError::new_err(err.to_string())
        }
        other => PyRuntimeError::new_err(other.to_string()),
    }
}

#[pyclass(name = "Engine", unsendable)]
pub struct PyEngine {
    engine: Engine,
    patches: PatchRecorder,
}

#[pymethods]
impl PyEngine {
    /// Create an engine, optionally from a JSON configuration.
    #[new]
    #[pyo3(signature = (config_json=None))]
    fn new(config_json: Option<&str>) -> PyResult<Self> {
        let config = match config_json {
            Some(json) => EngineConfig::from_json(json)
                .map_err(|e| PyValueError::new_err(format!("config parse error: {}", e)))?,
            None => EngineConfig::default(),
        };
        let patches = PatchRecorder::new();
        let engine = Engine::new(config).with_host(patches.clone());
        Ok(Self { engine, patches })
    }

    /// Render and mount a component tree; returns the root element id.
    fn render_json(&mut self, json: &str) -> PyResult<u64> {
        self.engine
            .render_json(json)
            .map(|id| id.raw())
            .map_err(to_py_err)
    }

    fn emit(&mut self, target: &str) -> PyResult<()> {
        self.engine.emit(target).map_err(to_py_err)
    }

    fn dispatch_event(&mut self, name: &str, event: &str) -> PyResult<()> {
        self.engine
            .dispatch_event_by_name(name, event)
            .map_err(to_py_err)
    }

    /// An attribute of the named component, as JSON text.
    fn attribute(&self, name: &str, attribute: &str) -> Option<String> {
        self.engine
            .element_by_name(name)
            .and_then(|element| element.attribute(attribute))
            .map(|value| value.to_string())
    }

    fn text(&self, name: &str) -> Option<String> {
        self.engine
            .element_by_name(name)
            .and_then(|element| element.text().map(str::to_owned))
    }

    /// Drain recorded host patches as MessagePack bytes.
    fn take_patches(&self) -> PyResult<Vec<u8>> {
        self.patches.encode().map_err(to_py_err)
    }

    fn __repr__(&self) -> String {
        format!(
            "Engine(elements={}, names={})",
            self.engine.document().len(),
            self.engine.registry().len()
        )
    }
}
