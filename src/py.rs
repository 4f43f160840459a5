//! Python bindings for the intent resolver using PyO3

use std::sync::Arc;

use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::PyDict;

use crate::analysis::LexiconAnalyzer;
use crate::config::{ResolverConfig, DEFAULT_TOKEN_MATCH_FLOOR};
use crate::error::ResolveError;
use crate::registry::{IntentRegistry, RegistryBuilder};
use crate::resolver::Resolver;
use crate::similarity::calculate_similarity;
use crate::types::{ClarificationRequest, Outcome};

/// Calculate similarity between two phrases (Python function)
#[pyfunction]
pub fn py_calculate_similarity(input: &str, pattern: &str) -> f64 {
    calculate_similarity(input, pattern, DEFAULT_TOKEN_MATCH_FLOOR)
}

fn value_error(e: impl std::fmt::Display) -> PyErr {
    PyErr::new::<PyValueError, _>(e.to_string())
}

/// Python wrapper for the resolver
///
/// Outcomes come back as dicts: `{"type": "resolved", "command": <json>}`,
/// `{"type": "needs_clarification", "request": <json>}`, or
/// `{"type": "rejected", "error": ..., "near_miss": ...}`.
#[pyclass]
pub struct PyResolver {
    resolver: Resolver<LexiconAnalyzer>,
}

#[pymethods]
impl PyResolver {
    /// Build a resolver over the builtin intents plus optional TOML intents and config.
    #[new]
    #[pyo3(signature = (intents_toml=None, config_toml=None))]
    fn new(intents_toml: Option<&str>, config_toml: Option<&str>) -> PyResult<Self> {
        let mut builder = RegistryBuilder::new();
        builder.with_builtins().map_err(value_error)?;
        if let Some(source) = intents_toml {
            builder.extend_from_toml(source).map_err(value_error)?;
        }
        let registry: Arc<IntentRegistry> = Arc::new(builder.build());

        let config = match config_toml {
            Some(source) => ResolverConfig::from_toml_str(source).map_err(value_error)?,
            None => ResolverConfig::default(),
        };
        let resolver =
            Resolver::new(registry, LexiconAnalyzer::new(), config).map_err(value_error)?;
        Ok(Self { resolver })
    }

    /// Resolve one phrase
    fn resolve<'py>(&self, input: &str, py: Python<'py>) -> PyResult<Bound<'py, PyDict>> {
        outcome_dict(py, self.resolver.resolve(input))
    }

    /// Answer a clarification request (as returned in `request`)
    fn resolve_clarification<'py>(
        &self,
        request_json: &str,
        reply: &str,
        py: Python<'py>,
    ) -> PyResult<Bound<'py, PyDict>> {
        let request: ClarificationRequest =
            serde_json::from_str(request_json).map_err(value_error)?;
        outcome_dict(py, self.resolver.resolve_clarification(&request, reply))
    }

    /// Get number of registered intents
    fn len(&self) -> usize {
        self.resolver.registry().len()
    }
}

fn outcome_dict<'py>(
    py: Python<'py>,
    outcome: Result<Outcome, ResolveError>,
) -> PyResult<Bound<'py, PyDict>> {
    let dict = PyDict::new_bound(py);
    match outcome {
        Ok(Outcome::Resolved(command)) => {
            dict.set_item("type", "resolved")?;
            dict.set_item("intent_id", command.intent_id())?;
            dict.set_item("confidence", command.confidence())?;
            dict.set_item("command", command.to_json().map_err(value_error)?)?;
        }
        Ok(Outcome::NeedsClarification(request)) => {
            let labels: Vec<String> = request.options.iter().map(|o| o.label()).collect();
            dict.set_item("type", "needs_clarification")?;
            dict.set_item("options", labels)?;
            dict.set_item("request", serde_json::to_string(&request).map_err(value_error)?)?;
        }
        Err(ResolveError::AnalysisUnavailable(e)) => {
            return Err(PyErr::new::<PyRuntimeError, _>(e.to_string()));
        }
        Err(err) => {
            dict.set_item("type", "rejected")?;
            dict.set_item("error", err.to_string())?;
            dict.set_item("near_miss", err.near_miss())?;
        }
    }
    Ok(dict)
}
