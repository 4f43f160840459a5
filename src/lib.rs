//! Intent core - resolves free-form terminal phrases into validated commands
//!
//! This crate provides normalization, entity extraction, fuzzy intent
//! matching, slot filling and disambiguation for a natural-language shell.
//! Start from [`Resolver`]:
//!
//! ```
//! use std::sync::Arc;
//! use intent_core::{IntentRegistry, LexiconAnalyzer, Resolver};
//!
//! let registry = Arc::new(IntentRegistry::builtin().unwrap());
//! let resolver = Resolver::with_defaults(registry, LexiconAnalyzer::new());
//! let outcome = resolver.resolve("show me all files in this directory").unwrap();
//! assert_eq!(outcome.resolved().unwrap().intent_id(), "list-directory");
//! ```

pub mod analysis;
pub mod builtin;
pub mod config;
pub mod disambiguator;
pub mod entities;
pub mod error;
pub mod executor;
pub mod filler;
pub mod matcher;
pub mod normalizer;
pub mod registry;
pub mod resolver;
pub mod sequence;
pub mod similarity;
pub mod types;

pub use analysis::{LexiconAnalyzer, LinguisticAnalyzer};
pub use config::ResolverConfig;
pub use error::*;
pub use executor::{CommandExecutor, ExecutionError, ExecutionResult};
pub use registry::{IntentDef, IntentPattern, IntentRegistry, RegistryBuilder, SlotDef};
pub use resolver::Resolver;
pub use sequence::SequenceStage;
pub use types::*;

// Python bindings
#[cfg(feature = "extension-module")]
pub mod py;

#[cfg(feature = "extension-module")]
use pyo3::prelude::*;

#[cfg(feature = "extension-module")]
#[pymodule]
fn intent_core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    use py::*;
    m.add_class::<PyResolver>()?;
    m.add_function(wrap_pyfunction!(py_calculate_similarity, m)?)?;
    Ok(())
}
