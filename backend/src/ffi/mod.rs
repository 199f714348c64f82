//! Python bindings (feature `pyo3`)
//!
//! Everything crossing the boundary is JSON text or a flat dict, so the
//! Python side needs no knowledge of the Rust types.

pub mod orchestrator;
pub mod types;

pub use orchestrator::PyClinicSimulation;
