//! Type conversion utilities for FFI boundary
//!
//! Converts between Rust types and PyO3-compatible types.

use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::PyDict;
use serde::de::DeserializeOwned;

use crate::orchestrator::{SimulationError, StepResult};

/// Parse a JSON array of records, raising ValueError on malformed input
///
/// # Example
/// ```ignore
/// let doctors: Vec<DoctorRecord> = parse_records(doctors_json, "doctors")?;
/// ```
pub fn parse_records<T: DeserializeOwned>(json: &str, what: &str) -> PyResult<Vec<T>> {
    serde_json::from_str(json)
        .map_err(|e| PyValueError::new_err(format!("Invalid {} JSON: {}", what, e)))
}

/// Map engine errors to Python exceptions
///
/// Configuration and initialization problems are the caller's input, so
/// they become ValueError; anything raised while stepping is RuntimeError.
pub fn simulation_error_to_py(err: SimulationError) -> PyErr {
    match err {
        SimulationError::Configuration { .. } | SimulationError::Initialization(_) => {
            PyValueError::new_err(err.to_string())
        }
        SimulationError::InvalidTimeStep(_) | SimulationError::Doctor(_) => {
            PyRuntimeError::new_err(err.to_string())
        }
    }
}

/// Convert a StepResult to a Python dict
pub fn step_result_to_py(py: Python<'_>, result: &StepResult) -> PyResult<Py<PyDict>> {
    let dict = PyDict::new_bound(py);
    dict.set_item("time", result.time)?;
    dict.set_item("arrivals", result.arrivals)?;
    dict.set_item("consultations_started", result.consultations_started)?;
    dict.set_item("consultations_completed", result.consultations_completed)?;
    dict.set_item("breaks_started", result.breaks_started)?;
    dict.set_item("breaks_ended", result.breaks_ended)?;
    dict.set_item("abandoned", result.abandoned)?;
    dict.set_item("queue_length", result.queue_length)?;
    dict.set_item("finished", result.finished)?;
    Ok(dict.unbind())
}
