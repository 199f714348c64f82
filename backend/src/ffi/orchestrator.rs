//! PyO3 wrapper for Orchestrator
//!
//! This module provides the Python interface to the Rust orchestrator.

use pyo3::exceptions::PyRuntimeError;
use pyo3::prelude::*;
use pyo3::types::PyDict;

use super::types::{parse_records, simulation_error_to_py, step_result_to_py};
use crate::models::{DoctorRecord, PatientRecord};
use crate::orchestrator::{Orchestrator, SimulationConfig};

/// Python wrapper for one clinic run
///
/// # Example (from Python)
///
/// ```python
/// from clinic_simulator_core_rs import ClinicSimulation
///
/// sim = ClinicSimulation(
///     '{"arrival_rate": 12.0, "horizon": 240.0}',
///     '[{"id": "d1", "specialty": "General"}]',
///     '[{"id": "p1", "priority": "URGENT", "required_specialty": "General"}]',
/// )
/// while not sim.is_finished():
///     sim.step(1.0)
/// result = json.loads(sim.result_json())
/// ```
#[pyclass(name = "ClinicSimulation")]
pub struct PyClinicSimulation {
    inner: Option<Orchestrator>,
}

impl PyClinicSimulation {
    fn inner(&self) -> PyResult<&Orchestrator> {
        self.inner
            .as_ref()
            .ok_or_else(|| PyRuntimeError::new_err("simulation result already taken"))
    }

    fn inner_mut(&mut self) -> PyResult<&mut Orchestrator> {
        self.inner
            .as_mut()
            .ok_or_else(|| PyRuntimeError::new_err("simulation result already taken"))
    }
}

#[pymethods]
impl PyClinicSimulation {
    /// Create a run from JSON configuration, doctors and patients
    ///
    /// # Errors
    ///
    /// Raises ValueError on malformed JSON, invalid configuration or empty pools.
    #[new]
    fn new(config_json: &str, doctors_json: &str, patients_json: &str) -> PyResult<Self> {
        let config = SimulationConfig::from_json(config_json).map_err(simulation_error_to_py)?;
        let doctors: Vec<DoctorRecord> = parse_records(doctors_json, "doctors")?;
        let patients: Vec<PatientRecord> = parse_records(patients_json, "patients")?;

        let inner =
            Orchestrator::new(config, doctors, patients).map_err(simulation_error_to_py)?;
        Ok(Self { inner: Some(inner) })
    }

    /// Advance by `dt` minutes; returns the step summary as a dict
    fn step(&mut self, py: Python<'_>, dt: f64) -> PyResult<Py<PyDict>> {
        let result = self
            .inner_mut()?
            .step(dt)
            .map_err(simulation_error_to_py)?;
        step_result_to_py(py, &result)
    }

    fn current_time(&self) -> PyResult<f64> {
        Ok(self.inner()?.current_time())
    }

    fn queue_length(&self) -> PyResult<usize> {
        Ok(self.inner()?.state().queue_size())
    }

    fn is_finished(&self) -> PyResult<bool> {
        Ok(self.inner()?.is_finished())
    }

    /// Finish the run and return the full result as JSON
    ///
    /// The simulation cannot be stepped afterwards.
    fn result_json(&mut self) -> PyResult<String> {
        let orchestrator = self
            .inner
            .take()
            .ok_or_else(|| PyRuntimeError::new_err("simulation result already taken"))?;
        orchestrator
            .finish()
            .to_json()
            .map_err(|e| PyRuntimeError::new_err(format!("Failed to serialize result: {}", e)))
    }
}
