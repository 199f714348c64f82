//! Clinic Simulator Core - Rust Engine
//!
//! Discrete-time queueing simulation of a medical clinic with deterministic
//! execution.
//!
//! # Architecture
//!
//! - **core**: Simulation clock
//! - **models**: Domain types (Patient, Doctor, WaitingQueue, State, events)
//! - **triage**: Condition keyword → specialty lookup
//! - **arrivals**: Finite-pool arrival process
//! - **scheduling**: Breaks, dispatch and abandonment decisions
//! - **stats**: Snapshots and the final run result
//! - **orchestrator**: Step loop and arrival-rate sweeps
//! - **rng**: Deterministic random number generation
//!
//! # Critical Invariants
//!
//! 1. All randomness is deterministic (seeded RNG)
//! 2. Every patient is in exactly one of: not arrived, queued, served, abandoned
//! 3. The waiting queue is priority-ordered after every change
//! 4. FFI boundary is minimal and safe

// Module declarations
pub mod arrivals;
pub mod core;
pub mod models;
pub mod orchestrator;
pub mod rng;
pub mod scheduling;
pub mod stats;
pub mod triage;

// Re-exports for convenience
pub use arrivals::ArrivalProcess;
pub use core::time::SimulationClock;
pub use models::{
    doctor::{BreakPolicy, BreakRecord, Doctor, DoctorError, DoctorRecord, DoctorStatus},
    event::{AbandonmentRecord, ConsultationRecord, Event, EventLog},
    patient::{ParsePriorityError, Patient, PatientRecord, Priority},
    queue::WaitingQueue,
    state::SimulationState,
};
pub use orchestrator::{
    run_arrival_rate_sweep, BreakConfig, Orchestrator, SimulationConfig, SimulationError,
    StepResult, SweepPoint,
};
pub use rng::RngManager;
pub use scheduling::ConsultationDistribution;
pub use stats::{DoctorPerformance, SimulationResult, Snapshot, SpecialtyStats};
pub use triage::TriageTable;

// FFI module (when feature enabled)
#[cfg(feature = "pyo3")]
pub mod ffi;

// PyO3 exports (when feature enabled)
#[cfg(feature = "pyo3")]
use pyo3::prelude::*;

#[cfg(feature = "pyo3")]
#[pymodule]
fn clinic_simulator_core_rs(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<ffi::PyClinicSimulation>()?;
    Ok(())
}
