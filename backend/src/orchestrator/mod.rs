//! Orchestrator - main simulation loop
//!
//! Drives one clinic run step by step and hands the result to the caller.
//!
//! See `engine.rs` for the step loop and `sweep.rs` for multi-run sweeps.

pub mod engine;
pub mod sweep;

// Re-export main types for convenience
pub use engine::{
    BreakConfig, Orchestrator, SimulationConfig, SimulationError, StepResult, MAX_BREAK_DURATION,
    MAX_SAMPLE_INTERVAL, MIN_BREAK_DURATION,
};
pub use sweep::{run_arrival_rate_sweep, SweepPoint};
