//! Arrival-rate sweep
//!
//! Runs one independent simulation per arrival rate with everything else
//! held fixed (seed, pools, configuration), to show how the queue responds
//! to load.

use serde::{Deserialize, Serialize};

use crate::models::doctor::DoctorRecord;
use crate::models::patient::PatientRecord;
use crate::orchestrator::engine::{Orchestrator, SimulationConfig, SimulationError};
use crate::stats::mean_positive_wait;

/// Outcome of one run in a sweep
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepPoint {
    pub arrival_rate: f64,
    /// Mean queue length across the run's snapshots
    pub mean_queue_length: f64,
    /// Mean of the positive snapshot mean-waits
    pub mean_wait: f64,
    pub served: usize,
    pub abandoned: usize,
    pub mean_occupancy: f64,
}

/// Run `base_config` once per rate, stepping by `dt`
///
/// Points come back in the order of `rates`. The first rate that fails
/// validation aborts the sweep.
///
/// # Example
/// ```
/// use clinic_simulator_core_rs::orchestrator::run_arrival_rate_sweep;
/// use clinic_simulator_core_rs::{DoctorRecord, PatientRecord, Priority, SimulationConfig};
///
/// let config = SimulationConfig { horizon: 60.0, ..SimulationConfig::default() };
/// let doctors = vec![DoctorRecord::new("d1", "General")];
/// let patients: Vec<PatientRecord> = (0..20)
///     .map(|i| PatientRecord::new(format!("p{}", i), Priority::Normal, "General"))
///     .collect();
///
/// let points = run_arrival_rate_sweep(&config, &doctors, &patients, &[5.0, 15.0], 1.0).unwrap();
/// assert_eq!(points.len(), 2);
/// assert_eq!(points[1].arrival_rate, 15.0);
/// ```
pub fn run_arrival_rate_sweep(
    base_config: &SimulationConfig,
    doctors: &[DoctorRecord],
    patients: &[PatientRecord],
    rates: &[f64],
    dt: f64,
) -> Result<Vec<SweepPoint>, SimulationError> {
    rates
        .iter()
        .map(|&rate| {
            let config = SimulationConfig {
                arrival_rate: rate,
                ..base_config.clone()
            };
            let result = Orchestrator::new(config, doctors.to_vec(), patients.to_vec())?.run(dt)?;

            let mean_queue_length = if result.snapshots.is_empty() {
                0.0
            } else {
                result.snapshots.iter().map(|s| s.queue_length).sum::<usize>() as f64
                    / result.snapshots.len() as f64
            };

            log::info!(
                "sweep rate {:.1}/h: served {}, abandoned {}, mean queue {:.2}",
                rate,
                result.served,
                result.abandoned,
                mean_queue_length
            );

            Ok(SweepPoint {
                arrival_rate: rate,
                mean_queue_length,
                mean_wait: mean_positive_wait(&result.snapshots),
                served: result.served,
                abandoned: result.abandoned,
                mean_occupancy: result.mean_occupancy,
            })
        })
        .collect()
}
