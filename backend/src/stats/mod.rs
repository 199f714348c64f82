//! Statistics collection
//!
//! Periodic snapshots of aggregate run state, plus the final
//! [`SimulationResult`] handed to the caller when a run ends.

pub mod result;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::state::SimulationState;

pub use result::{DoctorPerformance, SimulationResult, SpecialtyStats};

/// Aggregate state at one point in simulated time
///
/// Snapshots are append-only; once recorded they are never modified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub time: f64,
    pub queue_length: usize,
    /// Waiting patients per required specialty
    pub queue_by_specialty: BTreeMap<String, usize>,
    /// Cumulative patients dispatched to a doctor
    pub served: usize,
    /// Cumulative patients that reneged
    pub abandoned: usize,
    /// Patients selected for the run that have not arrived yet
    pub awaiting_arrival: usize,
    pub doctors_busy: usize,
    pub doctors_on_break: usize,
    /// Mean doctor occupancy in percent
    pub mean_occupancy: f64,
    /// Mean current wait of queued patients (minutes)
    pub mean_wait: f64,
    /// Mean drawn consultation length so far (minutes)
    pub mean_consultation_time: f64,
    /// Percent of consultations with matching specialty
    pub specialty_match_rate: f64,
}

impl Snapshot {
    /// Sample `state` at `now`
    pub fn capture(state: &SimulationState, now: f64, awaiting_arrival: usize) -> Self {
        let queue = state.queue();
        Self {
            time: now,
            queue_length: queue.len(),
            queue_by_specialty: queue.count_by_specialty(),
            served: state.served_count(),
            abandoned: state.abandoned_count(),
            awaiting_arrival,
            doctors_busy: state.doctors_busy(),
            doctors_on_break: state.doctors_on_break(),
            mean_occupancy: state.mean_occupancy(now),
            mean_wait: queue.mean_wait(now),
            mean_consultation_time: state.mean_consultation_time(),
            specialty_match_rate: state.specialty_match_rate(),
        }
    }
}

/// Samples the state at a fixed simulated-time interval
///
/// # Example
/// ```
/// use clinic_simulator_core_rs::stats::StatisticsCollector;
/// use clinic_simulator_core_rs::SimulationState;
///
/// let state = SimulationState::new(Vec::new());
/// let mut stats = StatisticsCollector::new(1.0);
///
/// assert!(stats.sample_if_due(&state, 0.25, 0));  // first sample is always taken
/// assert!(!stats.sample_if_due(&state, 0.75, 0));
/// assert!(stats.sample_if_due(&state, 1.25, 0));
/// assert_eq!(stats.snapshots().len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct StatisticsCollector {
    interval: f64,
    last_sample: Option<f64>,
    snapshots: Vec<Snapshot>,
}

impl StatisticsCollector {
    pub fn new(interval: f64) -> Self {
        Self {
            interval,
            last_sample: None,
            snapshots: Vec::new(),
        }
    }

    /// Record a snapshot if at least one interval passed since the last one
    ///
    /// Returns true when a snapshot was recorded.
    pub fn sample_if_due(&mut self, state: &SimulationState, now: f64, awaiting_arrival: usize) -> bool {
        let due = match self.last_sample {
            None => true,
            Some(last) => now - last >= self.interval,
        };
        if due {
            self.record(state, now, awaiting_arrival);
        }
        due
    }

    /// Record a snapshot unconditionally
    ///
    /// A second snapshot at the same time as the last one is skipped.
    pub fn record(&mut self, state: &SimulationState, now: f64, awaiting_arrival: usize) {
        if self.last_sample == Some(now) {
            return;
        }
        self.snapshots
            .push(Snapshot::capture(state, now, awaiting_arrival));
        self.last_sample = Some(now);
    }

    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }

    pub fn interval(&self) -> f64 {
        self.interval
    }

    /// Largest queue length seen across all snapshots
    pub fn max_queue_length(&self) -> usize {
        self.snapshots
            .iter()
            .map(|s| s.queue_length)
            .max()
            .unwrap_or(0)
    }

    /// Run-level mean wait
    ///
    /// Positive snapshot mean-waits are averaged together with one extra
    /// zero sample, so a run whose queue never held anyone reports 0.
    pub fn mean_wait(&self) -> f64 {
        let (sum, count) = positive_waits(&self.snapshots)
            .fold((0.0, 0usize), |(sum, count), w| (sum + w, count + 1));
        sum / (count + 1) as f64
    }

    /// Mean queue length across all snapshots
    pub fn mean_queue_length(&self) -> f64 {
        if self.snapshots.is_empty() {
            return 0.0;
        }
        let total: usize = self.snapshots.iter().map(|s| s.queue_length).sum();
        total as f64 / self.snapshots.len() as f64
    }

    pub fn into_snapshots(self) -> Vec<Snapshot> {
        self.snapshots
    }
}

fn positive_waits(snapshots: &[Snapshot]) -> impl Iterator<Item = f64> + '_ {
    snapshots.iter().map(|s| s.mean_wait).filter(|w| *w > 0.0)
}

/// Mean of the positive mean-waits in `snapshots` (0 when there are none)
pub fn mean_positive_wait(snapshots: &[Snapshot]) -> f64 {
    let (sum, count) = positive_waits(snapshots)
        .fold((0.0, 0usize), |(sum, count), w| (sum + w, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::doctor::{BreakPolicy, Doctor};
    use crate::models::patient::{Patient, Priority};

    fn state() -> SimulationState {
        let policy = BreakPolicy {
            frequency: 60.0,
            duration: 15.0,
            max_breaks: 2,
        };
        SimulationState::new(vec![
            Doctor::new("d1", "General", policy),
            Doctor::new("d2", "Cardiology", policy),
        ])
    }

    #[test]
    fn test_capture_reads_queue_and_doctors() {
        let mut state = state();
        state.inject_patient(Patient::new("p1", Priority::High, "Cardiology"), 0.0);
        state.inject_patient(Patient::new("p2", Priority::Low, "General"), 4.0);
        state.doctors_mut()[0]
            .start_consultation("x", 0.0, 100.0)
            .unwrap();

        let snap = Snapshot::capture(&state, 10.0, 7);

        assert_eq!(snap.queue_length, 2);
        assert_eq!(snap.queue_by_specialty.get("Cardiology"), Some(&1));
        assert_eq!(snap.awaiting_arrival, 7);
        assert_eq!(snap.doctors_busy, 1);
        assert!((snap.mean_wait - 8.0).abs() < 1e-9);
        // d1 busy the whole 10 minutes, d2 idle
        assert!((snap.mean_occupancy - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_duplicate_time_not_recorded_twice() {
        let state = state();
        let mut stats = StatisticsCollector::new(1.0);
        stats.record(&state, 5.0, 0);
        stats.record(&state, 5.0, 0);
        assert_eq!(stats.snapshots().len(), 1);
    }

    #[test]
    fn test_mean_wait_ignores_empty_queue_samples() {
        let mut state = state();
        let mut stats = StatisticsCollector::new(1.0);
        stats.record(&state, 1.0, 0);
        state.inject_patient(Patient::new("p1", Priority::Normal, "General"), 1.0);
        stats.record(&state, 3.0, 0);
        stats.record(&state, 5.0, 0);

        // samples: 0 (ignored), 2, 4
        assert!((mean_positive_wait(stats.snapshots()) - 3.0).abs() < 1e-9);
        // run-level mean adds one zero sample: (2 + 4) / 3
        assert!((stats.mean_wait() - 2.0).abs() < 1e-9);
        assert_eq!(stats.max_queue_length(), 1);
    }

    #[test]
    fn test_mean_wait_zero_without_waiting() {
        let state = state();
        let mut stats = StatisticsCollector::new(1.0);
        assert_eq!(stats.mean_wait(), 0.0);
        stats.record(&state, 1.0, 0);
        stats.record(&state, 2.0, 0);
        assert_eq!(stats.mean_wait(), 0.0);
        assert_eq!(mean_positive_wait(stats.snapshots()), 0.0);
    }
}
