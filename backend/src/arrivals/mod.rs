//! Arrival process
//!
//! Turns a finite pool of candidate patients into timed arrivals.
//!
//! # Key Principles
//!
//! 1. **Determinism**: same seed + same pool + same rate → same arrivals
//! 2. **Finite pool**: `min(round(λ · horizon_hours), M)` patients are drawn
//!    without replacement; the full pool (in caller order) is used when the
//!    expected count reaches the pool size
//! 3. **Exponential gaps**: inter-arrival times have mean `60 / λ` minutes,
//!    floored so the process always makes progress
//! 4. **Late stamping**: a patient's arrival time is the clock time at which
//!    it is actually enqueued, not the time its gap was drawn
//!
//! # Example
//!
//! ```
//! use clinic_simulator_core_rs::arrivals::ArrivalProcess;
//! use clinic_simulator_core_rs::{Patient, Priority, RngManager};
//!
//! let mut rng = RngManager::new(42);
//! let pool = vec![
//!     Patient::new("p1", Priority::Urgent, "General"),
//!     Patient::new("p2", Priority::Normal, "General"),
//! ];
//! let mut arrivals = ArrivalProcess::new(pool, 60.0, 30.0, &mut rng);
//! assert_eq!(arrivals.remaining(), 2);
//!
//! let first_at = arrivals.next_arrival_time().unwrap();
//! let patient = arrivals.poll(first_at, &mut rng).unwrap();
//! assert_eq!(patient.id(), "p1");
//! assert_eq!(patient.arrival_time(), Some(first_at));
//! ```

use std::collections::VecDeque;

use crate::models::Patient;
use crate::rng::RngManager;

/// Minimum delay before the first arrival (minutes)
pub const FIRST_ARRIVAL_FLOOR: f64 = 0.1;

/// Minimum gap between consecutive arrivals (minutes)
pub const ARRIVAL_GAP_FLOOR: f64 = 0.5;

/// Number of patients a run will draw from a pool of `pool_size`
///
/// # Example
/// ```
/// use clinic_simulator_core_rs::arrivals::planned_arrivals;
///
/// // 10 patients/hour over 4 hours, pool of 100
/// assert_eq!(planned_arrivals(10.0, 240.0, 100), 40);
/// // Expected count exceeds the pool: everyone arrives
/// assert_eq!(planned_arrivals(10.0, 480.0, 25), 25);
/// ```
pub fn planned_arrivals(rate_per_hour: f64, horizon_minutes: f64, pool_size: usize) -> usize {
    let expected = (rate_per_hour * horizon_minutes / 60.0).round();
    if !expected.is_finite() || expected <= 0.0 {
        return 0;
    }
    (expected as usize).min(pool_size)
}

/// Pending arrivals and the time of the next one
#[derive(Debug, Clone)]
pub struct ArrivalProcess {
    pending: VecDeque<Patient>,
    /// Mean inter-arrival gap in minutes
    mean_gap: f64,
    next_arrival_time: Option<f64>,
    selected: usize,
}

impl ArrivalProcess {
    /// Select the run's patients from `pool` and schedule the first arrival
    ///
    /// # Arguments
    ///
    /// * `pool` - Candidate patients (size M)
    /// * `rate_per_hour` - Target arrival rate λ (> 0)
    /// * `horizon` - Run length in minutes
    /// * `rng` - The run's random source
    pub fn new(pool: Vec<Patient>, rate_per_hour: f64, horizon: f64, rng: &mut RngManager) -> Self {
        let count = planned_arrivals(rate_per_hour, horizon, pool.len());

        let pending: VecDeque<Patient> = if count >= pool.len() {
            pool.into_iter().collect()
        } else {
            let mut indices: Vec<usize> = (0..pool.len()).collect();
            rng.shuffle(&mut indices);
            let mut slots: Vec<Option<Patient>> = pool.into_iter().map(Some).collect();
            indices
                .into_iter()
                .take(count)
                .filter_map(|i| slots[i].take())
                .collect()
        };

        let mean_gap = 60.0 / rate_per_hour;
        let next_arrival_time = if pending.is_empty() {
            None
        } else {
            Some(rng.exponential(mean_gap).max(FIRST_ARRIVAL_FLOOR))
        };

        log::debug!(
            "arrival process: {} patients selected, mean gap {:.2} min",
            pending.len(),
            mean_gap
        );

        Self {
            selected: pending.len(),
            pending,
            mean_gap,
            next_arrival_time,
        }
    }

    /// Release the next patient if its arrival time has come
    ///
    /// The patient is stamped with `now`, and the following arrival is
    /// scheduled one exponential gap after `now`.
    pub fn poll(&mut self, now: f64, rng: &mut RngManager) -> Option<Patient> {
        let due = self.next_arrival_time?;
        if now < due {
            return None;
        }

        let mut patient = self.pending.pop_front()?;
        patient.mark_arrived(now);

        self.next_arrival_time = if self.pending.is_empty() {
            None
        } else {
            Some(now + rng.exponential(self.mean_gap).max(ARRIVAL_GAP_FLOOR))
        };

        Some(patient)
    }

    /// Patients that have not arrived yet
    pub fn remaining(&self) -> usize {
        self.pending.len()
    }

    /// Patients selected for this run
    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn next_arrival_time(&self) -> Option<f64> {
        self.next_arrival_time
    }

    pub fn mean_gap(&self) -> f64 {
        self.mean_gap
    }

    /// Patients still waiting to arrive, in arrival order
    pub fn pending(&self) -> impl Iterator<Item = &Patient> {
        self.pending.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Priority;

    fn pool(n: usize) -> Vec<Patient> {
        (0..n)
            .map(|i| Patient::new(format!("p{}", i), Priority::Normal, "General"))
            .collect()
    }

    #[test]
    fn test_planned_arrivals_rounding() {
        // 10/h over 45 min = 7.5 → 8
        assert_eq!(planned_arrivals(10.0, 45.0, 100), 8);
        assert_eq!(planned_arrivals(0.5, 30.0, 100), 0);
        assert_eq!(planned_arrivals(10.0, 60.0, 0), 0);
    }

    #[test]
    fn test_full_pool_keeps_caller_order() {
        let mut rng = RngManager::new(1);
        let arrivals = ArrivalProcess::new(pool(5), 60.0, 480.0, &mut rng);
        let ids: Vec<&str> = arrivals.pending().map(|p| p.id()).collect();
        assert_eq!(ids, vec!["p0", "p1", "p2", "p3", "p4"]);
    }

    #[test]
    fn test_subset_is_without_replacement() {
        let mut rng = RngManager::new(9);
        let arrivals = ArrivalProcess::new(pool(50), 10.0, 60.0, &mut rng);
        assert_eq!(arrivals.selected(), 10);

        let mut ids: Vec<&str> = arrivals.pending().map(|p| p.id()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 10);
    }

    #[test]
    fn test_first_arrival_respects_floor() {
        for seed in 1..50 {
            let mut rng = RngManager::new(seed);
            let arrivals = ArrivalProcess::new(pool(3), 600.0, 480.0, &mut rng);
            assert!(arrivals.next_arrival_time().unwrap() >= FIRST_ARRIVAL_FLOOR);
        }
    }

    #[test]
    fn test_poll_before_due_returns_none() {
        let mut rng = RngManager::new(5);
        let mut arrivals = ArrivalProcess::new(pool(3), 6.0, 480.0, &mut rng);
        let due = arrivals.next_arrival_time().unwrap();
        assert!(arrivals.poll(due - 0.05, &mut rng).is_none());
        assert_eq!(arrivals.remaining(), 3);
    }

    #[test]
    fn test_consecutive_gaps_respect_floor() {
        let mut rng = RngManager::new(11);
        let mut arrivals = ArrivalProcess::new(pool(20), 6000.0, 480.0, &mut rng);
        let mut last = None;
        while let Some(due) = arrivals.next_arrival_time() {
            let patient = arrivals.poll(due, &mut rng).unwrap();
            let at = patient.arrival_time().unwrap();
            if let Some(prev) = last {
                assert!(at - prev >= ARRIVAL_GAP_FLOOR - 1e-12);
            }
            last = Some(at);
        }
        assert_eq!(arrivals.remaining(), 0);
    }

    #[test]
    fn test_empty_pool_means_no_arrivals() {
        let mut rng = RngManager::new(5);
        let mut arrivals = ArrivalProcess::new(Vec::new(), 10.0, 480.0, &mut rng);
        assert!(arrivals.next_arrival_time().is_none());
        assert!(arrivals.poll(1000.0, &mut rng).is_none());
    }
}
