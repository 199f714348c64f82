//! Abandonment (reneging)
//!
//! Every tick each queued patient whose wait exceeds max-wait leaves with a
//! fixed probability. Patients at or under max-wait are never drawn for.

use crate::models::event::AbandonmentRecord;
use crate::models::state::SimulationState;
use crate::rng::RngManager;

/// Reneging parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AbandonmentRules {
    pub max_wait: f64,
    /// Per-tick probability an over-waiting patient leaves
    pub probability: f64,
}

/// Remove reneging patients from the queue
///
/// Draws happen in queue order, one per over-waiting patient. The removed
/// patients are recorded in the state's abandoned set and returned.
pub fn process_abandonment(
    state: &mut SimulationState,
    now: f64,
    rules: AbandonmentRules,
    rng: &mut RngManager,
) -> Vec<AbandonmentRecord> {
    let leaving = state
        .queue_mut()
        .remove_where(|patient| patient.wait_time(now) > rules.max_wait && rng.chance(rules.probability));

    let mut records = Vec::with_capacity(leaving.len());
    for patient in leaving {
        let wait_time = patient.wait_time(now);
        let record = AbandonmentRecord {
            patient_id: patient.id().to_string(),
            priority: patient.priority(),
            required_specialty: patient.required_specialty().to_string(),
            arrival_time: patient.arrival_time().unwrap_or(now),
            abandoned_at: now,
            wait_time,
            reason: format!("waited {:.1} min (> {} min)", wait_time, rules.max_wait),
        };
        log::debug!("t={:.2} {} abandoned: {}", now, record.patient_id, record.reason);
        state.record_abandonment(record.clone());
        records.push(record);
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::patient::{Patient, Priority};

    fn rules(probability: f64) -> AbandonmentRules {
        AbandonmentRules {
            max_wait: 30.0,
            probability,
        }
    }

    #[test]
    fn test_certain_abandonment_removes_over_waiting() {
        let mut state = SimulationState::new(Vec::new());
        state.inject_patient(Patient::new("old", Priority::Normal, "General"), 0.0);
        state.inject_patient(Patient::new("new", Priority::Normal, "General"), 50.0);
        let mut rng = RngManager::new(1);

        let gone = process_abandonment(&mut state, 60.0, rules(1.0), &mut rng);

        assert_eq!(gone.len(), 1);
        assert_eq!(gone[0].patient_id, "old");
        assert_eq!(gone[0].wait_time, 60.0);
        assert_eq!(gone[0].reason, "waited 60.0 min (> 30 min)");
        assert!(state.queue().contains("new"));
        assert_eq!(state.abandoned_count(), 1);
    }

    #[test]
    fn test_wait_exactly_max_is_kept() {
        let mut state = SimulationState::new(Vec::new());
        state.inject_patient(Patient::new("p", Priority::Low, "General"), 0.0);
        let mut rng = RngManager::new(1);

        assert!(process_abandonment(&mut state, 30.0, rules(1.0), &mut rng).is_empty());
        assert_eq!(state.queue_size(), 1);
    }

    #[test]
    fn test_partial_probability_keeps_some() {
        let mut state = SimulationState::new(Vec::new());
        for i in 0..200 {
            state.inject_patient(Patient::new(format!("p{}", i), Priority::Normal, "General"), 0.0);
        }
        let mut rng = RngManager::new(21);

        let gone = process_abandonment(&mut state, 45.0, rules(0.3), &mut rng);

        assert!(!gone.is_empty());
        assert!(gone.len() < 200);
        assert_eq!(gone.len() + state.queue_size(), 200);
        assert!(state.queue().is_priority_ordered());
    }
}
