//! Consultation dispatch
//!
//! Matches a free doctor to the best-ranked queued patient they may serve.
//! The queue is scanned front to back and the first eligible patient wins.
//!
//! # Eligibility
//!
//! 1. **Same specialty**: eligible unless an earlier patient with the same
//!    required specialty has a strictly higher priority.
//! 2. **Escalation** to a doctor of another specialty:
//!    - URGENT waiting more than [`URGENT_ESCALATION_WAIT`] minutes
//!    - HIGH waiting more than half of max-wait, with no URGENT patient
//!      earlier in the queue
//!    - NORMAL waiting more than max-wait, only for a default-specialty
//!      doctor, with no URGENT/HIGH patient earlier in the queue and no free
//!      doctor of the patient's specialty
//!    - LOW is never escalated
//!
//! A patient needing a specialty nobody on staff has can wait indefinitely
//! when no default-specialty doctor frees up in time.

use serde::{Deserialize, Serialize};

use crate::models::doctor::{Doctor, DoctorError};
use crate::models::event::ConsultationRecord;
use crate::models::patient::{Patient, Priority};
use crate::models::queue::WaitingQueue;
use crate::models::state::SimulationState;
use crate::rng::RngManager;

/// Wait (minutes) after which an URGENT patient may see any doctor
pub const URGENT_ESCALATION_WAIT: f64 = 5.0;

/// Standard deviation of the normal consultation distribution (minutes)
pub const NORMAL_STD_DEV: f64 = 5.0;

/// Lower clamp on a drawn consultation, as a fraction of the mean
pub const MIN_DURATION_FACTOR: f64 = 0.3;

/// Upper clamp on a drawn consultation, as a multiple of the mean
pub const MAX_DURATION_FACTOR: f64 = 2.0;

/// Distribution of consultation lengths
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsultationDistribution {
    /// Exponential with the configured mean
    #[default]
    Exponential,
    /// Normal around the mean with [`NORMAL_STD_DEV`]
    Normal,
    /// Uniform over `[0.5 × mean, 1.5 × mean)`
    Uniform,
    /// Always the mean
    Fixed,
}

impl ConsultationDistribution {
    /// Draw one consultation length, clamped to `[0.3 × mean, 2.0 × mean]`
    ///
    /// # Example
    /// ```
    /// use clinic_simulator_core_rs::scheduling::ConsultationDistribution;
    /// use clinic_simulator_core_rs::RngManager;
    ///
    /// let mut rng = RngManager::new(7);
    /// for _ in 0..100 {
    ///     let d = ConsultationDistribution::Exponential.sample(15.0, &mut rng);
    ///     assert!((4.5..=30.0).contains(&d));
    /// }
    /// assert_eq!(ConsultationDistribution::Fixed.sample(15.0, &mut rng), 15.0);
    /// ```
    pub fn sample(self, mean: f64, rng: &mut RngManager) -> f64 {
        let raw = match self {
            ConsultationDistribution::Exponential => rng.exponential(mean),
            ConsultationDistribution::Normal => rng.normal(mean, NORMAL_STD_DEV),
            ConsultationDistribution::Uniform => rng.uniform(0.5 * mean, 1.5 * mean),
            ConsultationDistribution::Fixed => mean,
        };
        raw.clamp(MIN_DURATION_FACTOR * mean, MAX_DURATION_FACTOR * mean)
    }
}

/// Parameters the dispatcher needs from the run configuration
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchRules {
    pub max_wait: f64,
    /// Label of the generic specialty allowed to take escalated NORMAL patients
    pub default_specialty: String,
    pub distribution: ConsultationDistribution,
    pub mean_consultation_time: f64,
}

/// Index of the first queued patient a doctor of `doctor_specialty` may serve
///
/// `doctors` is the whole pool, used to check for idle specialists.
pub fn find_eligible_patient(
    doctor_specialty: &str,
    queue: &WaitingQueue,
    doctors: &[Doctor],
    now: f64,
    rules: &DispatchRules,
) -> Option<usize> {
    let patients = queue.as_slice();
    patients.iter().enumerate().position(|(index, patient)| {
        let earlier = &patients[..index];
        if patient.required_specialty() == doctor_specialty {
            same_specialty_eligible(patient, earlier)
        } else {
            escalation_eligible(doctor_specialty, patient, earlier, doctors, now, rules)
        }
    })
}

fn same_specialty_eligible(patient: &Patient, earlier: &[Patient]) -> bool {
    !earlier.iter().any(|other| {
        other.required_specialty() == patient.required_specialty()
            && other.priority().rank() < patient.priority().rank()
    })
}

fn escalation_eligible(
    doctor_specialty: &str,
    patient: &Patient,
    earlier: &[Patient],
    doctors: &[Doctor],
    now: f64,
    rules: &DispatchRules,
) -> bool {
    let wait = patient.wait_time(now);
    match patient.priority() {
        Priority::Urgent => wait > URGENT_ESCALATION_WAIT,
        Priority::High => {
            wait > rules.max_wait / 2.0
                && !earlier.iter().any(|p| p.priority() == Priority::Urgent)
        }
        Priority::Normal => {
            doctor_specialty == rules.default_specialty
                && wait > rules.max_wait
                && !earlier
                    .iter()
                    .any(|p| matches!(p.priority(), Priority::Urgent | Priority::High))
                && !doctors
                    .iter()
                    .any(|d| d.specialty() == patient.required_specialty() && d.is_free())
        }
        Priority::Low => false,
    }
}

/// Try to give the doctor at `doctor_index` a patient
///
/// Returns the consultation record when a match was made. A doctor that is
/// not free, or a queue with nobody eligible, yields `Ok(None)`.
pub fn dispatch_doctor(
    state: &mut SimulationState,
    doctor_index: usize,
    now: f64,
    rules: &DispatchRules,
    rng: &mut RngManager,
) -> Result<Option<ConsultationRecord>, DoctorError> {
    let position = {
        let doctor = match state.doctors().get(doctor_index) {
            Some(d) if d.is_free() => d,
            _ => return Ok(None),
        };
        match find_eligible_patient(doctor.specialty(), state.queue(), state.doctors(), now, rules)
        {
            Some(position) => position,
            None => return Ok(None),
        }
    };

    let duration = rules
        .distribution
        .sample(rules.mean_consultation_time, rng);

    let record = {
        let (doctors, queue) = state.doctors_and_queue_mut();
        let doctor = &mut doctors[doctor_index];
        let patient_id = match queue.get(position) {
            Some(p) => p.id().to_string(),
            None => return Ok(None),
        };
        doctor.start_consultation(patient_id, now, duration)?;
        let patient = match queue.remove_at(position) {
            Some(p) => p,
            None => return Ok(None),
        };

        ConsultationRecord {
            patient_id: patient.id().to_string(),
            doctor_id: doctor.id().to_string(),
            start_time: now,
            duration,
            specialty_matched: doctor.specialty() == patient.required_specialty(),
            wait_time: patient.wait_time(now),
            priority: patient.priority(),
            required_specialty: patient.required_specialty().to_string(),
            doctor_specialty: doctor.specialty().to_string(),
        }
    };

    log::debug!(
        "t={:.2} dispatch {} ({}, {}) -> {} ({}) for {:.1} min",
        now,
        record.patient_id,
        record.priority,
        record.required_specialty,
        record.doctor_id,
        record.doctor_specialty,
        record.duration
    );

    state.record_consultation(record.clone());
    Ok(Some(record))
}

/// Offer a patient to every free doctor, in pool order
pub fn dispatch_idle_doctors(
    state: &mut SimulationState,
    now: f64,
    rules: &DispatchRules,
    rng: &mut RngManager,
) -> Result<Vec<ConsultationRecord>, DoctorError> {
    let mut started = Vec::new();
    for index in state.free_doctor_indices() {
        if state.queue().is_empty() {
            break;
        }
        if let Some(record) = dispatch_doctor(state, index, now, rules, rng)? {
            started.push(record);
        }
    }
    Ok(started)
}
