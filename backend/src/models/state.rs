//! Simulation State
//!
//! Everything one run mutates between ticks: the doctor pool, the waiting
//! queue and the append-only logs.
//!
//! # Critical Invariants
//!
//! 1. **Patient Uniqueness**: a patient is in at most one of {queue,
//!    consultation log, abandoned records}
//! 2. **No Double-Booking**: the patient of a busy doctor is never queued
//! 3. **Queue Order**: the queue is priority-ordered after every change
//! 4. **Stable Pool**: doctors are created once and never removed; their
//!    order is the dispatch scan order

use std::collections::BTreeMap;

use crate::models::doctor::Doctor;
use crate::models::event::{AbandonmentRecord, ConsultationRecord, Event, EventLog};
use crate::models::patient::Patient;
use crate::models::queue::WaitingQueue;

/// Complete mutable state of a clinic run
///
/// # Example
///
/// ```rust
/// use clinic_simulator_core_rs::{BreakPolicy, Doctor, Patient, Priority, SimulationState};
///
/// let policy = BreakPolicy { frequency: 60.0, duration: 15.0, max_breaks: 2 };
/// let mut state = SimulationState::new(vec![Doctor::new("d1", "General", policy)]);
/// assert_eq!(state.num_doctors(), 1);
///
/// state.inject_patient(Patient::new("p1", Priority::High, "General"), 0.0);
/// assert_eq!(state.queue_size(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct SimulationState {
    /// Doctor pool in dispatch scan order
    doctors: Vec<Doctor>,

    queue: WaitingQueue,

    /// One entry per dispatch, in dispatch order
    consultation_log: Vec<ConsultationRecord>,

    abandoned: Vec<AbandonmentRecord>,

    event_log: EventLog,

    /// Patients that entered the queue without going through the arrival process
    injected: usize,

    /// Largest queue length observed after any phase
    max_queue_length: usize,
}

impl SimulationState {
    /// Create a new state with the given doctor pool and an empty queue
    pub fn new(doctors: Vec<Doctor>) -> Self {
        Self {
            doctors,
            queue: WaitingQueue::new(),
            consultation_log: Vec::new(),
            abandoned: Vec::new(),
            event_log: EventLog::new(),
            injected: 0,
            max_queue_length: 0,
        }
    }

    // ========================================================================
    // Doctor pool
    // ========================================================================

    pub fn doctors(&self) -> &[Doctor] {
        &self.doctors
    }

    pub fn doctors_mut(&mut self) -> &mut [Doctor] {
        &mut self.doctors
    }

    pub fn num_doctors(&self) -> usize {
        self.doctors.len()
    }

    pub fn get_doctor(&self, id: &str) -> Option<&Doctor> {
        self.doctors.iter().find(|d| d.id() == id)
    }

    pub fn get_doctor_mut(&mut self, id: &str) -> Option<&mut Doctor> {
        self.doctors.iter_mut().find(|d| d.id() == id)
    }

    pub fn doctors_on_break(&self) -> usize {
        self.doctors.iter().filter(|d| d.is_on_break()).count()
    }

    pub fn doctors_busy(&self) -> usize {
        self.doctors.iter().filter(|d| d.is_busy()).count()
    }

    /// Indices of free doctors, in pool order
    pub fn free_doctor_indices(&self) -> Vec<usize> {
        self.doctors
            .iter()
            .enumerate()
            .filter(|(_, d)| d.is_free())
            .map(|(i, _)| i)
            .collect()
    }

    /// Doctors per specialty label
    pub fn doctors_by_specialty(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for doctor in &self.doctors {
            *counts.entry(doctor.specialty().to_string()).or_insert(0) += 1;
        }
        counts
    }

    /// Mean occupancy across the pool at `now`, in percent
    pub fn mean_occupancy(&self, now: f64) -> f64 {
        if self.doctors.is_empty() {
            return 0.0;
        }
        let total: f64 = self.doctors.iter().map(|d| d.occupancy(now)).sum();
        total / self.doctors.len() as f64
    }

    // ========================================================================
    // Queue
    // ========================================================================

    pub fn queue(&self) -> &WaitingQueue {
        &self.queue
    }

    pub fn queue_size(&self) -> usize {
        self.queue.len()
    }

    /// Enqueue a patient delivered by the arrival process
    ///
    /// The patient must already carry its arrival time.
    pub fn enqueue_arrival(&mut self, patient: Patient) {
        self.event_log.log(Event::PatientArrived {
            time: patient.arrival_time().unwrap_or(0.0),
            patient_id: patient.id().to_string(),
            priority: patient.priority(),
            required_specialty: patient.required_specialty().to_string(),
        });
        self.queue.enqueue(patient);
        self.observe_queue_length();
    }

    /// Place a patient directly into the queue, arrived at `arrival_time`
    ///
    /// Counted as an extra injected patient for conservation purposes.
    pub fn inject_patient(&mut self, patient: Patient, arrival_time: f64) {
        self.injected += 1;
        self.enqueue_arrival(patient.arrived_at(arrival_time));
    }

    /// Patients injected outside the arrival process
    pub fn injected_patients(&self) -> usize {
        self.injected
    }

    pub fn max_queue_length(&self) -> usize {
        self.max_queue_length
    }

    pub(crate) fn queue_mut(&mut self) -> &mut WaitingQueue {
        &mut self.queue
    }

    pub(crate) fn observe_queue_length(&mut self) {
        self.max_queue_length = self.max_queue_length.max(self.queue.len());
    }

    /// Split borrow used by the dispatcher
    pub(crate) fn doctors_and_queue_mut(&mut self) -> (&mut [Doctor], &mut WaitingQueue) {
        (&mut self.doctors, &mut self.queue)
    }

    // ========================================================================
    // Logs
    // ========================================================================

    pub fn consultation_log(&self) -> &[ConsultationRecord] {
        &self.consultation_log
    }

    pub fn abandoned(&self) -> &[AbandonmentRecord] {
        &self.abandoned
    }

    pub fn event_log(&self) -> &EventLog {
        &self.event_log
    }

    /// Patients dispatched to a doctor so far
    pub fn served_count(&self) -> usize {
        self.consultation_log.len()
    }

    pub fn abandoned_count(&self) -> usize {
        self.abandoned.len()
    }

    /// Mean drawn consultation length so far (0 when nothing was dispatched)
    pub fn mean_consultation_time(&self) -> f64 {
        if self.consultation_log.is_empty() {
            return 0.0;
        }
        let total: f64 = self.consultation_log.iter().map(|r| r.duration).sum();
        total / self.consultation_log.len() as f64
    }

    /// Share of consultations with matching specialty, in percent
    pub fn specialty_match_rate(&self) -> f64 {
        if self.consultation_log.is_empty() {
            return 0.0;
        }
        let matched = self
            .consultation_log
            .iter()
            .filter(|r| r.specialty_matched)
            .count();
        matched as f64 / self.consultation_log.len() as f64 * 100.0
    }

    pub(crate) fn record_consultation(&mut self, record: ConsultationRecord) {
        self.event_log.log(Event::ConsultationStarted {
            time: record.start_time,
            patient_id: record.patient_id.clone(),
            doctor_id: record.doctor_id.clone(),
            duration: record.duration,
            specialty_matched: record.specialty_matched,
        });
        self.consultation_log.push(record);
    }

    pub(crate) fn record_abandonment(&mut self, record: AbandonmentRecord) {
        self.event_log.log(Event::PatientAbandoned {
            time: record.abandoned_at,
            patient_id: record.patient_id.clone(),
            wait_time: record.wait_time,
            reason: record.reason.clone(),
        });
        self.abandoned.push(record);
    }

    pub(crate) fn log_event(&mut self, event: Event) {
        self.event_log.log(event);
    }

    /// Hand the logs over to the caller at the end of a run
    pub(crate) fn into_parts(self) -> StateParts {
        StateParts {
            doctors: self.doctors,
            queue: self.queue,
            consultation_log: self.consultation_log,
            abandoned: self.abandoned,
            event_log: self.event_log,
            injected: self.injected,
            max_queue_length: self.max_queue_length,
        }
    }

    // ========================================================================
    // Invariant checks
    // ========================================================================

    /// No patient is both queued and assigned to a doctor, and no patient is
    /// assigned to two doctors
    pub fn no_double_booking(&self) -> bool {
        let mut assigned: Vec<&str> = self
            .doctors
            .iter()
            .filter_map(|d| d.current_patient())
            .collect();
        if assigned.iter().any(|id| self.queue.contains(id)) {
            return false;
        }
        let before = assigned.len();
        assigned.sort_unstable();
        assigned.dedup();
        assigned.len() == before
    }
}

/// Owned pieces of a finished run
#[derive(Debug)]
pub(crate) struct StateParts {
    pub doctors: Vec<Doctor>,
    pub queue: WaitingQueue,
    pub consultation_log: Vec<ConsultationRecord>,
    pub abandoned: Vec<AbandonmentRecord>,
    pub event_log: EventLog,
    pub injected: usize,
    pub max_queue_length: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::doctor::BreakPolicy;
    use crate::models::patient::Priority;

    fn policy() -> BreakPolicy {
        BreakPolicy {
            frequency: 60.0,
            duration: 15.0,
            max_breaks: 2,
        }
    }

    fn state() -> SimulationState {
        SimulationState::new(vec![
            Doctor::new("d1", "General", policy()),
            Doctor::new("d2", "Cardiology", policy()),
            Doctor::new("d3", "General", policy()),
        ])
    }

    #[test]
    fn test_doctor_lookup_and_counts() {
        let state = state();
        assert_eq!(state.get_doctor("d2").unwrap().specialty(), "Cardiology");
        assert!(state.get_doctor("missing").is_none());
        assert_eq!(state.doctors_by_specialty().get("General"), Some(&2));
        assert_eq!(state.free_doctor_indices(), vec![0, 1, 2]);
    }

    #[test]
    fn test_injection_counts_and_logs() {
        let mut state = state();
        state.inject_patient(Patient::new("p1", Priority::Low, "General"), 3.0);
        state.inject_patient(Patient::new("p2", Priority::Urgent, "General"), 4.0);

        assert_eq!(state.injected_patients(), 2);
        assert_eq!(state.max_queue_length(), 2);
        assert_eq!(state.queue().peek().unwrap().id(), "p2");
        assert_eq!(state.event_log().events_of_type("PatientArrived").len(), 2);
    }

    #[test]
    fn test_double_booking_detected() {
        let mut state = state();
        state.inject_patient(Patient::new("p1", Priority::Normal, "General"), 0.0);
        state.doctors_mut()[0]
            .start_consultation("p1", 1.0, 10.0)
            .unwrap();
        assert!(!state.no_double_booking());

        state.queue_mut().remove("p1");
        assert!(state.no_double_booking());
    }

    #[test]
    fn test_rates_without_consultations_are_zero() {
        let state = state();
        assert_eq!(state.mean_consultation_time(), 0.0);
        assert_eq!(state.specialty_match_rate(), 0.0);
        assert_eq!(state.mean_occupancy(10.0), 0.0);
    }
}
