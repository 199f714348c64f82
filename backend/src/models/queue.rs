//! Waiting queue
//!
//! Patients waiting to be seen, kept in priority order. Every structural
//! change (enqueue, removal) is followed by a stable sort on priority rank,
//! so within a rank the original arrival order is preserved.
//!
//! # Invariant
//!
//! Immediately after any insert or remove the sequence is non-decreasing in
//! `Priority::rank()` (URGENT … LOW).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::patient::{Patient, Priority};

/// Priority-ordered queue of waiting patients
///
/// # Example
/// ```
/// use clinic_simulator_core_rs::{Patient, Priority, WaitingQueue};
///
/// let mut queue = WaitingQueue::new();
/// queue.enqueue(Patient::new("p1", Priority::Normal, "General"));
/// queue.enqueue(Patient::new("p2", Priority::Urgent, "General"));
///
/// assert_eq!(queue.peek().unwrap().id(), "p2");
/// assert_eq!(queue.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WaitingQueue {
    patients: Vec<Patient>,
}

impl WaitingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a patient, then restore priority order
    pub fn enqueue(&mut self, patient: Patient) {
        self.patients.push(patient);
        self.resort();
    }

    /// Remove the patient at `index`, then restore priority order
    pub fn remove_at(&mut self, index: usize) -> Option<Patient> {
        if index >= self.patients.len() {
            return None;
        }
        let patient = self.patients.remove(index);
        self.resort();
        Some(patient)
    }

    /// Remove a patient by id
    pub fn remove(&mut self, patient_id: &str) -> Option<Patient> {
        let index = self.position(patient_id)?;
        self.remove_at(index)
    }

    /// Remove every patient matching `pred`, keeping the rest in order
    ///
    /// Removed patients are returned in their former queue order.
    pub fn remove_where<F>(&mut self, mut pred: F) -> Vec<Patient>
    where
        F: FnMut(&Patient) -> bool,
    {
        let (removed, kept): (Vec<Patient>, Vec<Patient>) =
            std::mem::take(&mut self.patients).into_iter().partition(|p| pred(p));
        self.patients = kept;
        self.resort();
        removed
    }

    /// Front of the queue
    pub fn peek(&self) -> Option<&Patient> {
        self.patients.first()
    }

    pub fn get(&self, index: usize) -> Option<&Patient> {
        self.patients.get(index)
    }

    pub fn len(&self) -> usize {
        self.patients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patients.is_empty()
    }

    /// Iterate front to back
    pub fn iter(&self) -> std::slice::Iter<'_, Patient> {
        self.patients.iter()
    }

    pub fn as_slice(&self) -> &[Patient] {
        &self.patients
    }

    pub fn position(&self, patient_id: &str) -> Option<usize> {
        self.patients.iter().position(|p| p.id() == patient_id)
    }

    pub fn contains(&self, patient_id: &str) -> bool {
        self.position(patient_id).is_some()
    }

    /// Waiting patients per required specialty
    pub fn count_by_specialty(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for patient in &self.patients {
            *counts.entry(patient.required_specialty().to_string()).or_insert(0) += 1;
        }
        counts
    }

    /// Waiting patients with the given priority
    pub fn count_priority(&self, priority: Priority) -> usize {
        self.patients.iter().filter(|p| p.priority() == priority).count()
    }

    /// Mean wait of queued patients at `now` (0 when empty)
    pub fn mean_wait(&self, now: f64) -> f64 {
        if self.patients.is_empty() {
            return 0.0;
        }
        let total: f64 = self.patients.iter().map(|p| p.wait_time(now)).sum();
        total / self.patients.len() as f64
    }

    /// True when ranks are non-decreasing front to back
    pub fn is_priority_ordered(&self) -> bool {
        self.patients
            .windows(2)
            .all(|w| w[0].priority().rank() <= w[1].priority().rank())
    }

    fn resort(&mut self) {
        // Vec::sort_by_key is stable
        self.patients.sort_by_key(|p| p.priority().rank());
    }
}

impl<'a> IntoIterator for &'a WaitingQueue {
    type Item = &'a Patient;
    type IntoIter = std::slice::Iter<'a, Patient>;

    fn into_iter(self) -> Self::IntoIter {
        self.patients.iter()
    }
}
