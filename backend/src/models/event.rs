//! Event logging for simulation replay and analysis.
//!
//! Two append-only records are kept per run:
//!
//! - **Consultation log** (`ConsultationRecord`): one entry per dispatch,
//!   the primary output consumed by reporting collaborators.
//! - **Event log** (`Event`): every state change, stamped with the simulated
//!   time at which it happened, in the order it happened within a step.
//!
//! # Event Types
//!
//! - **PatientArrived**: patient drawn from the pool and enqueued
//! - **ConsultationStarted** / **ConsultationCompleted**: doctor Busy transitions
//! - **BreakStarted** / **BreakEnded**: doctor OnBreak transitions
//! - **PatientAbandoned**: patient reneged after waiting too long
//!
//! # Example
//!
//! ```rust
//! use clinic_simulator_core_rs::models::event::{Event, EventLog};
//! use clinic_simulator_core_rs::Priority;
//!
//! let mut log = EventLog::new();
//! log.log(Event::PatientArrived {
//!     time: 3.5,
//!     patient_id: "p1".to_string(),
//!     priority: Priority::High,
//!     required_specialty: "Cardiology".to_string(),
//! });
//!
//! assert_eq!(log.events_for_patient("p1").len(), 1);
//! ```

use serde::{Deserialize, Serialize};

use crate::models::patient::Priority;

/// One dispatch of a patient to a doctor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsultationRecord {
    pub patient_id: String,
    pub doctor_id: String,
    /// Simulated time the consultation started
    pub start_time: f64,
    /// Drawn consultation length in minutes (after clamping)
    pub duration: f64,
    /// Doctor specialty equals the patient's required specialty
    pub specialty_matched: bool,
    /// Minutes the patient waited in the queue
    pub wait_time: f64,
    pub priority: Priority,
    pub required_specialty: String,
    pub doctor_specialty: String,
}

/// A patient that left the queue before being seen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbandonmentRecord {
    pub patient_id: String,
    pub priority: Priority,
    pub required_specialty: String,
    pub arrival_time: f64,
    pub abandoned_at: f64,
    pub wait_time: f64,
    pub reason: String,
}

/// Simulation event capturing a state change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    PatientArrived {
        time: f64,
        patient_id: String,
        priority: Priority,
        required_specialty: String,
    },

    ConsultationStarted {
        time: f64,
        patient_id: String,
        doctor_id: String,
        duration: f64,
        specialty_matched: bool,
    },

    ConsultationCompleted {
        time: f64,
        patient_id: String,
        doctor_id: String,
        /// Busy minutes credited to the doctor
        elapsed: f64,
    },

    BreakStarted {
        time: f64,
        doctor_id: String,
        until: f64,
    },

    BreakEnded {
        time: f64,
        doctor_id: String,
        breaks_taken: u32,
    },

    PatientAbandoned {
        time: f64,
        patient_id: String,
        wait_time: f64,
        reason: String,
    },
}

impl Event {
    /// Simulated time when this event occurred
    pub fn time(&self) -> f64 {
        match self {
            Event::PatientArrived { time, .. }
            | Event::ConsultationStarted { time, .. }
            | Event::ConsultationCompleted { time, .. }
            | Event::BreakStarted { time, .. }
            | Event::BreakEnded { time, .. }
            | Event::PatientAbandoned { time, .. } => *time,
        }
    }

    /// Short description of the event type
    pub fn event_type(&self) -> &'static str {
        match self {
            Event::PatientArrived { .. } => "PatientArrived",
            Event::ConsultationStarted { .. } => "ConsultationStarted",
            Event::ConsultationCompleted { .. } => "ConsultationCompleted",
            Event::BreakStarted { .. } => "BreakStarted",
            Event::BreakEnded { .. } => "BreakEnded",
            Event::PatientAbandoned { .. } => "PatientAbandoned",
        }
    }

    /// Patient ID if the event concerns a patient
    pub fn patient_id(&self) -> Option<&str> {
        match self {
            Event::PatientArrived { patient_id, .. }
            | Event::ConsultationStarted { patient_id, .. }
            | Event::ConsultationCompleted { patient_id, .. }
            | Event::PatientAbandoned { patient_id, .. } => Some(patient_id),
            _ => None,
        }
    }

    /// Doctor ID if the event concerns a doctor
    pub fn doctor_id(&self) -> Option<&str> {
        match self {
            Event::ConsultationStarted { doctor_id, .. }
            | Event::ConsultationCompleted { doctor_id, .. }
            | Event::BreakStarted { doctor_id, .. }
            | Event::BreakEnded { doctor_id, .. } => Some(doctor_id),
            _ => None,
        }
    }
}

/// Append-only event log with query helpers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Add an event to the log
    pub fn log(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Events of a specific type
    pub fn events_of_type(&self, event_type: &str) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|e| e.event_type() == event_type)
            .collect()
    }

    /// Events in the half-open time window [from, to)
    pub fn events_between(&self, from: f64, to: f64) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|e| e.time() >= from && e.time() < to)
            .collect()
    }

    pub fn events_for_patient(&self, patient_id: &str) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|e| e.patient_id() == Some(patient_id))
            .collect()
    }

    pub fn events_for_doctor(&self, doctor_id: &str) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|e| e.doctor_id() == Some(doctor_id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn break_started(time: f64, doctor: &str) -> Event {
        Event::BreakStarted {
            time,
            doctor_id: doctor.to_string(),
            until: time + 15.0,
        }
    }

    #[test]
    fn test_event_accessors() {
        let event = Event::ConsultationStarted {
            time: 12.0,
            patient_id: "p7".to_string(),
            doctor_id: "d2".to_string(),
            duration: 9.5,
            specialty_matched: true,
        };
        assert_eq!(event.time(), 12.0);
        assert_eq!(event.event_type(), "ConsultationStarted");
        assert_eq!(event.patient_id(), Some("p7"));
        assert_eq!(event.doctor_id(), Some("d2"));

        assert_eq!(break_started(1.0, "d1").patient_id(), None);
    }

    #[test]
    fn test_event_log_queries() {
        let mut log = EventLog::new();
        log.log(break_started(60.0, "d1"));
        log.log(break_started(61.0, "d2"));
        log.log(Event::BreakEnded {
            time: 75.0,
            doctor_id: "d1".to_string(),
            breaks_taken: 1,
        });

        assert_eq!(log.len(), 3);
        assert_eq!(log.events_of_type("BreakStarted").len(), 2);
        assert_eq!(log.events_for_doctor("d1").len(), 2);
        assert_eq!(log.events_between(60.0, 61.0).len(), 1);
    }
}
