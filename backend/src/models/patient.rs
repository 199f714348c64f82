//! Patient model
//!
//! A patient carries:
//! - Identity
//! - Priority (URGENT > HIGH > NORMAL > LOW)
//! - Required specialty label (resolved once, at construction)
//! - Arrival timestamp, stamped when the patient is actually enqueued
//!
//! Patients are created from caller-supplied `PatientRecord`s when the
//! arrival pool is drawn.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::triage::TriageTable;

/// Triage priority
///
/// Variants are declared from most to least urgent, so the derived `Ord`
/// sorts URGENT first. `rank()` exposes the same order numerically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    #[serde(alias = "urgent", alias = "EMERGENCY", alias = "emergency")]
    Urgent,
    #[serde(alias = "high")]
    High,
    #[serde(alias = "normal", alias = "MEDIUM", alias = "medium")]
    Normal,
    #[serde(alias = "low")]
    Low,
}

/// Error returned by strict priority parsing
#[derive(Debug, Error, PartialEq)]
#[error("Unknown priority label '{0}' (expected urgent, high, normal or low)")]
pub struct ParsePriorityError(pub String);

impl Priority {
    /// Numeric rank: 0 for URGENT up to 3 for LOW
    pub fn rank(self) -> u8 {
        match self {
            Priority::Urgent => 0,
            Priority::High => 1,
            Priority::Normal => 2,
            Priority::Low => 3,
        }
    }

    /// Upper-case label
    pub fn name(self) -> &'static str {
        match self {
            Priority::Urgent => "URGENT",
            Priority::High => "HIGH",
            Priority::Normal => "NORMAL",
            Priority::Low => "LOW",
        }
    }

    /// Lenient parse used for imported records: unknown labels become NORMAL
    ///
    /// # Example
    /// ```
    /// use clinic_simulator_core_rs::Priority;
    ///
    /// assert_eq!(Priority::from_label_or_normal("Emergency"), Priority::Urgent);
    /// assert_eq!(Priority::from_label_or_normal("whatever"), Priority::Normal);
    /// ```
    pub fn from_label_or_normal(label: &str) -> Self {
        label.parse().unwrap_or(Priority::Normal)
    }
}

impl FromStr for Priority {
    type Err = ParsePriorityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "urgent" | "emergency" => Ok(Priority::Urgent),
            "high" => Ok(Priority::High),
            "normal" | "medium" => Ok(Priority::Normal),
            "low" => Ok(Priority::Low),
            _ => Err(ParsePriorityError(s.to_string())),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Patient record as supplied by the caller
///
/// `required_specialty` wins over `condition`; when both are absent the
/// patient needs the default (generic) specialty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientRecord {
    pub id: String,
    pub priority: Priority,
    #[serde(default)]
    pub required_specialty: Option<String>,
    #[serde(default)]
    pub condition: Option<String>,
}

impl PatientRecord {
    /// Record with an explicit required specialty
    pub fn new(id: impl Into<String>, priority: Priority, specialty: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            priority,
            required_specialty: Some(specialty.into()),
            condition: None,
        }
    }

    /// Record whose specialty is derived from a free-text condition
    pub fn with_condition(id: impl Into<String>, priority: Priority, condition: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            priority,
            required_specialty: None,
            condition: Some(condition.into()),
        }
    }
}

/// A patient inside the simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    id: String,
    priority: Priority,
    required_specialty: String,
    condition: Option<String>,
    /// Set when the patient enters the waiting queue
    arrival_time: Option<f64>,
}

impl Patient {
    /// Create a patient that has not arrived yet
    ///
    /// # Example
    /// ```
    /// use clinic_simulator_core_rs::{Patient, Priority};
    ///
    /// let p = Patient::new("p1", Priority::High, "Cardiology");
    /// assert_eq!(p.required_specialty(), "Cardiology");
    /// assert!(p.arrival_time().is_none());
    /// ```
    pub fn new(id: impl Into<String>, priority: Priority, required_specialty: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            priority,
            required_specialty: required_specialty.into(),
            condition: None,
            arrival_time: None,
        }
    }

    /// Resolve a caller record into a patient
    pub fn from_record(record: &PatientRecord, triage: &TriageTable, default_specialty: &str) -> Self {
        let required_specialty = match (&record.required_specialty, &record.condition) {
            (Some(specialty), _) if !specialty.trim().is_empty() => specialty.trim().to_string(),
            (_, Some(condition)) => triage
                .specialty_for(condition)
                .unwrap_or(default_specialty)
                .to_string(),
            _ => default_specialty.to_string(),
        };

        Self {
            id: record.id.clone(),
            priority: record.priority,
            required_specialty,
            condition: record.condition.clone(),
            arrival_time: None,
        }
    }

    /// Builder used by tests and callers injecting already-queued patients
    pub fn arrived_at(mut self, time: f64) -> Self {
        self.arrival_time = Some(time);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn required_specialty(&self) -> &str {
        &self.required_specialty
    }

    pub fn condition(&self) -> Option<&str> {
        self.condition.as_deref()
    }

    pub fn arrival_time(&self) -> Option<f64> {
        self.arrival_time
    }

    /// Stamp the arrival time (called on enqueue)
    pub fn mark_arrived(&mut self, time: f64) {
        self.arrival_time = Some(time);
    }

    /// Minutes waited so far; zero for a patient that has not arrived
    pub fn wait_time(&self, now: f64) -> f64 {
        match self.arrival_time {
            Some(arrived) => (now - arrived).max(0.0),
            None => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_order_urgent_first() {
        let mut list = vec![Priority::Low, Priority::Urgent, Priority::Normal, Priority::High];
        list.sort();
        assert_eq!(
            list,
            vec![Priority::Urgent, Priority::High, Priority::Normal, Priority::Low]
        );
        assert!(Priority::Urgent.rank() < Priority::Low.rank());
    }

    #[test]
    fn test_priority_strict_parse_rejects_unknown() {
        assert_eq!("HIGH".parse::<Priority>(), Ok(Priority::High));
        assert_eq!(" medium ".parse::<Priority>(), Ok(Priority::Normal));
        assert!("critical".parse::<Priority>().is_err());
    }

    #[test]
    fn test_priority_serde_labels() {
        let json = serde_json::to_string(&Priority::Urgent).unwrap();
        assert_eq!(json, "\"URGENT\"");
        let parsed: Priority = serde_json::from_str("\"LOW\"").unwrap();
        assert_eq!(parsed, Priority::Low);
    }

    #[test]
    fn test_from_record_prefers_explicit_specialty() {
        let triage = TriageTable::default();
        let mut record = PatientRecord::with_condition("p1", Priority::Normal, "asthma");
        record.required_specialty = Some("Cardiology".to_string());

        let patient = Patient::from_record(&record, &triage, "General");
        assert_eq!(patient.required_specialty(), "Cardiology");
    }

    #[test]
    fn test_from_record_uses_triage_then_default() {
        let triage = TriageTable::default();

        let asthma = PatientRecord::with_condition("p1", Priority::Normal, "Severe asthma attack");
        assert_eq!(
            Patient::from_record(&asthma, &triage, "General").required_specialty(),
            "Pulmonology"
        );

        let unknown = PatientRecord::with_condition("p2", Priority::Low, "routine checkup");
        assert_eq!(
            Patient::from_record(&unknown, &triage, "General").required_specialty(),
            "General"
        );
    }

    #[test]
    fn test_wait_time_before_arrival_is_zero() {
        let p = Patient::new("p1", Priority::Normal, "General");
        assert_eq!(p.wait_time(100.0), 0.0);
        let p = p.arrived_at(40.0);
        assert_eq!(p.wait_time(100.0), 60.0);
    }
}
