//! Doctor model
//!
//! Each doctor is a resource slot with a three-state machine:
//!
//! ```text
//!            dispatch match             clock >= busy_until
//!   Free ───────────────────▶ Busy ─────────────────────────▶ Free
//!     │                                                        ▲
//!     │ break granted                     clock >= break_until │
//!     └──────────────────────▶ OnBreak ────────────────────────┘
//! ```
//!
//! The current patient only exists inside the `Busy` state, so a doctor can
//! never hold a patient while free or on break.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by illegal state transitions
#[derive(Debug, Error, PartialEq)]
pub enum DoctorError {
    #[error("Doctor {doctor_id} cannot {action}: currently {status}")]
    NotFree {
        doctor_id: String,
        action: &'static str,
        status: &'static str,
    },
}

/// Doctor record as supplied by the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoctorRecord {
    pub id: String,
    /// Missing specialty resolves to the configured default specialty
    #[serde(default)]
    pub specialty: Option<String>,
}

impl DoctorRecord {
    pub fn new(id: impl Into<String>, specialty: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            specialty: Some(specialty.into()),
        }
    }
}

/// Per-doctor break policy
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BreakPolicy {
    /// Minutes between break opportunities
    pub frequency: f64,
    /// Minutes per break
    pub duration: f64,
    /// Breaks allowed per run
    pub max_breaks: u32,
}

/// A completed break
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BreakRecord {
    pub start: f64,
    pub end: f64,
}

/// Current state of a doctor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DoctorStatus {
    Free,
    Busy {
        patient_id: String,
        started_at: f64,
        busy_until: f64,
    },
    OnBreak {
        started_at: f64,
        break_until: f64,
    },
}

impl DoctorStatus {
    pub fn name(&self) -> &'static str {
        match self {
            DoctorStatus::Free => "free",
            DoctorStatus::Busy { .. } => "busy",
            DoctorStatus::OnBreak { .. } => "on break",
        }
    }
}

/// A consultation that just finished
#[derive(Debug, Clone, PartialEq)]
pub struct CompletedConsultation {
    pub patient_id: String,
    pub started_at: f64,
    /// Busy minutes credited to the doctor
    pub elapsed: f64,
}

/// A doctor inside the simulation
///
/// # Example
/// ```
/// use clinic_simulator_core_rs::{BreakPolicy, Doctor};
///
/// let policy = BreakPolicy { frequency: 60.0, duration: 15.0, max_breaks: 2 };
/// let mut doctor = Doctor::new("d1", "General", policy);
///
/// doctor.start_consultation("p1", 0.0, 12.0).unwrap();
/// assert_eq!(doctor.current_patient(), Some("p1"));
///
/// let done = doctor.complete_consultation_if_due(12.5).unwrap();
/// assert_eq!(done.patient_id, "p1");
/// assert!(doctor.is_free());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Doctor {
    id: String,
    specialty: String,
    status: DoctorStatus,
    policy: BreakPolicy,
    /// Cumulative busy minutes of finished consultations
    busy_time: f64,
    /// Consultations started
    consultations: u32,
    breaks_taken: u32,
    breaks: Vec<BreakRecord>,
}

impl Doctor {
    pub fn new(id: impl Into<String>, specialty: impl Into<String>, policy: BreakPolicy) -> Self {
        Self {
            id: id.into(),
            specialty: specialty.into(),
            status: DoctorStatus::Free,
            policy,
            busy_time: 0.0,
            consultations: 0,
            breaks_taken: 0,
            breaks: Vec::new(),
        }
    }

    /// Resolve a caller record into a doctor
    pub fn from_record(record: &DoctorRecord, default_specialty: &str, policy: BreakPolicy) -> Self {
        let specialty = record
            .specialty
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(default_specialty);
        Self::new(record.id.clone(), specialty, policy)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn specialty(&self) -> &str {
        &self.specialty
    }

    pub fn status(&self) -> &DoctorStatus {
        &self.status
    }

    pub fn policy(&self) -> &BreakPolicy {
        &self.policy
    }

    pub fn is_free(&self) -> bool {
        matches!(self.status, DoctorStatus::Free)
    }

    pub fn is_busy(&self) -> bool {
        matches!(self.status, DoctorStatus::Busy { .. })
    }

    pub fn is_on_break(&self) -> bool {
        matches!(self.status, DoctorStatus::OnBreak { .. })
    }

    /// Patient currently in consultation, if busy
    pub fn current_patient(&self) -> Option<&str> {
        match &self.status {
            DoctorStatus::Busy { patient_id, .. } => Some(patient_id),
            _ => None,
        }
    }

    pub fn busy_until(&self) -> Option<f64> {
        match self.status {
            DoctorStatus::Busy { busy_until, .. } => Some(busy_until),
            _ => None,
        }
    }

    pub fn break_until(&self) -> Option<f64> {
        match self.status {
            DoctorStatus::OnBreak { break_until, .. } => Some(break_until),
            _ => None,
        }
    }

    pub fn consultations(&self) -> u32 {
        self.consultations
    }

    pub fn breaks_taken(&self) -> u32 {
        self.breaks_taken
    }

    pub fn breaks(&self) -> &[BreakRecord] {
        &self.breaks
    }

    /// Busy minutes of finished consultations only
    pub fn busy_time(&self) -> f64 {
        self.busy_time
    }

    /// Busy minutes including the consultation in progress
    pub fn busy_time_at(&self, now: f64) -> f64 {
        match self.status {
            DoctorStatus::Busy { started_at, .. } => self.busy_time + (now - started_at).max(0.0),
            _ => self.busy_time,
        }
    }

    /// Occupancy percentage at `now`, clamped to [0, 100]
    pub fn occupancy(&self, now: f64) -> f64 {
        if now <= 0.0 {
            return 0.0;
        }
        (self.busy_time_at(now) / now * 100.0).clamp(0.0, 100.0)
    }

    /// Free → Busy
    pub fn start_consultation(
        &mut self,
        patient_id: impl Into<String>,
        now: f64,
        duration: f64,
    ) -> Result<(), DoctorError> {
        self.require_free("start a consultation")?;
        self.status = DoctorStatus::Busy {
            patient_id: patient_id.into(),
            started_at: now,
            busy_until: now + duration,
        };
        self.consultations += 1;
        Ok(())
    }

    /// Busy → Free once `now >= busy_until`
    pub fn complete_consultation_if_due(&mut self, now: f64) -> Option<CompletedConsultation> {
        let (started_at, busy_until) = match self.status {
            DoctorStatus::Busy {
                started_at,
                busy_until,
                ..
            } => (started_at, busy_until),
            _ => return None,
        };
        if now < busy_until {
            return None;
        }

        let status = std::mem::replace(&mut self.status, DoctorStatus::Free);
        let patient_id = match status {
            DoctorStatus::Busy { patient_id, .. } => patient_id,
            _ => unreachable!("status checked above"),
        };
        let elapsed = (now - started_at).max(0.0);
        self.busy_time += elapsed;

        Some(CompletedConsultation {
            patient_id,
            started_at,
            elapsed,
        })
    }

    /// Break opportunity reached: not on break, quota left, and the
    /// `(breaks_taken + 1) × frequency` mark has passed
    pub fn is_due_for_break(&self, now: f64) -> bool {
        !self.is_on_break()
            && self.breaks_taken < self.policy.max_breaks
            && now >= (self.breaks_taken + 1) as f64 * self.policy.frequency
    }

    /// Free → OnBreak
    pub fn start_break(&mut self, now: f64) -> Result<(), DoctorError> {
        self.require_free("start a break")?;
        self.status = DoctorStatus::OnBreak {
            started_at: now,
            break_until: now + self.policy.duration,
        };
        Ok(())
    }

    /// OnBreak → Free once `now >= break_until`
    pub fn end_break_if_due(&mut self, now: f64) -> Option<BreakRecord> {
        let started_at = match self.status {
            DoctorStatus::OnBreak {
                started_at,
                break_until,
            } if now >= break_until => started_at,
            _ => return None,
        };

        self.status = DoctorStatus::Free;
        self.breaks_taken += 1;
        let record = BreakRecord {
            start: started_at,
            end: now,
        };
        self.breaks.push(record);
        Some(record)
    }

    fn require_free(&self, action: &'static str) -> Result<(), DoctorError> {
        if self.is_free() {
            Ok(())
        } else {
            Err(DoctorError::NotFree {
                doctor_id: self.id.clone(),
                action,
                status: self.status.name(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> BreakPolicy {
        BreakPolicy {
            frequency: 60.0,
            duration: 15.0,
            max_breaks: 2,
        }
    }

    #[test]
    fn test_busy_doctor_rejects_second_consultation() {
        let mut doctor = Doctor::new("d1", "General", policy());
        doctor.start_consultation("p1", 0.0, 10.0).unwrap();

        let err = doctor.start_consultation("p2", 1.0, 10.0).unwrap_err();
        assert!(matches!(err, DoctorError::NotFree { status: "busy", .. }));
        assert_eq!(doctor.current_patient(), Some("p1"));
    }

    #[test]
    fn test_consultation_not_complete_before_busy_until() {
        let mut doctor = Doctor::new("d1", "General", policy());
        doctor.start_consultation("p1", 5.0, 10.0).unwrap();
        assert!(doctor.complete_consultation_if_due(14.9).is_none());

        let done = doctor.complete_consultation_if_due(15.5).unwrap();
        assert_eq!(done.elapsed, 10.5);
        assert_eq!(doctor.busy_time(), 10.5);
    }

    #[test]
    fn test_break_due_schedule() {
        let mut doctor = Doctor::new("d1", "General", policy());
        assert!(!doctor.is_due_for_break(59.0));
        assert!(doctor.is_due_for_break(60.0));

        doctor.start_break(60.0).unwrap();
        assert!(!doctor.is_due_for_break(70.0));
        assert!(doctor.end_break_if_due(74.0).is_none());

        let record = doctor.end_break_if_due(75.0).unwrap();
        assert_eq!(record, BreakRecord { start: 60.0, end: 75.0 });
        assert_eq!(doctor.breaks_taken(), 1);

        // Next opportunity at (1 + 1) × 60
        assert!(!doctor.is_due_for_break(100.0));
        assert!(doctor.is_due_for_break(120.0));
    }

    #[test]
    fn test_break_quota_exhausted() {
        let mut doctor = Doctor::new("d1", "General", policy());
        for start in [60.0, 120.0] {
            doctor.start_break(start).unwrap();
            doctor.end_break_if_due(start + 15.0).unwrap();
        }
        assert!(!doctor.is_due_for_break(1000.0));
    }

    #[test]
    fn test_occupancy_includes_running_consultation_and_is_clamped() {
        let mut doctor = Doctor::new("d1", "General", policy());
        assert_eq!(doctor.occupancy(0.0), 0.0);

        doctor.start_consultation("p1", 10.0, 30.0).unwrap();
        assert!((doctor.occupancy(20.0) - 50.0).abs() < 1e-9);
        assert!(doctor.occupancy(1000.0) <= 100.0);
    }

    #[test]
    fn test_from_record_defaults_specialty() {
        let record = DoctorRecord {
            id: "d9".to_string(),
            specialty: None,
        };
        let doctor = Doctor::from_record(&record, "General", policy());
        assert_eq!(doctor.specialty(), "General");
    }
}
