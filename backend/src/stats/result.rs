//! Final run result
//!
//! Everything the caller needs once a run ends: aggregate counts, the
//! consultation log, abandoned records, the snapshot series, the event log,
//! and per-doctor and per-specialty breakdowns.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::models::doctor::{BreakRecord, Doctor};
use crate::models::event::{AbandonmentRecord, ConsultationRecord, EventLog};
use crate::models::patient::Priority;
use crate::models::state::StateParts;
use crate::orchestrator::SimulationConfig;
use crate::stats::{Snapshot, StatisticsCollector};

/// How one doctor spent the run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoctorPerformance {
    pub doctor_id: String,
    pub specialty: String,
    pub consultations: u32,
    pub matched_consultations: u32,
    /// Percent of this doctor's consultations with matching specialty
    pub match_rate: f64,
    /// Busy minutes, including a consultation still running at the end
    pub busy_time: f64,
    /// Percent of the run spent busy
    pub occupancy: f64,
    pub breaks_taken: u32,
    pub breaks: Vec<BreakRecord>,
}

/// Per-specialty aggregates
///
/// Served counts go to the specialty of the doctor who saw the patient;
/// abandoned and queued counts go to the patient's required specialty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpecialtyStats {
    pub specialty: String,
    pub doctors: usize,
    pub patients_served: usize,
    pub urgent_served: usize,
    pub patients_abandoned: usize,
    pub still_queued: usize,
    /// Mean occupancy of this specialty's doctors (0 with no doctors)
    pub mean_occupancy: f64,
}

/// Outcome of a complete run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationResult {
    pub run_id: Uuid,
    /// SHA-256 of the canonical configuration JSON
    pub config_hash: String,
    pub config: SimulationConfig,

    pub served: usize,
    pub abandoned: usize,
    pub still_queued: usize,
    pub never_arrived: usize,
    pub total_patients: usize,

    pub mean_occupancy: f64,
    pub max_queue_length: usize,
    /// Positive snapshot mean-waits averaged with one extra zero sample
    pub mean_wait: f64,
    /// Mean wait of dispatched patients at dispatch time
    pub mean_wait_served: f64,
    pub mean_consultation_time: f64,
    pub specialty_match_rate: f64,

    pub consultation_log: Vec<ConsultationRecord>,
    pub abandoned_patients: Vec<AbandonmentRecord>,
    pub snapshots: Vec<Snapshot>,
    pub event_log: EventLog,

    pub doctor_performance: Vec<DoctorPerformance>,
    pub specialty_stats: BTreeMap<String, SpecialtyStats>,
}

impl SimulationResult {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn assemble(
        run_id: Uuid,
        config_hash: String,
        config: SimulationConfig,
        parts: StateParts,
        stats: StatisticsCollector,
        now: f64,
        selected: usize,
        never_arrived: usize,
    ) -> Self {
        let doctor_performance: Vec<DoctorPerformance> = parts
            .doctors
            .iter()
            .map(|d| doctor_performance(d, &parts.consultation_log, now))
            .collect();

        let specialty_stats = specialty_stats(&parts, &doctor_performance);

        let mean_occupancy = if doctor_performance.is_empty() {
            0.0
        } else {
            doctor_performance.iter().map(|p| p.occupancy).sum::<f64>()
                / doctor_performance.len() as f64
        };

        let log = &parts.consultation_log;
        let served = log.len();
        let mean_wait_served = mean_by(log, |r| r.wait_time);
        let mean_consultation_time = mean_by(log, |r| r.duration);
        let specialty_match_rate =
            mean_by(log, |r| if r.specialty_matched { 100.0 } else { 0.0 });

        let max_queue_length = parts.max_queue_length.max(stats.max_queue_length());
        let mean_wait = stats.mean_wait();

        Self {
            run_id,
            config_hash,
            config,
            served,
            abandoned: parts.abandoned.len(),
            still_queued: parts.queue.len(),
            never_arrived,
            total_patients: selected + parts.injected,
            mean_occupancy,
            max_queue_length,
            mean_wait,
            mean_wait_served,
            mean_consultation_time,
            specialty_match_rate,
            consultation_log: parts.consultation_log,
            abandoned_patients: parts.abandoned,
            snapshots: stats.into_snapshots(),
            event_log: parts.event_log,
            doctor_performance,
            specialty_stats,
        }
    }

    /// Served + abandoned + still queued + never arrived equals the total
    pub fn is_conserved(&self) -> bool {
        self.served + self.abandoned + self.still_queued + self.never_arrived == self.total_patients
    }

    /// Serialize to a JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

fn mean_by(log: &[ConsultationRecord], f: impl Fn(&ConsultationRecord) -> f64) -> f64 {
    if log.is_empty() {
        0.0
    } else {
        log.iter().map(f).sum::<f64>() / log.len() as f64
    }
}

fn doctor_performance(doctor: &Doctor, log: &[ConsultationRecord], now: f64) -> DoctorPerformance {
    let matched = log
        .iter()
        .filter(|r| r.doctor_id == doctor.id() && r.specialty_matched)
        .count() as u32;
    let consultations = doctor.consultations();
    let match_rate = if consultations == 0 {
        0.0
    } else {
        matched as f64 / consultations as f64 * 100.0
    };

    DoctorPerformance {
        doctor_id: doctor.id().to_string(),
        specialty: doctor.specialty().to_string(),
        consultations,
        matched_consultations: matched,
        match_rate,
        busy_time: doctor.busy_time_at(now),
        occupancy: doctor.occupancy(now),
        breaks_taken: doctor.breaks_taken(),
        breaks: doctor.breaks().to_vec(),
    }
}

fn specialty_stats(
    parts: &StateParts,
    performance: &[DoctorPerformance],
) -> BTreeMap<String, SpecialtyStats> {
    let mut stats: BTreeMap<String, SpecialtyStats> = BTreeMap::new();

    for p in performance {
        let s = specialty_entry(&mut stats, &p.specialty);
        s.doctors += 1;
        s.mean_occupancy += p.occupancy;
    }
    for record in &parts.consultation_log {
        let s = specialty_entry(&mut stats, &record.doctor_specialty);
        s.patients_served += 1;
        if record.priority == Priority::Urgent {
            s.urgent_served += 1;
        }
    }
    for record in &parts.abandoned {
        specialty_entry(&mut stats, &record.required_specialty).patients_abandoned += 1;
    }
    for patient in parts.queue.iter() {
        specialty_entry(&mut stats, patient.required_specialty()).still_queued += 1;
    }

    for s in stats.values_mut() {
        if s.doctors > 0 {
            s.mean_occupancy /= s.doctors as f64;
        }
    }
    stats
}

fn specialty_entry<'a>(
    stats: &'a mut BTreeMap<String, SpecialtyStats>,
    specialty: &str,
) -> &'a mut SpecialtyStats {
    stats
        .entry(specialty.to_string())
        .or_insert_with(|| SpecialtyStats {
            specialty: specialty.to_string(),
            ..SpecialtyStats::default()
        })
}
