//! Orchestrator Engine
//!
//! Main simulation loop integrating all components:
//! - Patient arrivals (finite pool, exponential gaps)
//! - Break scheduling (concurrency cap + coverage rule)
//! - Consultation dispatch (specialty match + priority escalation)
//! - Abandonment (reneging past max-wait)
//! - Statistics sampling and event logging
//!
//! # Architecture
//!
//! The external driver calls [`Orchestrator::step`] with a time increment.
//! Each step:
//!
//! ```text
//! 1. Advance the clock (clamped to the horizon)
//! 2. Release a due arrival; offer it to free doctors
//! 3. Start breaks for eligible free doctors
//! 4. End due breaks; each returning doctor tries a dispatch
//! 5. Complete due consultations; each freed doctor tries a dispatch
//! 6. Offer queued patients to any remaining free doctor
//! 7. Remove reneging patients
//! 8. Sample statistics if the sampling interval elapsed
//! ```
//!
//! # Example
//!
//! ```rust
//! use clinic_simulator_core_rs::{
//!     DoctorRecord, Orchestrator, PatientRecord, Priority, SimulationConfig,
//! };
//!
//! let config = SimulationConfig {
//!     arrival_rate: 60.0,
//!     horizon: 30.0,
//!     ..SimulationConfig::default()
//! };
//! let doctors = vec![DoctorRecord::new("d1", "General")];
//! let patients = vec![
//!     PatientRecord::new("p1", Priority::Urgent, "General"),
//!     PatientRecord::new("p2", Priority::Normal, "General"),
//! ];
//!
//! let mut orchestrator = Orchestrator::new(config, doctors, patients).unwrap();
//! while !orchestrator.is_finished() {
//!     orchestrator.step(0.5).unwrap();
//! }
//! let result = orchestrator.finish();
//! assert!(result.is_conserved());
//! ```

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use thiserror::Error;
use uuid::Uuid;

use crate::arrivals::ArrivalProcess;
use crate::core::time::SimulationClock;
use crate::models::doctor::{BreakPolicy, Doctor, DoctorError, DoctorRecord};
use crate::models::event::{ConsultationRecord, Event, EventLog};
use crate::models::patient::{Patient, PatientRecord};
use crate::models::state::SimulationState;
use crate::rng::RngManager;
use crate::scheduling::{
    dispatch_doctor, dispatch_idle_doctors, end_due_breaks, process_abandonment,
    schedule_breaks, AbandonmentRules, ConsultationDistribution, DispatchRules,
};
use crate::stats::{SimulationResult, Snapshot, StatisticsCollector};
use crate::triage::TriageTable;

// ============================================================================
// Configuration Types
// ============================================================================

/// Shortest allowed break (minutes)
pub const MIN_BREAK_DURATION: f64 = 15.0;

/// Longest allowed break (minutes)
pub const MAX_BREAK_DURATION: f64 = 20.0;

/// Longest allowed gap between statistics snapshots, in minutes
pub const MAX_SAMPLE_INTERVAL: f64 = 1.0;

/// Complete run configuration
///
/// Missing fields take their defaults when deserialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Target arrival rate (patients per hour)
    pub arrival_rate: f64,

    /// Mean consultation length (minutes)
    pub mean_consultation_time: f64,

    pub consultation_distribution: ConsultationDistribution,

    /// Run length (minutes)
    pub horizon: f64,

    pub breaks: BreakConfig,

    /// Wait (minutes) after which patients may renege and NORMAL patients escalate
    pub max_wait: f64,

    /// Per-tick probability an over-waiting patient leaves
    pub abandonment_probability: f64,

    /// RNG seed for deterministic simulation
    pub rng_seed: u64,

    /// Minutes between statistics snapshots, in (0, 1]
    pub sample_interval: f64,

    /// Generic specialty; doctors and patients without one get this label
    pub default_specialty: String,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            arrival_rate: 10.0,
            mean_consultation_time: 15.0,
            consultation_distribution: ConsultationDistribution::Exponential,
            horizon: 480.0,
            breaks: BreakConfig::default(),
            max_wait: 30.0,
            abandonment_probability: 0.3,
            rng_seed: 12345,
            sample_interval: 1.0,
            default_specialty: "General".to_string(),
        }
    }
}

/// Doctor break policy shared by the whole pool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BreakConfig {
    /// Minutes between break opportunities
    pub frequency: f64,
    /// Minutes per break, within [15, 20]
    pub duration: f64,
    pub max_breaks_per_doctor: u32,
    /// Doctors allowed on break at once; at most `max(1, doctors / 3)`
    pub max_simultaneous: usize,
}

impl Default for BreakConfig {
    fn default() -> Self {
        Self {
            frequency: 60.0,
            duration: 15.0,
            max_breaks_per_doctor: 2,
            max_simultaneous: 1,
        }
    }
}

impl BreakConfig {
    pub fn policy(&self) -> BreakPolicy {
        BreakPolicy {
            frequency: self.frequency,
            duration: self.duration,
            max_breaks: self.max_breaks_per_doctor,
        }
    }
}

impl SimulationConfig {
    /// Parse a configuration from JSON; absent fields take their defaults
    ///
    /// # Example
    /// ```
    /// use clinic_simulator_core_rs::SimulationConfig;
    ///
    /// let config = SimulationConfig::from_json(r#"{"arrival_rate": 20.0}"#).unwrap();
    /// assert_eq!(config.arrival_rate, 20.0);
    /// assert_eq!(config.horizon, 480.0);
    /// ```
    pub fn from_json(json: &str) -> Result<Self, SimulationError> {
        serde_json::from_str(json).map_err(|e| SimulationError::Configuration {
            field: "json",
            reason: e.to_string(),
        })
    }

    /// Check every field against a pool of `doctor_count` doctors
    ///
    /// Invalid values are rejected, never clamped.
    pub fn validate(&self, doctor_count: usize) -> Result<(), SimulationError> {
        require_positive("arrival_rate", self.arrival_rate)?;
        require_positive("mean_consultation_time", self.mean_consultation_time)?;
        require_positive("horizon", self.horizon)?;
        require_positive("max_wait", self.max_wait)?;
        require_positive("sample_interval", self.sample_interval)?;
        if self.sample_interval > MAX_SAMPLE_INTERVAL {
            return Err(SimulationError::Configuration {
                field: "sample_interval",
                reason: format!(
                    "must be at most {} minute, got {}",
                    MAX_SAMPLE_INTERVAL, self.sample_interval
                ),
            });
        }
        require_positive("breaks.frequency", self.breaks.frequency)?;

        if !(MIN_BREAK_DURATION..=MAX_BREAK_DURATION).contains(&self.breaks.duration) {
            return Err(SimulationError::Configuration {
                field: "breaks.duration",
                reason: format!(
                    "must be between {} and {} minutes, got {}",
                    MIN_BREAK_DURATION, MAX_BREAK_DURATION, self.breaks.duration
                ),
            });
        }

        if self.breaks.max_breaks_per_doctor == 0 {
            return Err(SimulationError::Configuration {
                field: "breaks.max_breaks_per_doctor",
                reason: "must be at least 1".to_string(),
            });
        }

        let cap = (doctor_count / 3).max(1);
        if self.breaks.max_simultaneous > cap {
            return Err(SimulationError::Configuration {
                field: "breaks.max_simultaneous",
                reason: format!(
                    "{} exceeds the limit of {} for {} doctors",
                    self.breaks.max_simultaneous, cap, doctor_count
                ),
            });
        }

        let p = self.abandonment_probability;
        if !(p > 0.0 && p <= 1.0) {
            return Err(SimulationError::Configuration {
                field: "abandonment_probability",
                reason: format!("must be in (0, 1], got {}", p),
            });
        }

        if self.default_specialty.trim().is_empty() {
            return Err(SimulationError::Configuration {
                field: "default_specialty",
                reason: "must not be empty".to_string(),
            });
        }

        Ok(())
    }

    /// SHA-256 of the canonical JSON form, as lowercase hex
    pub fn fingerprint(&self) -> Result<String, SimulationError> {
        let json = serde_json::to_string(self).map_err(|e| SimulationError::Configuration {
            field: "json",
            reason: e.to_string(),
        })?;

        let mut hasher = Sha256::new();
        hasher.update(json.as_bytes());
        Ok(format!("{:x}", hasher.finalize()))
    }

    fn dispatch_rules(&self) -> DispatchRules {
        DispatchRules {
            max_wait: self.max_wait,
            default_specialty: self.default_specialty.clone(),
            distribution: self.consultation_distribution,
            mean_consultation_time: self.mean_consultation_time,
        }
    }

    fn abandonment_rules(&self) -> AbandonmentRules {
        AbandonmentRules {
            max_wait: self.max_wait,
            probability: self.abandonment_probability,
        }
    }
}

fn require_positive(field: &'static str, value: f64) -> Result<(), SimulationError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SimulationError::Configuration {
            field,
            reason: format!("must be a positive number, got {}", value),
        })
    }
}

// ============================================================================
// Results and Errors
// ============================================================================

/// Result of a single step
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    /// Clock time after the step
    pub time: f64,
    pub arrivals: usize,
    pub consultations_started: usize,
    pub consultations_completed: usize,
    pub breaks_started: usize,
    pub breaks_ended: usize,
    pub abandoned: usize,
    /// Queue length at the end of the step
    pub queue_length: usize,
    /// The horizon has been reached
    pub finished: bool,
}

/// Simulation error types
#[derive(Debug, Error, PartialEq)]
pub enum SimulationError {
    /// A configuration value is out of range
    #[error("Invalid configuration for '{field}': {reason}")]
    Configuration { field: &'static str, reason: String },

    /// The run cannot start with the given pools
    #[error("Initialization error: {0}")]
    Initialization(String),

    /// Step increment is not a positive finite number
    #[error("Invalid time step: {0}")]
    InvalidTimeStep(f64),

    /// Illegal doctor transition
    #[error(transparent)]
    Doctor(#[from] DoctorError),
}

// ============================================================================
// Orchestrator
// ============================================================================

/// Owns one simulation run
pub struct Orchestrator {
    config: SimulationConfig,
    clock: SimulationClock,
    rng: RngManager,
    state: SimulationState,
    arrivals: ArrivalProcess,
    stats: StatisticsCollector,
    dispatch_rules: DispatchRules,
    abandonment_rules: AbandonmentRules,
    run_id: Uuid,
    config_hash: String,
    finished: bool,
}

impl Orchestrator {
    /// Create a run seeded from `config.rng_seed`
    ///
    /// # Errors
    ///
    /// * `Initialization` - empty doctor or patient pool, duplicate ids
    /// * `Configuration` - any invalid configuration field
    pub fn new(
        config: SimulationConfig,
        doctors: Vec<DoctorRecord>,
        patients: Vec<PatientRecord>,
    ) -> Result<Self, SimulationError> {
        let rng = RngManager::new(config.rng_seed);
        Self::with_rng(config, doctors, patients, rng)
    }

    /// Create a run with an injected random source
    pub fn with_rng(
        config: SimulationConfig,
        doctors: Vec<DoctorRecord>,
        patients: Vec<PatientRecord>,
        mut rng: RngManager,
    ) -> Result<Self, SimulationError> {
        if doctors.is_empty() {
            return Err(SimulationError::Initialization(
                "doctor pool is empty".to_string(),
            ));
        }
        if patients.is_empty() {
            return Err(SimulationError::Initialization(
                "patient pool is empty".to_string(),
            ));
        }
        config.validate(doctors.len())?;
        check_unique("doctor", doctors.iter().map(|d| d.id.as_str()))?;
        check_unique("patient", patients.iter().map(|p| p.id.as_str()))?;

        let policy = config.breaks.policy();
        let doctors: Vec<Doctor> = doctors
            .iter()
            .map(|record| Doctor::from_record(record, &config.default_specialty, policy))
            .collect();

        let triage = TriageTable::default();
        let pool: Vec<Patient> = patients
            .iter()
            .map(|record| Patient::from_record(record, &triage, &config.default_specialty))
            .collect();

        let arrivals = ArrivalProcess::new(pool, config.arrival_rate, config.horizon, &mut rng);
        let run_id = uuid::Builder::from_random_bytes(rng.next_bytes()).into_uuid();
        let config_hash = config.fingerprint()?;

        log::info!(
            "run {} starting: {} doctors, {} of {} patients selected, horizon {} min",
            run_id,
            doctors.len(),
            arrivals.selected(),
            patients.len(),
            config.horizon
        );

        Ok(Self {
            clock: SimulationClock::new(config.horizon),
            state: SimulationState::new(doctors),
            stats: StatisticsCollector::new(config.sample_interval),
            dispatch_rules: config.dispatch_rules(),
            abandonment_rules: config.abandonment_rules(),
            config,
            rng,
            arrivals,
            run_id,
            config_hash,
            finished: false,
        })
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn current_time(&self) -> f64 {
        self.clock.now()
    }

    pub fn horizon(&self) -> f64 {
        self.clock.horizon()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Get reference to simulation state
    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    /// Get mutable reference to simulation state
    ///
    /// Intended for tests that need to set up a specific situation.
    /// Patients injected this way count towards the conservation total.
    pub fn state_mut(&mut self) -> &mut SimulationState {
        &mut self.state
    }

    pub fn arrivals(&self) -> &ArrivalProcess {
        &self.arrivals
    }

    pub fn consultation_log(&self) -> &[ConsultationRecord] {
        self.state.consultation_log()
    }

    pub fn event_log(&self) -> &EventLog {
        self.state.event_log()
    }

    pub fn snapshots(&self) -> &[Snapshot] {
        self.stats.snapshots()
    }

    /// Patients in the run: the selected arrival subset plus injected ones
    pub fn total_patients(&self) -> usize {
        self.arrivals.selected() + self.state.injected_patients()
    }

    /// served + abandoned + queued + not-yet-arrived equals the total
    pub fn is_conserved(&self) -> bool {
        self.state.served_count()
            + self.state.abandoned_count()
            + self.state.queue_size()
            + self.arrivals.remaining()
            == self.total_patients()
    }

    /// On-demand sample of the current state; not added to the series
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(&self.state, self.clock.now(), self.arrivals.remaining())
    }

    // ========================================================================
    // Step Loop Implementation
    // ========================================================================

    /// Advance the simulation by `dt` minutes and apply every phase once
    ///
    /// The clock never passes the horizon. The step that reaches it is
    /// processed normally, followed by a final snapshot; later calls change
    /// nothing and report `finished = true`.
    ///
    /// # Errors
    ///
    /// * `InvalidTimeStep` - `dt` is not a positive finite number
    pub fn step(&mut self, dt: f64) -> Result<StepResult, SimulationError> {
        if !dt.is_finite() || dt <= 0.0 {
            return Err(SimulationError::InvalidTimeStep(dt));
        }
        if self.finished {
            return Ok(StepResult {
                time: self.clock.now(),
                queue_length: self.state.queue_size(),
                finished: true,
                ..StepResult::default()
            });
        }

        // STEP 1: ADVANCE CLOCK
        let now = self.clock.advance(dt);
        let mut result = StepResult {
            time: now,
            ..StepResult::default()
        };

        // STEP 2: ARRIVALS
        if let Some(patient) = self.arrivals.poll(now, &mut self.rng) {
            log::debug!(
                "t={:.2} arrival {} ({}, {})",
                now,
                patient.id(),
                patient.priority(),
                patient.required_specialty()
            );
            self.state.enqueue_arrival(patient);
            result.arrivals += 1;

            let started =
                dispatch_idle_doctors(&mut self.state, now, &self.dispatch_rules, &mut self.rng)?;
            result.consultations_started += started.len();
        }

        // STEP 3: BREAK START
        let on_break = schedule_breaks(
            &mut self.state,
            now,
            self.config.breaks.max_simultaneous,
            &mut self.rng,
        );
        result.breaks_started = on_break.len();

        // STEP 4: BREAK END
        for index in end_due_breaks(&mut self.state, now) {
            result.breaks_ended += 1;
            if dispatch_doctor(&mut self.state, index, now, &self.dispatch_rules, &mut self.rng)?
                .is_some()
            {
                result.consultations_started += 1;
            }
        }

        // STEP 5: CONSULTATION COMPLETIONS
        for index in 0..self.state.num_doctors() {
            let doctor = &mut self.state.doctors_mut()[index];
            let Some(done) = doctor.complete_consultation_if_due(now) else {
                continue;
            };
            let doctor_id = doctor.id().to_string();

            log::debug!(
                "t={:.2} {} finished with {} after {:.1} min",
                now,
                doctor_id,
                done.patient_id,
                done.elapsed
            );
            self.state.log_event(Event::ConsultationCompleted {
                time: now,
                patient_id: done.patient_id,
                doctor_id,
                elapsed: done.elapsed,
            });
            result.consultations_completed += 1;

            if dispatch_doctor(&mut self.state, index, now, &self.dispatch_rules, &mut self.rng)?
                .is_some()
            {
                result.consultations_started += 1;
            }
        }

        // STEP 6: IDLE DOCTOR DISPATCH
        let started =
            dispatch_idle_doctors(&mut self.state, now, &self.dispatch_rules, &mut self.rng)?;
        result.consultations_started += started.len();

        // STEP 7: ABANDONMENT
        let gone = process_abandonment(&mut self.state, now, self.abandonment_rules, &mut self.rng);
        result.abandoned = gone.len();

        // STEP 8: STATISTICS
        let awaiting = self.arrivals.remaining();
        if self.clock.is_finished() {
            self.stats.record(&self.state, now, awaiting);
            self.finished = true;
            log::info!(
                "run {} reached horizon: served {}, abandoned {}, queued {}",
                self.run_id,
                self.state.served_count(),
                self.state.abandoned_count(),
                self.state.queue_size()
            );
        } else {
            self.stats.sample_if_due(&self.state, now, awaiting);
        }

        result.queue_length = self.state.queue_size();
        result.finished = self.finished;

        log::trace!("step {:?}", result);
        Ok(result)
    }

    /// Step with a fixed increment until the horizon, then hand over the result
    pub fn run(mut self, dt: f64) -> Result<SimulationResult, SimulationError> {
        while !self.finished {
            self.step(dt)?;
        }
        Ok(self.finish())
    }

    /// End the run and hand its logs and aggregates to the caller
    ///
    /// A run stopped before the horizon gets a closing snapshot at the
    /// current time.
    pub fn finish(mut self) -> SimulationResult {
        let now = self.clock.now();
        let awaiting = self.arrivals.remaining();
        if !self.finished {
            self.stats.record(&self.state, now, awaiting);
        }

        SimulationResult::assemble(
            self.run_id,
            self.config_hash,
            self.config,
            self.state.into_parts(),
            self.stats,
            now,
            self.arrivals.selected(),
            awaiting,
        )
    }
}

fn check_unique<'a>(
    kind: &str,
    ids: impl Iterator<Item = &'a str>,
) -> Result<(), SimulationError> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(SimulationError::Initialization(format!(
                "duplicate {} id '{}'",
                kind, id
            )));
        }
    }
    Ok(())
}
