//! Whole-run invariants over arbitrary seeds, pools and step sizes
//!
//! After every step:
//! - served + abandoned + queued + not-yet-arrived = total patients
//! - no patient is both queued and with a doctor
//! - the queue is priority-ordered
//! - doctors on break never exceed min(max_simultaneous, max(1, n / 3))
//! - occupancy stays within [0, 100]
//! - abandoned patients waited longer than max-wait

use clinic_simulator_core_rs::{
    BreakConfig, ConsultationDistribution, DoctorRecord, Orchestrator, PatientRecord, Priority,
    SimulationConfig,
};
use proptest::prelude::*;

const SPECIALTIES: [&str; 4] = ["General", "Cardiology", "Orthopedics", "Pulmonology"];
const PRIORITIES: [Priority; 4] = [Priority::Urgent, Priority::High, Priority::Normal, Priority::Low];

fn distribution(code: u8) -> ConsultationDistribution {
    match code % 4 {
        0 => ConsultationDistribution::Exponential,
        1 => ConsultationDistribution::Normal,
        2 => ConsultationDistribution::Uniform,
        _ => ConsultationDistribution::Fixed,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_run_invariants(
        seed in any::<u64>(),
        doctor_specs in prop::collection::vec(0usize..4, 1..8),
        patient_specs in prop::collection::vec((0usize..4, 0usize..4), 1..80),
        arrival_rate in 2.0f64..40.0,
        dt in 0.1f64..5.0,
        dist in 0u8..4,
        probability in 0.05f64..1.0,
    ) {
        let doctors: Vec<DoctorRecord> = doctor_specs
            .iter()
            .enumerate()
            .map(|(i, s)| DoctorRecord::new(format!("d{}", i), SPECIALTIES[*s]))
            .collect();
        let patients: Vec<PatientRecord> = patient_specs
            .iter()
            .enumerate()
            .map(|(i, (s, p))| PatientRecord::new(format!("p{}", i), PRIORITIES[*p], SPECIALTIES[*s]))
            .collect();

        let n = doctors.len();
        let cap = (n / 3).max(1);
        let config = SimulationConfig {
            arrival_rate,
            horizon: 180.0,
            consultation_distribution: distribution(dist),
            abandonment_probability: probability,
            rng_seed: seed,
            breaks: BreakConfig {
                max_simultaneous: cap,
                ..BreakConfig::default()
            },
            ..SimulationConfig::default()
        };
        let max_wait = config.max_wait;

        let mut orchestrator = Orchestrator::new(config, doctors, patients).unwrap();
        while !orchestrator.is_finished() {
            orchestrator.step(dt).unwrap();
            let now = orchestrator.current_time();
            let state = orchestrator.state();

            prop_assert!(orchestrator.is_conserved());
            prop_assert!(state.no_double_booking());
            prop_assert!(state.queue().is_priority_ordered());
            prop_assert!(state.doctors_on_break() <= cap);
            for doctor in state.doctors() {
                let occupancy = doctor.occupancy(now);
                prop_assert!((0.0..=100.0).contains(&occupancy));
            }
        }

        let result = orchestrator.finish();
        prop_assert!(result.is_conserved());
        for snapshot in &result.snapshots {
            prop_assert!((0.0..=100.0).contains(&snapshot.mean_occupancy));
        }
        for perf in &result.doctor_performance {
            prop_assert!((0.0..=100.0).contains(&perf.occupancy));
        }
        for record in &result.abandoned_patients {
            prop_assert!(record.wait_time > max_wait);
        }

        // Each patient ends up in at most one of served / abandoned / queued
        let mut seen: Vec<&str> = result
            .consultation_log
            .iter()
            .map(|r| r.patient_id.as_str())
            .chain(result.abandoned_patients.iter().map(|r| r.patient_id.as_str()))
            .collect();
        let before = seen.len();
        seen.sort_unstable();
        seen.dedup();
        prop_assert_eq!(seen.len(), before);
    }
}
