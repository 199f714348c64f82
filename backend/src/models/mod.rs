//! Domain models for the clinic simulator

pub mod doctor;
pub mod event;
pub mod patient;
pub mod queue;
pub mod state;

// Re-exports
pub use doctor::{
    BreakPolicy, BreakRecord, CompletedConsultation, Doctor, DoctorError, DoctorRecord,
    DoctorStatus,
};
pub use event::{AbandonmentRecord, ConsultationRecord, Event, EventLog};
pub use patient::{ParsePriorityError, Patient, PatientRecord, Priority};
pub use queue::WaitingQueue;
pub use state::SimulationState;
