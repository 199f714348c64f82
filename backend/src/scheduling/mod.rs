//! Per-tick scheduling decisions
//!
//! The three decision processes that act on the doctor pool and the queue
//! every tick:
//!
//! - [`breaks`]: which free doctors start a break, and which breaks end
//! - [`dispatch`]: which queued patient a free doctor sees next
//! - [`abandonment`]: which over-waiting patients leave the queue
//!
//! Each process works on a borrowed [`SimulationState`](crate::SimulationState)
//! and the run's [`RngManager`](crate::RngManager); none of them owns state.
//! The orchestrator decides the order they run in.

pub mod abandonment;
pub mod breaks;
pub mod dispatch;

pub use abandonment::{process_abandonment, AbandonmentRules};
pub use breaks::{break_cap, end_due_breaks, may_take_break, schedule_breaks};
pub use dispatch::{
    dispatch_doctor, dispatch_idle_doctors, find_eligible_patient, ConsultationDistribution,
    DispatchRules,
};
