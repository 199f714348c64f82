//! Break scheduling
//!
//! Each tick, free doctors whose next break opportunity has passed may go
//! on break, subject to:
//!
//! - a global concurrency cap, `min(max_simultaneous, max(1, n / 3))`,
//!   tightened when the queue is abnormally long (see [`break_cap`])
//! - a coverage rule per specialty (see [`may_take_break`])
//! - a random acceptance draw that favours breaks during lulls
//!
//! Eligible candidates are shuffled, cut down to the free break slots, and
//! each remaining candidate gets exactly one acceptance draw. A rejected draw
//! leaves its slot empty for this tick.

use crate::models::event::Event;
use crate::models::state::SimulationState;
use crate::rng::RngManager;

/// Break acceptance probability while the queue is short
pub const LULL_ACCEPT_PROBABILITY: f64 = 0.7;

/// Break acceptance probability while the queue is long
pub const BUSY_ACCEPT_PROBABILITY: f64 = 0.3;

/// Queue length at which the busy acceptance probability applies
pub const BUSY_QUEUE_THRESHOLD: usize = 5;

/// A sole specialist may only break while the queue is shorter than this
pub const SOLE_SPECIALIST_QUEUE_LIMIT: usize = 3;

/// Maximum doctors allowed on break at once
///
/// Base cap is `min(max_simultaneous, max(1, doctor_count / 3))`. It is
/// halved when the queue exceeds six times the doctor count, and cut to
/// two thirds (but at least 1) when it exceeds four times.
///
/// # Example
/// ```
/// use clinic_simulator_core_rs::scheduling::break_cap;
///
/// assert_eq!(break_cap(9, 3, 0), 3);
/// assert_eq!(break_cap(9, 3, 37), 2);  // > 4n
/// assert_eq!(break_cap(9, 3, 55), 1);  // > 6n
/// assert_eq!(break_cap(2, 1, 13), 0);  // > 6n, 1 / 2 = 0
/// ```
pub fn break_cap(doctor_count: usize, max_simultaneous: usize, queue_len: usize) -> usize {
    let base = max_simultaneous.min((doctor_count / 3).max(1));
    if queue_len > 6 * doctor_count {
        base / 2
    } else if queue_len > 4 * doctor_count {
        (base * 2 / 3).max(1)
    } else {
        base
    }
}

/// Coverage rule for the doctor at `index`
///
/// A doctor with same-specialty colleagues may break while at least one of
/// them is not on break. The only doctor of a specialty may break only while
/// the queue is shorter than [`SOLE_SPECIALIST_QUEUE_LIMIT`].
pub fn may_take_break(state: &SimulationState, index: usize) -> bool {
    let doctors = state.doctors();
    let Some(doctor) = doctors.get(index) else {
        return false;
    };

    let mut colleagues = doctors
        .iter()
        .enumerate()
        .filter(|(i, d)| *i != index && d.specialty() == doctor.specialty())
        .peekable();

    if colleagues.peek().is_none() {
        state.queue_size() < SOLE_SPECIALIST_QUEUE_LIMIT
    } else {
        colleagues.any(|(_, d)| !d.is_on_break())
    }
}

/// Start breaks for this tick
///
/// Returns the ids of doctors that went on break. Eligibility is checked
/// again at grant time, so two colleagues cannot both leave in the same tick
/// if that would leave their specialty uncovered.
///
/// With one free slot the chance of a grant is the acceptance probability,
/// however many doctors are eligible.
pub fn schedule_breaks(
    state: &mut SimulationState,
    now: f64,
    max_simultaneous: usize,
    rng: &mut RngManager,
) -> Vec<String> {
    let queue_len = state.queue_size();
    let allowed = break_cap(state.num_doctors(), max_simultaneous, queue_len);
    let on_break = state.doctors_on_break();
    if on_break >= allowed {
        return Vec::new();
    }
    let slots = allowed - on_break;

    let view: &SimulationState = state;
    let mut candidates: Vec<usize> = view
        .doctors()
        .iter()
        .enumerate()
        .filter(|(_, d)| d.is_free() && d.is_due_for_break(now))
        .map(|(i, _)| i)
        .filter(|&i| may_take_break(view, i))
        .collect();
    if candidates.is_empty() {
        return Vec::new();
    }
    rng.shuffle(&mut candidates);
    candidates.truncate(slots);

    let accept = if queue_len < BUSY_QUEUE_THRESHOLD {
        LULL_ACCEPT_PROBABILITY
    } else {
        BUSY_ACCEPT_PROBABILITY
    };

    let mut started = Vec::new();
    for index in candidates {
        if !rng.chance(accept) || !may_take_break(state, index) {
            continue;
        }

        let doctor = &mut state.doctors_mut()[index];
        if doctor.start_break(now).is_err() {
            continue;
        }
        let doctor_id = doctor.id().to_string();
        let until = doctor.break_until().unwrap_or(now);

        log::debug!("t={:.2} {} starts break until {:.2}", now, doctor_id, until);
        state.log_event(Event::BreakStarted {
            time: now,
            doctor_id: doctor_id.clone(),
            until,
        });
        started.push(doctor_id);
    }
    started
}

/// End every break that is due, returning the pool indices of doctors
/// that became free
pub fn end_due_breaks(state: &mut SimulationState, now: f64) -> Vec<usize> {
    let mut ended = Vec::new();
    for index in 0..state.num_doctors() {
        let doctor = &mut state.doctors_mut()[index];
        if doctor.end_break_if_due(now).is_none() {
            continue;
        }
        let doctor_id = doctor.id().to_string();
        let breaks_taken = doctor.breaks_taken();

        log::debug!("t={:.2} {} back from break ({} taken)", now, doctor_id, breaks_taken);
        state.log_event(Event::BreakEnded {
            time: now,
            doctor_id,
            breaks_taken,
        });
        ended.push(index);
    }
    ended
}
