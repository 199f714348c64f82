//! Tests for SimulationClock

use clinic_simulator_core_rs::SimulationClock;

#[test]
fn test_clock_starts_at_zero() {
    let clock = SimulationClock::new(480.0);
    assert_eq!(clock.now(), 0.0);
    assert_eq!(clock.horizon(), 480.0);
    assert_eq!(clock.remaining(), 480.0);
    assert!(!clock.is_finished());
}

#[test]
fn test_advance_in_arbitrary_increments() {
    let mut clock = SimulationClock::new(10.0);

    clock.advance(0.25);
    clock.advance(1.5);
    assert!((clock.now() - 1.75).abs() < 1e-12);
    assert!((clock.progress() - 0.175).abs() < 1e-12);
}

#[test]
fn test_advance_stops_at_horizon() {
    let mut clock = SimulationClock::new(5.0);

    assert_eq!(clock.advance(3.0), 3.0);
    assert_eq!(clock.advance(3.0), 5.0);
    assert!(clock.is_finished());
    assert_eq!(clock.remaining(), 0.0);

    // Further advances stay pinned
    assert_eq!(clock.advance(1.0), 5.0);
    assert_eq!(clock.progress(), 1.0);
}

#[test]
fn test_time_is_monotonic() {
    let mut clock = SimulationClock::new(100.0);
    let mut last = clock.now();
    for i in 1..200 {
        let now = clock.advance(0.1 * (i % 7 + 1) as f64);
        assert!(now >= last);
        last = now;
    }
}

#[test]
#[should_panic(expected = "dt must be positive")]
fn test_zero_step_panics() {
    let mut clock = SimulationClock::new(10.0);
    clock.advance(0.0);
}

#[test]
#[should_panic(expected = "horizon must be positive")]
fn test_non_positive_horizon_panics() {
    SimulationClock::new(0.0);
}
