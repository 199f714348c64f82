//! Simulated clock
//!
//! The simulation runs on logical minutes. An external driver advances the
//! clock in arbitrary increments; the clock never moves backwards and never
//! runs past the configured horizon.

use serde::{Deserialize, Serialize};

/// Current simulated time plus the run horizon, both in minutes
///
/// # Example
/// ```
/// use clinic_simulator_core_rs::SimulationClock;
///
/// let mut clock = SimulationClock::new(480.0); // one 8-hour shift
/// assert_eq!(clock.now(), 0.0);
///
/// clock.advance(0.5);
/// assert_eq!(clock.now(), 0.5);
/// assert!(!clock.is_finished());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationClock {
    /// Minutes elapsed since simulation start
    now: f64,
    /// Total run length in minutes
    horizon: f64,
}

impl SimulationClock {
    /// Create a clock at time zero
    ///
    /// # Panics
    /// Panics if `horizon` is not a positive finite number. Configuration
    /// validation rejects such horizons before a clock is ever built.
    pub fn new(horizon: f64) -> Self {
        assert!(
            horizon.is_finite() && horizon > 0.0,
            "horizon must be positive"
        );
        Self { now: 0.0, horizon }
    }

    /// Advance time by `dt` minutes, stopping at the horizon
    ///
    /// Returns the new current time.
    ///
    /// # Panics
    /// Panics if `dt` is not a positive finite number.
    ///
    /// # Example
    /// ```
    /// use clinic_simulator_core_rs::SimulationClock;
    ///
    /// let mut clock = SimulationClock::new(10.0);
    /// clock.advance(7.0);
    /// assert_eq!(clock.advance(7.0), 10.0); // clamped to the horizon
    /// assert!(clock.is_finished());
    /// ```
    pub fn advance(&mut self, dt: f64) -> f64 {
        assert!(dt.is_finite() && dt > 0.0, "dt must be positive");
        self.now = (self.now + dt).min(self.horizon);
        self.now
    }

    /// Current simulated time in minutes
    pub fn now(&self) -> f64 {
        self.now
    }

    /// Configured run horizon in minutes
    pub fn horizon(&self) -> f64 {
        self.horizon
    }

    /// Minutes left until the horizon
    pub fn remaining(&self) -> f64 {
        (self.horizon - self.now).max(0.0)
    }

    /// True once the clock has reached the horizon
    pub fn is_finished(&self) -> bool {
        self.now >= self.horizon
    }

    /// Fraction of the horizon already simulated, in [0, 1]
    pub fn progress(&self) -> f64 {
        (self.now / self.horizon).clamp(0.0, 1.0)
    }
}
