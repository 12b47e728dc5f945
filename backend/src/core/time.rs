//! Time management for the simulation
//!
//! The simulation operates in discrete timesteps (weeks in the standard
//! RESPOND configuration). Multiple timesteps form a model year. This module
//! provides deterministic time advancement.

use serde::{Deserialize, Serialize};

/// Default number of timesteps per model year (weekly steps)
pub const STEPS_PER_YEAR: usize = 52;

/// Manages simulation time in discrete timesteps
///
/// # Example
/// ```
/// use respond_simulator_core_rs::core::time::Timeline;
///
/// let mut time = Timeline::new(52); // weekly steps
/// assert_eq!(time.current_step(), 0);
///
/// time.advance();
/// assert_eq!(time.current_step(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeline {
    /// Total timesteps elapsed since simulation start
    current_step: usize,
    /// Number of timesteps in one model year
    steps_per_year: usize,
}

impl Timeline {
    /// Create a new Timeline
    ///
    /// # Panics
    ///
    /// Panics if `steps_per_year` is zero.
    pub fn new(steps_per_year: usize) -> Self {
        assert!(steps_per_year > 0, "steps_per_year must be positive");
        Self {
            current_step: 0,
            steps_per_year,
        }
    }

    /// Advance time by one step
    pub fn advance(&mut self) {
        self.current_step += 1;
    }

    /// Total timesteps since start
    pub fn current_step(&self) -> usize {
        self.current_step
    }

    /// Current model year (0-indexed)
    pub fn current_year(&self) -> usize {
        self.current_step / self.steps_per_year
    }

    /// Elapsed time in fractional years
    pub fn elapsed_years(&self) -> f64 {
        self.current_step as f64 / self.steps_per_year as f64
    }

    /// Steps per model year
    pub fn steps_per_year(&self) -> usize {
        self.steps_per_year
    }
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new(STEPS_PER_YEAR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[should_panic(expected = "steps_per_year must be positive")]
    fn test_zero_steps_per_year_panics() {
        Timeline::new(0);
    }

    #[test]
    fn test_year_rollover() {
        let mut time = Timeline::new(52);
        for _ in 0..52 {
            time.advance();
        }
        assert_eq!(time.current_year(), 1);
        assert_eq!(time.current_step(), 52);
    }

    #[test]
    fn test_elapsed_years() {
        let mut time = Timeline::new(52);
        for _ in 0..26 {
            time.advance();
        }
        assert!((time.elapsed_years() - 0.5).abs() < 1e-12);
    }
}
