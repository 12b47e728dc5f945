//! Run history
//!
//! One `HistoryStamp` is recorded per completed timestep: the population
//! state after the step, plus the flow tensors (overdoses, fatal overdoses,
//! intervention admissions, background mortality) produced while taking it.
//!
//! # Critical Invariants
//!
//! 1. Stamps are immutable once recorded
//! 2. Each timestep is recorded at most once (duplicates are rejected)
//! 3. Reading an unrecorded timestep is an error, never a silent default

use std::collections::btree_map;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::tensor::{self, Shape, Tensor};

/// Errors raised by history bookkeeping
#[derive(Debug, Clone, Error, PartialEq)]
pub enum HistoryError {
    #[error("timestep {0} already recorded")]
    DuplicateTimestep(usize),

    #[error("timestep {0} was never recorded")]
    UnrecordedTimestep(usize),
}

/// Immutable snapshot of one completed timestep
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryStamp {
    /// Population state after the step
    pub state: Tensor,
    /// All overdoses occurring during the step
    pub overdoses: Tensor,
    /// Fatal overdoses occurring during the step
    pub fatal_overdoses: Tensor,
    /// New intervention admissions during the step
    pub intervention_admissions: Tensor,
    /// Background mortality during the step
    pub mortality: Tensor,
}

impl HistoryStamp {
    /// Stamp carrying a state and zero-filled flow tensors
    pub fn with_state(state: Tensor) -> Self {
        let shape = Shape::of(&state);
        Self {
            state,
            overdoses: tensor::zeros(shape),
            fatal_overdoses: tensor::zeros(shape),
            intervention_admissions: tensor::zeros(shape),
            mortality: tensor::zeros(shape),
        }
    }

    /// Fully zero-filled stamp
    pub fn zeroed(shape: Shape) -> Self {
        Self::with_state(tensor::zeros(shape))
    }
}

/// Time-ordered record of simulation output, keyed by timestep
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct History {
    stamps: BTreeMap<usize, HistoryStamp>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a stamp; rejects duplicate timesteps
    pub fn record(&mut self, timestep: usize, stamp: HistoryStamp) -> Result<(), HistoryError> {
        match self.stamps.entry(timestep) {
            btree_map::Entry::Occupied(_) => Err(HistoryError::DuplicateTimestep(timestep)),
            btree_map::Entry::Vacant(entry) => {
                entry.insert(stamp);
                Ok(())
            }
        }
    }

    /// Stamp at an exact timestep; distinct error for unrecorded timesteps
    pub fn get(&self, timestep: usize) -> Result<&HistoryStamp, HistoryError> {
        self.stamps
            .get(&timestep)
            .ok_or(HistoryError::UnrecordedTimestep(timestep))
    }

    pub fn contains(&self, timestep: usize) -> bool {
        self.stamps.contains_key(&timestep)
    }

    pub fn len(&self) -> usize {
        self.stamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stamps.is_empty()
    }

    /// First recorded timestep, if any
    pub fn first_timestep(&self) -> Option<usize> {
        self.stamps.keys().next().copied()
    }

    /// Last recorded timestep, if any
    pub fn last_timestep(&self) -> Option<usize> {
        self.stamps.keys().next_back().copied()
    }

    /// Time-ordered iteration over recorded stamps
    pub fn iter(&self) -> impl Iterator<Item = (usize, &HistoryStamp)> {
        self.stamps.iter().map(|(&t, stamp)| (t, stamp))
    }

    /// Recorded timesteps in order
    pub fn timesteps(&self) -> Vec<usize> {
        self.stamps.keys().copied().collect()
    }

    /// Replace the full contents (used by the timestep formatter)
    pub fn replace(&mut self, stamps: BTreeMap<usize, HistoryStamp>) {
        self.stamps = stamps;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tensor::Shape;

    fn shape() -> Shape {
        Shape::new(2, 2, 1)
    }

    #[test]
    fn test_record_and_get() {
        let mut history = History::new();
        history.record(0, HistoryStamp::zeroed(shape())).unwrap();
        assert_eq!(history.len(), 1);
        assert!(history.get(0).is_ok());
    }

    #[test]
    fn test_duplicate_timestep_rejected() {
        let mut history = History::new();
        history.record(3, HistoryStamp::zeroed(shape())).unwrap();
        let err = history.record(3, HistoryStamp::zeroed(shape())).unwrap_err();
        assert_eq!(err, HistoryError::DuplicateTimestep(3));
        // First stamp stays intact.
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_unrecorded_lookup_is_distinct_error() {
        let history = History::new();
        assert_eq!(
            history.get(7).unwrap_err(),
            HistoryError::UnrecordedTimestep(7)
        );
    }

    #[test]
    fn test_time_ordering() {
        let mut history = History::new();
        for t in [4, 1, 3] {
            history.record(t, HistoryStamp::zeroed(shape())).unwrap();
        }
        assert_eq!(history.timesteps(), vec![1, 3, 4]);
        assert_eq!(history.first_timestep(), Some(1));
        assert_eq!(history.last_timestep(), Some(4));
    }
}
