//! Population cohort
//!
//! A `Cohort` bundles the live population state tensor with the simulation
//! clock and the recorded run history. Cloning a cohort yields a fully
//! independent copy, so scenario branches never share mutable state.

use serde::{Deserialize, Serialize};

use crate::core::time::Timeline;
use crate::models::history::History;
use crate::tensor::{self, Shape, Tensor, TensorError};

/// Live simulation population plus its clock and history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cohort {
    /// Current population state
    pub state: Tensor,
    /// Simulation clock
    pub timeline: Timeline,
    /// Per-timestep record of states and flows
    pub history: History,
}

impl Cohort {
    /// Cohort starting from an initial population state
    pub fn new(state: Tensor, timeline: Timeline) -> Self {
        Self {
            state,
            timeline,
            history: History::new(),
        }
    }

    /// Empty cohort of the given shape
    pub fn zeroed(shape: Shape, timeline: Timeline) -> Self {
        Self::new(tensor::zeros(shape), timeline)
    }

    pub fn shape(&self) -> Shape {
        Shape::of(&self.state)
    }

    /// Total population across all compartments
    pub fn total_population(&self) -> f64 {
        tensor::sum_all(&self.state)
    }

    /// Replace the state tensor; shape must match the current state
    pub fn set_state(&mut self, state: Tensor) -> Result<(), TensorError> {
        tensor::check_shape(&state, &self.state)?;
        self.state = state;
        Ok(())
    }

    /// State plus an elementwise operand, leaving the cohort untouched
    pub fn add(&self, operand: &Tensor) -> Result<Tensor, TensorError> {
        tensor::check_shape(operand, &self.state)?;
        Ok(&self.state + operand)
    }

    /// State minus an elementwise operand, leaving the cohort untouched
    pub fn subtract(&self, operand: &Tensor) -> Result<Tensor, TensorError> {
        tensor::check_shape(operand, &self.state)?;
        Ok(&self.state - operand)
    }

    /// Elementwise product of state and operand, leaving the cohort untouched
    pub fn multiply(&self, operand: &Tensor) -> Result<Tensor, TensorError> {
        tensor::check_shape(operand, &self.state)?;
        Ok(&self.state * operand)
    }

    /// Elementwise quotient of state and operand, leaving the cohort untouched
    pub fn divide(&self, operand: &Tensor) -> Result<Tensor, TensorError> {
        tensor::check_shape(operand, &self.state)?;
        Ok(&self.state / operand)
    }

    /// State scaled by a scalar, leaving the cohort untouched
    pub fn scale(&self, factor: f64) -> Tensor {
        &self.state * factor
    }

    pub fn add_assign(&mut self, operand: &Tensor) -> Result<(), TensorError> {
        tensor::check_shape(operand, &self.state)?;
        self.state += operand;
        Ok(())
    }

    pub fn subtract_assign(&mut self, operand: &Tensor) -> Result<(), TensorError> {
        tensor::check_shape(operand, &self.state)?;
        self.state -= operand;
        Ok(())
    }

    pub fn multiply_assign(&mut self, operand: &Tensor) -> Result<(), TensorError> {
        tensor::check_shape(operand, &self.state)?;
        self.state *= operand;
        Ok(())
    }

    pub fn divide_assign(&mut self, operand: &Tensor) -> Result<(), TensorError> {
        tensor::check_shape(operand, &self.state)?;
        self.state /= operand;
        Ok(())
    }

    pub fn scale_assign(&mut self, factor: f64) {
        self.state *= factor;
    }
}
