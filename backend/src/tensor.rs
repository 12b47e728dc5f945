//! Canonical population tensor type
//!
//! Every module in the crate works with one multidimensional numeric
//! container: a dense 3-axis `f64` tensor with fixed axis semantics
//!
//! - axis 0: intervention (treatment block)
//! - axis 1: behavioral / OUD state
//! - axis 2: demographic combination (age band x sex)
//!
//! Transition operands are either tensors dimensioned like the state or
//! square matrices applied along one named axis.

use ndarray::{Array2, Array3, Axis};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Dense population tensor, axes {intervention, OUD state, demographic combo}
pub type Tensor = Array3<f64>;

/// Square operand matrix applied along one state axis
pub type OperandMatrix = Array2<f64>;

/// Named state axes, in storage order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateAxis {
    Intervention = 0,
    Oud = 1,
    Demographic = 2,
}

impl StateAxis {
    pub fn axis(self) -> Axis {
        Axis(self as usize)
    }
}

/// Tensor dimensions in axis order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shape {
    pub interventions: usize,
    pub oud_states: usize,
    pub demographics: usize,
}

impl Shape {
    pub fn new(interventions: usize, oud_states: usize, demographics: usize) -> Self {
        Self {
            interventions,
            oud_states,
            demographics,
        }
    }

    pub fn of(tensor: &Tensor) -> Self {
        let (interventions, oud_states, demographics) = tensor.dim();
        Self {
            interventions,
            oud_states,
            demographics,
        }
    }

    pub fn dims(&self) -> (usize, usize, usize) {
        (self.interventions, self.oud_states, self.demographics)
    }

    pub fn len(&self) -> usize {
        self.interventions * self.oud_states * self.demographics
    }
}

/// Tensor-level errors (shape and operand mismatches)
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TensorError {
    #[error("tensor shape {found:?} does not match expected shape {expected:?}")]
    ShapeMismatch {
        expected: (usize, usize, usize),
        found: (usize, usize, usize),
    },

    #[error("operand matrix is {rows}x{cols} but axis {axis:?} has length {len}")]
    MatrixShape {
        rows: usize,
        cols: usize,
        axis: StateAxis,
        len: usize,
    },
}

/// Zero-filled tensor of the given shape
pub fn zeros(shape: Shape) -> Tensor {
    Tensor::zeros(shape.dims())
}

/// Constant-filled tensor of the given shape
pub fn constant(shape: Shape, value: f64) -> Tensor {
    Tensor::from_elem(shape.dims(), value)
}

/// Sum over all axes
pub fn sum_all(tensor: &Tensor) -> f64 {
    tensor.sum()
}

/// Error unless `tensor` matches `expected` exactly
pub fn check_shape(tensor: &Tensor, expected: &Tensor) -> Result<(), TensorError> {
    if tensor.dim() != expected.dim() {
        return Err(TensorError::ShapeMismatch {
            expected: expected.dim(),
            found: tensor.dim(),
        });
    }
    Ok(())
}

/// Elementwise minimum across a non-empty set of same-shaped tensors
pub fn elementwise_min(tensors: &[&Tensor]) -> Result<Tensor, TensorError> {
    combine(tensors, f64::min)
}

/// Elementwise product across a non-empty set of same-shaped tensors
pub fn elementwise_product(tensors: &[&Tensor]) -> Result<Tensor, TensorError> {
    combine(tensors, |a, b| a * b)
}

fn combine(tensors: &[&Tensor], op: fn(f64, f64) -> f64) -> Result<Tensor, TensorError> {
    let (first, rest) = match tensors.split_first() {
        Some(split) => split,
        None => {
            return Err(TensorError::ShapeMismatch {
                expected: (0, 0, 0),
                found: (0, 0, 0),
            })
        }
    };
    let mut out = (*first).clone();
    for tensor in rest {
        check_shape(tensor, first)?;
        out.zip_mut_with(tensor, |a, &b| *a = op(*a, b));
    }
    Ok(out)
}

/// Apply a square matrix along one state axis.
///
/// For the OUD axis this is the classic compartmental update: for each
/// (intervention, demographic) pair, `out = M . column`, where `M[j, m]` is
/// the rate of moving from state `m` into state `j`.
pub fn apply_matrix(
    state: &Tensor,
    matrix: &OperandMatrix,
    axis: StateAxis,
) -> Result<Tensor, TensorError> {
    let len = state.len_of(axis.axis());
    if matrix.nrows() != len || matrix.ncols() != len {
        return Err(TensorError::MatrixShape {
            rows: matrix.nrows(),
            cols: matrix.ncols(),
            axis,
            len,
        });
    }

    let mut out = Tensor::zeros(state.raw_dim());
    let lanes = state.lanes(axis.axis());
    let out_lanes = out.lanes_mut(axis.axis());
    for (mut out_lane, lane) in out_lanes.into_iter().zip(lanes.into_iter()) {
        for j in 0..len {
            let mut acc = 0.0;
            for m in 0..len {
                acc += matrix[(j, m)] * lane[m];
            }
            out_lane[j] = acc;
        }
    }
    Ok(out)
}
