//! Transition machinery
//!
//! A `Transition` pairs a transition function with a change-point operand
//! schedule. Each timestep the engine hands every transition the same state
//! snapshot; the function returns a proposed next state and may write flow
//! tensors (overdoses, admissions, ...) into the step's `StampBuilder`.

pub mod functions;

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

use crate::models::history::HistoryStamp;
use crate::tensor::{self, OperandMatrix, Shape, StateAxis, Tensor, TensorError};

/// Errors raised while evaluating a transition
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TransitionError {
    #[error("transition '{function}' expected {expected} operand(s), found {found}")]
    OperandCount {
        function: String,
        expected: usize,
        found: usize,
    },

    #[error("transition '{function}' operand {index} has the wrong kind: expected {expected}")]
    OperandKind {
        function: String,
        index: usize,
        expected: &'static str,
    },

    #[error("transition '{function}' has no operand entry in force at timestep {timestep}")]
    MissingSchedule { function: String, timestep: usize },

    #[error("transition '{function}': {source}")]
    Tensor {
        function: String,
        source: TensorError,
    },
}

/// One scheduled input to a transition function
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// Tensor dimensioned like the population state
    Tensor(Tensor),
    /// Square matrix applied along one state axis
    Matrix {
        matrix: OperandMatrix,
        axis: StateAxis,
    },
}

impl Operand {
    pub fn as_tensor(&self) -> Option<&Tensor> {
        match self {
            Operand::Tensor(t) => Some(t),
            Operand::Matrix { .. } => None,
        }
    }

    pub fn as_matrix(&self) -> Option<(&OperandMatrix, StateAxis)> {
        match self {
            Operand::Matrix { matrix, axis } => Some((matrix, *axis)),
            Operand::Tensor(_) => None,
        }
    }
}

/// Change-point keyed operand schedule.
///
/// The operands in force at timestep t are those of the greatest change
/// point <= t. A schedule without an entry at or before the first evaluated
/// timestep is a configuration error surfaced at evaluation time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OperandSchedule {
    entries: BTreeMap<usize, Vec<Operand>>,
}

impl OperandSchedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule with a single entry in force from t=0
    pub fn fixed(operands: Vec<Operand>) -> Self {
        let mut schedule = Self::new();
        schedule.insert(0, operands);
        schedule
    }

    /// Set the operands taking effect at `timestep` (replacing any entry there)
    pub fn insert(&mut self, timestep: usize, operands: Vec<Operand>) {
        self.entries.insert(timestep, operands);
    }

    /// Operands in force at `timestep`
    pub fn operands_at(&self, timestep: usize) -> Option<&[Operand]> {
        self.entries
            .range(..=timestep)
            .next_back()
            .map(|(_, ops)| ops.as_slice())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Change points in order
    pub fn change_points(&self) -> Vec<usize> {
        self.entries.keys().copied().collect()
    }
}

/// Accumulates the flow tensors produced while taking one timestep
#[derive(Debug, Clone)]
pub struct StampBuilder {
    overdoses: Tensor,
    fatal_overdoses: Tensor,
    intervention_admissions: Tensor,
    mortality: Tensor,
}

impl StampBuilder {
    pub fn new(shape: Shape) -> Self {
        Self {
            overdoses: tensor::zeros(shape),
            fatal_overdoses: tensor::zeros(shape),
            intervention_admissions: tensor::zeros(shape),
            mortality: tensor::zeros(shape),
        }
    }

    pub fn add_overdoses(&mut self, flows: &Tensor) {
        self.overdoses += flows;
    }

    pub fn add_fatal_overdoses(&mut self, flows: &Tensor) {
        self.fatal_overdoses += flows;
    }

    pub fn add_intervention_admissions(&mut self, flows: &Tensor) {
        self.intervention_admissions += flows;
    }

    pub fn add_mortality(&mut self, flows: &Tensor) {
        self.mortality += flows;
    }

    /// Seal the builder into a stamp for the given post-step state
    pub fn finish(self, state: Tensor) -> HistoryStamp {
        HistoryStamp {
            state,
            overdoses: self.overdoses,
            fatal_overdoses: self.fatal_overdoses,
            intervention_admissions: self.intervention_admissions,
            mortality: self.mortality,
        }
    }
}

/// A state-transition rule.
///
/// `apply` receives the shared state snapshot for the step and must return
/// the full proposed next state. Flow side channels go through `stamps`.
pub trait TransitionFunction: Send {
    /// Stable name used in logs and errors
    fn name(&self) -> &str;

    fn apply(
        &self,
        state: &Tensor,
        operands: &[Operand],
        stamps: &mut StampBuilder,
    ) -> Result<Tensor, TransitionError>;

    fn boxed_clone(&self) -> Box<dyn TransitionFunction>;
}

impl Clone for Box<dyn TransitionFunction> {
    fn clone(&self) -> Self {
        self.boxed_clone()
    }
}

impl fmt::Debug for Box<dyn TransitionFunction> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransitionFunction")
            .field("name", &self.name())
            .finish()
    }
}

/// A transition function bound to its operand schedule
#[derive(Debug, Clone)]
pub struct Transition {
    function: Box<dyn TransitionFunction>,
    schedule: OperandSchedule,
}

impl Transition {
    pub fn new(function: Box<dyn TransitionFunction>, schedule: OperandSchedule) -> Self {
        Self { function, schedule }
    }

    pub fn name(&self) -> &str {
        self.function.name()
    }

    pub fn schedule(&self) -> &OperandSchedule {
        &self.schedule
    }

    /// Evaluate against the step's state snapshot
    pub fn evaluate(
        &self,
        state: &Tensor,
        timestep: usize,
        stamps: &mut StampBuilder,
    ) -> Result<Tensor, TransitionError> {
        let operands =
            self.schedule
                .operands_at(timestep)
                .ok_or_else(|| TransitionError::MissingSchedule {
                    function: self.name().to_string(),
                    timestep,
                })?;
        self.function.apply(state, operands, stamps)
    }
}

/// Require an exact operand count
pub(crate) fn expect_operands<'a>(
    function: &str,
    operands: &'a [Operand],
    expected: usize,
) -> Result<&'a [Operand], TransitionError> {
    if operands.len() != expected {
        return Err(TransitionError::OperandCount {
            function: function.to_string(),
            expected,
            found: operands.len(),
        });
    }
    Ok(operands)
}

/// Require a tensor operand at `index`
pub(crate) fn tensor_operand<'a>(
    function: &str,
    operands: &'a [Operand],
    index: usize,
) -> Result<&'a Tensor, TransitionError> {
    operands[index]
        .as_tensor()
        .ok_or_else(|| TransitionError::OperandKind {
            function: function.to_string(),
            index,
            expected: "tensor",
        })
}

/// Require a matrix operand at `index`
pub(crate) fn matrix_operand<'a>(
    function: &str,
    operands: &'a [Operand],
    index: usize,
) -> Result<(&'a OperandMatrix, StateAxis), TransitionError> {
    operands[index]
        .as_matrix()
        .ok_or_else(|| TransitionError::OperandKind {
            function: function.to_string(),
            index,
            expected: "matrix",
        })
}

pub(crate) fn tensor_err(function: &str, source: TensorError) -> TransitionError {
    TransitionError::Tensor {
        function: function.to_string(),
        source,
    }
}
