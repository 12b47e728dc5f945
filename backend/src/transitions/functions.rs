//! Built-in transition functions
//!
//! Each function is a stateless unit struct; all numeric inputs arrive as
//! scheduled operands so the same function can serve any scenario.

use crate::tensor::{self, Tensor};

use super::{
    expect_operands, matrix_operand, tensor_err, tensor_operand, Operand, StampBuilder,
    TransitionError, TransitionFunction,
};

/// Adds an entering population to the cohort.
///
/// Operands: `[arrivals]`, a tensor dimensioned like the state.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnteringCohort;

impl TransitionFunction for EnteringCohort {
    fn name(&self) -> &str {
        "entering_cohort"
    }

    fn apply(
        &self,
        state: &Tensor,
        operands: &[Operand],
        _stamps: &mut StampBuilder,
    ) -> Result<Tensor, TransitionError> {
        let operands = expect_operands(self.name(), operands, 1)?;
        let arrivals = tensor_operand(self.name(), operands, 0)?;
        tensor::check_shape(arrivals, state).map_err(|e| tensor_err(self.name(), e))?;
        Ok(state + arrivals)
    }

    fn boxed_clone(&self) -> Box<dyn TransitionFunction> {
        Box::new(*self)
    }
}

/// Moves mass between behavioral (OUD) states.
///
/// Operands: `[matrix]` applied along its named axis. Entry `(j, m)` is the
/// per-step rate of moving from state `m` into state `j`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Behavioral;

impl TransitionFunction for Behavioral {
    fn name(&self) -> &str {
        "behavioral"
    }

    fn apply(
        &self,
        state: &Tensor,
        operands: &[Operand],
        _stamps: &mut StampBuilder,
    ) -> Result<Tensor, TransitionError> {
        let operands = expect_operands(self.name(), operands, 1)?;
        let (matrix, axis) = matrix_operand(self.name(), operands, 0)?;
        tensor::apply_matrix(state, matrix, axis).map_err(|e| tensor_err(self.name(), e))
    }

    fn boxed_clone(&self) -> Box<dyn TransitionFunction> {
        Box::new(*self)
    }
}

/// Moves mass between intervention blocks.
///
/// Operands: one or more matrices applied in sequence along their named
/// axes. Records per-compartment intervention admissions as the positive
/// part of the pre/post difference.
#[derive(Debug, Clone, Copy, Default)]
pub struct Intervention;

impl TransitionFunction for Intervention {
    fn name(&self) -> &str {
        "intervention"
    }

    fn apply(
        &self,
        state: &Tensor,
        operands: &[Operand],
        stamps: &mut StampBuilder,
    ) -> Result<Tensor, TransitionError> {
        if operands.is_empty() {
            return Err(TransitionError::OperandCount {
                function: self.name().to_string(),
                expected: 1,
                found: 0,
            });
        }
        let mut next = state.clone();
        for index in 0..operands.len() {
            let (matrix, axis) = matrix_operand(self.name(), operands, index)?;
            next = tensor::apply_matrix(&next, matrix, axis)
                .map_err(|e| tensor_err(self.name(), e))?;
        }
        let admissions = (state - &next).mapv(|v| v.max(0.0));
        stamps.add_intervention_admissions(&admissions);
        Ok(next)
    }

    fn boxed_clone(&self) -> Box<dyn TransitionFunction> {
        Box::new(*self)
    }
}

/// Applies per-compartment overdose and fatality rates.
///
/// Operands: `[overdose_rates, fatal_fraction]`, both state-shaped tensors.
/// All overdoses are stamped; the fatal share is removed from the
/// population and stamped separately.
#[derive(Debug, Clone, Copy, Default)]
pub struct Overdose;

impl TransitionFunction for Overdose {
    fn name(&self) -> &str {
        "overdose"
    }

    fn apply(
        &self,
        state: &Tensor,
        operands: &[Operand],
        stamps: &mut StampBuilder,
    ) -> Result<Tensor, TransitionError> {
        let operands = expect_operands(self.name(), operands, 2)?;
        let rates = tensor_operand(self.name(), operands, 0)?;
        let fatal_fraction = tensor_operand(self.name(), operands, 1)?;
        tensor::check_shape(rates, state).map_err(|e| tensor_err(self.name(), e))?;
        tensor::check_shape(fatal_fraction, state).map_err(|e| tensor_err(self.name(), e))?;

        let overdoses = state * rates;
        let fatal = &overdoses * fatal_fraction;
        stamps.add_overdoses(&overdoses);
        stamps.add_fatal_overdoses(&fatal);
        Ok(state - &fatal)
    }

    fn boxed_clone(&self) -> Box<dyn TransitionFunction> {
        Box::new(*self)
    }
}

/// Removes background (non-overdose) mortality from the population.
///
/// Operands: `[mortality_rates]`, a state-shaped tensor.
#[derive(Debug, Clone, Copy, Default)]
pub struct Mortality;

impl TransitionFunction for Mortality {
    fn name(&self) -> &str {
        "mortality"
    }

    fn apply(
        &self,
        state: &Tensor,
        operands: &[Operand],
        stamps: &mut StampBuilder,
    ) -> Result<Tensor, TransitionError> {
        let operands = expect_operands(self.name(), operands, 1)?;
        let rates = tensor_operand(self.name(), operands, 0)?;
        tensor::check_shape(rates, state).map_err(|e| tensor_err(self.name(), e))?;

        let deaths = state * rates;
        stamps.add_mortality(&deaths);
        Ok(state - &deaths)
    }

    fn boxed_clone(&self) -> Box<dyn TransitionFunction> {
        Box::new(*self)
    }
}
