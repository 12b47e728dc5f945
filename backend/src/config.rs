//! Scenario configuration
//!
//! A `ScenarioConfig` is the single deserializable description of a run:
//! tensor dimensions, initial population, transition schedule, cost and
//! utility tables, discounting mode, and reporting timesteps. The CLI and
//! the Python bindings both build engines exclusively through this type.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::time::{Timeline, STEPS_PER_YEAR};
use crate::engine::MarkovEngine;
use crate::models::cost::UtilityType;
use crate::postsim::tables::{CostTable, UtilityTable};
use crate::tensor::{OperandMatrix, Shape, StateAxis, Tensor};
use crate::transitions::functions::{
    Behavioral, EnteringCohort, Intervention, Mortality, Overdose,
};
use crate::transitions::{Operand, OperandSchedule, Transition, TransitionFunction};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("tensor spec expects {expected} values for shape {shape:?}, found {found}")]
    ValueCount {
        shape: (usize, usize, usize),
        expected: usize,
        found: usize,
    },

    #[error("matrix operand for axis {axis:?} must be {len}x{len}")]
    MatrixShape { axis: StateAxis, len: usize },

    #[error("transition {index} ({function:?}) has an empty operand schedule")]
    EmptySchedule {
        index: usize,
        function: TransitionKind,
    },

    #[error("invalid scenario JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Dense tensor payload: a single constant or explicit row-major values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TensorSpec {
    Constant { value: f64 },
    Values { values: Vec<f64> },
}

impl TensorSpec {
    pub fn build(&self, shape: Shape) -> Result<Tensor, ConfigError> {
        match self {
            TensorSpec::Constant { value } => Ok(crate::tensor::constant(shape, *value)),
            TensorSpec::Values { values } => {
                Tensor::from_shape_vec(shape.dims(), values.clone()).map_err(|_| {
                    ConfigError::ValueCount {
                        shape: shape.dims(),
                        expected: shape.len(),
                        found: values.len(),
                    }
                })
            }
        }
    }
}

/// One scheduled operand, in serializable form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OperandSpec {
    /// State-shaped tensor filled with one value
    Constant { value: f64 },
    /// State-shaped tensor with explicit row-major values
    Tensor { values: Vec<f64> },
    /// Square matrix applied along one state axis, given by rows
    Matrix { axis: StateAxis, rows: Vec<Vec<f64>> },
}

impl OperandSpec {
    pub fn build(&self, shape: Shape) -> Result<Operand, ConfigError> {
        match self {
            OperandSpec::Constant { value } => {
                Ok(Operand::Tensor(crate::tensor::constant(shape, *value)))
            }
            OperandSpec::Tensor { values } => Ok(Operand::Tensor(
                TensorSpec::Values {
                    values: values.clone(),
                }
                .build(shape)?,
            )),
            OperandSpec::Matrix { axis, rows } => {
                let len = match axis {
                    StateAxis::Intervention => shape.interventions,
                    StateAxis::Oud => shape.oud_states,
                    StateAxis::Demographic => shape.demographics,
                };
                if rows.len() != len || rows.iter().any(|r| r.len() != len) {
                    return Err(ConfigError::MatrixShape { axis: *axis, len });
                }
                let mut matrix = OperandMatrix::zeros((len, len));
                for (i, row) in rows.iter().enumerate() {
                    for (j, &value) in row.iter().enumerate() {
                        matrix[(i, j)] = value;
                    }
                }
                Ok(Operand::Matrix {
                    matrix,
                    axis: *axis,
                })
            }
        }
    }
}

/// Which built-in transition function a schedule entry drives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionKind {
    EnteringCohort,
    Behavioral,
    Intervention,
    Overdose,
    Mortality,
}

impl TransitionKind {
    fn function(self) -> Box<dyn TransitionFunction> {
        match self {
            TransitionKind::EnteringCohort => Box::new(EnteringCohort),
            TransitionKind::Behavioral => Box::new(Behavioral),
            TransitionKind::Intervention => Box::new(Intervention),
            TransitionKind::Overdose => Box::new(Overdose),
            TransitionKind::Mortality => Box::new(Mortality),
        }
    }
}

/// One transition with its change-point operand schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionConfig {
    pub function: TransitionKind,
    /// Operands keyed by the timestep they take effect at
    pub schedule: BTreeMap<usize, Vec<OperandSpec>>,
}

fn default_steps_per_year() -> usize {
    STEPS_PER_YEAR
}

/// Complete description of one simulation scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    #[serde(default)]
    pub name: Option<String>,
    pub shape: Shape,
    #[serde(default = "default_steps_per_year")]
    pub steps_per_year: usize,
    pub initial_state: TensorSpec,
    #[serde(default)]
    pub transitions: Vec<TransitionConfig>,
    /// Run length in timesteps
    pub steps: usize,
    #[serde(default)]
    pub costs: Option<CostTable>,
    #[serde(default)]
    pub utilities: Option<UtilityTable>,
    #[serde(default)]
    pub utility_type: Option<UtilityType>,
    #[serde(default)]
    pub discrete_discounting: bool,
    /// Reporting timesteps handed to the extraction pass; empty = keep all
    #[serde(default)]
    pub output_timesteps: Vec<usize>,
}

impl ScenarioConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Instance name used for engine logging
    pub fn logger_name(&self) -> &str {
        self.name.as_deref().unwrap_or("respond")
    }

    /// Build a ready-to-run engine from this scenario
    pub fn build_engine(&self) -> Result<MarkovEngine, ConfigError> {
        let initial_state = self.initial_state.build(self.shape)?;

        let mut schedule = Vec::with_capacity(self.transitions.len());
        for (index, transition) in self.transitions.iter().enumerate() {
            if transition.schedule.is_empty() {
                return Err(ConfigError::EmptySchedule {
                    index,
                    function: transition.function,
                });
            }
            let mut operands = OperandSchedule::new();
            for (&timestep, specs) in &transition.schedule {
                let built = specs
                    .iter()
                    .map(|spec| spec.build(self.shape))
                    .collect::<Result<Vec<_>, _>>()?;
                operands.insert(timestep, built);
            }
            schedule.push(Transition::new(transition.function.function(), operands));
        }

        Ok(MarkovEngine::new(
            initial_state,
            Timeline::new(self.steps_per_year),
            schedule,
            self.logger_name(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn minimal_json() -> &'static str {
        r#"{
            "name": "unit-scenario",
            "shape": { "interventions": 1, "oud_states": 2, "demographics": 1 },
            "initial_state": { "kind": "constant", "value": 5.0 },
            "steps": 3,
            "transitions": [
                {
                    "function": "entering_cohort",
                    "schedule": {
                        "0": [ { "kind": "constant", "value": 1.0 } ]
                    }
                }
            ]
        }"#
    }

    #[test]
    fn test_build_and_run_from_json() {
        let config = ScenarioConfig::from_json(minimal_json()).unwrap();
        let mut engine = config.build_engine().unwrap();
        assert_eq!(engine.logger_name(), "unit-scenario");
        engine.run(config.steps).unwrap();
        assert_abs_diff_eq!(engine.state()[(0, 0, 0)], 8.0, epsilon = 1e-12);
    }

    #[test]
    fn test_values_spec_length_checked() {
        let spec = TensorSpec::Values {
            values: vec![1.0, 2.0],
        };
        let err = spec.build(Shape::new(1, 3, 1)).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::ValueCount {
                expected: 3,
                found: 2,
                ..
            }
        ));
    }

    #[test]
    fn test_matrix_spec_must_be_square_on_axis() {
        let spec = OperandSpec::Matrix {
            axis: StateAxis::Oud,
            rows: vec![vec![1.0, 0.0]],
        };
        let err = spec.build(Shape::new(1, 2, 1)).unwrap_err();
        assert!(matches!(err, ConfigError::MatrixShape { len: 2, .. }));
    }

    #[test]
    fn test_empty_schedule_rejected() {
        let mut config = ScenarioConfig::from_json(minimal_json()).unwrap();
        config.transitions[0].schedule.clear();
        assert!(matches!(
            config.build_engine().unwrap_err(),
            ConfigError::EmptySchedule { index: 0, .. }
        ));
    }
}
