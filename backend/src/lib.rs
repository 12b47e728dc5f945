//! RESPOND Simulator Core - Rust Engine
//!
//! Compartmental (Markov) simulation of opioid use disorder populations
//! with downstream cost-effectiveness analysis.
//!
//! # Architecture
//!
//! - **core**: Time management
//! - **tensor**: Canonical population tensor and operand math
//! - **models**: Domain types (Cohort, History, Cost results)
//! - **transitions**: Transition functions and operand schedules
//! - **engine**: Main simulation loop
//! - **postsim**: Discounting, cost/utility tables, aggregation
//! - **formatter**: Reporting-timestep extraction
//! - **config**: JSON scenario description
//!
//! # Critical Invariants
//!
//! 1. All transitions in a step see the same state snapshot
//! 2. Exactly one history stamp per completed timestep
//! 3. FFI boundary is minimal and safe

// Module declarations
pub mod config;
pub mod core;
pub mod engine;
pub mod formatter;
pub mod models;
pub mod postsim;
pub mod tensor;
pub mod transitions;

// Re-exports for convenience
pub use config::{ConfigError, OperandSpec, ScenarioConfig, TensorSpec, TransitionConfig, TransitionKind};
pub use core::time::{Timeline, STEPS_PER_YEAR};
pub use engine::{EngineError, EnginePhase, MarkovEngine, RunReport};
pub use formatter::extract_timesteps;
pub use models::{
    cohort::Cohort,
    cost::{Cost, CostList, CostStamp, ResultSet, Totals, UtilityOverTime, UtilityType},
    history::{History, HistoryError, HistoryStamp},
};
pub use postsim::{
    calculate_discount, discount_factor, Aggregator, AggregatorError, CostSource, CostTable,
    PerspectiveCosts, TableError, UtilitySource, UtilityTable, WEEKS_PER_YEAR,
};
pub use tensor::{OperandMatrix, Shape, StateAxis, Tensor, TensorError};
pub use transitions::{
    Operand, OperandSchedule, StampBuilder, Transition, TransitionError, TransitionFunction,
};

// FFI module (when feature enabled)
#[cfg(feature = "pyo3")]
pub mod ffi;

// PyO3 exports (when feature enabled)
#[cfg(feature = "pyo3")]
use pyo3::prelude::*;

#[cfg(feature = "pyo3")]
#[pymodule]
fn respond_simulator_core_rs(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<ffi::engine::PyRespondEngine>()?;
    Ok(())
}
