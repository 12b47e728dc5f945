//! PyO3 wrapper for the Markov engine
//!
//! # Example (from Python)
//!
//! ```python
//! from respond_simulator_core_rs import RespondEngine
//!
//! scenario = open("scenario.json").read()
//! engine = RespondEngine.from_json(scenario)
//! report = engine.run(520)
//! print(report["total_population"])
//! totals = engine.totals()
//! print(totals["discounted"]["summed_life_years"])
//! ```

use pyo3::prelude::*;
use pyo3::types::PyDict;

use crate::config::ScenarioConfig;
use crate::engine::{EnginePhase, MarkovEngine};
use crate::formatter::extract_timesteps;
use crate::models::cost::{CostList, UtilityOverTime, UtilityType};
use crate::postsim::Aggregator;

use super::types::{engine_error, report_to_py, stamp_to_py, tensor_to_py, totals_to_py, value_error};

/// Python entry point to the simulation engine
#[pyclass(name = "RespondEngine")]
pub struct PyRespondEngine {
    inner: MarkovEngine,
    config: ScenarioConfig,
}

#[pymethods]
impl PyRespondEngine {
    /// Build an engine from JSON scenario text.
    ///
    /// Raises ValueError on malformed JSON or inconsistent dimensions.
    #[staticmethod]
    fn from_json(scenario: &str) -> PyResult<Self> {
        let config = ScenarioConfig::from_json(scenario).map_err(value_error)?;
        let inner = config.build_engine().map_err(value_error)?;
        Ok(Self { inner, config })
    }

    /// Run `steps` timesteps and return a run report dict
    fn run(&mut self, py: Python, steps: usize) -> PyResult<Py<PyDict>> {
        let report = self.inner.run(steps).map_err(engine_error)?;
        report_to_py(py, &report)
    }

    /// Run the scenario's configured number of steps
    fn run_scenario(&mut self, py: Python) -> PyResult<Py<PyDict>> {
        let steps = self.config.steps;
        self.run(py, steps)
    }

    /// Advance exactly one timestep
    fn step(&mut self) -> PyResult<()> {
        self.inner.step().map_err(engine_error)
    }

    fn current_timestep(&self) -> usize {
        self.inner.current_timestep()
    }

    fn total_population(&self) -> f64 {
        self.inner.cohort().total_population()
    }

    fn phase(&self) -> &'static str {
        match self.inner.phase() {
            EnginePhase::Idle => "idle",
            EnginePhase::Running => "running",
            EnginePhase::Stepping => "stepping",
            EnginePhase::Terminated => "terminated",
        }
    }

    /// Current state as a flat row-major list
    fn state(&self) -> Vec<f64> {
        tensor_to_py(self.inner.state())
    }

    /// Tensor dimensions as (interventions, oud_states, demographics)
    fn shape(&self) -> (usize, usize, usize) {
        self.inner.cohort().shape().dims()
    }

    /// Recorded timesteps in order
    fn history_timesteps(&self) -> Vec<usize> {
        self.inner.history().timesteps()
    }

    /// One recorded stamp as a dict of flat tensors.
    ///
    /// Raises ValueError for unrecorded timesteps.
    fn stamp(&self, py: Python, timestep: usize) -> PyResult<Py<PyDict>> {
        let stamp = self.inner.history().get(timestep).map_err(value_error)?;
        stamp_to_py(py, timestep, stamp)
    }

    /// Reduce the recorded history to the given reporting timesteps
    fn extract(&mut self, timesteps: Vec<usize>) {
        let mut costs = CostList::new();
        let mut utilities = UtilityOverTime::new();
        extract_timesteps(
            &timesteps,
            self.inner.history_mut(),
            &mut costs,
            &mut utilities,
            false,
        );
    }

    /// Cost-effectiveness totals over the recorded history.
    ///
    /// Requires the scenario to carry cost and utility tables; raises
    /// ValueError otherwise.
    fn totals(&self, py: Python) -> PyResult<Py<PyDict>> {
        let costs = self
            .config
            .costs
            .as_ref()
            .ok_or_else(|| value_error("scenario has no cost table"))?;
        let utilities = self
            .config
            .utilities
            .as_ref()
            .ok_or_else(|| value_error("scenario has no utility table"))?;
        let utility_type = self.config.utility_type.unwrap_or(UtilityType::Min);

        let aggregator = Aggregator::new(
            self.inner.history(),
            costs,
            utilities,
            self.config.discrete_discounting,
        );
        let totals = aggregator
            .calculate_totals(utility_type)
            .map_err(value_error)?;
        totals_to_py(py, &totals)
    }

    /// Deep copy with independent state, history, and schedule
    fn branch(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            config: self.config.clone(),
        }
    }
}
