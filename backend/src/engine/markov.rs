//! Markov simulation engine
//!
//! The engine advances a cohort through discrete timesteps by evaluating an
//! ordered schedule of transitions. Every transition in a step sees the same
//! state snapshot; the engine accumulates their deltas so that
//!
//!   S(t+1) = S(t) + sum_i (f_i(S(t)) - S(t))
//!
//! An empty schedule therefore evolves the state as the identity. Exactly
//! one history stamp is recorded per completed step; a failing transition
//! aborts the step before anything is recorded.

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::core::time::Timeline;
use crate::models::cohort::Cohort;
use crate::models::history::{History, HistoryError, HistoryStamp};
use crate::tensor::Tensor;
use crate::transitions::{StampBuilder, Transition, TransitionError};

/// Engine lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnginePhase {
    /// Constructed, no steps taken since the last run finished
    Idle,
    /// Inside a multi-step `run`
    Running,
    /// Inside a single `step`
    Stepping,
    /// A `run` completed; `run` or `step` resumes from here
    Terminated,
}

/// Errors raised while advancing the simulation
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EngineError {
    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error(transparent)]
    History(#[from] HistoryError),
}

/// Summary of one `run` invocation
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Fresh id per invocation
    pub run_id: Uuid,
    pub steps_requested: usize,
    pub steps_taken: usize,
    /// Timestep the cohort sits at after the run
    pub final_timestep: usize,
    pub total_population: f64,
}

/// Discrete-time compartmental simulation engine
#[derive(Debug, Clone)]
pub struct MarkovEngine {
    cohort: Cohort,
    schedule: Vec<Transition>,
    phase: EnginePhase,
    /// Instance-scoped name carried through logs; preserved by `Clone`
    logger_name: String,
}

impl MarkovEngine {
    pub fn new(
        initial_state: Tensor,
        timeline: Timeline,
        schedule: Vec<Transition>,
        logger_name: impl Into<String>,
    ) -> Self {
        Self {
            cohort: Cohort::new(initial_state, timeline),
            schedule,
            phase: EnginePhase::Idle,
            logger_name: logger_name.into(),
        }
    }

    pub fn phase(&self) -> EnginePhase {
        self.phase
    }

    pub fn logger_name(&self) -> &str {
        &self.logger_name
    }

    pub fn current_timestep(&self) -> usize {
        self.cohort.timeline.current_step()
    }

    pub fn state(&self) -> &Tensor {
        &self.cohort.state
    }

    pub fn cohort(&self) -> &Cohort {
        &self.cohort
    }

    pub fn history(&self) -> &History {
        &self.cohort.history
    }

    /// Mutable history access for the timestep formatter
    pub fn history_mut(&mut self) -> &mut History {
        &mut self.cohort.history
    }

    /// Run `steps` timesteps, then terminate.
    ///
    /// The first invocation records the initial state at t=0 before any
    /// step, so `run(0)` leaves exactly that one stamp. A later `run`
    /// resumes from the recorded state and timestep.
    pub fn run(&mut self, steps: usize) -> Result<RunReport, EngineError> {
        let run_id = Uuid::new_v4();
        let start = self.current_timestep();
        info!(
            engine = %self.logger_name,
            %run_id,
            steps,
            start_timestep = start,
            "starting run"
        );

        self.phase = EnginePhase::Running;
        self.record_initial_stamp()?;

        let mut taken = 0;
        let result: Result<(), EngineError> = (|| {
            for _ in 0..steps {
                self.step_inner()?;
                taken += 1;
            }
            Ok(())
        })();
        self.phase = EnginePhase::Terminated;
        result?;

        let report = RunReport {
            run_id,
            steps_requested: steps,
            steps_taken: taken,
            final_timestep: self.current_timestep(),
            total_population: self.cohort.total_population(),
        };
        info!(
            engine = %self.logger_name,
            %run_id,
            final_timestep = report.final_timestep,
            total_population = report.total_population,
            "run complete"
        );
        Ok(report)
    }

    /// Advance exactly one timestep
    pub fn step(&mut self) -> Result<(), EngineError> {
        self.phase = EnginePhase::Stepping;
        self.record_initial_stamp()?;
        let result = self.step_inner();
        self.phase = EnginePhase::Idle;
        result
    }

    /// Record the t=0 stamp (zero flow tensors) once, lazily
    fn record_initial_stamp(&mut self) -> Result<(), HistoryError> {
        if self.cohort.history.is_empty() && self.current_timestep() == 0 {
            let stamp = HistoryStamp::with_state(self.cohort.state.clone());
            self.cohort.history.record(0, stamp)?;
        }
        Ok(())
    }

    fn step_inner(&mut self) -> Result<(), EngineError> {
        let t = self.current_timestep();
        let snapshot = self.cohort.state.clone();
        let mut stamps = StampBuilder::new(self.cohort.shape());

        let mut next = snapshot.clone();
        for transition in &self.schedule {
            let proposed = transition.evaluate(&snapshot, t, &mut stamps)?;
            debug!(
                engine = %self.logger_name,
                timestep = t,
                transition = transition.name(),
                "transition evaluated"
            );
            let delta = proposed - &snapshot;
            next += &delta;
        }

        // All transitions succeeded; commit the step atomically.
        self.cohort.history.record(t + 1, stamps.finish(next.clone()))?;
        self.cohort.state = next;
        self.cohort.timeline.advance();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tensor::{self, Shape};
    use crate::transitions::{Operand, OperandSchedule};
    use crate::transitions::functions::EnteringCohort;
    use approx::assert_abs_diff_eq;

    fn engine_with(schedule: Vec<Transition>) -> MarkovEngine {
        let state = tensor::constant(Shape::new(1, 2, 1), 1.0);
        MarkovEngine::new(state, Timeline::default(), schedule, "test-engine")
    }

    fn add_constant(value: f64) -> Transition {
        let arrivals = tensor::constant(Shape::new(1, 2, 1), value);
        Transition::new(
            Box::new(EnteringCohort),
            OperandSchedule::fixed(vec![Operand::Tensor(arrivals)]),
        )
    }

    #[test]
    fn test_empty_schedule_is_identity() {
        let mut engine = engine_with(vec![]);
        engine.run(10).unwrap();
        assert_abs_diff_eq!(engine.state()[(0, 0, 0)], 1.0, epsilon = 1e-12);
        assert_eq!(engine.history().len(), 11);
    }

    #[test]
    fn test_run_zero_records_initial_stamp_only() {
        let mut engine = engine_with(vec![add_constant(1.0)]);
        let report = engine.run(0).unwrap();
        assert_eq!(report.steps_taken, 0);
        assert_eq!(engine.history().len(), 1);
        let stamp = engine.history().get(0).unwrap();
        assert_abs_diff_eq!(tensor::sum_all(&stamp.overdoses), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_run_resumes_after_termination() {
        let mut engine = engine_with(vec![add_constant(1.0)]);
        engine.run(3).unwrap();
        assert_eq!(engine.phase(), EnginePhase::Terminated);
        engine.run(2).unwrap();
        assert_eq!(engine.current_timestep(), 5);
        // One stamp per step plus t=0; resuming never re-records.
        assert_eq!(engine.history().len(), 6);
        assert_abs_diff_eq!(engine.state()[(0, 0, 0)], 6.0, epsilon = 1e-12);
    }

    #[test]
    fn test_failing_transition_leaves_history_consistent() {
        let mut schedule = OperandSchedule::new();
        schedule.insert(2, vec![Operand::Tensor(tensor::zeros(Shape::new(1, 2, 1)))]);
        let late = Transition::new(Box::new(EnteringCohort), schedule);

        let mut engine = engine_with(vec![late]);
        let err = engine.run(5).unwrap_err();
        assert!(matches!(
            err,
            EngineError::Transition(TransitionError::MissingSchedule { timestep: 0, .. })
        ));
        // Only the t=0 stamp exists; no partial step was recorded.
        assert_eq!(engine.history().len(), 1);
        assert_eq!(engine.current_timestep(), 0);
    }
}
