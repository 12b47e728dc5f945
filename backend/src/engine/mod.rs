//! Simulation engine

pub mod markov;

pub use markov::{EngineError, EnginePhase, MarkovEngine, RunReport};
