//! Cost and utility table contracts
//!
//! The aggregator pulls its inputs through the `CostSource` and
//! `UtilitySource` traits so callers can back them with anything (loaded
//! files, databases, fixtures). `CostTable` and `UtilityTable` are the
//! in-memory implementations the CLI and FFI layers deserialize into.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::tensor::Tensor;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum TableError {
    #[error("unknown cost perspective '{0}'")]
    UnknownPerspective(String),
}

/// Provider of per-compartment cost inputs, keyed by analysis perspective
pub trait CostSource {
    /// Perspective names in a stable order
    fn perspectives(&self) -> Vec<String>;

    /// Weekly healthcare-utilization cost per person, per compartment
    fn healthcare_utilization(&self, perspective: &str) -> Result<&Tensor, TableError>;

    /// Weekly pharmaceutical cost per person, per compartment
    fn pharmaceutical(&self, perspective: &str) -> Result<&Tensor, TableError>;

    /// Weekly treatment-utilization cost per person, per compartment
    fn treatment_utilization(&self, perspective: &str) -> Result<&Tensor, TableError>;

    /// Cost per non-fatal overdose event
    fn non_fatal_overdose(&self, perspective: &str) -> Result<f64, TableError>;

    /// Cost per fatal overdose event
    fn fatal_overdose(&self, perspective: &str) -> Result<f64, TableError>;

    /// Annual discount rate applied to this table's outputs
    fn discount_rate(&self) -> f64;
}

/// Provider of per-compartment utility weights
pub trait UtilitySource {
    /// Background (demographic) utility
    fn background(&self) -> &Tensor;

    /// OUD-state utility
    fn oud(&self) -> &Tensor;

    /// Care-setting utility
    fn setting(&self) -> &Tensor;
}

/// Cost inputs for one perspective
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerspectiveCosts {
    pub healthcare_utilization: Tensor,
    pub pharmaceutical: Tensor,
    pub treatment_utilization: Tensor,
    pub non_fatal_overdose: f64,
    pub fatal_overdose: f64,
}

/// In-memory cost table covering one or more perspectives
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostTable {
    perspectives: BTreeMap<String, PerspectiveCosts>,
    discount_rate: f64,
}

impl CostTable {
    pub fn new(perspectives: BTreeMap<String, PerspectiveCosts>, discount_rate: f64) -> Self {
        Self {
            perspectives,
            discount_rate,
        }
    }

    fn lookup(&self, perspective: &str) -> Result<&PerspectiveCosts, TableError> {
        self.perspectives
            .get(perspective)
            .ok_or_else(|| TableError::UnknownPerspective(perspective.to_string()))
    }
}

impl CostSource for CostTable {
    fn perspectives(&self) -> Vec<String> {
        self.perspectives.keys().cloned().collect()
    }

    fn healthcare_utilization(&self, perspective: &str) -> Result<&Tensor, TableError> {
        Ok(&self.lookup(perspective)?.healthcare_utilization)
    }

    fn pharmaceutical(&self, perspective: &str) -> Result<&Tensor, TableError> {
        Ok(&self.lookup(perspective)?.pharmaceutical)
    }

    fn treatment_utilization(&self, perspective: &str) -> Result<&Tensor, TableError> {
        Ok(&self.lookup(perspective)?.treatment_utilization)
    }

    fn non_fatal_overdose(&self, perspective: &str) -> Result<f64, TableError> {
        Ok(self.lookup(perspective)?.non_fatal_overdose)
    }

    fn fatal_overdose(&self, perspective: &str) -> Result<f64, TableError> {
        Ok(self.lookup(perspective)?.fatal_overdose)
    }

    fn discount_rate(&self) -> f64 {
        self.discount_rate
    }
}

/// In-memory utility weight table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UtilityTable {
    pub background: Tensor,
    pub oud: Tensor,
    pub setting: Tensor,
}

impl UtilitySource for UtilityTable {
    fn background(&self) -> &Tensor {
        &self.background
    }

    fn oud(&self) -> &Tensor {
        &self.oud
    }

    fn setting(&self) -> &Tensor {
        &self.setting
    }
}
