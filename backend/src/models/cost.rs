//! Cost and utility result types
//!
//! Post-simulation analysis produces per-timestep cost stamps (one tensor
//! per spending category), per-timestep utility tensors, and scalar result
//! sets summarizing a whole run in base and discounted form.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::tensor::{self, Shape, Tensor};

/// Number of spending categories tracked per stamp
pub const COST_CATEGORIES: usize = 5;

/// Per-timestep costs, one tensor per spending category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostStamp {
    pub healthcare: Tensor,
    pub non_fatal_overdoses: Tensor,
    pub fatal_overdoses: Tensor,
    pub pharmaceuticals: Tensor,
    pub treatments: Tensor,
}

impl CostStamp {
    pub fn zeroed(shape: Shape) -> Self {
        Self {
            healthcare: tensor::zeros(shape),
            non_fatal_overdoses: tensor::zeros(shape),
            fatal_overdoses: tensor::zeros(shape),
            pharmaceuticals: tensor::zeros(shape),
            treatments: tensor::zeros(shape),
        }
    }

    /// Category tensors in fixed order
    pub fn categories(&self) -> [&Tensor; COST_CATEGORIES] {
        [
            &self.healthcare,
            &self.non_fatal_overdoses,
            &self.fatal_overdoses,
            &self.pharmaceuticals,
            &self.treatments,
        ]
    }

    /// Sum of every category over every compartment
    pub fn total(&self) -> f64 {
        self.categories().iter().map(|t| tensor::sum_all(t)).sum()
    }

    /// Apply `f` to every category tensor, producing a new stamp
    pub fn map(&self, mut f: impl FnMut(&Tensor) -> Tensor) -> Self {
        Self {
            healthcare: f(&self.healthcare),
            non_fatal_overdoses: f(&self.non_fatal_overdoses),
            fatal_overdoses: f(&self.fatal_overdoses),
            pharmaceuticals: f(&self.pharmaceuticals),
            treatments: f(&self.treatments),
        }
    }
}

/// Cost stamps keyed by timestep
pub type CostsOverTime = BTreeMap<usize, CostStamp>;

/// Utility tensors keyed by timestep
pub type UtilityOverTime = BTreeMap<usize, Tensor>;

/// One analysis perspective's costs over a full run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cost {
    /// Analysis perspective (e.g. "healthcare sector", "societal")
    pub perspective: String,
    pub stamps: CostsOverTime,
}

impl Cost {
    pub fn new(perspective: impl Into<String>) -> Self {
        Self {
            perspective: perspective.into(),
            stamps: CostsOverTime::new(),
        }
    }
}

/// All perspectives evaluated for a run
pub type CostList = Vec<Cost>;

/// How multiple utility tables combine into one tensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UtilityType {
    /// Elementwise minimum across tables
    Min,
    /// Elementwise product across tables
    Mult,
}

/// Scalar summary of one run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    /// Total cost per perspective, all categories and timesteps summed
    pub summed_costs: Vec<f64>,
    pub summed_life_years: f64,
    pub summed_utility: f64,
}

impl ResultSet {
    /// Grand total across every category
    pub fn total_cost(&self) -> f64 {
        self.summed_costs.iter().sum()
    }
}

/// Base and discounted summaries side by side
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    pub base: ResultSet,
    pub discounted: ResultSet,
}
