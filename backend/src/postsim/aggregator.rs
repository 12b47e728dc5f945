//! Cost-effectiveness aggregation over a recorded run
//!
//! The aggregator walks the full history and the full tensor extent;
//! timestep subsetting happens in the formatter, not here. NaN and Inf
//! propagate untouched so bad inputs surface in the results.

use thiserror::Error;

use crate::models::cost::{
    Cost, CostList, CostStamp, ResultSet, Totals, UtilityOverTime, UtilityType,
};
use crate::models::history::History;
use crate::postsim::discount::{calculate_discount, discount_factor, WEEKS_PER_YEAR};
use crate::postsim::tables::{CostSource, TableError, UtilitySource};
use crate::tensor::{self, Tensor, TensorError};

#[derive(Debug, Clone, Error, PartialEq)]
pub enum AggregatorError {
    #[error(transparent)]
    Table(#[from] TableError),

    #[error(transparent)]
    Tensor(#[from] TensorError),
}

/// Computes costs, utilities, life-years, and totals from a run history
pub struct Aggregator<'a> {
    history: &'a History,
    costs: &'a dyn CostSource,
    utilities: &'a dyn UtilitySource,
    /// Discrete (per-week compounding) vs continuous discounting
    discrete_discounting: bool,
}

impl<'a> Aggregator<'a> {
    pub fn new(
        history: &'a History,
        costs: &'a dyn CostSource,
        utilities: &'a dyn UtilitySource,
        discrete_discounting: bool,
    ) -> Self {
        Self {
            history,
            costs,
            utilities,
            discrete_discounting,
        }
    }

    /// Elapsed periods for discounting, relative to the first recorded stamp
    fn elapsed(&self, timestep: usize) -> usize {
        timestep - self.history.first_timestep().unwrap_or(0)
    }

    /// Per-perspective, per-timestep cost stamps
    pub fn calculate_costs(&self, discount: bool) -> Result<CostList, AggregatorError> {
        let rate = self.costs.discount_rate();
        let mut list = CostList::new();

        for perspective in self.costs.perspectives() {
            let healthcare = self.costs.healthcare_utilization(&perspective)?;
            let pharmaceutical = self.costs.pharmaceutical(&perspective)?;
            let treatment = self.costs.treatment_utilization(&perspective)?;
            let non_fatal_scalar = self.costs.non_fatal_overdose(&perspective)?;
            let fatal_scalar = self.costs.fatal_overdose(&perspective)?;

            let mut cost = Cost::new(perspective);
            for (timestep, stamp) in self.history.iter() {
                // The full overdose channel is priced with the non-fatal
                // scalar; fatal events are additionally priced on their own.
                let mut costs = CostStamp {
                    healthcare: &stamp.state * healthcare,
                    non_fatal_overdoses: &stamp.overdoses * non_fatal_scalar,
                    fatal_overdoses: &stamp.fatal_overdoses * fatal_scalar,
                    pharmaceuticals: &stamp.state * pharmaceutical,
                    treatments: &stamp.state * treatment,
                };
                if discount {
                    let periods = self.elapsed(timestep);
                    costs = costs.map(|t| {
                        calculate_discount(t, rate, periods, self.discrete_discounting)
                    });
                }
                cost.stamps.insert(timestep, costs);
            }
            list.push(cost);
        }
        Ok(list)
    }

    /// Per-timestep utility tensors, state-weighted
    pub fn calculate_utility(
        &self,
        utility_type: UtilityType,
        discount: bool,
    ) -> Result<UtilityOverTime, AggregatorError> {
        let tables = [
            self.utilities.background(),
            self.utilities.oud(),
            self.utilities.setting(),
        ];
        let combined = match utility_type {
            UtilityType::Min => tensor::elementwise_min(&tables)?,
            UtilityType::Mult => tensor::elementwise_product(&tables)?,
        };

        let rate = self.costs.discount_rate();
        let mut utilities = UtilityOverTime::new();
        for (timestep, stamp) in self.history.iter() {
            let mut weighted: Tensor = &stamp.state * &combined;
            if discount {
                let periods = self.elapsed(timestep);
                weighted =
                    calculate_discount(&weighted, rate, periods, self.discrete_discounting);
            }
            utilities.insert(timestep, weighted);
        }
        Ok(utilities)
    }

    /// Total life-years lived over the recorded run (weekly steps / 52)
    pub fn calculate_life_years(&self, discount: bool) -> f64 {
        let rate = self.costs.discount_rate();
        let mut person_weeks = 0.0;
        for (timestep, stamp) in self.history.iter() {
            let mut mass = tensor::sum_all(&stamp.state);
            if discount {
                let periods = self.elapsed(timestep);
                mass *= discount_factor(rate, periods, self.discrete_discounting);
            }
            person_weeks += mass;
        }
        person_weeks / WEEKS_PER_YEAR
    }

    /// Per-perspective grand totals, every category and timestep summed
    pub fn calculate_total_costs(cost_list: &CostList) -> Vec<f64> {
        cost_list
            .iter()
            .map(|cost| cost.stamps.values().map(CostStamp::total).sum())
            .collect()
    }

    /// Base and discounted result sets in one pass
    pub fn calculate_totals(&self, utility_type: UtilityType) -> Result<Totals, AggregatorError> {
        let result_set = |discount: bool| -> Result<ResultSet, AggregatorError> {
            let costs = self.calculate_costs(discount)?;
            let utility = self.calculate_utility(utility_type, discount)?;
            Ok(ResultSet {
                summed_costs: Self::calculate_total_costs(&costs),
                summed_life_years: self.calculate_life_years(discount),
                summed_utility: utility.values().map(tensor::sum_all).sum(),
            })
        };
        Ok(Totals {
            base: result_set(false)?,
            discounted: result_set(true)?,
        })
    }
}
