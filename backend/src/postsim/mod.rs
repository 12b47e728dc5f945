//! Post-simulation analysis: discounting, cost/utility tables, aggregation

pub mod aggregator;
pub mod discount;
pub mod tables;

pub use aggregator::{Aggregator, AggregatorError};
pub use discount::{calculate_discount, discount_factor, WEEKS_PER_YEAR};
pub use tables::{CostSource, CostTable, PerspectiveCosts, TableError, UtilitySource, UtilityTable};
