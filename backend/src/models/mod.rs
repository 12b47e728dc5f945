//! Domain types: population cohort, run history, cost/utility results

pub mod cohort;
pub mod cost;
pub mod history;
