//! Timestep extraction for reporting
//!
//! Downstream writers usually want a handful of reporting timesteps, not
//! every weekly stamp. Two reductions apply:
//!
//! - **trim**: keep only the stamps recorded exactly at requested timesteps
//!   (used for point-in-time state).
//! - **trim-and-add**: accumulate a running sum between requested
//!   boundaries and flush it at each boundary (used for flow quantities,
//!   costs, and utilities, where skipped weeks must not be lost).
//!
//! Requesting {5, 10} over a series recorded at t = 1..10 yields an entry
//! at 5 holding the sum over 1..=5 and an entry at 10 holding 6..=10.

use std::collections::BTreeMap;

use crate::models::cost::{CostList, CostStamp, UtilityOverTime};
use crate::models::history::{History, HistoryStamp};
use crate::tensor::Tensor;

/// Sorted, deduplicated copy of the requested timesteps
fn normalize(timesteps: &[usize]) -> Vec<usize> {
    let mut sorted = timesteps.to_vec();
    sorted.sort_unstable();
    sorted.dedup();
    sorted
}

/// Cumulative reduction of a timestep-keyed series.
///
/// Entries past the last requested boundary are dropped; a boundary whose
/// window holds no entries produces no output. A boundary the series never
/// reaches produces no output either: its partial window is discarded, so
/// no stamp is fabricated at a timestep that was never simulated.
fn trim_and_add<T: Clone>(
    requested: &[usize],
    series: &BTreeMap<usize, T>,
    add: impl Fn(&mut T, &T),
) -> BTreeMap<usize, T> {
    let mut out = BTreeMap::new();
    let mut boundaries = requested.iter().copied().peekable();
    let mut acc: Option<T> = None;
    let mut last_seen = None;

    for (&timestep, value) in series {
        while let Some(&boundary) = boundaries.peek() {
            if timestep <= boundary {
                break;
            }
            if let Some(window) = acc.take() {
                out.insert(boundary, window);
            }
            boundaries.next();
        }
        if boundaries.peek().is_none() {
            break;
        }
        match acc.as_mut() {
            Some(window) => add(window, value),
            None => acc = Some(value.clone()),
        }
        last_seen = Some(timestep);
    }
    if let (Some(&boundary), Some(window)) = (boundaries.peek(), acc.take()) {
        if last_seen == Some(boundary) {
            out.insert(boundary, window);
        }
    }
    out
}

fn add_tensors(acc: &mut Tensor, value: &Tensor) {
    *acc += value;
}

fn add_cost_stamps(acc: &mut CostStamp, value: &CostStamp) {
    acc.healthcare += &value.healthcare;
    acc.non_fatal_overdoses += &value.non_fatal_overdoses;
    acc.fatal_overdoses += &value.fatal_overdoses;
    acc.pharmaceuticals += &value.pharmaceuticals;
    acc.treatments += &value.treatments;
}

fn add_flows(acc: &mut HistoryStamp, value: &HistoryStamp) {
    acc.overdoses += &value.overdoses;
    acc.fatal_overdoses += &value.fatal_overdoses;
    acc.intervention_admissions += &value.intervention_admissions;
    acc.mortality += &value.mortality;
}

/// Reduce a run's outputs to the requested reporting timesteps, in place.
///
/// States are trimmed; flow tensors are trim-and-added. When `cost_switch`
/// is set the cost and utility series are trim-and-added too; otherwise
/// they are left untouched. An empty request is a no-op.
pub fn extract_timesteps(
    timesteps: &[usize],
    history: &mut History,
    costs: &mut CostList,
    utilities: &mut UtilityOverTime,
    cost_switch: bool,
) {
    let requested = normalize(timesteps);
    if requested.is_empty() {
        return;
    }

    let full: BTreeMap<usize, HistoryStamp> =
        history.iter().map(|(t, s)| (t, s.clone())).collect();
    let mut reduced = trim_and_add(&requested, &full, add_flows);
    // Flow windows carry the accumulated sums; states stay exact-match
    // samples, so a boundary with no recorded stamp yields no entry.
    reduced.retain(|timestep, _| full.contains_key(timestep));
    for (timestep, stamp) in reduced.iter_mut() {
        stamp.state = full[timestep].state.clone();
    }
    history.replace(reduced);

    if cost_switch {
        for cost in costs.iter_mut() {
            cost.stamps = trim_and_add(&requested, &cost.stamps, add_cost_stamps);
        }
        *utilities = trim_and_add(&requested, utilities, add_tensors);
    }
}
