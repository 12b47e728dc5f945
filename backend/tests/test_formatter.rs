//! Reporting-timestep extraction over histories, costs, and utilities

use std::collections::BTreeMap;

use approx::assert_abs_diff_eq;

use respond_simulator_core_rs::{
    extract_timesteps, tensor, Cost, CostList, CostStamp, History, HistoryStamp, Shape,
    UtilityOverTime,
};

fn shape() -> Shape {
    Shape::new(1, 1, 1)
}

/// Stamps at t = 1..=10 with state mass t and unit flows
fn history() -> History {
    let mut history = History::new();
    for t in 1..=10 {
        let mut stamp = HistoryStamp::with_state(tensor::constant(shape(), t as f64));
        stamp.overdoses = tensor::constant(shape(), 1.0);
        stamp.fatal_overdoses = tensor::constant(shape(), 0.5);
        stamp.mortality = tensor::constant(shape(), 0.25);
        history.record(t, stamp).unwrap();
    }
    history
}

fn cost_list() -> CostList {
    let mut cost = Cost::new("healthcare sector");
    for t in 1..=10 {
        let mut stamp = CostStamp::zeroed(shape());
        stamp.healthcare = tensor::constant(shape(), t as f64);
        cost.stamps.insert(t, stamp);
    }
    vec![cost]
}

fn utilities() -> UtilityOverTime {
    (1..=10)
        .map(|t| (t, tensor::constant(shape(), 1.0)))
        .collect::<BTreeMap<_, _>>()
}

#[test]
fn states_are_trimmed_to_exact_samples() {
    let mut history = history();
    let mut costs = CostList::new();
    let mut utility_series = UtilityOverTime::new();

    extract_timesteps(&[2, 5, 8], &mut history, &mut costs, &mut utility_series, false);

    assert_eq!(history.timesteps(), vec![2, 5, 8]);
    assert_abs_diff_eq!(
        history.get(5).unwrap().state[(0, 0, 0)],
        5.0,
        epsilon = 1e-12
    );
}

#[test]
fn flows_are_accumulated_between_boundaries() {
    let mut history = history();
    let mut costs = CostList::new();
    let mut utility_series = UtilityOverTime::new();

    extract_timesteps(&[5, 10], &mut history, &mut costs, &mut utility_series, false);

    // Overdose flows of 1.0 per step: 5 steps per window.
    let first = history.get(5).unwrap();
    assert_abs_diff_eq!(first.overdoses[(0, 0, 0)], 5.0, epsilon = 1e-12);
    assert_abs_diff_eq!(first.fatal_overdoses[(0, 0, 0)], 2.5, epsilon = 1e-12);
    assert_abs_diff_eq!(first.mortality[(0, 0, 0)], 1.25, epsilon = 1e-12);

    let second = history.get(10).unwrap();
    assert_abs_diff_eq!(second.overdoses[(0, 0, 0)], 5.0, epsilon = 1e-12);
    // States stay point-in-time samples.
    assert_abs_diff_eq!(second.state[(0, 0, 0)], 10.0, epsilon = 1e-12);
}

#[test]
fn cost_switch_reduces_costs_and_utilities() {
    let mut history = history();
    let mut costs = cost_list();
    let mut utility_series = utilities();

    extract_timesteps(&[5, 10], &mut history, &mut costs, &mut utility_series, true);

    let stamps = &costs[0].stamps;
    assert_eq!(stamps.keys().copied().collect::<Vec<_>>(), vec![5, 10]);
    // 1+2+3+4+5 and 6+7+8+9+10.
    assert_abs_diff_eq!(stamps[&5].healthcare[(0, 0, 0)], 15.0, epsilon = 1e-12);
    assert_abs_diff_eq!(stamps[&10].healthcare[(0, 0, 0)], 40.0, epsilon = 1e-12);

    assert_eq!(utility_series.len(), 2);
    assert_abs_diff_eq!(utility_series[&5][(0, 0, 0)], 5.0, epsilon = 1e-12);
}

#[test]
fn cost_switch_off_leaves_costs_untouched() {
    let mut history = history();
    let mut costs = cost_list();
    let mut utility_series = utilities();

    extract_timesteps(&[5, 10], &mut history, &mut costs, &mut utility_series, false);

    assert_eq!(costs[0].stamps.len(), 10);
    assert_eq!(utility_series.len(), 10);
    assert_eq!(history.len(), 2);
}

#[test]
fn boundary_past_the_recorded_range_produces_no_stamps() {
    let mut history = history();
    let mut costs = cost_list();
    let mut utility_series = utilities();

    extract_timesteps(&[5, 20], &mut history, &mut costs, &mut utility_series, true);

    // t=20 was never simulated: no fabricated cost, utility, or history
    // entry; the tail past t=5 is discarded.
    assert_eq!(history.timesteps(), vec![5]);
    assert_eq!(
        costs[0].stamps.keys().copied().collect::<Vec<_>>(),
        vec![5]
    );
    assert_eq!(utility_series.keys().copied().collect::<Vec<_>>(), vec![5]);
    assert_abs_diff_eq!(
        costs[0].stamps[&5].healthcare[(0, 0, 0)],
        15.0,
        epsilon = 1e-12
    );
}

#[test]
fn empty_request_is_a_no_op() {
    let mut history = history();
    let mut costs = cost_list();
    let mut utility_series = utilities();

    extract_timesteps(&[], &mut history, &mut costs, &mut utility_series, true);

    assert_eq!(history.len(), 10);
    assert_eq!(costs[0].stamps.len(), 10);
    assert_eq!(utility_series.len(), 10);
}

#[test]
fn unsorted_duplicate_request_behaves_like_sorted() {
    let mut sorted_history = history();
    let mut unsorted_history = history();
    let mut costs = CostList::new();
    let mut utility_series = UtilityOverTime::new();

    extract_timesteps(&[5, 10], &mut sorted_history, &mut costs, &mut utility_series, false);
    extract_timesteps(
        &[10, 5, 5],
        &mut unsorted_history,
        &mut costs,
        &mut utility_series,
        false,
    );

    assert_eq!(sorted_history, unsorted_history);
}
