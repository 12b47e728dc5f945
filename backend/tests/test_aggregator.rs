//! Aggregation of costs, utilities, and life-years from a run history

use std::collections::BTreeMap;

use approx::assert_abs_diff_eq;

use respond_simulator_core_rs::{
    tensor, Aggregator, CostTable, History, HistoryStamp, PerspectiveCosts, Shape, UtilityTable,
    UtilityType,
};

fn shape() -> Shape {
    Shape::new(1, 1, 1)
}

/// Three stamps with state masses 3, 4, 5 at t = 0..2
fn history() -> History {
    let mut history = History::new();
    for (t, mass) in [(0, 3.0), (1, 4.0), (2, 5.0)] {
        let mut stamp = HistoryStamp::with_state(tensor::constant(shape(), mass));
        stamp.overdoses = tensor::constant(shape(), 0.3);
        stamp.fatal_overdoses = tensor::constant(shape(), 0.1);
        history.record(t, stamp).unwrap();
    }
    history
}

fn cost_table(rate: f64) -> CostTable {
    let costs = PerspectiveCosts {
        healthcare_utilization: tensor::constant(shape(), 1.23),
        pharmaceutical: tensor::zeros(shape()),
        treatment_utilization: tensor::zeros(shape()),
        non_fatal_overdose: 10.0,
        fatal_overdose: 100.0,
    };
    let mut perspectives = BTreeMap::new();
    perspectives.insert("healthcare sector".to_string(), costs);
    CostTable::new(perspectives, rate)
}

fn utility_table() -> UtilityTable {
    UtilityTable {
        background: tensor::constant(shape(), 0.9),
        oud: tensor::constant(shape(), 0.8),
        setting: tensor::constant(shape(), 0.95),
    }
}

#[test]
fn healthcare_costs_scale_with_state() {
    let history = history();
    let costs = cost_table(0.0);
    let utilities = utility_table();
    let aggregator = Aggregator::new(&history, &costs, &utilities, false);

    let list = aggregator.calculate_costs(false).unwrap();
    let stamps = &list[0].stamps;
    assert_abs_diff_eq!(stamps[&0].healthcare[(0, 0, 0)], 3.69, epsilon = 1e-9);
    assert_abs_diff_eq!(stamps[&1].healthcare[(0, 0, 0)], 4.92, epsilon = 1e-9);
    assert_abs_diff_eq!(stamps[&2].healthcare[(0, 0, 0)], 6.15, epsilon = 1e-9);
}

#[test]
fn overdose_costs_use_event_scalars() {
    let history = history();
    let costs = cost_table(0.0);
    let utilities = utility_table();
    let aggregator = Aggregator::new(&history, &costs, &utilities, false);

    let list = aggregator.calculate_costs(false).unwrap();
    let stamp = &list[0].stamps[&0];
    // The full 0.3 overdose channel at 10, the 0.1 fatal share at 100.
    // Fatal events are priced under both scalars, as the model intends.
    assert_abs_diff_eq!(stamp.non_fatal_overdoses[(0, 0, 0)], 3.0, epsilon = 1e-9);
    assert_abs_diff_eq!(stamp.fatal_overdoses[(0, 0, 0)], 10.0, epsilon = 1e-9);
}

#[test]
fn total_costs_match_per_category_sums() {
    let history = history();
    let costs = cost_table(0.0);
    let utilities = utility_table();
    let aggregator = Aggregator::new(&history, &costs, &utilities, false);

    let list = aggregator.calculate_costs(false).unwrap();
    let totals = Aggregator::calculate_total_costs(&list);
    assert_eq!(totals.len(), 1);

    let manual: f64 = list[0]
        .stamps
        .values()
        .map(|stamp| {
            stamp
                .categories()
                .iter()
                .map(|t| tensor::sum_all(t))
                .sum::<f64>()
        })
        .sum();
    assert_abs_diff_eq!(totals[0], manual, epsilon = 1e-9);
    // 3.69 + 4.92 + 6.15 healthcare, plus 3 x (3.0 + 10.0) overdose costs.
    assert_abs_diff_eq!(totals[0], 14.76 + 39.0, epsilon = 1e-9);
}

#[test]
fn life_years_are_person_weeks_over_52() {
    let history = history();
    let costs = cost_table(0.0);
    let utilities = utility_table();
    let aggregator = Aggregator::new(&history, &costs, &utilities, false);

    assert_abs_diff_eq!(
        aggregator.calculate_life_years(false),
        12.0 / 52.0,
        epsilon = 1e-12
    );
}

#[test]
fn utility_combines_by_min_and_mult() {
    let history = history();
    let costs = cost_table(0.0);
    let utilities = utility_table();
    let aggregator = Aggregator::new(&history, &costs, &utilities, false);

    let min = aggregator.calculate_utility(UtilityType::Min, false).unwrap();
    assert_abs_diff_eq!(min[&0][(0, 0, 0)], 3.0 * 0.8, epsilon = 1e-9);

    let mult = aggregator
        .calculate_utility(UtilityType::Mult, false)
        .unwrap();
    assert_abs_diff_eq!(mult[&2][(0, 0, 0)], 5.0 * 0.9 * 0.8 * 0.95, epsilon = 1e-9);
}

#[test]
fn totals_bundle_base_and_discounted() {
    let history = history();
    let costs = cost_table(0.03);
    let utilities = utility_table();
    let aggregator = Aggregator::new(&history, &costs, &utilities, false);

    let totals = aggregator.calculate_totals(UtilityType::Min).unwrap();
    assert_eq!(totals.base.summed_costs.len(), 1);
    assert_abs_diff_eq!(
        totals.base.summed_life_years,
        12.0 / 52.0,
        epsilon = 1e-12
    );
    assert_abs_diff_eq!(
        totals.base.summed_utility,
        (3.0 + 4.0 + 5.0) * 0.8,
        epsilon = 1e-9
    );
    // Positive rate: the applied factor exceeds 1 past the first stamp.
    assert!(totals.discounted.total_cost() > totals.base.total_cost());
}

#[test]
fn empty_history_yields_zero_totals() {
    let history = History::new();
    let costs = cost_table(0.03);
    let utilities = utility_table();
    let aggregator = Aggregator::new(&history, &costs, &utilities, false);

    let totals = aggregator.calculate_totals(UtilityType::Mult).unwrap();
    assert_abs_diff_eq!(totals.base.total_cost(), 0.0, epsilon = 1e-12);
    assert_abs_diff_eq!(totals.base.summed_life_years, 0.0, epsilon = 1e-12);
    assert_abs_diff_eq!(totals.discounted.summed_utility, 0.0, epsilon = 1e-12);
}
