//! Scenario runner
//!
//! Usage: respond-sim <scenario.json>
//!
//! Loads a JSON scenario, runs the configured number of timesteps, and
//! prints the cost-effectiveness totals (plus the reporting-timestep cost
//! and utility series, when requested) as JSON on stdout. Exits nonzero on
//! any failure.

use std::fs;
use std::process::ExitCode;

use tracing::{error, info};

use respond_simulator_core_rs::{
    extract_timesteps, Aggregator, ScenarioConfig, UtilityType,
};

fn run(path: &str) -> Result<String, Box<dyn std::error::Error>> {
    let scenario = fs::read_to_string(path)?;
    let config = ScenarioConfig::from_json(&scenario)?;

    let mut engine = config.build_engine()?;
    let report = engine.run(config.steps)?;
    info!(
        run_id = %report.run_id,
        steps = report.steps_taken,
        total_population = report.total_population,
        "simulation finished"
    );

    let mut totals = None;
    let mut reported_costs = None;
    let mut reported_utilities = None;

    if let (Some(costs), Some(utilities)) = (&config.costs, &config.utilities) {
        let utility_type = config.utility_type.unwrap_or(UtilityType::Min);
        let aggregator = Aggregator::new(
            engine.history(),
            costs,
            utilities,
            config.discrete_discounting,
        );
        // Totals always cover the full recorded run.
        totals = Some(aggregator.calculate_totals(utility_type)?);

        if !config.output_timesteps.is_empty() {
            let mut cost_list = aggregator.calculate_costs(false)?;
            let mut utility_series = aggregator.calculate_utility(utility_type, false)?;
            extract_timesteps(
                &config.output_timesteps,
                engine.history_mut(),
                &mut cost_list,
                &mut utility_series,
                true,
            );
            reported_costs = Some(cost_list);
            reported_utilities = Some(utility_series);
        }
    }

    let output = serde_json::json!({
        "run_id": report.run_id,
        "steps_taken": report.steps_taken,
        "final_timestep": report.final_timestep,
        "total_population": report.total_population,
        "totals": totals,
        "reported_costs": reported_costs,
        "reported_utilities": reported_utilities,
    });
    Ok(serde_json::to_string_pretty(&output)?)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args().skip(1);
    let path = match args.next() {
        Some(path) => path,
        None => {
            eprintln!("usage: respond-sim <scenario.json>");
            return ExitCode::from(2);
        }
    };

    match run(&path) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(%err, "scenario run failed");
            ExitCode::FAILURE
        }
    }
}
