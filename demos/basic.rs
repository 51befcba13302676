//! Basic example of using the library: tabu search on an instance file.

use std::env;
use std::time::{Duration, Instant};

use vrp_heuristics::config::Config;
use vrp_heuristics::evaluator::Evaluator;
use vrp_heuristics::problem::Problem;
use vrp_heuristics::utils::{format_duration, print_solution, save_solution, SolutionRecord};
use vrp_heuristics::VrpSolver;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Get instance path from command line or use default
    let args: Vec<String> = env::args().collect();
    let instance_path = if args.len() > 1 {
        &args[1]
    } else {
        "instances/sample.txt"
    };

    println!("Loading problem from: {}", instance_path);
    let problem = Problem::from_file(instance_path)?;
    println!(
        "Loaded {} customers, {} trucks of capacity {}",
        problem.customer_count(),
        problem.fleet_size,
        problem.vehicle_capacity
    );

    let config = Config::new()
        .with_max_iterations(500)
        .with_tabu_lifetime(15)
        .with_neighborhood_size(200)
        .with_time_limit(Duration::from_secs(60));

    let mut solver = VrpSolver::new(problem, config);
    let start_time = Instant::now();
    let outcome = solver.run_with(|_, report| {
        println!("  improved: {:.2}", report.raw_cost);
    })?;

    println!("Search completed in {}", format_duration(start_time.elapsed()));
    println!(
        "{} iterations, {} improvements, stopped by {:?}",
        outcome.iterations, outcome.improvements, outcome.stop_reason
    );
    print_solution(&outcome.best, &outcome.report);

    let schedule = Evaluator::new(&solver.problem, solver.config.penalty.clone())
        .schedule(&outcome.best);
    let output_path = "solution.json";
    println!("Saving solution to: {}", output_path);
    save_solution(
        &SolutionRecord::new(&outcome.best, &outcome.report, &schedule),
        output_path,
    )?;

    Ok(())
}
