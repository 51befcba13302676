use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};
use env_logger::Env;
use log::info;

use vrp_heuristics::ant_colony::AntColony;
use vrp_heuristics::config::{AntColonyConfig, Config, PenaltyConfig, PenaltyPolicy, StartNode};
use vrp_heuristics::error::Result;
use vrp_heuristics::evaluator::Evaluator;
use vrp_heuristics::problem::Problem;
use vrp_heuristics::two_opt::TwoOpt;
use vrp_heuristics::utils::{format_duration, print_solution, save_solution, SolutionRecord};
use vrp_heuristics::VrpSolver;

#[derive(Parser)]
#[command(version, about = "Heuristic solvers for the VRP with time windows")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Greedy construction followed by tabu search
    Tabu {
        instance: PathBuf,
        #[arg(long, default_value_t = 100)]
        iterations: usize,
        #[arg(long, default_value_t = 10)]
        lifetime: usize,
        /// Random sample size of each neighborhood
        #[arg(long)]
        sample: Option<usize>,
        /// Use a weighted-sum penalty instead of the escalating one
        #[arg(long)]
        weighted: bool,
        #[arg(long)]
        time_limit: Option<u64>,
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Ant colony search for a single tour over all nodes
    Ants {
        instance: PathBuf,
        #[arg(long, default_value_t = 100)]
        iterations: usize,
        #[arg(long, default_value_t = 10)]
        ants: usize,
        #[arg(long, default_value_t = 1.0)]
        alpha: f64,
        #[arg(long, default_value_t = 2.0)]
        beta: f64,
        #[arg(long, default_value_t = 0.1)]
        evaporation: f64,
        #[arg(long, default_value_t = 0.1)]
        prob_best: f64,
        /// Start every ant at this node instead of a random one
        #[arg(long)]
        start: Option<usize>,
        /// Polish the best tour with 2-opt
        #[arg(long)]
        two_opt: bool,
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    let start_time = Instant::now();

    match cli.command {
        Command::Tabu {
            instance,
            iterations,
            lifetime,
            sample,
            weighted,
            time_limit,
            seed,
            output,
        } => {
            let problem = Problem::from_file(&instance)?;
            info!(
                "Loaded {} customers, {} trucks of capacity {}",
                problem.customer_count(),
                problem.fleet_size,
                problem.vehicle_capacity
            );

            let policy = if weighted {
                PenaltyPolicy::WeightedSum
            } else {
                PenaltyPolicy::Escalating
            };
            let mut config = Config::new()
                .with_max_iterations(iterations)
                .with_tabu_lifetime(lifetime)
                .with_penalty(PenaltyConfig::default().with_policy(policy));
            if let Some(size) = sample {
                config = config.with_neighborhood_size(size);
            }
            if let Some(secs) = time_limit {
                config = config.with_time_limit(Duration::from_secs(secs));
            }
            if let Some(seed) = seed {
                config = config.with_seed(seed);
            }

            let mut solver = VrpSolver::new(problem, config);
            let outcome = solver.run()?;
            let schedule = Evaluator::new(&solver.problem, solver.config.penalty.clone())
                .schedule(&outcome.best);

            print_solution(&outcome.best, &outcome.report);
            if let Some(path) = output {
                save_solution(
                    &SolutionRecord::new(&outcome.best, &outcome.report, &schedule),
                    path,
                )?;
            }
        }
        Command::Ants {
            instance,
            iterations,
            ants,
            alpha,
            beta,
            evaporation,
            prob_best,
            start,
            two_opt,
            seed,
            output,
        } => {
            let problem = Problem::from_file(&instance)?;
            let mut config = AntColonyConfig::new()
                .with_iterations(iterations)
                .with_ants(ants)
                .with_exponents(alpha, beta)
                .with_evaporation_rate(evaporation)
                .with_prob_of_choose_best(prob_best);
            if let Some(node) = start {
                config = config.with_start(StartNode::Fixed(node));
            }
            if let Some(seed) = seed {
                config = config.with_seed(seed);
            }

            let mut colony = AntColony::new(&problem.distances, config)?;
            let mut outcome = colony.run();
            info!(
                "Ant colony stopped after {} iterations ({:?}), best length {:.2}",
                outcome.iterations, outcome.stop_reason, outcome.best_length
            );

            if two_opt {
                outcome.best_length =
                    TwoOpt::new(&problem.distances).optimize(&mut outcome.best_tour);
                info!("After 2-opt: {:.2}", outcome.best_length);
            }

            let solution = outcome.to_solution();
            let evaluator = Evaluator::new(&problem, PenaltyConfig::default());
            let report = evaluator.evaluate(&solution);
            let schedule = evaluator.schedule(&solution);

            print_solution(&solution, &report);
            if let Some(path) = output {
                save_solution(&SolutionRecord::new(&solution, &report, &schedule), path)?;
            }
        }
    }

    println!("Finished in {}", format_duration(start_time.elapsed()));
    Ok(())
}
