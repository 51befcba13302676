//! # VRP heuristics
//!
//! Approximate solvers for the capacitated vehicle routing problem with time
//! windows and for the travelling salesman problem.
//!
//! A greedy multi-start builder produces an initial solution, which a tabu
//! search over customer relocation moves then improves under an escalating
//! infeasibility penalty. An ant colony search builds single tours from
//! pheromone trails and can be finished with 2-opt.

pub mod ant_colony;
pub mod config;
pub mod distance;
pub mod error;
pub mod evaluator;
pub mod greedy;
pub mod problem;
pub mod solution;
pub mod tabu;
pub mod two_opt;
pub mod utils;

use crate::config::Config;
use crate::error::{Result, VrpError};
use crate::evaluator::FitnessReport;
use crate::greedy::{Construction, GreedyBuilder};
use crate::problem::Problem;
use crate::solution::Solution;
use crate::tabu::{TabuOutcome, TabuSearch};

use log::{info, warn};
use std::time::{Duration, Instant};

/// Why a search stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    IterationBudget,
    TimeLimit,
    EmptyNeighborhood,
    Stagnation,
}

/// Greedy construction followed by tabu search.
pub struct VrpSolver {
    pub problem: Problem,
    pub config: Config,
    pub construction: Option<Construction>,
    pub run_time: Duration,
}

impl VrpSolver {
    /// Create a solver for the given problem and configuration.
    pub fn new(problem: Problem, config: Config) -> Self {
        VrpSolver {
            problem,
            config,
            construction: None,
            run_time: Duration::from_secs(0),
        }
    }

    /// Build the initial solution.
    ///
    /// A construction that needed fallback moves is accepted only when the
    /// configuration allows starting from it.
    pub fn construct(&mut self) -> Result<&Construction> {
        let construction = match GreedyBuilder::new(&self.problem).build() {
            Ok(construction) => construction,
            Err(VrpError::ConstructionExhausted { best }) if self.config.accept_infeasible_start => {
                warn!(
                    "No clean construction found, starting from one with {} fallback moves",
                    best.invalid_moves
                );
                *best
            }
            Err(err) => return Err(err),
        };

        Ok(self.construction.insert(construction))
    }

    /// Run the full pipeline and return the best solution found.
    pub fn run(&mut self) -> Result<TabuOutcome> {
        self.run_with(|_, _| {})
    }

    /// Run the full pipeline, reporting every new best feasible solution.
    pub fn run_with<F>(&mut self, on_improvement: F) -> Result<TabuOutcome>
    where
        F: FnMut(&Solution, &FitnessReport),
    {
        let start_time = Instant::now();
        self.config.validate()?;

        let initial = self.construct()?.solution.clone();
        let mut search = TabuSearch::new(&self.problem, self.config.clone())?;
        let outcome = search.run_with(initial, on_improvement);

        self.run_time = start_time.elapsed();
        info!(
            "Best cost {:.2} (valid: {}) after {} iterations",
            outcome.report.raw_cost,
            outcome.report.is_valid(),
            outcome.iterations
        );

        Ok(outcome)
    }
}
