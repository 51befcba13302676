//! Configuration parameters for the search engines.

use crate::error::{Result, VrpError};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How infeasible solutions are penalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PenaltyPolicy {
    /// `base_penalty * 2^streak`, where `streak` counts consecutive invalid solutions.
    Escalating,
    /// Weighted sum of lateness, overload and structural violations.
    WeightedSum,
}

/// Penalty settings used by the evaluator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PenaltyConfig {
    pub policy: PenaltyPolicy,
    /// Weight of one unit of lateness
    pub late_weight: f64,
    /// Weight of one unit of capacity overload
    pub capacity_weight: f64,
    /// Starting penalty of the escalating policy, or the cost of one structural
    /// violation under the weighted sum
    pub base_penalty: f64,
}

impl Default for PenaltyConfig {
    fn default() -> Self {
        PenaltyConfig {
            policy: PenaltyPolicy::Escalating,
            late_weight: 1.0,
            capacity_weight: 1.0,
            base_penalty: 1000.0,
        }
    }
}

impl PenaltyConfig {
    /// Set the penalty policy.
    pub fn with_policy(mut self, policy: PenaltyPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the lateness and overload weights.
    pub fn with_weights(mut self, late_weight: f64, capacity_weight: f64) -> Self {
        self.late_weight = late_weight;
        self.capacity_weight = capacity_weight;
        self
    }

    /// Set the base penalty.
    pub fn with_base_penalty(mut self, penalty: f64) -> Self {
        self.base_penalty = penalty;
        self
    }
}

/// Configuration of the greedy construction and tabu search pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Number of tabu search iterations
    pub max_iterations: usize,
    /// Number of iterations an edge stays tabu
    pub tabu_lifetime: usize,
    /// Number of tabu edges a move must touch to be blocked
    pub tabu_threshold: usize,
    /// Random sample size of the neighborhood, `None` for the full neighborhood
    pub neighborhood_size: Option<usize>,
    /// Optional time limit, checked between iterations
    pub time_limit: Option<Duration>,
    /// Seed for reproducible runs
    pub seed: Option<u64>,
    /// Start the tabu search from a fallback construction when no clean one exists
    pub accept_infeasible_start: bool,
    pub penalty: PenaltyConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            max_iterations: 100,
            tabu_lifetime: 10,
            tabu_threshold: 2,
            neighborhood_size: None,
            time_limit: None,
            seed: None,
            accept_infeasible_start: true,
            penalty: PenaltyConfig::default(),
        }
    }
}

impl Config {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Config::default()
    }

    /// Set the number of tabu search iterations.
    pub fn with_max_iterations(mut self, iterations: usize) -> Self {
        self.max_iterations = iterations;
        self
    }

    /// Set the tabu lifetime of an edge.
    pub fn with_tabu_lifetime(mut self, lifetime: usize) -> Self {
        self.tabu_lifetime = lifetime;
        self
    }

    /// Set how many tabu edges block a move.
    pub fn with_tabu_threshold(mut self, threshold: usize) -> Self {
        self.tabu_threshold = threshold;
        self
    }

    /// Sample at most `size` neighbors per iteration.
    pub fn with_neighborhood_size(mut self, size: usize) -> Self {
        self.neighborhood_size = Some(size);
        self
    }

    /// Set the time limit.
    pub fn with_time_limit(mut self, duration: Duration) -> Self {
        self.time_limit = Some(duration);
        self
    }

    /// Set the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Allow or refuse starting from a construction that needed fallback moves.
    pub fn with_accept_infeasible_start(mut self, accept: bool) -> Self {
        self.accept_infeasible_start = accept;
        self
    }

    /// Set the penalty configuration.
    pub fn with_penalty(mut self, penalty: PenaltyConfig) -> Self {
        self.penalty = penalty;
        self
    }

    /// Check the parameters for values the search cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.tabu_lifetime == 0 {
            return Err(VrpError::InvalidParameter(
                "tabu lifetime must be positive".to_string(),
            ));
        }
        if self.tabu_threshold == 0 {
            return Err(VrpError::InvalidParameter(
                "tabu threshold must be positive".to_string(),
            ));
        }
        if self.neighborhood_size == Some(0) {
            return Err(VrpError::InvalidParameter(
                "neighborhood sample size must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Where each ant starts its tour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StartNode {
    Random,
    Fixed(usize),
}

/// Configuration of the ant colony search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AntColonyConfig {
    /// Maximum number of iterations
    pub iterations: usize,
    /// Number of ants per iteration
    pub ants: usize,
    /// Exponent of the pheromone term
    pub alpha: f64,
    /// Exponent of the inverse distance term
    pub beta: f64,
    /// Fraction of pheromone evaporating each iteration, in `[0, 1)`
    pub evaporation_rate: f64,
    /// Pheromone added to each edge of the iteration best tour
    pub pheromone_increase: f64,
    /// Pheromone on every edge before the first iteration
    pub initial_pheromone: f64,
    /// Probability of picking the best scored successor instead of sampling
    pub prob_of_choose_best: f64,
    /// Stop once the best score repeats for more than this many iterations
    pub stagnation_limit: Option<usize>,
    pub start: StartNode,
    pub time_limit: Option<Duration>,
    pub seed: Option<u64>,
}

impl Default for AntColonyConfig {
    fn default() -> Self {
        AntColonyConfig {
            iterations: 100,
            ants: 10,
            alpha: 1.0,
            beta: 2.0,
            evaporation_rate: 0.1,
            pheromone_increase: 2.0,
            initial_pheromone: 1.0,
            prob_of_choose_best: 0.1,
            stagnation_limit: Some(10),
            start: StartNode::Random,
            time_limit: None,
            seed: None,
        }
    }
}

impl AntColonyConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        AntColonyConfig::default()
    }

    /// Set the maximum number of iterations.
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Set the number of ants per iteration.
    pub fn with_ants(mut self, ants: usize) -> Self {
        self.ants = ants;
        self
    }

    /// Set the pheromone and distance exponents.
    pub fn with_exponents(mut self, alpha: f64, beta: f64) -> Self {
        self.alpha = alpha;
        self.beta = beta;
        self
    }

    /// Set the fraction of pheromone evaporating each iteration.
    pub fn with_evaporation_rate(mut self, rate: f64) -> Self {
        self.evaporation_rate = rate;
        self
    }

    /// Set the pheromone added along the iteration best tour.
    pub fn with_pheromone_increase(mut self, increase: f64) -> Self {
        self.pheromone_increase = increase;
        self
    }

    /// Set the pheromone on every edge before the first iteration.
    pub fn with_initial_pheromone(mut self, pheromone: f64) -> Self {
        self.initial_pheromone = pheromone;
        self
    }

    /// Set the probability of taking the best scored successor.
    pub fn with_prob_of_choose_best(mut self, probability: f64) -> Self {
        self.prob_of_choose_best = probability;
        self
    }

    /// Set the stagnation limit, `None` to always run every iteration.
    pub fn with_stagnation_limit(mut self, limit: Option<usize>) -> Self {
        self.stagnation_limit = limit;
        self
    }

    /// Set where each ant starts its tour.
    pub fn with_start(mut self, start: StartNode) -> Self {
        self.start = start;
        self
    }

    /// Set the time limit.
    pub fn with_time_limit(mut self, duration: Duration) -> Self {
        self.time_limit = Some(duration);
        self
    }

    /// Set the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Check the parameters for values the search cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.ants == 0 {
            return Err(VrpError::InvalidParameter(
                "at least one ant is required".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&self.evaporation_rate) {
            return Err(VrpError::InvalidParameter(format!(
                "evaporation rate {} is outside [0, 1)",
                self.evaporation_rate
            )));
        }
        if !(0.0..=1.0).contains(&self.prob_of_choose_best) {
            return Err(VrpError::InvalidParameter(format!(
                "probability {} is outside [0, 1]",
                self.prob_of_choose_best
            )));
        }
        if self.pheromone_increase < 0.0 || self.initial_pheromone < 0.0 {
            return Err(VrpError::InvalidParameter(
                "pheromone amounts must not be negative".to_string(),
            ));
        }
        if self.alpha < 0.0 || self.beta < 0.0 {
            return Err(VrpError::InvalidParameter(
                "exponents must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}

/// Build the random generator for an optional seed.
pub fn make_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    }
}
