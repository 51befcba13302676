//! Ant colony search for closed tours.
//!
//! Each ant builds a tour by repeatedly choosing an unvisited successor with
//! probability proportional to `pheromone^alpha * (1 / distance)^beta`, or by
//! taking the best scored successor outright. After all ants of an iteration
//! have finished, the trails evaporate and the edges of the iteration's best
//! tour are reinforced.

use crate::config::{make_rng, AntColonyConfig, StartNode};
use crate::distance::DistanceMatrix;
use crate::error::{Result, VrpError};
use crate::problem::DEPOT;
use crate::solution::{Route, Solution};
use crate::StopReason;
use log::{debug, info};
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use std::time::Instant;

/// Symmetric pheromone intensities between nodes.
#[derive(Debug, Clone)]
pub struct PheromoneMatrix {
    data: Vec<f64>,
    size: usize,
}

impl PheromoneMatrix {
    /// Create a matrix with `initial` on every edge and nothing on the diagonal.
    pub fn new(size: usize, initial: f64) -> Self {
        let mut data = vec![initial; size * size];
        for i in 0..size {
            data[i * size + i] = 0.0;
        }
        PheromoneMatrix { data, size }
    }

    /// Pheromone on the edge from `from` to `to`.
    pub fn get(&self, from: usize, to: usize) -> f64 {
        self.data[from * self.size + to]
    }

    /// Number of nodes covered by the matrix.
    pub fn size(&self) -> usize {
        self.size
    }

    /// All intensities, row by row.
    pub fn values(&self) -> &[f64] {
        &self.data
    }

    /// Scale every trail by `1 - rate`.
    pub fn evaporate(&mut self, rate: f64) {
        let factor = 1.0 - rate;
        for value in self.data.iter_mut() {
            *value *= factor;
        }
    }

    /// Add `amount` to both directions of every edge along `tour`.
    pub fn reinforce(&mut self, tour: &[usize], amount: f64) {
        for pair in tour.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if a == b {
                continue;
            }
            self.data[a * self.size + b] += amount;
            self.data[b * self.size + a] += amount;
        }
    }
}

/// One ant's partial tour.
#[derive(Debug, Clone)]
pub struct AntWalk {
    path: Vec<usize>,
    visited: Vec<bool>,
}

impl AntWalk {
    /// Start a walk at `start` over `size` nodes.
    pub fn new(start: usize, size: usize) -> Self {
        let mut visited = vec![false; size];
        visited[start] = true;
        AntWalk {
            path: vec![start],
            visited,
        }
    }

    /// The node the ant currently stands on.
    pub fn current(&self) -> usize {
        self.path[self.path.len() - 1]
    }

    /// Check if the ant has already visited `node`.
    pub fn is_visited(&self, node: usize) -> bool {
        self.visited[node]
    }

    /// Move the ant to `node`.
    pub fn visit(&mut self, node: usize) {
        self.visited[node] = true;
        self.path.push(node);
    }

    /// Check if every node has been visited.
    pub fn is_complete(&self) -> bool {
        self.path.len() == self.visited.len()
    }

    /// Close the walk back to its first node.
    pub fn into_tour(mut self) -> Vec<usize> {
        let start = self.path[0];
        self.path.push(start);
        self.path
    }
}

/// Result of an ant colony run.
#[derive(Debug, Clone)]
pub struct AntOutcome {
    /// Best closed tour, first node repeated at the end. Empty if no iteration ran.
    pub best_tour: Vec<usize>,
    pub best_length: f64,
    pub iterations: usize,
    /// Best tour length of each iteration
    pub history: Vec<f64>,
    pub stop_reason: StopReason,
}

impl AntOutcome {
    /// Turn the best tour into a single route starting at the depot.
    pub fn to_solution(&self) -> Solution {
        if self.best_tour.len() < 2 {
            return Solution::new(Vec::new());
        }

        let open = &self.best_tour[..self.best_tour.len() - 1];
        let route = match open.iter().position(|&node| node == DEPOT) {
            Some(p) => {
                let mut nodes: Vec<usize> = open[p..].iter().chain(&open[..p]).copied().collect();
                nodes.push(DEPOT);
                Route::from_nodes(nodes)
            }
            None => Route::new(open),
        };

        Solution::new(vec![route])
    }
}

/// Ant colony engine owning the pheromone trails for the length of a run.
pub struct AntColony<'a> {
    distances: &'a DistanceMatrix,
    config: AntColonyConfig,
    pheromones: PheromoneMatrix,
    rng: ChaCha8Rng,
}

impl<'a> AntColony<'a> {
    /// Create a colony over the nodes of `distances`.
    pub fn new(distances: &'a DistanceMatrix, config: AntColonyConfig) -> Result<Self> {
        config.validate()?;
        if let StartNode::Fixed(start) = config.start {
            if start >= distances.size() {
                return Err(VrpError::InvalidParameter(format!(
                    "start node {} is outside the {} nodes",
                    start,
                    distances.size()
                )));
            }
        }

        Ok(AntColony {
            distances,
            pheromones: PheromoneMatrix::new(distances.size(), config.initial_pheromone),
            rng: make_rng(config.seed),
            config,
        })
    }

    /// Current pheromone trails.
    pub fn pheromones(&self) -> &PheromoneMatrix {
        &self.pheromones
    }

    /// Run the colony until the iteration budget, the time limit or stagnation.
    pub fn run(&mut self) -> AntOutcome {
        let start_time = Instant::now();
        let mut best_tour = Vec::new();
        let mut best_length = f64::INFINITY;
        let mut history = Vec::new();
        let mut equal_iterations = 0;
        let mut stop_reason = StopReason::IterationBudget;

        for iteration in 0..self.config.iterations {
            if let Some(limit) = self.config.time_limit {
                if start_time.elapsed() >= limit {
                    stop_reason = StopReason::TimeLimit;
                    break;
                }
            }

            // Ants only read the trails; they are updated once all tours exist.
            let tours: Vec<Vec<usize>> = (0..self.config.ants)
                .map(|_| {
                    let start = self.start_node();
                    self.construct(start)
                })
                .collect();

            let mut iteration_best = 0;
            let mut iteration_length = f64::INFINITY;
            for (i, tour) in tours.iter().enumerate() {
                let length = self.distances.path_length(tour);
                if length < iteration_length {
                    iteration_length = length;
                    iteration_best = i;
                }
            }

            if iteration_length == best_length {
                equal_iterations += 1;
            } else {
                equal_iterations = 0;
            }

            if iteration_length < best_length {
                best_length = iteration_length;
                best_tour = tours[iteration_best].clone();
                info!("Iteration {}: new best tour length {:.2}", iteration, best_length);
            }

            self.pheromones.evaporate(self.config.evaporation_rate);
            self.pheromones
                .reinforce(&tours[iteration_best], self.config.pheromone_increase);
            history.push(iteration_length);

            if let Some(limit) = self.config.stagnation_limit {
                if equal_iterations > limit {
                    debug!(
                        "Best length repeated for {} iterations, stopping",
                        equal_iterations
                    );
                    stop_reason = StopReason::Stagnation;
                    break;
                }
            }
        }

        AntOutcome {
            best_tour,
            best_length,
            iterations: history.len(),
            history,
            stop_reason,
        }
    }

    /// Build one closed tour starting at `start`.
    pub fn construct(&mut self, start: usize) -> Vec<usize> {
        let mut walk = AntWalk::new(start, self.distances.size());
        while !walk.is_complete() {
            let next = self.choose_next(&walk);
            walk.visit(next);
        }
        walk.into_tour()
    }

    fn start_node(&mut self) -> usize {
        match self.config.start {
            StartNode::Fixed(node) => node,
            StartNode::Random => self.rng.gen_range(0..self.distances.size()),
        }
    }

    /// Attractiveness of moving from `from` to `to`.
    fn score(&self, from: usize, to: usize) -> f64 {
        let score = self.pheromones.get(from, to).powf(self.config.alpha)
            * self.distances.inverse(from, to).powf(self.config.beta);
        if score.is_finite() {
            score
        } else {
            f64::MAX
        }
    }

    fn choose_next(&mut self, walk: &AntWalk) -> usize {
        let from = walk.current();
        let candidates: Vec<usize> = (0..self.distances.size())
            .filter(|&node| !walk.is_visited(node))
            .collect();
        let scores: Vec<f64> = candidates.iter().map(|&to| self.score(from, to)).collect();

        let mut best = 0;
        for (i, &score) in scores.iter().enumerate() {
            if score > scores[best] {
                best = i;
            }
        }

        if self.rng.gen::<f64>() < self.config.prob_of_choose_best {
            return candidates[best];
        }

        // Degenerate weights cannot be sampled; fall back to the best score.
        let total: f64 = scores.iter().sum();
        if !total.is_finite() || total <= 0.0 {
            return candidates[best];
        }

        match WeightedIndex::new(&scores) {
            Ok(distribution) => candidates[distribution.sample(&mut self.rng)],
            Err(_) => candidates[best],
        }
    }
}
