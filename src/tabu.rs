//! Tabu search over single-customer relocation moves.
//!
//! The neighborhood of a solution is built on its depot-delimited sequence:
//! every customer is removed and reinserted into every other gap, and the
//! sequence is split back into routes at the depot markers. A move is blocked
//! while enough of the edges it touches are held in the tabu memory.

use crate::config::{make_rng, Config};
use crate::error::{Result, VrpError};
use crate::evaluator::{Evaluator, FitnessReport};
use crate::problem::{Problem, DEPOT};
use crate::solution::{Edge, Move, Solution};
use crate::StopReason;
use log::{debug, info, trace, warn};
use rand::seq::index;
use rand_chacha::ChaCha8Rng;
use std::collections::HashSet;
use std::time::Instant;

/// An edge that stays forbidden for `remaining` more iterations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TabuEntry {
    pub edge: Edge,
    pub remaining: usize,
}

/// Short-term memory of recently touched edges.
#[derive(Debug, Clone)]
pub struct TabuMemory {
    entries: Vec<TabuEntry>,
    lifetime: usize,
}

impl TabuMemory {
    /// Create an empty memory whose entries live for `lifetime` iterations.
    ///
    /// A memory with a zero lifetime never holds an edge.
    pub fn new(lifetime: usize) -> Self {
        TabuMemory {
            entries: Vec::new(),
            lifetime,
        }
    }

    /// Current entries, in insertion order.
    pub fn entries(&self) -> &[TabuEntry] {
        &self.entries
    }

    /// Number of tabu edges.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no edge is tabu.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterations a newly inserted edge stays tabu.
    pub fn lifetime(&self) -> usize {
        self.lifetime
    }

    /// Check if an edge is currently tabu.
    pub fn contains(&self, edge: &Edge) -> bool {
        self.entries.iter().any(|entry| entry.edge == *edge)
    }

    /// Check if at least `threshold` edges touched by the move are tabu.
    pub fn blocks(&self, candidate: &Move, threshold: usize) -> bool {
        candidate
            .touched_edges()
            .filter(|edge| self.contains(edge))
            .count()
            >= threshold
    }

    /// Decrement every lifetime and drop the entries that expire.
    pub fn age(&mut self) {
        for entry in self.entries.iter_mut() {
            entry.remaining = entry.remaining.saturating_sub(1);
        }
        self.entries.retain(|entry| entry.remaining > 0);
    }

    /// Make the edges tabu for a full lifetime, refreshing those already held.
    pub fn insert<I>(&mut self, edges: I)
    where
        I: IntoIterator<Item = Edge>,
    {
        if self.lifetime == 0 {
            return;
        }
        for edge in edges {
            match self.entries.iter_mut().find(|entry| entry.edge == edge) {
                Some(entry) => entry.remaining = self.lifetime,
                None => self.entries.push(TabuEntry {
                    edge,
                    remaining: self.lifetime,
                }),
            }
        }
    }
}

/// Every distinct solution reachable by moving one customer to another gap of
/// the depot-delimited `sequence`.
///
/// Candidates equal to the input or to an earlier candidate are skipped.
pub fn move_customer(sequence: &[usize]) -> Vec<Move> {
    let mut neighborhood = Vec::new();
    let mut seen: HashSet<Vec<usize>> = HashSet::new();
    seen.insert(sequence.to_vec());

    if sequence.len() < 3 {
        return neighborhood;
    }

    for position in 1..sequence.len() - 1 {
        let customer = sequence[position];
        if customer == DEPOT {
            continue;
        }

        let prev = sequence[position - 1];
        let next = sequence[position + 1];
        let mut rest = sequence.to_vec();
        rest.remove(position);

        for gap in 1..rest.len() {
            if gap == position {
                continue;
            }

            let (a, b) = (rest[gap - 1], rest[gap]);
            let mut candidate = rest.clone();
            candidate.insert(gap, customer);

            if !seen.insert(candidate.clone()) {
                continue;
            }

            let (deleted, added) = net_edges(
                [
                    Edge::new(prev, customer),
                    Edge::new(customer, next),
                    Edge::new(a, b),
                ],
                [
                    Edge::new(prev, next),
                    Edge::new(a, customer),
                    Edge::new(customer, b),
                ],
            );

            neighborhood.push(Move {
                solution: Solution::from_sequence(&candidate),
                sequence: candidate,
                deleted,
                added,
            });
        }
    }

    neighborhood
}

/// Drop loops and edges that are both removed and re-added.
fn net_edges(deleted: [Edge; 3], added: [Edge; 3]) -> (Vec<Edge>, Vec<Edge>) {
    let keep = |edges: &[Edge; 3], other: &[Edge; 3]| {
        let mut kept: Vec<Edge> = edges
            .iter()
            .filter(|edge| !edge.is_loop() && !other.contains(edge))
            .copied()
            .collect();
        kept.sort_unstable();
        kept.dedup();
        kept
    };

    (keep(&deleted, &added), keep(&added, &deleted))
}

/// Result of a tabu search run.
#[derive(Debug, Clone)]
pub struct TabuOutcome {
    /// Best feasible solution, or the least violating one if none was feasible
    pub best: Solution,
    pub report: FitnessReport,
    pub iterations: usize,
    pub improvements: usize,
    pub stop_reason: StopReason,
}

/// Tabu search driver owning the tabu memory and the penalty state.
pub struct TabuSearch<'a> {
    config: Config,
    evaluator: Evaluator<'a>,
    memory: TabuMemory,
    rng: ChaCha8Rng,
}

impl<'a> TabuSearch<'a> {
    /// Create a new search over `problem`.
    pub fn new(problem: &'a Problem, config: Config) -> Result<Self> {
        config.validate()?;

        Ok(TabuSearch {
            evaluator: Evaluator::new(problem, config.penalty.clone()),
            memory: TabuMemory::new(config.tabu_lifetime),
            rng: make_rng(config.seed),
            config,
        })
    }

    /// Current tabu memory.
    pub fn memory(&self) -> &TabuMemory {
        &self.memory
    }

    /// Evaluator holding the penalty escalation state.
    pub fn evaluator(&self) -> &Evaluator<'a> {
        &self.evaluator
    }

    /// Run the search from `initial` until the iteration budget is spent.
    pub fn run(&mut self, initial: Solution) -> TabuOutcome {
        self.run_with(initial, |_, _| {})
    }

    /// Run the search, calling `on_improvement` every time a better feasible
    /// solution is found.
    pub fn run_with<F>(&mut self, initial: Solution, mut on_improvement: F) -> TabuOutcome
    where
        F: FnMut(&Solution, &FitnessReport),
    {
        let start_time = Instant::now();
        let initial_report = self.evaluator.evaluate(&initial);
        self.evaluator.observe(&initial_report);

        let mut best_feasible: Option<(Solution, FitnessReport)> = None;
        if initial_report.is_valid() {
            best_feasible = Some((initial.clone(), initial_report.clone()));
        }
        let mut least_violating = (initial.clone(), initial_report);

        let mut current = initial;
        let mut iterations = 0;
        let mut improvements = 0;
        let mut stop_reason = StopReason::IterationBudget;

        while iterations < self.config.max_iterations {
            if let Some(limit) = self.config.time_limit {
                if start_time.elapsed() >= limit {
                    stop_reason = StopReason::TimeLimit;
                    break;
                }
            }

            let chosen = match self.step(&current) {
                Ok(chosen) => chosen,
                Err(err) => {
                    warn!("Stopping tabu search after {} iterations: {}", iterations, err);
                    stop_reason = StopReason::EmptyNeighborhood;
                    break;
                }
            };
            iterations += 1;

            let Some((chosen, report)) = chosen else {
                continue;
            };

            if report.is_valid() {
                let improves = best_feasible
                    .as_ref()
                    .map_or(true, |(_, best)| report.fitness() < best.fitness());
                if improves {
                    info!(
                        "Iteration {}: new best cost {:.2}",
                        iterations, report.raw_cost
                    );
                    on_improvement(&chosen.solution, &report);
                    best_feasible = Some((chosen.solution.clone(), report));
                    improvements += 1;
                }
            } else if best_feasible.is_none()
                && violation_rank(&report) < violation_rank(&least_violating.1)
            {
                least_violating = (chosen.solution.clone(), report);
            }

            current = chosen.solution;
        }

        let (best, report) = best_feasible.unwrap_or(least_violating);

        debug!(
            "Tabu search finished after {} iterations ({:?})",
            iterations, stop_reason
        );

        TabuOutcome {
            best,
            report,
            iterations,
            improvements,
            stop_reason,
        }
    }

    /// Perform one outer iteration from `current`.
    ///
    /// Returns the chosen move and its report, or `None` when every neighbor was
    /// tabu. The memory is aged in both cases.
    pub fn step(&mut self, current: &Solution) -> Result<Option<(Move, FitnessReport)>> {
        let mut neighborhood = move_customer(&current.to_sequence());
        if neighborhood.is_empty() {
            return Err(VrpError::EmptyNeighborhood);
        }

        if let Some(cap) = self.config.neighborhood_size {
            if cap < neighborhood.len() {
                let mut keep = vec![false; neighborhood.len()];
                for i in index::sample(&mut self.rng, neighborhood.len(), cap).iter() {
                    keep[i] = true;
                }
                neighborhood = neighborhood
                    .into_iter()
                    .zip(keep)
                    .filter_map(|(candidate, kept)| kept.then_some(candidate))
                    .collect();
            }
        }

        let mut chosen: Option<(Move, FitnessReport)> = None;
        let mut blocked = 0;

        for candidate in neighborhood {
            if self.memory.blocks(&candidate, self.config.tabu_threshold) {
                blocked += 1;
                continue;
            }

            let report = self.evaluator.evaluate(&candidate.solution);
            let better = chosen
                .as_ref()
                .map_or(true, |(_, best)| report.fitness() < best.fitness());
            if better {
                chosen = Some((candidate, report));
            }
        }

        trace!("{} tabu-blocked candidates", blocked);

        self.memory.age();
        if let Some((candidate, report)) = &chosen {
            self.evaluator.observe(report);
            self.memory
                .insert(candidate.touched_edges().copied().collect::<Vec<_>>());
        } else {
            debug!("Every candidate is tabu");
        }

        Ok(chosen)
    }
}

/// Ordering of infeasible solutions: fewer violations first, then cheaper.
fn violation_rank(report: &FitnessReport) -> (usize, f64, f64) {
    (
        report.violations.len(),
        report.lateness + report.capacity_overload as f64,
        report.raw_cost,
    )
}
