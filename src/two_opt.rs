//! Nearest-neighbor tours and 2-opt improvement for a single closed tour.

use crate::distance::DistanceMatrix;
use log::debug;

/// Improvement needed for a 2-opt move to count.
const IMPROVEMENT_EPSILON: f64 = 1e-9;

/// Build a closed tour from `start`, always moving to the nearest unvisited node.
pub fn nearest_neighbor_tour(distances: &DistanceMatrix, start: usize) -> Vec<usize> {
    let n = distances.size();
    let mut visited = vec![false; n];
    let mut tour = Vec::with_capacity(n + 1);
    let mut current = start;
    visited[start] = true;
    tour.push(start);

    while tour.len() < n {
        let mut next = None;
        let mut min_distance = f64::INFINITY;

        for candidate in 0..n {
            if !visited[candidate] && distances.get(current, candidate) < min_distance {
                min_distance = distances.get(current, candidate);
                next = Some(candidate);
            }
        }

        match next {
            Some(node) => {
                visited[node] = true;
                tour.push(node);
                current = node;
            }
            None => break,
        }
    }

    tour.push(start);
    tour
}

/// 2-opt local search on a closed tour (first node repeated at the end).
pub struct TwoOpt<'a> {
    distances: &'a DistanceMatrix,
    /// Apply the first improving move instead of the best one
    pub first_improvement: bool,
}

impl<'a> TwoOpt<'a> {
    /// Create a steepest-descent 2-opt over `distances`.
    pub fn new(distances: &'a DistanceMatrix) -> Self {
        TwoOpt {
            distances,
            first_improvement: false,
        }
    }

    /// Apply the first improving move instead of the best one.
    pub fn with_first_improvement(mut self, first: bool) -> Self {
        self.first_improvement = first;
        self
    }

    /// Change in length from reversing `tour[i + 1..=j]`.
    fn delta(&self, tour: &[usize], i: usize, j: usize) -> f64 {
        let d = |a: usize, b: usize| self.distances.get(tour[a], tour[b]);
        d(i, j) + d(i + 1, j + 1) - d(i, i + 1) - d(j, j + 1)
    }

    /// Apply one improving move. Returns `false` at a local optimum.
    pub fn improve(&self, tour: &mut [usize]) -> bool {
        if tour.len() < 5 {
            return false;
        }

        let last = tour.len() - 1;
        let mut best: Option<(usize, usize, f64)> = None;

        for i in 0..last - 2 {
            for j in (i + 2)..last {
                let delta = self.delta(tour, i, j);
                if delta >= -IMPROVEMENT_EPSILON {
                    continue;
                }
                if self.first_improvement {
                    tour[i + 1..=j].reverse();
                    return true;
                }
                if best.map_or(true, |(_, _, best_delta)| delta < best_delta) {
                    best = Some((i, j, delta));
                }
            }
        }

        match best {
            Some((i, j, _)) => {
                tour[i + 1..=j].reverse();
                true
            }
            None => false,
        }
    }

    /// Improve until no move helps. Returns the final tour length.
    pub fn optimize(&self, tour: &mut [usize]) -> f64 {
        let mut moves = 0;
        while self.improve(tour) {
            moves += 1;
        }
        let length = self.distances.path_length(tour);
        debug!("2-opt applied {} moves, tour length {:.2}", moves, length);
        length
    }
}
