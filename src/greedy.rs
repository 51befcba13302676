//! Greedy multi-start construction of an initial solution.

use crate::error::{Result, VrpError};
use crate::problem::{Problem, DEPOT};
use crate::solution::{Route, Solution};
use log::{debug, info};

/// A constructed solution together with how it was obtained.
#[derive(Debug, Clone)]
pub struct Construction {
    pub solution: Solution,
    /// Number of trucks the construction was run with
    pub trucks: usize,
    /// Travel plus service cost of all routes
    pub cost: f64,
    /// Customers assigned without a feasible continuation
    pub invalid_moves: usize,
}

/// State of one truck while its route is being built.
#[derive(Debug, Clone)]
struct Truck {
    path: Vec<usize>,
    time: f64,
    load: u64,
    cost: f64,
    invalid_moves: usize,
}

impl Truck {
    fn new() -> Self {
        Truck {
            path: vec![DEPOT],
            time: 0.0,
            load: 0,
            cost: 0.0,
            invalid_moves: 0,
        }
    }

    fn last(&self) -> usize {
        *self.path.last().unwrap_or(&DEPOT)
    }

    /// Drive to `customer`, wait for its window and serve it.
    fn visit(&mut self, customer: usize, problem: &Problem) {
        let node = &problem.customers[customer];
        let travel = problem.distance(self.last(), customer);
        self.time = (self.time + travel).max(node.time_open) + node.service_time;
        self.load += u64::from(node.demand);
        self.cost += travel + node.service_time;
        self.path.push(customer);
    }

    /// Drive back to the depot and close the route.
    fn close(&mut self, problem: &Problem) {
        let depot = problem.depot();
        let travel = problem.distance(self.last(), DEPOT);
        self.time = (self.time + travel).max(depot.time_open) + depot.service_time;
        self.cost += travel + depot.service_time;
        self.path.push(DEPOT);
    }
}

/// Builds solutions truck by truck with a nearest-feasible-customer rule.
pub struct GreedyBuilder<'a> {
    problem: &'a Problem,
}

impl<'a> GreedyBuilder<'a> {
    /// Create a builder for `problem`.
    pub fn new(problem: &'a Problem) -> Self {
        GreedyBuilder { problem }
    }

    /// Build a candidate for every truck count and return the cheapest one that
    /// never needed a fallback move.
    ///
    /// When every candidate used a fallback, the cheapest of them is returned
    /// inside [`VrpError::ConstructionExhausted`].
    pub fn build(&self) -> Result<Construction> {
        let mut best_valid: Option<Construction> = None;
        let mut best_fallback: Option<Construction> = None;

        for trucks in 1..=self.problem.fleet_size {
            let candidate = self.build_with(trucks);
            debug!(
                "Greedy construction with {} trucks: cost {:.2}, {} fallback moves",
                trucks, candidate.cost, candidate.invalid_moves
            );

            let slot = if candidate.invalid_moves == 0 {
                &mut best_valid
            } else {
                &mut best_fallback
            };
            if is_better(&candidate, slot.as_ref()) {
                *slot = Some(candidate);
            }
        }

        match (best_valid, best_fallback) {
            (Some(best), _) => {
                info!(
                    "Initial solution uses {} trucks with cost {:.2}",
                    best.trucks, best.cost
                );
                Ok(best)
            }
            (None, Some(best)) => Err(VrpError::ConstructionExhausted {
                best: Box::new(best),
            }),
            (None, None) => Err(VrpError::MalformedProblem(
                "fleet must contain at least one vehicle".to_string(),
            )),
        }
    }

    /// Build one candidate using exactly `trucks` trucks.
    pub fn build_with(&self, trucks: usize) -> Construction {
        let problem = self.problem;
        let mut fleet = vec![Truck::new(); trucks.max(1)];
        let mut visited = vec![false; problem.customers.len()];
        visited[DEPOT] = true;
        let mut remaining = problem.customer_count();

        while remaining > 0 {
            let mut progressed = false;

            for truck in fleet.iter_mut() {
                if remaining == 0 {
                    break;
                }
                if let Some(customer) = self.next_feasible(truck, &visited) {
                    truck.visit(customer, problem);
                    visited[customer] = true;
                    remaining -= 1;
                    progressed = true;
                }
            }

            if !progressed {
                // No truck can continue feasibly: assign the globally nearest
                // customer and count it against that truck.
                if let Some((truck_idx, customer)) = self.nearest_any(&fleet, &visited) {
                    let truck = &mut fleet[truck_idx];
                    truck.visit(customer, problem);
                    truck.invalid_moves += 1;
                    visited[customer] = true;
                    remaining -= 1;
                }
            }
        }

        for truck in fleet.iter_mut() {
            truck.close(problem);
        }

        let cost = fleet.iter().map(|t| t.cost).sum();
        let invalid_moves = fleet.iter().map(|t| t.invalid_moves).sum();
        let routes = fleet
            .into_iter()
            .map(|t| Route::from_nodes(t.path))
            .collect();

        Construction {
            solution: Solution::new(routes),
            trucks,
            cost,
            invalid_moves,
        }
    }

    /// The unvisited customer with the smallest wait-adjusted distance that fits
    /// the truck's capacity, its own window and the depot's closing time.
    fn next_feasible(&self, truck: &Truck, visited: &[bool]) -> Option<usize> {
        let problem = self.problem;
        let depot = problem.depot();
        let from = truck.last();
        let capacity = u64::from(problem.vehicle_capacity);
        let mut best: Option<(usize, f64)> = None;

        for (id, customer) in problem.customers.iter().enumerate() {
            if visited[id] {
                continue;
            }
            if truck.load + u64::from(customer.demand) > capacity {
                continue;
            }

            let travel = problem.distance(from, id);
            let arrival = truck.time + travel;
            if arrival > customer.time_close {
                continue;
            }

            let departure = arrival.max(customer.time_open) + customer.service_time;
            if departure + problem.distance(id, DEPOT) > depot.time_close {
                continue;
            }

            let score = if arrival < customer.time_open {
                customer.time_open - arrival
            } else {
                travel
            };
            if best.map_or(true, |(_, best_score)| score < best_score) {
                best = Some((id, score));
            }
        }

        best.map(|(id, _)| id)
    }

    /// The closest (truck, customer) pair, ignoring every constraint.
    fn nearest_any(&self, fleet: &[Truck], visited: &[bool]) -> Option<(usize, usize)> {
        let mut best: Option<(usize, usize, f64)> = None;

        for (truck_idx, truck) in fleet.iter().enumerate() {
            let from = truck.last();
            for id in (0..visited.len()).filter(|&id| !visited[id]) {
                let d = self.problem.distance(from, id);
                if best.map_or(true, |(_, _, best_d)| d < best_d) {
                    best = Some((truck_idx, id, d));
                }
            }
        }

        best.map(|(truck_idx, id, _)| (truck_idx, id))
    }
}

fn is_better(candidate: &Construction, incumbent: Option<&Construction>) -> bool {
    match incumbent {
        None => true,
        Some(current) if candidate.invalid_moves == 0 => candidate.cost < current.cost,
        Some(current) => {
            (candidate.invalid_moves, candidate.cost) < (current.invalid_moves, current.cost)
        }
    }
}
