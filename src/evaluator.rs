//! Fitness and feasibility evaluation of solutions.

use crate::config::{PenaltyConfig, PenaltyPolicy};
use crate::problem::{Problem, DEPOT};
use crate::solution::{DeliverySchedule, Route, Solution};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tolerance used when comparing arrival times against closing times.
const TIME_EPSILON: f64 = 1e-9;

/// Cap on the number of doublings of the escalating penalty.
const MAX_DOUBLINGS: u32 = 64;

/// A single constraint violation found in a solution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Violation {
    RouteNotClosed { route: usize },
    TooManyRoutes { routes: usize, fleet_size: usize },
    CustomerMissing { customer: usize },
    CustomerRepeated { customer: usize, visits: usize },
    UnknownCustomer { customer: usize },
    LateArrival { route: usize, customer: usize, lateness: f64 },
    CapacityExceeded { route: usize, overload: u64 },
}

impl Violation {
    /// Check if the violation concerns the shape of the solution rather than
    /// time windows or capacity.
    pub fn is_structural(&self) -> bool {
        !matches!(
            self,
            Violation::LateArrival { .. } | Violation::CapacityExceeded { .. }
        )
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::RouteNotClosed { route } => {
                write!(f, "route {} does not start and end at the depot", route)
            }
            Violation::TooManyRoutes { routes, fleet_size } => {
                write!(f, "{} routes for a fleet of {}", routes, fleet_size)
            }
            Violation::CustomerMissing { customer } => {
                write!(f, "customer {} is not visited", customer)
            }
            Violation::CustomerRepeated { customer, visits } => {
                write!(f, "customer {} is visited {} times", customer, visits)
            }
            Violation::UnknownCustomer { customer } => {
                write!(f, "customer {} does not exist", customer)
            }
            Violation::LateArrival {
                route,
                customer,
                lateness,
            } => write!(
                f,
                "route {} reaches customer {} {:.2} late",
                route, customer, lateness
            ),
            Violation::CapacityExceeded { route, overload } => {
                write!(f, "route {} is overloaded by {}", route, overload)
            }
        }
    }
}

/// The result of evaluating a solution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitnessReport {
    /// Travel distance plus service time over all routes
    pub raw_cost: f64,
    /// Sum of arrivals past closing times
    pub lateness: f64,
    /// Sum of route loads beyond the vehicle capacity
    pub capacity_overload: u64,
    /// Penalty added to the raw cost
    pub penalty: f64,
    pub violations: Vec<Violation>,
}

impl FitnessReport {
    /// Raw cost plus penalty.
    pub fn fitness(&self) -> f64 {
        self.raw_cost + self.penalty
    }

    /// Check if no constraint is violated.
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    /// Number of violations concerning the shape of the solution.
    pub fn structural_violations(&self) -> usize {
        self.violations.iter().filter(|v| v.is_structural()).count()
    }
}

/// Per-route totals of the time and load simulation.
struct RouteTrace {
    cost: f64,
    lateness: f64,
    /// Total demand served, one `u32` per customer
    load: u64,
}

/// Scores solutions against a problem.
///
/// `evaluate` only reads the escalation streak, so every candidate of a
/// neighborhood is scored against the same state. `observe` advances it once
/// a solution has been chosen.
pub struct Evaluator<'a> {
    problem: &'a Problem,
    penalty: PenaltyConfig,
    invalid_streak: u32,
}

impl<'a> Evaluator<'a> {
    /// Create an evaluator with a fresh escalation streak.
    pub fn new(problem: &'a Problem, penalty: PenaltyConfig) -> Self {
        Evaluator {
            problem,
            penalty,
            invalid_streak: 0,
        }
    }

    /// Number of consecutive invalid solutions observed.
    pub fn invalid_streak(&self) -> u32 {
        self.invalid_streak
    }

    /// Evaluate the cost, lateness and overload of a solution.
    pub fn evaluate(&self, solution: &Solution) -> FitnessReport {
        let problem = self.problem;
        let node_count = problem.customers.len();
        let mut violations = Vec::new();
        let mut visits = vec![0usize; node_count];
        let mut raw_cost = 0.0;
        let mut lateness = 0.0;
        let mut capacity_overload: u64 = 0;

        if solution.routes.len() > problem.fleet_size {
            violations.push(Violation::TooManyRoutes {
                routes: solution.routes.len(),
                fleet_size: problem.fleet_size,
            });
        }

        for (route_idx, route) in solution.routes.iter().enumerate() {
            if !route.is_closed() {
                violations.push(Violation::RouteNotClosed { route: route_idx });
            }

            let unknown: Vec<usize> = route
                .nodes
                .iter()
                .copied()
                .filter(|&node| node >= node_count)
                .collect();
            if !unknown.is_empty() {
                violations.extend(
                    unknown
                        .into_iter()
                        .map(|customer| Violation::UnknownCustomer { customer }),
                );
                continue;
            }

            for &node in &route.nodes {
                if node != DEPOT {
                    visits[node] += 1;
                }
            }

            let trace = self.simulate(route, |customer, late| {
                violations.push(Violation::LateArrival {
                    route: route_idx,
                    customer,
                    lateness: late,
                });
            });

            raw_cost += trace.cost;
            lateness += trace.lateness;

            let capacity = u64::from(problem.vehicle_capacity);
            if trace.load > capacity {
                let overload = trace.load - capacity;
                capacity_overload = capacity_overload.saturating_add(overload);
                violations.push(Violation::CapacityExceeded {
                    route: route_idx,
                    overload,
                });
            }
        }

        for (customer, &count) in visits.iter().enumerate().skip(1) {
            match count {
                0 => violations.push(Violation::CustomerMissing { customer }),
                1 => {}
                visits => violations.push(Violation::CustomerRepeated { customer, visits }),
            }
        }

        let mut report = FitnessReport {
            raw_cost,
            lateness,
            capacity_overload,
            penalty: 0.0,
            violations,
        };
        report.penalty = self.penalty_for(&report);
        report
    }

    /// Record the solution the search moved to, escalating or resetting the
    /// penalty for the following evaluations.
    pub fn observe(&mut self, report: &FitnessReport) {
        if report.is_valid() {
            self.invalid_streak = 0;
        } else {
            self.invalid_streak = self.invalid_streak.saturating_add(1);
        }
    }

    /// Arrival time at every customer of the solution.
    pub fn schedule(&self, solution: &Solution) -> DeliverySchedule {
        let mut schedule = DeliverySchedule::default();
        let node_count = self.problem.customers.len();

        for route in &solution.routes {
            if route.nodes.iter().any(|&node| node >= node_count) {
                continue;
            }

            let mut clock = 0.0;
            for pair in route.nodes.windows(2) {
                let customer = &self.problem.customers[pair[1]];
                let arrival = clock + self.problem.distance(pair[0], pair[1]);
                if pair[1] != DEPOT {
                    schedule.arrivals.insert(pair[1], arrival);
                }
                clock = arrival.max(customer.time_open) + customer.service_time;
            }
        }

        schedule
    }

    /// Walk a route, waiting for windows to open and reporting late arrivals.
    fn simulate<F>(&self, route: &Route, mut on_late: F) -> RouteTrace
    where
        F: FnMut(usize, f64),
    {
        let problem = self.problem;
        let mut trace = RouteTrace {
            cost: 0.0,
            lateness: 0.0,
            load: 0,
        };
        let mut clock = 0.0;

        if let Some(&first) = route.nodes.first() {
            trace.load += u64::from(problem.customers[first].demand);
        }

        for pair in route.nodes.windows(2) {
            let customer = &problem.customers[pair[1]];
            let travel = problem.distance(pair[0], pair[1]);
            trace.cost += travel + customer.service_time;

            let arrival = clock + travel;
            if arrival > customer.time_close + TIME_EPSILON {
                let late = arrival - customer.time_close;
                trace.lateness += late;
                on_late(pair[1], late);
            }

            clock = arrival.max(customer.time_open) + customer.service_time;
            trace.load += u64::from(customer.demand);
        }

        trace
    }

    fn penalty_for(&self, report: &FitnessReport) -> f64 {
        if report.is_valid() {
            return 0.0;
        }

        let config = &self.penalty;
        match config.policy {
            PenaltyPolicy::Escalating => {
                let doublings = self.invalid_streak.min(MAX_DOUBLINGS) as i32;
                config.base_penalty * 2f64.powi(doublings)
            }
            PenaltyPolicy::WeightedSum => {
                report.lateness * config.late_weight
                    + report.capacity_overload as f64 * config.capacity_weight
                    + report.structural_violations() as f64 * config.base_penalty
            }
        }
    }
}
