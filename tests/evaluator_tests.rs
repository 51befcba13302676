//! Tests for fitness evaluation, penalties and delivery schedules.

use vrp_heuristics::config::{PenaltyConfig, PenaltyPolicy};
use vrp_heuristics::evaluator::{Evaluator, Violation};
use vrp_heuristics::problem::{Customer, Problem};
use vrp_heuristics::solution::{Route, Solution};

/// Depot and three customers on the corners of a unit square, wide windows.
fn create_square_problem() -> Problem {
    let customers = vec![
        Customer::depot(0.0, 0.0, 1000.0),
        Customer::new(1, 1.0, 0.0, 1, 0.0, 1000.0, 0.0),
        Customer::new(2, 1.0, 1.0, 1, 0.0, 1000.0, 0.0),
        Customer::new(3, 0.0, 1.0, 1, 0.0, 1000.0, 0.0),
    ];
    Problem::new(1, 100, customers).unwrap()
}

/// Two customers whose windows cannot both be met, with capacity equal to
/// their total demand.
fn create_tight_problem() -> Problem {
    let customers = vec![
        Customer::depot(0.0, 0.0, 100.0),
        Customer::new(1, 10.0, 0.0, 3, 0.0, 10.0, 5.0),
        Customer::new(2, 20.0, 0.0, 2, 0.0, 12.0, 0.0),
    ];
    Problem::new(1, 5, customers).unwrap()
}

fn square_tour() -> Solution {
    Solution::new(vec![Route::new(&[1, 2, 3])])
}

#[test]
fn test_unit_square_cost() {
    let problem = create_square_problem();
    let evaluator = Evaluator::new(&problem, PenaltyConfig::default());
    let report = evaluator.evaluate(&square_tour());

    assert!((report.raw_cost - 4.0).abs() < 1e-10);
    assert_eq!(report.lateness, 0.0);
    assert_eq!(report.capacity_overload, 0);
    assert_eq!(report.penalty, 0.0);
    assert!(report.is_valid());
    assert!((report.fitness() - 4.0).abs() < 1e-10);
}

#[test]
fn test_service_time_is_part_of_raw_cost() {
    let customers = vec![
        Customer::depot(0.0, 0.0, 1000.0),
        Customer::new(1, 3.0, 4.0, 1, 0.0, 1000.0, 7.0),
    ];
    let problem = Problem::new(1, 10, customers).unwrap();
    let evaluator = Evaluator::new(&problem, PenaltyConfig::default());

    let report = evaluator.evaluate(&Solution::new(vec![Route::new(&[1])]));
    assert!((report.raw_cost - 17.0).abs() < 1e-10);
}

#[test]
fn test_evaluate_is_deterministic() {
    let problem = create_tight_problem();
    let evaluator = Evaluator::new(&problem, PenaltyConfig::default());
    let solution = Solution::new(vec![Route::new(&[1, 2])]);

    assert_eq!(evaluator.evaluate(&solution), evaluator.evaluate(&solution));
}

#[test]
fn test_late_arrival_without_overload() {
    let problem = create_tight_problem();
    let evaluator = Evaluator::new(&problem, PenaltyConfig::default());
    let report = evaluator.evaluate(&Solution::new(vec![Route::new(&[1, 2])]));

    // Customer 1 is reached at 10 and served until 15, customer 2 is reached at 25.
    assert_eq!(report.capacity_overload, 0);
    assert!((report.lateness - 13.0).abs() < 1e-10);
    assert!(!report.is_valid());
    assert_eq!(
        report.violations,
        vec![Violation::LateArrival {
            route: 0,
            customer: 2,
            lateness: 13.0
        }]
    );
    assert!(report.penalty > 0.0);
}

#[test]
fn test_waiting_is_not_penalized() {
    let customers = vec![
        Customer::depot(0.0, 0.0, 1000.0),
        Customer::new(1, 1.0, 0.0, 1, 50.0, 60.0, 5.0),
        Customer::new(2, 2.0, 0.0, 1, 0.0, 56.0, 0.0),
    ];
    let problem = Problem::new(1, 10, customers).unwrap();
    let evaluator = Evaluator::new(&problem, PenaltyConfig::default());

    // Wait at customer 1 until 50, leave at 55 and reach customer 2 at 56.
    let report = evaluator.evaluate(&Solution::new(vec![Route::new(&[1, 2])]));
    assert!(report.is_valid());

    let schedule = evaluator.schedule(&Solution::new(vec![Route::new(&[1, 2])]));
    assert_eq!(schedule.arrival(1), Some(1.0));
    assert_eq!(schedule.arrival(2), Some(56.0));
    assert_eq!(schedule.arrival(0), None);
}

#[test]
fn test_capacity_overload() {
    let customers = vec![
        Customer::depot(0.0, 0.0, 1000.0),
        Customer::new(1, 1.0, 0.0, 4, 0.0, 1000.0, 0.0),
        Customer::new(2, 2.0, 0.0, 3, 0.0, 1000.0, 0.0),
    ];
    let problem = Problem::new(1, 5, customers).unwrap();
    let evaluator = Evaluator::new(&problem, PenaltyConfig::default());

    let report = evaluator.evaluate(&Solution::new(vec![Route::new(&[1, 2])]));
    assert_eq!(report.capacity_overload, 2);
    assert_eq!(
        report.violations,
        vec![Violation::CapacityExceeded {
            route: 0,
            overload: 2
        }]
    );
}

#[test]
fn test_structural_violations_are_reported_individually() {
    let problem = create_square_problem();
    let evaluator = Evaluator::new(&problem, PenaltyConfig::default());

    let solution = Solution::new(vec![
        Route::new(&[1, 1]),
        Route::from_nodes(vec![0, 2]),
        Route::new(&[9]),
    ]);
    let report = evaluator.evaluate(&solution);

    assert!(report.violations.contains(&Violation::TooManyRoutes {
        routes: 3,
        fleet_size: 1
    }));
    assert!(report
        .violations
        .contains(&Violation::RouteNotClosed { route: 1 }));
    assert!(report
        .violations
        .contains(&Violation::UnknownCustomer { customer: 9 }));
    assert!(report.violations.contains(&Violation::CustomerRepeated {
        customer: 1,
        visits: 2
    }));
    assert!(report
        .violations
        .contains(&Violation::CustomerMissing { customer: 3 }));
    assert_eq!(report.structural_violations(), 5);
}

#[test]
fn test_escalating_penalty_doubles_and_resets() {
    let problem = create_square_problem();
    let penalty = PenaltyConfig::default().with_base_penalty(10.0);
    let mut evaluator = Evaluator::new(&problem, penalty);

    // Customer 3 is never visited.
    let infeasible = Solution::new(vec![Route::new(&[1, 2])]);
    let first = evaluator.evaluate(&infeasible);
    assert_eq!(first.penalty, 10.0);

    evaluator.observe(&first);
    let second = evaluator.evaluate(&infeasible);
    assert_eq!(second.penalty, 20.0);

    evaluator.observe(&second);
    assert_eq!(evaluator.evaluate(&infeasible).penalty, 40.0);
    assert_eq!(evaluator.invalid_streak(), 2);

    let report = evaluator.evaluate(&square_tour());
    assert!(report.is_valid());
    assert_eq!(report.penalty, 0.0);

    evaluator.observe(&report);
    assert_eq!(evaluator.invalid_streak(), 0);
    assert_eq!(evaluator.evaluate(&infeasible).penalty, 10.0);
}

#[test]
fn test_weighted_sum_penalty() {
    let problem = create_tight_problem();
    let penalty = PenaltyConfig::default()
        .with_policy(PenaltyPolicy::WeightedSum)
        .with_weights(2.0, 5.0)
        .with_base_penalty(100.0);
    let mut evaluator = Evaluator::new(&problem, penalty);

    let report = evaluator.evaluate(&Solution::new(vec![Route::new(&[1, 2])]));
    assert!((report.penalty - 26.0).abs() < 1e-10);

    // The weighted sum does not escalate.
    evaluator.observe(&report);
    let again = evaluator.evaluate(&Solution::new(vec![Route::new(&[1, 2])]));
    assert_eq!(again.penalty, report.penalty);

    // A missing customer costs one base penalty.
    let partial = evaluator.evaluate(&Solution::new(vec![Route::new(&[1])]));
    assert!((partial.penalty - 100.0).abs() < 1e-10);
}

#[test]
fn test_schedule_covers_every_route() {
    let customers = vec![
        Customer::depot(0.0, 0.0, 1000.0),
        Customer::new(1, 1.0, 0.0, 1, 0.0, 1000.0, 2.0),
        Customer::new(2, 2.0, 0.0, 1, 0.0, 1000.0, 0.0),
        Customer::new(3, 0.0, 3.0, 1, 0.0, 1000.0, 0.0),
    ];
    let problem = Problem::new(2, 10, customers).unwrap();
    let evaluator = Evaluator::new(&problem, PenaltyConfig::default());

    let solution = Solution::new(vec![Route::new(&[1, 2]), Route::new(&[3])]);
    let schedule = evaluator.schedule(&solution);

    assert_eq!(schedule.arrivals.len(), 3);
    assert_eq!(schedule.arrival(1), Some(1.0));
    assert_eq!(schedule.arrival(2), Some(4.0));
    assert_eq!(schedule.arrival(3), Some(3.0));
}

#[test]
fn test_large_demands_do_not_overflow() {
    let customers = vec![
        Customer::depot(0.0, 0.0, 1000.0),
        Customer::new(1, 1.0, 0.0, 3_000_000_000, 0.0, 1000.0, 0.0),
        Customer::new(2, 2.0, 0.0, 3_000_000_000, 0.0, 1000.0, 0.0),
    ];
    let problem = Problem::new(1, 4_000_000_000, customers).unwrap();
    let evaluator = Evaluator::new(&problem, PenaltyConfig::default());

    let report = evaluator.evaluate(&Solution::new(vec![Route::new(&[1, 2])]));
    assert_eq!(report.capacity_overload, 2_000_000_000);
    assert_eq!(
        report.violations,
        vec![Violation::CapacityExceeded {
            route: 0,
            overload: 2_000_000_000
        }]
    );
}
