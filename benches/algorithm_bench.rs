//! Benchmarks for construction, tabu search and the ant colony.

#[cfg(feature = "bench")]
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::time::Duration;
use vrp_heuristics::ant_colony::AntColony;
use vrp_heuristics::config::{AntColonyConfig, Config};
use vrp_heuristics::greedy::GreedyBuilder;
use vrp_heuristics::problem::{Customer, Problem};
use vrp_heuristics::tabu::TabuSearch;

/// Create a benchmark problem of the given size with staggered time windows.
fn create_benchmark_problem(size: usize) -> Problem {
    let mut customers = vec![Customer::depot(0.0, 0.0, 100_000.0)];

    let grid_size = (size as f64).sqrt().ceil() as usize;
    for i in 1..=size {
        let row = (i - 1) / grid_size;
        let col = (i - 1) % grid_size;
        let open = (i % 10) as f64 * 50.0;
        customers.push(Customer::new(
            i,
            col as f64 * 10.0,
            row as f64 * 10.0,
            1,
            open,
            open + 5_000.0,
            2.0,
        ));
    }

    Problem::new((size / 5).max(1), 10, customers)
        .unwrap_or_else(|err| panic!("benchmark problem is invalid: {}", err))
}

#[cfg(feature = "bench")]
fn benchmark_construction(c: &mut Criterion) {
    let mut group = c.benchmark_group("construction");

    for size in [50, 100, 200].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let problem = create_benchmark_problem(size);
            b.iter(|| GreedyBuilder::new(&problem).build_with(problem.fleet_size));
        });
    }

    group.finish();
}

#[cfg(feature = "bench")]
fn benchmark_tabu_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("tabu_step");

    for size in [25, 50, 100].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let problem = create_benchmark_problem(size);
            let initial = GreedyBuilder::new(&problem)
                .build_with(problem.fleet_size)
                .solution;

            b.iter(|| {
                let mut search = TabuSearch::new(&problem, Config::new().with_seed(1))
                    .unwrap_or_else(|err| panic!("{}", err));
                search.step(&initial)
            });
        });
    }

    group.finish();
}

#[cfg(feature = "bench")]
fn benchmark_ant_colony(c: &mut Criterion) {
    let mut group = c.benchmark_group("ant_colony");
    group.measurement_time(Duration::from_secs(10));

    for size in [25, 50].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let problem = create_benchmark_problem(size);
            let config = AntColonyConfig::new()
                .with_iterations(20)
                .with_ants(10)
                .with_seed(1);

            b.iter(|| {
                let mut colony = AntColony::new(&problem.distances, config.clone())
                    .unwrap_or_else(|err| panic!("{}", err));
                colony.run()
            });
        });
    }

    group.finish();
}

#[cfg(feature = "bench")]
criterion_group!(
    benches,
    benchmark_construction,
    benchmark_tabu_step,
    benchmark_ant_colony
);

#[cfg(feature = "bench")]
criterion_main!(benches);
