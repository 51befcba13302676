//! Tests for nearest-neighbor tours and 2-opt.

use vrp_heuristics::distance::DistanceMatrix;
use vrp_heuristics::two_opt::{nearest_neighbor_tour, TwoOpt};

fn create_square_distances() -> DistanceMatrix {
    DistanceMatrix::from_points(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]).unwrap()
}

fn create_circle_distances(n: usize) -> DistanceMatrix {
    let points: Vec<(f64, f64)> = (0..n)
        .map(|i| {
            let angle = i as f64 * std::f64::consts::TAU / n as f64;
            (angle.cos() * 10.0, angle.sin() * 10.0)
        })
        .collect();
    DistanceMatrix::from_points(&points).unwrap()
}

#[test]
fn test_nearest_neighbor_tour() {
    let distances = create_square_distances();
    assert_eq!(nearest_neighbor_tour(&distances, 0), vec![0, 1, 2, 3, 0]);
    assert_eq!(nearest_neighbor_tour(&distances, 2), vec![2, 1, 0, 3, 2]);
}

#[test]
fn test_single_node_tour() {
    let distances = DistanceMatrix::from_points(&[(5.0, 5.0)]).unwrap();
    assert_eq!(nearest_neighbor_tour(&distances, 0), vec![0, 0]);
}

#[test]
fn test_two_opt_removes_crossing() {
    let distances = create_square_distances();
    let mut tour = vec![0, 2, 1, 3, 0];

    let length = TwoOpt::new(&distances).optimize(&mut tour);

    assert!((length - 4.0).abs() < 1e-10);
    assert_eq!(tour.first(), Some(&0));
    assert_eq!(tour.last(), Some(&0));
}

#[test]
fn test_first_improvement_reaches_local_optimum() {
    let distances = create_square_distances();
    let mut tour = vec![0, 2, 1, 3, 0];

    let two_opt = TwoOpt::new(&distances).with_first_improvement(true);
    assert!(two_opt.improve(&mut tour));
    assert!((distances.path_length(&tour) - 4.0).abs() < 1e-10);
    assert!(!two_opt.improve(&mut tour));
}

#[test]
fn test_short_tours_are_left_alone() {
    let distances = create_square_distances();
    let mut tour = vec![0, 2, 1, 0];

    assert!(!TwoOpt::new(&distances).improve(&mut tour));
    assert_eq!(tour, vec![0, 2, 1, 0]);
}

#[test]
fn test_two_opt_untangles_circle() {
    let distances = create_circle_distances(8);
    let mut tour = vec![0, 4, 1, 5, 2, 6, 3, 7, 0];
    let before = distances.path_length(&tour);

    let after = TwoOpt::new(&distances).optimize(&mut tour);

    assert!(after < before);
    let optimal = distances.path_length(&[0, 1, 2, 3, 4, 5, 6, 7, 0]);
    assert!((after - optimal).abs() < 1e-9);

    let mut nodes = tour[..8].to_vec();
    nodes.sort_unstable();
    assert_eq!(nodes, (0..8).collect::<Vec<_>>());
}
