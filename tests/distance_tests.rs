//! Unit tests for the distance matrix.

use vrp_heuristics::distance::{DistanceMatrix, MIN_DISTANCE};
use vrp_heuristics::error::VrpError;

#[test]
fn test_euclidean_distances() {
    let matrix = DistanceMatrix::from_points(&[(0.0, 0.0), (3.0, 4.0), (6.0, 8.0)]).unwrap();

    assert_eq!(matrix.size(), 3);
    assert!((matrix.get(0, 1) - 5.0).abs() < 1e-10);
    assert!((matrix.get(0, 2) - 10.0).abs() < 1e-10);
    assert!((matrix.get(1, 2) - 5.0).abs() < 1e-10);
}

#[test]
fn test_symmetry_and_zero_diagonal() {
    let points = [(1.0, 2.0), (-3.5, 0.5), (7.0, -1.0), (2.0, 2.0)];
    let matrix = DistanceMatrix::from_points(&points).unwrap();

    for i in 0..points.len() {
        assert_eq!(matrix.get(i, i), 0.0);
        for j in 0..points.len() {
            assert_eq!(matrix.get(i, j), matrix.get(j, i));
            assert!(matrix.get(i, j) >= 0.0);
        }
    }
}

#[test]
fn test_empty_input_is_rejected() {
    let result = DistanceMatrix::from_points(&[]);
    assert!(matches!(result, Err(VrpError::MalformedProblem(_))));
}

#[test]
fn test_inverse_of_coincident_points_is_finite() {
    let matrix = DistanceMatrix::from_points(&[(1.0, 1.0), (1.0, 1.0), (2.0, 1.0)]).unwrap();

    assert_eq!(matrix.get(0, 1), 0.0);
    assert!(matrix.inverse(0, 1).is_finite());
    assert_eq!(matrix.inverse(0, 1), 1.0 / MIN_DISTANCE);
    assert!((matrix.inverse(0, 2) - 1.0).abs() < 1e-12);
}

#[test]
fn test_path_length() {
    let matrix =
        DistanceMatrix::from_points(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]).unwrap();

    assert!((matrix.path_length(&[0, 1, 2, 3, 0]) - 4.0).abs() < 1e-10);
    assert_eq!(matrix.path_length(&[2]), 0.0);
    assert_eq!(matrix.path_length(&[]), 0.0);
}
