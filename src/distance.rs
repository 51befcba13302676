//! Dense symmetric Euclidean distance matrix.

use crate::error::{Result, VrpError};
use serde::{Deserialize, Serialize};

/// Distance substituted for coincident points wherever an inverse distance is taken.
pub const MIN_DISTANCE: f64 = f64::MIN_POSITIVE;

/// An n×n distance matrix stored in row-major order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistanceMatrix {
    data: Vec<f64>,
    size: usize,
}

impl DistanceMatrix {
    /// Compute the Euclidean distances between every pair of points.
    pub fn from_points(points: &[(f64, f64)]) -> Result<Self> {
        if points.is_empty() {
            return Err(VrpError::MalformedProblem(
                "cannot build a distance matrix without points".to_string(),
            ));
        }

        let size = points.len();
        let mut data = vec![0.0; size * size];

        for i in 0..size {
            for j in (i + 1)..size {
                let dx = points[i].0 - points[j].0;
                let dy = points[i].1 - points[j].1;
                let d = (dx * dx + dy * dy).sqrt();
                data[i * size + j] = d;
                data[j * size + i] = d;
            }
        }

        Ok(DistanceMatrix { data, size })
    }

    /// Get the distance between two nodes.
    pub fn get(&self, from: usize, to: usize) -> f64 {
        self.data[from * self.size + to]
    }

    /// Inverse distance, with coincident points clamped to [`MIN_DISTANCE`].
    pub fn inverse(&self, from: usize, to: usize) -> f64 {
        1.0 / self.get(from, to).max(MIN_DISTANCE)
    }

    /// Number of nodes covered by the matrix.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Length of a path visiting `nodes` in order (not closed).
    pub fn path_length(&self, nodes: &[usize]) -> f64 {
        nodes.windows(2).map(|w| self.get(w[0], w[1])).sum()
    }
}
