//! Error types shared by the solvers.

use crate::greedy::Construction;
use thiserror::Error;

/// Errors surfaced by problem loading, configuration and the search engines.
///
/// Infeasible solutions are never reported here: capacity and time-window
/// violations are part of a [`FitnessReport`](crate::evaluator::FitnessReport).
#[derive(Error, Debug)]
pub enum VrpError {
    #[error("malformed problem: {0}")]
    MalformedProblem(String),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Every truck count needed a fallback move. The cheapest such candidate is
    /// kept so the caller can still start from it.
    #[error(
        "greedy construction used {} fallback moves on every truck count",
        best.invalid_moves
    )]
    ConstructionExhausted { best: Box<Construction> },

    #[error("neighborhood is empty")]
    EmptyNeighborhood,

    #[error("failed to read or write file")]
    Io(#[from] std::io::Error),

    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("failed to serialize result")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, VrpError>;
