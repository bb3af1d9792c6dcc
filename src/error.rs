//! Error types for the anonymizer

use thiserror::Error;

/// Errors raised while building, grouping or generalizing a table
#[derive(Debug, Error)]
pub enum AnonError {
    /// Two values have no common partition within the generalizer's levels
    #[error("cannot generalize '{left}' and '{right}' into the same partition in column '{column}'")]
    Ungeneralizable {
        column: String,
        left: String,
        right: String,
    },

    #[error("k must be at least 1")]
    InvalidK,

    #[error("cannot build groups of {k} from {rows} rows")]
    NotEnoughRows { rows: usize, k: usize },

    #[error("row has {actual} values but the schema has {expected} columns")]
    RowArity { expected: usize, actual: usize },

    #[error("invalid hierarchy: {0}")]
    InvalidHierarchy(String),

    /// The grouping engine reached a state its invariants rule out
    #[error("internal invariant violated: {0}")]
    Invariant(String),
}

pub type Result<T> = std::result::Result<T, AnonError>;
