//! Error types shared across the crate.
use std::error::Error;
use std::fmt;

/// Failure of a point lookup in a [`SparseRowStore`](crate::store::SparseRowStore).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupError {
    RowNotFound { row: usize },
    ColumnNotFound { row: usize, col: usize },
}

impl fmt::Display for LookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RowNotFound { row } => write!(f, "row {} not found in matrix data", row),
            Self::ColumnNotFound { row, col } => {
                write!(f, "column {} not found in row {} of matrix data", col, row)
            }
        }
    }
}

impl Error for LookupError {}

/// Invalid parameters or structure encountered while building a store.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PatternError {
    ZeroBlockSize,
    /// Column indices of a row are not strictly increasing at `position`.
    UnsortedColumns { row: usize, position: usize },
}

impl fmt::Display for PatternError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroBlockSize => write!(f, "block size (degrees of freedom per node) must be positive"),
            Self::UnsortedColumns { row, position } => write!(
                f,
                "column indices of row {} are not strictly increasing at position {}",
                row, position
            ),
        }
    }
}

impl Error for PatternError {}

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum NullspaceError {
    /// A user-given nullspace does not have one row per degree of freedom.
    DimensionMismatch { expected_rows: usize, actual_rows: usize },
    /// The number of degrees of freedom is not a multiple of the degrees of freedom per node.
    IncompatibleBlockSize { num_dofs: usize, dofs_per_node: usize },
}

impl fmt::Display for NullspaceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DimensionMismatch {
                expected_rows,
                actual_rows,
            } => write!(
                f,
                "nullspace has {} rows, but the operator has {} degrees of freedom",
                actual_rows, expected_rows
            ),
            Self::IncompatibleBlockSize {
                num_dofs,
                dofs_per_node,
            } => write!(
                f,
                "{} degrees of freedom cannot be split into nodes of {} degrees of freedom",
                num_dofs, dofs_per_node
            ),
        }
    }
}

impl Error for NullspaceError {}
