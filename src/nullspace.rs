//! Near-nullspace vectors for smoothed-aggregation multigrid.
use crate::error::NullspaceError;
use crate::store::SparseRowStore;
use nalgebra::DMatrix;

/// Constant nullspace vectors, one column per degree of freedom of a node.
///
/// Column `c` is `1.0` at every degree of freedom `i` with `i % dofs_per_node == c`, and zero
/// elsewhere. With a single degree of freedom per node this is the vector of all ones.
pub fn constant_nullspace(num_dofs: usize, dofs_per_node: usize) -> Result<DMatrix<f64>, NullspaceError> {
    if dofs_per_node == 0 || num_dofs % dofs_per_node != 0 {
        return Err(NullspaceError::IncompatibleBlockSize {
            num_dofs,
            dofs_per_node,
        });
    }
    Ok(constant_columns(num_dofs, dofs_per_node))
}

fn constant_columns(num_dofs: usize, dofs_per_node: usize) -> DMatrix<f64> {
    DMatrix::from_fn(num_dofs, dofs_per_node, |i, c| {
        if i % dofs_per_node == c {
            1.0
        } else {
            0.0
        }
    })
}

/// Picks the nullspace for an operator with `num_dofs` degrees of freedom.
///
/// A user-given nullspace takes precedence and is only checked for its number of rows.
/// Otherwise the constant nullspace is computed.
pub fn resolve_nullspace(
    user_given: Option<DMatrix<f64>>,
    num_dofs: usize,
    dofs_per_node: usize,
) -> Result<DMatrix<f64>, NullspaceError> {
    match user_given {
        Some(nullspace) => {
            if nullspace.nrows() != num_dofs {
                return Err(NullspaceError::DimensionMismatch {
                    expected_rows: num_dofs,
                    actual_rows: nullspace.nrows(),
                });
            }
            log::info!("Using user-given nullspace: dimension = {}", nullspace.ncols());
            Ok(nullspace)
        }
        None => {
            let nullspace = constant_nullspace(num_dofs, dofs_per_node)?;
            log::info!("Calculated constant nullspace: dimension = {}", nullspace.ncols());
            Ok(nullspace)
        }
    }
}

impl SparseRowStore {
    /// The constant nullspace matching the point rows and block size of this store.
    pub fn constant_nullspace(&self) -> DMatrix<f64> {
        constant_columns(self.num_rows() * self.block_size(), self.block_size())
    }
}
