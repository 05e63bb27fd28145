//! Linear operator implementations, so that matrix data can be used directly with the Krylov
//! solvers.
use crate::distributed::SerialCrsMatrix;
use crate::store::SparseRowStore;
use matrix_data_krylov::{LinearOperator, OperatorError};
use nalgebra::{DVectorView, DVectorViewMut};

fn check_dims(nrows: usize, ncols: usize, y: &DVectorViewMut<f64>, x: &DVectorView<f64>) -> Result<(), OperatorError> {
    if y.len() != nrows || x.len() != ncols {
        return Err(format!(
            "dimension mismatch: operator is {}x{}, input has length {} and output has length {}",
            nrows,
            ncols,
            x.len(),
            y.len()
        )
        .into());
    }
    Ok(())
}

impl LinearOperator<f64> for SparseRowStore {
    fn apply(&self, mut y: DVectorViewMut<f64>, x: DVectorView<f64>) -> Result<(), OperatorError> {
        let b = self.block_size();
        check_dims(self.num_global_rows() * b, self.num_cols() * b, &y, &x)?;
        for point_row in 0..y.len() {
            y[point_row] = self
                .point_row(point_row)
                .into_iter()
                .flatten()
                .map(|(col, value)| value * x[col])
                .sum();
        }
        Ok(())
    }
}

impl LinearOperator<f64> for SerialCrsMatrix {
    /// Applies the locally owned rows. Entries of `y` for rows owned elsewhere are zero.
    fn apply(&self, mut y: DVectorViewMut<f64>, x: DVectorView<f64>) -> Result<(), OperatorError> {
        check_dims(self.num_global_rows(), self.num_cols(), &y, &x)?;
        y.fill(0.0);
        for (row, entries) in self.local_row_entries() {
            y[row] = entries.iter().map(|&(col, value)| value * x[col]).sum();
        }
        Ok(())
    }
}
