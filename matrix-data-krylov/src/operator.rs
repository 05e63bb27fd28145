use nalgebra::{ClosedAdd, ClosedMul, DMatrix, DVector, DVectorView, DVectorViewMut, Scalar};
use nalgebra_sparse::ops::serial::spmm_csr_dense;
use nalgebra_sparse::ops::Op;
use nalgebra_sparse::CsrMatrix;
use num::{One, Zero};
use std::error::Error;

/// Error type returned by operator applications.
pub type OperatorError = Box<dyn Error + Send + Sync>;

/// A linear map `y = A x`.
pub trait LinearOperator<T: Scalar> {
    fn apply(&self, y: DVectorViewMut<T>, x: DVectorView<T>) -> Result<(), OperatorError>;
}

impl<'a, T, A> LinearOperator<T> for &'a A
where
    T: Scalar,
    A: ?Sized + LinearOperator<T>,
{
    fn apply(&self, y: DVectorViewMut<T>, x: DVectorView<T>) -> Result<(), OperatorError> {
        <A as LinearOperator<T>>::apply(self, y, x)
    }
}

fn check_dims(op_rows: usize, op_cols: usize, y_len: usize, x_len: usize) -> Result<(), OperatorError> {
    if op_rows != y_len || op_cols != x_len {
        Err(format!(
            "cannot apply {}x{} operator to vector of length {} with output of length {}",
            op_rows, op_cols, x_len, y_len
        )
        .into())
    } else {
        Ok(())
    }
}

impl<T> LinearOperator<T> for DMatrix<T>
where
    T: Scalar + Zero + One + ClosedAdd + ClosedMul,
{
    fn apply(&self, mut y: DVectorViewMut<T>, x: DVectorView<T>) -> Result<(), OperatorError> {
        check_dims(self.nrows(), self.ncols(), y.len(), x.len())?;
        y.gemv(T::one(), self, &x, T::zero());
        Ok(())
    }
}

impl<T> LinearOperator<T> for CsrMatrix<T>
where
    T: Scalar + Zero + One + ClosedAdd + ClosedMul,
{
    fn apply(&self, mut y: DVectorViewMut<T>, x: DVectorView<T>) -> Result<(), OperatorError> {
        check_dims(self.nrows(), self.ncols(), y.len(), x.len())?;
        spmm_csr_dense(T::zero(), &mut y, T::one(), Op::NoOp(self), Op::NoOp(&x));
        Ok(())
    }
}

/// The identity map, i.e. no preconditioning.
#[derive(Debug, Copy, Clone, Default)]
pub struct IdentityOperator;

impl<T: Scalar> LinearOperator<T> for IdentityOperator {
    fn apply(&self, mut y: DVectorViewMut<T>, x: DVectorView<T>) -> Result<(), OperatorError> {
        check_dims(x.len(), x.len(), y.len(), x.len())?;
        y.copy_from(&x);
        Ok(())
    }
}

/// A diagonal operator `y_i = d_i x_i`.
///
/// Mostly useful as a Jacobi preconditioner, see [`DiagonalOperator::jacobi`].
#[derive(Debug, Clone, PartialEq)]
pub struct DiagonalOperator<T: Scalar> {
    diagonal: DVector<T>,
}

impl<T: Scalar> DiagonalOperator<T> {
    pub fn from_diagonal(diagonal: DVector<T>) -> Self {
        Self { diagonal }
    }

    pub fn diagonal(&self) -> &DVector<T> {
        &self.diagonal
    }
}

impl DiagonalOperator<f64> {
    /// Jacobi preconditioner built from the diagonal of a system matrix.
    ///
    /// # Panics
    ///
    /// Panics if any diagonal entry is zero.
    pub fn jacobi(system_diagonal: &DVector<f64>) -> Self {
        assert!(
            system_diagonal.iter().all(|&d| d != 0.0),
            "Jacobi preconditioner requires a non-zero diagonal"
        );
        Self::from_diagonal(system_diagonal.map(f64::recip))
    }
}

impl<T> LinearOperator<T> for DiagonalOperator<T>
where
    T: Scalar + ClosedMul,
{
    fn apply(&self, mut y: DVectorViewMut<T>, x: DVectorView<T>) -> Result<(), OperatorError> {
        let n = self.diagonal.len();
        check_dims(n, n, y.len(), x.len())?;
        for i in 0..n {
            y[i] = self.diagonal[i].clone() * x[i].clone();
        }
        Ok(())
    }
}
