//! Preconditioned Conjugate Gradient for symmetric positive definite operators.
//!
//! The solver is configured through a small builder:
//!
//! ```
//! use matrix_data_krylov::cg::{ConjugateGradient, RelativeResidualCriterion};
//! use nalgebra::{DMatrix, DVector};
//!
//! let a = DMatrix::from_row_slice(2, 2, &[4.0, 1.0, 1.0, 3.0]);
//! let b = DVector::from_column_slice(&[1.0, 2.0]);
//! let mut x = DVector::zeros(2);
//! ConjugateGradient::new()
//!     .with_operator(&a)
//!     .with_stopping_criterion(RelativeResidualCriterion::new(1e-12))
//!     .solve_with_guess(&b, &mut x)
//!     .unwrap();
//! ```
use crate::{IdentityOperator, LinearOperator, OperatorError};
use nalgebra::{DVector, DVectorView, DVectorViewMut, RealField, Scalar};
use num::Zero;
use std::fmt;
use std::ops::{Deref, DerefMut};

/// State of the residual passed to a [`CgStoppingCriterion`].
#[derive(Debug, Clone, Copy)]
pub struct ResidualState<T> {
    /// Number of completed updates of the solution vector.
    pub iteration: usize,
    /// Norm of the right-hand side.
    pub b_norm: T,
    /// Norm of the residual of the initial guess.
    pub initial_residual_norm: T,
    /// Norm of the current (recursively updated) residual.
    pub residual_norm: T,
}

pub trait CgStoppingCriterion<T: Scalar> {
    fn has_converged(&self, state: &ResidualState<T>) -> bool;
}

/// Relative residual tolerance `||r|| <= tol * ||b||`.
///
/// The residual is the one updated by the CG recurrence. For ill-conditioned problems it may
/// drift away from the true residual `b - Ax`.
#[derive(Debug, Clone, Copy)]
pub struct RelativeResidualCriterion<T> {
    tol: T,
}

impl<T> RelativeResidualCriterion<T> {
    pub fn new(tol: T) -> Self {
        Self { tol }
    }
}

impl Default for RelativeResidualCriterion<f64> {
    fn default() -> Self {
        Self::new(1e-8)
    }
}

impl<T: RealField + Copy> CgStoppingCriterion<T> for RelativeResidualCriterion<T> {
    fn has_converged(&self, state: &ResidualState<T>) -> bool {
        state.residual_norm <= self.tol * state.b_norm
    }
}

/// Residual reduction relative to the initial guess, `||r|| <= tol * ||r_0||`.
#[derive(Debug, Clone, Copy)]
pub struct InitialResidualCriterion<T> {
    tol: T,
}

impl<T> InitialResidualCriterion<T> {
    pub fn new(tol: T) -> Self {
        Self { tol }
    }
}

impl<T: RealField + Copy> CgStoppingCriterion<T> for InitialResidualCriterion<T> {
    fn has_converged(&self, state: &ResidualState<T>) -> bool {
        state.residual_norm <= self.tol * state.initial_residual_norm
    }
}

/// Reusable buffers for repeated solves.
#[derive(Debug, Clone)]
pub struct CgWorkspace<T: Scalar> {
    r: DVector<T>,
    z: DVector<T>,
    p: DVector<T>,
    q: DVector<T>,
}

impl<T: Scalar + Zero> Default for CgWorkspace<T> {
    fn default() -> Self {
        Self {
            r: DVector::zeros(0),
            z: DVector::zeros(0),
            p: DVector::zeros(0),
            q: DVector::zeros(0),
        }
    }
}

impl<T: Scalar + Zero> CgWorkspace<T> {
    fn resize(&mut self, dim: usize) {
        for buffer in [&mut self.r, &mut self.z, &mut self.p, &mut self.q] {
            buffer.resize_vertically_mut(dim, T::zero());
        }
    }
}

#[derive(Debug)]
enum Workspace<'a, T: Scalar> {
    Owned(CgWorkspace<T>),
    Borrowed(&'a mut CgWorkspace<T>),
}

impl<'a, T: Scalar> Deref for Workspace<'a, T> {
    type Target = CgWorkspace<T>;

    fn deref(&self) -> &Self::Target {
        match self {
            Self::Owned(workspace) => workspace,
            Self::Borrowed(workspace) => &**workspace,
        }
    }
}

impl<'a, T: Scalar> DerefMut for Workspace<'a, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        match self {
            Self::Owned(workspace) => workspace,
            Self::Borrowed(workspace) => &mut **workspace,
        }
    }
}

#[derive(Debug)]
#[non_exhaustive]
pub enum SolveErrorKind {
    OperatorError(OperatorError),
    PreconditionerError(OperatorError),
    IndefiniteOperator,
    IndefinitePreconditioner,
    MaxIterationsReached { max_iter: usize },
}

impl fmt::Display for SolveErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OperatorError(err) => write!(f, "error applying operator: {}", err),
            Self::PreconditionerError(err) => write!(f, "error applying preconditioner: {}", err),
            Self::IndefiniteOperator => write!(f, "operator appears to be indefinite"),
            Self::IndefinitePreconditioner => write!(f, "preconditioner appears to be indefinite"),
            Self::MaxIterationsReached { max_iter } => write!(f, "max iterations ({}) reached", max_iter),
        }
    }
}

#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct CgOutput {
    /// Number of updates made to the solution vector.
    pub num_iterations: usize,
}

#[derive(Debug)]
#[non_exhaustive]
pub struct SolveError {
    pub output: CgOutput,
    pub kind: SolveErrorKind,
}

impl fmt::Display for SolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CG failed after {} iterations: {}", self.output.num_iterations, self.kind)
    }
}

impl std::error::Error for SolveError {}

#[derive(Debug)]
pub struct ConjugateGradient<'a, T, A, P, Criterion>
where
    T: Scalar,
{
    workspace: Workspace<'a, T>,
    operator: A,
    preconditioner: P,
    stopping_criterion: Criterion,
    max_iter: Option<usize>,
}

impl<'a, T: Scalar + Zero> ConjugateGradient<'a, T, (), IdentityOperator, ()> {
    pub fn new() -> Self {
        Self::from_workspace(Workspace::Owned(CgWorkspace::default()))
    }
}

impl<'a, T: Scalar> ConjugateGradient<'a, T, (), IdentityOperator, ()> {
    /// Use an external workspace, so that buffers are reused across solves.
    pub fn with_workspace(workspace: &'a mut CgWorkspace<T>) -> Self {
        Self::from_workspace(Workspace::Borrowed(workspace))
    }

    fn from_workspace(workspace: Workspace<'a, T>) -> Self {
        Self {
            workspace,
            operator: (),
            preconditioner: IdentityOperator,
            stopping_criterion: (),
            max_iter: None,
        }
    }
}

impl<'a, T: Scalar, P, Criterion> ConjugateGradient<'a, T, (), P, Criterion> {
    pub fn with_operator<A>(self, operator: A) -> ConjugateGradient<'a, T, A, P, Criterion> {
        ConjugateGradient {
            workspace: self.workspace,
            operator,
            preconditioner: self.preconditioner,
            stopping_criterion: self.stopping_criterion,
            max_iter: self.max_iter,
        }
    }
}

impl<'a, T: Scalar, A, P> ConjugateGradient<'a, T, A, P, ()> {
    pub fn with_stopping_criterion<Criterion>(
        self,
        stopping_criterion: Criterion,
    ) -> ConjugateGradient<'a, T, A, P, Criterion> {
        ConjugateGradient {
            workspace: self.workspace,
            operator: self.operator,
            preconditioner: self.preconditioner,
            stopping_criterion,
            max_iter: self.max_iter,
        }
    }
}

impl<'a, T: Scalar, A, P, Criterion> ConjugateGradient<'a, T, A, P, Criterion> {
    pub fn with_preconditioner<P2>(self, preconditioner: P2) -> ConjugateGradient<'a, T, A, P2, Criterion> {
        ConjugateGradient {
            workspace: self.workspace,
            operator: self.operator,
            preconditioner,
            stopping_criterion: self.stopping_criterion,
            max_iter: self.max_iter,
        }
    }

    pub fn with_max_iter(self, max_iter: usize) -> Self {
        Self {
            max_iter: Some(max_iter),
            ..self
        }
    }
}

impl<'a, T, A, P, Criterion> ConjugateGradient<'a, T, A, P, Criterion>
where
    T: RealField + Copy,
    A: LinearOperator<T>,
    P: LinearOperator<T>,
    Criterion: CgStoppingCriterion<T>,
{
    /// Solve `Ax = b`, using the contents of `x` as the initial guess.
    pub fn solve_with_guess<'b>(
        &mut self,
        b: impl Into<DVectorView<'b, T>>,
        x: impl Into<DVectorViewMut<'b, T>>,
    ) -> Result<CgOutput, SolveError> {
        let result = self.solve(b.into(), x.into());
        if let Err(err) = &result {
            log::warn!("{}", err);
        }
        result
    }

    fn solve(&mut self, b: DVectorView<T>, mut x: DVectorViewMut<T>) -> Result<CgOutput, SolveError> {
        use SolveErrorKind::{IndefiniteOperator, IndefinitePreconditioner, MaxIterationsReached};
        assert_eq!(b.len(), x.len(), "right-hand side and solution must have the same length");

        let mut output = CgOutput { num_iterations: 0 };
        let fail = |output: &CgOutput, kind| {
            Err(SolveError {
                output: output.clone(),
                kind,
            })
        };

        self.workspace.resize(x.len());
        let CgWorkspace { r, z, p, q } = &mut *self.workspace;

        // r = b - Ax
        if let Err(err) = self.operator.apply((&mut *r).into(), (&x).into()) {
            return fail(&output, SolveErrorKind::OperatorError(err));
        }
        r.axpy(T::one(), &b, -T::one());

        let b_norm = b.norm();
        if b_norm == T::zero() {
            x.fill(T::zero());
            return Ok(output);
        }
        let initial_residual_norm = r.norm();
        if initial_residual_norm == T::zero() {
            return Ok(output);
        }

        // z = Pr, p = z
        if let Err(err) = self.preconditioner.apply((&mut *z).into(), (&*r).into()) {
            return fail(&output, SolveErrorKind::PreconditionerError(err));
        }
        p.copy_from(z);
        let mut z_dot_r = z.dot(r);

        let report_interval = self.max_iter.map(|max_iter| max_iter / 10 + 1).unwrap_or(10);

        loop {
            let state = ResidualState {
                iteration: output.num_iterations,
                b_norm,
                initial_residual_norm,
                residual_norm: r.norm(),
            };
            let converged = self.stopping_criterion.has_converged(&state);
            let at_limit = self.max_iter == Some(output.num_iterations);
            if converged || at_limit || output.num_iterations % report_interval == 0 {
                log::debug!(
                    "CG iteration {}: ||r|| / ||r_0|| = {}",
                    output.num_iterations,
                    state.residual_norm / initial_residual_norm
                );
            }

            if converged {
                return Ok(output);
            } else if let Some(max_iter) = self.max_iter.filter(|_| at_limit) {
                return fail(&output, MaxIterationsReached { max_iter });
            }

            // q = Ap
            if let Err(err) = self.operator.apply((&mut *q).into(), (&*p).into()) {
                return fail(&output, SolveErrorKind::OperatorError(err));
            }
            let p_dot_q = p.dot(q);
            if p_dot_q <= T::zero() {
                return fail(&output, IndefiniteOperator);
            }
            if z_dot_r <= T::zero() {
                return fail(&output, IndefinitePreconditioner);
            }

            let alpha = z_dot_r / p_dot_q;
            x.axpy(alpha, &*p, T::one());
            r.axpy(-alpha, &*q, T::one());
            output.num_iterations += 1;

            // z = Pr
            if let Err(err) = self.preconditioner.apply((&mut *z).into(), (&*r).into()) {
                return fail(&output, SolveErrorKind::PreconditionerError(err));
            }
            let z_dot_r_next = z.dot(r);
            let beta = z_dot_r_next / z_dot_r;
            // p = z + beta p
            p.axpy(T::one(), &*z, beta);
            z_dot_r = z_dot_r_next;
        }
    }
}
