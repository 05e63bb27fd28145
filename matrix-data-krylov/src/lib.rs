//! Krylov subspace solvers for the linear systems produced by `matrix-data`.
//!
//! Solvers only interact with the system matrix through the [`LinearOperator`] trait, so that
//! dense matrices, CSR matrices and block row stores can all be used interchangeably, both as
//! system operators and as preconditioners.

pub mod cg;

mod operator;

pub use operator::{DiagonalOperator, IdentityOperator, LinearOperator, OperatorError};
