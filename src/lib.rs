//! Synthetic sparse matrix data for testing sparse linear algebra.
//!
//! The central type is [`SparseRowStore`](store::SparseRowStore), a block sparse matrix with
//! sorted rows built from structured patterns. Stores can be written into, and compared
//! against, row-distributed matrices through the [`DistributedMatrix`](distributed::DistributedMatrix)
//! trait, and used as operators in the Krylov solvers of [`krylov`].
//!
//! ```
//! use matrix_data::distributed::{RowMap, SerialCrsMatrix};
//! use matrix_data::store::SparseRowStore;
//!
//! let store = SparseRowStore::banded(5, 5, 1, 1);
//! let mut matrix = SerialCrsMatrix::new(RowMap::serial(5), 5);
//! store.copy_local_data_to_matrix(&mut matrix).unwrap();
//! assert!(store.compare_local_data(&matrix));
//! ```

pub mod boundary;
pub mod distributed;
pub mod error;
pub mod mesh;
pub mod nullspace;
pub mod pattern;
pub mod store;

#[cfg(feature = "proptest-support")]
pub mod proptest;

mod operator_impl;

pub extern crate nalgebra;

pub mod krylov {
    pub use matrix_data_krylov::*;
}
