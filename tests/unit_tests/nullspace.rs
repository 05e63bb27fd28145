use matrix_data::error::NullspaceError;
use matrix_data::krylov::LinearOperator;
use matrix_data::nullspace::{constant_nullspace, resolve_nullspace};
use matrix_data::store::SparseRowStore;
use nalgebra::{DMatrix, DVector};

/// Block tridiagonal 1D Laplacian with Neumann ends, with each block a multiple of the identity.
fn neumann_laplacian(num_nodes: usize, block_size: usize) -> SparseRowStore {
    let mut store = SparseRowStore::banded(num_nodes, num_nodes, 1, block_size);
    for i in 0..num_nodes {
        for j in i.saturating_sub(1)..=usize::min(num_nodes - 1, i + 1) {
            let weight = if i != j {
                -1.0
            } else if i == 0 || i == num_nodes - 1 {
                1.0
            } else {
                2.0
            };
            let block = store.coefs_mut(i, j).unwrap();
            for a in 0..block_size {
                for l in 0..block_size {
                    block[a * block_size + l] = if a == l { weight } else { 0.0 };
                }
            }
        }
    }
    store
}

#[test]
fn constant_nullspace_for_two_dofs_per_node() {
    let nullspace = constant_nullspace(6, 2).unwrap();
    #[rustfmt::skip]
    let expected = DMatrix::from_row_slice(6, 2, &[
        1.0, 0.0,
        0.0, 1.0,
        1.0, 0.0,
        0.0, 1.0,
        1.0, 0.0,
        0.0, 1.0,
    ]);
    assert_eq!(nullspace, expected);
    assert_eq!(constant_nullspace(4, 1).unwrap(), DMatrix::repeat(4, 1, 1.0));
}

#[test]
fn constant_nullspace_rejects_incompatible_block_size() {
    assert_eq!(
        constant_nullspace(5, 2),
        Err(NullspaceError::IncompatibleBlockSize {
            num_dofs: 5,
            dofs_per_node: 2
        })
    );
    assert_eq!(
        constant_nullspace(4, 0),
        Err(NullspaceError::IncompatibleBlockSize {
            num_dofs: 4,
            dofs_per_node: 0
        })
    );
}

#[test]
fn user_given_nullspace_takes_precedence() {
    let user_given = DMatrix::from_fn(6, 3, |i, j| (i + j) as f64);
    let resolved = resolve_nullspace(Some(user_given.clone()), 6, 2).unwrap();
    assert_eq!(resolved, user_given);

    let computed = resolve_nullspace(None, 6, 2).unwrap();
    assert_eq!(computed, constant_nullspace(6, 2).unwrap());
}

#[test]
fn user_given_nullspace_must_match_operator() {
    let user_given = DMatrix::repeat(5, 1, 1.0);
    assert_eq!(
        resolve_nullspace(Some(user_given), 6, 1),
        Err(NullspaceError::DimensionMismatch {
            expected_rows: 6,
            actual_rows: 5
        })
    );
    assert!(resolve_nullspace(None, 7, 3).is_err());
}

#[test]
fn store_nullspace_matches_point_rows() {
    let store = SparseRowStore::banded(4, 4, 1, 3);
    let nullspace = store.constant_nullspace();
    assert_eq!(nullspace.shape(), (12, 3));
    assert_eq!(nullspace, constant_nullspace(12, 3).unwrap());
}

#[test]
fn neumann_laplacian_annihilates_constant_nullspace() {
    for block_size in 1..=3 {
        let store = neumann_laplacian(8, block_size);
        let nullspace = store.constant_nullspace();
        for c in 0..nullspace.ncols() {
            let x: DVector<f64> = nullspace.column(c).into_owned();
            let mut y = DVector::repeat(x.len(), 1.0);
            store.apply((&mut y).into(), (&x).into()).unwrap();
            assert_eq!(y, DVector::zeros(x.len()));
        }
    }
}
