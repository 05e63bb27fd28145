use itertools::Itertools;
use matrix_data::error::{LookupError, PatternError};
use matrix_data::pattern::CoefficientFill;
use matrix_data::proptest::{banded_pattern, quad_chain_pattern};
use matrix_data::store::SparseRowStore;
use nalgebra::DMatrix;
use proptest::prelude::*;
use std::collections::BTreeSet;

fn columns(store: &SparseRowStore, row: usize) -> Vec<usize> {
    store.row(row).unwrap().column_indices().to_vec()
}

#[test]
fn banded_five_rows_one_off_diagonal() {
    let store = SparseRowStore::banded(5, 5, 1, 1);
    assert_eq!(store.num_rows(), 5);
    assert_eq!(store.block_size(), 1);
    assert_eq!(store.num_cols(), 5);
    assert_eq!(store.nnz(), 13);

    assert_eq!(columns(&store, 0), vec![0, 1]);
    assert_eq!(columns(&store, 1), vec![0, 1, 2]);
    assert_eq!(columns(&store, 2), vec![1, 2, 3]);
    assert_eq!(columns(&store, 3), vec![2, 3, 4]);
    assert_eq!(columns(&store, 4), vec![3, 4]);
    assert!(store
        .rows()
        .iter()
        .all(|record| record.coefficients().iter().all(|&v| v == 1.0)));
}

#[test]
fn banded_blocks_have_block_size_squared_coefficients() {
    let store = SparseRowStore::banded(4, 4, 2, 3);
    assert_eq!(store.block_size(), 3);
    for record in store.rows() {
        assert_eq!(record.coefficients().len(), 9 * record.len());
    }
    assert_eq!(store.coefs(3, 1).unwrap(), &[1.0; 9]);
}

#[test]
fn banded_without_rows_is_empty() {
    let store = SparseRowStore::banded(0, 3, 1, 1);
    assert_eq!(store.num_rows(), 0);
    assert_eq!(store.nnz(), 0);
    assert_eq!(store.coefs(0, 0), Err(LookupError::RowNotFound { row: 0 }));
}

#[test]
fn single_quad_nonsymmetric() {
    let store = SparseRowStore::quad_chain(1, 1, CoefficientFill::Nonsymmetric);
    assert_eq!(store.num_rows(), 4);
    for row in 0..4 {
        let record = store.row(row).unwrap();
        assert_eq!(record.column_indices(), &[0, 1, 2, 3]);
        assert_eq!(record.coefficients(), &[1.0, 2.0, 3.0, 4.0]);
    }
}

#[test]
fn two_quads_share_middle_nodes() {
    let store = SparseRowStore::quad_chain(2, 1, CoefficientFill::Uniform);
    assert_eq!(store.num_rows(), 6);
    assert_eq!(columns(&store, 0), vec![0, 1, 2, 3]);
    assert_eq!(columns(&store, 2), vec![0, 1, 2, 3, 4, 5]);
    assert_eq!(columns(&store, 3), vec![0, 1, 2, 3, 4, 5]);
    assert_eq!(columns(&store, 5), vec![2, 3, 4, 5]);
}

#[test]
fn quad_chain_without_elements_has_two_isolated_nodes() {
    let store = SparseRowStore::quad_chain(0, 2, CoefficientFill::Uniform);
    assert_eq!(store.num_rows(), 2);
    assert_eq!(store.nnz(), 0);
    assert!(store.rows().iter().all(|record| record.is_empty()));
}

#[test]
fn nonsymmetric_fill_numbers_flattened_blocks() {
    let store = SparseRowStore::quad_chain(1, 2, CoefficientFill::Nonsymmetric);
    assert_eq!(store.block_size(), 2);
    let expected: Vec<f64> = (1..=16).map(|j| j as f64).collect();
    assert_eq!(store.row(0).unwrap().coefficients(), expected.as_slice());
    assert_eq!(store.coefs(0, 1).unwrap(), &[5.0, 6.0, 7.0, 8.0]);
}

#[test]
fn coefs_mut_writes_are_visible_to_coefs() {
    let mut store = SparseRowStore::banded(3, 3, 1, 2);
    store.coefs_mut(1, 2).unwrap()[3] = -4.0;
    assert_eq!(store.coefs(1, 2).unwrap(), &[1.0, 1.0, 1.0, -4.0]);
    assert_eq!(store.coefs(2, 1).unwrap(), &[1.0; 4]);
    assert_eq!(
        store.coefs_mut(0, 2),
        Err(LookupError::ColumnNotFound { row: 0, col: 2 })
    );
}

#[test]
fn block_store_to_dense() {
    let mut store = SparseRowStore::banded(2, 2, 0, 2);
    store
        .coefs_mut(1, 1)
        .unwrap()
        .copy_from_slice(&[1.0, 2.0, 3.0, 4.0]);
    #[rustfmt::skip]
    let expected = DMatrix::from_row_slice(4, 4, &[
        1.0, 1.0, 0.0, 0.0,
        1.0, 1.0, 0.0, 0.0,
        0.0, 0.0, 1.0, 2.0,
        0.0, 0.0, 3.0, 4.0,
    ]);
    assert_eq!(store.to_dense(), expected);
}

#[test]
fn skeleton_rows_start_out_as_placeholders() {
    let skeleton = SparseRowStore::skeleton(&[2, 0, 3], 2);
    assert_eq!(skeleton.num_rows(), 3);
    assert_eq!(skeleton.block_size(), 2);

    let rows = skeleton.into_rows_unchecked();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].column_indices(), &[0, 0]);
    assert_eq!(rows[0].coefficients(), &[0.0; 8]);
    assert!(rows[1].is_empty());
    assert_eq!(rows[2].global_row(), 2);
    assert_eq!(rows[2].coefficients().len(), 12);
}

#[test]
fn skeleton_with_placeholders_fails_to_finish() {
    let skeleton = SparseRowStore::skeleton(&[1, 2], 1);
    assert_eq!(
        skeleton.finish(),
        Err(PatternError::UnsortedColumns { row: 1, position: 1 })
    );
}

#[test]
fn filled_skeleton_finishes() {
    let mut skeleton = SparseRowStore::skeleton(&[2, 1], 1);
    {
        let (cols, coefs) = skeleton.row_mut(0);
        cols.copy_from_slice(&[0, 1]);
        coefs.copy_from_slice(&[2.0, -1.0]);
    }
    {
        let (cols, coefs) = skeleton.row_mut(1);
        cols[0] = 1;
        coefs[0] = 3.0;
    }
    let store = skeleton.finish().unwrap();

    assert_eq!(store.num_cols(), 2);
    assert_eq!(store.coefs(0, 1).unwrap(), &[-1.0]);
    assert_eq!(store.coefs(1, 0), Err(LookupError::ColumnNotFound { row: 1, col: 0 }));
    assert_eq!(store.to_dense(), DMatrix::from_row_slice(2, 2, &[2.0, -1.0, 0.0, 3.0]));
}

/// Nodes sharing an element with `node` in a chain of `num_elements` quads.
fn chain_neighbors(num_elements: usize, node: usize) -> Vec<usize> {
    let mut neighbors = BTreeSet::new();
    for element in 0..num_elements {
        let element_nodes = 2 * element..2 * element + 4;
        if element_nodes.contains(&node) {
            neighbors.extend(element_nodes);
        }
    }
    neighbors.into_iter().collect()
}

proptest! {
    #[test]
    fn banded_rows_are_clamped_bands(num_rows in 1..40usize, k in 0..10usize, block_size in 1..3usize) {
        let store = SparseRowStore::banded(num_rows, num_rows, k, block_size);
        prop_assert_eq!(store.num_rows(), num_rows);
        for i in 0..num_rows {
            let expected: Vec<_> = (i.saturating_sub(k)..=usize::min(num_rows - 1, i + k)).collect();
            prop_assert_eq!(columns(&store, i), expected);

            if num_rows > 2 * k {
                let distance_to_edge = usize::min(i, num_rows - 1 - i);
                let expected_len = 1 + k + usize::min(k, distance_to_edge);
                prop_assert_eq!(store.row(i).unwrap().len(), expected_len);
            }
        }
    }

    #[test]
    fn quad_chain_rows_are_node_neighborhoods(num_elements in 0..15usize, dofs_per_node in 1..3usize) {
        let store = SparseRowStore::quad_chain(num_elements, dofs_per_node, CoefficientFill::Uniform);
        prop_assert_eq!(store.num_rows(), 2 * num_elements + 2);
        for node in 0..store.num_rows() {
            prop_assert_eq!(columns(&store, node), chain_neighbors(num_elements, node));
        }
    }

    #[test]
    fn quad_chain_pattern_is_symmetric(num_elements in 0..15usize) {
        let store = SparseRowStore::quad_chain(num_elements, 1, CoefficientFill::Nonsymmetric);
        for record in store.rows() {
            for &col in record.column_indices() {
                prop_assert!(store.row(col).unwrap().column_indices().contains(&record.global_row()));
            }
        }
    }

    #[test]
    fn rows_are_strictly_increasing(store in any::<SparseRowStore>()) {
        for record in store.rows() {
            prop_assert!(record.column_indices().iter().tuple_windows().all(|(a, b)| a < b));
            let b = store.block_size();
            prop_assert_eq!(record.coefficients().len(), record.len() * b * b);
        }
    }

    #[test]
    fn lookup_finds_exactly_the_stored_blocks(
        pattern in prop_oneof![banded_pattern(12), quad_chain_pattern(6)]
    ) {
        let store = SparseRowStore::from_pattern(&pattern).unwrap();
        let block_len = store.block_size() * store.block_size();
        for record in store.rows() {
            let row = record.global_row();
            for (j, &col) in record.column_indices().iter().enumerate() {
                let expected = &record.coefficients()[j * block_len..(j + 1) * block_len];
                prop_assert_eq!(store.coefs(row, col).unwrap(), expected);
            }
            for col in 0..store.num_cols() + 2 {
                if !record.column_indices().contains(&col) {
                    prop_assert_eq!(store.coefs(row, col), Err(LookupError::ColumnNotFound { row, col }));
                }
            }
        }
        let missing = store.num_rows();
        prop_assert_eq!(store.coefs(missing, 0), Err(LookupError::RowNotFound { row: missing }));
    }
}
