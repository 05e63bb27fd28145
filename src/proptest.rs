//! Strategies for generating matrix data in property-based tests.
use crate::distributed::RowMap;
use crate::pattern::{CoefficientFill, StorePattern};
use crate::store::SparseRowStore;
use ::proptest::prelude::*;

pub fn coefficient_fill() -> impl Strategy<Value = CoefficientFill> {
    prop_oneof![Just(CoefficientFill::Uniform), Just(CoefficientFill::Nonsymmetric)]
}

/// Banded patterns with up to `max_rows` rows and block size at most 3.
pub fn banded_pattern(max_rows: usize) -> impl Strategy<Value = StorePattern> {
    (0..=max_rows, 0..=max_rows / 2 + 2, 1..=3usize).prop_map(|(num_rows, num_off_diagonals, block_size)| {
        StorePattern::Banded {
            num_rows,
            num_cols: num_rows,
            num_off_diagonals,
            block_size,
        }
    })
}

/// Quad chain patterns with up to `max_elements` elements and at most 3 dofs per node.
pub fn quad_chain_pattern(max_elements: usize) -> impl Strategy<Value = StorePattern> {
    (0..=max_elements, 1..=3usize, coefficient_fill()).prop_map(|(num_quad_elements, dofs_per_node, fill)| {
        StorePattern::QuadChain {
            num_quad_elements,
            dofs_per_node,
            fill,
        }
    })
}

pub fn store_pattern() -> impl Strategy<Value = StorePattern> {
    prop_oneof![banded_pattern(20), quad_chain_pattern(10)]
}

impl Arbitrary for SparseRowStore {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_args: Self::Parameters) -> Self::Strategy {
        store_pattern()
            .prop_map(|pattern| {
                SparseRowStore::from_pattern(&pattern).expect("generated patterns have positive block sizes")
            })
            .boxed()
    }
}

/// A store together with the row map of one part of a partition of its point rows.
pub fn store_with_partition() -> impl Strategy<Value = (SparseRowStore, RowMap)> {
    (any::<SparseRowStore>(), 1..=4usize)
        .prop_flat_map(|(store, num_parts)| (Just(store), Just(num_parts), 0..num_parts))
        .prop_map(|(store, num_parts, part)| {
            let num_point_rows = store.num_rows() * store.block_size();
            let map = RowMap::partitioned(num_point_rows, num_parts, part);
            (store, map)
        })
}
