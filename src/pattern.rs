//! Declarative descriptions of matrix data patterns.
//!
//! A [`StorePattern`] can be deserialized, for example from a JSON test fixture, and turned
//! into a store with [`SparseRowStore::from_pattern`]:
//!
//! ```
//! use matrix_data::pattern::StorePattern;
//! use matrix_data::store::SparseRowStore;
//!
//! let json = r#"{ "QuadChain": { "num_quad_elements": 3, "dofs_per_node": 2, "fill": "Nonsymmetric" } }"#;
//! let pattern: StorePattern = serde_json::from_str(json).unwrap();
//! let store = SparseRowStore::from_pattern(&pattern).unwrap();
//! assert_eq!(store.num_rows(), 8);
//! ```
use crate::error::PatternError;
use crate::store::SparseRowStore;
use serde::{Deserialize, Serialize};

/// How coefficients of mesh-derived patterns are initialized.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CoefficientFill {
    /// Every coefficient is `1.0`.
    #[default]
    Uniform,
    /// The coefficient at flattened position `j` within a row is `j + 1`.
    ///
    /// Makes transposed or reordered entries distinguishable.
    Nonsymmetric,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorePattern {
    Banded {
        num_rows: usize,
        num_cols: usize,
        num_off_diagonals: usize,
        #[serde(default = "default_block_size")]
        block_size: usize,
    },
    QuadChain {
        num_quad_elements: usize,
        #[serde(default = "default_block_size")]
        dofs_per_node: usize,
        #[serde(default)]
        fill: CoefficientFill,
    },
}

fn default_block_size() -> usize {
    1
}

impl SparseRowStore {
    /// Builds the store described by `pattern`.
    pub fn from_pattern(pattern: &StorePattern) -> Result<Self, PatternError> {
        match *pattern {
            StorePattern::Banded {
                num_rows,
                num_cols,
                num_off_diagonals,
                block_size,
            } => {
                if block_size == 0 {
                    return Err(PatternError::ZeroBlockSize);
                }
                Ok(Self::banded(num_rows, num_cols, num_off_diagonals, block_size))
            }
            StorePattern::QuadChain {
                num_quad_elements,
                dofs_per_node,
                fill,
            } => {
                if dofs_per_node == 0 {
                    return Err(PatternError::ZeroBlockSize);
                }
                Ok(Self::quad_chain(num_quad_elements, dofs_per_node, fill))
            }
        }
    }
}
