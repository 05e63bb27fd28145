//! Block sparse test matrices stored row by row.
//!
//! A [`SparseRowStore`] holds one [`RowRecord`] per matrix row. Each record owns a strictly
//! increasing list of (block) column indices and a dense `b x b` block of coefficients per
//! column, stored row-major, where `b` is the block size of the store.
//!
//! Stores are built from one of a few structured patterns:
//!
//! - [`SparseRowStore::banded`]: a symmetric band around the diagonal,
//! - [`SparseRowStore::quad_chain`]: the node adjacency of a chain of quadrilateral elements,
//! - [`SparseRowStore::skeleton`]: rows of given lengths whose structure is filled in by the
//!   caller before being turned into a store.
//!
//! After construction only coefficient values may be modified.
//!
//! When exchanging data with a [`DistributedMatrix`], blocks are expanded into point entries:
//! local row `a` of block row `i` is point row `i * b + a`, local column `l` of block column `c`
//! is point column `c * b + l`.
use crate::distributed::{DistributedMatrix, MatrixError};
use crate::error::{LookupError, PatternError};
use crate::mesh::QuadChain;
use crate::pattern::CoefficientFill;
use eyre::WrapErr;
use itertools::Itertools;
use nalgebra::DMatrix;
use std::fmt;

/// A single row of a [`SparseRowStore`].
#[derive(Debug, Clone, PartialEq)]
pub struct RowRecord {
    global_row: usize,
    column_indices: Vec<usize>,
    coefficients: Vec<f64>,
}

impl RowRecord {
    pub fn global_row(&self) -> usize {
        self.global_row
    }

    pub fn column_indices(&self) -> &[usize] {
        &self.column_indices
    }

    /// Coefficient blocks, one `b x b` block per column index.
    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    /// Number of (block) entries in the row.
    pub fn len(&self) -> usize {
        self.column_indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.column_indices.is_empty()
    }

    /// Point entries `(column, value)` of block-local row `local_row`, by ascending column.
    fn point_entries(&self, block_size: usize, local_row: usize) -> impl '_ + Iterator<Item = (usize, f64)> {
        let b = block_size;
        self.column_indices
            .iter()
            .zip(self.coefficients.chunks_exact(b * b))
            .flat_map(move |(&col, block)| (0..b).map(move |l| (col * b + l, block[local_row * b + l])))
    }
}

/// Inserts `col` at its sorted position unless already present.
fn insert_sorted(indices: &mut Vec<usize>, col: usize) -> bool {
    match indices.binary_search(&col) {
        Ok(_) => false,
        Err(position) => {
            indices.insert(position, col);
            true
        }
    }
}

/// Synthetic block sparse matrix data with sorted rows.
#[derive(Debug, Clone, PartialEq)]
pub struct SparseRowStore {
    block_size: usize,
    num_cols: usize,
    // Sorted by global row
    rows: Vec<RowRecord>,
}

impl SparseRowStore {
    /// Rows with `row_lengths[i]` placeholder entries each, to be filled in by the caller.
    ///
    /// Every column index is initially `0` and every coefficient `0.0`.
    ///
    /// # Panics
    ///
    /// Panics if `block_size` is zero.
    pub fn skeleton(row_lengths: &[usize], block_size: usize) -> RowStoreSkeleton {
        assert!(block_size > 0, "block size must be positive");
        let block_len = block_size * block_size;
        let rows = row_lengths
            .iter()
            .enumerate()
            .map(|(i, &len)| RowRecord {
                global_row: i,
                column_indices: vec![0; len],
                coefficients: vec![0.0; len * block_len],
            })
            .collect();
        RowStoreSkeleton { block_size, rows }
    }

    /// A band matrix with `num_off_diagonals` entries on each side of the diagonal.
    ///
    /// Row `i` holds the consecutive columns `i - k ..= i + k`, truncated to `0 .. num_rows`,
    /// with `k = num_off_diagonals`. All coefficients are `1.0`. The number of columns is
    /// recorded but does not influence the structure.
    ///
    /// # Panics
    ///
    /// Panics if `block_size` is zero.
    pub fn banded(num_rows: usize, num_cols: usize, num_off_diagonals: usize, block_size: usize) -> Self {
        assert!(block_size > 0, "block size must be positive");
        let block_len = block_size * block_size;
        let rows = (0..num_rows)
            .map(|i| {
                let first = i.saturating_sub(num_off_diagonals);
                let last = i.saturating_add(num_off_diagonals).min(num_rows - 1);
                let column_indices: Vec<_> = (first..=last).collect();
                let coefficients = vec![1.0; column_indices.len() * block_len];
                RowRecord {
                    global_row: i,
                    column_indices,
                    coefficients,
                }
            })
            .collect();

        let store = Self {
            block_size,
            num_cols,
            rows,
        };
        log::debug!(
            "built banded matrix data: {} rows, {} off-diagonals, {} block entries",
            num_rows,
            num_off_diagonals,
            store.nnz()
        );
        store
    }

    /// The node adjacency pattern of a chain of `num_quad_elements` quadrilaterals.
    ///
    /// Rows correspond to the `2 * num_quad_elements + 2` nodes of the [`QuadChain`], and
    /// column `k` is present in row `j` whenever nodes `j` and `k` share an element (including
    /// `j == k`). Each node carries `dofs_per_node` degrees of freedom, which becomes the block
    /// size.
    ///
    /// # Panics
    ///
    /// Panics if `dofs_per_node` is zero.
    pub fn quad_chain(num_quad_elements: usize, dofs_per_node: usize, fill: CoefficientFill) -> Self {
        assert!(dofs_per_node > 0, "degrees of freedom per node must be positive");
        let chain = QuadChain::new(num_quad_elements);

        let mut columns = vec![Vec::new(); chain.num_nodes()];
        for element in 0..chain.num_elements() {
            let nodes = chain.element_nodes(element);
            for &node_j in &nodes {
                for &node_k in &nodes {
                    insert_sorted(&mut columns[node_j], node_k);
                }
            }
        }

        let block_len = dofs_per_node * dofs_per_node;
        let rows = columns
            .into_iter()
            .enumerate()
            .map(|(node, column_indices)| {
                let len = column_indices.len() * block_len;
                let coefficients = match fill {
                    CoefficientFill::Uniform => vec![1.0; len],
                    CoefficientFill::Nonsymmetric => (1..=len).map(|j| j as f64).collect(),
                };
                RowRecord {
                    global_row: node,
                    column_indices,
                    coefficients,
                }
            })
            .collect();

        let store = Self {
            block_size: dofs_per_node,
            num_cols: chain.num_nodes(),
            rows,
        };
        log::debug!(
            "built quad chain matrix data: {} elements, {} rows, {} block entries",
            num_quad_elements,
            store.num_rows(),
            store.nnz()
        );
        store
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Number of block columns.
    ///
    /// This is the number of columns given at construction, or one past the largest column
    /// index in the store if that is larger.
    pub fn num_cols(&self) -> usize {
        let max_col = self
            .rows
            .iter()
            .filter_map(|record| record.column_indices.last())
            .max();
        max_col.map_or(self.num_cols, |&col| self.num_cols.max(col + 1))
    }

    /// Number of stored blocks.
    pub fn nnz(&self) -> usize {
        self.rows.iter().map(RowRecord::len).sum()
    }

    pub fn rows(&self) -> &[RowRecord] {
        &self.rows
    }

    /// The row with the given global row index.
    pub fn row(&self, global_row: usize) -> Option<&RowRecord> {
        self.row_position(global_row).map(|idx| &self.rows[idx])
    }

    fn row_position(&self, global_row: usize) -> Option<usize> {
        self.rows
            .binary_search_by_key(&global_row, |record| record.global_row)
            .ok()
    }

    /// One past the largest global row.
    pub(crate) fn num_global_rows(&self) -> usize {
        self.rows.last().map_or(0, |record| record.global_row + 1)
    }

    fn locate(&self, row: usize, col: usize) -> Result<(usize, usize), LookupError> {
        let row_idx = self
            .row_position(row)
            .ok_or(LookupError::RowNotFound { row })?;
        let col_idx = self.rows[row_idx]
            .column_indices
            .binary_search(&col)
            .map_err(|_| LookupError::ColumnNotFound { row, col })?;
        Ok((row_idx, col_idx))
    }

    /// The `b x b` coefficient block (row-major) at the given block row and column.
    pub fn coefs(&self, row: usize, col: usize) -> Result<&[f64], LookupError> {
        let (row_idx, col_idx) = self.locate(row, col)?;
        let block_len = self.block_size * self.block_size;
        let offset = col_idx * block_len;
        Ok(&self.rows[row_idx].coefficients[offset..offset + block_len])
    }

    /// Mutable access to the coefficient block at the given block row and column.
    pub fn coefs_mut(&mut self, row: usize, col: usize) -> Result<&mut [f64], LookupError> {
        let (row_idx, col_idx) = self.locate(row, col)?;
        let block_len = self.block_size * self.block_size;
        let offset = col_idx * block_len;
        Ok(&mut self.rows[row_idx].coefficients[offset..offset + block_len])
    }

    /// Point entries of the given point row, by ascending column.
    pub(crate) fn point_row(&self, point_row: usize) -> Option<impl '_ + Iterator<Item = (usize, f64)>> {
        let b = self.block_size;
        self.row(point_row / b)
            .map(|record| record.point_entries(b, point_row % b))
    }

    /// Point-wise dense representation.
    pub fn to_dense(&self) -> DMatrix<f64> {
        let b = self.block_size;
        let mut dense = DMatrix::zeros(self.num_global_rows() * b, self.num_cols() * b);
        for point_row in 0..dense.nrows() {
            for (col, value) in self.point_row(point_row).into_iter().flatten() {
                dense[(point_row, col)] = value;
            }
        }
        dense
    }

    /// Writes every locally owned point row of `target`.
    ///
    /// Existing entries are overwritten. If a row of the target lacks some of the entries,
    /// the values are inserted instead, so the target may be either empty or pre-structured.
    pub fn copy_local_data_to_matrix<M>(&self, target: &mut M) -> eyre::Result<()>
    where
        M: ?Sized + DistributedMatrix,
    {
        let b = self.block_size;
        let mut num_replaced = 0;
        let mut num_inserted = 0;
        for record in &self.rows {
            for local_row in 0..b {
                let point_row = record.global_row * b + local_row;
                if !target.row_map().is_locally_owned(point_row) {
                    continue;
                }

                let (cols, values): (Vec<_>, Vec<_>) = record.point_entries(b, local_row).unzip();
                if target
                    .replace_global_values(point_row, &cols, &values)
                    .is_ok()
                {
                    num_replaced += 1;
                } else {
                    target
                        .insert_global_values(point_row, &cols, &values)
                        .wrap_err_with(|| format!("failed to insert row {} into target matrix", point_row))?;
                    num_inserted += 1;
                }
            }
        }
        log::debug!(
            "copied matrix data to target: {} rows replaced, {} rows inserted",
            num_replaced,
            num_inserted
        );
        Ok(())
    }

    /// Finds the first locally owned row of `source` that differs from this store.
    ///
    /// Rows are visited in the order given by the row map of `source`. Columns of the
    /// extracted rows are sorted before comparison, and values must be bitwise equal.
    pub fn find_local_mismatch<M>(&self, source: &M) -> Option<Mismatch>
    where
        M: ?Sized + DistributedMatrix,
    {
        let b = self.block_size;
        for &row in source.row_map().local_rows() {
            let Some(record) = self.row(row / b) else {
                return Some(Mismatch::MissingRow { row });
            };
            let (cols, values) = match source.extract_global_row_copy(row) {
                Ok(extracted) => extracted,
                Err(error) => return Some(Mismatch::Unreadable { row, error }),
            };
            if cols.len() != values.len() {
                return Some(Mismatch::MalformedRow {
                    row,
                    num_indices: cols.len(),
                    num_values: values.len(),
                });
            }

            let expected_len = record.len() * b;
            if cols.len() != expected_len {
                return Some(Mismatch::RowLength {
                    row,
                    expected: expected_len,
                    actual: cols.len(),
                });
            }

            let actual = cols
                .into_iter()
                .zip(values)
                .sorted_by_key(|&(col, _)| col);
            let expected = record.point_entries(b, row % b);
            for (position, ((col, value), (expected_col, expected_value))) in actual.zip(expected).enumerate() {
                if col != expected_col {
                    return Some(Mismatch::ColumnIndex {
                        row,
                        position,
                        expected: expected_col,
                        actual: col,
                    });
                }
                if value != expected_value {
                    return Some(Mismatch::Value {
                        row,
                        col,
                        expected: expected_value,
                        actual: value,
                    });
                }
            }
        }
        None
    }

    /// Whether every locally owned row of `source` matches this store exactly.
    pub fn compare_local_data<M>(&self, source: &M) -> bool
    where
        M: ?Sized + DistributedMatrix,
    {
        match self.find_local_mismatch(source) {
            Some(mismatch) => {
                log::debug!("matrix data differs from distributed matrix: {}", mismatch);
                false
            }
            None => true,
        }
    }
}

/// Rows of a [`SparseRowStore`] under construction.
///
/// Produced by [`SparseRowStore::skeleton`]. The column indices are placeholders until filled
/// in through [`RowStoreSkeleton::row_mut`].
#[derive(Debug, Clone, PartialEq)]
pub struct RowStoreSkeleton {
    block_size: usize,
    rows: Vec<RowRecord>,
}

impl RowStoreSkeleton {
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Column indices and coefficient blocks of row `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i` is out of bounds.
    pub fn row_mut(&mut self, i: usize) -> (&mut [usize], &mut [f64]) {
        let record = &mut self.rows[i];
        (record.column_indices.as_mut_slice(), record.coefficients.as_mut_slice())
    }

    /// Validates that every row is strictly increasing and produces the store.
    pub fn finish(self) -> Result<SparseRowStore, PatternError> {
        for record in &self.rows {
            let unsorted = record
                .column_indices
                .iter()
                .tuple_windows()
                .position(|(prev, next)| prev >= next);
            if let Some(position) = unsorted {
                return Err(PatternError::UnsortedColumns {
                    row: record.global_row,
                    position: position + 1,
                });
            }
        }
        Ok(SparseRowStore {
            block_size: self.block_size,
            num_cols: 0,
            rows: self.rows,
        })
    }

    /// The rows as they are, without any validation.
    pub fn into_rows_unchecked(self) -> Vec<RowRecord> {
        self.rows
    }
}

/// The first difference found by [`SparseRowStore::find_local_mismatch`].
#[derive(Debug, Clone, PartialEq)]
pub enum Mismatch {
    /// The source owns a row which the store does not have.
    MissingRow { row: usize },
    RowLength { row: usize, expected: usize, actual: usize },
    ColumnIndex { row: usize, position: usize, expected: usize, actual: usize },
    Value { row: usize, col: usize, expected: f64, actual: f64 },
    /// The source failed to extract a row it claims to own.
    Unreadable { row: usize, error: MatrixError },
    /// The extracted row has a different number of column indices and values.
    MalformedRow { row: usize, num_indices: usize, num_values: usize },
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingRow { row } => write!(f, "row {} is not present in matrix data", row),
            Self::RowLength { row, expected, actual } => {
                write!(f, "row {} has {} entries, expected {}", row, actual, expected)
            }
            Self::ColumnIndex {
                row,
                position,
                expected,
                actual,
            } => write!(
                f,
                "row {} has column {} at position {}, expected {}",
                row, actual, position, expected
            ),
            Self::Value {
                row,
                col,
                expected,
                actual,
            } => write!(f, "entry ({}, {}) is {:e}, expected {:e}", row, col, actual, expected),
            Self::Unreadable { row, error } => write!(f, "failed to extract row {}: {}", row, error),
            Self::MalformedRow {
                row,
                num_indices,
                num_values,
            } => write!(
                f,
                "extracted row {} has {} column indices but {} values",
                row, num_indices, num_values
            ),
        }
    }
}
