//! Row-distributed sparse matrices.
//!
//! [`DistributedMatrix`] is the interface through which a
//! [`SparseRowStore`](crate::store::SparseRowStore) writes to and compares against a sparse
//! matrix whose rows are owned by several processes. Only the locally owned rows are visible.
//!
//! [`SerialCrsMatrix`] implements the interface within a single process: it owns either all
//! rows, or one part of a deterministic partition described by a [`RowMap`].
use nalgebra_sparse::{CooMatrix, CsrMatrix};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;

/// The set of global rows owned by the local process.
///
/// Deserialization rejects maps whose rows are not strictly increasing or not smaller than the
/// number of global rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RowMapData")]
pub struct RowMap {
    num_global_rows: usize,
    // Sorted and unique
    local_rows: Vec<usize>,
}

/// Unvalidated serialized form of a [`RowMap`].
#[derive(Deserialize)]
struct RowMapData {
    num_global_rows: usize,
    local_rows: Vec<usize>,
}

impl TryFrom<RowMapData> for RowMap {
    type Error = RowMapError;

    fn try_from(data: RowMapData) -> Result<Self, Self::Error> {
        let RowMapData {
            num_global_rows,
            local_rows,
        } = data;
        if let Some(position) = local_rows.windows(2).position(|w| w[0] >= w[1]) {
            return Err(RowMapError::UnsortedRows { position: position + 1 });
        }
        if let Some(&row) = local_rows.last().filter(|&&row| row >= num_global_rows) {
            return Err(RowMapError::RowOutOfBounds { row, num_global_rows });
        }
        Ok(Self {
            num_global_rows,
            local_rows,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum RowMapError {
    /// Owned rows are not strictly increasing at `position`.
    UnsortedRows { position: usize },
    RowOutOfBounds { row: usize, num_global_rows: usize },
}

impl fmt::Display for RowMapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsortedRows { position } => {
                write!(f, "owned rows are not strictly increasing at position {}", position)
            }
            Self::RowOutOfBounds { row, num_global_rows } => write!(
                f,
                "owned row {} is out of bounds for {} global rows",
                row, num_global_rows
            ),
        }
    }
}

impl Error for RowMapError {}

impl RowMap {
    /// A map owning every row.
    pub fn serial(num_global_rows: usize) -> Self {
        Self {
            num_global_rows,
            local_rows: (0..num_global_rows).collect(),
        }
    }

    /// A map owning exactly the given rows.
    ///
    /// # Panics
    ///
    /// Panics if any owned row is not smaller than `num_global_rows`.
    pub fn from_owned(num_global_rows: usize, owned_rows: impl IntoIterator<Item = usize>) -> Self {
        let mut local_rows: Vec<_> = owned_rows.into_iter().collect();
        local_rows.sort_unstable();
        local_rows.dedup();
        assert!(
            local_rows.last().map_or(true, |&row| row < num_global_rows),
            "owned rows must be smaller than the number of global rows"
        );
        Self {
            num_global_rows,
            local_rows,
        }
    }

    /// The rows owned by `part` when `num_global_rows` rows are split into `num_parts`
    /// contiguous blocks whose sizes differ by at most one.
    ///
    /// # Panics
    ///
    /// Panics if `part >= num_parts`.
    pub fn partitioned(num_global_rows: usize, num_parts: usize, part: usize) -> Self {
        assert!(part < num_parts, "part index must be smaller than the number of parts");
        let base = num_global_rows / num_parts;
        let remainder = num_global_rows % num_parts;
        let begin = part * base + part.min(remainder);
        let count = base + usize::from(part < remainder);
        Self {
            num_global_rows,
            local_rows: (begin..begin + count).collect(),
        }
    }

    pub fn num_global_rows(&self) -> usize {
        self.num_global_rows
    }

    pub fn num_local_rows(&self) -> usize {
        self.local_rows.len()
    }

    /// Locally owned global rows, in ascending order.
    pub fn local_rows(&self) -> &[usize] {
        &self.local_rows
    }

    pub fn is_locally_owned(&self, global_row: usize) -> bool {
        self.local_index(global_row).is_some()
    }

    /// Position of `global_row` among the locally owned rows.
    pub fn local_index(&self, global_row: usize) -> Option<usize> {
        self.local_rows.binary_search(&global_row).ok()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum MatrixError {
    RowNotOwned { row: usize },
    ColumnOutOfBounds { row: usize, col: usize },
    /// A replace touched an entry that is not part of the row's structure.
    EntryNotPresent { row: usize, col: usize },
    LengthMismatch { num_indices: usize, num_values: usize },
}

impl fmt::Display for MatrixError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RowNotOwned { row } => write!(f, "row {} is not locally owned", row),
            Self::ColumnOutOfBounds { row, col } => write!(f, "column {} in row {} is out of bounds", col, row),
            Self::EntryNotPresent { row, col } => write!(f, "entry ({}, {}) is not present in the matrix", row, col),
            Self::LengthMismatch {
                num_indices,
                num_values,
            } => write!(f, "got {} column indices but {} values", num_indices, num_values),
        }
    }
}

impl Error for MatrixError {}

/// A sparse matrix whose rows are distributed according to a [`RowMap`].
///
/// All row and column indices are global.
pub trait DistributedMatrix {
    fn row_map(&self) -> &RowMap;

    /// Overwrite existing entries. Fails without modifying the row if any entry is absent.
    fn replace_global_values(&mut self, row: usize, cols: &[usize], values: &[f64]) -> Result<(), MatrixError>;

    /// Add entries, creating them where absent. Values for existing entries are summed.
    fn insert_global_values(&mut self, row: usize, cols: &[usize], values: &[f64]) -> Result<(), MatrixError>;

    /// Copy of the column indices and values of a locally owned row, in no particular order.
    fn extract_global_row_copy(&self, row: usize) -> Result<(Vec<usize>, Vec<f64>), MatrixError>;
}

/// A dynamically growing row-distributed matrix living in a single process.
///
/// Entries are kept in insertion order, so rows are generally not sorted by column.
#[derive(Debug, Clone, PartialEq)]
pub struct SerialCrsMatrix {
    row_map: RowMap,
    num_cols: usize,
    // One (column, value) list per locally owned row
    rows: Vec<Vec<(usize, f64)>>,
}

impl SerialCrsMatrix {
    pub fn new(row_map: RowMap, num_cols: usize) -> Self {
        let rows = vec![Vec::new(); row_map.num_local_rows()];
        Self {
            row_map,
            num_cols,
            rows,
        }
    }

    pub fn num_global_rows(&self) -> usize {
        self.row_map.num_global_rows()
    }

    pub fn num_cols(&self) -> usize {
        self.num_cols
    }

    /// Number of stored entries across all local rows.
    pub fn nnz(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }

    fn checked_local_row(&self, row: usize, cols: &[usize], values: &[f64]) -> Result<usize, MatrixError> {
        if cols.len() != values.len() {
            return Err(MatrixError::LengthMismatch {
                num_indices: cols.len(),
                num_values: values.len(),
            });
        }
        let local = self
            .row_map
            .local_index(row)
            .ok_or(MatrixError::RowNotOwned { row })?;
        if let Some(&col) = cols.iter().find(|&&col| col >= self.num_cols) {
            return Err(MatrixError::ColumnOutOfBounds { row, col });
        }
        Ok(local)
    }

    /// Global row index and entries of every locally owned row.
    pub(crate) fn local_row_entries(&self) -> impl '_ + Iterator<Item = (usize, &[(usize, f64)])> {
        self.row_map
            .local_rows()
            .iter()
            .copied()
            .zip(self.rows.iter().map(Vec::as_slice))
    }

    /// Assemble the local rows into a CSR matrix spanning the full global row space.
    ///
    /// Rows that are not locally owned are empty.
    pub fn to_csr(&self) -> CsrMatrix<f64> {
        let mut coo = CooMatrix::new(self.num_global_rows(), self.num_cols);
        for (row, entries) in self.local_row_entries() {
            for &(col, value) in entries {
                coo.push(row, col, value);
            }
        }
        CsrMatrix::from(&coo)
    }
}

impl DistributedMatrix for SerialCrsMatrix {
    fn row_map(&self) -> &RowMap {
        &self.row_map
    }

    fn replace_global_values(&mut self, row: usize, cols: &[usize], values: &[f64]) -> Result<(), MatrixError> {
        let local = self.checked_local_row(row, cols, values)?;
        let entries = &mut self.rows[local];
        let positions = cols
            .iter()
            .map(|&col| {
                entries
                    .iter()
                    .position(|&(c, _)| c == col)
                    .ok_or(MatrixError::EntryNotPresent { row, col })
            })
            .collect::<Result<Vec<_>, _>>()?;
        for (position, &value) in positions.into_iter().zip(values) {
            entries[position].1 = value;
        }
        Ok(())
    }

    fn insert_global_values(&mut self, row: usize, cols: &[usize], values: &[f64]) -> Result<(), MatrixError> {
        let local = self.checked_local_row(row, cols, values)?;
        let entries = &mut self.rows[local];
        for (&col, &value) in cols.iter().zip(values) {
            match entries.iter_mut().find(|(c, _)| *c == col) {
                Some((_, existing)) => *existing += value,
                None => entries.push((col, value)),
            }
        }
        Ok(())
    }

    fn extract_global_row_copy(&self, row: usize) -> Result<(Vec<usize>, Vec<f64>), MatrixError> {
        let local = self
            .row_map
            .local_index(row)
            .ok_or(MatrixError::RowNotOwned { row })?;
        Ok(self.rows[local].iter().copied().unzip())
    }
}
