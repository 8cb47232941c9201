#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! The sparse boolean matrix behind the exact cover search.
//!
//! The matrix is stored as a single node arena. Links (`left`, `right`, `up`,
//! `down`) are indices into that arena rather than references, which keeps
//! every link and unlink O(1) without any shared-pointer bookkeeping for the
//! cyclic structure. Node 0 is the root sentinel; nodes `1..=width` are the
//! column headers; data nodes follow in row order.
//!
//! Unlinking a node never destroys it: the node keeps its stale links so the
//! exact reverse traversal can splice it back in. That property is what makes
//! [`Matrix::cover`] and [`Matrix::uncover`] exact mirrors of each other and
//! backtracking O(1) per link.

use bit_vec::BitVec;
use rustc_hash::FxHashSet;
use smallvec::SmallVec;
use std::error::Error;
use std::fmt;

/// Index of a node in the matrix arena.
pub type NodeId = usize;

/// Index of a column (constraint), in build order.
pub type ColumnId = usize;

/// Index of an encoded input row, in build order.
pub type RowId = usize;

/// Arena index of the root sentinel.
pub(crate) const ROOT: NodeId = 0;

/// Row value carried by the root and the column headers, which belong to no
/// encoded input row.
const NO_ROW: RowId = usize::MAX;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Node {
    left: NodeId,
    right: NodeId,
    up: NodeId,
    down: NodeId,
    column: ColumnId,
    row: RowId,
}

/// Bookkeeping for one constraint column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    size: usize,
    name: String,
    index: ColumnId,
}

impl Column {
    /// Number of live rows currently linked into this column.
    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// The column's name, as given at construction.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The column's position in build order.
    #[must_use]
    pub const fn index(&self) -> ColumnId {
        self.index
    }
}

/// Errors detected while building a [`Matrix`].
///
/// All of these are raised before any node is linked, so a matrix is never
/// observable in a partially built state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstructionError {
    /// A boolean row's length differs from the number of columns.
    WidthMismatch {
        /// Input row index.
        row: RowId,
        /// Number of columns.
        expected: usize,
        /// Length of the offending row.
        found: usize,
    },
    /// A row has no `true` entry; it can never satisfy a constraint and
    /// indicates a defect in the encoder that produced it.
    EmptyRow {
        /// Input row index.
        row: RowId,
    },
    /// A sparse row references a column outside `0..width`.
    ColumnOutOfRange {
        /// Input row index.
        row: RowId,
        /// The offending column index.
        column: ColumnId,
        /// Number of columns.
        width: usize,
    },
    /// A sparse row references the same column twice.
    DuplicateEntry {
        /// Input row index.
        row: RowId,
        /// The repeated column index.
        column: ColumnId,
    },
}

impl fmt::Display for ConstructionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WidthMismatch {
                row,
                expected,
                found,
            } => write!(
                f,
                "row {row} has {found} entries but the matrix has {expected} columns"
            ),
            Self::EmptyRow { row } => write!(f, "row {row} has no entries"),
            Self::ColumnOutOfRange { row, column, width } => write!(
                f,
                "row {row} references column {column}, outside 0..{width}"
            ),
            Self::DuplicateEntry { row, column } => {
                write!(f, "row {row} references column {column} more than once")
            }
        }
    }
}

impl Error for ConstructionError {}

/// A dancing-links sparse boolean matrix.
///
/// Built once from an encoded problem (columns are constraints, rows are
/// candidate selections), then mutated in place by [`cover`](Matrix::cover)
/// and [`uncover`](Matrix::uncover) during a search, and discarded afterward.
/// A matrix must not be shared between concurrent searches; each search
/// builds its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matrix {
    nodes: Vec<Node>,
    columns: Vec<Column>,
    covered: BitVec,
    row_count: usize,
}

impl Matrix {
    /// Builds a matrix from ordered column names and ordered boolean rows.
    ///
    /// Every row must be exactly `names.len()` bits wide and contain at
    /// least one set bit.
    ///
    /// # Errors
    ///
    /// [`ConstructionError::WidthMismatch`] or
    /// [`ConstructionError::EmptyRow`] if a row violates the input contract.
    pub fn new(names: Vec<String>, rows: &[BitVec]) -> Result<Self, ConstructionError> {
        let width = names.len();
        let mut sparse: Vec<SmallVec<[ColumnId; 8]>> = Vec::with_capacity(rows.len());
        for (row, bits) in rows.iter().enumerate() {
            if bits.len() != width {
                return Err(ConstructionError::WidthMismatch {
                    row,
                    expected: width,
                    found: bits.len(),
                });
            }
            let entries: SmallVec<[ColumnId; 8]> = bits
                .iter()
                .enumerate()
                .filter_map(|(column, set)| set.then_some(column))
                .collect();
            if entries.is_empty() {
                return Err(ConstructionError::EmptyRow { row });
            }
            sparse.push(entries);
        }

        let mut matrix = Self::with_headers(names);
        for (row, entries) in sparse.iter().enumerate() {
            matrix.link_row(row, entries);
        }
        Ok(matrix)
    }

    /// Builds a matrix from ordered column names and rows given as lists of
    /// column indices.
    ///
    /// # Errors
    ///
    /// [`ConstructionError::EmptyRow`],
    /// [`ConstructionError::ColumnOutOfRange`] or
    /// [`ConstructionError::DuplicateEntry`] if a row violates the input
    /// contract.
    pub fn from_sparse(
        names: Vec<String>,
        rows: &[Vec<ColumnId>],
    ) -> Result<Self, ConstructionError> {
        let width = names.len();
        let mut seen = FxHashSet::default();
        for (row, entries) in rows.iter().enumerate() {
            if entries.is_empty() {
                return Err(ConstructionError::EmptyRow { row });
            }
            seen.clear();
            for &column in entries {
                if column >= width {
                    return Err(ConstructionError::ColumnOutOfRange { row, column, width });
                }
                if !seen.insert(column) {
                    return Err(ConstructionError::DuplicateEntry { row, column });
                }
            }
        }

        let mut matrix = Self::with_headers(names);
        for (row, entries) in rows.iter().enumerate() {
            matrix.link_row(row, entries);
        }
        Ok(matrix)
    }

    /// Allocates the root sentinel and one header per column, linked into
    /// the root's circular row list.
    fn with_headers(names: Vec<String>) -> Self {
        let width = names.len();
        let mut nodes = Vec::with_capacity(width + 1);
        nodes.push(Node {
            left: width,
            right: if width == 0 { ROOT } else { 1 },
            up: ROOT,
            down: ROOT,
            column: 0,
            row: NO_ROW,
        });
        for index in 0..width {
            let id = index + 1;
            nodes.push(Node {
                left: id - 1,
                right: if id == width { ROOT } else { id + 1 },
                up: id,
                down: id,
                column: index,
                row: NO_ROW,
            });
        }
        let columns = names
            .into_iter()
            .enumerate()
            .map(|(index, name)| Column {
                size: 0,
                name,
                index,
            })
            .collect();
        Self {
            nodes,
            columns,
            covered: BitVec::from_elem(width, false),
            row_count: 0,
        }
    }

    /// Links one row's nodes into their columns' vertical lists (at the
    /// bottom, preserving input row order top-to-bottom) and into one
    /// horizontal circular list. `entries` must already be validated.
    fn link_row(&mut self, row: RowId, entries: &[ColumnId]) {
        debug_assert!(!entries.is_empty());
        let mut first: Option<NodeId> = None;
        for &column in entries {
            let header = Self::header(column);
            let id = self.nodes.len();
            let up = self.nodes[header].up;
            self.nodes.push(Node {
                left: id,
                right: id,
                up,
                down: header,
                column,
                row,
            });
            self.nodes[up].down = id;
            self.nodes[header].up = id;
            self.columns[column].size += 1;

            if let Some(first) = first {
                let left = self.nodes[first].left;
                self.nodes[id].left = left;
                self.nodes[id].right = first;
                self.nodes[left].right = id;
                self.nodes[first].left = id;
            } else {
                first = Some(id);
            }
        }
        self.row_count += 1;
    }

    /// Arena index of a column's header node.
    pub(crate) const fn header(column: ColumnId) -> NodeId {
        column + 1
    }

    /// Number of columns.
    #[must_use]
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Number of encoded input rows.
    #[must_use]
    pub const fn row_count(&self) -> usize {
        self.row_count
    }

    /// True when no column remains to be satisfied.
    #[must_use]
    pub fn fully_covered(&self) -> bool {
        self.nodes[ROOT].right == ROOT
    }

    /// The leftmost not-yet-covered column, if any.
    #[must_use]
    pub fn first_active(&self) -> Option<&Column> {
        let id = self.nodes[ROOT].right;
        (id != ROOT).then(|| &self.columns[id - 1])
    }

    /// Iterates the not-yet-covered columns in root list order.
    pub fn active_columns(&self) -> impl Iterator<Item = &Column> + '_ {
        std::iter::successors(
            {
                let id = self.nodes[ROOT].right;
                (id != ROOT).then_some(id)
            },
            move |&id| {
                let next = self.nodes[id].right;
                (next != ROOT).then_some(next)
            },
        )
        .map(move |id| &self.columns[id - 1])
    }

    /// Bookkeeping for one column, covered or not.
    #[must_use]
    pub fn column(&self, column: ColumnId) -> &Column {
        &self.columns[column]
    }

    pub(crate) fn down(&self, node: NodeId) -> NodeId {
        self.nodes[node].down
    }

    pub(crate) fn right(&self, node: NodeId) -> NodeId {
        self.nodes[node].right
    }

    pub(crate) fn left(&self, node: NodeId) -> NodeId {
        self.nodes[node].left
    }

    pub(crate) fn node_column(&self, node: NodeId) -> ColumnId {
        self.nodes[node].column
    }

    pub(crate) fn node_row(&self, node: NodeId) -> RowId {
        self.nodes[node].row
    }

    /// Removes a column from the root list and unlinks every row in that
    /// column from all other columns those rows touch.
    ///
    /// The covered column's own vertical list is left intact, and unlinked
    /// nodes keep their stale links, so [`uncover`](Matrix::uncover) can
    /// restore everything by walking in the exact reverse order.
    pub fn cover(&mut self, column: ColumnId) {
        debug_assert!(
            !self.covered[column],
            "cover of an already covered column {column}"
        );
        self.covered.set(column, true);

        let header = Self::header(column);
        let left = self.nodes[header].left;
        let right = self.nodes[header].right;
        self.nodes[left].right = right;
        self.nodes[right].left = left;

        let mut row_node = self.nodes[header].down;
        while row_node != header {
            let mut node = self.nodes[row_node].right;
            while node != row_node {
                let up = self.nodes[node].up;
                let down = self.nodes[node].down;
                self.nodes[up].down = down;
                self.nodes[down].up = up;
                self.columns[self.nodes[node].column].size -= 1;
                node = self.nodes[node].right;
            }
            row_node = self.nodes[row_node].down;
        }
    }

    /// Exact mirror of [`cover`](Matrix::cover): relinks every node the
    /// cover removed, traversing bottom-to-top and right-to-left so each
    /// node's stale links are still valid when it is spliced back in, then
    /// reinserts the header into the root list.
    pub fn uncover(&mut self, column: ColumnId) {
        debug_assert!(
            self.covered[column],
            "uncover of a column {column} that is not covered"
        );

        let header = Self::header(column);
        let mut row_node = self.nodes[header].up;
        while row_node != header {
            let mut node = self.nodes[row_node].left;
            while node != row_node {
                self.columns[self.nodes[node].column].size += 1;
                let up = self.nodes[node].up;
                let down = self.nodes[node].down;
                self.nodes[up].down = node;
                self.nodes[down].up = node;
                node = self.nodes[node].left;
            }
            row_node = self.nodes[row_node].up;
        }

        let left = self.nodes[header].left;
        let right = self.nodes[header].right;
        self.nodes[left].right = header;
        self.nodes[right].left = header;
        self.covered.set(column, false);
    }

    /// Walks the live structure and asserts its consistency: the root list
    /// matches the covered flags, every live link pair agrees in both
    /// directions, and every live column's size equals its actual row count.
    ///
    /// Intended for tests and debugging; the search itself never calls this.
    ///
    /// # Panics
    ///
    /// If any of the structural invariants has been violated.
    pub fn assert_invariants(&self) {
        let mut live = BitVec::from_elem(self.width(), false);
        let mut prev = ROOT;
        let mut id = self.nodes[ROOT].right;
        while id != ROOT {
            assert!(
                id >= 1 && id <= self.width(),
                "root list reached non-header node {id}"
            );
            assert_eq!(self.nodes[id].left, prev, "header {id} has a bad left link");
            live.set(id - 1, true);
            prev = id;
            id = self.nodes[id].right;
        }
        assert_eq!(self.nodes[ROOT].left, prev, "root has a bad left link");

        for column in 0..self.width() {
            assert_eq!(
                live[column], !self.covered[column],
                "root list disagrees with the covered flag of column {column}"
            );
            if self.covered[column] {
                continue;
            }
            let header = Self::header(column);
            let mut count = 0;
            let mut prev = header;
            let mut node = self.nodes[header].down;
            while node != header {
                assert_eq!(
                    self.nodes[node].up, prev,
                    "node {node} has a bad up link in column {column}"
                );
                assert_eq!(
                    self.nodes[node].column, column,
                    "node {node} is linked into the wrong column"
                );
                let right = self.nodes[node].right;
                let left = self.nodes[node].left;
                assert_eq!(self.nodes[right].left, node, "node {node} has a bad right link");
                assert_eq!(self.nodes[left].right, node, "node {node} has a bad left link");
                count += 1;
                prev = node;
                node = self.nodes[node].down;
            }
            assert_eq!(
                self.nodes[header].up, prev,
                "header of column {column} has a bad up link"
            );
            assert_eq!(
                count,
                self.columns[column].size,
                "size of column {column} drifted from its live row count"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(names: &[&str]) -> Vec<String> {
        names.iter().map(ToString::to_string).collect()
    }

    fn bits(width: usize, set: &[usize]) -> BitVec {
        let mut row = BitVec::from_elem(width, false);
        for &column in set {
            row.set(column, true);
        }
        row
    }

    #[test]
    fn builds_from_boolean_rows() {
        let rows = [bits(3, &[0, 2]), bits(3, &[1]), bits(3, &[0, 1, 2])];
        let matrix = Matrix::new(names(&["a", "b", "c"]), &rows).unwrap();

        assert_eq!(matrix.width(), 3);
        assert_eq!(matrix.row_count(), 3);
        assert_eq!(matrix.column(0).size(), 2);
        assert_eq!(matrix.column(1).size(), 2);
        assert_eq!(matrix.column(2).size(), 2);
        assert_eq!(matrix.column(1).name(), "b");
        matrix.assert_invariants();
    }

    #[test]
    fn builds_with_zero_columns() {
        let matrix = Matrix::new(Vec::new(), &[]).unwrap();
        assert!(matrix.fully_covered());
        assert_eq!(matrix.width(), 0);
        matrix.assert_invariants();
    }

    #[test]
    fn rejects_width_mismatch() {
        let err = Matrix::new(names(&["a", "b"]), &[bits(3, &[0])]).unwrap_err();
        assert_eq!(
            err,
            ConstructionError::WidthMismatch {
                row: 0,
                expected: 2,
                found: 3
            }
        );
    }

    #[test]
    fn rejects_empty_row() {
        let rows = [bits(2, &[0]), bits(2, &[])];
        let err = Matrix::new(names(&["a", "b"]), &rows).unwrap_err();
        assert_eq!(err, ConstructionError::EmptyRow { row: 1 });
    }

    #[test]
    fn rejects_sparse_column_out_of_range() {
        let err = Matrix::from_sparse(names(&["a", "b"]), &[vec![0, 2]]).unwrap_err();
        assert_eq!(
            err,
            ConstructionError::ColumnOutOfRange {
                row: 0,
                column: 2,
                width: 2
            }
        );
    }

    #[test]
    fn rejects_sparse_duplicate_entry() {
        let err = Matrix::from_sparse(names(&["a", "b"]), &[vec![1, 0, 1]]).unwrap_err();
        assert_eq!(err, ConstructionError::DuplicateEntry { row: 0, column: 1 });
    }

    #[test]
    fn cover_unlinks_column_and_conflicting_rows() {
        // r0 = {a, c}, r1 = {b}, r2 = {a, b}
        let rows = [vec![0, 2], vec![1], vec![0, 1]];
        let mut matrix = Matrix::from_sparse(names(&["a", "b", "c"]), &rows).unwrap();

        matrix.cover(0);
        matrix.assert_invariants();

        let active: Vec<_> = matrix.active_columns().map(Column::index).collect();
        assert_eq!(active, vec![1, 2]);
        // r0 and r2 are gone: column c lost r0, column b lost r2.
        assert_eq!(matrix.column(2).size(), 0);
        assert_eq!(matrix.column(1).size(), 1);
    }

    #[test]
    fn cover_then_uncover_restores_every_link_and_size() {
        let rows = [vec![0, 2], vec![1], vec![0, 1], vec![1, 2]];
        let mut matrix = Matrix::from_sparse(names(&["a", "b", "c"]), &rows).unwrap();
        let snapshot = matrix.clone();

        for column in 0..matrix.width() {
            matrix.cover(column);
            matrix.uncover(column);
            assert_eq!(matrix, snapshot, "cover/uncover of {column} is not a no-op");
            matrix.assert_invariants();
        }
    }

    #[test]
    fn nested_cover_uncover_restores_in_lifo_order() {
        let rows = [vec![0, 2], vec![1], vec![0, 1], vec![1, 2]];
        let mut matrix = Matrix::from_sparse(names(&["a", "b", "c"]), &rows).unwrap();
        let snapshot = matrix.clone();

        matrix.cover(0);
        matrix.cover(1);
        matrix.cover(2);
        assert!(matrix.fully_covered());
        matrix.uncover(2);
        matrix.uncover(1);
        matrix.uncover(0);
        assert_eq!(matrix, snapshot);
    }

    #[test]
    fn active_columns_follow_root_order_after_mutation() {
        let rows = [vec![0], vec![1], vec![2]];
        let mut matrix = Matrix::from_sparse(names(&["a", "b", "c"]), &rows).unwrap();

        matrix.cover(1);
        let active: Vec<_> = matrix.active_columns().map(Column::index).collect();
        assert_eq!(active, vec![0, 2]);
        assert_eq!(matrix.first_active().unwrap().index(), 0);

        matrix.uncover(1);
        let active: Vec<_> = matrix.active_columns().map(Column::index).collect();
        assert_eq!(active, vec![0, 1, 2]);
    }
}
