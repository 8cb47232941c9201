#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Strategies for choosing the next column to branch on.
//!
//! The search asks a [`ColumnSelection`] for a column on every descent, so
//! the strategy is what shapes the search tree. This module provides:
//! - [`MinSize`]: the first active column of minimal live-row count. The
//!   standard choice; it minimizes the branching factor.
//! - [`FirstActive`]: the leftmost active column, unconditionally. Fully
//!   deterministic in build order, useful for reproducing a fixed reference
//!   search order.
//! - [`Uniform`]: a uniformly random active column from an injected, seeded
//!   random source. Used by generator-style callers that want diverse
//!   solutions rather than the fastest search.
//!
//! A strategy may keep its own mutable state (e.g. a random generator), but
//! it must never mutate the matrix; the signature enforces that.

use crate::dlx::matrix::{Column, ColumnId, Matrix};
use smallvec::SmallVec;

/// Picks the column the search branches on next.
pub trait ColumnSelection {
    /// Returns the chosen column's index.
    ///
    /// Callers guarantee at least one active column; implementations may
    /// panic otherwise.
    fn choose(&mut self, matrix: &Matrix) -> ColumnId;
}

/// Chooses the first active column with the smallest live-row count,
/// breaking ties left-to-right.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MinSize;

impl ColumnSelection for MinSize {
    fn choose(&mut self, matrix: &Matrix) -> ColumnId {
        let mut best: Option<&Column> = None;
        for column in matrix.active_columns() {
            match best {
                Some(b) if column.size() >= b.size() => {}
                _ => best = Some(column),
            }
        }
        best.expect("choose called on a fully covered matrix").index()
    }
}

/// Chooses the leftmost active column, regardless of size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FirstActive;

impl ColumnSelection for FirstActive {
    fn choose(&mut self, matrix: &Matrix) -> ColumnId {
        matrix
            .first_active()
            .expect("choose called on a fully covered matrix")
            .index()
    }
}

/// Chooses a uniformly random active column.
///
/// The random source is seeded at construction, so two searches built with
/// the same seed over the same input walk identical trees.
#[derive(Debug, Clone)]
pub struct Uniform {
    rng: fastrand::Rng,
}

impl Uniform {
    /// Creates a selector with a fixed seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: fastrand::Rng::with_seed(seed),
        }
    }
}

impl ColumnSelection for Uniform {
    fn choose(&mut self, matrix: &Matrix) -> ColumnId {
        let active: SmallVec<[ColumnId; 32]> =
            matrix.active_columns().map(Column::index).collect();
        assert!(!active.is_empty(), "choose called on a fully covered matrix");
        active[self.rng.usize(..active.len())]
    }
}

/// Runtime-selected strategy, for callers (such as the CLI) that pick a
/// strategy from configuration rather than at compile time.
#[derive(Debug, Clone)]
pub enum ColumnSelectionImpls {
    /// See [`MinSize`].
    MinSize(MinSize),
    /// See [`FirstActive`].
    FirstActive(FirstActive),
    /// See [`Uniform`].
    Uniform(Uniform),
}

impl ColumnSelection for ColumnSelectionImpls {
    fn choose(&mut self, matrix: &Matrix) -> ColumnId {
        match self {
            Self::MinSize(s) => s.choose(matrix),
            Self::FirstActive(s) => s.choose(matrix),
            Self::Uniform(s) => s.choose(matrix),
        }
    }
}
