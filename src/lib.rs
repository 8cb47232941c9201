#![deny(missing_docs)]
//! This crate solves exact cover problems with Knuth's Algorithm X over a
//! dancing-links sparse matrix, and applies it to Sudoku puzzles.

/// The `dlx` module implements the exact cover core: the dancing-links
/// matrix, the backtracking search, and the pluggable column-selection
/// strategies and solution sinks that drive it.
pub mod dlx;

/// The `sudoku` module encodes Sudoku puzzles as exact cover problems, used
/// among other things to decide whether a partially filled grid has a unique
/// completion.
pub mod sudoku;
