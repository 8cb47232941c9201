#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! This module provides functionality for solving Sudoku puzzles.

/// The `solver` module encodes Sudoku puzzles as exact cover problems and
/// decodes search results back into grids.
pub mod solver;
