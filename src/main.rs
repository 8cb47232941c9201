//! # `dlx_solver`
//!
//! `dlx_solver` is a configurable command-line exact cover solver. It
//! implements Knuth's Algorithm X over a dancing-links sparse matrix and
//! ships a Sudoku front end that encodes puzzles into that form, including
//! a uniqueness check for partially filled grids.
//!
//! ## Features
//!
//! - **Multiple input formats**:
//!   - Sudoku puzzle files (`.sudoku`), singly or as a directory batch
//!   - Exact cover matrices as plain text (one row of column indices per
//!     line)
//! - **Configurable search**: choose the column-selection strategy
//!   (`min-size`, `first`, `random`) and whether to stop at the first
//!   solution or enumerate all of them.
//! - **Uniqueness checking**: `sudoku --unique` reports whether a puzzle
//!   has no, exactly one, or multiple completions.
//! - **Statistics**: parse and search times, decisions, dead ends,
//!   solution counts and memory usage, reported per run.
//! - **Memory management**: uses `tikv-jemallocator` for memory allocation
//!   and usage statistics.
//!
//! ## Usage
//!
//! ```sh
//! # Solve a puzzle file with the default strategy
//! dlx-solver puzzle.sudoku
//!
//! # Check a puzzle for a unique completion
//! dlx-solver sudoku --path puzzle.sudoku --unique
//!
//! # Enumerate every exact cover of a small matrix
//! dlx-solver text --columns 7 --input "2 4 5
//! 0 3 6
//! 1 2 5
//! 0 3
//! 1 6
//! 3 4 6" --all
//!
//! # Solve every .sudoku file under a directory
//! dlx-solver puzzles/
//! ```
//!
//! This file contains the entry point; argument definitions and command
//! handlers live in the `command_line` module.

use clap::Parser;

mod command_line;

use command_line::cli;

/// Global allocator using `tikv-jemallocator` for potentially better
/// performance and memory usage tracking.
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

/// Main entry point of the solver application.
///
/// Parses command-line arguments and dispatches to the appropriate command
/// handler.
fn main() {
    let cli = cli::Cli::parse();
    if let Err(e) = cli::run(cli) {
        eprintln!("{e}");
        std::process::exit(1);
    }
}
