#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! The backtracking search over a covered matrix.
//!
//! This is Knuth's Algorithm X: repeatedly pick an unsatisfied constraint
//! column, cover it, try each of its candidate rows in turn (covering the
//! other columns that row satisfies), recurse, and undo everything in exact
//! reverse order on the way back out. The dancing-links matrix makes every
//! one of those undo steps O(1).
//!
//! The engine is deliberately policy-free. Which column to branch on comes
//! from an injected [`ColumnSelection`]; what happens to each discovered
//! solution (and whether the search keeps going) is decided by the injected
//! [`SolutionSink`]. Early exit is a return value threaded back through the
//! recursion, so the unwind discipline is identical whether the search
//! backtracked or was stopped: every cover performed on the current path is
//! undone before `run` returns, leaving the matrix exactly as built.

use crate::dlx::column_selection::{ColumnSelection, MinSize};
use crate::dlx::matrix::{Matrix, NodeId, RowId};
use crate::dlx::sink::{CountSolutions, FirstSolution, SearchFlow, SolutionSink};

/// Counters accumulated over one [`Search::run`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// Candidate rows tried across the whole search.
    pub decisions: usize,
    /// Solutions handed to the sink.
    pub solutions: usize,
    /// Times a chosen column had no live rows, pruning that branch.
    pub dead_ends: usize,
    /// Deepest recursion reached (equals constraints satisfied on that path).
    pub max_depth: usize,
}

/// One search over one matrix.
///
/// The engine borrows the matrix exclusively for the duration of the run;
/// concurrent searches must each build their own matrix.
#[derive(Debug)]
pub struct Search<'a, C> {
    matrix: &'a mut Matrix,
    selector: C,
    solution: Vec<NodeId>,
    stats: SearchStats,
}

impl<'a, C: ColumnSelection> Search<'a, C> {
    /// Creates a search over `matrix` branching via `selector`.
    pub fn new(matrix: &'a mut Matrix, selector: C) -> Self {
        Self {
            matrix,
            selector,
            solution: Vec::new(),
            stats: SearchStats::default(),
        }
    }

    /// Runs the search to completion (or until the sink stops it) and
    /// returns the accumulated counters.
    ///
    /// When this returns, the matrix has been restored to its as-built
    /// state regardless of how the search ended.
    pub fn run<S: SolutionSink>(&mut self, sink: &mut S) -> SearchStats {
        self.solution.clear();
        self.stats = SearchStats::default();
        self.search(0, sink);
        self.stats
    }

    fn search<S: SolutionSink>(&mut self, depth: usize, sink: &mut S) -> SearchFlow {
        self.stats.max_depth = self.stats.max_depth.max(depth);

        if self.matrix.fully_covered() {
            self.stats.solutions += 1;
            let rows: Vec<RowId> = self
                .solution
                .iter()
                .map(|&node| self.matrix.node_row(node))
                .collect();
            return sink.on_solution(&rows);
        }

        let column = self.selector.choose(self.matrix);
        self.matrix.cover(column);

        let header = Matrix::header(column);
        let mut tried_any = false;
        let mut flow = SearchFlow::Continue;
        let mut row_node = self.matrix.down(header);
        while row_node != header {
            tried_any = true;
            self.stats.decisions += 1;
            self.solution.push(row_node);

            let mut node = self.matrix.right(row_node);
            while node != row_node {
                self.matrix.cover(self.matrix.node_column(node));
                node = self.matrix.right(node);
            }

            flow = self.search(depth + 1, sink);

            let mut node = self.matrix.left(row_node);
            while node != row_node {
                self.matrix.uncover(self.matrix.node_column(node));
                node = self.matrix.left(node);
            }
            self.solution.pop();

            if flow == SearchFlow::Stop {
                break;
            }
            row_node = self.matrix.down(row_node);
        }

        if !tried_any {
            self.stats.dead_ends += 1;
        }
        self.matrix.uncover(column);
        flow
    }
}

/// Finds the first solution under the [`MinSize`] strategy.
///
/// Returns the selected rows' input indices, or `None` when the matrix has
/// no exact cover.
pub fn solve_first(matrix: &mut Matrix) -> Option<Vec<RowId>> {
    let mut sink = FirstSolution::new();
    Search::new(matrix, MinSize).run(&mut sink);
    sink.into_solution()
}

/// Counts solutions under the [`MinSize`] strategy, stopping early at
/// `limit` when one is given.
pub fn count_solutions(matrix: &mut Matrix, limit: Option<usize>) -> usize {
    let mut sink = limit.map_or_else(CountSolutions::new, CountSolutions::with_limit);
    Search::new(matrix, MinSize).run(&mut sink);
    sink.count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dlx::column_selection::{FirstActive, Uniform};
    use crate::dlx::sink::CollectAll;
    use rustc_hash::FxHashSet;

    fn names(names: &[&str]) -> Vec<String> {
        names.iter().map(ToString::to_string).collect()
    }

    /// Seven columns `a..=g`, six rows, exactly one exact cover: rows
    /// {0, 3, 4}.
    fn knuth_example() -> Matrix {
        let rows = [
            vec![2, 4, 5], // r0 = {c, e, f}
            vec![0, 3, 6], // r1 = {a, d, g}
            vec![1, 2, 5], // r2 = {b, c, f}
            vec![0, 3],    // r3 = {a, d}
            vec![1, 6],    // r4 = {b, g}
            vec![3, 4, 6], // r5 = {d, e, g}
        ];
        Matrix::from_sparse(names(&["a", "b", "c", "d", "e", "f", "g"]), &rows).unwrap()
    }

    fn solution_sets(solutions: &[Vec<RowId>]) -> FxHashSet<Vec<RowId>> {
        solutions
            .iter()
            .map(|rows| {
                let mut rows = rows.clone();
                rows.sort_unstable();
                rows
            })
            .collect()
    }

    #[test]
    fn min_size_finds_the_unique_cover() {
        let mut matrix = knuth_example();
        let mut sink = CollectAll::new();
        let stats = Search::new(&mut matrix, MinSize).run(&mut sink);

        assert_eq!(stats.solutions, 1);
        assert_eq!(solution_sets(sink.solutions()), solution_sets(&[vec![0, 3, 4]]));
    }

    #[test]
    fn strategies_agree_on_the_solution_set() {
        let mut with_min = knuth_example();
        let mut min_sink = CollectAll::new();
        Search::new(&mut with_min, MinSize).run(&mut min_sink);

        let mut with_first = knuth_example();
        let mut first_sink = CollectAll::new();
        Search::new(&mut with_first, FirstActive).run(&mut first_sink);

        let mut with_random = knuth_example();
        let mut random_sink = CollectAll::new();
        Search::new(&mut with_random, Uniform::new(99)).run(&mut random_sink);

        let expected = solution_sets(&[vec![0, 3, 4]]);
        assert_eq!(solution_sets(min_sink.solutions()), expected);
        assert_eq!(solution_sets(first_sink.solutions()), expected);
        assert_eq!(solution_sets(random_sink.solutions()), expected);
    }

    #[test]
    fn empty_matrix_yields_exactly_the_empty_solution() {
        let mut matrix = Matrix::new(Vec::new(), &[]).unwrap();
        let mut sink = CollectAll::new();
        let stats = Search::new(&mut matrix, MinSize).run(&mut sink);

        assert_eq!(stats.solutions, 1);
        assert_eq!(sink.solutions(), &[Vec::new()]);
        assert_eq!(stats.decisions, 0);
    }

    #[test]
    fn unsatisfiable_column_is_a_dead_end_with_no_decisions() {
        // Column b has no rows at all, so it is chosen first (size 0) and
        // pruned before any row is tried.
        let rows = [vec![0]];
        let mut matrix = Matrix::from_sparse(names(&["a", "b"]), &rows).unwrap();
        let mut sink = CollectAll::new();
        let stats = Search::new(&mut matrix, MinSize).run(&mut sink);

        assert_eq!(stats.solutions, 0);
        assert_eq!(stats.decisions, 0);
        assert_eq!(stats.dead_ends, 1);
        assert!(sink.solutions().is_empty());
        matrix.assert_invariants();
    }

    #[test]
    fn matrix_is_restored_after_an_exhaustive_search() {
        let mut matrix = knuth_example();
        let snapshot = matrix.clone();
        Search::new(&mut matrix, MinSize).run(&mut CollectAll::new());

        matrix.assert_invariants();
        assert_eq!(matrix, snapshot);
    }

    #[test]
    fn matrix_is_restored_after_an_early_stop() {
        // Two disjoint covers ({0, 1} and {2, 3}), so a stop-after-first
        // search genuinely unwinds with work left to do.
        let rows = [vec![0], vec![1, 2], vec![0, 1], vec![2]];
        let mut matrix = Matrix::from_sparse(names(&["a", "b", "c"]), &rows).unwrap();
        let snapshot = matrix.clone();

        let mut sink = FirstSolution::new();
        let stats = Search::new(&mut matrix, MinSize).run(&mut sink);

        assert_eq!(stats.solutions, 1);
        assert!(sink.solution().is_some());
        matrix.assert_invariants();
        assert_eq!(matrix, snapshot, "early stop must unwind every cover");

        // The full search space is still reachable afterwards.
        assert_eq!(count_solutions(&mut matrix, None), 2);
    }

    #[test]
    fn independently_built_matrices_search_identically() {
        let mut first = knuth_example();
        let mut second = knuth_example();

        let mut first_sink = CollectAll::new();
        let mut second_sink = CollectAll::new();
        let first_stats = Search::new(&mut first, MinSize).run(&mut first_sink);
        let second_stats = Search::new(&mut second, MinSize).run(&mut second_sink);

        assert_eq!(first_sink.solutions(), second_sink.solutions());
        assert_eq!(first_stats, second_stats);
    }

    #[test]
    fn count_solutions_respects_its_limit() {
        let rows = [vec![0], vec![1, 2], vec![0, 1], vec![2]];
        let mut matrix = Matrix::from_sparse(names(&["a", "b", "c"]), &rows).unwrap();

        assert_eq!(count_solutions(&mut matrix, None), 2);
        assert_eq!(count_solutions(&mut matrix, Some(1)), 1);
    }

    #[test]
    fn solve_first_returns_rows_in_selection_order_of_a_cover() {
        let mut matrix = knuth_example();
        let mut rows = solve_first(&mut matrix).unwrap();
        rows.sort_unstable();
        assert_eq!(rows, vec![0, 3, 4]);
    }
}
