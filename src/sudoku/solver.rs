#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Sudoku grids and their exact cover encoding.
//!
//! A puzzle of side `n` becomes a boolean matrix with `4·n²` columns (one
//! per constraint: cell occupied, row has value, column has value, box has
//! value) and one row per candidate placement consistent with the givens.
//! Pre-filled cells are handled entirely here, by omitting every candidate
//! row that contradicts them; the search core never learns what a "given"
//! is. Each matrix row maps back to a [`Placement`], which is how solutions
//! are decoded into grids.

use crate::dlx::matrix::{ConstructionError, Matrix, RowId};
use crate::dlx::search::{count_solutions, solve_first};
use bit_vec::BitVec;
use itertools::Itertools;
use std::error::Error;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// A square grid of cell values; `0` marks an empty cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board(Vec<Vec<usize>>);

impl Board {
    /// Wraps a grid of values.
    #[must_use]
    pub const fn new(board: Vec<Vec<usize>>) -> Self {
        Self(board)
    }

    /// Side length of the grid.
    #[must_use]
    pub fn side(&self) -> usize {
        self.0.len()
    }

    /// The value at 1-based `(row, col)`; `0` when empty.
    #[must_use]
    pub fn value(&self, row: usize, col: usize) -> usize {
        self.0[row - 1][col - 1]
    }

    /// Iterates the rows of the grid.
    pub fn rows(&self) -> impl Iterator<Item = &[usize]> {
        self.0.iter().map(Vec::as_slice)
    }
}

impl From<Vec<Vec<usize>>> for Board {
    fn from(board: Vec<Vec<usize>>) -> Self {
        Self::new(board)
    }
}

impl<const N: usize> From<[[usize; N]; N]> for Board {
    fn from(board: [[usize; N]; N]) -> Self {
        Self::new(board.iter().map(|row| row.to_vec()).collect())
    }
}

impl From<Board> for Vec<Vec<usize>> {
    fn from(board: Board) -> Self {
        board.0
    }
}

/// The supported puzzle sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Size {
    /// A 4×4 grid with 2×2 boxes.
    Four = 4,
    /// The standard 9×9 grid with 3×3 boxes.
    Nine = 9,
    /// A 16×16 grid with 4×4 boxes.
    Sixteen = 16,
    /// A 25×25 grid with 5×5 boxes.
    TwentyFive = 25,
}

impl TryFrom<usize> for Size {
    type Error = PuzzleError;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        match value {
            4 => Ok(Self::Four),
            9 => Ok(Self::Nine),
            16 => Ok(Self::Sixteen),
            25 => Ok(Self::TwentyFive),
            _ => Err(PuzzleError::UnsupportedSize(value)),
        }
    }
}

impl From<Size> for usize {
    fn from(size: Size) -> Self {
        size as Self
    }
}

impl Size {
    /// Side length of one box (2 for 4×4, 3 for 9×9, ...).
    #[must_use]
    pub const fn block_size(self) -> usize {
        match self {
            Self::Four => 2,
            Self::Nine => 3,
            Self::Sixteen => 4,
            Self::TwentyFive => 5,
        }
    }
}

/// One candidate assignment: value `num` into cell `(row, col)`, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    /// 1-based grid row.
    pub row: usize,
    /// 1-based grid column.
    pub col: usize,
    /// The value placed, `1..=n`.
    pub num: usize,
}

impl Placement {
    /// Creates a placement.
    #[must_use]
    pub const fn new(row: usize, col: usize, num: usize) -> Self {
        Self { row, col, num }
    }
}

/// Errors raised while building or encoding a puzzle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PuzzleError {
    /// The grid's side length is not one of the supported sizes.
    UnsupportedSize(usize),
    /// A grid row has a different length from the grid's side.
    RaggedRow {
        /// 1-based row index.
        row: usize,
        /// The grid's side length.
        expected: usize,
        /// Length of the offending row.
        found: usize,
    },
    /// A cell holds a value outside `1..=n`.
    ValueOutOfRange {
        /// 1-based row index.
        row: usize,
        /// 1-based column index.
        col: usize,
        /// The offending value.
        value: usize,
        /// The largest legal value.
        max: usize,
    },
    /// Two givens in the same row, column or box share a value, so no
    /// completion can exist.
    ConflictingGiven {
        /// 1-based row index of the second occurrence.
        row: usize,
        /// 1-based column index of the second occurrence.
        col: usize,
        /// The conflicting value.
        value: usize,
    },
    /// The puzzle text could not be parsed.
    Parse(String),
    /// The puzzle file could not be read.
    Io(String),
    /// The encoded matrix was rejected by the exact cover core.
    Construction(ConstructionError),
}

impl fmt::Display for PuzzleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedSize(side) => {
                write!(f, "unsupported grid side {side} (expected 4, 9, 16 or 25)")
            }
            Self::RaggedRow {
                row,
                expected,
                found,
            } => write!(
                f,
                "row {row} has {found} cells but the grid is {expected} wide"
            ),
            Self::ValueOutOfRange {
                row,
                col,
                value,
                max,
            } => write!(
                f,
                "cell ({row}, {col}) holds {value}, outside 1..={max}"
            ),
            Self::ConflictingGiven { row, col, value } => write!(
                f,
                "the given {value} at ({row}, {col}) repeats a value in its row, column or box"
            ),
            Self::Parse(msg) => write!(f, "failed to parse puzzle: {msg}"),
            Self::Io(msg) => write!(f, "failed to read puzzle: {msg}"),
            Self::Construction(err) => write!(f, "failed to encode puzzle: {err}"),
        }
    }
}

impl Error for PuzzleError {}

impl From<ConstructionError> for PuzzleError {
    fn from(err: ConstructionError) -> Self {
        Self::Construction(err)
    }
}

/// The classic 9×9 example puzzle; uniquely solvable.
pub const EXAMPLE_NINE: [[usize; 9]; 9] = [
    [5, 3, 0, 0, 7, 0, 0, 0, 0],
    [6, 0, 0, 1, 9, 5, 0, 0, 0],
    [0, 9, 8, 0, 0, 0, 0, 6, 0],
    [8, 0, 0, 0, 6, 0, 0, 0, 3],
    [4, 0, 0, 8, 0, 3, 0, 0, 1],
    [7, 0, 0, 0, 2, 0, 0, 0, 6],
    [0, 6, 0, 0, 0, 0, 2, 8, 0],
    [0, 0, 0, 4, 1, 9, 0, 0, 5],
    [0, 0, 0, 0, 8, 0, 0, 7, 9],
];

/// A small 4×4 example puzzle.
pub const EXAMPLE_FOUR: [[usize; 4]; 4] = [
    [1, 0, 3, 0],
    [0, 4, 0, 2],
    [2, 0, 4, 0],
    [0, 3, 0, 1],
];

/// A Sudoku puzzle: a board whose side is a supported [`Size`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sudoku {
    board: Board,
    size: Size,
}

/// A puzzle encoded for the exact cover search: the matrix plus the map
/// from matrix row index back to the candidate [`Placement`] it encodes.
#[derive(Debug, Clone)]
pub struct CoverModel {
    matrix: Matrix,
    candidates: Vec<Placement>,
    size: Size,
}

impl CoverModel {
    /// The encoded matrix.
    #[must_use]
    pub const fn matrix(&self) -> &Matrix {
        &self.matrix
    }

    /// The encoded matrix, mutably, for running a search over it.
    pub const fn matrix_mut(&mut self) -> &mut Matrix {
        &mut self.matrix
    }

    /// The candidate placement a matrix row stands for.
    #[must_use]
    pub fn placement(&self, row: RowId) -> Placement {
        self.candidates[row]
    }

    /// Rebuilds a full board from a solution's selected rows.
    ///
    /// Every cell is written from its selected candidate; givens are not
    /// special-cased because their own candidate row is part of any
    /// solution.
    #[must_use]
    pub fn decode(&self, rows: &[RowId]) -> Board {
        let side = usize::from(self.size);
        let mut board = vec![vec![0; side]; side];
        for &row in rows {
            let p = self.candidates[row];
            board[p.row - 1][p.col - 1] = p.num;
        }
        Board::new(board)
    }
}

impl Sudoku {
    /// Validates a board's shape and cell values and wraps it as a puzzle.
    ///
    /// # Errors
    ///
    /// [`PuzzleError::UnsupportedSize`], [`PuzzleError::RaggedRow`] or
    /// [`PuzzleError::ValueOutOfRange`].
    pub fn new(board: Board) -> Result<Self, PuzzleError> {
        let side = board.side();
        let size = Size::try_from(side)?;
        for (r, row) in board.rows().enumerate() {
            if row.len() != side {
                return Err(PuzzleError::RaggedRow {
                    row: r + 1,
                    expected: side,
                    found: row.len(),
                });
            }
            for (c, &value) in row.iter().enumerate() {
                if value > side {
                    return Err(PuzzleError::ValueOutOfRange {
                        row: r + 1,
                        col: c + 1,
                        value,
                        max: side,
                    });
                }
            }
        }
        Ok(Self { board, size })
    }

    /// The underlying board.
    #[must_use]
    pub const fn board(&self) -> &Board {
        &self.board
    }

    /// The puzzle's size.
    #[must_use]
    pub const fn size(&self) -> Size {
        self.size
    }

    /// 0-based box index of a 1-based cell.
    const fn box_of(&self, row: usize, col: usize) -> usize {
        let bs = self.size.block_size();
        ((row - 1) / bs) * bs + (col - 1) / bs
    }

    /// Encodes the puzzle as an exact cover matrix.
    ///
    /// # Errors
    ///
    /// [`PuzzleError::ConflictingGiven`] when the givens already contradict
    /// each other.
    pub fn to_cover_model(&self) -> Result<CoverModel, PuzzleError> {
        let n = usize::from(self.size);

        // Occupancy of each (unit, value) pair among the givens, indexed
        // unit * n + (value - 1).
        let mut row_has = BitVec::from_elem(n * n, false);
        let mut col_has = BitVec::from_elem(n * n, false);
        let mut box_has = BitVec::from_elem(n * n, false);
        for r in 1..=n {
            for c in 1..=n {
                let v = self.board.value(r, c);
                if v == 0 {
                    continue;
                }
                let b = self.box_of(r, c);
                if row_has[(r - 1) * n + v - 1]
                    || col_has[(c - 1) * n + v - 1]
                    || box_has[b * n + v - 1]
                {
                    return Err(PuzzleError::ConflictingGiven {
                        row: r,
                        col: c,
                        value: v,
                    });
                }
                row_has.set((r - 1) * n + v - 1, true);
                col_has.set((c - 1) * n + v - 1, true);
                box_has.set(b * n + v - 1, true);
            }
        }

        let names = self.column_names();
        let width = names.len();
        let mut rows = Vec::new();
        let mut candidates = Vec::new();
        for r in 1..=n {
            for c in 1..=n {
                let given = self.board.value(r, c);
                let b = self.box_of(r, c);
                for v in 1..=n {
                    let consistent = if given == 0 {
                        !row_has[(r - 1) * n + v - 1]
                            && !col_has[(c - 1) * n + v - 1]
                            && !box_has[b * n + v - 1]
                    } else {
                        v == given
                    };
                    if !consistent {
                        continue;
                    }
                    let mut bits = BitVec::from_elem(width, false);
                    bits.set((r - 1) * n + (c - 1), true);
                    bits.set(n * n + (r - 1) * n + (v - 1), true);
                    bits.set(2 * n * n + (c - 1) * n + (v - 1), true);
                    bits.set(3 * n * n + b * n + (v - 1), true);
                    rows.push(bits);
                    candidates.push(Placement::new(r, c, v));
                }
            }
        }

        let matrix = Matrix::new(names, &rows)?;
        Ok(CoverModel {
            matrix,
            candidates,
            size: self.size,
        })
    }

    /// The `4·n²` constraint column names, in encoding order: cells, then
    /// row-value, column-value and box-value pairs.
    fn column_names(&self) -> Vec<String> {
        let n = usize::from(self.size);
        let mut names = Vec::with_capacity(4 * n * n);
        for r in 1..=n {
            for c in 1..=n {
                names.push(format!("R{r}C{c}"));
            }
        }
        for r in 1..=n {
            for v in 1..=n {
                names.push(format!("R{r}#{v}"));
            }
        }
        for c in 1..=n {
            for v in 1..=n {
                names.push(format!("C{c}#{v}"));
            }
        }
        for b in 1..=n {
            for v in 1..=n {
                names.push(format!("B{b}#{v}"));
            }
        }
        names
    }

    /// Finds a completion of the puzzle, if one exists.
    ///
    /// # Errors
    ///
    /// See [`Sudoku::to_cover_model`].
    pub fn solve(&self) -> Result<Option<Self>, PuzzleError> {
        let mut model = self.to_cover_model()?;
        Ok(solve_first(model.matrix_mut()).map(|rows| Self {
            board: model.decode(&rows),
            size: self.size,
        }))
    }

    /// Counts the puzzle's completions, stopping early at `limit` when one
    /// is given.
    ///
    /// # Errors
    ///
    /// See [`Sudoku::to_cover_model`].
    pub fn count_solutions(&self, limit: Option<usize>) -> Result<usize, PuzzleError> {
        let mut model = self.to_cover_model()?;
        Ok(count_solutions(model.matrix_mut(), limit))
    }

    /// True when the puzzle has exactly one completion.
    ///
    /// Stops searching as soon as a second completion is found, so this is
    /// much cheaper than a full count on open grids.
    ///
    /// # Errors
    ///
    /// See [`Sudoku::to_cover_model`].
    pub fn is_uniquely_solvable(&self) -> Result<bool, PuzzleError> {
        Ok(self.count_solutions(Some(2))? == 1)
    }

    /// True when every cell is filled and every row, column and box holds
    /// each value exactly once.
    #[must_use]
    pub fn is_solved(&self) -> bool {
        let n = usize::from(self.size);
        let mut rows = BitVec::from_elem(n * n, false);
        let mut cols = BitVec::from_elem(n * n, false);
        let mut boxes = BitVec::from_elem(n * n, false);
        for r in 1..=n {
            for c in 1..=n {
                let v = self.board.value(r, c);
                if v == 0 {
                    return false;
                }
                let b = self.box_of(r, c);
                if rows[(r - 1) * n + v - 1]
                    || cols[(c - 1) * n + v - 1]
                    || boxes[b * n + v - 1]
                {
                    return false;
                }
                rows.set((r - 1) * n + v - 1, true);
                cols.set((c - 1) * n + v - 1, true);
                boxes.set(b * n + v - 1, true);
            }
        }
        true
    }

    /// True when `completion` fills this puzzle: it is solved and agrees
    /// with every given.
    #[must_use]
    pub fn is_completed_by(&self, completion: &Self) -> bool {
        if self.size != completion.size || !completion.is_solved() {
            return false;
        }
        let n = usize::from(self.size);
        for r in 1..=n {
            for c in 1..=n {
                let given = self.board.value(r, c);
                if given != 0 && completion.board.value(r, c) != given {
                    return false;
                }
            }
        }
        true
    }
}

impl TryFrom<Board> for Sudoku {
    type Error = PuzzleError;

    fn try_from(board: Board) -> Result<Self, Self::Error> {
        Self::new(board)
    }
}

impl fmt::Display for Sudoku {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.board.rows() {
            let line = row
                .iter()
                .map(|&v| {
                    if v == 0 {
                        ".".to_string()
                    } else {
                        v.to_string()
                    }
                })
                .join(" ");
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

impl FromStr for Sudoku {
    type Err = PuzzleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rows: Vec<Vec<usize>> = s
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(parse_row)
            .collect::<Result<_, _>>()?;
        if rows.is_empty() {
            return Err(PuzzleError::Parse("no rows found".to_string()));
        }
        Self::new(Board::new(rows))
    }
}

/// Parses one grid row: whitespace-separated cell tokens, or one compact
/// run of single characters. `.`, `_` and `0` all mean "empty".
fn parse_row(line: &str) -> Result<Vec<usize>, PuzzleError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() > 1 {
        tokens.into_iter().map(parse_cell).collect()
    } else {
        line.chars()
            .map(|ch| parse_cell(ch.to_string().as_str()))
            .collect()
    }
}

fn parse_cell(token: &str) -> Result<usize, PuzzleError> {
    match token {
        "." | "_" | "0" => Ok(0),
        _ => token
            .parse()
            .map_err(|_| PuzzleError::Parse(format!("invalid cell value {token:?}"))),
    }
}

/// Reads and parses a puzzle file.
///
/// Blank lines and lines starting with `#` are ignored.
///
/// # Errors
///
/// [`PuzzleError::Io`] when the file cannot be read, or any parse error
/// from [`Sudoku::from_str`].
pub fn parse_sudoku_file(path: &Path) -> Result<Sudoku, PuzzleError> {
    let text = std::fs::read_to_string(path).map_err(|e| PuzzleError::Io(e.to_string()))?;
    text.parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXAMPLE_NINE_SOLUTION: [[usize; 9]; 9] = [
        [5, 3, 4, 6, 7, 8, 9, 1, 2],
        [6, 7, 2, 1, 9, 5, 3, 4, 8],
        [1, 9, 8, 3, 4, 2, 5, 6, 7],
        [8, 5, 9, 7, 6, 1, 4, 2, 3],
        [4, 2, 6, 8, 5, 3, 7, 9, 1],
        [7, 1, 3, 9, 2, 4, 8, 5, 6],
        [9, 6, 1, 5, 3, 7, 2, 8, 4],
        [2, 8, 7, 4, 1, 9, 6, 3, 5],
        [3, 4, 5, 2, 8, 6, 1, 7, 9],
    ];

    fn puzzle<const N: usize>(grid: [[usize; N]; N]) -> Sudoku {
        Sudoku::new(Board::from(grid)).unwrap()
    }

    #[test]
    fn blank_nine_encodes_to_the_full_matrix() {
        let model = puzzle([[0; 9]; 9]).to_cover_model().unwrap();
        assert_eq!(model.matrix().width(), 324);
        assert_eq!(model.matrix().row_count(), 729);
        assert_eq!(model.matrix().column(0).name(), "R1C1");
        assert_eq!(model.matrix().column(323).name(), "B9#9");
    }

    #[test]
    fn givens_prune_inconsistent_candidates() {
        let sudoku = puzzle(EXAMPLE_NINE);
        let model = sudoku.to_cover_model().unwrap();
        assert!(model.matrix().row_count() < 729);
        // The given 5 at (1, 1) keeps exactly its own candidate for that cell.
        let for_cell: Vec<Placement> = (0..model.matrix().row_count())
            .map(|row| model.placement(row))
            .filter(|p| p.row == 1 && p.col == 1)
            .collect();
        assert_eq!(for_cell, vec![Placement::new(1, 1, 5)]);
    }

    #[test]
    fn blank_nine_solves_to_a_valid_grid() {
        let blank = puzzle([[0; 9]; 9]);
        let solved = blank.solve().unwrap().expect("a blank grid is solvable");
        assert!(solved.is_solved());
        assert!(blank.is_completed_by(&solved));
    }

    #[test]
    fn example_nine_solves_to_the_known_solution() {
        let sudoku = puzzle(EXAMPLE_NINE);
        let solved = sudoku.solve().unwrap().expect("the example is solvable");
        assert_eq!(solved.board(), &Board::from(EXAMPLE_NINE_SOLUTION));
    }

    #[test]
    fn example_nine_is_unique_but_a_blank_grid_is_not() {
        assert!(puzzle(EXAMPLE_NINE).is_uniquely_solvable().unwrap());

        let blank = puzzle([[0; 4]; 4]);
        assert!(!blank.is_uniquely_solvable().unwrap());
        assert_eq!(blank.count_solutions(Some(2)).unwrap(), 2);
    }

    #[test]
    fn example_four_solves_consistently_with_its_givens() {
        let sudoku = puzzle(EXAMPLE_FOUR);
        let solved = sudoku.solve().unwrap().expect("the example is solvable");
        assert!(sudoku.is_completed_by(&solved));
    }

    #[test]
    fn conflicting_givens_are_rejected_before_any_search() {
        let mut grid = [[0; 9]; 9];
        grid[0][0] = 5;
        grid[0][8] = 5;
        let err = puzzle(grid).to_cover_model().unwrap_err();
        assert_eq!(
            err,
            PuzzleError::ConflictingGiven {
                row: 1,
                col: 9,
                value: 5
            }
        );
    }

    #[test]
    fn unsatisfiable_but_conflict_free_puzzles_report_no_solution() {
        // Box-legal givens that still force (1, 1) to have no candidate:
        // 1..=8 fill the rest of row 1 and 9 sits below (1, 1).
        let mut grid = [[0; 9]; 9];
        for (c, v) in (2..=9).zip(1..=8) {
            grid[0][c - 1] = v;
        }
        grid[3][0] = 9;
        let sudoku = puzzle(grid);
        assert_eq!(sudoku.count_solutions(None).unwrap(), 0);
        assert_eq!(sudoku.solve().unwrap(), None);
    }

    #[test]
    fn invalid_boards_are_rejected() {
        assert_eq!(
            Sudoku::new(Board::new(vec![vec![0; 5]; 5])).unwrap_err(),
            PuzzleError::UnsupportedSize(5)
        );

        let mut ragged = vec![vec![0; 4]; 4];
        ragged[2].push(0);
        assert_eq!(
            Sudoku::new(Board::new(ragged)).unwrap_err(),
            PuzzleError::RaggedRow {
                row: 3,
                expected: 4,
                found: 5
            }
        );

        let mut grid = [[0; 4]; 4];
        grid[1][1] = 9;
        assert_eq!(
            Sudoku::new(Board::from(grid)).unwrap_err(),
            PuzzleError::ValueOutOfRange {
                row: 2,
                col: 2,
                value: 9,
                max: 4
            }
        );
    }

    #[test]
    fn parses_compact_and_spaced_text() {
        let compact = "53..7....\n6..195...\n.98....6.\n8...6...3\n4..8.3..1\n7...2...6\n.6....28.\n...419..5\n....8..79";
        let spaced: Sudoku = puzzle(EXAMPLE_NINE).to_string().parse().unwrap();
        let parsed: Sudoku = compact.parse().unwrap();
        assert_eq!(parsed, puzzle(EXAMPLE_NINE));
        assert_eq!(spaced, puzzle(EXAMPLE_NINE));
    }

    #[test]
    fn parser_skips_comments_and_rejects_garbage() {
        let text = "# a tiny puzzle\n1 . 3 .\n. 4 . 2\n2 . 4 .\n. 3 . 1\n";
        let parsed: Sudoku = text.parse().unwrap();
        assert_eq!(parsed, puzzle(EXAMPLE_FOUR));

        let err = "1 . x .\n. 4 . 2\n2 . 4 .\n. 3 . 1\n".parse::<Sudoku>().unwrap_err();
        assert!(matches!(err, PuzzleError::Parse(_)));
    }
}
