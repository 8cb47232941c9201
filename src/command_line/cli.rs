#![allow(clippy::cast_precision_loss)]
//! The command-line interface: argument parsing and the handlers that drive
//! a search for each subcommand.

use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use dlx_solver::dlx::column_selection::{
    ColumnSelectionImpls, FirstActive, MinSize, Uniform,
};
use dlx_solver::dlx::matrix::Matrix;
use dlx_solver::dlx::search::{Search, SearchStats};
use dlx_solver::dlx::sink::{CollectAll, CountSolutions, FirstSolution, SolutionSink};
use dlx_solver::sudoku::solver::{CoverModel, Sudoku, parse_sudoku_file};
use itertools::Itertools;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tikv_jemalloc_ctl::{epoch, stats};

/// Defines the command-line interface for the solver application.
///
/// Uses `clap` for parsing arguments.
#[derive(Parser, Debug)]
#[command(name = "dlx_solver", version, about = "A configurable exact cover and Sudoku solver")]
pub(crate) struct Cli {
    /// An optional global path argument. If provided without a subcommand,
    /// it's treated as a `.sudoku` puzzle file, or a directory of them, to
    /// solve.
    #[arg(global = true)]
    pub(crate) path: Option<PathBuf>,

    /// Specifies the subcommand to execute (e.g. `sudoku`, `text`).
    #[clap(subcommand)]
    pub(crate) command: Option<Commands>,

    /// Common options applicable to all commands.
    #[command(flatten)]
    pub(crate) common: CommonOptions,
}

/// Enumerates the available subcommands for the solver.
#[derive(Subcommand, Debug)]
pub(crate) enum Commands {
    /// Solve a Sudoku puzzle file.
    /// The puzzle is encoded as an exact cover matrix, which is then solved.
    Sudoku {
        /// Path to the puzzle file: one line per grid row, cells as digits
        /// (`.`, `_` or `0` for empty), `#` starting a comment line.
        #[arg(long = "path")]
        puzzle: PathBuf,

        /// Report whether the puzzle has a unique completion instead of
        /// printing one.
        #[arg(short, long, default_value_t = false)]
        unique: bool,

        /// Common options for this subcommand.
        #[command(flatten)]
        common: CommonOptions,
    },

    /// Solve an exact cover matrix provided as plain text.
    Text {
        /// Matrix rows as a string: one row per line, each line the
        /// 0-based column indices the row covers (e.g. "0 3\n1 2\n0 1 2").
        #[arg(short, long)]
        input: String,

        /// Number of columns in the matrix.
        #[arg(short, long)]
        columns: usize,

        /// Common options for this subcommand.
        #[command(flatten)]
        common: CommonOptions,
    },

    /// Generate shell completion scripts.
    Completions {
        /// The shell to generate completions for.
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// The column-selection strategies selectable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub(crate) enum StrategyType {
    /// Branch on the column with the fewest live rows.
    #[default]
    MinSize,
    /// Branch on the leftmost active column.
    First,
    /// Branch on a random active column (see `--seed`).
    Random,
}

impl fmt::Display for StrategyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MinSize => write!(f, "min-size"),
            Self::First => write!(f, "first"),
            Self::Random => write!(f, "random"),
        }
    }
}

impl StrategyType {
    /// Converts the flag into the strategy implementation.
    fn to_impl(self, seed: u64) -> ColumnSelectionImpls {
        match self {
            Self::MinSize => ColumnSelectionImpls::MinSize(MinSize),
            Self::First => ColumnSelectionImpls::FirstActive(FirstActive),
            Self::Random => ColumnSelectionImpls::Uniform(Uniform::new(seed)),
        }
    }
}

/// Defines common command-line options shared across different subcommands.
#[derive(Args, Debug, Default, Clone)]
pub(crate) struct CommonOptions {
    /// Enable debug output, providing more verbose logging during the
    /// solving process.
    #[arg(short, long, default_value_t = false)]
    pub(crate) debug: bool,

    /// Enable printing of performance and problem statistics after solving.
    #[arg(short, long, default_value_t = true)]
    pub(crate) stats: bool,

    /// Enable printing of the solution itself, not just the verdict.
    #[arg(short, long, default_value_t = false)]
    pub(crate) print_solution: bool,

    /// Find every solution instead of stopping at the first.
    #[arg(short, long, default_value_t = false)]
    pub(crate) all: bool,

    /// The column-selection strategy the search branches with.
    #[arg(long, value_enum, default_value_t = StrategyType::MinSize)]
    pub(crate) strategy: StrategyType,

    /// Seed for the random strategy; ignored by the others.
    #[arg(long, default_value_t = 0)]
    pub(crate) seed: u64,
}

/// Dispatches a parsed command line.
pub(crate) fn run(cli: Cli) -> Result<(), String> {
    if let Some(path) = cli.path.clone() {
        if cli.command.is_none() {
            return if path.is_dir() {
                solve_dir(&path, &cli.common)
            } else {
                solve_sudoku(&path, false, &cli.common)
            };
        }
    }

    match cli.command {
        Some(Commands::Sudoku {
            puzzle,
            unique,
            common,
        }) => solve_sudoku(&puzzle, unique, &common),
        Some(Commands::Text {
            input,
            columns,
            common,
        }) => solve_text(&input, columns, &common),
        Some(Commands::Completions { shell }) => {
            clap_complete::generate(
                shell,
                &mut Cli::command(),
                "dlx-solver",
                &mut std::io::stdout(),
            );
            Ok(())
        }
        None => Err("no command provided; use --help for more information".to_string()),
    }
}

/// Solves every `.sudoku` file under a directory.
pub(crate) fn solve_dir(path: &Path, common: &CommonOptions) -> Result<(), String> {
    if !path.is_dir() {
        return Err(format!("provided path is not a directory: {}", path.display()));
    }

    for entry in walkdir::WalkDir::new(path)
        .into_iter()
        .filter_map(Result::ok)
    {
        let file_path = entry.path();
        if !file_path.is_file() {
            continue;
        }
        if file_path.extension().is_none_or(|ext| ext != "sudoku") {
            eprintln!("Skipping non-puzzle file: {}", file_path.display());
            continue;
        }
        solve_sudoku(file_path, false, common)?;
    }

    Ok(())
}

/// Parses a puzzle file, runs the configured search over its encoding, and
/// reports the outcome.
pub(crate) fn solve_sudoku(path: &Path, unique: bool, common: &CommonOptions) -> Result<(), String> {
    println!("Solving: {}", path.display());

    let time = Instant::now();
    let sudoku = parse_sudoku_file(path).map_err(|e| e.to_string())?;
    let mut model = sudoku.to_cover_model().map_err(|e| e.to_string())?;
    let parse_time = time.elapsed();

    if common.debug {
        println!("Parsed puzzle:\n{sudoku}");
        println!("Columns: {}", model.matrix().width());
        println!("Rows: {}", model.matrix().row_count());
    }

    let selector = common.strategy.to_impl(common.seed);
    if unique {
        let mut sink = CountSolutions::with_limit(2);
        let (search_stats, elapsed) = run_search(model.matrix_mut(), selector, &mut sink);
        report(&model, parse_time, elapsed, &search_stats, common);
        match sink.count() {
            0 => println!("\nNO SOLUTION"),
            1 => println!("\nUNIQUELY SOLVABLE"),
            _ => println!("\nMULTIPLE SOLUTIONS"),
        }
    } else if common.all {
        let mut sink = CollectAll::new();
        let (search_stats, elapsed) = run_search(model.matrix_mut(), selector, &mut sink);
        report(&model, parse_time, elapsed, &search_stats, common);
        println!("\nSolutions found: {}", sink.solutions().len());
        if common.print_solution {
            for rows in sink.solutions() {
                let completion = Sudoku::new(model.decode(rows)).map_err(|e| e.to_string())?;
                println!("{completion}");
            }
        }
    } else {
        let mut sink = FirstSolution::new();
        let (search_stats, elapsed) = run_search(model.matrix_mut(), selector, &mut sink);
        report(&model, parse_time, elapsed, &search_stats, common);
        match sink.into_solution() {
            Some(rows) => {
                let completion = Sudoku::new(model.decode(&rows)).map_err(|e| e.to_string())?;
                println!("Verified: {:?}", sudoku.is_completed_by(&completion));
                if common.print_solution {
                    println!("{completion}");
                }
                println!("\nSOLVED");
            }
            None => println!("\nNO SOLUTION"),
        }
    }

    Ok(())
}

/// Builds a matrix from textual rows and runs the configured search.
pub(crate) fn solve_text(input: &str, columns: usize, common: &CommonOptions) -> Result<(), String> {
    let time = Instant::now();
    let rows = parse_textual_rows(input)?;
    let names = (0..columns).map(|c| format!("c{c}")).collect();
    let mut matrix = Matrix::from_sparse(names, &rows).map_err(|e| e.to_string())?;
    let parse_time = time.elapsed();

    let selector = common.strategy.to_impl(common.seed);
    let mut sink = CollectAll::new();
    let (search_stats, elapsed) = if common.all {
        run_search(&mut matrix, selector, &mut sink)
    } else {
        let mut first = FirstSolution::new();
        let (search_stats, elapsed) = run_search(&mut matrix, selector, &mut first);
        if let Some(rows) = first.into_solution() {
            sink.on_solution(&rows);
        }
        (search_stats, elapsed)
    };

    if common.stats {
        let (allocated, resident) = memory_mib();
        print_stats(
            parse_time,
            elapsed,
            matrix.width(),
            matrix.row_count(),
            &search_stats,
            allocated,
            resident,
        );
    }

    println!("\nSolutions found: {}", sink.solutions().len());
    for rows in sink.solutions() {
        println!("rows: {}", rows.iter().map(ToString::to_string).join(" "));
    }

    Ok(())
}

/// Runs one timed search.
fn run_search<S: SolutionSink>(
    matrix: &mut Matrix,
    selector: ColumnSelectionImpls,
    sink: &mut S,
) -> (SearchStats, Duration) {
    let time = Instant::now();
    let search_stats = Search::new(matrix, selector).run(sink);
    (search_stats, time.elapsed())
}

/// Prints the statistics table for a puzzle search, when enabled.
fn report(
    model: &CoverModel,
    parse_time: Duration,
    elapsed: Duration,
    search_stats: &SearchStats,
    common: &CommonOptions,
) {
    if !common.stats {
        return;
    }
    let (allocated, resident) = memory_mib();
    print_stats(
        parse_time,
        elapsed,
        model.matrix().width(),
        model.matrix().row_count(),
        search_stats,
        allocated,
        resident,
    );
}

/// Reads allocator statistics, in MiB.
fn memory_mib() -> (f64, f64) {
    epoch::advance().unwrap();
    let allocated_bytes = stats::allocated::mib().unwrap().read().unwrap();
    let resident_bytes = stats::resident::mib().unwrap().read().unwrap();
    (
        allocated_bytes as f64 / (1024.0 * 1024.0),
        resident_bytes as f64 / (1024.0 * 1024.0),
    )
}

/// Parses textual matrix rows: one row per line, each line the 0-based
/// column indices the row covers. Blank lines and lines starting with `#`
/// are ignored.
fn parse_textual_rows(input: &str) -> Result<Vec<Vec<usize>>, String> {
    input
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| {
            line.split_whitespace()
                .map(|token| {
                    token
                        .parse::<usize>()
                        .map_err(|_| format!("invalid column index {token:?}"))
                })
                .collect()
        })
        .collect()
}

/// Helper function to print a single statistic line in a formatted table
/// row.
fn stat_line(label: &str, value: impl fmt::Display) {
    println!("|  {label:<28} {value:>18}  |");
}

/// Helper function to print a statistic line that includes a rate
/// (value/second).
fn stat_line_with_rate(label: &str, value: usize, elapsed: f64) {
    let rate = if elapsed > 0.0 {
        value as f64 / elapsed
    } else {
        0.0
    };
    println!("|  {label:<20} {value:>12} ({rate:>9.0}/sec)  |");
}

/// Prints a summary of problem and search statistics.
fn print_stats(
    parse_time: Duration,
    elapsed: Duration,
    columns: usize,
    rows: usize,
    s: &SearchStats,
    allocated: f64,
    resident: f64,
) {
    let elapsed_secs = elapsed.as_secs_f64();

    println!("\n=======================[ Problem Statistics ]========================");
    stat_line("Parse time (s)", format!("{:.3}", parse_time.as_secs_f64()));
    stat_line("Columns", columns);
    stat_line("Rows", rows);

    println!("========================[ Search Statistics ]========================");
    stat_line_with_rate("Decisions", s.decisions, elapsed_secs);
    stat_line_with_rate("Dead ends", s.dead_ends, elapsed_secs);
    stat_line("Solutions", s.solutions);
    stat_line("Max depth", s.max_depth);
    stat_line("Memory usage (MiB)", format!("{allocated:.2}"));
    stat_line("Resident memory (MiB)", format!("{resident:.2}"));
    stat_line("CPU time (s)", format!("{elapsed_secs:.3}"));
    println!("=====================================================================");
}
