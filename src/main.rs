//! # classical-sat
//!
//! Runs the Resolution, Davis-Putnam and DPLL decision procedures on CNF
//! formulas in DIMACS format and reports, per formula and engine, the
//! verdict, the time taken and the peak memory allocated.
//!
//! ## Usage
//!
//! ```sh
//! classical-sat [OPTIONS] [PATH] [COMMAND]
//! ```
//!
//! -   `PATH` without a subcommand: a file is solved formula by formula, a
//!     `.tar.gz` archive member by member, and a directory is walked
//!     recursively for `.cnf` and `.dimacs` files.
//! -   `file --path <P> [--output <O>]`: solve every formula in one file.
//! -   `text [--input <S>]`: solve CNF text, e.g. `"1 -2 0\n2 3 0"`, or
//!     clauses typed on stdin up to a blank line.
//! -   `dir --path <D> [--output <O>]`: solve a directory batch.
//! -   `archive --path <A> [--output <O>]`: solve the formula files of a
//!     `.tar.gz` archive.
//! -   `completions <SHELL>`: print a shell completion script.
//!
//! A file may hold several formulas, each opened by a `c formula: <name>`
//! comment.
//!
//! ## Common Options
//!
//! -   `--solvers <LIST>`: comma-separated engines, default
//!     `resolution,dp,dpll`.
//! -   `--timeout <SECS>`: wall-clock limit per run (default: 1000).
//! -   `--max-clauses <N>`: abort engines holding more clauses than this.
//! -   `-d, --debug` / `-q, --quiet`: log verbosity when `RUST_LOG` is unset.
//! -   `-s, --stats`: print engine statistics after every completed run.
//!
//! ## Example Invocations
//!
//! ```sh
//! # Every engine on every formula of a file, report also saved to disk
//! classical-sat file --path exercises.cnf --output results.txt
//!
//! # Only DP and DPLL over a benchmark directory with a 60 s limit
//! classical-sat dir --path benchmarks/ --solvers dp,dpll --timeout 60
//!
//! # Quick check of a formula typed inline
//! classical-sat text --input "1 2 0\n-1 0\n-2 0"
//!
//! # A packed benchmark set
//! classical-sat archive --path uf20-91.tar.gz --solvers dpll
//! ```

use crate::command_line::cli::{self, Cli, CommonOptions};
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod command_line;

/// Global allocator using `tikv-jemallocator`, whose statistics back the
/// peak-memory figures of every run.
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

/// Installs the stderr log layer; `RUST_LOG` takes precedence over the flags.
fn init_tracing(options: &CommonOptions) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(options.log_level()));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.options());
    cli::run(cli)
}
