use crate::command_line::archive;
use crate::command_line::report::{self, Reporter, Summary, TITLE};
use crate::command_line::runner::{self, Limits, Outcome};
use anyhow::{Context, Result, bail};
use classical_sat::sat::dimacs::{self, NamedFormula};
use classical_sat::sat::solver::SolverType;
use clap::{Args, CommandFactory, Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Per-run wall-clock limit when none is given.
pub(crate) const DEFAULT_TIMEOUT_SECS: f64 = 1000.0;

/// File extensions picked up when walking a directory.
const FORMULA_EXTENSIONS: [&str; 2] = ["cnf", "dimacs"];

/// Defines the command-line interface for the classical-sat application.
///
/// Uses `clap` for parsing arguments.
#[derive(Parser, Debug)]
#[command(
    name = "classical-sat",
    version,
    about = "Resolution, DP and DPLL on CNF formulas"
)]
pub(crate) struct Cli {
    /// An optional path. Without a subcommand a file is solved formula by
    /// formula, a `.tar.gz` archive member by member, and a directory is
    /// walked for `.cnf` and `.dimacs` files.
    pub path: Option<PathBuf>,

    /// Specifies the subcommand to execute (e.g. `file`, `text`, `dir`, `archive`).
    #[clap(subcommand)]
    pub command: Option<Commands>,

    /// Common options applicable to all commands.
    #[command(flatten)]
    pub common: CommonOptions,
}

/// Enumerates the available subcommands.
#[derive(Subcommand, Debug)]
pub(crate) enum Commands {
    /// Solve every formula in a DIMACS file.
    File {
        /// Path to the DIMACS file.
        #[arg(long)]
        path: PathBuf,

        /// Also write the report to this file.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Common options for this subcommand.
        #[command(flatten)]
        common: CommonOptions,
    },

    /// Solve a CNF formula provided as plain text.
    Text {
        /// Literal CNF input as a string (e.g. "1 -2 0\n2 3 0").
        /// Each line represents a clause, literals are space-separated, and 0 terminates a clause.
        /// Without it, clauses are read from stdin until a blank line.
        #[arg(short, long)]
        input: Option<String>,

        /// Common options for this subcommand.
        #[command(flatten)]
        common: CommonOptions,
    },

    /// Solve every `.cnf` and `.dimacs` file below a directory.
    Dir {
        /// Directory to walk recursively.
        #[arg(long)]
        path: PathBuf,

        /// Also write the report to this file.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Common options for this subcommand.
        #[command(flatten)]
        common: CommonOptions,
    },

    /// Solve every `.cnf` and `.dimacs` member of a `.tar.gz` archive.
    Archive {
        /// Path to the archive.
        #[arg(long)]
        path: PathBuf,

        /// Also write the report to this file.
        #[arg(short, long)]
        output: Option<PathBuf>,

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

/// Defines common command-line options shared across different subcommands.
#[derive(Args, Debug, Clone)]
#[allow(clippy::struct_excessive_bools)]
pub(crate) struct CommonOptions {
    /// Engines to run on every formula, comma separated.
    #[arg(
        long,
        value_enum,
        value_delimiter = ',',
        default_values = ["resolution", "dp", "dpll"]
    )]
    pub(crate) solvers: Vec<SolverType>,

    /// Wall-clock limit per engine run, in seconds.
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub(crate) timeout: f64,

    /// Abort Resolution and DP once they hold more clauses than this, and
    /// DPLL once it caches more formulas than this.
    #[arg(long)]
    pub(crate) max_clauses: Option<usize>,

    /// Enable debug logging of rule applications and eliminations.
    #[arg(short, long, default_value_t = false)]
    pub(crate) debug: bool,

    /// Only log errors.
    #[arg(short, long, default_value_t = false, conflicts_with = "debug")]
    pub(crate) quiet: bool,

    /// Print the engine statistics table after every completed run.
    #[arg(short, long, default_value_t = false)]
    pub(crate) stats: bool,
}

impl CommonOptions {
    /// Default log filter when `RUST_LOG` is not set.
    pub(crate) const fn log_level(&self) -> &'static str {
        if self.debug {
            "debug"
        } else if self.quiet {
            "error"
        } else {
            "warn"
        }
    }

    pub(crate) fn limits(&self) -> Result<Limits> {
        let timeout = Duration::try_from_secs_f64(self.timeout)
            .with_context(|| format!("invalid timeout: {}", self.timeout))?;
        Ok(Limits {
            timeout,
            max_clauses: self.max_clauses,
        })
    }
}

impl Cli {
    /// The options that apply to the selected command.
    pub(crate) fn options(&self) -> &CommonOptions {
        match &self.command {
            Some(
                Commands::File { common, .. }
                | Commands::Text { common, .. }
                | Commands::Dir { common, .. }
                | Commands::Archive { common, .. },
            ) => common,
            Some(Commands::Completions { .. }) | None => &self.common,
        }
    }
}

/// Dispatches the parsed command line.
pub(crate) fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Some(Commands::File {
            path,
            output,
            common,
        }) => solve_file(&path, output.as_deref(), &common),
        Some(Commands::Text { input, common }) => solve_text(input.as_deref(), &common),
        Some(Commands::Dir {
            path,
            output,
            common,
        }) => solve_dir(&path, output.as_deref(), &common),
        Some(Commands::Archive {
            path,
            output,
            common,
        }) => solve_archive(&path, output.as_deref(), &common),
        Some(Commands::Completions { shell }) => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "classical-sat", &mut io::stdout());
            Ok(())
        }
        None => match cli.path {
            Some(path) if path.is_dir() => solve_dir(&path, None, &cli.common),
            Some(path) if archive::is_archive(&path) => solve_archive(&path, None, &cli.common),
            Some(path) => solve_file(&path, None, &cli.common),
            None => bail!("no input given, pass a path or use --help"),
        },
    }
}

/// Solves every formula of one DIMACS file.
pub(crate) fn solve_file(path: &Path, output: Option<&Path>, common: &CommonOptions) -> Result<()> {
    let formulas = dimacs::parse_file(path)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    info!("{}: {} formulas", path.display(), formulas.len());

    let mut reporter = Reporter::new(output)?;
    let mut summary = Summary::new(&common.solvers);
    run_batch(&formulas, common, &mut reporter, &mut summary)?;
    finish(reporter, &summary, output)
}

/// Solves CNF text given on the command line, or typed on stdin when
/// `input` is `None`. A literal `\n` separates lines as well as a real
/// newline.
pub(crate) fn solve_text(input: Option<&str>, common: &CommonOptions) -> Result<()> {
    let (text, name) = match input {
        Some(input) => (input.replace("\\n", "\n"), "input"),
        None => (read_clause_lines(io::stdin().lock(), io::stderr())?, "stdin"),
    };
    let formulas = dimacs::parse_str(&text, name).context("failed to parse input")?;

    let mut reporter = Reporter::new(None)?;
    let mut summary = Summary::new(&common.solvers);
    run_batch(&formulas, common, &mut reporter, &mut summary)?;
    finish(reporter, &summary, None)
}

/// Collects clause lines from `input` until a blank line or end of input.
/// A line that does not parse is reported on `prompts` and must be retyped.
pub(crate) fn read_clause_lines<R: BufRead, W: Write>(input: R, mut prompts: W) -> Result<String> {
    writeln!(
        prompts,
        "Enter clauses as space-separated literals ending in 0, a blank line finishes:"
    )?;

    let mut text = String::new();
    for line in input.lines() {
        let line = line.context("failed to read stdin")?;
        let line = line.trim();
        if line.is_empty() {
            break;
        }
        if let Err(e) = dimacs::parse_str(line, "stdin") {
            writeln!(prompts, "{e}, try again")?;
            continue;
        }
        text.push_str(line);
        text.push('\n');
    }

    Ok(text)
}

/// Writes the notice shown when Resolution runs over many files.
fn warn_resolution(reporter: &mut Reporter, common: &CommonOptions, what: &str) -> Result<()> {
    if common.solvers.contains(&SolverType::Resolution) {
        reporter.line(format!("(!) Resolution selected for {what}, it may be inefficient."))?;
        reporter.line("")?;
    }
    Ok(())
}

/// Solves a directory of formula files.
/// Files that fail to parse are skipped with a warning.
pub(crate) fn solve_dir(path: &Path, output: Option<&Path>, common: &CommonOptions) -> Result<()> {
    if !path.is_dir() {
        bail!("provided path is not a directory: {}", path.display());
    }

    let files = formula_files(path);
    if files.is_empty() {
        warn!("no .cnf or .dimacs files found below {}", path.display());
    }

    let mut reporter = Reporter::new(output)?;
    let mut summary = Summary::new(&common.solvers);

    warn_resolution(&mut reporter, common, "a directory batch")?;

    for file in &files {
        reporter.line(format!("=== File: {} ===", file.display()))?;
        match dimacs::parse_file(file) {
            Ok(formulas) => run_batch(&formulas, common, &mut reporter, &mut summary)?,
            Err(e) => warn!("skipping {}: {e}", file.display()),
        }
    }

    finish(reporter, &summary, output)
}

/// Solves every formula member of a `.tar.gz` archive.
/// Members that fail to parse are skipped with a warning.
pub(crate) fn solve_archive(
    path: &Path,
    output: Option<&Path>,
    common: &CommonOptions,
) -> Result<()> {
    let members = archive::open(path)?;
    if members.is_empty() {
        warn!("no .cnf or .dimacs files found in {}", path.display());
    }
    info!("{}: {} formula files", path.display(), members.len());

    let mut reporter = Reporter::new(output)?;
    let mut summary = Summary::new(&common.solvers);
    warn_resolution(&mut reporter, common, "an archive")?;

    for member in members {
        reporter.line(format!("=== File in archive: {} ===", member.name))?;
        match member.formulas {
            Ok(formulas) => run_batch(&formulas, common, &mut reporter, &mut summary)?,
            Err(e) => warn!("skipping {}: {e}", member.name),
        }
    }

    finish(reporter, &summary, output)
}

/// Whether `path` ends in one of the formula file extensions.
pub(crate) fn has_formula_extension(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| FORMULA_EXTENSIONS.iter().any(|e| ext == *e))
}

/// Formula files below `root`, in file-name order.
pub(crate) fn formula_files(root: &Path) -> Vec<PathBuf> {
    walkdir::WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(walkdir::DirEntry::into_path)
        .filter(|path| has_formula_extension(path))
        .collect()
}

/// Runs every selected engine on every formula, reporting as it goes.
fn run_batch(
    formulas: &[NamedFormula],
    common: &CommonOptions,
    reporter: &mut Reporter,
    summary: &mut Summary,
) -> Result<()> {
    let limits = common.limits()?;
    let total = formulas.len();

    for (index, named) in formulas.iter().enumerate() {
        reporter.line(report::formula_header(index + 1, total, &named.name))?;
        reporter.line(TITLE)?;
        reporter.line(report::separator())?;

        for &kind in &common.solvers {
            let outcome = runner::run_engine(kind, &named.formula, limits)?;
            reporter.line(report::outcome_line(kind, &outcome))?;

            match &outcome {
                Outcome::Completed(run) if common.stats => {
                    reporter.lines(report::stats_table(kind, &run.stats, run.elapsed))?;
                }
                Outcome::TimedOut(after) => {
                    warn!("{kind} timed out on {} after {}s", named.name, after.as_secs_f64());
                }
                _ => {}
            }
            summary.record(kind, &outcome);
        }

        reporter.line("")?;
    }

    Ok(())
}

fn finish(mut reporter: Reporter, summary: &Summary, output: Option<&Path>) -> Result<()> {
    reporter.lines(summary.lines())?;
    reporter.finish()?;
    if let Some(path) = output {
        info!("results written to {}", path.display());
    }
    Ok(())
}
