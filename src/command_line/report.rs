//! Result lines, statistics tables and batch summaries.
//!
//! Every line goes to stdout and, when an output file was requested, to that
//! file as well.

use crate::command_line::runner::Outcome;
use anyhow::{Context, Result};
use classical_sat::sat::solver::{SolutionStats, SolverType};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::time::{Duration, Instant};

pub(crate) const TITLE: &str = "Solver     | SAT   | Time(s)  | Peak KiB";

/// Writes report lines to stdout and an optional output file.
pub(crate) struct Reporter {
    file: Option<BufWriter<File>>,
}

impl Reporter {
    pub(crate) fn new(output: Option<&Path>) -> Result<Self> {
        let file = output
            .map(|path| {
                File::create(path)
                    .map(BufWriter::new)
                    .with_context(|| format!("cannot create output file {}", path.display()))
            })
            .transpose()?;
        Ok(Self { file })
    }

    pub(crate) fn line(&mut self, text: impl AsRef<str>) -> io::Result<()> {
        let text = text.as_ref();
        println!("{text}");
        if let Some(file) = &mut self.file {
            writeln!(file, "{text}")?;
        }
        Ok(())
    }

    pub(crate) fn lines<I, S>(&mut self, lines: I) -> io::Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        lines.into_iter().try_for_each(|line| self.line(line))
    }

    pub(crate) fn finish(self) -> io::Result<()> {
        match self.file {
            Some(mut file) => file.flush(),
            None => Ok(()),
        }
    }
}

pub(crate) fn formula_header(index: usize, total: usize, name: &str) -> String {
    format!("=== Formula {index}/{total}: {name} ===")
}

pub(crate) fn separator() -> String {
    "-".repeat(TITLE.len())
}

/// One result row, e.g. `DPLL       | SAT   | 0.0012 s | 3.5     KiB`.
pub(crate) fn outcome_line(kind: SolverType, outcome: &Outcome) -> String {
    let name = kind.to_string();
    match outcome {
        Outcome::Completed(run) => format!(
            "{name:<10} | {:<5} | {:<7.4}s | {:<8.1}KiB",
            run.verdict.to_string(),
            run.elapsed.as_secs_f64(),
            run.peak_kib
        ),
        Outcome::TimedOut(after) => {
            format!("{name:<10} | TIMED OUT after {}s", after.as_secs_f64())
        }
        Outcome::Aborted(reason) => format!("{name:<10} | ABORTED: {reason}"),
    }
}

/// Formats a single statistic line in a table row.
pub(crate) fn stat_line(label: &str, value: impl std::fmt::Display) -> String {
    format!("|  {label:<28} {value:>18}  |")
}

/// A statistic line that includes a rate (value/second).
#[allow(clippy::cast_precision_loss)]
pub(crate) fn stat_line_with_rate(label: &str, value: usize, elapsed: f64) -> String {
    let rate = if elapsed > 0.0 {
        value as f64 / elapsed
    } else {
        0.0
    };
    format!("|  {label:<20} {value:>12} ({rate:>9.0}/sec)  |")
}

/// Counters relevant to `kind`, framed like the rest of the stat tables.
pub(crate) fn stats_table(kind: SolverType, s: &SolutionStats, elapsed: Duration) -> Vec<String> {
    let secs = elapsed.as_secs_f64();
    let mut lines = vec![format!("{:=^53}", format!("[ {kind} Statistics ]"))];

    match kind {
        SolverType::Resolution => {
            lines.push(stat_line("Rounds", s.rounds));
            lines.push(stat_line_with_rate("Resolvents", s.resolvents, secs));
            lines.push(stat_line("Tautologies dropped", s.tautologies));
            lines.push(stat_line("Subsumed resolvents", s.subsumed));
            lines.push(stat_line("Peak clauses", s.peak_clauses));
        }
        SolverType::Dp => {
            lines.push(stat_line_with_rate("Propagations", s.propagations, secs));
            lines.push(stat_line("Pure literals", s.pure_literals));
            lines.push(stat_line("Eliminated variables", s.eliminations));
            lines.push(stat_line_with_rate("Resolvents", s.resolvents, secs));
            lines.push(stat_line("Tautologies dropped", s.tautologies));
            lines.push(stat_line("Subsumed clauses", s.subsumed));
            lines.push(stat_line("Peak clauses", s.peak_clauses));
        }
        SolverType::Dpll => {
            lines.push(stat_line_with_rate("Propagations", s.propagations, secs));
            lines.push(stat_line("Pure literals", s.pure_literals));
            lines.push(stat_line_with_rate("Decisions", s.decisions, secs));
            lines.push(stat_line("Cache hits", s.cache_hits));
            lines.push(stat_line("Cached formulas", s.peak_clauses));
        }
    }

    lines.push("=".repeat(53));
    lines
}

/// Per-engine accumulators over a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct EngineTotals {
    pub completed: usize,
    pub timeouts: usize,
    pub aborted: usize,
    pub time: Duration,
    pub peak_kib: f64,
}

#[derive(Debug, Clone)]
pub(crate) struct Summary {
    engines: Vec<(SolverType, EngineTotals)>,
    started: Instant,
}

impl Summary {
    pub(crate) fn new(kinds: &[SolverType]) -> Self {
        Self {
            engines: kinds.iter().map(|&kind| (kind, EngineTotals::default())).collect(),
            started: Instant::now(),
        }
    }

    pub(crate) fn record(&mut self, kind: SolverType, outcome: &Outcome) {
        let Some((_, totals)) = self.engines.iter_mut().find(|(k, _)| *k == kind) else {
            return;
        };
        match outcome {
            Outcome::Completed(run) => {
                totals.completed += 1;
                totals.time += run.elapsed;
                totals.peak_kib += run.peak_kib;
            }
            Outcome::TimedOut(_) => totals.timeouts += 1,
            Outcome::Aborted(_) => totals.aborted += 1,
        }
    }

    #[cfg(test)]
    pub(crate) fn totals(&self, kind: SolverType) -> Option<&EngineTotals> {
        self.engines.iter().find(|(k, _)| *k == kind).map(|(_, t)| t)
    }

    pub(crate) fn lines(&self) -> Vec<String> {
        self.lines_with_wall(self.started.elapsed())
    }

    #[allow(clippy::cast_precision_loss)]
    pub(crate) fn lines_with_wall(&self, wall: Duration) -> Vec<String> {
        let mut lines = vec!["=== Summary ===".to_string()];

        for (kind, t) in &self.engines {
            let name = kind.to_string();
            let runs = if t.completed == 0 {
                format!("  {name:<10}: no completed runs")
            } else {
                let avg = t.time.as_secs_f64() / t.completed as f64;
                format!("  {name:<10}: {avg:.4}s average over {} formulas", t.completed)
            };
            lines.push(format!("{runs} ({} timed out, {} aborted)", t.timeouts, t.aborted));
        }

        let total_time: f64 = self.engines.iter().map(|(_, t)| t.time.as_secs_f64()).sum();
        let total_peak: f64 = self.engines.iter().map(|(_, t)| t.peak_kib).sum();
        let wall = wall.as_secs_f64();

        lines.push(String::new());
        lines.push(format!("Total combined solver time:  {total_time:.4}s"));
        lines.push(format!("Total combined peak memory:  {total_peak:.1}KiB"));
        lines.push(format!("Total wall time:             {wall:.4}s ({:.4} min)", wall / 60.0));
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command_line::runner::Run;
    use classical_sat::sat::solver::Verdict;

    fn completed(verdict: Verdict, millis: u64, peak_kib: f64) -> Outcome {
        Outcome::Completed(Run {
            verdict,
            elapsed: Duration::from_millis(millis),
            peak_kib,
            stats: SolutionStats::default(),
        })
    }

    #[test]
    fn test_outcome_lines() {
        let line = outcome_line(SolverType::Dpll, &completed(Verdict::Sat, 1500, 12.0));
        assert_eq!(line, "DPLL       | SAT   | 1.5000 s | 12.0    KiB");

        let line = outcome_line(SolverType::Dp, &completed(Verdict::Unsat, 0, 0.0));
        assert!(line.starts_with("DP         | UNSAT | 0.0000 s"));

        let line = outcome_line(SolverType::Resolution, &Outcome::TimedOut(Duration::from_secs(5)));
        assert_eq!(line, "Resolution | TIMED OUT after 5s");

        let line = outcome_line(SolverType::Dp, &Outcome::Aborted("solve interrupted".into()));
        assert_eq!(line, "DP         | ABORTED: solve interrupted");
    }

    #[test]
    fn test_title_and_separator_align() {
        assert_eq!(separator().len(), TITLE.len());
        assert_eq!(formula_header(2, 3, "php"), "=== Formula 2/3: php ===");
    }

    #[test]
    fn test_summary_accumulates() {
        let mut summary = Summary::new(&[SolverType::Dp, SolverType::Dpll]);
        summary.record(SolverType::Dp, &completed(Verdict::Sat, 100, 4.0));
        summary.record(SolverType::Dp, &completed(Verdict::Unsat, 300, 6.0));
        summary.record(SolverType::Dp, &Outcome::TimedOut(Duration::from_secs(1)));
        summary.record(SolverType::Dpll, &Outcome::Aborted("x".into()));
        summary.record(SolverType::Resolution, &completed(Verdict::Sat, 1, 1.0));

        let dp = summary.totals(SolverType::Dp).unwrap();
        assert_eq!(dp.completed, 2);
        assert_eq!(dp.timeouts, 1);
        assert_eq!(dp.time, Duration::from_millis(400));
        assert!(summary.totals(SolverType::Resolution).is_none());

        let lines = summary.lines_with_wall(Duration::from_secs(90));
        assert_eq!(
            lines[1],
            "  DP        : 0.2000s average over 2 formulas (1 timed out, 0 aborted)"
        );
        assert_eq!(lines[2], "  DPLL      : no completed runs (0 timed out, 1 aborted)");
        assert!(lines.iter().any(|l| l.contains("0.4000s")));
        assert!(lines.iter().any(|l| l.contains("10.0KiB")));
        assert!(lines.iter().any(|l| l.contains("(1.5000 min)")));
    }

    #[test]
    fn test_stat_lines() {
        assert_eq!(stat_line("Rounds", 3).len(), 53);
        assert!(stat_line_with_rate("Decisions", 10, 0.0).contains("(        0/sec)"));
        let table = stats_table(SolverType::Dpll, &SolutionStats::default(), Duration::ZERO);
        assert!(table[0].contains("[ DPLL Statistics ]"));
        assert!(table.iter().any(|l| l.contains("Cache hits")));
    }

    #[test]
    fn test_reporter_writes_file() {
        let path = std::env::temp_dir().join(format!("classical-sat-report-{}.txt", std::process::id()));
        let mut reporter = Reporter::new(Some(path.as_path())).unwrap();
        reporter.line("first").unwrap();
        reporter.lines(["second", "third"]).unwrap();
        reporter.finish().unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, "first\nsecond\nthird\n");
        std::fs::remove_file(path).unwrap();
    }
}
