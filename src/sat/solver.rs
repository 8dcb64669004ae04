#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! The contract shared by the three decision procedures.
//!
//! Each engine consumes a whole [`Formula`] and answers with a [`Verdict`].
//! Engines are stateless between solves: a fresh instance is built per
//! formula, and any caches it owns die with it.
//!
//! The only ways a solve can fail are imposed from outside through a
//! [`Budget`]: a clause limit for procedures whose clause set may grow
//! without bound, and an [`Interrupt`] the driver triggers when a deadline
//! passes. With `Budget::default()` every solve returns `Ok`.

use crate::sat::cnf::Formula;
use crate::sat::dp::Dp;
use crate::sat::dpll::Dpll;
use crate::sat::resolution::Resolution;
use clap::ValueEnum;
use std::fmt::{self, Display};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

/// Outcome of a completed solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    /// Some assignment satisfies every clause.
    Sat,
    /// No assignment does.
    Unsat,
}

impl Verdict {
    /// `true` for [`Verdict::Sat`].
    #[must_use]
    pub const fn is_sat(self) -> bool {
        matches!(self, Self::Sat)
    }
}

impl From<bool> for Verdict {
    fn from(sat: bool) -> Self {
        if sat { Self::Sat } else { Self::Unsat }
    }
}

impl Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sat => write!(f, "SAT"),
            Self::Unsat => write!(f, "UNSAT"),
        }
    }
}

/// Reasons a solve stopped without a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SolveError {
    /// The budget's [`Interrupt`] was triggered.
    #[error("solve interrupted")]
    Interrupted,

    /// The engine held more clauses than the budget allows.
    #[error("clause limit of {limit} exceeded ({reached} clauses held)")]
    ClauseLimitExceeded {
        /// The configured maximum.
        limit: usize,
        /// The count that broke it.
        reached: usize,
    },
}

/// Cooperative cancellation flag shared between a driver and one solve.
#[derive(Debug, Clone, Default)]
pub struct Interrupt(Arc<AtomicBool>);

impl Interrupt {
    /// A flag that has not been triggered.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Asks every solve sharing this flag to stop at its next check.
    pub fn trigger(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether [`Interrupt::trigger`] has been called.
    #[must_use]
    pub fn is_triggered(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Externally imposed resource bounds for one solve.
#[derive(Debug, Clone, Default)]
pub struct Budget {
    max_clauses: Option<usize>,
    interrupt: Option<Interrupt>,
}

impl Budget {
    /// No clause limit and no interrupt, same as `Budget::default()`.
    #[must_use]
    pub const fn unlimited() -> Self {
        Self {
            max_clauses: None,
            interrupt: None,
        }
    }

    /// Caps the number of clauses (or memoized formulas, for DPLL) an engine
    /// may hold at once.
    #[must_use]
    pub fn with_max_clauses(mut self, limit: Option<usize>) -> Self {
        self.max_clauses = limit;
        self
    }

    /// Attaches the flag the solve polls for cancellation.
    #[must_use]
    pub fn with_interrupt(mut self, interrupt: Interrupt) -> Self {
        self.interrupt = Some(interrupt);
        self
    }

    /// The configured clause limit, if any.
    #[must_use]
    pub const fn max_clauses(&self) -> Option<usize> {
        self.max_clauses
    }

    /// # Errors
    ///
    /// [`SolveError::Interrupted`] once the interrupt has been triggered.
    pub fn check_interrupt(&self) -> Result<(), SolveError> {
        match &self.interrupt {
            Some(interrupt) if interrupt.is_triggered() => Err(SolveError::Interrupted),
            _ => Ok(()),
        }
    }

    /// # Errors
    ///
    /// [`SolveError::ClauseLimitExceeded`] when `held` is above the limit.
    pub const fn check_clauses(&self, held: usize) -> Result<(), SolveError> {
        match self.max_clauses {
            Some(limit) if held > limit => Err(SolveError::ClauseLimitExceeded {
                limit,
                reached: held,
            }),
            _ => Ok(()),
        }
    }
}

/// Counters collected while solving. Engines only touch the fields that
/// apply to them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SolutionStats {
    /// Unit clauses propagated.
    pub propagations: usize,
    /// Pure literals eliminated.
    pub pure_literals: usize,
    /// DPLL branching points.
    pub decisions: usize,
    /// Variables eliminated by DP.
    pub eliminations: usize,
    /// Resolvents generated, before filtering.
    pub resolvents: usize,
    /// Tautological resolvents dropped.
    pub tautologies: usize,
    /// Clauses dropped as subsumed.
    pub subsumed: usize,
    /// Resolution saturation rounds.
    pub rounds: usize,
    /// DPLL memo hits.
    pub cache_hits: usize,
    /// Largest clause set held at once (memoized formulas for DPLL).
    pub peak_clauses: usize,
}

impl SolutionStats {
    pub(crate) fn observe_clauses(&mut self, held: usize) {
        self.peak_clauses = self.peak_clauses.max(held);
    }
}

/// A complete decision procedure for CNF satisfiability.
pub trait Solver {
    /// An engine for `formula` with an unlimited budget.
    fn new(formula: Formula) -> Self
    where
        Self: Sized,
    {
        Self::with_budget(formula, Budget::default())
    }

    /// An engine for `formula` bounded by `budget`.
    fn with_budget(formula: Formula, budget: Budget) -> Self
    where
        Self: Sized;

    /// Decides the formula handed to the constructor.
    ///
    /// # Errors
    ///
    /// Only when the [`Budget`] is exhausted or interrupted.
    fn solve(&mut self) -> Result<Verdict, SolveError>;

    /// Counters gathered by the last solve.
    fn stats(&self) -> SolutionStats;
}

/// Selectable decision procedures.
#[derive(Debug, Clone, PartialEq, Eq, Copy, Hash, Default, ValueEnum)]
pub enum SolverType {
    /// Saturation by resolution with a set of support.
    Resolution,
    /// Davis-Putnam variable elimination.
    Dp,
    /// Davis-Putnam-Logemann-Loveland memoized backtracking.
    #[default]
    Dpll,
}

impl SolverType {
    /// Every engine, in report order.
    pub const ALL: [Self; 3] = [Self::Resolution, Self::Dp, Self::Dpll];

    /// Builds the engine for `formula`.
    #[must_use]
    pub fn to_impl(self, formula: Formula, budget: Budget) -> SolverImpls {
        match self {
            Self::Resolution => SolverImpls::Resolution(Resolution::with_budget(formula, budget)),
            Self::Dp => SolverImpls::Dp(Dp::with_budget(formula, budget)),
            Self::Dpll => SolverImpls::Dpll(Dpll::with_budget(formula, budget)),
        }
    }

    /// One-shot convenience: builds the engine, solves, discards it.
    ///
    /// # Errors
    ///
    /// See [`Solver::solve`].
    pub fn solve(self, formula: Formula, budget: Budget) -> Result<Verdict, SolveError> {
        self.to_impl(formula, budget).solve()
    }
}

impl Display for SolverType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resolution => write!(f, "Resolution"),
            Self::Dp => write!(f, "DP"),
            Self::Dpll => write!(f, "DPLL"),
        }
    }
}

/// Static dispatch over the concrete engines.
#[derive(Debug, Clone)]
pub enum SolverImpls {
    /// See [`Resolution`].
    Resolution(Resolution),
    /// See [`Dp`].
    Dp(Dp),
    /// See [`Dpll`].
    Dpll(Dpll),
}

impl SolverImpls {
    /// The engine's selector.
    #[must_use]
    pub const fn kind(&self) -> SolverType {
        match self {
            Self::Resolution(_) => SolverType::Resolution,
            Self::Dp(_) => SolverType::Dp,
            Self::Dpll(_) => SolverType::Dpll,
        }
    }

    /// # Errors
    ///
    /// See [`Solver::solve`].
    pub fn solve(&mut self) -> Result<Verdict, SolveError> {
        match self {
            Self::Resolution(s) => s.solve(),
            Self::Dp(s) => s.solve(),
            Self::Dpll(s) => s.solve(),
        }
    }

    /// See [`Solver::stats`].
    #[must_use]
    pub fn stats(&self) -> SolutionStats {
        match self {
            Self::Resolution(s) => s.stats(),
            Self::Dp(s) => s.stats(),
            Self::Dpll(s) => s.stats(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn formula(clauses: Vec<Vec<i32>>) -> Formula {
        Formula::from(clauses)
    }

    fn all_agree(f: &Formula) -> Verdict {
        let verdicts: Vec<Verdict> = SolverType::ALL
            .iter()
            .map(|kind| kind.solve(f.clone(), Budget::default()).unwrap())
            .collect();
        assert!(
            verdicts.windows(2).all(|w| w[0] == w[1]),
            "engines disagree on {f}: {verdicts:?}"
        );
        verdicts[0]
    }

    #[test]
    fn test_base_cases() {
        assert_eq!(all_agree(&Formula::default()), Verdict::Sat);
        assert_eq!(all_agree(&formula(vec![vec![]])), Verdict::Unsat);
    }

    #[test]
    fn test_scenarios() {
        assert_eq!(
            all_agree(&formula(vec![vec![1, 2], vec![-1], vec![-2]])),
            Verdict::Unsat
        );
        assert_eq!(all_agree(&formula(vec![vec![1], vec![-1, 2]])), Verdict::Sat);
        assert_eq!(all_agree(&formula(vec![vec![1, -1]])), Verdict::Sat);
        assert_eq!(
            all_agree(&formula(vec![
                vec![1, 2],
                vec![1, -2],
                vec![-1, 2],
                vec![-1, -2]
            ])),
            Verdict::Unsat
        );
    }

    #[test]
    fn test_interrupt_aborts_every_engine() {
        let f = formula(vec![vec![1, 2, 3], vec![-1, 2], vec![-2, 3], vec![-3, -1]]);
        let interrupt = Interrupt::new();
        interrupt.trigger();
        for kind in SolverType::ALL {
            let budget = Budget::default().with_interrupt(interrupt.clone());
            assert_eq!(kind.solve(f.clone(), budget), Err(SolveError::Interrupted));
        }
    }

    #[test]
    fn test_budget_checks() {
        let budget = Budget::unlimited().with_max_clauses(Some(2));
        assert!(budget.check_clauses(2).is_ok());
        assert_eq!(
            budget.check_clauses(3),
            Err(SolveError::ClauseLimitExceeded {
                limit: 2,
                reached: 3
            })
        );
        assert!(budget.check_interrupt().is_ok());
    }

    #[test]
    fn test_impls_report_kind() {
        for kind in SolverType::ALL {
            assert_eq!(kind.to_impl(Formula::default(), Budget::default()).kind(), kind);
        }
    }

    #[test]
    fn test_display_names() {
        assert_eq!(SolverType::Resolution.to_string(), "Resolution");
        assert_eq!(SolverType::Dp.to_string(), "DP");
        assert_eq!(SolverType::Dpll.to_string(), "DPLL");
        assert_eq!(Verdict::from(false).to_string(), "UNSAT");
    }
}
