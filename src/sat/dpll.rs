//! Defines the memoized DPLL (Davis-Putnam-Logemann-Loveland) SAT solver.
//!
//! The search works directly on formula values rather than on an assignment
//! trail. Every node of the search is a [`Formula`]; assigning a literal
//! produces the child formula. This makes the formula itself a sound cache
//! key: two search paths that reach equal clause sets share one answer.
//!
//! The core logic, first matching rule wins:
//! 1.  **Terminal checks:** an empty formula is SAT, an empty clause UNSAT.
//! 2.  **Unit propagation:** a unit clause fixes its literal; the search
//!     continues on the propagated formula without branching.
//! 3.  **Pure literals:** clauses holding a pure literal are dropped.
//! 4.  **Decision:** the first literal of the first (shortest) clause is set
//!     true. If that branch is SAT the other one is never explored, otherwise
//!     the answer is whatever the branch with the literal set false yields.
//!
//! Rules 2 and 3 never branch, so they run as a loop inside one search frame;
//! every formula met along that chain is cached with the frame's verdict.
//! Recursion depth is bounded by the number of decisions, which is at most
//! the number of variables.

use crate::sat::cnf::Formula;
use crate::sat::literal::Literal;
use crate::sat::simplify::{self, Simplification, Status};
use crate::sat::solver::{Budget, SolutionStats, SolveError, Solver, Verdict};
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

/// Memoized DPLL search over formula values.
#[derive(Debug, Clone)]
pub struct Dpll {
    formula: Formula,
    budget: Budget,
    stats: SolutionStats,
    /// Verdicts keyed by the exact clause set, alive for one solver instance.
    cache: FxHashMap<Formula, Verdict>,
}

impl Solver for Dpll {
    fn with_budget(formula: Formula, budget: Budget) -> Self {
        Self {
            formula,
            budget,
            stats: SolutionStats::default(),
            cache: FxHashMap::default(),
        }
    }

    fn solve(&mut self) -> Result<Verdict, SolveError> {
        self.cache.clear();
        let verdict = self.search(self.formula.clone())?;
        debug!(
            "dpll: {verdict} after {} decisions, {} cached formulas",
            self.stats.decisions,
            self.cache.len()
        );
        Ok(verdict)
    }

    fn stats(&self) -> SolutionStats {
        self.stats
    }
}

impl Dpll {
    fn search(&mut self, formula: Formula) -> Result<Verdict, SolveError> {
        let mut current = formula;
        let mut chain: Vec<Formula> = Vec::new();

        let verdict = loop {
            self.budget.check_interrupt()?;

            if let Some(&cached) = self.cache.get(&current) {
                self.stats.cache_hits += 1;
                break cached;
            }

            match simplify::status(&current) {
                Status::Sat => break Verdict::Sat,
                Status::Unsat => break Verdict::Unsat,
                Status::Open => {}
            }

            if let Some((rule, next)) = simplify::simplify_once(&current) {
                match rule {
                    Simplification::UnitPropagation(lit) => {
                        trace!("dpll: unit {lit}");
                        self.stats.propagations += 1;
                    }
                    Simplification::PureLiteral(lit) => {
                        trace!("dpll: pure {lit}");
                        self.stats.pure_literals += 1;
                    }
                }
                chain.push(std::mem::replace(&mut current, next));
                continue;
            }

            let Some(lit) = Self::branching_literal(&current) else {
                break Verdict::Sat;
            };
            self.stats.decisions += 1;
            trace!("dpll: decide {lit}");

            if self.search(current.assign(lit))?.is_sat() {
                break Verdict::Sat;
            }
            break self.search(current.assign(lit.negated()))?;
        };

        chain.push(current);
        for formula in chain {
            self.cache.insert(formula, verdict);
        }
        self.stats.observe_clauses(self.cache.len());
        self.budget.check_clauses(self.cache.len())?;

        Ok(verdict)
    }

    /// First literal of the first clause in canonical order: a literal of a
    /// shortest clause, over the lowest variable in it.
    fn branching_literal(formula: &Formula) -> Option<Literal> {
        formula.iter().find_map(|clause| clause.first())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solve(clauses: Vec<Vec<i32>>) -> Verdict {
        Dpll::new(Formula::from(clauses)).solve().unwrap()
    }

    #[test]
    fn test_base_cases() {
        assert_eq!(solve(vec![]), Verdict::Sat);
        assert_eq!(solve(vec![vec![]]), Verdict::Unsat);
    }

    #[test]
    fn test_unit_chains() {
        assert_eq!(solve(vec![vec![1, 2], vec![-1], vec![-2]]), Verdict::Unsat);
        assert_eq!(solve(vec![vec![1], vec![-1, 2]]), Verdict::Sat);
    }

    #[test]
    fn test_tautological_input() {
        assert_eq!(solve(vec![vec![1, -1]]), Verdict::Sat);
    }

    #[test]
    fn test_branching_unsat() {
        let mut dpll = Dpll::new(Formula::from(vec![
            vec![1, 2],
            vec![1, -2],
            vec![-1, 2],
            vec![-1, -2],
        ]));
        assert_eq!(dpll.solve().unwrap(), Verdict::Unsat);
        assert_eq!(dpll.stats().decisions, 1);
    }

    #[test]
    fn test_sat_branch_short_circuits() {
        // Setting -1 leaves the units 2 and -3, which propagate to the empty
        // formula.
        let mut dpll = Dpll::new(Formula::from(vec![
            vec![1, 2],
            vec![-1, 3],
            vec![-1, -2],
            vec![1, -3],
        ]));
        assert_eq!(dpll.solve().unwrap(), Verdict::Sat);
        assert_eq!(dpll.stats().decisions, 1);
    }

    #[test]
    fn test_memoization_reuses_formulas() {
        // Every clause over x1 comes in a {1} ∪ A, {-1} ∪ A pair, so both
        // branches on x1 reach the same residual formula.
        let mut dpll = Dpll::new(Formula::from(vec![
            vec![1, 2, 3],
            vec![-1, 2, 3],
            vec![1, -2, 4],
            vec![-1, -2, 4],
            vec![2, -3, -4],
            vec![-2, -4, 3],
            vec![-2, -3, -4],
            vec![2, 3, 4],
            vec![2, 3, -4],
            vec![-2, 3, 4],
            vec![2, -3, 4],
        ]));
        assert_eq!(dpll.solve().unwrap(), Verdict::Unsat);
        assert!(dpll.stats().cache_hits >= 1);
        assert!(dpll.cache.contains_key(&dpll.formula));
    }

    #[test]
    fn test_cache_stays_per_instance() {
        let mut first = Dpll::new(Formula::from(vec![vec![1, 2], vec![-1, 2]]));
        first.solve().unwrap();
        let second = Dpll::new(Formula::from(vec![vec![1, 2], vec![-1, 2]]));
        assert!(!first.cache.is_empty());
        assert!(second.cache.is_empty());
    }

    #[test]
    fn test_memo_limit() {
        let clauses = vec![
            vec![1, 2, 3],
            vec![1, -2, -3],
            vec![-1, 2, -3],
            vec![-1, -2, 3],
            vec![1, 2, -3],
            vec![-1, -2, -3],
        ];
        let budget = Budget::default().with_max_clauses(Some(0));
        let result = Dpll::with_budget(Formula::from(clauses), budget).solve();
        assert!(matches!(result, Err(SolveError::ClauseLimitExceeded { limit: 0, .. })));
    }
}
