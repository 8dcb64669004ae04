//! Davis-Putnam: satisfiability by variable elimination.
//!
//! The solver holds one current formula and repeatedly replaces it with a
//! smaller-or-equal equisatisfiable one:
//!
//! 1.  **Terminal checks:** no clauses means SAT, an empty clause UNSAT.
//! 2.  **Unit propagation** and **pure-literal elimination** while they apply.
//! 3.  **Elimination:** the most frequent variable `v` is resolved away. Every
//!     clause holding `v` is resolved with every clause holding `-v`,
//!     tautological resolvents are dropped, and the resolvents replace all
//!     clauses mentioning `v`.
//! 4.  **Subsumption:** clauses that are supersets of other clauses are removed
//!     to keep the clause set from ballooning between rounds.
//!
//! Each elimination removes a variable for good, so the loop ends after at
//! most as many eliminations as there are variables. The number of resolvents
//! can still grow quadratically per round, which is what the clause limit of
//! the [`Budget`] guards against.

use crate::sat::clause::Clause;
use crate::sat::cnf::Formula;
use crate::sat::literal::{Literal, Variable};
use crate::sat::simplify::{self, Simplification, Status, SubsumptionElimination};
use crate::sat::solver::{Budget, SolutionStats, SolveError, Solver, Verdict};
use std::cmp::Reverse;
use tracing::{debug, trace};

/// Davis-Putnam solver: simplification plus variable elimination by resolution.
#[derive(Debug, Clone)]
pub struct Dp {
    formula: Formula,
    budget: Budget,
    stats: SolutionStats,
}

impl Solver for Dp {
    fn with_budget(formula: Formula, budget: Budget) -> Self {
        Self {
            formula,
            budget,
            stats: SolutionStats::default(),
        }
    }

    fn solve(&mut self) -> Result<Verdict, SolveError> {
        let mut current = self.formula.clone();

        loop {
            self.budget.check_interrupt()?;
            self.stats.observe_clauses(current.len());

            match simplify::status(&current) {
                Status::Sat => return Ok(Verdict::Sat),
                Status::Unsat => return Ok(Verdict::Unsat),
                Status::Open => {}
            }

            if let Some((rule, next)) = simplify::simplify_once(&current) {
                match rule {
                    Simplification::UnitPropagation(lit) => {
                        trace!("dp: unit {lit}");
                        self.stats.propagations += 1;
                    }
                    Simplification::PureLiteral(lit) => {
                        trace!("dp: pure {lit}");
                        self.stats.pure_literals += 1;
                    }
                }
                current = next;
                continue;
            }

            let Some(var) = Self::select_variable(&current) else {
                // An open formula always mentions a variable.
                return Ok(Verdict::Sat);
            };

            let eliminated = self.eliminate(&current, var)?;
            let (reduced, removed) = SubsumptionElimination.apply(eliminated);
            self.stats.subsumed += removed;
            self.budget.check_clauses(reduced.len())?;

            debug!(
                "dp: eliminated x{var}, {} clauses left ({removed} subsumed)",
                reduced.len()
            );
            current = reduced;
        }
    }

    fn stats(&self) -> SolutionStats {
        self.stats
    }
}

impl Dp {
    /// Variable with the most occurrences; ties go to the lowest id.
    fn select_variable(formula: &Formula) -> Option<Variable> {
        formula
            .occurrences()
            .into_iter()
            .max_by_key(|&(var, count)| (count, Reverse(var)))
            .map(|(var, _)| var)
    }

    /// Replaces every clause mentioning `var` by the non-tautological
    /// resolvents on `var`.
    fn eliminate(&mut self, formula: &Formula, var: Variable) -> Result<Formula, SolveError> {
        let pos = Literal::new(var, true);
        let neg = pos.negated();

        let mut positive: Vec<&Clause> = Vec::new();
        let mut negative: Vec<&Clause> = Vec::new();
        let mut next: Vec<Clause> = Vec::new();

        for clause in formula.iter() {
            let has_pos = clause.contains(pos);
            let has_neg = clause.contains(neg);
            if has_pos {
                positive.push(clause);
            }
            if has_neg {
                negative.push(clause);
            }
            if !has_pos && !has_neg {
                next.push(clause.clone());
            }
        }

        for c1 in &positive {
            self.budget.check_interrupt()?;
            for c2 in &negative {
                let resolvent = c1.resolve(c2, pos);
                if resolvent.is_tautology() {
                    self.stats.tautologies += 1;
                    continue;
                }
                self.stats.resolvents += 1;
                next.push(resolvent);
            }
        }

        self.stats.eliminations += 1;
        Ok(Formula::new(next))
    }
}
