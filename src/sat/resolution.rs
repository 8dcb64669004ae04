//! Saturation by resolution, restricted to a set of support.
//!
//! Clauses live in a [`ClauseBase`] that keeps three views of them: a literal
//! index (which clauses contain a literal), length buckets (which clauses have
//! a given length) and the arena itself. Each round resolves only the frontier,
//! the clauses admitted in the previous round, against the whole base. A pair
//! of older clauses was already resolved in the round one of them entered the
//! frontier, so nothing is lost by skipping it.
//!
//! A resolvent is admitted to the next frontier unless it is a tautology,
//! already known, or subsumed by a base clause that is no longer than it.
//! Deriving the empty clause proves UNSAT. A round that admits nothing means
//! saturation: no refutation exists, so the formula is SAT.
//!
//! Over a finite variable set there are finitely many non-tautological
//! clauses, so the rounds terminate. The base may still grow exponentially
//! before they do; bound it with [`Budget::with_max_clauses`].

use crate::sat::clause::Clause;
use crate::sat::cnf::Formula;
use crate::sat::literal::Literal;
use crate::sat::solver::{Budget, SolutionStats, SolveError, Solver, Verdict};
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::BTreeSet;
use tracing::{debug, trace};

/// Position of a clause in a [`ClauseBase`], stable for the base's lifetime.
pub type ClauseId = usize;

/// Indexed clause store used by the saturation loop.
#[derive(Debug, Clone, Default)]
pub struct ClauseBase {
    clauses: Vec<Clause>,
    members: FxHashSet<Clause>,
    by_literal: FxHashMap<Literal, Vec<ClauseId>>,
    by_length: Vec<Vec<ClauseId>>,
}

impl ClauseBase {
    /// Adds `clause` unless it is already present, returning its id if new.
    pub fn insert(&mut self, clause: Clause) -> Option<ClauseId> {
        if self.members.contains(&clause) {
            return None;
        }

        let id = self.clauses.len();
        for &lit in clause.iter() {
            self.by_literal.entry(lit).or_default().push(id);
        }
        if self.by_length.len() <= clause.len() {
            self.by_length.resize_with(clause.len() + 1, Vec::new);
        }
        self.by_length[clause.len()].push(id);
        self.members.insert(clause.clone());
        self.clauses.push(clause);

        Some(id)
    }

    /// Number of stored clauses.
    #[must_use]
    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    /// `true` before the first insertion.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// The clause stored under `id`.
    ///
    /// # Panics
    ///
    /// If `id` was not returned by [`ClauseBase::insert`] on this base.
    #[must_use]
    pub fn get(&self, id: ClauseId) -> &Clause {
        &self.clauses[id]
    }

    /// Exact membership, independent of subsumption.
    #[must_use]
    pub fn contains(&self, clause: &Clause) -> bool {
        self.members.contains(clause)
    }

    /// Ids of the clauses containing `lit`.
    #[must_use]
    pub fn occurrences(&self, lit: Literal) -> &[ClauseId] {
        self.by_literal.get(&lit).map_or(&[], Vec::as_slice)
    }

    /// Whether some stored clause no longer than `clause` is a subset of it.
    #[must_use]
    pub fn subsumes(&self, clause: &Clause) -> bool {
        self.by_length
            .iter()
            .take(clause.len() + 1)
            .flatten()
            .any(|&id| self.clauses[id].is_subset_of(clause))
    }
}

/// Set-of-support resolution: saturates until the empty clause appears or
/// no new resolvent survives filtering.
#[derive(Debug, Clone)]
pub struct Resolution {
    formula: Formula,
    budget: Budget,
    stats: SolutionStats,
}

impl Solver for Resolution {
    fn with_budget(formula: Formula, budget: Budget) -> Self {
        Self {
            formula,
            budget,
            stats: SolutionStats::default(),
        }
    }

    fn solve(&mut self) -> Result<Verdict, SolveError> {
        if self.formula.is_empty() {
            return Ok(Verdict::Sat);
        }
        if self.formula.has_empty_clause() {
            return Ok(Verdict::Unsat);
        }

        let mut base = ClauseBase::default();
        let mut frontier: Vec<ClauseId> = self
            .formula
            .iter()
            .filter_map(|clause| base.insert(clause.clone()))
            .collect();

        loop {
            self.stats.rounds += 1;
            self.stats.observe_clauses(base.len());

            let Some(next) = self.round(&base, &frontier)? else {
                debug!("resolution: empty clause derived in round {}", self.stats.rounds);
                return Ok(Verdict::Unsat);
            };

            if next.is_empty() {
                debug!(
                    "resolution: saturated after {} rounds with {} clauses",
                    self.stats.rounds,
                    base.len()
                );
                return Ok(Verdict::Sat);
            }

            self.budget.check_clauses(base.len() + next.len())?;
            trace!("resolution: round {} admitted {} clauses", self.stats.rounds, next.len());

            frontier = next.into_iter().filter_map(|clause| base.insert(clause)).collect();
        }
    }

    fn stats(&self) -> SolutionStats {
        self.stats
    }
}

impl Resolution {
    /// Resolves every frontier clause against the base. `None` when the empty
    /// clause was derived, otherwise the clauses for the next frontier.
    fn round(
        &mut self,
        base: &ClauseBase,
        frontier: &[ClauseId],
    ) -> Result<Option<BTreeSet<Clause>>, SolveError> {
        let mut next = BTreeSet::new();

        for &id in frontier {
            self.budget.check_interrupt()?;
            let c1 = base.get(id);

            for &lit in c1.iter() {
                for &other in base.occurrences(lit.negated()) {
                    let resolvent = c1.resolve(base.get(other), lit);

                    if resolvent.is_tautology() {
                        self.stats.tautologies += 1;
                        continue;
                    }
                    self.stats.resolvents += 1;

                    if resolvent.is_empty() {
                        return Ok(None);
                    }
                    if base.contains(&resolvent) || next.contains(&resolvent) {
                        continue;
                    }
                    if base.subsumes(&resolvent) {
                        self.stats.subsumed += 1;
                        continue;
                    }

                    next.insert(resolvent);
                }
            }
        }

        Ok(Some(next))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solve(clauses: Vec<Vec<i32>>) -> Verdict {
        Resolution::new(Formula::from(clauses)).solve().unwrap()
    }

    #[test]
    fn test_base_cases() {
        assert_eq!(solve(vec![]), Verdict::Sat);
        assert_eq!(solve(vec![vec![]]), Verdict::Unsat);
    }

    #[test]
    fn test_scenarios() {
        assert_eq!(solve(vec![vec![1, 2], vec![-1], vec![-2]]), Verdict::Unsat);
        assert_eq!(solve(vec![vec![1], vec![-1, 2]]), Verdict::Sat);
        assert_eq!(solve(vec![vec![1, -1]]), Verdict::Sat);
        assert_eq!(
            solve(vec![vec![1, 2], vec![1, -2], vec![-1, 2], vec![-1, -2]]),
            Verdict::Unsat
        );
    }

    #[test]
    fn test_saturates_in_bounded_rounds() {
        let mut solver = Resolution::new(Formula::from(vec![
            vec![1, 2, 3],
            vec![-1, 2],
            vec![-2, 3],
            vec![-3, 1, 2],
        ]));
        assert_eq!(solver.solve().unwrap(), Verdict::Sat);
        // Three variables allow at most 27 clauses, let alone rounds.
        assert!(solver.stats().rounds <= 27);
    }

    #[test]
    fn test_base_indexes() {
        let mut base = ClauseBase::default();
        let a = base.insert(Clause::from(vec![1, 2])).unwrap();
        let b = base.insert(Clause::from(vec![-1, 3, 4])).unwrap();
        assert_eq!(base.insert(Clause::from(vec![2, 1])), None);
        assert_eq!(base.len(), 2);
        assert_eq!(base.occurrences(Literal::from_i32(1)), &[a]);
        assert_eq!(base.occurrences(Literal::from_i32(-1)), &[b]);
        assert!(base.occurrences(Literal::from_i32(5)).is_empty());

        assert!(base.subsumes(&Clause::from(vec![1, 2, 5])));
        assert!(!base.subsumes(&Clause::from(vec![1, 5])));
        assert!(!base.subsumes(&Clause::from(vec![-1, 3])));
    }

    #[test]
    fn test_round_filters_redundant_resolvents() {
        let mut base = ClauseBase::default();
        let ids: Vec<ClauseId> = [vec![1, 2], vec![-1, 2], vec![-1, -2, 3], vec![2]]
            .into_iter()
            .filter_map(|c| base.insert(Clause::from(c)))
            .collect();
        let mut solver = Resolution::new(Formula::default());
        let next = solver.round(&base, &ids).unwrap().unwrap();

        // {1,2} x {-1,2} gives {2}, already known. {1,2} x {-1,-2,3} is a
        // tautology. {2} x {-1,-2,3} gives {-1,3}, which is new.
        assert!(next.contains(&Clause::from(vec![-1, 3])));
        assert!(!next.contains(&Clause::from(vec![2])));
        assert!(next.iter().all(|c| !c.is_tautology()));
        assert!(solver.stats().tautologies >= 1);
    }

    #[test]
    fn test_clause_limit() {
        let clauses = vec![
            vec![1, 2, 3],
            vec![-1, -2, 4],
            vec![-3, -4, 5],
            vec![-5, 1, -2],
            vec![2, -3, -5],
        ];
        let budget = Budget::default().with_max_clauses(Some(5));
        let result = Resolution::with_budget(Formula::from(clauses), budget).solve();
        assert!(matches!(result, Err(SolveError::ClauseLimitExceeded { limit: 5, .. })));
    }
}
