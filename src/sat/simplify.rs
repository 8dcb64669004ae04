//! Simplification rules shared by DP and DPLL.
//!
//! A [`Rule`] inspects a formula and, when it applies, hands back the literal
//! it acted on together with the simplified formula. Rules never change their
//! input. Terminal checks live in [`status`] and must be re-run after every
//! step, since propagating a unit can expose a fresh empty clause.

use crate::sat::clause::Clause;
use crate::sat::cnf::Formula;
use crate::sat::literal::Literal;
use rustc_hash::FxHashMap;

/// Terminal classification of a formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// No clauses left.
    Sat,
    /// The empty clause is present.
    Unsat,
    /// Neither, more work is needed.
    Open,
}

/// Classifies `formula` as SAT, UNSAT or open.
#[must_use]
pub fn status(formula: &Formula) -> Status {
    if formula.is_empty() {
        Status::Sat
    } else if formula.has_empty_clause() {
        Status::Unsat
    } else {
        Status::Open
    }
}

/// Result of one rule application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    /// The literal the rule set true.
    pub literal: Literal,
    /// The formula after the step.
    pub formula: Formula,
}

/// A satisfiability-preserving rewrite keyed on a single literal.
pub trait Rule {
    /// The step this rule takes on `formula`, or `None` when it does not apply.
    fn apply(&self, formula: &Formula) -> Option<Step>;
}

/// Assigns the literal of a unit clause.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
pub struct UnitPropagation;

impl Rule for UnitPropagation {
    fn apply(&self, formula: &Formula) -> Option<Step> {
        let literal = formula.unit_literal()?;
        Some(Step {
            literal,
            formula: formula.assign(literal),
        })
    }
}

/// Drops every clause satisfied by a pure literal.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
pub struct PureLiteralElimination;

impl Rule for PureLiteralElimination {
    fn apply(&self, formula: &Formula) -> Option<Step> {
        let literal = formula.pure_literal()?;
        Some(Step {
            literal,
            formula: formula.remove_satisfied(literal),
        })
    }
}

/// Which rule [`simplify_once`] applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Simplification {
    /// A unit clause over this literal was propagated.
    UnitPropagation(Literal),
    /// This pure literal was set true.
    PureLiteral(Literal),
}

/// Applies unit propagation if possible, otherwise pure-literal elimination.
/// `None` when neither rule applies.
#[must_use]
pub fn simplify_once(formula: &Formula) -> Option<(Simplification, Formula)> {
    if let Some(step) = UnitPropagation.apply(formula) {
        return Some((Simplification::UnitPropagation(step.literal), step.formula));
    }

    PureLiteralElimination
        .apply(formula)
        .map(|step| (Simplification::PureLiteral(step.literal), step.formula))
}

/// Removes clauses that are supersets of some other clause.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
pub struct SubsumptionElimination;

impl SubsumptionElimination {
    /// Returns the reduced formula and how many clauses were removed.
    ///
    /// A subset of `c` must contain its own smallest literal, and that
    /// literal is in `c`; kept clauses are indexed by it so only plausible
    /// candidates are compared.
    #[must_use]
    pub fn apply(self, formula: Formula) -> (Formula, usize) {
        if formula.has_empty_clause() {
            let removed = formula.len() - 1;
            return (Formula::unsat(), removed);
        }

        let total = formula.len();
        let mut kept: Vec<Clause> = Vec::with_capacity(total);
        let mut by_first: FxHashMap<Literal, Vec<usize>> = FxHashMap::default();

        // Canonical order is by length, so every possible subset of a clause
        // has been kept (or discarded as subsumed itself) before it.
        for clause in formula.into_clauses() {
            let subsumed = clause.iter().any(|lit| {
                by_first
                    .get(lit)
                    .is_some_and(|ids| ids.iter().any(|&id| kept[id].is_subset_of(&clause)))
            });
            if subsumed {
                continue;
            }

            if let Some(first) = clause.first() {
                by_first.entry(first).or_default().push(kept.len());
            }
            kept.push(clause);
        }

        let removed = total - kept.len();
        (Formula::new(kept), removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn f(clauses: Vec<Vec<i32>>) -> Formula {
        Formula::from(clauses)
    }

    #[test]
    fn test_status() {
        assert_eq!(status(&Formula::default()), Status::Sat);
        assert_eq!(status(&f(vec![vec![1], vec![]])), Status::Unsat);
        assert_eq!(status(&f(vec![vec![1]])), Status::Open);
    }

    #[test]
    fn test_unit_propagation() {
        let step = UnitPropagation
            .apply(&f(vec![vec![1], vec![-1, 2], vec![1, 3]]))
            .unwrap();
        assert_eq!(step.literal, Literal::from_i32(1));
        assert_eq!(step.formula, f(vec![vec![2]]));
        assert!(UnitPropagation.apply(&f(vec![vec![1, 2]])).is_none());
    }

    #[test]
    fn test_pure_literal_elimination() {
        let step = PureLiteralElimination
            .apply(&f(vec![vec![1, 2], vec![-1, 2], vec![-2, 3]]))
            .unwrap();
        assert_eq!(step.literal, Literal::from_i32(3));
        assert_eq!(step.formula, f(vec![vec![1, 2], vec![-1, 2]]));
    }

    #[test]
    fn test_simplify_prefers_units() {
        let (rule, next) = simplify_once(&f(vec![vec![-2], vec![1, 2]])).unwrap();
        assert_eq!(rule, Simplification::UnitPropagation(Literal::from_i32(-2)));
        assert_eq!(next, f(vec![vec![1]]));

        let (rule, _) = simplify_once(&f(vec![vec![1, 2], vec![-1, 2]])).unwrap();
        assert_eq!(rule, Simplification::PureLiteral(Literal::from_i32(2)));

        assert!(simplify_once(&f(vec![vec![1, 2], vec![-1, -2], vec![1, -2], vec![-1, 2]])).is_none());
    }

    #[test]
    fn test_unit_propagation_is_confluent() {
        let formula = f(vec![vec![1], vec![-2], vec![-1, 2, 3], vec![2, -3, 4], vec![-4, 1]]);
        let (one, two) = (Literal::from_i32(1), Literal::from_i32(-2));
        assert_eq!(
            formula.assign(one).assign(two),
            formula.assign(two).assign(one)
        );

        let mut current = formula;
        while let Some(step) = UnitPropagation.apply(&current) {
            current = step.formula;
        }
        // 1 and -2 leave {3}, {-3, 4}; then 3 and 4 empty the formula.
        assert!(current.is_empty());
    }

    #[test]
    fn test_unit_propagation_exposes_empty_clause() {
        let next = UnitPropagation.apply(&f(vec![vec![1], vec![-1]])).unwrap();
        assert_eq!(status(&next.formula), Status::Unsat);
    }

    #[test]
    fn test_subsumption() {
        let (reduced, removed) = SubsumptionElimination.apply(f(vec![
            vec![1, 2],
            vec![1, 2, 3],
            vec![-3, 2, 1, 4],
            vec![2, 3],
            vec![-1],
            vec![-1, 5],
        ]));
        assert_eq!(removed, 3);
        assert_eq!(reduced, f(vec![vec![1, 2], vec![2, 3], vec![-1]]));
    }

    #[test]
    fn test_subsumption_with_empty_clause() {
        let (reduced, removed) = SubsumptionElimination.apply(f(vec![vec![], vec![1], vec![2, 3]]));
        assert_eq!(reduced, Formula::unsat());
        assert_eq!(removed, 2);
    }
}
