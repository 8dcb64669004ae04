#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! CNF formulas as canonical clause sets.
//!
//! A [`Formula`] keeps its clauses sorted (shortest first) and deduplicated.
//! Equal clause sets therefore have identical representations, which lets a
//! formula act directly as a hash key for memoization. Every transformation
//! returns a new value; nothing here mutates a formula in place.

use crate::sat::clause::Clause;
use crate::sat::literal::{Literal, Variable};
use itertools::Itertools;
use rustc_hash::FxHashMap;
use std::fmt::{self, Display};

/// A conjunction of clauses in canonical (sorted, deduplicated) form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Formula {
    clauses: Vec<Clause>,
}

impl Formula {
    /// Builds a formula from any clause sequence, sorting and deduplicating it.
    pub fn new<I: IntoIterator<Item = Clause>>(clauses: I) -> Self {
        let mut clauses: Vec<Clause> = clauses.into_iter().collect();
        clauses.sort_unstable();
        clauses.dedup();
        Self { clauses }
    }

    /// The canonical contradiction: a formula holding only the empty clause.
    #[must_use]
    pub fn unsat() -> Self {
        Self {
            clauses: vec![Clause::default()],
        }
    }

    /// Number of distinct clauses.
    #[must_use]
    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    /// `true` for the formula without clauses, which is trivially satisfied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// `true` when the formula contains the empty clause and is therefore UNSAT.
    #[must_use]
    pub fn has_empty_clause(&self) -> bool {
        // Shortest clauses sort first.
        self.clauses.first().is_some_and(Clause::is_empty)
    }

    /// Clauses in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = &Clause> {
        self.clauses.iter()
    }

    /// The sorted clause slice.
    #[must_use]
    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// Literal of the first unit clause, i.e. the unit over the lowest variable.
    #[must_use]
    pub fn unit_literal(&self) -> Option<Literal> {
        self.clauses
            .iter()
            .skip_while(|c| c.is_empty())
            .take_while(|c| c.is_unit())
            .find_map(Clause::first)
    }

    /// Distinct literals of the formula in canonical order.
    #[must_use]
    pub fn literals(&self) -> Vec<Literal> {
        self.clauses
            .iter()
            .flat_map(Clause::iter)
            .copied()
            .sorted_unstable()
            .dedup()
            .collect()
    }

    /// The pure literal over the lowest variable, if any.
    #[must_use]
    pub fn pure_literal(&self) -> Option<Literal> {
        let literals = self.literals();
        for (_, mut group) in &literals.iter().chunk_by(|lit| lit.variable()) {
            if let Some(&first) = group.next() {
                if group.next().is_none() {
                    return Some(first);
                }
            }
        }
        None
    }

    /// Sets `lit` to true: drops every clause containing `lit` and strikes
    /// `-lit` from the rest.
    #[must_use]
    pub fn assign(&self, lit: Literal) -> Self {
        let neg = lit.negated();
        Self::new(
            self.clauses
                .iter()
                .filter(|c| !c.contains(lit))
                .map(|c| if c.contains(neg) { c.without(neg) } else { c.clone() }),
        )
    }

    /// Drops every clause containing `lit`, leaving the others untouched.
    #[must_use]
    pub fn remove_satisfied(&self, lit: Literal) -> Self {
        Self {
            clauses: self
                .clauses
                .iter()
                .filter(|c| !c.contains(lit))
                .cloned()
                .collect(),
        }
    }

    /// Occurrence count per variable, both polarities combined.
    #[must_use]
    pub fn occurrences(&self) -> FxHashMap<Variable, usize> {
        let mut counts = FxHashMap::default();
        for lit in self.clauses.iter().flat_map(Clause::iter) {
            *counts.entry(lit.variable()).or_insert(0) += 1;
        }
        counts
    }

    /// Highest variable id mentioned, `0` for a formula without literals.
    #[must_use]
    pub fn num_vars(&self) -> Variable {
        self.clauses
            .iter()
            .flat_map(Clause::iter)
            .map(|lit| lit.variable())
            .max()
            .unwrap_or(0)
    }

    /// Total literal occurrences over all clauses.
    #[must_use]
    pub fn num_literals(&self) -> usize {
        self.clauses.iter().map(Clause::len).sum()
    }

    pub(crate) fn into_clauses(self) -> Vec<Clause> {
        self.clauses
    }
}

impl FromIterator<Clause> for Formula {
    fn from_iter<T: IntoIterator<Item = Clause>>(iter: T) -> Self {
        Self::new(iter)
    }
}

impl From<Vec<Vec<i32>>> for Formula {
    fn from(clauses: Vec<Vec<i32>>) -> Self {
        Self::new(clauses.into_iter().map(Clause::from))
    }
}

impl From<Vec<Clause>> for Formula {
    fn from(clauses: Vec<Clause>) -> Self {
        Self::new(clauses)
    }
}

impl Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "p cnf {} {}", self.num_vars(), self.len())?;
        for clause in &self.clauses {
            writeln!(f, "{clause}")?;
        }
        Ok(())
    }
}
