#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Canonical clauses.
//!
//! A [`Clause`] stores its literals sorted and without duplicates, so two
//! clauses built from the same literal set compare (and hash) equal no matter
//! the order the literals were supplied in. Because literals sort by variable
//! first, a tautology shows up as two adjacent literals over one variable.

use crate::sat::literal::Literal;
use core::cmp::Ordering;
use core::ops::Index;
use smallvec::SmallVec;
use std::fmt::{self, Display};

/// Inline capacity before a clause spills to the heap.
pub type LiteralStorage = SmallVec<[Literal; 8]>;

/// A disjunction of literals in canonical (sorted, deduplicated) form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Clause {
    literals: LiteralStorage,
}

impl Clause {
    /// Builds a clause from any literal sequence, sorting and deduplicating it.
    pub fn new<I: IntoIterator<Item = Literal>>(literals: I) -> Self {
        let mut literals: LiteralStorage = literals.into_iter().collect();
        literals.sort_unstable();
        literals.dedup();
        Self { literals }
    }

    /// Wraps literals already known to be sorted and duplicate free.
    fn from_sorted(literals: LiteralStorage) -> Self {
        debug_assert!(literals.windows(2).all(|w| w[0] < w[1]));
        Self { literals }
    }

    /// Number of distinct literals.
    #[must_use]
    pub fn len(&self) -> usize {
        self.literals.len()
    }

    /// `true` for the empty clause, which cannot be satisfied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }

    /// Exactly one literal.
    #[must_use]
    pub fn is_unit(&self) -> bool {
        self.len() == 1
    }

    /// Literals in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = &Literal> {
        self.literals.iter()
    }

    /// The sorted literal slice.
    #[must_use]
    pub fn literals(&self) -> &[Literal] {
        &self.literals
    }

    /// Smallest literal in canonical order.
    #[must_use]
    pub fn first(&self) -> Option<Literal> {
        self.literals.first().copied()
    }

    /// Membership test by binary search.
    #[must_use]
    pub fn contains(&self, lit: Literal) -> bool {
        self.literals.binary_search(&lit).is_ok()
    }

    /// Whether the clause holds some literal together with its complement.
    #[must_use]
    pub fn is_tautology(&self) -> bool {
        self.literals
            .windows(2)
            .any(|w| w[0].is_complement_of(w[1]))
    }

    /// Whether every literal of `self` also occurs in `other`.
    #[must_use]
    pub fn is_subset_of(&self, other: &Self) -> bool {
        if self.len() > other.len() {
            return false;
        }

        let mut rest = other.literals.iter();
        self.literals
            .iter()
            .all(|lit| rest.by_ref().any(|candidate| candidate == lit))
    }

    /// The clause with `lit` struck out.
    #[must_use]
    pub fn without(&self, lit: Literal) -> Self {
        Self::from_sorted(self.literals.iter().copied().filter(|&l| l != lit).collect())
    }

    /// Resolves `self` (which holds `pivot`) with `other` (which holds
    /// `-pivot`): `(self \ {pivot}) ∪ (other \ {-pivot})`.
    ///
    /// The result may be a tautology; callers decide whether to keep it.
    #[must_use]
    pub fn resolve(&self, other: &Self, pivot: Literal) -> Self {
        let neg = pivot.negated();
        let mut merged = LiteralStorage::with_capacity(self.len() + other.len());
        let mut left = self.literals.iter().copied().filter(|&l| l != pivot).peekable();
        let mut right = other.literals.iter().copied().filter(|&l| l != neg).peekable();

        loop {
            let next = match (left.peek(), right.peek()) {
                (Some(&a), Some(&b)) => match a.cmp(&b) {
                    Ordering::Less => left.next(),
                    Ordering::Greater => right.next(),
                    Ordering::Equal => {
                        right.next();
                        left.next()
                    }
                },
                (Some(_), None) => left.next(),
                (None, Some(_)) => right.next(),
                (None, None) => break,
            };
            merged.extend(next);
        }

        Self::from_sorted(merged)
    }
}

impl Ord for Clause {
    /// Shorter clauses first, then lexicographic over the sorted literals.
    fn cmp(&self, other: &Self) -> Ordering {
        self.len()
            .cmp(&other.len())
            .then_with(|| self.literals.cmp(&other.literals))
    }
}

impl PartialOrd for Clause {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Index<usize> for Clause {
    type Output = Literal;

    fn index(&self, index: usize) -> &Self::Output {
        &self.literals[index]
    }
}

impl FromIterator<Literal> for Clause {
    fn from_iter<T: IntoIterator<Item = Literal>>(iter: T) -> Self {
        Self::new(iter)
    }
}

impl From<Vec<i32>> for Clause {
    /// # Panics
    ///
    /// On a `0` or `i32::MIN` entry, see [`Literal::from_i32`].
    fn from(literals: Vec<i32>) -> Self {
        Self::new(literals.into_iter().map(Literal::from_i32))
    }
}

impl From<&[i32]> for Clause {
    fn from(literals: &[i32]) -> Self {
        Self::new(literals.iter().copied().map(Literal::from_i32))
    }
}

impl Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for lit in &self.literals {
            write!(f, "{lit} ")?;
        }
        write!(f, "0")
    }
}
