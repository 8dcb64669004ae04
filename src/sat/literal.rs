#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Signed-integer literals.
//!
//! A literal is a nonzero `i32` in DIMACS convention: the magnitude names the
//! variable and the sign its polarity. Literals are ordered by variable first
//! and polarity second (negative before positive), so a sorted sequence keeps
//! a literal next to its complement.

use core::cmp::Ordering;
use core::ops::{Neg, Not};
use std::fmt::{self, Display};

/// Variable identifier, the magnitude of a literal.
pub type Variable = u32;

/// A nonzero signed literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Literal(i32);

impl Literal {
    /// Builds the literal of `var` with the given polarity (`true` = positive).
    ///
    /// # Panics
    ///
    /// If `var` is zero or does not fit into an `i32`.
    #[must_use]
    pub fn new(var: Variable, polarity: bool) -> Self {
        let var = i32::try_from(var).expect("literal variable overflowed");
        assert_ne!(var, 0, "variable 0 has no literal");

        if polarity { Self(var) } else { Self(-var) }
    }

    /// Wraps a DIMACS integer.
    ///
    /// # Panics
    ///
    /// If `value` is `0`, the clause terminator, or `i32::MIN`, whose
    /// complement is not representable.
    #[must_use]
    pub const fn from_i32(value: i32) -> Self {
        assert!(value != 0, "0 is a clause terminator, not a literal");
        assert!(value != i32::MIN, "literal has no representable complement");
        Self(value)
    }

    /// The DIMACS integer for this literal.
    #[must_use]
    pub const fn to_i32(self) -> i32 {
        self.0
    }

    /// The variable, i.e. the magnitude.
    #[must_use]
    pub const fn variable(self) -> Variable {
        self.0.unsigned_abs()
    }

    /// `true` for a positive literal.
    #[must_use]
    pub const fn polarity(self) -> bool {
        self.0 > 0
    }

    /// `true` for a negative literal.
    #[must_use]
    pub const fn is_negated(self) -> bool {
        !self.polarity()
    }

    /// The complementary literal.
    #[must_use]
    pub const fn negated(self) -> Self {
        Self(-self.0)
    }

    /// Whether `other` is the complement of `self`.
    #[must_use]
    pub const fn is_complement_of(self, other: Self) -> bool {
        self.0 == -other.0
    }
}

impl Ord for Literal {
    fn cmp(&self, other: &Self) -> Ordering {
        self.variable()
            .cmp(&other.variable())
            .then_with(|| self.polarity().cmp(&other.polarity()))
    }
}

impl PartialOrd for Literal {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Neg for Literal {
    type Output = Self;

    fn neg(self) -> Self::Output {
        self.negated()
    }
}

impl Not for Literal {
    type Output = Self;

    fn not(self) -> Self::Output {
        self.negated()
    }
}

impl Neg for &Literal {
    type Output = Literal;

    fn neg(self) -> Self::Output {
        self.negated()
    }
}

impl From<Literal> for i32 {
    fn from(lit: Literal) -> Self {
        lit.0
    }
}

impl Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_neg() {
        assert_eq!(Literal::new(1, false).negated(), Literal::new(1, true));
        assert_eq!(-Literal::from_i32(5), Literal::from_i32(-5));
        assert_eq!(!Literal::from_i32(-5), Literal::from_i32(5));
    }

    #[test]
    #[should_panic(expected = "clause terminator")]
    fn test_zero_is_not_a_literal() {
        let _ = Literal::from_i32(0);
    }

    #[test]
    #[should_panic(expected = "representable complement")]
    fn test_min_is_not_a_literal() {
        let _ = Literal::from_i32(i32::MIN);
    }

    #[test]
    fn test_extreme_literal_negates() {
        let lit = Literal::from_i32(-i32::MAX);
        assert_eq!(lit.negated().to_i32(), i32::MAX);
        assert_eq!(lit.variable(), i32::MAX.unsigned_abs());
    }

    #[test]
    fn test_variable_and_polarity() {
        let lit = Literal::from_i32(-7);
        assert_eq!(lit.variable(), 7);
        assert!(!lit.polarity());
        assert!(lit.is_negated());
        assert!(lit.is_complement_of(Literal::from_i32(7)));
        assert!(!lit.is_complement_of(Literal::from_i32(-7)));
    }

    #[test]
    fn test_order_keeps_complements_adjacent() {
        let mut lits: Vec<Literal> = [3, -1, 2, 1, -3]
            .into_iter()
            .map(Literal::from_i32)
            .collect();
        lits.sort();
        let raw: Vec<i32> = lits.into_iter().map(Literal::to_i32).collect();
        assert_eq!(raw, vec![-1, 1, 2, -3, 3]);
    }

    #[test]
    #[should_panic(expected = "variable 0 has no literal")]
    fn test_zero_variable_rejected() {
        let _ = Literal::new(0, true);
    }
}
