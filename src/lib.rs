#![deny(missing_docs)]
//! Classical decision procedures for propositional satisfiability.
//!
//! Three complete algorithms decide whether a CNF formula is satisfiable:
//! saturation by resolution (set-of-support restricted), Davis-Putnam
//! variable elimination and memoized DPLL search. They share one value-typed
//! clause model and one set of simplification rules, and report only
//! SAT or UNSAT.

/// The `sat` module holds the formula model, the engines and the DIMACS parser.
pub mod sat;
