#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
pub mod clause;
pub mod cnf;
pub mod dimacs;
pub mod dp;
pub mod dpll;
pub mod literal;
pub mod resolution;
pub mod simplify;
pub mod solver;
