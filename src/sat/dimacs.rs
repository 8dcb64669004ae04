#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! A parser for DIMACS CNF text holding one or more named formulas.
//!
//! The accepted format is plain DIMACS with one extension for batches:
//! - Blank lines are ignored.
//! - `c formula: <name>` starts a new formula called `<name>`. Any other line
//!   starting with `c` is a comment.
//! - `p cnf <vars> <clauses>` marks the start of clause data. The counts are
//!   not checked; everything is derived from the clauses themselves. When no
//!   formula is open yet, one is opened and named after the source.
//! - A line that is exactly `%` or `0` ends the current formula. Clause lines
//!   after it are skipped until the next `c formula:` header.
//! - Every other line is a clause: whitespace-separated nonzero integers
//!   terminated by a single `0`.
//!
//! Clause lines seen before any header belong to a formula named after the
//! source, so an ordinary single-formula DIMACS file parses to one entry.

use crate::sat::clause::Clause;
use crate::sat::cnf::Formula;
use crate::sat::literal::Literal;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use thiserror::Error;

/// Header prefix that opens a new formula block.
const FORMULA_HEADER: &str = "c formula:";

/// Errors raised while reading DIMACS input. Line numbers are 1-based.
#[derive(Debug, Error)]
pub enum DimacsError {
    /// The underlying reader failed.
    #[error("failed to read input: {0}")]
    Io(#[from] io::Error),

    /// A token that is not an integer, or is `i32::MIN`.
    #[error("line {line}: `{token}` is not a valid literal")]
    InvalidLiteral {
        /// Where the error occurred.
        line: usize,
        /// The offending token.
        token: String,
    },

    /// A clause line whose last token is not `0`.
    #[error("line {line}: clause is not terminated by 0: `{text}`")]
    MissingTerminator {
        /// Where the error occurred.
        line: usize,
        /// The whole trimmed line.
        text: String,
    },

    /// A `0` before the last token of a clause line.
    #[error("line {line}: 0 appears before the end of the clause: `{text}`")]
    MisplacedTerminator {
        /// Where the error occurred.
        line: usize,
        /// The whole trimmed line.
        text: String,
    },

    /// A line starting with `p` that is not a `p cnf` problem line.
    #[error("line {line}: not a `p cnf` problem line: `{text}`")]
    InvalidProblemLine {
        /// Where the error occurred.
        line: usize,
        /// The whole trimmed line.
        text: String,
    },
}

/// A formula together with the name it was given in its source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedFormula {
    /// From the `c formula:` header, or the source's default name.
    pub name: String,
    /// The parsed clauses.
    pub formula: Formula,
}

/// Where the parser stands relative to formula blocks.
enum Block {
    /// No formula has been opened yet.
    None,
    /// Clause lines go into `clauses`.
    Open { name: String, clauses: Vec<Clause> },
    /// The last block was closed by a terminator line; skipping clauses.
    Closed,
}

struct Parser<'a> {
    default_name: &'a str,
    block: Block,
    formulas: Vec<NamedFormula>,
}

impl<'a> Parser<'a> {
    const fn new(default_name: &'a str) -> Self {
        Self {
            default_name,
            block: Block::None,
            formulas: Vec::new(),
        }
    }

    fn open(&mut self, name: String) {
        self.close();
        self.block = Block::Open {
            name,
            clauses: Vec::new(),
        };
    }

    fn close(&mut self) {
        if let Block::Open { name, clauses } = std::mem::replace(&mut self.block, Block::Closed) {
            self.formulas.push(NamedFormula {
                name,
                formula: Formula::new(clauses),
            });
        }
    }

    fn line(&mut self, number: usize, raw: &str) -> Result<(), DimacsError> {
        let text = raw.trim();

        if text.is_empty() {
            return Ok(());
        }
        if let Some(name) = text.strip_prefix(FORMULA_HEADER) {
            self.open(name.trim().to_string());
            return Ok(());
        }
        if text.starts_with('c') {
            return Ok(());
        }
        if text == "%" || text == "0" {
            self.close();
            return Ok(());
        }
        if text.starts_with('p') {
            if !is_problem_line(text) {
                return Err(DimacsError::InvalidProblemLine {
                    line: number,
                    text: text.to_string(),
                });
            }
            if !matches!(self.block, Block::Open { .. }) {
                self.open(self.default_name.to_string());
            }
            return Ok(());
        }

        let clause = match self.block {
            Block::Closed => return Ok(()),
            _ => parse_clause(number, text)?,
        };
        if matches!(self.block, Block::None) {
            self.open(self.default_name.to_string());
        }
        if let Block::Open { clauses, .. } = &mut self.block {
            clauses.push(clause);
        }
        Ok(())
    }

    fn finish(mut self) -> Vec<NamedFormula> {
        self.close();
        self.formulas
    }
}

/// `p cnf ...`, with `p` and `cnf` as separate tokens.
fn is_problem_line(text: &str) -> bool {
    let mut tokens = text.split_whitespace();
    tokens.next() == Some("p") && tokens.next() == Some("cnf")
}

/// Parses one clause line. `number` is only used for error reporting.
fn parse_clause(number: usize, text: &str) -> Result<Clause, DimacsError> {
    let mut values = Vec::new();
    for token in text.split_whitespace() {
        let value: i32 = token.parse().map_err(|_| DimacsError::InvalidLiteral {
            line: number,
            token: token.to_string(),
        })?;
        if value == i32::MIN {
            return Err(DimacsError::InvalidLiteral {
                line: number,
                token: token.to_string(),
            });
        }
        values.push(value);
    }

    match values.split_last() {
        Some((0, literals)) => {
            if literals.contains(&0) {
                return Err(DimacsError::MisplacedTerminator {
                    line: number,
                    text: text.to_string(),
                });
            }
            Ok(literals.iter().copied().map(Literal::from_i32).collect())
        }
        _ => Err(DimacsError::MissingTerminator {
            line: number,
            text: text.to_string(),
        }),
    }
}

/// Parses DIMACS data from a `BufRead` source into its named formulas.
///
/// `default_name` names formulas that appear without a `c formula:` header.
///
/// # Errors
///
/// On read failures and malformed clause lines, carrying the 1-based line
/// number.
pub fn parse_dimacs<R: BufRead>(
    reader: R,
    default_name: &str,
) -> Result<Vec<NamedFormula>, DimacsError> {
    let mut parser = Parser::new(default_name);
    for (index, line) in reader.lines().enumerate() {
        parser.line(index + 1, &line?)?;
    }
    Ok(parser.finish())
}

/// Parses DIMACS text held in memory.
///
/// # Errors
///
/// See [`parse_dimacs`].
pub fn parse_str(input: &str, default_name: &str) -> Result<Vec<NamedFormula>, DimacsError> {
    parse_dimacs(input.as_bytes(), default_name)
}

/// Parses a DIMACS file. Headerless formulas are named after the file.
///
/// # Errors
///
/// If the file cannot be opened or read, or see [`parse_dimacs`].
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Vec<NamedFormula>, DimacsError> {
    let path = path.as_ref();
    let name = path
        .file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
    let reader = BufReader::new(File::open(path)?);
    parse_dimacs(reader, &name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> Vec<NamedFormula> {
        parse_str(input, "input").unwrap()
    }

    #[test]
    fn test_plain_dimacs() {
        let formulas = parse("c a comment\np cnf 3 2\n1 -2 0\n2 3 0\n");
        assert_eq!(formulas.len(), 1);
        assert_eq!(formulas[0].name, "input");
        assert_eq!(formulas[0].formula, Formula::from(vec![vec![1, -2], vec![2, 3]]));
    }

    #[test]
    fn test_headerless_clauses() {
        let formulas = parse("\n1 2 0\n\n-1 0\n");
        assert_eq!(formulas.len(), 1);
        assert_eq!(formulas[0].formula, Formula::from(vec![vec![1, 2], vec![-1]]));
    }

    #[test]
    fn test_named_blocks() {
        let input = "\
c formula: first
p cnf 2 1
1 2 0
c formula: second
c plain comment
-1 0
1 0
";
        let formulas = parse(input);
        let names: Vec<&str> = formulas.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["first", "second"]);
        assert_eq!(formulas[1].formula, Formula::from(vec![vec![-1], vec![1]]));
    }

    #[test]
    fn test_terminators_end_blocks() {
        let input = "\
c formula: a
1 0
%
2 0
c formula: b
-1 2 0
0
3 0
";
        let formulas = parse(input);
        assert_eq!(formulas.len(), 2);
        assert_eq!(formulas[0].formula, Formula::from(vec![vec![1]]));
        assert_eq!(formulas[1].formula, Formula::from(vec![vec![-1, 2]]));
    }

    #[test]
    fn test_empty_named_block() {
        let formulas = parse("c formula: nothing\nc formula: one\n1 0\n");
        assert_eq!(formulas.len(), 2);
        assert!(formulas[0].formula.is_empty());
    }

    #[test]
    fn test_problem_line_after_terminator_opens_block() {
        let formulas = parse("p cnf 1 1\n1 0\n%\np cnf 1 1\n-1 0\n");
        assert_eq!(formulas.len(), 2);
        assert_eq!(formulas[1].name, "input");
        assert_eq!(formulas[1].formula, Formula::from(vec![vec![-1]]));
    }

    #[test]
    fn test_invalid_literal() {
        let err = parse_str("p cnf 2 1\n1 x 0\n", "input").unwrap_err();
        assert!(matches!(
            err,
            DimacsError::InvalidLiteral { line: 2, ref token } if token == "x"
        ));
    }

    #[test]
    fn test_missing_terminator() {
        let err = parse_str("1 2 0\n1 2\n", "input").unwrap_err();
        assert!(matches!(
            err,
            DimacsError::MissingTerminator { line: 2, ref text } if text == "1 2"
        ));
    }

    #[test]
    fn test_misplaced_terminator() {
        let err = parse_str("1 0 2 0\n", "input").unwrap_err();
        assert!(matches!(err, DimacsError::MisplacedTerminator { line: 1, .. }));
        assert!(err.to_string().contains("line 1"));
    }

    #[test]
    fn test_only_p_cnf_is_a_problem_line() {
        let err = parse_str("pxyz\n1 0\n", "input").unwrap_err();
        assert!(matches!(
            err,
            DimacsError::InvalidProblemLine { line: 1, ref text } if text == "pxyz"
        ));
        assert!(matches!(
            parse_str("p dnf 1 1\n1 0\n", "input"),
            Err(DimacsError::InvalidProblemLine { line: 1, .. })
        ));
        assert!(matches!(
            parse_str("1 0\npcnf 1 1\n", "input"),
            Err(DimacsError::InvalidProblemLine { line: 2, .. })
        ));

        let formulas = parse("p  cnf 1 1\n1 0\n");
        assert_eq!(formulas[0].formula, Formula::from(vec![vec![1]]));
    }

    #[test]
    fn test_parse_missing_file() {
        let err = parse_file("/nonexistent/formula.cnf").unwrap_err();
        assert!(matches!(err, DimacsError::Io(_)));
    }
}
