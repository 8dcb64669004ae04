//! Gzip-compressed tar archives of DIMACS files.
//!
//! Members are read in archive order. Only regular files with a formula
//! extension are parsed; a member that fails to parse is kept with its error
//! so the caller can report it and move on.

use crate::command_line::cli::has_formula_extension;
use anyhow::{Context, Result};
use classical_sat::sat::dimacs::{self, DimacsError, NamedFormula};
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// One formula file found in an archive.
#[derive(Debug)]
pub(crate) struct Member {
    /// Path of the member inside the archive.
    pub name: String,
    pub formulas: Result<Vec<NamedFormula>, DimacsError>,
}

/// Whether `path` names a `.tar.gz` or `.tgz` file.
pub(crate) fn is_archive(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy())
        .is_some_and(|name| name.ends_with(".tar.gz") || name.ends_with(".tgz"))
}

/// Reads every formula member of the archive at `path`.
pub(crate) fn open(path: &Path) -> Result<Vec<Member>> {
    let file =
        File::open(path).with_context(|| format!("cannot open archive {}", path.display()))?;
    read(file).with_context(|| format!("cannot read archive {}", path.display()))
}

/// Reads every formula member of a gzip-compressed tar stream.
pub(crate) fn read<R: Read>(reader: R) -> Result<Vec<Member>> {
    let mut archive = tar::Archive::new(GzDecoder::new(reader));
    let mut members = Vec::new();

    for entry in archive.entries()? {
        let entry = entry?;
        if !entry.header().entry_type().is_file() {
            continue;
        }
        let path = entry.path()?.into_owned();
        if !has_formula_extension(&path) {
            continue;
        }

        let name = path.display().to_string();
        // Headerless formulas are named after the member, as for plain files.
        let default_name = path
            .file_name()
            .map_or_else(|| name.clone(), |n| n.to_string_lossy().into_owned());
        let formulas = dimacs::parse_dimacs(BufReader::new(entry), &default_name);
        members.push(Member { name, formulas });
    }

    Ok(members)
}
