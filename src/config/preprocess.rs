//! `${var}` substitution and `include` directive preprocessing.
//!
//! The `config`/`ron` combination this crate loads files with has no
//! notion of either, so both are handled as a text pass over the raw file
//! before it ever reaches the RON parser. This is a deliberate gap-fill,
//! not something any one example repo already did.

// Layer 1: Standard library imports
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

// Layer 3: Internal module imports
use crate::error::RaceError;

/// Read `path`, resolving `include` directives and `${var}` substitutions,
/// and return the fully expanded text ready for RON parsing.
pub fn preprocess(path: &Path, vars: &HashMap<String, String>) -> Result<String, RaceError> {
    let mut stack = HashSet::new();
    preprocess_file(path, vars, &mut stack)
}

fn preprocess_file(path: &Path, vars: &HashMap<String, String>, stack: &mut HashSet<PathBuf>) -> Result<String, RaceError> {
    let canonical = fs::canonicalize(path).map_err(|e| RaceError::ConfigurationError {
        reason: format!("cannot resolve {}: {e}", path.display()),
    })?;
    if !stack.insert(canonical.clone()) {
        return Err(RaceError::ConfigurationError {
            reason: format!("circular include detected at {}", path.display()),
        });
    }

    let raw = fs::read_to_string(path).map_err(|e| RaceError::ConfigurationError {
        reason: format!("reading {}: {e}", path.display()),
    })?;
    let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("."));

    let mut expanded = String::with_capacity(raw.len());
    for line in raw.lines() {
        if let Some(target) = parse_include_directive(line) {
            let included_path = base_dir.join(target);
            expanded.push_str(&preprocess_file(&included_path, vars, stack)?);
            expanded.push('\n');
        } else {
            expanded.push_str(&substitute_vars(line, vars)?);
            expanded.push('\n');
        }
    }

    stack.remove(&canonical);
    Ok(expanded)
}

/// Recognizes a line of the form `include "path/to/file.ron"`, optionally
/// indented. Returns the quoted path's contents.
fn parse_include_directive(line: &str) -> Option<&str> {
    let rest = line.trim_start().strip_prefix("include")?;
    let rest = rest.trim_start();
    let rest = rest.strip_prefix('"')?;
    rest.strip_suffix('"')
}

/// Replaces every `${name}` occurrence in `line` with `vars["name"]`,
/// failing with `ConfigurationError` if a referenced variable is missing.
fn substitute_vars(line: &str, vars: &HashMap<String, String>) -> Result<String, RaceError> {
    let mut out = String::with_capacity(line.len());
    let mut rest = line;
    while let Some(start) = rest.find("${") {
        let Some(end) = rest[start..].find('}') else {
            out.push_str(rest);
            return Ok(out);
        };
        out.push_str(&rest[..start]);
        let name = &rest[start + 2..start + end];
        let value = vars.get(name).ok_or_else(|| RaceError::ConfigurationError {
            reason: format!("undefined substitution variable '{name}'"),
        })?;
        out.push_str(value);
        rest = &rest[start + end + 1..];
    }
    out.push_str(rest);
    Ok(out)
}
