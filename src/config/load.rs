//! Loads a [`GraphConfig`] from a RON file on disk, after running it
//! through the `${var}`/`include` preprocessing pass and full validation.

// Layer 1: Standard library imports
use std::collections::HashMap;
use std::path::Path;

// Layer 2: Third-party crate imports
use config::{Config as ConfigBuilder, File as ConfigFile, FileFormat};

// Layer 3: Internal module imports
use super::model::GraphConfig;
use super::preprocess::preprocess;
use super::validate::validate;
use crate::error::RaceError;

/// Loads, expands, parses, and validates a configuration file.
///
/// `substitutions` is the `-D<key>=<value>` map collected from the CLI;
/// its entries are available to `${var}` references in the file.
pub fn load_graph_config(path: &Path, substitutions: &HashMap<String, String>) -> Result<GraphConfig, RaceError> {
    let expanded = preprocess(path, substitutions)?;

    let parsed = ConfigBuilder::builder()
        .add_source(ConfigFile::from_str(&expanded, FileFormat::Ron))
        .build()
        .map_err(|e| RaceError::ConfigurationError {
            reason: format!("parsing {}: {e}", path.display()),
        })?;

    let graph: GraphConfig = parsed.try_deserialize().map_err(|e| RaceError::ConfigurationError {
        reason: format!("deserializing {}: {e}", path.display()),
    })?;

    validate(&graph)?;
    Ok(graph)
}
