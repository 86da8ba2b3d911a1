//! Validation rules applied after parsing, before any actor is created.

// Layer 1: Standard library imports
use std::collections::HashSet;

// Layer 3: Internal module imports
use super::model::GraphConfig;
use crate::error::RaceError;

/// Checks structural invariants the parser itself cannot enforce:
/// non-empty/unique actor names, non-empty classes, and the §9 decision
/// that `max-clock-diff` is required (no implicit default) once any actor
/// is `remote`.
pub fn validate(config: &GraphConfig) -> Result<(), RaceError> {
    if config.name.trim().is_empty() {
        return Err(RaceError::ConfigurationError {
            reason: "graph 'name' must not be empty".to_string(),
        });
    }

    let mut seen_names = HashSet::new();
    for actor in &config.actors {
        if actor.name.trim().is_empty() {
            return Err(RaceError::ConfigurationError {
                reason: "actor 'name' must not be empty".to_string(),
            });
        }
        if actor.class.trim().is_empty() {
            return Err(RaceError::ConfigurationError {
                reason: format!("actor '{}' has an empty 'class'", actor.name),
            });
        }
        if !seen_names.insert(actor.name.clone()) {
            return Err(RaceError::ConfigurationError {
                reason: format!("duplicate actor name '{}'", actor.name),
            });
        }
        if actor.mailbox_capacity == 0 {
            return Err(RaceError::ConfigurationError {
                reason: format!("actor '{}' mailbox_capacity must be > 0", actor.name),
            });
        }
    }

    if config.has_remote_actors() && config.max_clock_diff().is_none() {
        return Err(RaceError::ConfigurationError {
            reason: "max-clock-diff-ms is required once any actor declares 'remote'".to_string(),
        });
    }

    if let Some(port) = config.port {
        if port == 0 {
            return Err(RaceError::ConfigurationError {
                reason: "port, if set, must be nonzero".to_string(),
            });
        }
    }

    Ok(())
}
