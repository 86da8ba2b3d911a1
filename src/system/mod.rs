//! Graph-level configuration for a [`crate::master::Master`].

pub mod config;

// Re-exports
pub use config::{
    SystemConfig, DEFAULT_CLOCK_SCALE, DEFAULT_ENABLE_METRICS, DEFAULT_MAILBOX_CAPACITY,
    DEFAULT_MAX_ACTORS, DEFAULT_PHASE_TIMEOUT, DEFAULT_SHUTDOWN_TIMEOUT, DEFAULT_SPAWN_TIMEOUT,
};
