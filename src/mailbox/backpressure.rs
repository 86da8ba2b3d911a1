//! Bounded-mailbox overflow policies.
//!
//! When a bounded mailbox is full, the configured policy decides what
//! happens to the incoming message:
//!
//! - `DropNewest` (default): keep everything already queued, discard the
//!   message trying to get in, and log a warning.
//! - `DropOldest`: evict the head of the queue to make room for the new
//!   message.
//! - `BlockSender`: the publish/tell call waits until space is available.

// Layer 1: Standard library imports
use std::fmt;

// Layer 2: Third-party crate imports
use serde::{Deserialize, Serialize};

// Layer 3: Internal module imports
use crate::message::MessagePriority;

/// Overflow policy for a bounded mailbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum BackpressureStrategy {
    /// Drop the incoming message, keep the queue as-is. Default policy.
    #[default]
    DropNewest,
    /// Evict the oldest queued message to make room for the incoming one.
    DropOldest,
    /// Block the sender until space becomes available.
    BlockSender,
}

impl fmt::Display for BackpressureStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DropNewest => write!(f, "drop-newest"),
            Self::DropOldest => write!(f, "drop-oldest"),
            Self::BlockSender => write!(f, "block-sender"),
        }
    }
}

impl BackpressureStrategy {
    /// Parse the configuration-file spelling (`failure-policy`-style kebab
    /// case) used in actor configs.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "drop-newest" => Some(Self::DropNewest),
            "drop-oldest" => Some(Self::DropOldest),
            "block-sender" => Some(Self::BlockSender),
            _ => None,
        }
    }

    /// Suggest a strategy based on message priority: critical traffic
    /// should never be silently dropped.
    pub fn for_priority(priority: MessagePriority) -> Self {
        match priority {
            MessagePriority::Critical | MessagePriority::High => Self::BlockSender,
            MessagePriority::Normal => Self::DropOldest,
            MessagePriority::Low => Self::DropNewest,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_drop_newest() {
        assert_eq!(BackpressureStrategy::default(), BackpressureStrategy::DropNewest);
    }

    #[test]
    fn display_matches_config_spelling() {
        assert_eq!(BackpressureStrategy::DropNewest.to_string(), "drop-newest");
        assert_eq!(BackpressureStrategy::DropOldest.to_string(), "drop-oldest");
        assert_eq!(BackpressureStrategy::BlockSender.to_string(), "block-sender");
    }

    #[test]
    fn parse_round_trips_display() {
        for s in [
            BackpressureStrategy::DropNewest,
            BackpressureStrategy::DropOldest,
            BackpressureStrategy::BlockSender,
        ] {
            assert_eq!(BackpressureStrategy::parse(&s.to_string()), Some(s));
        }
    }

    #[test]
    fn parse_rejects_unknown() {
        assert_eq!(BackpressureStrategy::parse("drop-random"), None);
    }

    #[test]
    fn for_priority_blocks_on_high_and_critical() {
        assert_eq!(
            BackpressureStrategy::for_priority(MessagePriority::Critical),
            BackpressureStrategy::BlockSender
        );
        assert_eq!(
            BackpressureStrategy::for_priority(MessagePriority::High),
            BackpressureStrategy::BlockSender
        );
    }
}
