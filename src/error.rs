//! Crate-wide error umbrella.
//!
//! Every module defines its own error type for the failures specific to it
//! (`MailboxError`, `MasterError`, `SupervisorError`, ...). `RaceError` wraps
//! those into the handful of kinds an operator or a remote peer actually
//! needs to distinguish, following the same M-ERRORS-CANONICAL-STRUCTS shape
//! used throughout the crate.

// Layer 1: Standard library imports
use std::error::Error;
use std::time::Duration;

// Layer 2: Third-party crate imports
use thiserror::Error as ThisError;

// Layer 3: Internal module imports
use crate::mailbox::MailboxError;
use crate::master::MasterError;
use crate::util::ActorAddress;

/// Top-level error kind for the runtime.
#[derive(Debug, ThisError)]
pub enum RaceError {
    /// A configuration value was missing, malformed, or inconsistent.
    #[error("configuration error: {reason}")]
    ConfigurationError { reason: String },

    /// An actor failed its `Initialize` phase.
    #[error("actor {address} failed to initialize: {reason}")]
    InitializationFailure { address: ActorAddress, reason: String },

    /// An actor failed its `Start` phase.
    #[error("actor {address} failed to start: {reason}")]
    StartFailure { address: ActorAddress, reason: String },

    /// A message handler returned or panicked with an error.
    #[error("actor {address} handler failed: {source}")]
    HandlerException {
        address: ActorAddress,
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },

    /// A phase, request, or remote handshake did not complete in time.
    #[error("timed out after {elapsed:?} waiting on {address}")]
    Timeout { address: ActorAddress, elapsed: Duration },

    /// A mailbox rejected a message because it was full.
    #[error("mailbox overflow for {address}: {source}")]
    MailboxOverflow {
        address: ActorAddress,
        #[source]
        source: MailboxError,
    },

    /// A remote peer could not be reached or dropped the connection.
    #[error("remote peer {peer} unreachable: {reason}")]
    RemoteUnreachable { peer: String, reason: String },

    /// A message or handshake frame failed to encode or decode.
    #[error("serialization error: {reason}")]
    SerializationError { reason: String },

    /// A remote peer's clock differs from the local clock by more than the
    /// configured tolerance.
    #[error("clock skew {observed:?} exceeds max-clock-diff {max_diff:?}")]
    ClockSkew { max_diff: Duration, observed: Duration },
}

impl RaceError {
    /// Returns `true` for kinds that are worth retrying unchanged (transient
    /// network or timing failures), as opposed to kinds that need operator
    /// or code changes first.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. } | Self::MailboxOverflow { .. } | Self::RemoteUnreachable { .. }
        )
    }

    /// Returns the actor address implicated by this error, if any.
    pub fn address(&self) -> Option<&ActorAddress> {
        match self {
            Self::InitializationFailure { address, .. }
            | Self::StartFailure { address, .. }
            | Self::HandlerException { address, .. }
            | Self::Timeout { address, .. }
            | Self::MailboxOverflow { address, .. } => Some(address),
            _ => None,
        }
    }
}

impl From<MasterError> for RaceError {
    fn from(err: MasterError) -> Self {
        match err {
            MasterError::PhaseTimeout(address) => Self::Timeout {
                address,
                elapsed: Duration::default(),
            },
            MasterError::PhaseFailed { address, reason } => Self::StartFailure { address, reason },
            MasterError::UnknownActor(address) => Self::ConfigurationError {
                reason: format!("unknown actor {address}"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_error_is_not_retryable() {
        let err = RaceError::ConfigurationError {
            reason: "missing max-clock-diff".into(),
        };
        assert!(!err.is_retryable());
        assert!(err.address().is_none());
        assert!(err.to_string().contains("max-clock-diff"));
    }

    #[test]
    fn timeout_carries_address_and_is_retryable() {
        let address = ActorAddress::local("probe");
        let err = RaceError::Timeout {
            address: address.clone(),
            elapsed: Duration::from_secs(1),
        };
        assert!(err.is_retryable());
        assert_eq!(err.address(), Some(&address));
    }

    #[test]
    fn clock_skew_reports_both_durations() {
        let err = RaceError::ClockSkew {
            max_diff: Duration::from_millis(50),
            observed: Duration::from_millis(200),
        };
        let msg = err.to_string();
        assert!(msg.contains("50ms"));
        assert!(msg.contains("200ms"));
    }

    #[test]
    fn master_phase_timeout_converts_to_timeout() {
        let address = ActorAddress::local("worker");
        let master_err = MasterError::PhaseTimeout(address.clone());
        let err: RaceError = master_err.into();
        assert!(matches!(err, RaceError::Timeout { .. }));
        assert_eq!(err.address(), Some(&address));
    }
}
