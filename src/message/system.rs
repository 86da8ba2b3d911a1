//! System messages: phase commands, acks, and control-channel traffic.
//!
//! These are consumed by the runtime and only optionally observed by actor
//! authors (e.g. an actor that wants to react to `ClockReset`). They are
//! distinct from user payloads and never wrapped in [`super::BusEvent`].

// Layer 1: Standard library imports
use std::time::Duration;

// Layer 2: Third-party crate imports
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// Layer 3: Internal module imports
use crate::util::ActorAddress;

/// Reason an actor or phase step failed, carried in negative acks.
pub type FailureReason = String;

/// All control-plane messages exchanged between the Master, actors, and
/// (serialized) remote peers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SystemMessage {
    // --- Phase protocol ---
    /// Master asks an actor to initialize with the given context.
    Initialize,
    /// Actor acks successful initialization, reporting its capabilities.
    Initialized { capabilities: Vec<String> },
    /// Actor reports initialization failure.
    InitializeFailed { reason: FailureReason },
    /// Master broadcasts the computed base instant for the clock.
    Start { base_instant: DateTime<Utc> },
    /// Actor acks successful start.
    Started,
    /// Actor reports start failure.
    StartFailed { reason: FailureReason },
    /// Master requests the graph pause.
    Pause,
    /// Master requests the graph resume.
    Resume,
    /// Master requests actor termination.
    Terminate,
    /// Actor acks termination.
    Terminated,
    /// Actor reports an unrecoverable failure to the Master.
    ActorFailed {
        address: ActorAddress,
        reason: FailureReason,
    },

    // --- Liveness ---
    /// Heartbeat used to detect disconnection.
    Ping,
    /// Heartbeat reply.
    Pong,

    // --- Clock subsystem ---
    /// Broadcast whenever the clock's base, scale, or run state changes.
    ClockReset {
        old: DateTime<Utc>,
        new: DateTime<Utc>,
    },

    // --- Channel-topic negotiation protocol ---
    /// A consumer requests activation of a (channel, topic) pair.
    ChannelTopicRequest {
        channel: String,
        topic: Option<String>,
        requester: ActorAddress,
    },
    /// A provider offers to serve a requested pair.
    ChannelTopicResponse {
        channel: String,
        topic: Option<String>,
        provider: ActorAddress,
    },
    /// The consumer accepts a provider's offer, activating the pair.
    ChannelTopicAccept {
        channel: String,
        topic: Option<String>,
        provider: ActorAddress,
        consumer: ActorAddress,
    },
    /// The consumer releases a previously accepted pair.
    ChannelTopicRelease {
        channel: String,
        topic: Option<String>,
        provider: ActorAddress,
        consumer: ActorAddress,
    },
    /// A provider's active pair was released involuntarily (crash).
    ChannelTopicReleased {
        channel: String,
        topic: Option<String>,
        by_provider: ActorAddress,
    },

    // --- Remote federation ---
    /// Initiator's handshake request.
    RemoteConnectionRequest {
        node_id: crate::util::NodeId,
        capabilities: Vec<String>,
        credentials: Option<String>,
    },
    /// Responder accepts the handshake.
    RemoteConnectionAccept { node_id: crate::util::NodeId },
    /// Responder rejects the handshake.
    RemoteConnectionReject { reason: FailureReason },
    /// Request a remote actor be created on the owning peer.
    CreateRemote { spec_name: String },
    /// Peer confirms remote actor creation.
    RemoteCreated { address: ActorAddress },
    /// Subscribe to a channel published by a remote actor.
    RemoteSubscribe { channel: String },
    /// Unsubscribe a previously forwarded remote channel.
    RemoteUnsubscribe { channel: String },
    /// Master broadcasts clock base/scale to peers.
    SyncSimClock {
        base_instant: DateTime<Utc>,
        scale: f64,
    },
    /// Peer rejects a clock sync because local sim-time has drifted too far.
    ClockSkewRejected { max_diff: Duration, observed: Duration },
}

impl SystemMessage {
    /// A short, stable tag used for logs and the wire-protocol type byte.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Initialize => "initialize",
            Self::Initialized { .. } => "initialized",
            Self::InitializeFailed { .. } => "initialize_failed",
            Self::Start { .. } => "start",
            Self::Started => "started",
            Self::StartFailed { .. } => "start_failed",
            Self::Pause => "pause",
            Self::Resume => "resume",
            Self::Terminate => "terminate",
            Self::Terminated => "terminated",
            Self::ActorFailed { .. } => "actor_failed",
            Self::Ping => "ping",
            Self::Pong => "pong",
            Self::ClockReset { .. } => "clock_reset",
            Self::ChannelTopicRequest { .. } => "channel_topic_request",
            Self::ChannelTopicResponse { .. } => "channel_topic_response",
            Self::ChannelTopicAccept { .. } => "channel_topic_accept",
            Self::ChannelTopicRelease { .. } => "channel_topic_release",
            Self::ChannelTopicReleased { .. } => "channel_topic_released",
            Self::RemoteConnectionRequest { .. } => "remote_connection_request",
            Self::RemoteConnectionAccept { .. } => "remote_connection_accept",
            Self::RemoteConnectionReject { .. } => "remote_connection_reject",
            Self::CreateRemote { .. } => "create_remote",
            Self::RemoteCreated { .. } => "remote_created",
            Self::RemoteSubscribe { .. } => "remote_subscribe",
            Self::RemoteUnsubscribe { .. } => "remote_unsubscribe",
            Self::SyncSimClock { .. } => "sync_sim_clock",
            Self::ClockSkewRejected { .. } => "clock_skew_rejected",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_is_stable_per_variant() {
        assert_eq!(SystemMessage::Initialize.kind(), "initialize");
        assert_eq!(SystemMessage::Pause.kind(), "pause");
        assert_eq!(
            SystemMessage::ActorFailed {
                address: ActorAddress::local("a"),
                reason: "boom".into()
            }
            .kind(),
            "actor_failed"
        );
    }

    #[test]
    fn serializes_round_trip_json() {
        let msg = SystemMessage::Start {
            base_instant: Utc::now(),
        };
        let json = serde_json::to_string(&msg).unwrap();
        let back: SystemMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(msg.kind(), back.kind());
    }
}
