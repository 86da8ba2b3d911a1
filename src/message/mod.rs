//! Message system with zero-cost abstractions.
//!
//! Provides the core message traits and the union type actors actually
//! receive: an actor's `handle_message` is polymorphic over system-message
//! variants, bus events, and user point-to-point messages, expressed
//! here as a single tagged enum rather than runtime reflection.

pub mod bus_event;
pub mod envelope;
pub mod system;
pub mod traits;

pub use bus_event::BusEvent;
pub use envelope::MessageEnvelope;
pub use system::SystemMessage;
pub use traits::{Message, MessagePriority};

use std::fmt::Debug;

/// Everything an actor's mailbox can deliver: a runtime-owned system
/// message, a bus publish wrapped with its channel and sender, or a
/// domain-specific user payload sent point-to-point via `tell`/`ask`.
///
/// Generic over the actor's own user-payload type `U`, keeping dispatch a
/// compile-time match rather than a dynamic downcast for the common case;
/// plug-in domain actors that need genuinely open-ended payloads use
/// `U = UserPayload` as an escape hatch.
#[derive(Debug, Clone)]
pub enum RaceMessage<U: Message> {
    /// A runtime control message.
    System(SystemMessage),
    /// A payload delivered via a bus subscription.
    Bus(BusEvent<U>),
    /// A payload sent directly to this actor (`tell`/`ask`).
    User(U),
}

impl<U: Message> RaceMessage<U> {
    /// True if this is a system control message.
    pub fn is_system(&self) -> bool {
        matches!(self, Self::System(_))
    }
}

impl<U: Message> Message for RaceMessage<U> {
    const MESSAGE_TYPE: &'static str = "race_message";

    fn priority(&self) -> MessagePriority {
        match self {
            Self::System(_) => MessagePriority::Critical,
            Self::Bus(event) => event.payload.priority(),
            Self::User(payload) => payload.priority(),
        }
    }
}

/// Opaque escape hatch for plug-in domain actors that cannot be expressed
/// as a fixed Rust type at compile time design notes): a type tag plus
/// an opaque serialized body.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct UserPayload {
    /// Identifies the logical payload type for the receiving actor.
    pub type_id: String,
    /// Serialized body, interpreted by the receiving actor's own codec.
    pub bytes: Vec<u8>,
}

impl Message for UserPayload {
    const MESSAGE_TYPE: &'static str = "user_payload";
}
