//! The wrapper under which every bus publish is delivered to a subscriber.

// Layer 1: Standard library imports
use std::fmt::Debug;

// Layer 2: Third-party crate imports
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// Layer 3: Internal module imports
use crate::util::ActorAddress;

/// A user payload delivered via the bus, always wrapped with its channel
/// name and sender per the data model's distinction between system
/// messages and user messages.
///
/// # Example
/// ```rust
/// use race_runtime::message::BusEvent;
/// use race_runtime::util::ActorAddress;
///
/// let sender = ActorAddress::local("feeder");
/// let event = BusEvent::new("/swim/sfdps/flights", "hello".to_string(), sender.clone());
/// assert_eq!(event.channel, "/swim/sfdps/flights");
/// assert_eq!(event.sender, sender);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusEvent<P: Clone + Debug + Send + Sync + 'static> {
    /// The channel this event was published on.
    pub channel: String,
    /// The user payload.
    pub payload: P,
    /// The actor that published this event.
    pub sender: ActorAddress,
    /// Logical timestamp at publish time.
    pub timestamp: DateTime<Utc>,
}

impl<P: Clone + Debug + Send + Sync + 'static> BusEvent<P> {
    /// Construct a new bus event stamped with the current wall-clock time.
    ///
    /// Callers that need sim-time stamping should use
    /// [`BusEvent::with_timestamp`] with a reading from the clock subsystem.
    pub fn new(channel: impl Into<String>, payload: P, sender: ActorAddress) -> Self {
        Self {
            channel: channel.into(),
            payload,
            sender,
            timestamp: Utc::now(),
        }
    }

    /// Construct a bus event with an explicit logical timestamp.
    pub fn with_timestamp(
        channel: impl Into<String>,
        payload: P,
        sender: ActorAddress,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            channel: channel.into(),
            payload,
            sender,
            timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bus_event_carries_channel_and_sender() {
        let sender = ActorAddress::local("feeder");
        let event = BusEvent::new("/x", 42u32, sender.clone());
        assert_eq!(event.channel, "/x");
        assert_eq!(event.payload, 42);
        assert_eq!(event.sender, sender);
    }

    #[test]
    fn bus_event_with_explicit_timestamp() {
        let sender = ActorAddress::local("feeder");
        let ts = Utc::now();
        let event = BusEvent::with_timestamp("/x", "y".to_string(), sender, ts);
        assert_eq!(event.timestamp, ts);
    }
}
