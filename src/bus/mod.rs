//! Publish/subscribe message bus.
//!
//! DashMap-backed routing tables instead of a single global lock, so publish
//! and subscribe never contend on each other for unrelated channels.
//! Exact-match subscriptions live in one table; glob-pattern subscriptions
//! ([`crate::util::pattern_matches`]) live in a second, smaller table that is
//! scanned per publish since patterns cannot be hashed directly.

// Layer 1: Standard library imports
use std::collections::HashSet;
use std::sync::Arc;

// Layer 2: Third-party crate imports
use dashmap::DashMap;
use tracing::{debug, warn};

// Layer 3: Internal module imports
use crate::mailbox::{BoundedMailboxSender, MailboxSender};
use crate::message::{BusEvent, Message, MessageEnvelope, RaceMessage};
use crate::util::ActorAddress;

/// A registered bus subscriber: the mailbox of an actor that asked to
/// receive events on some channel or pattern.
#[derive(Clone)]
struct Subscriber<U: Message> {
    address: ActorAddress,
    sender: BoundedMailboxSender<RaceMessage<U>>,
}

/// The in-process publish/subscribe bus shared by every actor in a system.
///
/// Generic over the application's user message type `U`, matching the
/// system-wide single-message-type convention the rest of the runtime
/// follows (actors plug into one shared `RaceMessage<U>` mailbox type,
/// avoiding `dyn` dispatch at the bus boundary).
pub struct Bus<U: Message> {
    exact: Arc<DashMap<String, Vec<Subscriber<U>>>>,
    patterns: Arc<DashMap<String, Vec<Subscriber<U>>>>,
}

impl<U: Message> Clone for Bus<U> {
    fn clone(&self) -> Self {
        Self {
            exact: Arc::clone(&self.exact),
            patterns: Arc::clone(&self.patterns),
        }
    }
}

impl<U: Message> Default for Bus<U> {
    fn default() -> Self {
        Self::new()
    }
}

impl<U: Message> Bus<U> {
    /// Create an empty bus.
    pub fn new() -> Self {
        Self {
            exact: Arc::new(DashMap::new()),
            patterns: Arc::new(DashMap::new()),
        }
    }

    /// Subscribe `address` to `channel_or_pattern`. Patterns containing `*`
    /// are registered in the glob table; everything else is an exact match.
    pub fn subscribe(
        &self,
        channel_or_pattern: impl Into<String>,
        address: ActorAddress,
        sender: BoundedMailboxSender<RaceMessage<U>>,
    ) {
        let key = channel_or_pattern.into();
        let table = if key.contains('*') { &self.patterns } else { &self.exact };
        let mut entry = table.entry(key.clone()).or_default();
        entry.retain(|s| s.address != address);
        entry.push(Subscriber { address, sender });
        debug!(channel = %key, "actor subscribed");
    }

    /// Remove `address`'s subscription to `channel_or_pattern`, if any.
    pub fn unsubscribe(&self, channel_or_pattern: &str, address: &ActorAddress) {
        let table = if channel_or_pattern.contains('*') {
            &self.patterns
        } else {
            &self.exact
        };
        if let Some(mut entry) = table.get_mut(channel_or_pattern) {
            entry.retain(|s| &s.address != address);
        }
    }

    /// Publish `payload` on `channel`. Delivers to every exact-match and
    /// glob-match subscriber exactly once (duplicate subscriptions, e.g. an
    /// exact match plus an overlapping pattern, are deduplicated by
    /// subscriber address), preserving per-sender publish order since
    /// deliveries happen sequentially within this call.
    pub async fn publish(&self, channel: &str, payload: U, sender: ActorAddress) {
        let event = BusEvent::new(channel, payload, sender);
        let mut delivered = HashSet::new();

        if let Some(subs) = self.exact.get(channel) {
            for sub in subs.iter() {
                if delivered.insert(sub.address.clone()) {
                    Self::deliver(sub, &event).await;
                }
            }
        }

        for entry in self.patterns.iter() {
            if !crate::util::pattern_matches(entry.key(), channel) {
                continue;
            }
            for sub in entry.value().iter() {
                if delivered.insert(sub.address.clone()) {
                    Self::deliver(sub, &event).await;
                }
            }
        }
    }

    async fn deliver(sub: &Subscriber<U>, event: &BusEvent<U>) {
        let envelope = MessageEnvelope::new(RaceMessage::Bus(event.clone())).with_sender(event.sender.clone());
        if sub.sender.send(envelope).await.is_err() {
            warn!(subscriber = %sub.address, channel = %event.channel, "bus delivery failed, mailbox closed");
        }
    }

    /// Number of distinct exact-match channels with at least one subscriber.
    pub fn exact_channel_count(&self) -> usize {
        self.exact.len()
    }

    /// Number of distinct registered glob patterns.
    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mailbox::BoundedMailbox;
    use crate::mailbox::traits::MailboxReceiver;

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Payload(u32);

    impl Message for Payload {
        const MESSAGE_TYPE: &'static str = "payload";
    }

    fn addr(name: &str) -> ActorAddress {
        ActorAddress::local(name)
    }

    #[tokio::test]
    async fn exact_subscriber_receives_published_event() {
        let bus = Bus::<Payload>::new();
        let (mut mailbox, sender) = BoundedMailbox::<RaceMessage<Payload>>::new(10);
        bus.subscribe("/a/b", addr("sub"), sender);

        bus.publish("/a/b", Payload(1), addr("pub")).await;

        let envelope = mailbox.recv().await.unwrap();
        match envelope.payload {
            RaceMessage::Bus(event) => assert_eq!(event.payload, Payload(1)),
            _ => panic!("expected bus event"),
        }
    }

    #[tokio::test]
    async fn pattern_subscriber_matches_deep_wildcard() {
        let bus = Bus::<Payload>::new();
        let (mut mailbox, sender) = BoundedMailbox::<RaceMessage<Payload>>::new(10);
        bus.subscribe("/a/**", addr("sub"), sender);

        bus.publish("/a/b/c", Payload(2), addr("pub")).await;

        let envelope = mailbox.recv().await.unwrap();
        assert!(matches!(envelope.payload, RaceMessage::Bus(_)));
    }

    #[tokio::test]
    async fn overlapping_exact_and_pattern_subscription_delivers_once() {
        let bus = Bus::<Payload>::new();
        let (mut mailbox, sender) = BoundedMailbox::<RaceMessage<Payload>>::new(10);
        bus.subscribe("/a/b", addr("sub"), sender.clone());
        bus.subscribe("/a/*", addr("sub"), sender);

        bus.publish("/a/b", Payload(3), addr("pub")).await;

        assert!(mailbox.recv().await.is_some());
        assert!(mailbox.try_recv().is_err());
    }

    #[tokio::test]
    async fn unsubscribe_stops_delivery() {
        let bus = Bus::<Payload>::new();
        let (mut mailbox, sender) = BoundedMailbox::<RaceMessage<Payload>>::new(10);
        let a = addr("sub");
        bus.subscribe("/a/b", a.clone(), sender);
        bus.unsubscribe("/a/b", &a);

        bus.publish("/a/b", Payload(4), addr("pub")).await;
        assert!(mailbox.try_recv().is_err());
    }

    #[tokio::test]
    async fn non_matching_channel_is_not_delivered() {
        let bus = Bus::<Payload>::new();
        let (mut mailbox, sender) = BoundedMailbox::<RaceMessage<Payload>>::new(10);
        bus.subscribe("/a/b", addr("sub"), sender);

        bus.publish("/x/y", Payload(5), addr("pub")).await;
        assert!(mailbox.try_recv().is_err());
    }
}
