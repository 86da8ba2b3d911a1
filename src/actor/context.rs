//! Per-actor context: identity, lifecycle, and the operations an actor
//! uses to talk to the rest of the runtime.
//!
//! Generic over the system's user message type `U`, never over `dyn`
//! trait objects (§6.2): the bus, scheduler, and topic registry handles
//! held here are concrete, cheaply-`Clone`-able types.

// Layer 1: Standard library imports
use std::collections::HashMap;
use std::sync::Arc;

// Layer 2: Third-party crate imports
use chrono::{DateTime, Duration as ChronoDuration, Utc}; // §3.2 MANDATORY
use parking_lot::RwLock;
use tokio::sync::oneshot;
use uuid::Uuid;

// Layer 3: Internal module imports
use super::lifecycle::{ActorLifecycle, ActorState};
use crate::bus::Bus;
use crate::clock::{Clock, ScheduleHandle, Scheduler};
use crate::mailbox::{BoundedMailboxSender, MailboxSender};
use crate::message::{Message, MessageEnvelope, RaceMessage};
use crate::topic::{ChannelTopic, TopicRegistry};
use crate::util::{ActorAddress, ActorId};

/// Shared, cloneable directory of every local actor's mailbox sender, used
/// to resolve `tell`/`ask` targets by address.
#[derive(Clone)]
pub struct Directory<U: Message> {
    senders: Arc<RwLock<HashMap<ActorAddress, BoundedMailboxSender<RaceMessage<U>>>>>,
}

impl<U: Message> Default for Directory<U> {
    fn default() -> Self {
        Self::new()
    }
}

impl<U: Message> Directory<U> {
    pub fn new() -> Self {
        Self {
            senders: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn register(&self, address: ActorAddress, sender: BoundedMailboxSender<RaceMessage<U>>) {
        self.senders.write().insert(address, sender);
    }

    pub fn unregister(&self, address: &ActorAddress) {
        self.senders.write().remove(address);
    }

    pub fn resolve(&self, address: &ActorAddress) -> Option<BoundedMailboxSender<RaceMessage<U>>> {
        self.senders.read().get(address).cloned()
    }
}

/// Error returned by context operations that target another actor.
#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    #[error("no local actor registered at {0}")]
    UnknownTarget(ActorAddress),
    #[error("target mailbox rejected the message: {0}")]
    Mailbox(#[from] crate::mailbox::MailboxError),
    #[error("no reply from {target} within {elapsed:?}")]
    AskTimeout {
        target: ActorAddress,
        elapsed: std::time::Duration,
    },
}

/// Everything an actor's own handlers can reach: its identity, the bus, the
/// scheduler, the topic negotiation registry, and a directory for
/// point-to-point `tell`/`ask`.
pub struct ActorContext<U: Message> {
    address: ActorAddress,
    id: ActorId,
    lifecycle: ActorLifecycle,
    created_at: DateTime<Utc>,
    bus: Bus<U>,
    clock: Clock,
    scheduler: Arc<Scheduler<U>>,
    topics: TopicRegistry,
    directory: Directory<U>,
    self_sender: BoundedMailboxSender<RaceMessage<U>>,
    /// Pending `ask` calls keyed by correlation id, resolved by the driver
    /// loop when a matching reply arrives instead of being dispatched to
    /// `handle_message`.
    pending_asks: Arc<RwLock<HashMap<Uuid, oneshot::Sender<U>>>>,
    /// Sender/reply-to/correlation id of the message currently being
    /// handled, set by the driver loop before calling `handle_message` so
    /// a handler can answer via [`ActorContext::reply`].
    inbound_sender: Option<ActorAddress>,
    inbound_reply_to: Option<ActorAddress>,
    inbound_correlation_id: Option<Uuid>,
}

impl<U: Message> ActorContext<U> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        address: ActorAddress,
        bus: Bus<U>,
        clock: Clock,
        scheduler: Arc<Scheduler<U>>,
        topics: TopicRegistry,
        directory: Directory<U>,
        self_sender: BoundedMailboxSender<RaceMessage<U>>,
    ) -> Self {
        let id = address.local_id().unwrap_or_default();
        Self {
            id,
            address,
            lifecycle: ActorLifecycle::new(),
            created_at: Utc::now(), // §3.2
            bus,
            clock,
            scheduler,
            topics,
            directory,
            self_sender,
            pending_asks: Arc::new(RwLock::new(HashMap::new())),
            inbound_sender: None,
            inbound_reply_to: None,
            inbound_correlation_id: None,
        }
    }

    pub fn address(&self) -> &ActorAddress {
        &self.address
    }

    pub fn id(&self) -> &ActorId {
        &self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn state(&self) -> ActorState {
        self.lifecycle.state()
    }

    pub fn lifecycle_mut(&mut self) -> &mut ActorLifecycle {
        &mut self.lifecycle
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Subscribe to `channel_or_pattern` on the bus.
    pub fn subscribe(&self, channel_or_pattern: impl Into<String>) {
        self.bus
            .subscribe(channel_or_pattern, self.address.clone(), self.self_sender.clone());
    }

    /// Remove a previously registered bus subscription.
    pub fn unsubscribe(&self, channel_or_pattern: &str) {
        self.bus.unsubscribe(channel_or_pattern, &self.address);
    }

    /// Publish `payload` on `channel`.
    pub async fn publish(&self, channel: &str, payload: U) {
        self.bus.publish(channel, payload, self.address.clone()).await;
    }

    /// Request activation of a (channel, topic) pair as a consumer.
    pub fn request_topic(&self, channel: impl Into<String>, topic: Option<String>) -> ChannelTopic {
        ChannelTopic::new(channel, topic)
    }

    /// Release a previously accepted (channel, topic) pair. Returns `true`
    /// if this was the last consumer, meaning the provider can stand down.
    pub fn release_topic(&self, pair: &ChannelTopic) -> bool {
        self.topics.release(pair, &self.address)
    }

    /// Schedule `payload` for delivery to self after `delay`.
    pub fn schedule_after(&self, delay: ChronoDuration, payload: U) -> ScheduleHandle {
        self.scheduler.schedule_after(delay, self.self_sender.clone(), payload)
    }

    /// Schedule `payload` for delivery to self at an absolute logical instant.
    pub fn schedule_at(&self, instant: DateTime<Utc>, payload: U) -> ScheduleHandle {
        self.scheduler.schedule_at(instant, self.self_sender.clone(), payload)
    }

    /// Send `payload` directly to `target`, fire-and-forget.
    pub async fn tell(&self, target: &ActorAddress, payload: U) -> Result<(), ContextError> {
        let sender = self
            .directory
            .resolve(target)
            .ok_or_else(|| ContextError::UnknownTarget(target.clone()))?;
        let envelope = MessageEnvelope::new(RaceMessage::User(payload)).with_sender(self.address.clone());
        sender.send(envelope).await.map_err(ContextError::from)
    }

    /// Send `payload` to `target` and wait up to `timeout` for a reply sent
    /// back via [`ActorContext::reply`]. The reply is matched by a
    /// correlation id generated here and carried on the envelope's
    /// `reply_to`/`correlation_id` fields; a late reply arriving after this
    /// call has already timed out is silently dropped by the driver loop.
    pub async fn ask(
        &self,
        target: &ActorAddress,
        payload: U,
        timeout: std::time::Duration,
    ) -> Result<U, ContextError> {
        let sender = self
            .directory
            .resolve(target)
            .ok_or_else(|| ContextError::UnknownTarget(target.clone()))?;

        let correlation_id = Uuid::new_v4();
        let (tx, rx) = oneshot::channel();
        self.pending_asks.write().insert(correlation_id, tx);

        let envelope = MessageEnvelope::new(RaceMessage::User(payload))
            .with_sender(self.address.clone())
            .with_reply_to(self.address.clone())
            .with_correlation_id(correlation_id);

        if let Err(e) = sender.send(envelope).await {
            self.pending_asks.write().remove(&correlation_id);
            return Err(ContextError::from(e));
        }

        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(reply)) => Ok(reply),
            Ok(Err(_)) | Err(_) => {
                self.pending_asks.write().remove(&correlation_id);
                Err(ContextError::AskTimeout {
                    target: target.clone(),
                    elapsed: timeout,
                })
            }
        }
    }

    /// Answer the message currently being handled, sent back to whoever set
    /// `reply_to` (falling back to the original sender) with the same
    /// correlation id so a pending [`ActorContext::ask`] can resolve it.
    /// No-op if the inbound message carried no correlation id.
    pub async fn reply(&self, payload: U) -> Result<(), ContextError> {
        let Some(correlation_id) = self.inbound_correlation_id else {
            return Ok(());
        };
        let target = self
            .inbound_reply_to
            .clone()
            .or_else(|| self.inbound_sender.clone())
            .ok_or_else(|| ContextError::UnknownTarget(self.address.clone()))?;
        let sender = self
            .directory
            .resolve(&target)
            .ok_or_else(|| ContextError::UnknownTarget(target.clone()))?;
        let envelope = MessageEnvelope::new(RaceMessage::User(payload))
            .with_sender(self.address.clone())
            .with_correlation_id(correlation_id);
        sender.send(envelope).await.map_err(ContextError::from)
    }

    /// Record the sender/reply-to/correlation id of the message about to be
    /// dispatched to `handle_message`. Driver-loop internal.
    pub(crate) fn set_inbound(
        &mut self,
        sender: Option<ActorAddress>,
        reply_to: Option<ActorAddress>,
        correlation_id: Option<Uuid>,
    ) {
        self.inbound_sender = sender;
        self.inbound_reply_to = reply_to;
        self.inbound_correlation_id = correlation_id;
    }

    /// Clone of the pending-`ask` table. Driver-loop internal: lets the
    /// driver resolve incoming replies while a handler future holds the
    /// context's own `&mut` borrow, without borrowing the context itself.
    pub(crate) fn pending_asks_handle(&self) -> Arc<RwLock<HashMap<Uuid, oneshot::Sender<U>>>> {
        Arc::clone(&self.pending_asks)
    }

    /// Exposes the topic registry for negotiation-protocol handlers.
    pub fn topics(&self) -> &TopicRegistry {
        &self.topics
    }

    /// Exposes the actor directory, e.g. for a supervisor wiring up
    /// children.
    pub fn directory(&self) -> &Directory<U> {
        &self.directory
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

    fn make_context() -> (ActorContext<Payload>, crate::mailbox::BoundedMailbox<RaceMessage<Payload>>) {
        let address = ActorAddress::local("a");
        let bus = Bus::new();
        let clock = Clock::default();
        let scheduler = Arc::new(Scheduler::spawn(clock.clone()));
        let topics = TopicRegistry::new();
        let directory = Directory::new();
        let (mailbox, sender) = BoundedMailbox::new(10);
        directory.register(address.clone(), sender.clone());
        (
            ActorContext::new(address, bus, clock, scheduler, topics, directory, sender),
            mailbox,
        )
    }

    #[test]
    fn context_reports_identity_and_created_state() {
        let (ctx, _mailbox) = make_context();
        assert_eq!(ctx.address().name(), "a");
        assert_eq!(ctx.state(), ActorState::Created);
    }

    #[tokio::test]
    async fn publish_and_subscribe_round_trip_through_self() {
        let (ctx, mut mailbox) = make_context();
        ctx.subscribe("/x");
        ctx.publish("/x", Payload(1)).await;

        let envelope = mailbox.recv().await.unwrap();
        assert!(matches!(envelope.payload, RaceMessage::Bus(_)));
    }

    #[tokio::test]
    async fn tell_unknown_target_errors() {
        let (ctx, _mailbox) = make_context();
        let err = ctx.tell(&ActorAddress::local("ghost"), Payload(1)).await.unwrap_err();
        assert!(matches!(err, ContextError::UnknownTarget(_)));
    }

    #[tokio::test]
    async fn schedule_after_delivers_to_self() {
        let (ctx, mut mailbox) = make_context();
        ctx.schedule_after(ChronoDuration::milliseconds(5), Payload(9));

        let envelope = tokio::time::timeout(std::time::Duration::from_secs(1), mailbox.recv())
            .await
            .unwrap()
            .unwrap();
        match envelope.payload {
            RaceMessage::User(p) => assert_eq!(p, Payload(9)),
            _ => panic!("expected user payload"),
        }
    }
}
