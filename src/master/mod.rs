//! Master: drives every actor in a graph through the phase protocol and
//! reacts to unrecoverable actor failures per [`FailurePolicy`].
//!
//! Spawns one `tokio::task` per actor and keeps only a type-erased handle
//! (mailbox sender + `JoinHandle`) in a shared table: the concrete
//! `Actor`/`Error` types are monomorphized into that task's closure and
//! never need a `dyn` object at the registry boundary, even though many
//! different concrete actor types share one graph.

// Layer 1: Standard library imports
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

// Layer 2: Third-party crate imports
use parking_lot::RwLock;
use tokio::sync::mpsc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{error, info, warn};
use uuid::Uuid;

// Layer 3: Internal module imports
use crate::actor::context::Directory;
use crate::actor::{Actor, ActorContext, ActorState, ErrorAction};
use crate::bus::Bus;
use crate::clock::{Clock, Scheduler};
use crate::mailbox::{BoundedMailbox, MailboxReceiver, MailboxSender};
use crate::message::{Message, MessageEnvelope, RaceMessage, SystemMessage};
use crate::topic::TopicRegistry;
use crate::util::ActorAddress;

/// How the Master reacts when an actor reports an unrecoverable failure or
/// fails to acknowledge a phase transition in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// The actor's failure aborts the whole graph.
    Critical,
    /// The actor's failure is logged and the rest of the graph continues.
    Optional,
    /// The actor is restarted with a fresh mailbox; no message replay.
    Restartable,
}

/// Error returned by Master-level phase operations.
#[derive(Debug, thiserror::Error)]
pub enum MasterError {
    #[error("actor {0} did not acknowledge the phase transition in time")]
    PhaseTimeout(ActorAddress),
    #[error("actor {address} failed during the phase transition: {reason}")]
    PhaseFailed { address: ActorAddress, reason: String },
    #[error("no actor registered at {0}")]
    UnknownActor(ActorAddress),
}

struct ActorHandle<U: Message> {
    sender: crate::mailbox::BoundedMailboxSender<RaceMessage<U>>,
    join: JoinHandle<()>,
    policy: FailurePolicy,
}

type ReportSender = mpsc::UnboundedSender<(ActorAddress, SystemMessage)>;
type ReportReceiver = mpsc::UnboundedReceiver<(ActorAddress, SystemMessage)>;

struct MasterInner<U: Message> {
    actors: RwLock<HashMap<ActorAddress, ActorHandle<U>>>,
    /// Creation/start order, oldest first. `HashMap` iteration order is
    /// unspecified, but termination and init-failure rollback must walk
    /// actors newest-first, so this is tracked alongside the map.
    order: RwLock<Vec<ActorAddress>>,
    bus: Bus<U>,
    clock: Clock,
    scheduler: Arc<Scheduler<U>>,
    topics: TopicRegistry,
    directory: Directory<U>,
    report_tx: ReportSender,
    report_rx: tokio::sync::Mutex<ReportReceiver>,
    phase_timeout: Duration,
}

/// Orchestrates every actor in one graph through Create/Initialize/Start/
/// Pause/Resume/Terminate, and owns the shared bus/clock/scheduler/topic
/// registry every actor's context is built from.
#[derive(Clone)]
pub struct Master<U: Message> {
    inner: Arc<MasterInner<U>>,
}

impl<U: Message> Master<U> {
    /// Build a new, empty graph anchored at `clock`.
    pub fn new(clock: Clock, phase_timeout: Duration) -> Self {
        let (report_tx, report_rx) = mpsc::unbounded_channel();
        let scheduler = Arc::new(Scheduler::spawn(clock.clone()));
        Self {
            inner: Arc::new(MasterInner {
                actors: RwLock::new(HashMap::new()),
                order: RwLock::new(Vec::new()),
                bus: Bus::new(),
                clock,
                scheduler,
                topics: TopicRegistry::new(),
                directory: Directory::new(),
                report_tx,
                report_rx: tokio::sync::Mutex::new(report_rx),
                phase_timeout,
            }),
        }
    }

    pub fn clock(&self) -> &Clock {
        &self.inner.clock
    }

    pub fn bus(&self) -> &Bus<U> {
        &self.inner.bus
    }

    pub fn topics(&self) -> &TopicRegistry {
        &self.inner.topics
    }

    pub fn actor_count(&self) -> usize {
        self.inner.actors.read().len()
    }

    /// Create (`Created` state) an actor: builds its mailbox and context,
    /// registers it in the directory, and spawns its driver task. The
    /// actor does not yet process phase transitions until
    /// [`Master::initialize_all`]/[`Master::start_all`] are called.
    pub fn create<A>(&self, actor: A, name: impl Into<String>, mailbox_capacity: usize, policy: FailurePolicy) -> ActorAddress
    where
        A: Actor<User = U> + 'static,
    {
        let address = ActorAddress::local(name);
        let (mailbox, sender) = BoundedMailbox::new(mailbox_capacity);
        self.inner.directory.register(address.clone(), sender.clone());

        let context = ActorContext::new(
            address.clone(),
            self.inner.bus.clone(),
            self.inner.clock.clone(),
            Arc::clone(&self.inner.scheduler),
            self.inner.topics.clone(),
            self.inner.directory.clone(),
            sender.clone(),
        );

        let join = self.spawn_driver(actor, mailbox, context, address.clone());
        self.inner.actors.write().insert(
            address.clone(),
            ActorHandle {
                sender,
                join,
                policy,
            },
        );
        self.inner.order.write().push(address.clone());
        address
    }

    fn spawn_driver<A>(
        &self,
        mut actor: A,
        mut mailbox: BoundedMailbox<RaceMessage<U>>,
        mut context: ActorContext<U>,
        address: ActorAddress,
    ) -> JoinHandle<()>
    where
        A: Actor<User = U> + 'static,
    {
        let report_tx = self.inner.report_tx.clone();
        tokio::spawn(async move {
            // Envelopes pulled out of the mailbox while a handler future was
            // in flight (see below) and found not to be an `ask` reply; kept
            // in arrival order and drained before touching the mailbox again.
            let mut buffered: VecDeque<MessageEnvelope<RaceMessage<U>>> = VecDeque::new();
            // Cloned handle to the context's pending-`ask` table, resolved
            // independently of `context` itself: `handle_message` below
            // holds a `&mut context` borrow for its whole lifetime, so
            // resolving an ask reply concurrently can't go through `context`.
            let pending_asks = context.pending_asks_handle();

            'driver: loop {
                let envelope = match buffered.pop_front() {
                    Some(e) => e,
                    None => match mailbox.recv().await {
                        Some(e) => e,
                        None => break,
                    },
                };

                if Self::try_resolve_ask(&pending_asks, &envelope) {
                    continue;
                }

                let correlation_id = envelope.correlation_id;
                let sender = envelope.sender.clone();
                let reply_to = envelope.reply_to.clone();

                match envelope.payload {
                    RaceMessage::System(system_message) => {
                        if Self::drive_phase(&mut actor, &mut context, &address, system_message, &report_tx).await {
                            break;
                        }
                    }
                    other => {
                        context.set_inbound(sender, reply_to, correlation_id);

                        // While the handler is in flight it may itself be
                        // awaiting an `ask` reply on this very mailbox;
                        // keep draining so that reply can resolve without
                        // waiting for the handler to return. Anything that
                        // isn't an ask reply is buffered for strict
                        // per-sender FIFO processing once the handler
                        // finishes. Scoped in a block so the handler future
                        // (and its borrows of `actor`/`context`) is dropped
                        // before either is borrowed again below.
                        let result = {
                            let handler_fut = actor.handle_message(other, &mut context);
                            tokio::pin!(handler_fut);
                            loop {
                                tokio::select! {
                                    result = &mut handler_fut => break result,
                                    incoming = mailbox.recv() => {
                                        match incoming {
                                            Some(incoming) if Self::try_resolve_ask(&pending_asks, &incoming) => {}
                                            Some(incoming) => buffered.push_back(incoming),
                                            None => {}
                                        }
                                    }
                                }
                            }
                        };

                        if let Err(e) = result {
                            let action = actor.on_error(e, &mut context).await;
                            if Self::apply_error_action(&mut actor, &mut context, &address, action, &report_tx).await {
                                break 'driver;
                            }
                        }
                    }
                }
            }
        })
    }

    /// If `envelope` carries a correlation id matching one of this actor's
    /// own pending `ask` calls, resolve it and report that the envelope has
    /// been fully handled (it must not also reach `handle_message`).
    fn try_resolve_ask(
        pending_asks: &Arc<RwLock<HashMap<Uuid, oneshot::Sender<U>>>>,
        envelope: &MessageEnvelope<RaceMessage<U>>,
    ) -> bool {
        let Some(correlation_id) = envelope.correlation_id else {
            return false;
        };
        let RaceMessage::User(ref payload) = envelope.payload else {
            return false;
        };
        match pending_asks.write().remove(&correlation_id) {
            Some(tx) => {
                let _ = tx.send(payload.clone());
                true
            }
            None => false,
        }
    }

    /// Drive one phase-control message through the actor's lifecycle hooks,
    /// reporting the outcome back to the Master. Returns `true` if the
    /// driver loop should stop (terminal transition reached).
    async fn drive_phase<A>(
        actor: &mut A,
        context: &mut ActorContext<U>,
        address: &ActorAddress,
        message: SystemMessage,
        report_tx: &ReportSender,
    ) -> bool
    where
        A: Actor<User = U>,
    {
        match message {
            SystemMessage::Initialize => {
                context.lifecycle_mut().transition_to(ActorState::Initializing);
                match actor.on_initialize(context).await {
                    Ok(()) => {
                        context.lifecycle_mut().transition_to(ActorState::Initialized);
                        let _ = report_tx.send((address.clone(), SystemMessage::Initialized { capabilities: vec![] }));
                    }
                    Err(e) => {
                        context.lifecycle_mut().transition_to(ActorState::Failed);
                        let _ = report_tx.send((
                            address.clone(),
                            SystemMessage::InitializeFailed { reason: e.to_string() },
                        ));
                        return true;
                    }
                }
                false
            }
            SystemMessage::Start { base_instant: _ } => {
                context.lifecycle_mut().transition_to(ActorState::Starting);
                match actor.on_start(context).await {
                    Ok(()) => {
                        context.lifecycle_mut().transition_to(ActorState::Running);
                        let _ = report_tx.send((address.clone(), SystemMessage::Started));
                    }
                    Err(e) => {
                        context.lifecycle_mut().transition_to(ActorState::Failed);
                        let _ = report_tx.send((address.clone(), SystemMessage::StartFailed { reason: e.to_string() }));
                        return true;
                    }
                }
                false
            }
            SystemMessage::Pause => {
                context.lifecycle_mut().transition_to(ActorState::Paused);
                let _ = actor.on_pause(context).await;
                false
            }
            SystemMessage::Resume => {
                context.lifecycle_mut().transition_to(ActorState::Running);
                let _ = actor.on_resume(context).await;
                false
            }
            SystemMessage::Terminate => {
                context.lifecycle_mut().transition_to(ActorState::Terminating);
                let _ = actor.on_terminate(context).await;
                context.lifecycle_mut().transition_to(ActorState::Terminated);
                let _ = report_tx.send((address.clone(), SystemMessage::Terminated));
                true
            }
            _ => false,
        }
    }

    async fn apply_error_action<A>(
        actor: &mut A,
        context: &mut ActorContext<U>,
        address: &ActorAddress,
        action: ErrorAction,
        report_tx: &ReportSender,
    ) -> bool
    where
        A: Actor<User = U>,
    {
        match action {
            ErrorAction::Resume => false,
            ErrorAction::Stop => {
                context.lifecycle_mut().transition_to(ActorState::Terminating);
                let _ = actor.on_terminate(context).await;
                context.lifecycle_mut().transition_to(ActorState::Terminated);
                let _ = report_tx.send((
                    address.clone(),
                    SystemMessage::ActorFailed {
                        address: address.clone(),
                        reason: "handler error, stopped".into(),
                    },
                ));
                true
            }
            ErrorAction::Restart => {
                context.lifecycle_mut().reset_for_restart();
                match actor.on_initialize(context).await {
                    Ok(()) => {
                        context.lifecycle_mut().transition_to(ActorState::Initializing);
                        context.lifecycle_mut().transition_to(ActorState::Initialized);
                        false
                    }
                    Err(e) => {
                        let _ = report_tx.send((
                            address.clone(),
                            SystemMessage::ActorFailed {
                                address: address.clone(),
                                reason: format!("restart failed: {e}"),
                            },
                        ));
                        true
                    }
                }
            }
            ErrorAction::Escalate => {
                let _ = report_tx.send((
                    address.clone(),
                    SystemMessage::ActorFailed {
                        address: address.clone(),
                        reason: "escalated".into(),
                    },
                ));
                true
            }
        }
    }

    /// Broadcast `message` to every registered actor and collect matching
    /// reports, failing fast on the first `Critical`-policy actor that
    /// errors or times out.
    async fn broadcast_and_await(
        &self,
        message: SystemMessage,
        is_match: impl Fn(&SystemMessage) -> Option<bool>,
        rollback_on_failure: bool,
    ) -> Result<(), MasterError> {
        let targets: Vec<(ActorAddress, FailurePolicy)> = {
            let actors = self.inner.actors.read();
            actors.iter().map(|(a, h)| (a.clone(), h.policy)).collect()
        };

        for (address, _) in &targets {
            if let Some(handle) = self.inner.actors.read().get(address) {
                let envelope = MessageEnvelope::new(RaceMessage::System(message.clone()));
                let _ = handle.sender.send(envelope).await;
            }
        }

        let mut pending: std::collections::HashSet<ActorAddress> = targets.iter().map(|(a, _)| a.clone()).collect();
        let policies: HashMap<ActorAddress, FailurePolicy> = targets.into_iter().collect();
        let mut succeeded: Vec<ActorAddress> = Vec::new();

        while !pending.is_empty() {
            let next = {
                let mut rx = self.inner.report_rx.lock().await;
                timeout(self.inner.phase_timeout, rx.recv()).await
            };

            match next {
                Ok(Some((address, report))) => {
                    if !pending.contains(&address) {
                        continue;
                    }
                    match is_match(&report) {
                        Some(true) => {
                            pending.remove(&address);
                            succeeded.push(address);
                        }
                        Some(false) => {
                            pending.remove(&address);
                            let policy = policies.get(&address).copied().unwrap_or(FailurePolicy::Critical);
                            if policy == FailurePolicy::Critical {
                                error!(actor = %address, "critical actor failed phase transition");
                                if rollback_on_failure {
                                    self.rollback(&succeeded).await;
                                }
                                return Err(MasterError::PhaseFailed {
                                    address,
                                    reason: format!("{report:?}"),
                                });
                            }
                            warn!(actor = %address, policy = ?policy, "non-critical actor failed phase transition");
                        }
                        None => continue,
                    }
                }
                Ok(None) => break,
                Err(_) => {
                    if let Some(address) = pending.iter().next().cloned() {
                        if rollback_on_failure {
                            self.rollback(&succeeded).await;
                        }
                        return Err(MasterError::PhaseTimeout(address));
                    }
                    break;
                }
            }
        }
        Ok(())
    }

    /// Terminate already-succeeded actors in reverse creation order after a
    /// `Critical`-policy actor fails its phase transition, so no actor is
    /// left initialized/running when the graph as a whole aborts.
    async fn rollback(&self, succeeded: &[ActorAddress]) {
        let order = self.inner.order.read().clone();
        for address in order.iter().rev() {
            if !succeeded.contains(address) {
                continue;
            }
            if let Some(handle) = self.inner.actors.read().get(address) {
                warn!(actor = %address, "rolling back after critical phase failure");
                let envelope = MessageEnvelope::new(RaceMessage::System(SystemMessage::Terminate));
                let _ = handle.sender.send(envelope).await;
            }
        }
    }

    /// Drive every actor `Created -> Initializing -> Initialized`. If a
    /// `Critical`-policy actor fails, already-`Initialized` actors are sent
    /// `Terminate` in reverse creation order before the error is returned.
    pub async fn initialize_all(&self) -> Result<(), MasterError> {
        info!(actors = self.actor_count(), "initializing graph");
        self.broadcast_and_await(
            SystemMessage::Initialize,
            |m| match m {
                SystemMessage::Initialized { .. } => Some(true),
                SystemMessage::InitializeFailed { .. } => Some(false),
                _ => None,
            },
            true,
        )
        .await
    }

    /// Drive every actor `Initialized -> Starting -> Running`, broadcasting
    /// the logical base instant computed from the Master's clock.
    pub async fn start_all(&self) -> Result<(), MasterError> {
        let base_instant = self.inner.clock.now();
        self.inner.clock.set_base(base_instant);
        info!(actors = self.actor_count(), "starting graph");
        self.broadcast_and_await(
            SystemMessage::Start { base_instant },
            |m| match m {
                SystemMessage::Started => Some(true),
                SystemMessage::StartFailed { .. } => Some(false),
                _ => None,
            },
            true,
        )
        .await
    }

    /// Pause the clock and every actor.
    pub async fn pause_all(&self) {
        self.inner.clock.pause();
        let actors = self.inner.actors.read();
        for handle in actors.values() {
            let envelope = MessageEnvelope::new(RaceMessage::System(SystemMessage::Pause));
            let _ = handle.sender.send(envelope).await;
        }
    }

    /// Resume the clock and every actor.
    pub async fn resume_all(&self) {
        self.inner.clock.resume();
        let actors = self.inner.actors.read();
        for handle in actors.values() {
            let envelope = MessageEnvelope::new(RaceMessage::System(SystemMessage::Resume));
            let _ = handle.sender.send(envelope).await;
        }
    }

    /// Terminate every actor, newest-created first, and stop the clock.
    pub async fn terminate_all(&self) {
        let addresses: Vec<ActorAddress> = {
            let mut order = self.inner.order.write();
            let reversed: Vec<ActorAddress> = order.iter().rev().cloned().collect();
            order.clear();
            reversed
        };
        for address in &addresses {
            if let Some(handle) = self.inner.actors.read().get(address) {
                let envelope = MessageEnvelope::new(RaceMessage::System(SystemMessage::Terminate));
                let _ = handle.sender.send(envelope).await;
            }
        }
        for address in addresses {
            if let Some(handle) = self.inner.actors.write().remove(&address) {
                let _ = handle.join.await;
            }
            self.inner.directory.unregister(&address);
        }
        self.inner.clock.stop();
    }
}
