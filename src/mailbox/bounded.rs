//! Bounded mailbox with configurable overflow behavior.
//!
//! Backed by a `VecDeque` behind a `parking_lot::Mutex` rather than
//! `tokio::sync::mpsc`: the `DropOldest` policy needs to evict the head of
//! the queue when full, an operation `mpsc::Sender` has no way to express.
//! A `tokio::sync::Notify` pair wakes waiting receivers and (for
//! `BlockSender`) waiting senders.

// Layer 1: Standard library imports
use std::collections::VecDeque;
use std::sync::Arc;

// Layer 2: Third-party crate imports
use async_trait::async_trait;
use chrono::Utc; // §3.2 MANDATORY
use parking_lot::Mutex;
use tokio::sync::Notify;

// Layer 3: Internal module imports
use crate::mailbox::backpressure::BackpressureStrategy;
use crate::mailbox::metrics::{AtomicMetrics, MetricsRecorder};
use crate::mailbox::traits::{MailboxCapacity, MailboxError, MailboxReceiver, MailboxSender, TryRecvError};
use crate::message::{Message, MessageEnvelope};

struct Shared<M: Message> {
    queue: Mutex<VecDeque<MessageEnvelope<M>>>,
    capacity: usize,
    closed: std::sync::atomic::AtomicBool,
    not_empty: Notify,
    not_full: Notify,
}

/// Receiving half of a bounded mailbox. Owned by a single actor.
pub struct BoundedMailbox<M: Message, R: MetricsRecorder = AtomicMetrics> {
    shared: Arc<Shared<M>>,
    metrics: Arc<R>,
}

/// Cloneable sending half of a bounded mailbox.
pub struct BoundedMailboxSender<M: Message, R: MetricsRecorder = AtomicMetrics> {
    shared: Arc<Shared<M>>,
    strategy: BackpressureStrategy,
    metrics: Arc<R>,
}

impl<M: Message, R: MetricsRecorder> Clone for BoundedMailboxSender<M, R> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            strategy: self.strategy,
            metrics: Arc::clone(&self.metrics),
        }
    }
}

impl<M: Message> BoundedMailbox<M, AtomicMetrics> {
    /// Create a bounded mailbox with the default `DropNewest` policy and
    /// atomic metrics.
    pub fn new(capacity: usize) -> (Self, BoundedMailboxSender<M, AtomicMetrics>) {
        Self::with_backpressure_and_metrics(capacity, BackpressureStrategy::default(), Arc::new(AtomicMetrics::default()))
    }

    /// Create a bounded mailbox with an explicit overflow policy and atomic
    /// metrics.
    pub fn with_backpressure(
        capacity: usize,
        strategy: BackpressureStrategy,
    ) -> (Self, BoundedMailboxSender<M, AtomicMetrics>) {
        Self::with_backpressure_and_metrics(capacity, strategy, Arc::new(AtomicMetrics::default()))
    }
}

impl<M: Message, R: MetricsRecorder> BoundedMailbox<M, R> {
    /// Create a bounded mailbox with the default `DropNewest` policy and a
    /// caller-supplied metrics recorder.
    pub fn with_metrics(capacity: usize, metrics: Arc<R>) -> (Self, BoundedMailboxSender<M, R>) {
        Self::with_backpressure_and_metrics(capacity, BackpressureStrategy::default(), metrics)
    }

    /// Create a bounded mailbox with an explicit overflow policy and a
    /// caller-supplied metrics recorder.
    pub fn with_backpressure_and_metrics(
        capacity: usize,
        strategy: BackpressureStrategy,
        metrics: Arc<R>,
    ) -> (Self, BoundedMailboxSender<M, R>) {
        let shared = Arc::new(Shared {
            queue: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            closed: std::sync::atomic::AtomicBool::new(false),
            not_empty: Notify::new(),
            not_full: Notify::new(),
        });
        let receiver = Self {
            shared: Arc::clone(&shared),
            metrics: Arc::clone(&metrics),
        };
        let sender = BoundedMailboxSender {
            shared,
            strategy,
            metrics,
        };
        (receiver, sender)
    }
}

impl<M: Message, R: MetricsRecorder> Drop for BoundedMailbox<M, R> {
    fn drop(&mut self) {
        self.shared.closed.store(true, std::sync::atomic::Ordering::SeqCst);
        self.shared.not_full.notify_waiters();
    }
}

fn is_expired<M: Message>(envelope: &MessageEnvelope<M>) -> bool {
    envelope.is_expired()
}

#[async_trait]
impl<M: Message, R: MetricsRecorder> MailboxReceiver<M> for BoundedMailbox<M, R> {
    type Error = MailboxError;

    async fn recv(&mut self) -> Option<MessageEnvelope<M>> {
        loop {
            {
                let mut queue = self.shared.queue.lock();
                while let Some(envelope) = queue.pop_front() {
                    if is_expired(&envelope) {
                        self.metrics.record_dropped();
                        continue;
                    }
                    self.metrics.record_received();
                    self.metrics.update_last_message(Utc::now());
                    drop(queue);
                    self.shared.not_full.notify_one();
                    return Some(envelope);
                }
                if self.shared.closed.load(std::sync::atomic::Ordering::SeqCst) {
                    return None;
                }
            }
            self.shared.not_empty.notified().await;
        }
    }

    fn try_recv(&mut self) -> Result<MessageEnvelope<M>, TryRecvError> {
        loop {
            let mut queue = self.shared.queue.lock();
            match queue.pop_front() {
                Some(envelope) => {
                    if is_expired(&envelope) {
                        self.metrics.record_dropped();
                        continue;
                    }
                    self.metrics.record_received();
                    self.metrics.update_last_message(Utc::now());
                    drop(queue);
                    self.shared.not_full.notify_one();
                    return Ok(envelope);
                }
                None => {
                    return if self.shared.closed.load(std::sync::atomic::Ordering::SeqCst) {
                        Err(TryRecvError::Closed)
                    } else {
                        Err(TryRecvError::Empty)
                    };
                }
            }
        }
    }

    fn capacity(&self) -> MailboxCapacity {
        MailboxCapacity::Bounded(self.shared.capacity)
    }

    fn len(&self) -> usize {
        self.shared.queue.lock().len()
    }
}

#[async_trait]
impl<M: Message, R: MetricsRecorder> MailboxSender<M> for BoundedMailboxSender<M, R> {
    type Error = MailboxError;

    async fn send(&self, envelope: MessageEnvelope<M>) -> Result<(), Self::Error> {
        loop {
            if self.shared.closed.load(std::sync::atomic::Ordering::SeqCst) {
                return Err(MailboxError::Closed);
            }
            {
                let mut queue = self.shared.queue.lock();
                if queue.len() < self.shared.capacity {
                    queue.push_back(envelope);
                    drop(queue);
                    self.metrics.record_sent();
                    self.shared.not_empty.notify_one();
                    return Ok(());
                }
                match self.strategy {
                    BackpressureStrategy::DropNewest => {
                        drop(queue);
                        self.metrics.record_dropped();
                        return Ok(());
                    }
                    BackpressureStrategy::DropOldest => {
                        queue.pop_front();
                        queue.push_back(envelope);
                        drop(queue);
                        self.metrics.record_dropped();
                        self.metrics.record_sent();
                        self.shared.not_empty.notify_one();
                        return Ok(());
                    }
                    BackpressureStrategy::BlockSender => {
                        // fall through to wait below
                    }
                }
            }
            self.shared.not_full.notified().await;
        }
    }

    fn try_send(&self, envelope: MessageEnvelope<M>) -> Result<(), Self::Error> {
        if self.shared.closed.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(MailboxError::Closed);
        }
        let mut queue = self.shared.queue.lock();
        if queue.len() < self.shared.capacity {
            queue.push_back(envelope);
            drop(queue);
            self.metrics.record_sent();
            self.shared.not_empty.notify_one();
            return Ok(());
        }
        match self.strategy {
            BackpressureStrategy::DropNewest => {
                drop(queue);
                self.metrics.record_dropped();
                Err(MailboxError::Full {
                    capacity: self.shared.capacity,
                })
            }
            BackpressureStrategy::DropOldest => {
                queue.pop_front();
                queue.push_back(envelope);
                drop(queue);
                self.metrics.record_dropped();
                self.metrics.record_sent();
                self.shared.not_empty.notify_one();
                Ok(())
            }
            BackpressureStrategy::BlockSender => {
                drop(queue);
                Err(MailboxError::BackpressureApplied {
                    strategy: self.strategy,
                })
            }
        }
    }
}

impl<M: Message, R: MetricsRecorder> BoundedMailboxSender<M, R> {
    /// The configured overflow policy.
    pub fn strategy(&self) -> BackpressureStrategy {
        self.strategy
    }
}
