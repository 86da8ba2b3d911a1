//! Min-heap based deadline scheduler driving `schedule_after`/`schedule_at`.
//! Runs as a background `tokio::task`, waking only when the next deadline
//! is due or a new entry beats it.

// Layer 1: Standard library imports
use std::cmp::Ordering as CmpOrdering;
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

// Layer 2: Third-party crate imports
use chrono::{DateTime, Utc}; // §3.2 MANDATORY
use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

// Layer 3: Internal module imports
use super::Clock;
use crate::mailbox::{BoundedMailboxSender, MailboxSender};
use crate::message::{Message, MessageEnvelope, RaceMessage};

struct Entry<U: Message> {
    deadline: DateTime<Utc>,
    seq: u64,
    sender: BoundedMailboxSender<RaceMessage<U>>,
    payload: U,
}

impl<U: Message> PartialEq for Entry<U> {
    fn eq(&self, other: &Self) -> bool {
        self.deadline == other.deadline && self.seq == other.seq
    }
}
impl<U: Message> Eq for Entry<U> {}

impl<U: Message> PartialOrd for Entry<U> {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

impl<U: Message> Ord for Entry<U> {
    fn cmp(&self, other: &Self) -> CmpOrdering {
        // BinaryHeap is a max-heap; reverse so the earliest deadline sorts first.
        other.deadline.cmp(&self.deadline).then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Converts a logical-time gap into the wall-clock duration the scheduler
/// loop should actually sleep, given the clock's current scale. A deadline
/// 5 logical seconds out on a 10x clock is only 500ms of real waiting.
/// `scale <= 0.0` (a stopped/archive-replay clock) never closes this gap on
/// its own, so the loop just retries periodically instead of blocking on a
/// sleep that would never legitimately wake.
fn wall_wait_for(logical_gap: chrono::Duration, scale: f64) -> std::time::Duration {
    if scale <= 0.0 {
        return std::time::Duration::from_millis(100);
    }
    let logical_nanos = logical_gap.num_nanoseconds().unwrap_or(i64::MAX).max(0) as f64;
    let wall_nanos = logical_nanos / scale;
    std::time::Duration::from_nanos(wall_nanos.min(u64::MAX as f64) as u64)
}

/// Identifies a scheduled entry so it can later be passed to
/// [`Scheduler::cancel`].
pub struct ScheduleHandle {
    seq: u64,
}

impl ScheduleHandle {
    pub fn id(&self) -> u64 {
        self.seq
    }
}

struct SchedulerState<U: Message> {
    heap: BinaryHeap<Entry<U>>,
    cancelled: std::collections::HashSet<u64>,
}

/// Background scheduler for one system's delayed/absolute message deliveries.
pub struct Scheduler<U: Message> {
    state: Arc<Mutex<SchedulerState<U>>>,
    wake: Arc<Notify>,
    next_seq: Arc<AtomicU64>,
    clock: Clock,
    task: Option<JoinHandle<()>>,
}

impl<U: Message> Scheduler<U> {
    /// Start the background dispatch loop against `clock`'s logical time.
    pub fn spawn(clock: Clock) -> Self {
        let state = Arc::new(Mutex::new(SchedulerState {
            heap: BinaryHeap::new(),
            cancelled: std::collections::HashSet::new(),
        }));
        let wake = Arc::new(Notify::new());

        let task_state = Arc::clone(&state);
        let task_wake = Arc::clone(&wake);
        let task_clock = clock.clone();
        let task = tokio::spawn(async move {
            loop {
                let next_deadline = {
                    let guard = task_state.lock();
                    guard.heap.peek().map(|e| e.deadline)
                };
                match next_deadline {
                    None => task_wake.notified().await,
                    Some(deadline) => {
                        let now = task_clock.now();
                        if deadline > now {
                            let wait = wall_wait_for(deadline - now, task_clock.scale());
                            tokio::select! {
                                _ = tokio::time::sleep(wait) => {}
                                _ = task_wake.notified() => continue,
                            }
                        }
                        let due = {
                            let mut guard = task_state.lock();
                            let mut due = Vec::new();
                            while let Some(top) = guard.heap.peek() {
                                if top.deadline > task_clock.now() {
                                    break;
                                }
                                let entry = guard.heap.pop().unwrap();
                                if !guard.cancelled.remove(&entry.seq) {
                                    due.push(entry);
                                }
                            }
                            due
                        };
                        for entry in due {
                            let envelope = MessageEnvelope::new(RaceMessage::User(entry.payload));
                            let _ = entry.sender.send(envelope).await;
                        }
                    }
                }
            }
        });

        Self {
            state,
            wake,
            next_seq: Arc::new(AtomicU64::new(0)),
            clock,
            task: Some(task),
        }
    }

    /// Schedule `payload` for delivery to `sender` at the clock's logical
    /// `deadline`.
    pub fn schedule_at(
        &self,
        deadline: DateTime<Utc>,
        sender: BoundedMailboxSender<RaceMessage<U>>,
        payload: U,
    ) -> ScheduleHandle {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        {
            let mut guard = self.state.lock();
            guard.heap.push(Entry {
                deadline,
                seq,
                sender,
                payload,
            });
        }
        self.wake.notify_one();
        ScheduleHandle { seq }
    }

    /// Schedule `payload` for delivery to `sender` after `delay` of logical
    /// time from now.
    pub fn schedule_after(
        &self,
        delay: chrono::Duration,
        sender: BoundedMailboxSender<RaceMessage<U>>,
        payload: U,
    ) -> ScheduleHandle {
        self.schedule_at(self.clock.now() + delay, sender, payload)
    }

    /// Cancel a previously scheduled entry by its handle id.
    pub fn cancel(&self, handle: &ScheduleHandle) {
        let mut guard = self.state.lock();
        guard.cancelled.insert(handle.seq);
    }

    /// Number of entries still pending dispatch.
    pub fn pending_count(&self) -> usize {
        self.state.lock().heap.len()
    }
}

impl<U: Message> Drop for Scheduler<U> {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
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

    #[tokio::test]
    async fn schedule_after_delivers_once_due() {
        let clock = Clock::new(Utc::now(), 1.0);
        let scheduler = Scheduler::<Payload>::spawn(clock);
        let (mut mailbox, sender) = BoundedMailbox::<RaceMessage<Payload>>::new(10);

        scheduler.schedule_after(chrono::Duration::milliseconds(10), sender, Payload(7));

        let envelope = tokio::time::timeout(std::time::Duration::from_secs(1), mailbox.recv())
            .await
            .unwrap()
            .unwrap();
        match envelope.payload {
            RaceMessage::User(p) => assert_eq!(p, Payload(7)),
            _ => panic!("expected user payload"),
        }
    }

    #[tokio::test]
    async fn cancelled_entry_is_not_delivered() {
        let clock = Clock::new(Utc::now(), 1.0);
        let scheduler = Scheduler::<Payload>::spawn(clock);
        let (mut mailbox, sender) = BoundedMailbox::<RaceMessage<Payload>>::new(10);

        let handle = scheduler.schedule_after(chrono::Duration::milliseconds(20), sender, Payload(1));
        scheduler.cancel(&handle);

        let result = tokio::time::timeout(std::time::Duration::from_millis(100), mailbox.recv()).await;
        assert!(result.is_err(), "cancelled entry must not be delivered");
    }

    #[tokio::test]
    async fn pending_count_reflects_queued_entries() {
        let clock = Clock::new(Utc::now(), 1.0);
        let scheduler = Scheduler::<Payload>::spawn(clock);
        let (_mailbox, sender) = BoundedMailbox::<RaceMessage<Payload>>::new(10);

        scheduler.schedule_after(chrono::Duration::seconds(5), sender.clone(), Payload(1));
        scheduler.schedule_after(chrono::Duration::seconds(6), sender, Payload(2));
        assert_eq!(scheduler.pending_count(), 2);
    }
}
