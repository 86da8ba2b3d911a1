//! Mailbox system for actor message queuing with backpressure control.
//!
//! - [`MailboxReceiver`] / [`MailboxSender`] - generic traits, no `dyn` dispatch (§6.2)
//! - [`BoundedMailbox`] - fixed-capacity queue with a configurable [`BackpressureStrategy`]
//! - [`UnboundedMailbox`] - unlimited capacity, never drops or blocks
//! - [`MetricsRecorder`] - pluggable queue metrics, defaulting to lock-free atomics
//!
//! # Example
//!
//! ```rust
//! use race_runtime::mailbox::{BoundedMailbox, BackpressureStrategy, MailboxSender, MailboxReceiver};
//! use race_runtime::message::{Message, MessageEnvelope};
//!
//! #[derive(Debug, Clone)]
//! struct MyMessage;
//! impl Message for MyMessage {
//!     const MESSAGE_TYPE: &'static str = "my_message";
//! }
//!
//! # async fn example() {
//! let (mut mailbox, sender) = BoundedMailbox::<MyMessage>::with_backpressure(
//!     100,
//!     BackpressureStrategy::DropOldest,
//! );
//!
//! sender.send(MessageEnvelope::new(MyMessage)).await.unwrap();
//! let envelope = mailbox.recv().await.unwrap();
//! assert_eq!(envelope.message_type(), "my_message");
//! # }
//! ```

pub mod backpressure;
pub mod bounded;
pub mod metrics;
pub mod traits;
pub mod unbounded;

pub use backpressure::BackpressureStrategy;
pub use bounded::{BoundedMailbox, BoundedMailboxSender};
pub use metrics::{AtomicMetrics, MetricsRecorder};
pub use traits::{MailboxCapacity, MailboxError, MailboxReceiver, MailboxSender, TryRecvError};
pub use unbounded::{UnboundedMailbox, UnboundedMailboxSender};
