//! # race-runtime - Runtime for Airspace Concept Evaluation
//!
//! Distributed, soft-real-time actor/pub-sub runtime for air-traffic-
//! surveillance-style systems: independent actors driven through a shared
//! phase protocol, a publish/subscribe bus with exact and glob-pattern
//! channel matching, demand-driven channel-topic negotiation between
//! providers and consumers, and a logical clock that unifies wall-clock,
//! scaled-simulation, and archive-replay time.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use race_runtime::prelude::*;
//! use async_trait::async_trait;
//! use chrono::Utc;
//!
//! #[derive(Debug, Clone)]
//! struct CounterMsg { delta: u64 }
//!
//! impl Message for CounterMsg {
//!     const MESSAGE_TYPE: &'static str = "counter";
//! }
//!
//! struct CounterActor { count: u64 }
//!
//! #[async_trait]
//! impl Actor for CounterActor {
//!     type User = CounterMsg;
//!     type Error = std::io::Error;
//!
//!     async fn handle_message(
//!         &mut self,
//!         msg: race_runtime::message::RaceMessage<Self::User>,
//!         _ctx: &mut ActorContext<Self::User>,
//!     ) -> Result<(), Self::Error> {
//!         if let race_runtime::message::RaceMessage::User(msg) = msg {
//!             self.count += msg.delta;
//!         }
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let master = Master::<CounterMsg>::new(Clock::new(Utc::now(), 1.0), std::time::Duration::from_secs(5));
//!     master.create(CounterActor { count: 0 }, "counter", 64, FailurePolicy::Critical);
//!     master.initialize_all().await?;
//!     master.start_all().await?;
//!     master.terminate_all().await;
//!     Ok(())
//! }
//! ```
//!
//! # Core Features
//!
//! ## Zero-Cost Abstractions
//! - **Generic constraints** instead of trait objects (§6.2)
//! - **Compile-time dispatch** via monomorphization
//! - **No heap allocations** for message passing (stack-based envelopes)
//!
//! ## Type Safety
//! - **Compile-time message type verification** via the `Message` trait
//! - **Associated types** prevent runtime type errors
//! - **No `dyn` traits** in public APIs
//!
//! ## BEAM-Inspired Supervision
//! - **Supervision trees** for fault tolerance and automatic recovery
//! - **Three strategies**: OneForOne, OneForAll, RestForOne
//! - **Restart policies**: Permanent, Transient, Temporary
//! - **Health monitoring**: Proactive failure detection
//!
//! # Module Organization
//!
//! ## Core Actor System
//! - [`actor`] - Actor trait, lifecycle, and context for message handling
//! - [`message`] - Message trait, envelopes, and the `RaceMessage` union type
//! - [`mailbox`] - Message queuing with backpressure control
//! - [`bus`] - Publish/subscribe dispatch with exact and glob-pattern channels
//! - [`topic`] - Channel-topic provider/consumer negotiation protocol
//! - [`clock`] - Logical clock and the scheduler built on it
//! - [`master`] - Drives every actor in a graph through the phase protocol
//!
//! ## Fault Tolerance
//! - [`supervisor`] - Supervision trees and restart strategies
//! - [`monitoring`] - Event tracking and metrics for observability
//!
//! ## Infrastructure
//! - [`system`] - Graph configuration
//! - [`util`] - Utilities (ActorAddress, ActorId, MessageId, pattern matching)
//!
//! # Architecture Principles
//!
//! ## Separation of Concerns
//! - **Actor**: Defines message handling logic and phase-protocol hooks only
//! - **Child**: Defines supervision lifecycle (explicit implementation required)
//! - **Message**: Defines message type and metadata
//! - **Mailbox**: Manages message queuing and backpressure
//! - **Master**: Drives the phase protocol and owns the shared bus/clock/topic state
//!
//! ## YAGNI Principles (§6.1)
//! - Build only what's needed for current requirements
//! - Avoid speculative generalization
//! - Simple solutions first, complexity when proven necessary
//!
//! # Standards Compliance
//!
//! - **§2.1**: 3-layer import organization (std → third-party → internal)
//! - **§3.2**: chrono DateTime<Utc> for all timestamps
//! - Module architecture: `mod.rs` files hold only declarations and re-exports
//! - **§6.2**: Avoid `dyn` patterns (prefer generic constraints)
//!
//! # See Also
//!
//! - [Erlang/OTP Documentation](https://www.erlang.org/doc/) - Inspiration for supervision
//! - [Actor Model (Wikipedia)](https://en.wikipedia.org/wiki/Actor_model) - Theoretical foundation

pub mod actor;
pub mod bus;
pub mod clock;
pub mod config;
pub mod error;
pub mod mailbox;
pub mod master;
pub mod message;
pub mod monitoring;
pub mod prelude;
pub mod remote;
pub mod supervisor;
pub mod system;
pub mod topic;
pub mod util;

// Re-export commonly used types
pub use actor::{Actor, ActorContext, ActorLifecycle, ActorState, ErrorAction};
pub use bus::Bus;
pub use clock::{Clock, ScheduleHandle, Scheduler};
pub use config::{ActorConfig, GraphConfig};
pub use error::RaceError;
pub use mailbox::{
    BackpressureStrategy, BoundedMailbox, BoundedMailboxSender, MailboxReceiver, MailboxSender,
};
pub use master::{FailurePolicy, Master, MasterError};
pub use message::{Message, MessageEnvelope, MessagePriority, RaceMessage, SystemMessage};
pub use monitoring::{
    ActorEvent, ActorEventKind, BusEvent, BusEventKind, EventSeverity, InMemoryMonitor,
    MailboxEvent, MailboxEventKind, Monitor, MonitoringConfig, MonitoringError, MonitoringEvent,
    MonitoringSnapshot, NoopMonitor, SupervisionEvent, SupervisionEventKind, SystemEvent,
    SystemEventKind,
};
pub use remote::RemoteBridge;
pub use supervisor::{
    Child, ChildHandle, ChildHealth, ChildId, ChildSpec, ChildState, OneForAll, OneForOne,
    RestForOne, RestartBackoff, RestartPolicy, ShutdownPolicy, SupervisionDecision,
    SupervisionStrategy, Supervisor, SupervisorError, SupervisorId, SupervisorNode, SupervisorTree,
};
pub use system::SystemConfig;
pub use topic::{ChannelTopic, TopicRegistry};
pub use util::{ActorAddress, ActorId, MessageId};
