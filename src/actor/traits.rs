//! Core Actor trait with generic constraints for zero-cost abstractions.
//!
//! Every actor is generic over the single user message type `U` its
//! enclosing system carries (§6.2): there is no `dyn Actor` and no
//! per-actor message type, matching the rest of the runtime.
//!
//! # Example
//!
//! ```rust
//! use race_runtime::{Actor, ActorContext, ErrorAction, Message};
//! use race_runtime::message::RaceMessage;
//! use async_trait::async_trait;
//! use std::fmt;
//!
//! #[derive(Debug, Clone)]
//! struct PingMessage;
//!
//! impl Message for PingMessage {
//!     const MESSAGE_TYPE: &'static str = "ping";
//! }
//!
//! struct PingActor {
//!     count: u32,
//! }
//!
//! #[derive(Debug)]
//! struct PingError;
//!
//! impl fmt::Display for PingError {
//!     fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
//!         write!(f, "Ping error")
//!     }
//! }
//!
//! impl std::error::Error for PingError {}
//!
//! #[async_trait]
//! impl Actor for PingActor {
//!     type User = PingMessage;
//!     type Error = PingError;
//!
//!     async fn handle_message(
//!         &mut self,
//!         _message: RaceMessage<Self::User>,
//!         _context: &mut ActorContext<Self::User>,
//!     ) -> Result<(), Self::Error> {
//!         self.count += 1;
//!         Ok(())
//!     }
//! }
//! ```

// Layer 1: Standard library imports
use std::error::Error;

// Layer 2: Third-party crate imports
use async_trait::async_trait;

// Layer 3: Internal module imports
use super::context::ActorContext;
use crate::message::{Message, RaceMessage};

/// Core Actor trait with generic constraints for zero-cost abstractions.
///
/// All actors must implement this trait to participate in the runtime. The
/// `User` associated type is the application's shared user-message payload;
/// `handle_message` receives the full [`RaceMessage`] envelope so an actor
/// can distinguish system control, bus events, and direct user messages.
///
/// The phase-protocol hooks (`on_initialize`, `on_start`, `on_pause`,
/// `on_resume`, `on_terminate`) correspond one-to-one to the lifecycle
/// transitions in [`crate::actor::ActorState`]; the runtime calls each hook
/// as it drives an actor through the phase machine. All have a no-op
/// default so an actor only overrides what it cares about.
#[async_trait]
pub trait Actor: Send + Sync + 'static {
    /// The application's shared user message type.
    type User: Message;

    /// The error type returned by actor operations.
    type Error: Error + Send + Sync + 'static;

    /// Handle an incoming message: a system control message, a bus event,
    /// or a direct user message.
    async fn handle_message(
        &mut self,
        message: RaceMessage<Self::User>,
        context: &mut ActorContext<Self::User>,
    ) -> Result<(), Self::Error>;

    /// Called on the `Created -> Initializing -> Initialized` transition.
    /// Use this to allocate resources the actor will need before it can
    /// run. Failure here aborts startup; the actor never reaches `Running`.
    async fn on_initialize(&mut self, _context: &mut ActorContext<Self::User>) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Called on the `Initialized -> Starting -> Running` transition.
    async fn on_start(&mut self, _context: &mut ActorContext<Self::User>) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Called on the `Running -> Paused` transition.
    async fn on_pause(&mut self, _context: &mut ActorContext<Self::User>) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Called on the `Paused -> Running` transition.
    async fn on_resume(&mut self, _context: &mut ActorContext<Self::User>) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Called on the `Running|Paused -> Terminating -> Terminated`
    /// transition. Use this to release resources acquired in
    /// `on_initialize`/`on_start`. Always called, even when termination
    /// follows a failure, so cleanup is not skipped.
    async fn on_terminate(&mut self, _context: &mut ActorContext<Self::User>) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Handle errors and return a supervision decision.
    ///
    /// Called by the supervisor when `handle_message` or a lifecycle hook
    /// returns an error. Default implementation returns `ErrorAction::Stop`.
    async fn on_error(&mut self, _error: Self::Error, _context: &mut ActorContext<Self::User>) -> ErrorAction {
        ErrorAction::Stop
    }
}

/// Supervision decision returned by the `Actor::on_error` method.
///
/// Determines how the supervisor should handle an actor failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorAction {
    /// Stop the actor permanently. `on_terminate` runs, then the actor
    /// transitions to `Terminated`.
    Stop,

    /// Resume processing, ignoring the error.
    Resume,

    /// Restart the actor: reset to a fresh `Created` state and replay the
    /// phase protocol from `on_initialize`, with no message replay.
    Restart,

    /// Escalate the error to the parent supervisor.
    Escalate,
}

impl Default for ErrorAction {
    /// Default supervision strategy is to stop the actor.
    fn default() -> Self {
        Self::Stop
    }
}
