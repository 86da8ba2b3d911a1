//! Actor system core with zero-cost abstractions.
//!
//! - [`Actor`] - trait every actor implements, generic over a shared user message type
//! - [`ActorContext`] - identity, bus/clock/scheduler/topic/directory access
//! - [`ActorLifecycle`] / [`ActorState`] - the 9-state phase protocol
//! - [`ErrorAction`] - supervision decision returned from `Actor::on_error`
//!
//! Actors are independent units of computation that maintain isolated state,
//! communicate only via message passing, and process one message at a time
//! while moving through the phase protocol:
//! `Created -> Initializing -> Initialized -> Starting -> Running <-> Paused -> Terminating -> Terminated`,
//! with `Failed` reachable as a sink from any non-terminal state.
//!
//! # See Also
//!
//! - [`message`](crate::message) - envelope and payload types carried through a mailbox
//! - [`bus`](crate::bus) - publish/subscribe dispatch actors reach through their context
//! - [`supervisor`](crate::supervisor) - restart policy enforcement above the actor

pub mod context;
pub mod lifecycle;
pub mod traits;

pub use context::ActorContext;
pub use lifecycle::{ActorLifecycle, ActorState};
pub use traits::{Actor, ErrorAction};
