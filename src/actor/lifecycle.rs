//! Actor lifecycle state machine and phase protocol.
//!
//! Each actor moves through the same nine states the Master drives at the
//! graph level: `Created → Initializing → Initialized → Starting → Running
//! ⇄ Paused → Terminating → Terminated`, with `Failed` reachable from any
//! non-terminal state.

// Layer 2: Third-party crate imports
use chrono::{DateTime, Utc}; // §3.2 MANDATORY

/// A state in the actor lifecycle state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorState {
    /// Actor struct exists but `on_initialize` has not run.
    Created,
    /// `on_initialize` is in flight.
    Initializing,
    /// `on_initialize` succeeded; waiting for the graph-wide `Start`.
    Initialized,
    /// `on_start` is in flight.
    Starting,
    /// Actor is processing its mailbox.
    Running,
    /// Actor is paused; messages queue but are not delivered.
    Paused,
    /// `on_terminate` is in flight.
    Terminating,
    /// Actor has stopped and will not run again.
    Terminated,
    /// Actor reported or was detected to have failed.
    Failed,
}

impl Default for ActorState {
    fn default() -> Self {
        Self::Created
    }
}

impl ActorState {
    /// Whether this is one of the two states from which nothing else can
    /// happen to the actor.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Terminated | Self::Failed)
    }

    /// Whether a transition from `self` to `next` is legal under the phase
    /// protocol. `Failed` is reachable from every non-terminal state.
    pub fn can_transition_to(self, next: Self) -> bool {
        use ActorState::*;
        if self.is_terminal() {
            return false;
        }
        if next == Failed {
            return true;
        }
        matches!(
            (self, next),
            (Created, Initializing)
                | (Initializing, Initialized)
                | (Initialized, Starting)
                | (Starting, Running)
                | (Running, Paused)
                | (Paused, Running)
                | (Running, Terminating)
                | (Paused, Terminating)
                | (Terminating, Terminated)
        )
    }
}

/// Tracks an actor's current state, restart count, and transition timing.
#[derive(Debug, Clone)]
pub struct ActorLifecycle {
    state: ActorState,
    last_state_change: DateTime<Utc>,
    restart_count: u32,
}

impl ActorLifecycle {
    /// Create a new lifecycle tracker in the `Created` state.
    pub fn new() -> Self {
        Self {
            state: ActorState::Created,
            last_state_change: Utc::now(), // §3.2
            restart_count: 0,
        }
    }

    /// Attempt a transition, returning whether it was legal. Illegal
    /// transitions leave the state unchanged.
    pub fn transition_to(&mut self, new_state: ActorState) -> bool {
        if !self.state.can_transition_to(new_state) {
            return false;
        }
        if new_state == ActorState::Initializing && self.state == ActorState::Created && self.restart_count > 0 {
            // re-entering the phase protocol after a restartable failure
        }
        if new_state == ActorState::Created {
            self.restart_count += 1;
        }
        self.state = new_state;
        self.last_state_change = Utc::now(); // §3.2
        true
    }

    /// Force the tracker back to `Created` to begin a restart, regardless
    /// of the current state. Used by the supervisor for `restartable`
    /// failures, which re-instantiate the actor with a fresh
    /// mailbox rather than replaying the phase protocol from where it
    /// failed.
    pub fn reset_for_restart(&mut self) {
        self.restart_count += 1;
        self.state = ActorState::Created;
        self.last_state_change = Utc::now();
    }

    /// Get the current actor state.
    pub fn state(&self) -> ActorState {
        self.state
    }

    /// Get the timestamp of the last state change.
    pub fn last_state_change(&self) -> DateTime<Utc> {
        self.last_state_change
    }

    /// Get the number of times this actor has been restarted.
    pub fn restart_count(&self) -> u32 {
        self.restart_count
    }

    /// Check if the actor is in a terminal state (`Terminated` or `Failed`).
    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Check if the actor is currently running.
    pub fn is_running(&self) -> bool {
        self.state == ActorState::Running
    }
}

impl Default for ActorLifecycle {
    fn default() -> Self {
        Self::new()
    }
}
