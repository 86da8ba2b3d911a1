//! Utility types and helpers shared across the runtime.

pub mod glob;
pub mod ids;
pub mod serde_helpers;

pub use glob::pattern_matches;
pub use ids::{ActorAddress, ActorId, MessageId, NodeId};
pub use serde_helpers::duration_serde;
