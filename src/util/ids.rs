//! Identity and addressing types shared across the runtime.

// Layer 1: Standard library imports
use std::fmt::{self, Display};

// Layer 2: Third-party crate imports
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// Layer 3: Internal module imports
// (none)

/// Unique identifier for actors in the system.
///
/// # Example
/// ```rust
/// use race_runtime::util::ActorId;
///
/// let id1 = ActorId::new();
/// let id2 = ActorId::new();
/// assert_ne!(id1, id2); // Globally unique
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActorId(Uuid);

impl ActorId {
    /// Generate a new random ActorId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create an ActorId from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ActorId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for messages in the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(Uuid);

impl MessageId {
    /// Generate a new random MessageId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a node: one operating-system process hosting a
/// local runtime and participating in remote federation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(Uuid);

impl NodeId {
    /// Generate a new random NodeId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Address of an actor, tagged by ownership.
///
/// A local actor is addressed by the id assigned at spawn plus its symbolic
/// name; a remote actor is addressed by its owning node's id plus the same
/// symbolic name. There is no pointer identity shared across nodes: a
/// `Remote` address is always resolved through the node's codec-negotiated
/// connection, never dereferenced directly.
///
/// # Example
/// ```rust
/// use race_runtime::util::{ActorAddress, NodeId};
///
/// let local = ActorAddress::local("feeder");
/// assert!(local.is_local());
/// assert_eq!(local.name(), "feeder");
///
/// let remote = ActorAddress::remote(NodeId::new(), "feeder");
/// assert!(!remote.is_local());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActorAddress {
    /// An actor hosted by this node.
    Local {
        /// Unique id assigned at spawn.
        id: ActorId,
        /// Symbolic name, used for routing, logs and configuration.
        name: String,
    },
    /// An actor hosted by a remote node.
    Remote {
        /// The owning node's id.
        node_id: NodeId,
        /// Symbolic name on that node.
        name: String,
    },
}

impl ActorAddress {
    /// Construct a local address with a fresh id.
    pub fn local(name: impl Into<String>) -> Self {
        Self::Local {
            id: ActorId::new(),
            name: name.into(),
        }
    }

    /// Construct a local address with an explicit id (used when the caller
    /// already minted the id, e.g. during actor restart with a fresh
    /// mailbox but a remembered identity).
    pub fn local_with_id(id: ActorId, name: impl Into<String>) -> Self {
        Self::Local {
            id,
            name: name.into(),
        }
    }

    /// Construct a remote address.
    pub fn remote(node_id: NodeId, name: impl Into<String>) -> Self {
        Self::Remote {
            node_id,
            name: name.into(),
        }
    }

    /// The symbolic name, regardless of locality.
    pub fn name(&self) -> &str {
        match self {
            Self::Local { name, .. } => name,
            Self::Remote { name, .. } => name,
        }
    }

    /// True if this address names an actor owned by this process.
    pub fn is_local(&self) -> bool {
        matches!(self, Self::Local { .. })
    }

    /// The local actor id, if this address is local.
    pub fn local_id(&self) -> Option<ActorId> {
        match self {
            Self::Local { id, .. } => Some(*id),
            Self::Remote { .. } => None,
        }
    }
}

impl Display for ActorAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local { id, name } => write!(f, "local:{name}#{id}"),
            Self::Remote { node_id, name } => write!(f, "remote:{node_id}:{name}"),
        }
    }
}
