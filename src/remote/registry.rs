//! Codec-id negotiation: each side assigns its own payload-type names a
//! small integer id and exchanges the map during the handshake (§6).

// Layer 1: Standard library imports
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};

// Layer 2: Third-party crate imports
use dashmap::DashMap;

/// This node's own name → id assignments for payload types it may send.
#[derive(Debug, Default)]
pub struct CodecRegistry {
    by_name: DashMap<String, u32>,
    next_id: AtomicU32,
}

impl CodecRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `name`, returning its id (stable for the registry's
    /// lifetime; repeated registration of the same name is a no-op).
    pub fn register(&self, name: impl Into<String>) -> u32 {
        let name = name.into();
        *self.by_name.entry(name).or_insert_with(|| self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    pub fn id_for(&self, name: &str) -> Option<u32> {
        self.by_name.get(name).map(|id| *id)
    }

    /// Snapshot to send as a handshake `CodecMap`.
    pub fn to_map(&self) -> HashMap<u32, String> {
        self.by_name.iter().map(|entry| (*entry.value(), entry.key().clone())).collect()
    }
}

/// What a peer told us about its own codec assignments: used both to
/// decode `RemotePublishFrame`s it sends us, and to pick the id it expects
/// when we send it a message of a given type name.
#[derive(Debug, Clone, Default)]
pub struct PeerCodecTable {
    id_to_name: HashMap<u32, String>,
    name_to_id: HashMap<String, u32>,
}

impl PeerCodecTable {
    pub fn from_map(map: HashMap<u32, String>) -> Self {
        let name_to_id = map.iter().map(|(id, name)| (name.clone(), *id)).collect();
        Self { id_to_name: map, name_to_id }
    }

    pub fn name_for(&self, id: u32) -> Option<&str> {
        self.id_to_name.get(&id).map(String::as_str)
    }

    pub fn id_for(&self, name: &str) -> Option<u32> {
        self.name_to_id.get(name).copied()
    }
}
