//! Node-to-node transport: a length-prefixed wire frame, codec-id
//! negotiation, the connection handshake, and the bridge that forwards bus
//! traffic across an accepted connection.

pub mod bridge;
pub mod connection;
pub mod registry;
pub mod wire;

pub use bridge::RemoteBridge;
pub use connection::{accept, connect, RemoteConnection};
pub use registry::{CodecRegistry, PeerCodecTable};
pub use wire::{FrameCodec, RemotePublishFrame, WireMessage};
