//! Wire frame format: `{magic:4, version:2, flags:2, payload_len:4}` header
//! plus a payload of one type-tag byte and a `serde_cbor`-encoded body.

// Layer 1: Standard library imports
use std::collections::HashMap;
use std::io;

// Layer 2: Third-party crate imports
use bytes::{Buf, BytesMut};
use serde::{Deserialize, Serialize};
use tokio_util::codec::{Decoder, Encoder};

// Layer 3: Internal module imports
use crate::error::RaceError;
use crate::message::SystemMessage;

const MAGIC: [u8; 4] = *b"RACE";
const VERSION: u16 = 1;
const HEADER_LEN: usize = 4 + 2 + 2 + 4;

/// Codec for the length-prefixed frame header. Items are opaque payload
/// bytes (tag + CBOR body); see [`encode_payload`]/[`decode_payload`] for
/// the layer above this one.
#[derive(Debug, Default)]
pub struct FrameCodec;

impl Decoder for FrameCodec {
    type Item = Vec<u8>;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.len() < HEADER_LEN {
            return Ok(None);
        }
        let payload_len = u32::from_be_bytes([src[8], src[9], src[10], src[11]]) as usize;
        if src.len() < HEADER_LEN + payload_len {
            src.reserve(HEADER_LEN + payload_len - src.len());
            return Ok(None);
        }
        if src[0..4] != MAGIC {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "bad frame magic"));
        }
        let version = u16::from_be_bytes([src[4], src[5]]);
        if version != VERSION {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "unsupported frame version"));
        }
        src.advance(HEADER_LEN);
        let payload = src.split_to(payload_len);
        Ok(Some(payload.to_vec()))
    }
}

impl Encoder<Vec<u8>> for FrameCodec {
    type Error = io::Error;

    fn encode(&mut self, item: Vec<u8>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        if item.len() > u32::MAX as usize {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "frame payload too large"));
        }
        dst.reserve(HEADER_LEN + item.len());
        dst.extend_from_slice(&MAGIC);
        dst.extend_from_slice(&VERSION.to_be_bytes());
        dst.extend_from_slice(&0u16.to_be_bytes());
        dst.extend_from_slice(&(item.len() as u32).to_be_bytes());
        dst.extend_from_slice(&item);
        Ok(())
    }
}

/// A bus publish forwarded to a peer that asked to receive `channel`.
/// `payload_type_id` is the sender's own codec-registry id for the
/// application payload type, resolved by the receiver's [`super::registry::PeerCodecTable`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemotePublishFrame {
    pub channel: String,
    pub payload_type_id: u32,
    pub payload_bytes: Vec<u8>,
    /// Symbolic name of the actor that published this on the sending node,
    /// used to rewrite the sender address to `Remote(node_id, name)` on
    /// arrival.
    pub origin_actor: String,
}

/// Everything that can cross a node-to-node connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum WireMessage {
    System(SystemMessage),
    RemotePublish(RemotePublishFrame),
    /// Sent once right after the handshake accept, carrying the sender's
    /// own id → name codec map.
    CodecMap(HashMap<u32, String>),
}

const TAG_SYSTEM: u8 = 0;
const TAG_REMOTE_PUBLISH: u8 = 1;
const TAG_CODEC_MAP: u8 = 2;

/// Encodes a [`WireMessage`] into a frame payload (tag byte + CBOR body).
pub fn encode_payload(message: &WireMessage) -> Result<Vec<u8>, RaceError> {
    let (tag, body) = match message {
        WireMessage::System(m) => (TAG_SYSTEM, serde_cbor::to_vec(m)),
        WireMessage::RemotePublish(m) => (TAG_REMOTE_PUBLISH, serde_cbor::to_vec(m)),
        WireMessage::CodecMap(m) => (TAG_CODEC_MAP, serde_cbor::to_vec(m)),
    };
    let body = body.map_err(|e| RaceError::SerializationError { reason: e.to_string() })?;
    let mut out = Vec::with_capacity(1 + body.len());
    out.push(tag);
    out.extend_from_slice(&body);
    Ok(out)
}

/// Decodes a frame payload back into a [`WireMessage`]. An unrecognized
/// type tag returns a `SerializationError` so the caller can reset the
/// connection rather than silently dropping the frame.
pub fn decode_payload(bytes: &[u8]) -> Result<WireMessage, RaceError> {
    let (tag, body) = bytes.split_first().ok_or_else(|| RaceError::SerializationError {
        reason: "empty frame payload".to_string(),
    })?;
    let decoded = match *tag {
        TAG_SYSTEM => serde_cbor::from_slice(body).map(WireMessage::System),
        TAG_REMOTE_PUBLISH => serde_cbor::from_slice(body).map(WireMessage::RemotePublish),
        TAG_CODEC_MAP => serde_cbor::from_slice(body).map(WireMessage::CodecMap),
        other => {
            return Err(RaceError::SerializationError {
                reason: format!("unknown wire frame type tag {other}"),
            })
        }
    };
    decoded.map_err(|e| RaceError::SerializationError { reason: e.to_string() })
}
