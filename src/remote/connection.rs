//! Handshake and framed read/write over one TCP connection to a peer node.

// Layer 2: Third-party crate imports
use futures::{SinkExt, StreamExt};
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio_util::codec::Framed;

// Layer 3: Internal module imports
use super::registry::{CodecRegistry, PeerCodecTable};
use super::wire::{decode_payload, encode_payload, FrameCodec, WireMessage};
use crate::error::RaceError;
use crate::message::SystemMessage;
use crate::util::NodeId;

/// One established, handshake-completed connection to a peer node.
#[derive(Debug)]
pub struct RemoteConnection {
    framed: Framed<TcpStream, FrameCodec>,
    peer_node: NodeId,
    peer_codecs: PeerCodecTable,
}

impl RemoteConnection {
    pub fn peer_node(&self) -> NodeId {
        self.peer_node
    }

    pub fn peer_codecs(&self) -> &PeerCodecTable {
        &self.peer_codecs
    }

    pub async fn send(&mut self, message: &WireMessage) -> Result<(), RaceError> {
        send_raw(&mut self.framed, message).await
    }

    pub async fn recv(&mut self) -> Result<Option<WireMessage>, RaceError> {
        recv_raw(&mut self.framed).await
    }

    /// Splits the connection into an independent send half and receive
    /// half so a driver task can `select!` on both without aliasing one
    /// `Framed` value.
    pub fn split(self) -> (RemoteConnectionSink, RemoteConnectionStream, NodeId, PeerCodecTable) {
        let (sink, stream) = self.framed.split();
        (RemoteConnectionSink { sink }, RemoteConnectionStream { stream }, self.peer_node, self.peer_codecs)
    }
}

pub struct RemoteConnectionSink {
    sink: futures::stream::SplitSink<Framed<TcpStream, FrameCodec>, Vec<u8>>,
}

impl RemoteConnectionSink {
    pub async fn send(&mut self, message: &WireMessage) -> Result<(), RaceError> {
        let bytes = encode_payload(message)?;
        self.sink
            .send(bytes)
            .await
            .map_err(|e| RaceError::SerializationError { reason: e.to_string() })
    }
}

pub struct RemoteConnectionStream {
    stream: futures::stream::SplitStream<Framed<TcpStream, FrameCodec>>,
}

impl RemoteConnectionStream {
    pub async fn recv(&mut self) -> Result<Option<WireMessage>, RaceError> {
        match self.stream.next().await {
            Some(Ok(bytes)) => decode_payload(&bytes).map(Some),
            Some(Err(e)) => Err(RaceError::SerializationError { reason: e.to_string() }),
            None => Ok(None),
        }
    }
}

async fn send_raw(framed: &mut Framed<TcpStream, FrameCodec>, message: &WireMessage) -> Result<(), RaceError> {
    let bytes = encode_payload(message)?;
    framed
        .send(bytes)
        .await
        .map_err(|e| RaceError::SerializationError { reason: e.to_string() })
}

async fn recv_raw(framed: &mut Framed<TcpStream, FrameCodec>) -> Result<Option<WireMessage>, RaceError> {
    match framed.next().await {
        Some(Ok(bytes)) => decode_payload(&bytes).map(Some),
        Some(Err(e)) => Err(RaceError::SerializationError { reason: e.to_string() }),
        None => Ok(None),
    }
}

/// Initiates a connection: `RemoteConnectionRequest` then codec map
/// exchange. Fails with `RemoteUnreachable` on a rejected handshake or
/// dropped socket.
pub async fn connect(
    addr: impl ToSocketAddrs,
    local_node: NodeId,
    capabilities: Vec<String>,
    credentials: Option<String>,
    registry: &CodecRegistry,
) -> Result<RemoteConnection, RaceError> {
    let stream = TcpStream::connect(addr)
        .await
        .map_err(|e| RaceError::RemoteUnreachable { peer: "unknown".to_string(), reason: e.to_string() })?;
    let mut framed = Framed::new(stream, FrameCodec);

    send_raw(
        &mut framed,
        &WireMessage::System(SystemMessage::RemoteConnectionRequest {
            node_id: local_node,
            capabilities,
            credentials,
        }),
    )
    .await?;

    let peer_node = match recv_raw(&mut framed).await? {
        Some(WireMessage::System(SystemMessage::RemoteConnectionAccept { node_id })) => node_id,
        Some(WireMessage::System(SystemMessage::RemoteConnectionReject { reason })) => {
            return Err(RaceError::RemoteUnreachable { peer: "handshake".to_string(), reason });
        }
        Some(_) => {
            return Err(RaceError::SerializationError {
                reason: "unexpected message during handshake".to_string(),
            })
        }
        None => {
            return Err(RaceError::RemoteUnreachable {
                peer: "handshake".to_string(),
                reason: "connection closed during handshake".to_string(),
            })
        }
    };

    let peer_codecs = exchange_codec_maps(&mut framed, registry).await?;
    Ok(RemoteConnection { framed, peer_node, peer_codecs })
}

/// Accepts an inbound connection on an already-accepted `TcpStream`.
/// `authorize` decides whether to accept based on the peer's credentials.
pub async fn accept(
    stream: TcpStream,
    local_node: NodeId,
    registry: &CodecRegistry,
    authorize: impl FnOnce(Option<&str>) -> bool,
) -> Result<RemoteConnection, RaceError> {
    let mut framed = Framed::new(stream, FrameCodec);

    let (peer_node, credentials) = match recv_raw(&mut framed).await? {
        Some(WireMessage::System(SystemMessage::RemoteConnectionRequest { node_id, credentials, .. })) => {
            (node_id, credentials)
        }
        _ => {
            return Err(RaceError::SerializationError {
                reason: "expected a connection request".to_string(),
            })
        }
    };

    if !authorize(credentials.as_deref()) {
        let _ = send_raw(
            &mut framed,
            &WireMessage::System(SystemMessage::RemoteConnectionReject {
                reason: "credentials rejected".to_string(),
            }),
        )
        .await;
        return Err(RaceError::RemoteUnreachable {
            peer: peer_node.to_string(),
            reason: "credentials rejected".to_string(),
        });
    }

    send_raw(
        &mut framed,
        &WireMessage::System(SystemMessage::RemoteConnectionAccept { node_id: local_node }),
    )
    .await?;

    let peer_codecs = exchange_codec_maps(&mut framed, registry).await?;
    Ok(RemoteConnection { framed, peer_node, peer_codecs })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn handshake_succeeds_over_loopback() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server_node = NodeId::new();
        let client_node = NodeId::new();

        let server_registry = CodecRegistry::new();
        server_registry.register("user_payload");

        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            accept(stream, server_node, &server_registry, |_| true).await
        });

        let client_registry = CodecRegistry::new();
        client_registry.register("user_payload");
        let client_conn = connect(addr, client_node, vec!["demo".to_string()], None, &client_registry)
            .await
            .unwrap();
        assert_eq!(client_conn.peer_node(), server_node);

        let server_conn = server.await.unwrap().unwrap();
        assert_eq!(server_conn.peer_node(), client_node);
        assert_eq!(server_conn.peer_codecs().id_for("user_payload"), Some(0));
    }

    #[tokio::test]
    async fn rejected_credentials_surface_as_remote_unreachable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server_node = NodeId::new();
        let registry = CodecRegistry::new();

        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            accept(stream, server_node, &registry, |_| false).await
        });

        let client_registry = CodecRegistry::new();
        let err = connect(addr, NodeId::new(), vec![], None, &client_registry).await.unwrap_err();
        assert!(matches!(err, RaceError::RemoteUnreachable { .. }));
        assert!(server.await.unwrap().is_err());
    }
}

async fn exchange_codec_maps(framed: &mut Framed<TcpStream, FrameCodec>, registry: &CodecRegistry) -> Result<PeerCodecTable, RaceError> {
    send_raw(framed, &WireMessage::CodecMap(registry.to_map())).await?;
    match recv_raw(framed).await? {
        Some(WireMessage::CodecMap(map)) => Ok(PeerCodecTable::from_map(map)),
        Some(_) => Err(RaceError::SerializationError {
            reason: "expected codec map after handshake".to_string(),
        }),
        None => Err(RaceError::RemoteUnreachable {
            peer: "handshake".to_string(),
            reason: "connection closed during codec negotiation".to_string(),
        }),
    }
}
