//! Ties peer connections to the local bus: forwards bus traffic a peer
//! asked to receive, and republishes whatever a peer forwards to us.

// Layer 1: Standard library imports
use std::sync::Arc;
use std::time::Duration;

// Layer 2: Third-party crate imports
use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

// Layer 3: Internal module imports
use super::connection::{self, RemoteConnection};
use super::registry::CodecRegistry;
use super::wire::{RemotePublishFrame, WireMessage};
use crate::bus::Bus;
use crate::error::RaceError;
use crate::mailbox::{BoundedMailbox, MailboxReceiver};
use crate::message::{Message, RaceMessage, SystemMessage};
use crate::util::{ActorAddress, NodeId};

/// How often the driver task pings a peer and checks for a stale connection.
const PING_INTERVAL: Duration = Duration::from_secs(5);
/// A peer that hasn't answered a ping in this long is considered gone.
const LIVENESS_TIMEOUT: Duration = Duration::from_secs(15);

struct PeerHandle {
    outbound: mpsc::Sender<WireMessage>,
}

struct Forwarder {
    address: ActorAddress,
    task: JoinHandle<()>,
}

/// Owns every peer connection for one node and bridges them to a local
/// [`Bus`]: a `RemoteSubscribe` from a peer spins up a forwarder that
/// mirrors matching bus events to them, and an incoming `RemotePublish`
/// republishes onto the local bus with the sender rewritten to
/// `ActorAddress::Remote`.
pub struct RemoteBridge<U: Message + Serialize + DeserializeOwned> {
    local_node: NodeId,
    bus: Bus<U>,
    registry: Arc<CodecRegistry>,
    payload_type_name: String,
    peers: Arc<DashMap<NodeId, PeerHandle>>,
    forwarders: Arc<DashMap<(NodeId, String), Forwarder>>,
    disconnects: mpsc::UnboundedSender<(NodeId, RaceError)>,
}

impl<U: Message + Serialize + DeserializeOwned> RemoteBridge<U> {
    /// Builds a bridge for `local_node`, registering `payload_type_name`
    /// (the wire-level name for `U`, e.g. `"user_payload"`) as codec id 0.
    /// The returned receiver surfaces one event per peer that drops off.
    pub fn new(local_node: NodeId, bus: Bus<U>, payload_type_name: impl Into<String>) -> (Self, mpsc::UnboundedReceiver<(NodeId, RaceError)>) {
        let (disconnects, disconnect_rx) = mpsc::unbounded_channel();
        let registry = Arc::new(CodecRegistry::new());
        let payload_type_name = payload_type_name.into();
        registry.register(payload_type_name.clone());
        let bridge = Self {
            local_node,
            bus,
            registry,
            payload_type_name,
            peers: Arc::new(DashMap::new()),
            forwarders: Arc::new(DashMap::new()),
            disconnects,
        };
        (bridge, disconnect_rx)
    }

    pub fn connected_peers(&self) -> Vec<NodeId> {
        self.peers.iter().map(|entry| *entry.key()).collect()
    }

    /// Dials `addr`, completes the handshake, and spawns the driver task
    /// that keeps the connection alive. Returns the peer's node id.
    pub async fn connect_to(&self, addr: impl ToSocketAddrs, capabilities: Vec<String>, credentials: Option<String>) -> Result<NodeId, RaceError> {
        let conn = connection::connect(addr, self.local_node, capabilities, credentials, &self.registry).await?;
        Ok(self.spawn_driver(conn))
    }

    /// Completes the handshake on an already-accepted socket and spawns the
    /// driver task. `authorize` gates the connection on the peer's
    /// credentials.
    pub async fn accept(&self, stream: TcpStream, authorize: impl FnOnce(Option<&str>) -> bool) -> Result<NodeId, RaceError> {
        let conn = connection::accept(stream, self.local_node, &self.registry, authorize).await?;
        Ok(self.spawn_driver(conn))
    }

    /// Asks `peer` to start forwarding bus traffic on `channel` to us.
    pub async fn request_remote_subscribe(&self, peer: NodeId, channel: impl Into<String>) -> Result<(), RaceError> {
        self.send_to(peer, WireMessage::System(SystemMessage::RemoteSubscribe { channel: channel.into() })).await
    }

    /// Asks `peer` to stop forwarding bus traffic on `channel`.
    pub async fn request_remote_unsubscribe(&self, peer: NodeId, channel: impl Into<String>) -> Result<(), RaceError> {
        self.send_to(peer, WireMessage::System(SystemMessage::RemoteUnsubscribe { channel: channel.into() })).await
    }

    async fn send_to(&self, peer: NodeId, message: WireMessage) -> Result<(), RaceError> {
        let outbound = {
            let handle = self.peers.get(&peer).ok_or_else(|| RaceError::RemoteUnreachable {
                peer: peer.to_string(),
                reason: "no active connection".to_string(),
            })?;
            handle.outbound.clone()
        };
        outbound.send(message).await.map_err(|_| RaceError::RemoteUnreachable {
            peer: peer.to_string(),
            reason: "peer driver task has stopped".to_string(),
        })
    }

    fn spawn_driver(&self, conn: RemoteConnection) -> NodeId {
        let (mut sink, mut stream, peer_node, _peer_codecs) = conn.split();
        let (outbound_tx, mut outbound_rx) = mpsc::channel::<WireMessage>(64);

        self.peers.insert(peer_node, PeerHandle { outbound: outbound_tx.clone() });

        let bus = self.bus.clone();
        let registry = Arc::clone(&self.registry);
        let payload_type_name = self.payload_type_name.clone();
        let peers = Arc::clone(&self.peers);
        let forwarders = Arc::clone(&self.forwarders);
        let disconnects = self.disconnects.clone();

        tokio::spawn(async move {
            let mut ping_interval = tokio::time::interval(PING_INTERVAL);
            let mut last_pong = tokio::time::Instant::now();

            let disconnect_reason = loop {
                tokio::select! {
                    _ = ping_interval.tick() => {
                        if last_pong.elapsed() > LIVENESS_TIMEOUT {
                            break Some("missed heartbeat".to_string());
                        }
                        if sink.send(&WireMessage::System(SystemMessage::Ping)).await.is_err() {
                            break Some("ping failed".to_string());
                        }
                    }
                    outgoing = outbound_rx.recv() => {
                        match outgoing {
                            Some(message) => {
                                if sink.send(&message).await.is_err() {
                                    break Some("send failed".to_string());
                                }
                            }
                            None => break Some("outbound channel closed".to_string()),
                        }
                    }
                    incoming = stream.recv() => {
                        match incoming {
                            Ok(Some(WireMessage::System(SystemMessage::Ping))) => {
                                if sink.send(&WireMessage::System(SystemMessage::Pong)).await.is_err() {
                                    break Some("pong failed".to_string());
                                }
                            }
                            Ok(Some(WireMessage::System(SystemMessage::Pong))) => {
                                last_pong = tokio::time::Instant::now();
                            }
                            Ok(Some(WireMessage::System(SystemMessage::RemoteSubscribe { channel }))) => {
                                spawn_forwarder(&bus, &registry, &payload_type_name, &forwarders, peer_node, channel, outbound_tx.clone());
                            }
                            Ok(Some(WireMessage::System(SystemMessage::RemoteUnsubscribe { channel }))) => {
                                stop_forwarder(&bus, &forwarders, peer_node, &channel);
                            }
                            Ok(Some(WireMessage::RemotePublish(frame))) => {
                                republish(&bus, peer_node, frame).await;
                            }
                            Ok(Some(_)) => {}
                            Ok(None) => break Some("connection closed".to_string()),
                            Err(e) => break Some(e.to_string()),
                        }
                    }
                }
            };

            peers.remove(&peer_node);
            for entry in forwarders.iter() {
                if entry.key().0 == peer_node {
                    let (_, channel) = entry.key();
                    bus.unsubscribe(channel, &entry.value().address);
                    entry.value().task.abort();
                }
            }
            forwarders.retain(|key, _| key.0 != peer_node);

            if let Some(reason) = disconnect_reason {
                let _ = disconnects.send((peer_node, RaceError::RemoteUnreachable { peer: peer_node.to_string(), reason }));
            }
        });

        peer_node
    }
}

fn spawn_forwarder<U: Message + Serialize>(
    bus: &Bus<U>,
    registry: &Arc<CodecRegistry>,
    payload_type_name: &str,
    forwarders: &Arc<DashMap<(NodeId, String), Forwarder>>,
    peer: NodeId,
    channel: String,
    outbound: mpsc::Sender<WireMessage>,
) {
    let key = (peer, channel.clone());
    if forwarders.contains_key(&key) {
        return;
    }

    let forwarder_address = ActorAddress::local(format!("__remote_forward__{peer}__{channel}"));
    let (mut mailbox, sender) = BoundedMailbox::<RaceMessage<U>>::new(256);
    bus.subscribe(&channel, forwarder_address.clone(), sender);

    let payload_type_id = registry.register(payload_type_name.to_string());
    let task = tokio::spawn(async move {
        while let Some(envelope) = mailbox.recv().await {
            if let RaceMessage::Bus(event) = envelope.payload {
                let Ok(payload_bytes) = serde_cbor::to_vec(&event.payload) else {
                    continue;
                };
                let frame = RemotePublishFrame {
                    channel: event.channel.clone(),
                    payload_type_id,
                    payload_bytes,
                    origin_actor: event.sender.name().to_string(),
                };
                if outbound.send(WireMessage::RemotePublish(frame)).await.is_err() {
                    break;
                }
            }
        }
    });

    forwarders.insert(key, Forwarder { address: forwarder_address, task });
}

fn stop_forwarder<U: Message>(bus: &Bus<U>, forwarders: &Arc<DashMap<(NodeId, String), Forwarder>>, peer: NodeId, channel: &str) {
    if let Some((_, forwarder)) = forwarders.remove(&(peer, channel.to_string())) {
        bus.unsubscribe(channel, &forwarder.address);
        forwarder.task.abort();
    }
}

async fn republish<U: Message + DeserializeOwned>(bus: &Bus<U>, peer: NodeId, frame: RemotePublishFrame) {
    match serde_cbor::from_slice::<U>(&frame.payload_bytes) {
        Ok(payload) => {
            bus.publish(&frame.channel, payload, ActorAddress::remote(peer, frame.origin_actor)).await;
        }
        Err(e) => {
            tracing::warn!(peer = %peer, channel = %frame.channel, error = %e, "dropping unparseable remote publish");
        }
    }
}
