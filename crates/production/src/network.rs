//! TCP transport with a static peer roster.
//!
//! One listener accepts inbound connections; every frame read is decoded
//! and handed to the inbound event channel (the router). Outbound traffic
//! goes through one writer task per peer, connected lazily with retry, so
//! `send` and `broadcast` never block on a slow peer beyond its bounded
//! outbox.

use crate::codec::{decode_message, encode_message, read_frame, write_frame, CodecError};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};
use trichain_core::{Event, OutboundMessage};
use trichain_types::ReplicaId;

/// Per-peer outbox depth.
const OUTBOX_DEPTH: usize = 64;

/// Delay between reconnect attempts to an unreachable peer.
const RECONNECT_DELAY: Duration = Duration::from_millis(500);

/// The replica's connection to the rest of the roster.
#[derive(Debug)]
pub struct Network {
    id: ReplicaId,
    is_byzantine: bool,
    outboxes: HashMap<ReplicaId, mpsc::Sender<Vec<u8>>>,
}

impl Network {
    /// Start the transport: an accept loop on `listener`, plus one writer
    /// task per entry in `peers` (the local replica must not be included).
    /// Every decoded inbound frame is forwarded to `inbound_tx`.
    pub fn start(
        id: ReplicaId,
        is_byzantine: bool,
        listener: TcpListener,
        peers: HashMap<ReplicaId, SocketAddr>,
        inbound_tx: mpsc::Sender<Event>,
    ) -> Self {
        tokio::spawn(accept_loop(listener, inbound_tx));

        let mut outboxes = HashMap::new();
        for (peer, addr) in peers {
            let (outbox_tx, outbox_rx) = mpsc::channel(OUTBOX_DEPTH);
            tokio::spawn(writer_loop(peer, addr, outbox_rx));
            outboxes.insert(peer, outbox_tx);
        }

        info!(replica = %id, peers = outboxes.len(), "network started");
        Network {
            id,
            is_byzantine,
            outboxes,
        }
    }

    /// This replica's id.
    pub fn id(&self) -> ReplicaId {
        self.id
    }

    /// Whether this replica is configured Byzantine.
    pub fn is_byzantine(&self) -> bool {
        self.is_byzantine
    }

    /// Best-effort point-to-point send.
    pub async fn send(&self, to: ReplicaId, message: &OutboundMessage) {
        let frame = match encode_message(message) {
            Ok(frame) => frame,
            Err(err) => {
                warn!(%err, kind = message.type_name(), "cannot encode message");
                return;
            }
        };
        match self.outboxes.get(&to) {
            Some(outbox) => {
                if outbox.send(frame).await.is_err() {
                    warn!(peer = %to, "peer outbox closed");
                }
            }
            None => warn!(peer = %to, "unknown peer"),
        }
    }

    /// Best-effort broadcast to every peer. The caller processes its own
    /// copy locally, so the local replica is excluded.
    pub async fn broadcast(&self, message: &OutboundMessage) {
        let frame = match encode_message(message) {
            Ok(frame) => frame,
            Err(err) => {
                warn!(%err, kind = message.type_name(), "cannot encode message");
                return;
            }
        };
        for (peer, outbox) in &self.outboxes {
            if outbox.send(frame.clone()).await.is_err() {
                warn!(peer = %peer, "peer outbox closed");
            }
        }
    }
}

/// Accept inbound connections and spawn a reader per connection.
async fn accept_loop(listener: TcpListener, inbound_tx: mpsc::Sender<Event>) {
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                trace!(%addr, "accepted connection");
                tokio::spawn(reader_loop(stream, inbound_tx.clone()));
            }
            Err(err) => {
                warn!(%err, "accept failed");
                tokio::time::sleep(RECONNECT_DELAY).await;
            }
        }
    }
}

/// Read frames from one connection, decode, and forward to the router.
async fn reader_loop(mut stream: TcpStream, inbound_tx: mpsc::Sender<Event>) {
    loop {
        let body = match read_frame(&mut stream).await {
            Ok(Some(body)) => body,
            Ok(None) => {
                trace!("connection closed");
                return;
            }
            Err(err) => {
                warn!(%err, "frame read failed");
                return;
            }
        };
        let event = match decode_message(&body) {
            Ok(event) => event,
            Err(CodecError::UnknownVersion(version)) => {
                warn!(version, "dropping frame with unknown wire version");
                continue;
            }
            Err(err) => {
                warn!(%err, "dropping undecodable frame");
                continue;
            }
        };
        if inbound_tx.send(event).await.is_err() {
            // The router is gone; the replica is shutting down.
            return;
        }
    }
}

/// Write queued frames to one peer, reconnecting as needed.
async fn writer_loop(peer: ReplicaId, addr: SocketAddr, mut outbox_rx: mpsc::Receiver<Vec<u8>>) {
    let mut stream: Option<TcpStream> = None;
    while let Some(frame) = outbox_rx.recv().await {
        loop {
            let mut connected = match stream.take() {
                Some(connected) => connected,
                None => match TcpStream::connect(addr).await {
                    Ok(connected) => {
                        debug!(peer = %peer, %addr, "connected to peer");
                        connected
                    }
                    Err(err) => {
                        trace!(peer = %peer, %err, "connect failed, retrying");
                        tokio::time::sleep(RECONNECT_DELAY).await;
                        continue;
                    }
                },
            };
            match write_frame(&mut connected, &frame).await {
                Ok(()) => {
                    stream = Some(connected);
                    break;
                }
                Err(err) => {
                    warn!(peer = %peer, %err, "write failed, reconnecting");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trichain_messages::VoteGossip;
    use trichain_types::{BlockId, View, Vote};

    #[tokio::test]
    async fn frames_flow_between_two_replicas() {
        let listener_a = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let listener_b = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr_b = listener_b.local_addr().unwrap();

        let (inbound_a_tx, _inbound_a_rx) = mpsc::channel(16);
        let (inbound_b_tx, mut inbound_b_rx) = mpsc::channel(16);

        let network_a = Network::start(
            ReplicaId(0),
            false,
            listener_a,
            HashMap::from([(ReplicaId(1), addr_b)]),
            inbound_a_tx,
        );
        let _network_b = Network::start(
            ReplicaId(1),
            false,
            listener_b,
            HashMap::new(),
            inbound_b_tx,
        );

        let vote = Vote::new(View(1), ReplicaId(0), BlockId::from_bytes(b"block"));
        network_a
            .send(
                ReplicaId(1),
                &OutboundMessage::Vote(VoteGossip::new(vote.clone())),
            )
            .await;

        let event = tokio::time::timeout(Duration::from_secs(2), inbound_b_rx.recv())
            .await
            .expect("timeout")
            .expect("channel closed");
        match event {
            Event::VoteReceived { vote: received } => assert_eq!(received, vote),
            other => panic!("expected a vote, got {other:?}"),
        }
    }
}
