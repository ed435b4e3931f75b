//! The production event loop.
//!
//! A router task pre-filters inbound traffic against the replica's
//! published current view and fans it into bounded per-kind queues; the
//! main loop selects across those queues plus the delay-callback channel,
//! drives the state machine one event at a time, and executes the actions.

use crate::delays::DelayPool;
use crate::network::Network;
use std::collections::VecDeque;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tracing::{debug, trace};
use trichain_consensus::ConsensusConfig;
use trichain_core::{Action, Event, StateMachine};
use trichain_node::ReplicaNode;
use trichain_types::View;

/// Depth of the transaction intake queue. The consensus queues stay at
/// capacity 1 so stale traffic backs up onto its sender instead of
/// buffering.
const TXN_QUEUE_DEPTH: usize = 64;

/// Errors from the production runner.
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("inbound event channel closed")]
    InboundClosed,
}

/// Owns the replica state machine and its I/O plumbing.
pub struct ProductionRunner {
    node: ReplicaNode,
    network: Arc<Network>,
    config: ConsensusConfig,
}

impl ProductionRunner {
    pub fn new(node: ReplicaNode, network: Arc<Network>, config: ConsensusConfig) -> Self {
        ProductionRunner {
            node,
            network,
            config,
        }
    }

    /// Run the replica until the inbound channel closes.
    ///
    /// `inbound_rx` carries every decoded network event (from the transport
    /// reader tasks) and client submissions.
    pub async fn run(mut self, inbound_rx: mpsc::Receiver<Event>) -> Result<(), RunnerError> {
        // Per-kind queues between the router and the event loop.
        let (block_tx, mut block_rx) = mpsc::channel(1);
        let (vote_tx, mut vote_rx) = mpsc::channel(1);
        let (qc_tx, mut qc_rx) = mpsc::channel(1);
        let (txn_tx, mut txn_rx) = mpsc::channel(TXN_QUEUE_DEPTH);

        // Published current view for the router's stale filter.
        let (view_tx, view_rx) = watch::channel(self.node.consensus().cur_view());

        // Delay callbacks re-enter the loop through their own channel.
        let (callback_tx, mut callback_rx) = mpsc::channel(TXN_QUEUE_DEPTH);
        let delays = DelayPool::new(callback_tx);

        tokio::spawn(route_inbound(
            inbound_rx, view_rx, block_tx, vote_tx, qc_tx, txn_tx,
        ));

        loop {
            let event = tokio::select! {
                Some(event) = callback_rx.recv() => event,
                Some(event) = block_rx.recv() => event,
                Some(event) = vote_rx.recv() => event,
                Some(event) = qc_rx.recv() => event,
                Some(event) = txn_rx.recv() => event,
                else => return Err(RunnerError::InboundClosed),
            };
            self.dispatch(event, &delays).await;
            let _ = view_tx.send(self.node.consensus().cur_view());
        }
    }

    /// Drive one event through the state machine, draining the internal
    /// consequences it produces before returning to the select.
    async fn dispatch(&mut self, event: Event, delays: &DelayPool) {
        let mut pending = VecDeque::from([event]);
        while let Some(event) = pending.pop_front() {
            trace!(event = event.type_name(), "dispatching event");
            for action in self.node.handle(event) {
                match action {
                    Action::EnqueueInternal { event } => pending.push_back(event),
                    Action::Send { to, message } => self.network.send(to, &message).await,
                    Action::Broadcast { message } => self.network.broadcast(&message).await,
                    Action::SignVote { vote } => delays.schedule(
                        Event::VoteSigned { vote },
                        self.config.vote_signing_delay,
                    ),
                    Action::SealBlock { block } => delays.schedule(
                        Event::BlockSealed { block },
                        self.config.block_seal_delay,
                    ),
                }
            }
        }
    }
}

/// Route inbound events into per-kind queues, discarding consensus traffic
/// older than the published current view. Awaiting a full queue is the
/// backpressure path: senders retry in the next view anyway.
async fn route_inbound(
    mut inbound_rx: mpsc::Receiver<Event>,
    view_rx: watch::Receiver<View>,
    block_tx: mpsc::Sender<Event>,
    vote_tx: mpsc::Sender<Event>,
    qc_tx: mpsc::Sender<Event>,
    txn_tx: mpsc::Sender<Event>,
) {
    while let Some(event) = inbound_rx.recv().await {
        let cur_view = *view_rx.borrow();
        let routed = match &event {
            Event::BlockReceived { block } => {
                if block.view < cur_view {
                    trace!(view = %block.view, %cur_view, "router dropped stale block");
                    continue;
                }
                block_tx.send(event).await
            }
            Event::VoteReceived { vote } => {
                if vote.view < cur_view {
                    trace!(view = %vote.view, %cur_view, "router dropped stale vote");
                    continue;
                }
                vote_tx.send(event).await
            }
            Event::QcReceived { qc } => {
                if qc.view < cur_view {
                    trace!(view = %qc.view, %cur_view, "router dropped stale qc");
                    continue;
                }
                qc_tx.send(event).await
            }
            Event::TransactionSubmitted { .. } => txn_tx.send(event).await,
            // Internal events never arrive from the network.
            other => {
                debug!(event = other.type_name(), "router ignoring internal event");
                continue;
            }
        };
        if routed.is_err() {
            // The event loop is gone.
            return;
        }
    }
}
