//! Deterministic simulation runner.
//!
//! Owns every replica plus a globally ordered event queue. Actions are
//! executed inline: sends and broadcasts become scheduled deliveries with
//! sampled latency, delegated signing becomes a callback event at
//! `now + delay`, and internal events land at the current instant with
//! Internal priority so consequences drain before new input.

use crate::event_queue::EventKey;
use crate::network::{SimNetworkConfig, SimulatedNetwork};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};
use trichain_consensus::ConsensusConfig;
use trichain_core::{Action, Event, OutboundMessage, StateMachine};
use trichain_node::ReplicaNode;
use trichain_types::{Block, ReplicaId, Transaction};

/// Statistics collected during a simulation.
#[derive(Debug, Default, Clone)]
pub struct SimulationStats {
    /// Total events processed.
    pub events_processed: u64,
    /// Total actions generated.
    pub actions_generated: u64,
    /// Messages scheduled for delivery.
    pub messages_sent: u64,
    /// Messages dropped by partition or packet loss.
    pub messages_dropped: u64,
}

/// Deterministic multi-replica runner.
pub struct SimulationRunner {
    replicas: Vec<ReplicaNode>,
    queue: BTreeMap<EventKey, Event>,
    seq: u64,
    now: Duration,
    network: SimulatedNetwork,
    rng: ChaCha8Rng,
    config: ConsensusConfig,
    stats: SimulationStats,
    /// Committed blocks per replica, oldest first, as observed from the
    /// commit notifications.
    committed: Vec<Vec<Block>>,
}

impl SimulationRunner {
    /// Build a roster of `config.replicas` replicas over a simulated
    /// network. Same seed, same run.
    pub fn new(
        network_config: SimNetworkConfig,
        config: ConsensusConfig,
        batch_size: usize,
        seed: u64,
    ) -> Self {
        let replicas: Vec<ReplicaNode> = (0..config.replicas)
            .map(|id| ReplicaNode::new(ReplicaId(id), "hotstuff", &config, batch_size))
            .collect();
        let committed = vec![Vec::new(); replicas.len()];
        debug!(
            replicas = replicas.len(),
            seed, "created simulation runner"
        );
        SimulationRunner {
            replicas,
            queue: BTreeMap::new(),
            seq: 0,
            now: Duration::ZERO,
            network: SimulatedNetwork::new(network_config),
            rng: ChaCha8Rng::seed_from_u64(seed),
            config,
            stats: SimulationStats::default(),
            committed,
        }
    }

    /// Current virtual time.
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Simulation statistics.
    pub fn stats(&self) -> &SimulationStats {
        &self.stats
    }

    /// A replica by id.
    pub fn replica(&self, id: ReplicaId) -> &ReplicaNode {
        &self.replicas[id.0 as usize]
    }

    /// The network, for partition control.
    pub fn network_mut(&mut self) -> &mut SimulatedNetwork {
        &mut self.network
    }

    /// Blocks committed by `id`, oldest first.
    pub fn committed_chain(&self, id: ReplicaId) -> &[Block] {
        &self.committed[id.0 as usize]
    }

    /// Submit a client transaction to one replica at the current instant.
    pub fn submit_transaction(&mut self, to: ReplicaId, txn: Arc<Transaction>) {
        self.schedule(to, self.now, Event::TransactionSubmitted { txn });
    }

    /// Drain events until the queue is empty or virtual time passes
    /// `end_time`.
    pub fn run_until(&mut self, end_time: Duration) {
        loop {
            match self.queue.first_key_value() {
                Some((&key, _)) if key.time <= end_time => {}
                _ => break,
            }
            let Some((key, event)) = self.queue.pop_first() else {
                break;
            };
            self.now = key.time;
            let replica = key.replica;

            trace!(time = ?self.now, replica = %replica, event = event.type_name(), "processing event");
            self.stats.events_processed += 1;

            let actions = self.replicas[replica.0 as usize].handle(event);
            self.stats.actions_generated += actions.len() as u64;
            for action in actions {
                self.process_action(replica, action);
            }
        }
        self.now = self.now.max(end_time);
    }

    fn process_action(&mut self, from: ReplicaId, action: Action) {
        match action {
            Action::Send { to, message } => {
                self.try_deliver(from, to, message);
            }

            Action::Broadcast { message } => {
                for id in 0..self.replicas.len() as u64 {
                    let to = ReplicaId(id);
                    if to != from {
                        self.try_deliver(from, to, message.clone());
                    }
                }
            }

            Action::EnqueueInternal { event } => {
                // Observe commit notifications for test assertions before
                // handing them back to the replica.
                if let Event::BlocksCommitted { blocks } = &event {
                    let log = &mut self.committed[from.0 as usize];
                    for block in blocks.iter().rev() {
                        log.push(block.clone());
                    }
                }
                self.schedule(from, self.now, event);
            }

            Action::SignVote { vote } => {
                let ready = self.now + self.config.vote_signing_delay;
                self.schedule(from, ready, Event::VoteSigned { vote });
            }

            Action::SealBlock { block } => {
                let ready = self.now + self.config.block_seal_delay;
                self.schedule(from, ready, Event::BlockSealed { block });
            }
        }
    }

    fn try_deliver(&mut self, from: ReplicaId, to: ReplicaId, message: OutboundMessage) {
        match self.network.should_deliver(from, to, &mut self.rng) {
            Some(latency) => {
                let event = Self::message_to_event(message);
                self.schedule(to, self.now + latency, event);
                self.stats.messages_sent += 1;
            }
            None => {
                trace!(from = %from, to = %to, "message dropped");
                self.stats.messages_dropped += 1;
            }
        }
    }

    fn schedule(&mut self, replica: ReplicaId, time: Duration, event: Event) {
        self.seq += 1;
        let key = EventKey::new(time, &event, replica, self.seq);
        self.queue.insert(key, event);
    }

    /// Convert an outbound message into the receiving replica's event.
    fn message_to_event(message: OutboundMessage) -> Event {
        match message {
            OutboundMessage::Block(gossip) => Event::BlockReceived {
                block: gossip.block,
            },
            OutboundMessage::Vote(gossip) => Event::VoteReceived { vote: gossip.vote },
            OutboundMessage::Qc(gossip) => Event::QcReceived { qc: gossip.qc },
            OutboundMessage::Transaction(gossip) => Event::TransactionSubmitted {
                txn: gossip.transaction,
            },
        }
    }
}

impl std::fmt::Debug for SimulationRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulationRunner")
            .field("replicas", &self.replicas.len())
            .field("queued_events", &self.queue.len())
            .field("now", &self.now)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_run_advances_time_only() {
        let mut runner = SimulationRunner::new(
            SimNetworkConfig::default(),
            ConsensusConfig::default(),
            16,
            1,
        );
        runner.run_until(Duration::from_secs(1));
        assert_eq!(runner.now(), Duration::from_secs(1));
        assert_eq!(runner.stats().events_processed, 0);
    }

    #[test]
    fn accessors_on_a_fresh_runner() {
        let runner = SimulationRunner::new(
            SimNetworkConfig::default(),
            ConsensusConfig::default(),
            16,
            1,
        );
        assert_eq!(runner.replica(ReplicaId(0)).id(), ReplicaId(0));
        assert!(runner.committed_chain(ReplicaId(0)).is_empty());
    }
}
