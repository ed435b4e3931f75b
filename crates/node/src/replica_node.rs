//! The replica node: consensus core + payload producer + bootstrap.

use std::sync::Arc;
use tracing::{debug, info};
use trichain_consensus::{ConsensusConfig, ReplicaState};
use trichain_core::{Action, Event, OutboundMessage, StateMachine};
use trichain_mempool::Producer;
use trichain_messages::BlockGossip;
use trichain_types::{Block, ReplicaId, Transaction, TransactionReply, View};

/// A full replica: consensus state, transaction producer, and the
/// protocol-start latch.
#[derive(Debug)]
pub struct ReplicaNode {
    id: ReplicaId,
    is_byzantine: bool,
    consensus: ReplicaState,
    producer: Producer,
    started: bool,
}

impl ReplicaNode {
    /// Build a replica.
    ///
    /// `algorithm` is forwarded to the consensus core (the historical
    /// `"hotsutff"` spelling is accepted there).
    pub fn new(id: ReplicaId, algorithm: &str, config: &ConsensusConfig, batch_size: usize) -> Self {
        let is_byzantine = config.is_byzantine(id);
        if is_byzantine {
            info!(replica = %id, "replica is configured Byzantine");
        }
        ReplicaNode {
            id,
            is_byzantine,
            consensus: ReplicaState::new(id, algorithm, config),
            producer: Producer::new(batch_size),
            started: false,
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

    /// The consensus core, for metrics and inspection.
    pub fn consensus(&self) -> &ReplicaState {
        &self.consensus
    }

    /// The payload producer, for inspection.
    pub fn producer(&self) -> &Producer {
        &self.producer
    }

    /// Stage a client transaction; the first one received by the leader of
    /// view 1 kicks off the protocol.
    fn on_transaction(&mut self, txn: Arc<Transaction>) -> Vec<Action> {
        self.producer.collect_txn(txn);
        if !self.started && self.consensus.is_leader(self.id, View(1)) {
            self.started = true;
            return self.consensus.bootstrap();
        }
        vec![]
    }

    /// Propose for `view` if this replica leads it.
    fn on_entering_view(&mut self, view: View) -> Vec<Action> {
        debug!(%view, "processing new view");
        if !self.consensus.is_leader(self.id, view) {
            return vec![];
        }
        let parent_qc = self.consensus.fork_choice();
        let block = self.producer.produce_block(view, parent_qc, self.id);
        debug!(%view, id = %block.id, payload = block.payload.len(), "proposing block");
        vec![Action::SealBlock { block }]
    }

    /// A sealed proposal goes out to everyone and through the local
    /// pipeline; only then is its payload dropped from the producer.
    fn on_block_sealed(&mut self, block: Block) -> Vec<Action> {
        let mut actions = vec![Action::Broadcast {
            message: OutboundMessage::Block(BlockGossip::new(block.clone())),
        }];
        actions.extend(self.consensus.on_block(block.clone()));
        for txn in &block.payload {
            self.producer.remove_txn(&txn.id);
        }
        actions
    }

    /// Post-commit bookkeeping: answer own clients, drop committed payloads
    /// (the proposer already dropped its own at propose time), report chain
    /// metrics.
    fn on_blocks_committed(&mut self, blocks: Vec<Block>) -> Vec<Action> {
        for block in &blocks {
            for txn in &block.payload {
                if txn.submitter == self.id {
                    txn.reply.respond(TransactionReply { txn_id: txn.id });
                }
                if block.proposer != self.id {
                    self.producer.remove_txn(&txn.id);
                }
            }
            if block.payload.is_empty() {
                debug!(id = %block.id, "committed block has empty payload");
            }
            debug!(id = %block.id, view = %block.view, "block committed");
        }

        let chain = self.consensus.chain();
        info!(
            replica = %self.id,
            committed = chain.committed_blocks(),
            total = chain.total_blocks(),
            growth = chain.chain_growth(),
            "chain growth"
        );
        info!(
            replica = %self.id,
            honest_committed = chain.honest_committed_blocks(),
            committed = chain.committed_blocks(),
            quality = chain.chain_quality(),
            "chain quality"
        );
        vec![]
    }
}

impl StateMachine for ReplicaNode {
    fn handle(&mut self, event: Event) -> Vec<Action> {
        match event {
            Event::BlockReceived { block } => self.consensus.on_block(block),
            Event::VoteReceived { vote } => self.consensus.on_vote(vote),
            Event::QcReceived { qc } => self.consensus.on_qc(qc),
            Event::VoteSigned { vote } => self.consensus.on_vote_signed(vote),
            Event::TransactionSubmitted { txn } => self.on_transaction(txn),
            Event::EnteringView { view } => self.on_entering_view(view),
            Event::BlockSealed { block } => self.on_block_sealed(block),
            Event::BlocksCommitted { blocks } => self.on_blocks_committed(blocks),
        }
    }
}
