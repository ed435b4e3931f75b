//! Gossip wrappers around the consensus types.
//!
//! Each wrapper carries a stable message-type tag used by the wire codec for
//! self-describing frames.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use trichain_types::{Block, QuorumCertificate, Transaction, Vote};

/// Marker for types that travel on the wire.
pub trait NetworkMessage {
    /// Stable identifier for this message type.
    fn message_type_id() -> &'static str;
}

/// A proposed block, broadcast by its proposer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockGossip {
    pub block: Block,
}

impl BlockGossip {
    pub fn new(block: Block) -> Self {
        BlockGossip { block }
    }
}

impl NetworkMessage for BlockGossip {
    fn message_type_id() -> &'static str {
        "block.proposal"
    }
}

/// A vote, sent point-to-point to the aggregating leader.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteGossip {
    pub vote: Vote,
}

impl VoteGossip {
    pub fn new(vote: Vote) -> Self {
        VoteGossip { vote }
    }
}

impl NetworkMessage for VoteGossip {
    fn message_type_id() -> &'static str {
        "block.vote"
    }
}

/// A standalone quorum certificate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QcGossip {
    pub qc: QuorumCertificate,
}

impl QcGossip {
    pub fn new(qc: QuorumCertificate) -> Self {
        QcGossip { qc }
    }
}

impl NetworkMessage for QcGossip {
    fn message_type_id() -> &'static str {
        "block.qc"
    }
}

/// A client transaction submitted to a replica.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionGossip {
    pub transaction: Arc<Transaction>,
}

impl TransactionGossip {
    pub fn new(transaction: Arc<Transaction>) -> Self {
        TransactionGossip { transaction }
    }
}

impl NetworkMessage for TransactionGossip {
    fn message_type_id() -> &'static str {
        "transaction.submit"
    }
}
