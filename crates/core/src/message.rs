//! Outbound message types for network communication.

use trichain_messages::{BlockGossip, QcGossip, TransactionGossip, VoteGossip};

/// Outbound network messages.
///
/// These are the messages a replica can send to other replicas. The runner
/// handles the actual network I/O.
#[derive(Debug, Clone)]
pub enum OutboundMessage {
    /// Block proposal announcement.
    Block(BlockGossip),

    /// Vote on a proposal, addressed to the aggregating leader.
    Vote(VoteGossip),

    /// Standalone quorum certificate.
    Qc(QcGossip),

    /// Forwarded client transaction.
    Transaction(TransactionGossip),
}

impl OutboundMessage {
    /// Get a human-readable name for this message type.
    pub fn type_name(&self) -> &'static str {
        match self {
            OutboundMessage::Block(_) => "Block",
            OutboundMessage::Vote(_) => "Vote",
            OutboundMessage::Qc(_) => "Qc",
            OutboundMessage::Transaction(_) => "Transaction",
        }
    }
}
