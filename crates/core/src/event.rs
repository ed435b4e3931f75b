//! Event types for the deterministic state machine.

use std::sync::Arc;
use trichain_types::{Block, QuorumCertificate, Transaction, View, Vote};

/// Priority levels for event ordering within the same timestamp.
///
/// Events at the same simulation time are processed in priority order.
/// Lower values = higher priority (processed first). Internal events are
/// consequences of prior processing and must land before new external
/// inputs to preserve causality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum EventPriority {
    /// Consequences of prior event processing.
    Internal = 0,
    /// External inputs from other replicas.
    Network = 1,
    /// External inputs from clients.
    Client = 2,
}

/// All possible events a replica can receive.
///
/// Events are **passive data** - they describe something that happened.
/// The state machine processes events and returns actions.
#[derive(Debug, Clone)]
pub enum Event {
    // ═══════════════════════════════════════════════════════════════════════
    // Network Messages (priority: Network)
    // ═══════════════════════════════════════════════════════════════════════
    /// Received a block proposal.
    BlockReceived { block: Block },

    /// Received a vote for aggregation.
    VoteReceived { vote: Vote },

    /// Received a standalone quorum certificate.
    QcReceived { qc: QuorumCertificate },

    // ═══════════════════════════════════════════════════════════════════════
    // Client Requests (priority: Client)
    // ═══════════════════════════════════════════════════════════════════════
    /// A client submitted a transaction to this replica.
    TransactionSubmitted { txn: Arc<Transaction> },

    // ═══════════════════════════════════════════════════════════════════════
    // Internal Events (priority: Internal)
    // ═══════════════════════════════════════════════════════════════════════
    /// The pacemaker entered a new view.
    EnteringView { view: View },

    /// Vote signing completed (callback from [`crate::Action::SignVote`]).
    VoteSigned { vote: Vote },

    /// Block sealing completed (callback from [`crate::Action::SealBlock`]).
    BlockSealed { block: Block },

    /// A chain segment was committed, newest block first.
    BlocksCommitted { blocks: Vec<Block> },
}

impl Event {
    /// Get the priority for this event type.
    pub fn priority(&self) -> EventPriority {
        match self {
            Event::EnteringView { .. }
            | Event::VoteSigned { .. }
            | Event::BlockSealed { .. }
            | Event::BlocksCommitted { .. } => EventPriority::Internal,

            Event::BlockReceived { .. } | Event::VoteReceived { .. } | Event::QcReceived { .. } => {
                EventPriority::Network
            }

            Event::TransactionSubmitted { .. } => EventPriority::Client,
        }
    }

    /// Check if this is an internal event (consequence of prior processing).
    pub fn is_internal(&self) -> bool {
        self.priority() == EventPriority::Internal
    }

    /// Get the event type name for telemetry.
    pub fn type_name(&self) -> &'static str {
        match self {
            Event::BlockReceived { .. } => "BlockReceived",
            Event::VoteReceived { .. } => "VoteReceived",
            Event::QcReceived { .. } => "QcReceived",
            Event::TransactionSubmitted { .. } => "TransactionSubmitted",
            Event::EnteringView { .. } => "EnteringView",
            Event::VoteSigned { .. } => "VoteSigned",
            Event::BlockSealed { .. } => "BlockSealed",
            Event::BlocksCommitted { .. } => "BlocksCommitted",
        }
    }
}
