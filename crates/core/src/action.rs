//! Action types for the deterministic state machine.

use crate::{Event, OutboundMessage};
use trichain_types::{Block, ReplicaId, Vote};

/// Actions the state machine wants to perform.
///
/// Actions are **commands** - they describe something to do. The runner
/// executes actions and may convert results back into events.
#[derive(Debug, Clone)]
pub enum Action {
    // ═══════════════════════════════════════════════════════════════════════
    // Network
    // ═══════════════════════════════════════════════════════════════════════
    /// Best-effort point-to-point send.
    Send {
        to: ReplicaId,
        message: OutboundMessage,
    },

    /// Best-effort broadcast to every other replica. The state machine
    /// processes its own copy locally, so runners exclude the sender.
    Broadcast { message: OutboundMessage },

    // ═══════════════════════════════════════════════════════════════════════
    // Internal (fed back as events with Internal priority)
    // ═══════════════════════════════════════════════════════════════════════
    /// Enqueue an internal event for immediate processing.
    EnqueueInternal { event: Event },

    // ═══════════════════════════════════════════════════════════════════════
    // Delegated Work (returns callback event after the configured delay)
    // ═══════════════════════════════════════════════════════════════════════
    /// Sign a vote. The runner applies the configured vote-signing delay and
    /// returns `Event::VoteSigned`.
    SignVote { vote: Vote },

    /// Seal a freshly built block. The runner applies the configured
    /// block-sealing delay and returns `Event::BlockSealed`.
    SealBlock { block: Block },
}

impl Action {
    /// Check if this action is delegated work (returns a callback event).
    pub fn is_delegated(&self) -> bool {
        matches!(self, Action::SignVote { .. } | Action::SealBlock { .. })
    }

    /// Get the action type name for telemetry.
    pub fn type_name(&self) -> &'static str {
        match self {
            Action::Send { .. } => "Send",
            Action::Broadcast { .. } => "Broadcast",
            Action::EnqueueInternal { .. } => "EnqueueInternal",
            Action::SignVote { .. } => "SignVote",
            Action::SealBlock { .. } => "SealBlock",
        }
    }
}
