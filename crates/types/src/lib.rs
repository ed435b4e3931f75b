//! Core types for trichain consensus.
//!
//! This crate provides the foundational types used throughout the replica
//! implementation:
//!
//! - **Identifiers**: `ReplicaId`, `View`, `BlockId`, `TxnId`
//! - **Consensus types**: `Block`, `Vote`, `QuorumCertificate`
//! - **Client types**: `Transaction`, `TransactionReply`, `ReplySlot`
//! - **Placeholder crypto**: `Signature`, `AggregateSignature`
//!
//! # Design Philosophy
//!
//! This crate is self-contained and does not depend on any other workspace
//! crates, making it the foundation layer. Signatures are deterministic
//! placeholders with the shape of the real thing; swapping in a real scheme
//! changes only this crate.

mod block;
mod identifiers;
mod quorum_certificate;
mod signature;
mod transaction;
mod vote;

pub use block::Block;
pub use identifiers::{BlockId, ReplicaId, TxnId, View};
pub use quorum_certificate::QuorumCertificate;
pub use signature::{AggregateSignature, Signature};
pub use transaction::{ReplySlot, Transaction, TransactionReply};
pub use vote::Vote;

/// Test helpers shared between unit and integration tests.
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils {
    use super::*;
    use std::sync::Arc;

    /// Create a payload-less transaction from a seed.
    pub fn test_transaction(seed: u64) -> Arc<Transaction> {
        Arc::new(Transaction::new(
            TxnId(seed),
            ReplicaId(seed % 4),
            vec![seed as u8; 8],
        ))
    }

    /// Create a block at `view` extending the block certified by `qc`.
    pub fn test_block(view: u64, proposer: u64, qc: QuorumCertificate) -> Block {
        Block::new(View(view), ReplicaId(proposer), qc, vec![])
    }

    /// Create a quorum certificate for `block` signed by `voters`.
    pub fn test_qc(block: &Block, voters: &[u64]) -> QuorumCertificate {
        let mut agg = AggregateSignature::default();
        for &voter in voters {
            let id = ReplicaId(voter);
            agg.insert(id, Signature::sign(id, &block.id));
        }
        QuorumCertificate {
            view: block.view,
            block_id: block.id,
            agg_sig: agg,
        }
    }
}
