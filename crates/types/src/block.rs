//! Blocks.

use crate::{BlockId, QuorumCertificate, ReplicaId, Signature, Transaction, View};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;

/// A proposed block.
///
/// `id` is a deterministic function of the remaining fields, and
/// `view > qc.view` always holds: a proposal extends the block its
/// certificate certifies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,
    pub view: View,
    pub proposer: ReplicaId,
    /// Certificate for the parent block.
    pub qc: QuorumCertificate,
    pub payload: Vec<Arc<Transaction>>,
    pub signature: Signature,
}

impl Block {
    /// Build a block for `view`, extending the block certified by `qc`.
    pub fn new(
        view: View,
        proposer: ReplicaId,
        qc: QuorumCertificate,
        payload: Vec<Arc<Transaction>>,
    ) -> Self {
        debug_assert!(view > qc.view, "a block must be newer than its parent");
        let id = Self::compute_id(view, proposer, &qc, &payload);
        let signature = Signature::sign(proposer, &id);
        Block {
            id,
            view,
            proposer,
            qc,
            payload,
            signature,
        }
    }

    /// Parent edge: the id and view of the block certified by `qc`.
    pub fn parent(&self) -> (BlockId, View) {
        (self.qc.block_id, self.qc.view)
    }

    /// Forest level of this block.
    pub fn level(&self) -> View {
        self.view
    }

    fn compute_id(
        view: View,
        proposer: ReplicaId,
        qc: &QuorumCertificate,
        payload: &[Arc<Transaction>],
    ) -> BlockId {
        let mut hasher = Sha256::new();
        hasher.update(b"trichain.block.v1");
        hasher.update(view.0.to_le_bytes());
        hasher.update(proposer.0.to_le_bytes());
        hasher.update(qc.view.0.to_le_bytes());
        hasher.update(qc.block_id.as_bytes());
        hasher.update((payload.len() as u64).to_le_bytes());
        for txn in payload {
            hasher.update(txn.id.0.to_le_bytes());
            hasher.update(txn.submitter.0.to_le_bytes());
            hasher.update(&txn.payload);
        }
        BlockId(hasher.finalize().into())
    }
}
