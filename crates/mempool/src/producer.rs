//! Block payload builder.

use std::sync::Arc;
use tracing::trace;
use trichain_types::{Block, QuorumCertificate, ReplicaId, Transaction, TxnId, View};

/// Default cap on transactions per block.
pub const DEFAULT_BATCH_SIZE: usize = 128;

/// Staging area for client transactions awaiting inclusion in a block.
///
/// `produce_block` drains up to a batch of pending transactions into a new
/// block but does NOT remove them: the proposer removes them explicitly once
/// it has confirmed the block is out, so a failed proposal cannot lose
/// transactions.
#[derive(Debug)]
pub struct Producer {
    pending: Vec<Arc<Transaction>>,
    batch_size: usize,
}

impl Default for Producer {
    fn default() -> Self {
        Producer::new(DEFAULT_BATCH_SIZE)
    }
}

impl Producer {
    pub fn new(batch_size: usize) -> Self {
        assert!(batch_size > 0, "batch size must be positive");
        Producer {
            pending: Vec::new(),
            batch_size,
        }
    }

    /// Stage a transaction, preserving arrival order.
    pub fn collect_txn(&mut self, txn: Arc<Transaction>) {
        trace!(id = %txn.id, submitter = %txn.submitter, "staged transaction");
        self.pending.push(txn);
    }

    /// Build a block for `view` extending the block certified by
    /// `parent_qc`, with up to a batch of pending transactions as payload.
    pub fn produce_block(
        &self,
        view: View,
        parent_qc: QuorumCertificate,
        proposer: ReplicaId,
    ) -> Block {
        let payload: Vec<Arc<Transaction>> =
            self.pending.iter().take(self.batch_size).cloned().collect();
        Block::new(view, proposer, parent_qc, payload)
    }

    /// Remove a transaction by id. Idempotent.
    pub fn remove_txn(&mut self, id: &TxnId) {
        self.pending.retain(|txn| txn.id != *id);
    }

    /// Number of staged transactions.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trichain_types::test_utils::test_transaction;

    #[test]
    fn produce_does_not_drain_pending() {
        let mut producer = Producer::new(8);
        producer.collect_txn(test_transaction(1));
        producer.collect_txn(test_transaction(2));

        let block = producer.produce_block(View(1), QuorumCertificate::genesis(), ReplicaId(1));
        assert_eq!(block.payload.len(), 2);
        assert_eq!(producer.len(), 2);

        // A retried proposal sees the same payload.
        let again = producer.produce_block(View(1), QuorumCertificate::genesis(), ReplicaId(1));
        assert_eq!(again.id, block.id);
    }

    #[test]
    fn batch_size_caps_the_payload() {
        let mut producer = Producer::new(2);
        for seed in 0..5 {
            producer.collect_txn(test_transaction(seed));
        }
        let block = producer.produce_block(View(1), QuorumCertificate::genesis(), ReplicaId(1));
        assert_eq!(block.payload.len(), 2);
    }

    #[test]
    fn remove_is_idempotent() {
        let mut producer = Producer::new(8);
        let txn = test_transaction(7);
        producer.collect_txn(txn.clone());

        producer.remove_txn(&txn.id);
        assert!(producer.is_empty());
        producer.remove_txn(&txn.id);
        assert!(producer.is_empty());
    }

    #[test]
    fn empty_producer_builds_empty_blocks() {
        let producer = Producer::default();
        let block = producer.produce_block(View(3), QuorumCertificate::genesis(), ReplicaId(3));
        assert!(block.payload.is_empty());
    }
}
