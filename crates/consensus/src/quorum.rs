//! Vote aggregation.
//!
//! Collects votes per block and reports when a super-majority of distinct
//! voters exists. At-most-once certificate synthesis per (view, block) is
//! enforced by the caller, not here.

use std::collections::{BTreeMap, HashMap};
use thiserror::Error;
use trichain_types::{AggregateSignature, BlockId, ReplicaId, Signature, Vote};

/// Errors from vote aggregation.
#[derive(Debug, Error)]
pub enum QuorumError {
    #[error("no super-majority for block {block_id}: have {have}, need {need}")]
    BelowThreshold {
        block_id: BlockId,
        have: usize,
        need: usize,
    },
}

/// Per-block buckets of distinct voter signatures.
#[derive(Debug)]
pub struct QuorumAggregator {
    /// Distinct voters required for a super-majority.
    threshold: usize,
    buckets: HashMap<BlockId, BTreeMap<ReplicaId, Signature>>,
}

impl QuorumAggregator {
    /// Aggregator for a roster of `replicas` replicas. The super-majority
    /// threshold is `2n/3 + 1` in integer arithmetic (3 of 4).
    pub fn new(replicas: u64) -> Self {
        QuorumAggregator {
            threshold: (replicas * 2 / 3 + 1) as usize,
            buckets: HashMap::new(),
        }
    }

    /// Record a vote. Duplicate votes from the same voter are idempotent.
    pub fn add(&mut self, vote: &Vote) {
        self.buckets
            .entry(vote.block_id)
            .or_default()
            .entry(vote.voter)
            .or_insert(vote.signature);
    }

    /// True once the distinct-voter count for `block_id` reaches the
    /// super-majority threshold.
    pub fn super_majority(&self, block_id: &BlockId) -> bool {
        self.buckets
            .get(block_id)
            .is_some_and(|bucket| bucket.len() >= self.threshold)
    }

    /// The aggregated signatures for `block_id`. Fails if called before a
    /// super-majority exists.
    pub fn signatures(&self, block_id: &BlockId) -> Result<AggregateSignature, QuorumError> {
        let bucket = self.buckets.get(block_id).filter(|b| b.len() >= self.threshold);
        let Some(bucket) = bucket else {
            return Err(QuorumError::BelowThreshold {
                block_id: *block_id,
                have: self.buckets.get(block_id).map_or(0, |b| b.len()),
                need: self.threshold,
            });
        };
        let mut agg = AggregateSignature::default();
        for (voter, signature) in bucket {
            agg.insert(*voter, *signature);
        }
        Ok(agg)
    }

    /// Distinct voters required for a super-majority.
    pub fn threshold(&self) -> usize {
        self.threshold
    }
}
