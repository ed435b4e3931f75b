//! Blockchain state: forest + vote aggregation + high-QC tracking.

use crate::{ConsensusConfig, LevelledForest, QuorumAggregator};
use std::collections::{BTreeSet, HashSet};
use thiserror::Error;
use tracing::{debug, warn};
use trichain_types::{Block, BlockId, QuorumCertificate, ReplicaId, View, Vote};

/// Errors from chain-state operations.
#[derive(Debug, Error)]
pub enum ChainError {
    #[error("stale qc: view {view} is below the high qc view {high}")]
    StaleQc { view: View, high: View },

    #[error("block {id} is not in the forest")]
    MissingBlock { id: BlockId },

    #[error("ancestor {id} is not in the forest")]
    MissingAncestor { id: BlockId },

    #[error("nothing to commit at block {id}: at or below the committed frontier")]
    NothingToCommit { id: BlockId },

    #[error(transparent)]
    Forest(#[from] crate::ForestError),
}

/// The replica's view of the block forest, vote aggregation state, highest
/// observed certificate, and chain metrics.
#[derive(Debug)]
pub struct ChainState {
    high_qc: QuorumCertificate,
    forest: LevelledForest,
    quorum: QuorumAggregator,
    /// Blocks a certificate was already synthesized for, so duplicate votes
    /// after quorum never rebuild one.
    certified: HashSet<BlockId>,
    byzantine: BTreeSet<ReplicaId>,
    total_blocks: u64,
    committed_blocks: u64,
    honest_committed_blocks: u64,
}

impl ChainState {
    pub fn new(config: &ConsensusConfig) -> Self {
        ChainState {
            high_qc: QuorumCertificate::genesis(),
            forest: LevelledForest::new(),
            quorum: QuorumAggregator::new(config.replicas),
            certified: HashSet::new(),
            byzantine: config.byzantine.clone(),
            total_blocks: 0,
            committed_blocks: 0,
            honest_committed_blocks: 0,
        }
    }

    /// Insert a proposed block, tracking its certificate as a high-QC
    /// candidate. A stale certificate is logged, not propagated.
    pub fn add_block(&mut self, block: Block) {
        let qc = block.qc.clone();
        self.forest.add_vertex(block);
        if let Err(err) = self.update_high_qc(&qc) {
            warn!(%err, "block carried a stale qc");
        }
        self.total_blocks += 1;
    }

    /// Record a vote. Returns the freshly synthesized certificate when this
    /// vote completes the first super-majority for its block.
    pub fn add_vote(&mut self, vote: &Vote) -> Option<QuorumCertificate> {
        self.quorum.add(vote);
        if self.certified.contains(&vote.block_id) || !self.quorum.super_majority(&vote.block_id) {
            return None;
        }
        let agg_sig = match self.quorum.signatures(&vote.block_id) {
            Ok(sigs) => sigs,
            Err(err) => {
                warn!(%err, "cannot read quorum signatures");
                return None;
            }
        };
        let qc = QuorumCertificate {
            view: vote.view,
            block_id: vote.block_id,
            agg_sig,
        };
        self.certified.insert(vote.block_id);
        if let Err(err) = self.update_high_qc(&qc) {
            warn!(%err, "assembled a stale qc");
        }
        debug!(view = %qc.view, block_id = %qc.block_id, "assembled quorum certificate");
        Some(qc)
    }

    /// Replace the high QC iff `qc` is at least as recent.
    pub fn update_high_qc(&mut self, qc: &QuorumCertificate) -> Result<(), ChainError> {
        if qc.view < self.high_qc.view {
            return Err(ChainError::StaleQc {
                view: qc.view,
                high: self.high_qc.view,
            });
        }
        self.high_qc = qc.clone();
        Ok(())
    }

    /// The highest-view certificate observed so far.
    pub fn high_qc(&self) -> &QuorumCertificate {
        &self.high_qc
    }

    /// Look up a block by id.
    pub fn block(&self, id: &BlockId) -> Option<&Block> {
        self.forest.get_vertex(id)
    }

    /// One-step ancestor walk through the parent edge.
    pub fn parent_block(&self, id: &BlockId) -> Result<&Block, ChainError> {
        let block = self
            .forest
            .get_vertex(id)
            .ok_or(ChainError::MissingBlock { id: *id })?;
        let (parent_id, _) = block.parent();
        self.forest
            .get_vertex(&parent_id)
            .ok_or(ChainError::MissingAncestor { id: parent_id })
    }

    /// Two-step ancestor walk.
    pub fn grandparent_block(&self, id: &BlockId) -> Result<&Block, ChainError> {
        let parent = self.parent_block(id)?;
        self.parent_block(&parent.id)
    }

    /// Commit the chain ending at `id`: returns the blocks from `id` down to
    /// (but excluding) the previous committed frontier, newest first, then
    /// prunes the forest below `id`'s level.
    pub fn commit_block(&mut self, id: BlockId) -> Result<Vec<Block>, ChainError> {
        let head = self
            .forest
            .get_vertex(&id)
            .ok_or(ChainError::MissingBlock { id })?;
        let frontier = self.forest.lowest_level();
        if head.level() <= frontier {
            return Err(ChainError::NothingToCommit { id });
        }

        let mut committed = vec![head.clone()];
        let mut cursor = head;
        while cursor.parent().1 > frontier {
            let (parent_id, _) = cursor.parent();
            let parent = self
                .forest
                .get_vertex(&parent_id)
                .ok_or(ChainError::MissingAncestor { id: parent_id })?;
            committed.push(parent.clone());
            cursor = parent;
        }

        let level = committed[0].level();
        self.forest.prune_up_to_level(level)?;

        for block in &committed {
            if !self.byzantine.contains(&block.proposer) {
                self.honest_committed_blocks += 1;
            }
        }
        self.committed_blocks += committed.len() as u64;
        Ok(committed)
    }

    /// The committed frontier: the lowest level still retained.
    pub fn lowest_level(&self) -> View {
        self.forest.lowest_level()
    }

    // ─── Metrics ───

    pub fn total_blocks(&self) -> u64 {
        self.total_blocks
    }

    pub fn committed_blocks(&self) -> u64 {
        self.committed_blocks
    }

    pub fn honest_committed_blocks(&self) -> u64 {
        self.honest_committed_blocks
    }

    /// Committed over total blocks.
    pub fn chain_growth(&self) -> f64 {
        if self.total_blocks == 0 {
            return 0.0;
        }
        self.committed_blocks as f64 / self.total_blocks as f64
    }

    /// Honest-committed over committed blocks.
    pub fn chain_quality(&self) -> f64 {
        if self.committed_blocks == 0 {
            return 0.0;
        }
        self.honest_committed_blocks as f64 / self.committed_blocks as f64
    }
}
