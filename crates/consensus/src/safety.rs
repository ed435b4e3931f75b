//! Chained HotStuff safety rules.
//!
//! Holds the two safety-critical views:
//!
//! - `last_voted_view`: highest view this replica voted in. Monotone; the
//!   core safety invariant - a replica never votes for two blocks in the
//!   same view.
//! - `locked_view`: highest view certified by a direct-parent certificate.
//!   Proposals must extend at least this view to be votable.

use crate::{ChainError, ChainState};
use tracing::warn;
use trichain_types::{Block, QuorumCertificate, View};

/// Voting, locking, and commit rules.
#[derive(Debug, Default)]
pub struct SafetyRules {
    last_voted_view: View,
    locked_view: View,
}

impl SafetyRules {
    pub fn new() -> Self {
        SafetyRules::default()
    }

    /// Whether to vote for `block`.
    ///
    /// A block is votable when it is newer than anything voted for and it
    /// extends the locked ancestor: its parent (the block its certificate
    /// certifies) sits at or above `locked_view`. Blocks in the first two
    /// views have no certified ancestry to check. Fails when the parent walk
    /// cannot complete.
    pub fn voting_rule(&self, chain: &ChainState, block: &Block) -> Result<bool, ChainError> {
        if block.view <= self.last_voted_view {
            return Ok(false);
        }
        if block.view <= View(2) {
            return Ok(true);
        }
        let parent = chain.parent_block(&block.id)?;
        Ok(parent.view >= self.locked_view)
    }

    /// Record a cast vote: `last_voted_view` only grows.
    pub fn update_state_by_view(&mut self, view: View) {
        self.last_voted_view = self.last_voted_view.max(view);
    }

    /// Apply a certificate: advance the lock for direct-parent certificates
    /// and track the certificate as a high-QC candidate.
    ///
    /// A certificate at view `v >= 2` certifies a block whose parent may sit
    /// directly below it; when the views are contiguous the parent's view
    /// becomes the new lock (under monotone max). Certificates below view 2
    /// certify blocks whose parent predates the forest and skip the locking
    /// step. A stale high-QC candidate is logged, not propagated.
    pub fn update_state_by_qc(
        &mut self,
        chain: &mut ChainState,
        qc: &QuorumCertificate,
    ) -> Result<(), ChainError> {
        if qc.view >= View(2) {
            let certified_view = chain
                .block(&qc.block_id)
                .ok_or(ChainError::MissingBlock { id: qc.block_id })?
                .view;
            let parent_view = chain.parent_block(&qc.block_id)?.view;
            if certified_view == parent_view.next() {
                self.locked_view = self.locked_view.max(parent_view);
            }
        }
        if let Err(err) = chain.update_high_qc(qc) {
            warn!(%err, "ignoring stale qc");
        }
        Ok(())
    }

    /// Three-chain commit rule.
    ///
    /// Returns the committable block when `qc` tops a chain of three blocks
    /// with contiguous views: the grandparent of the certified block. Only
    /// meaningful for certificates of view >= 3.
    pub fn commit_rule<'c>(
        &self,
        chain: &'c ChainState,
        qc: &QuorumCertificate,
    ) -> Result<Option<&'c Block>, ChainError> {
        let tail = chain
            .block(&qc.block_id)
            .ok_or(ChainError::MissingBlock { id: qc.block_id })?;
        let mid = chain.parent_block(&qc.block_id)?;
        let head = chain.parent_block(&mid.id)?;
        let direct = head.view.next() == mid.view && mid.view.next() == tail.view;
        Ok(direct.then_some(head))
    }

    /// Fork choice: a leader always extends the high-QC block.
    pub fn fork_choice(&self, chain: &ChainState) -> QuorumCertificate {
        chain.high_qc().clone()
    }

    /// Highest view voted in.
    pub fn last_voted_view(&self) -> View {
        self.last_voted_view
    }

    /// Highest locked view.
    pub fn locked_view(&self) -> View {
        self.locked_view
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ConsensusConfig;
    use trichain_types::test_utils::{test_block, test_qc};

    fn chain_with(blocks: &[Block]) -> ChainState {
        let mut chain = ChainState::new(&ConsensusConfig::default());
        for block in blocks {
            chain.add_block(block.clone());
        }
        chain
    }

    /// Straight chain of `len` blocks at views 1..=len.
    fn straight_chain(len: u64) -> Vec<Block> {
        let mut blocks = vec![test_block(1, 1, QuorumCertificate::genesis())];
        for view in 2..=len {
            let parent = blocks.last().unwrap();
            blocks.push(test_block(view, view % 4, test_qc(parent, &[0, 1, 2])));
        }
        blocks
    }

    #[test]
    fn votes_are_monotone_per_view() {
        let blocks = straight_chain(1);
        let chain = chain_with(&blocks);
        let mut safety = SafetyRules::new();

        assert!(safety.voting_rule(&chain, &blocks[0]).unwrap());
        safety.update_state_by_view(View(1));
        // Same view again: no second vote.
        assert!(!safety.voting_rule(&chain, &blocks[0]).unwrap());
        assert_eq!(safety.last_voted_view(), View(1));
    }

    #[test]
    fn voting_requires_extending_the_lock() {
        let blocks = straight_chain(4);
        let mut chain = chain_with(&blocks);
        let mut safety = SafetyRules::new();

        // Certificate for the third block locks the second one's view.
        let qc3 = test_qc(&blocks[2], &[0, 1, 2]);
        safety.update_state_by_qc(&mut chain, &qc3).unwrap();
        assert_eq!(safety.locked_view(), View(2));

        // The fourth block extends the third: votable.
        assert!(safety.voting_rule(&chain, &blocks[3]).unwrap());

        // A fork off the first block cannot reach the lock.
        let fork = test_block(4, 0, test_qc(&blocks[0], &[0, 1, 2]));
        let mut forked = chain_with(&blocks[..2]);
        forked.add_block(fork.clone());
        assert!(!safety.voting_rule(&forked, &fork).unwrap());
    }

    #[test]
    fn voting_rule_fails_without_ancestry() {
        let blocks = straight_chain(3);
        // Only the head is present; its parent is unknown.
        let chain = chain_with(&blocks[2..]);
        let safety = SafetyRules::new();
        assert!(matches!(
            safety.voting_rule(&chain, &blocks[2]),
            Err(ChainError::MissingAncestor { .. })
        ));
    }

    #[test]
    fn lock_only_advances_on_direct_parents() {
        let blocks = straight_chain(2);
        let mut chain = chain_with(&blocks);
        let mut safety = SafetyRules::new();

        // A gapped child: view 4 on top of the view-2 block.
        let gapped = test_block(4, 0, test_qc(&blocks[1], &[0, 1, 2]));
        chain.add_block(gapped.clone());
        let qc4 = test_qc(&gapped, &[0, 1, 2]);
        safety.update_state_by_qc(&mut chain, &qc4).unwrap();
        assert_eq!(safety.locked_view(), View(0));
        // The high QC still advances.
        assert_eq!(chain.high_qc().view, View(4));
    }

    #[test]
    fn commit_rule_fires_on_direct_three_chains() {
        let blocks = straight_chain(3);
        let chain = chain_with(&blocks);
        let safety = SafetyRules::new();

        let qc3 = test_qc(&blocks[2], &[0, 1, 2]);
        let committable = safety.commit_rule(&chain, &qc3).unwrap();
        assert_eq!(committable.unwrap().id, blocks[0].id);
    }

    #[test]
    fn commit_rule_rejects_gapped_chains() {
        let blocks = straight_chain(2);
        let mut chain = chain_with(&blocks);
        let safety = SafetyRules::new();

        // B1 <- B2 <- B4: the views are not contiguous at the top.
        let gapped = test_block(4, 0, test_qc(&blocks[1], &[0, 1, 2]));
        chain.add_block(gapped.clone());
        let qc4 = test_qc(&gapped, &[0, 1, 2]);
        assert!(safety.commit_rule(&chain, &qc4).unwrap().is_none());
    }

    #[test]
    fn commit_rule_fails_on_missing_ancestors() {
        let blocks = straight_chain(3);
        // The middle block is missing.
        let mut chain = ChainState::new(&ConsensusConfig::default());
        chain.add_block(blocks[0].clone());
        chain.add_block(blocks[2].clone());
        let safety = SafetyRules::new();

        let qc3 = test_qc(&blocks[2], &[0, 1, 2]);
        assert!(matches!(
            safety.commit_rule(&chain, &qc3),
            Err(ChainError::MissingAncestor { .. })
        ));
    }

    #[test]
    fn fork_choice_returns_the_high_qc() {
        let blocks = straight_chain(2);
        let mut chain = chain_with(&blocks);
        let safety = SafetyRules::new();

        let qc2 = test_qc(&blocks[1], &[0, 1, 2]);
        chain.update_high_qc(&qc2).unwrap();
        assert_eq!(safety.fork_choice(&chain), qc2);
    }
}
