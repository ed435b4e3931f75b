//! Replica-side message processors.
//!
//! `ReplicaState` owns the chain, safety rules, pacemaker, and election, and
//! serializes every decision on them: runners drive it one event at a time.
//! No processor blocks - the vote-signing cost is delegated to the runner
//! via [`Action::SignVote`] and comes back as `Event::VoteSigned`.

use crate::{ChainState, ConsensusConfig, Pacemaker, RoundRobin, SafetyRules};
use tracing::{debug, error, trace, warn};
use trichain_core::{Action, Event, OutboundMessage};
use trichain_messages::VoteGossip;
use trichain_types::{Block, QuorumCertificate, ReplicaId, View, Vote};

/// The consensus half of a replica.
#[derive(Debug)]
pub struct ReplicaState {
    id: ReplicaId,
    election: RoundRobin,
    chain: ChainState,
    safety: SafetyRules,
    pacemaker: Pacemaker,
}

impl ReplicaState {
    /// Create the consensus state for `id`.
    ///
    /// `algorithm` selects the safety rules; the historical spelling
    /// `"hotsutff"` is accepted for config compatibility, and every other
    /// value selects chained HotStuff as well.
    pub fn new(id: ReplicaId, algorithm: &str, config: &ConsensusConfig) -> Self {
        let safety = match algorithm {
            "hotsutff" => SafetyRules::new(),
            _ => SafetyRules::new(),
        };
        ReplicaState {
            id,
            election: RoundRobin::new(config.replicas),
            chain: ChainState::new(config),
            safety,
            pacemaker: Pacemaker::new(),
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Inbound handlers
    //
    // Each handler discards messages older than the current view before any
    // processing; stale traffic dies silently at the boundary.
    // ═══════════════════════════════════════════════════════════════════════

    /// Handle an inbound block proposal.
    pub fn on_block(&mut self, block: Block) -> Vec<Action> {
        if block.view < self.pacemaker.cur_view() {
            trace!(view = %block.view, "discarding stale block");
            return vec![];
        }
        self.process_block(block)
    }

    /// Handle an inbound vote.
    pub fn on_vote(&mut self, vote: Vote) -> Vec<Action> {
        if vote.view < self.pacemaker.cur_view() {
            trace!(view = %vote.view, voter = %vote.voter, "discarding stale vote");
            return vec![];
        }
        self.process_vote(vote)
    }

    /// Handle an inbound standalone certificate.
    pub fn on_qc(&mut self, qc: QuorumCertificate) -> Vec<Action> {
        if qc.view < self.pacemaker.cur_view() {
            trace!(view = %qc.view, "discarding stale qc");
            return vec![];
        }
        self.process_certificate(qc)
    }

    /// Route a signed vote to the aggregator for the next view: processed
    /// locally when that is us, sent point-to-point otherwise.
    pub fn on_vote_signed(&mut self, vote: Vote) -> Vec<Action> {
        let aggregator = self.election.leader_for(self.pacemaker.cur_view().next());
        if aggregator == self.id {
            return self.process_vote(vote);
        }
        vec![Action::Send {
            to: aggregator,
            message: OutboundMessage::Vote(VoteGossip::new(vote)),
        }]
    }

    /// Kick off the protocol: enter view 1 as if a view-0 certificate had
    /// been observed.
    pub fn bootstrap(&mut self) -> Vec<Action> {
        let mut actions = vec![];
        if self.pacemaker.advance_view(View(0)) {
            self.emit_entering_view(&mut actions);
        }
        actions
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Processors
    // ═══════════════════════════════════════════════════════════════════════

    fn process_block(&mut self, block: Block) -> Vec<Action> {
        debug!(view = %block.view, id = %block.id, "processing block");
        let mut actions = self.process_certificate(block.qc.clone());

        let cur_view = self.pacemaker.cur_view();
        if block.view != cur_view {
            warn!(view = %block.view, %cur_view, "received a stale proposal");
            return actions;
        }
        if !self.election.is_leader(block.proposer, block.view) {
            warn!(
                view = %block.view,
                proposer = %block.proposer,
                "received a proposal from an invalid leader"
            );
            return actions;
        }

        self.chain.add_block(block.clone());

        let should_vote = match self.safety.voting_rule(&self.chain, &block) {
            Ok(should_vote) => should_vote,
            Err(err) => {
                error!(%err, "cannot decide whether to vote for the block");
                return actions;
            }
        };
        if !should_vote {
            debug!(id = %block.id, "not voting for block");
            return actions;
        }

        debug!(id = %block.id, "voting for block");
        let vote = Vote::new(block.view, self.id, block.id);
        self.safety.update_state_by_view(vote.view);
        actions.push(Action::SignVote { vote });
        actions
    }

    fn process_vote(&mut self, vote: Vote) -> Vec<Action> {
        match self.chain.add_vote(&vote) {
            Some(qc) => self.process_certificate(qc),
            None => vec![],
        }
    }

    fn process_certificate(&mut self, qc: QuorumCertificate) -> Vec<Action> {
        if qc.view < self.pacemaker.cur_view() {
            return vec![];
        }

        let mut actions = vec![];
        self.pacemaker.advance_view(qc.view);
        self.emit_entering_view(&mut actions);

        if let Err(err) = self.safety.update_state_by_qc(&mut self.chain, &qc) {
            error!(%err, "cannot update safety state from qc");
            return actions;
        }

        // No three-chain can end below view 3.
        if qc.view < View(3) {
            return actions;
        }
        let committable = match self.safety.commit_rule(&self.chain, &qc) {
            Ok(Some(block)) => block.id,
            Ok(None) => return actions,
            Err(err) => {
                error!(%err, "cannot apply the commit rule");
                return actions;
            }
        };
        let committed = match self.chain.commit_block(committable) {
            Ok(blocks) => blocks,
            Err(err) => {
                error!(%err, "cannot commit blocks");
                return actions;
            }
        };
        actions.push(Action::EnqueueInternal {
            event: Event::BlocksCommitted { blocks: committed },
        });
        actions
    }

    fn emit_entering_view(&mut self, actions: &mut Vec<Action>) {
        if let Some(view) = self.pacemaker.take_entering_view() {
            actions.push(Action::EnqueueInternal {
                event: Event::EnteringView { view },
            });
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Accessors
    // ═══════════════════════════════════════════════════════════════════════

    /// This replica's id.
    pub fn id(&self) -> ReplicaId {
        self.id
    }

    /// The pacemaker's current view.
    pub fn cur_view(&self) -> View {
        self.pacemaker.cur_view()
    }

    /// Whether `id` leads `view`.
    pub fn is_leader(&self, id: ReplicaId, view: View) -> bool {
        self.election.is_leader(id, view)
    }

    /// The certificate a proposal for this replica should extend.
    pub fn fork_choice(&self) -> QuorumCertificate {
        self.safety.fork_choice(&self.chain)
    }

    /// Chain state, for metrics and inspection.
    pub fn chain(&self) -> &ChainState {
        &self.chain
    }

    /// Safety state, for inspection.
    pub fn safety(&self) -> &SafetyRules {
        &self.safety
    }

    #[cfg(test)]
    pub(crate) fn chain_mut(&mut self) -> &mut ChainState {
        &mut self.chain
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trichain_types::test_utils::{test_block, test_qc};
    use trichain_types::BlockId;

    fn replica(id: u64) -> ReplicaState {
        ReplicaState::new(ReplicaId(id), "hotstuff", &ConsensusConfig::default())
    }

    fn signed_votes(actions: &[Action]) -> Vec<&Vote> {
        actions
            .iter()
            .filter_map(|action| match action {
                Action::SignVote { vote } => Some(vote),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn legacy_algorithm_spelling_is_accepted() {
        let state = ReplicaState::new(ReplicaId(0), "hotsutff", &ConsensusConfig::default());
        assert_eq!(state.cur_view(), View(0));
    }

    #[test]
    fn bootstrap_enters_view_one() {
        let mut state = replica(1);
        let actions = state.bootstrap();
        assert_eq!(state.cur_view(), View(1));
        assert!(matches!(
            actions[..],
            [Action::EnqueueInternal {
                event: Event::EnteringView { view: View(1) }
            }]
        ));
    }

    #[test]
    fn valid_proposal_is_voted_for() {
        let mut state = replica(0);
        let block = test_block(1, 1, QuorumCertificate::genesis());

        let actions = state.on_block(block.clone());
        let votes = signed_votes(&actions);
        assert_eq!(votes.len(), 1);
        assert_eq!(votes[0].block_id, block.id);
        assert_eq!(votes[0].view, View(1));
        assert_eq!(state.safety().last_voted_view(), View(1));
        // The genesis certificate moved us into view 1.
        assert_eq!(state.cur_view(), View(1));
    }

    #[test]
    fn stale_block_is_discarded_at_the_boundary() {
        let mut state = replica(0);
        // Push the pacemaker to view 5.
        let blocks = straight_chain(4);
        for block in &blocks {
            state.chain_mut().add_block(block.clone());
        }
        state.on_qc(test_qc(&blocks[3], &[0, 1, 2]));
        assert_eq!(state.cur_view(), View(5));

        let total_before = state.chain().total_blocks();
        let stale = test_block(4, 0, test_qc(&blocks[2], &[0, 1, 2]));
        let actions = state.on_block(stale);
        assert!(actions.is_empty());
        assert_eq!(state.chain().total_blocks(), total_before);
    }

    #[test]
    fn wrong_leader_proposal_is_dropped() {
        let mut state = replica(0);
        state.bootstrap();
        state.on_block(test_block(1, 1, QuorumCertificate::genesis()));
        assert_eq!(state.cur_view(), View(1));

        // View 2 is led by replica 2; a proposal from replica 3 is ignored
        // before it reaches the forest.
        let b1 = test_block(1, 1, QuorumCertificate::genesis());
        let qc1 = test_qc(&b1, &[0, 1, 2]);
        let wrong = test_block(2, 3, qc1);
        let total_before = state.chain().total_blocks();
        let actions = state.on_block(wrong);
        assert!(signed_votes(&actions).is_empty());
        assert_eq!(state.chain().total_blocks(), total_before);
        assert_eq!(state.safety().last_voted_view(), View(1));
    }

    #[test]
    fn own_votes_route_to_the_next_leader() {
        let mut state = replica(0);
        state.bootstrap();
        let vote = Vote::new(View(1), ReplicaId(0), BlockId::from_bytes(b"voted block"));

        let actions = state.on_vote_signed(vote.clone());
        match &actions[..] {
            [Action::Send { to, message }] => {
                assert_eq!(*to, ReplicaId(2));
                assert!(matches!(message, OutboundMessage::Vote(_)));
            }
            other => panic!("expected a vote send, got {other:?}"),
        }
    }

    #[test]
    fn quorum_of_votes_advances_the_view() {
        // Replica 2 aggregates votes for view 1.
        let mut state = replica(2);
        let block = test_block(1, 1, QuorumCertificate::genesis());
        state.on_block(block.clone());
        assert_eq!(state.cur_view(), View(1));

        state.on_vote(Vote::new(View(1), ReplicaId(0), block.id));
        state.on_vote(Vote::new(View(1), ReplicaId(1), block.id));
        let actions = state.on_vote(Vote::new(View(1), ReplicaId(3), block.id));

        assert_eq!(state.cur_view(), View(2));
        assert_eq!(state.chain().high_qc().view, View(1));
        assert!(actions.iter().any(|action| matches!(
            action,
            Action::EnqueueInternal {
                event: Event::EnteringView { view: View(2) }
            }
        )));
    }

    #[test]
    fn three_chain_certificate_commits() {
        let mut state = replica(0);
        let blocks = straight_chain(3);
        for block in &blocks {
            state.chain_mut().add_block(block.clone());
        }

        let qc3 = test_qc(&blocks[2], &[0, 1, 2]);
        let actions = state.on_qc(qc3);

        let committed = actions.iter().find_map(|action| match action {
            Action::EnqueueInternal {
                event: Event::BlocksCommitted { blocks },
            } => Some(blocks),
            _ => None,
        });
        let committed = committed.expect("three-chain must commit");
        assert_eq!(committed.len(), 1);
        assert_eq!(committed[0].id, blocks[0].id);
        assert_eq!(state.chain().committed_blocks(), 1);
    }

    #[test]
    fn gapped_chain_does_not_commit() {
        let mut state = replica(0);
        let blocks = straight_chain(2);
        for block in &blocks {
            state.chain_mut().add_block(block.clone());
        }
        // B1 <- B2 <- B4; the top link skips view 3.
        let gapped = test_block(4, 0, test_qc(&blocks[1], &[0, 1, 2]));
        state.chain_mut().add_block(gapped.clone());

        let actions = state.on_qc(test_qc(&gapped, &[0, 1, 2]));
        assert!(!actions.iter().any(|action| matches!(
            action,
            Action::EnqueueInternal {
                event: Event::BlocksCommitted { .. }
            }
        )));
        assert_eq!(state.chain().committed_blocks(), 0);
    }

    /// Straight chain of `len` blocks at views 1..=len, rotating proposers.
    fn straight_chain(len: u64) -> Vec<Block> {
        let mut blocks = vec![test_block(1, 1, QuorumCertificate::genesis())];
        for view in 2..=len {
            let parent = blocks.last().unwrap();
            blocks.push(test_block(view, view % 4, test_qc(parent, &[0, 1, 2])));
        }
        blocks
    }
}
