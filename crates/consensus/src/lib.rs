//! Chained HotStuff replica core.
//!
//! This crate implements the consensus side of the replica as a synchronous
//! state machine:
//!
//! - [`LevelledForest`]: blocks indexed by id and by level, with pruning
//! - [`QuorumAggregator`]: per-block vote buckets and the super-majority test
//! - [`ChainState`]: forest + aggregator + high-QC tracking + chain metrics
//! - [`RoundRobin`]: deterministic view → leader mapping
//! - [`Pacemaker`]: monotone current view with a coalescing new-view slot
//! - [`SafetyRules`]: voting rule, locking rule, three-chain commit rule
//! - [`ReplicaState`]: the per-message processors tying it all together
//!
//! # Consensus Protocol (chained HotStuff)
//!
//! One leader per view proposes a block carrying a certificate for its
//! parent. Replicas vote once per view; the leader of the next view
//! aggregates votes into a quorum certificate, which advances the pacemaker
//! and, once a three-chain of contiguous views exists, commits the oldest
//! block of the chain.
//!
//! ## Safety
//!
//! - **Vote monotonicity**: `last_voted_view` only grows; a replica never
//!   votes twice in a view.
//! - **Locking**: a direct-parent certificate locks its parent's view; a
//!   replica only votes for proposals extending at least the locked view.
//! - **Three-chain commit**: a block commits only under a certified chain of
//!   three blocks with contiguous views.
//!
//! ## Liveness
//!
//! Progress is driven purely by certificates; there is no timeout path, so a
//! stalled view requires an external restart.

mod chain;
mod config;
mod election;
mod forest;
mod pacemaker;
mod quorum;
mod replica;
mod safety;

pub use chain::{ChainError, ChainState};
pub use config::ConsensusConfig;
pub use election::RoundRobin;
pub use forest::{ForestError, LevelledForest};
pub use pacemaker::Pacemaker;
pub use quorum::{QuorumAggregator, QuorumError};
pub use replica::ReplicaState;
pub use safety::SafetyRules;
