//! Consensus configuration.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Duration;
use trichain_types::ReplicaId;

/// Configuration shared by the replica core and its runners.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsensusConfig {
    /// Total number of replicas in the roster.
    pub replicas: u64,

    /// Replicas configured as Byzantine, consulted at commit time for
    /// chain-quality accounting.
    pub byzantine: BTreeSet<ReplicaId>,

    /// Simulated cost of signing a vote.
    pub vote_signing_delay: Duration,

    /// Simulated cost of sealing a freshly built block.
    pub block_seal_delay: Duration,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        ConsensusConfig {
            replicas: 4,
            byzantine: BTreeSet::new(),
            vote_signing_delay: Duration::from_millis(20),
            block_seal_delay: Duration::from_millis(50),
        }
    }
}

impl ConsensusConfig {
    /// Whether `id` is in the configured Byzantine set.
    pub fn is_byzantine(&self, id: ReplicaId) -> bool {
        self.byzantine.contains(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ConsensusConfig::default();
        assert_eq!(config.replicas, 4);
        assert_eq!(config.vote_signing_delay, Duration::from_millis(20));
        assert_eq!(config.block_seal_delay, Duration::from_millis(50));
        assert!(!config.is_byzantine(ReplicaId(0)));
    }

    #[test]
    fn byzantine_membership() {
        let config = ConsensusConfig {
            byzantine: BTreeSet::from([ReplicaId(2)]),
            ..Default::default()
        };
        assert!(config.is_byzantine(ReplicaId(2)));
        assert!(!config.is_byzantine(ReplicaId(1)));
    }
}
