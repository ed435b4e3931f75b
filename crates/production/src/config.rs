//! Node configuration.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use trichain_consensus::ConsensusConfig;
use trichain_types::ReplicaId;

/// Errors loading or validating a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("cannot parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("replica {id} is not in the roster")]
    UnknownReplica { id: u64 },
}

/// One roster entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeerEntry {
    pub id: u64,
    pub addr: SocketAddr,
}

/// Replica configuration, loaded from a JSON file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    /// This replica's id.
    pub id: u64,

    /// Safety-rules selector. The historical `"hotsutff"` spelling is
    /// accepted; anything else also selects chained HotStuff.
    #[serde(default = "default_algorithm")]
    pub algorithm: String,

    /// The full roster, including this replica.
    pub peers: Vec<PeerEntry>,

    /// Replicas configured as Byzantine.
    #[serde(default)]
    pub byzantine: Vec<u64>,

    #[serde(default = "default_vote_signing_delay_ms")]
    pub vote_signing_delay_ms: u64,

    #[serde(default = "default_block_seal_delay_ms")]
    pub block_seal_delay_ms: u64,

    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

fn default_algorithm() -> String {
    "hotstuff".to_string()
}

fn default_vote_signing_delay_ms() -> u64 {
    20
}

fn default_block_seal_delay_ms() -> u64 {
    50
}

fn default_batch_size() -> usize {
    128
}

impl NodeConfig {
    /// Load from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// The consensus-level view of this configuration.
    pub fn consensus(&self) -> ConsensusConfig {
        ConsensusConfig {
            replicas: self.peers.len() as u64,
            byzantine: self.byzantine.iter().map(|&id| ReplicaId(id)).collect::<BTreeSet<_>>(),
            vote_signing_delay: Duration::from_millis(self.vote_signing_delay_ms),
            block_seal_delay: Duration::from_millis(self.block_seal_delay_ms),
        }
    }

    /// The local listen address from the roster.
    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.peers
            .iter()
            .find(|peer| peer.id == self.id)
            .map(|peer| peer.addr)
            .ok_or(ConfigError::UnknownReplica { id: self.id })
    }

    /// Addresses of every other replica.
    pub fn peer_addrs(&self) -> HashMap<ReplicaId, SocketAddr> {
        self.peers
            .iter()
            .filter(|peer| peer.id != self.id)
            .map(|peer| (ReplicaId(peer.id), peer.addr))
            .collect()
    }
}
