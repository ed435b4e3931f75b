//! Placeholder signatures.
//!
//! Real signature aggregation is future work; these carry the shape of the
//! real thing (per-voter signature bytes, voter-indexed aggregation) so the
//! rest of the system is written against the final contract.

use crate::{BlockId, ReplicaId};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;

/// A single replica's signature over a block id.
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature(pub [u8; 32]);

impl Signature {
    /// The all-zero signature.
    pub fn zero() -> Self {
        Signature([0u8; 32])
    }

    /// Deterministic placeholder signature binding a signer to a block id.
    pub fn sign(signer: ReplicaId, block_id: &BlockId) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(b"trichain.sig.v1");
        hasher.update(signer.0.to_le_bytes());
        hasher.update(block_id.as_bytes());
        Signature(hasher.finalize().into())
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sig:{}", hex::encode(&self.0[..4]))
    }
}

/// Aggregated signatures of a voting quorum, indexed by voter.
///
/// The map keeps voters in a canonical order so encoded certificates are
/// byte-stable across replicas.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateSignature(BTreeMap<ReplicaId, Signature>);

impl AggregateSignature {
    /// Record a voter's signature. Idempotent per voter.
    pub fn insert(&mut self, voter: ReplicaId, signature: Signature) {
        self.0.entry(voter).or_insert(signature);
    }

    /// Number of distinct signers.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when no signer has been recorded.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether `voter` contributed to this aggregate.
    pub fn contains(&self, voter: &ReplicaId) -> bool {
        self.0.contains_key(voter)
    }

    /// Iterate over the contributing voters in canonical order.
    pub fn signers(&self) -> impl Iterator<Item = &ReplicaId> {
        self.0.keys()
    }
}
