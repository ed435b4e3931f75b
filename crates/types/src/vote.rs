//! Votes.

use crate::{BlockId, ReplicaId, Signature, View};
use serde::{Deserialize, Serialize};

/// A replica's vote for a block. An honest replica casts at most one vote
/// per view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub view: View,
    pub voter: ReplicaId,
    pub block_id: BlockId,
    pub signature: Signature,
}

impl Vote {
    /// Create a vote, signing the block id with the voter's placeholder key.
    pub fn new(view: View, voter: ReplicaId, block_id: BlockId) -> Self {
        Vote {
            view,
            voter,
            block_id,
            signature: Signature::sign(voter, &block_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vote_carries_voter_signature() {
        let id = BlockId::from_bytes(b"some block");
        let vote = Vote::new(View(3), ReplicaId(2), id);
        assert_eq!(vote.signature, Signature::sign(ReplicaId(2), &id));
    }
}
