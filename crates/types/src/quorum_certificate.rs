//! Quorum certificates.

use crate::{AggregateSignature, BlockId, View};
use serde::{Deserialize, Serialize};

/// Proof that a super-majority voted for a block in a given view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuorumCertificate {
    /// View the certified block was proposed in.
    pub view: View,
    /// The certified block.
    pub block_id: BlockId,
    /// Aggregated signatures of the voting quorum.
    pub agg_sig: AggregateSignature,
}

impl QuorumCertificate {
    /// The certificate carried by the first proposal, before any block has
    /// been certified.
    pub fn genesis() -> Self {
        QuorumCertificate {
            view: View(0),
            block_id: BlockId::ZERO,
            agg_sig: AggregateSignature::default(),
        }
    }

    /// Whether this is the pre-consensus genesis certificate.
    pub fn is_genesis(&self) -> bool {
        self.view == View(0) && self.block_id == BlockId::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn genesis_certificate_shape() {
        let qc = QuorumCertificate::genesis();
        assert!(qc.is_genesis());
        assert_eq!(qc.view, View(0));
        assert!(qc.agg_sig.is_empty());
    }
}
