//! Leader rotation.

use trichain_types::{ReplicaId, View};

/// Round-robin leader election over a fixed ordered roster `0..n`.
#[derive(Debug, Clone, Copy)]
pub struct RoundRobin {
    replicas: u64,
}

impl RoundRobin {
    pub fn new(replicas: u64) -> Self {
        assert!(replicas > 0, "empty roster");
        RoundRobin { replicas }
    }

    /// The leader for `view`: `view mod n`.
    pub fn leader_for(&self, view: View) -> ReplicaId {
        ReplicaId(view.0 % self.replicas)
    }

    /// Whether `id` leads `view`.
    pub fn is_leader(&self, id: ReplicaId, view: View) -> bool {
        self.leader_for(view) == id
    }
}
