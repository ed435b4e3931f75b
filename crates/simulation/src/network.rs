//! Simulated network with deterministic latency, packet loss, and partitions.

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use std::collections::HashSet;
use std::time::Duration;
use trichain_types::ReplicaId;

/// Configuration for the simulated network.
#[derive(Debug, Clone)]
pub struct SimNetworkConfig {
    /// Base one-way latency between replicas.
    pub latency: Duration,
    /// Jitter as a fraction of base latency (0.0 - 1.0).
    pub jitter_fraction: f64,
    /// Packet loss rate (0.0 - 1.0).
    pub packet_loss_rate: f64,
}

impl Default for SimNetworkConfig {
    fn default() -> Self {
        SimNetworkConfig {
            latency: Duration::from_millis(10),
            jitter_fraction: 0.1,
            packet_loss_rate: 0.0,
        }
    }
}

/// Deterministic message delivery decisions.
///
/// Partitions are directional: `(a, b)` in the set drops messages from `a`
/// to `b` only.
#[derive(Debug)]
pub struct SimulatedNetwork {
    config: SimNetworkConfig,
    partitions: HashSet<(ReplicaId, ReplicaId)>,
}

impl SimulatedNetwork {
    pub fn new(config: SimNetworkConfig) -> Self {
        SimulatedNetwork {
            config,
            partitions: HashSet::new(),
        }
    }

    /// Whether messages from `from` to `to` are currently dropped.
    pub fn is_partitioned(&self, from: ReplicaId, to: ReplicaId) -> bool {
        self.partitions.contains(&(from, to))
    }

    /// Drop all traffic between `a` and `b`, both directions.
    pub fn partition_bidirectional(&mut self, a: ReplicaId, b: ReplicaId) {
        self.partitions.insert((a, b));
        self.partitions.insert((b, a));
    }

    /// Restore full connectivity.
    pub fn heal_all(&mut self) {
        self.partitions.clear();
    }

    /// Decide delivery of one message. `None` means dropped; otherwise the
    /// sampled one-way latency.
    pub fn should_deliver(
        &self,
        from: ReplicaId,
        to: ReplicaId,
        rng: &mut ChaCha8Rng,
    ) -> Option<Duration> {
        if self.is_partitioned(from, to) {
            return None;
        }
        if self.config.packet_loss_rate > 0.0 && rng.gen::<f64>() < self.config.packet_loss_rate {
            return None;
        }
        Some(self.sample_latency(rng))
    }

    fn sample_latency(&self, rng: &mut ChaCha8Rng) -> Duration {
        let base = self.config.latency.as_secs_f64();
        let jitter_range = base * self.config.jitter_fraction;
        let jitter = if jitter_range > 0.0 {
            rng.gen_range(-jitter_range..jitter_range)
        } else {
            0.0
        };
        Duration::from_secs_f64((base + jitter).max(0.000_1))
    }
}
