//! Deterministic multi-replica simulation.
//!
//! Runs a roster of replicas against a simulated network in virtual time.
//! All execution is synchronous: events drain from a globally ordered queue
//! (time, then priority, then replica, then sequence number), message
//! latency and loss come from a seeded RNG, and the configured signing
//! delays become scheduled callback events. Given the same seed, a run
//! produces identical results every time.

mod event_queue;
mod network;
mod runner;

pub use event_queue::EventKey;
pub use network::{SimNetworkConfig, SimulatedNetwork};
pub use runner::{SimulationRunner, SimulationStats};
