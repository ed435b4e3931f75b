//! Production runner with async I/O.
//!
//! Wraps the deterministic replica state machine with real I/O:
//!
//! - TCP transport with length-prefixed, self-describing binary frames
//! - Bounded per-kind inbound queues feeding a single event loop
//! - Signing delays realized as tokio sleep tasks
//!
//! # Architecture
//!
//! Uses the event aggregator pattern: a single task owns the state machine
//! and receives events via channels, so there is no mutex contention on
//! replication state.
//!
//! ```text
//! network reader tasks ─▶ router (stale-view filter) ─▶ per-kind queues ─┐
//!                                                                        ▼
//!                      delay tasks ──▶ callback queue ──▶ event loop ─▶ actions
//!                                                                        │
//!                              peer writer tasks ◀── send / broadcast ◀──┘
//! ```
//!
//! The router drops messages older than the replica's published current
//! view before they reach a queue; the per-kind queues for blocks, votes,
//! and certificates have capacity 1, so a flooded handler exerts
//! backpressure instead of buffering stale traffic.

mod codec;
mod config;
mod delays;
mod network;
mod runner;

pub use codec::{decode_message, encode_message, read_frame, write_frame, CodecError, WIRE_VERSION};
pub use config::{ConfigError, NodeConfig, PeerEntry};
pub use delays::DelayPool;
pub use network::Network;
pub use runner::{ProductionRunner, RunnerError};
