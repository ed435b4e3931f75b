//! Network messages for the replica protocol.

mod gossip;

pub use gossip::{BlockGossip, NetworkMessage, QcGossip, TransactionGossip, VoteGossip};
