//! Composite replica state machine.
//!
//! [`ReplicaNode`] wires the consensus core and the payload producer into a
//! single [`StateMachine`]: one owner for all replication state, driven one
//! event at a time by a runner. This is the serializer - everything that
//! touches the chain, the safety rules, or the producer flows through
//! `handle`.

mod replica_node;

pub use replica_node::ReplicaNode;
