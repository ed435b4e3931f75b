//! Core event/action model for the trichain replica.
//!
//! This crate provides the contract between the replica state machine and
//! its runners:
//!
//! - [`Event`]: all possible inputs to the state machine
//! - [`Action`]: all possible outputs from the state machine
//! - [`EventPriority`]: ordering for events at the same timestamp
//! - [`StateMachine`]: the trait runners drive
//!
//! # Architecture
//!
//! ```text
//! Events → StateMachine::handle() → Actions
//! ```
//!
//! The state machine is:
//! - **Synchronous**: no async, no `.await`
//! - **Deterministic**: same state + event = same actions
//! - **Pure-ish**: mutates self, but performs no I/O
//!
//! All I/O and timing live in the runners (simulation or production), which
//! deliver events, execute the returned actions, and convert action results
//! back into events. The configured processing delays (vote signing, block
//! sealing) are realized by runners between a delegated action and its
//! callback event, so the event loop never blocks inside a processor.

mod action;
mod event;
mod message;
mod traits;

pub use action::Action;
pub use event::{Event, EventPriority};
pub use message::OutboundMessage;
pub use traits::StateMachine;
