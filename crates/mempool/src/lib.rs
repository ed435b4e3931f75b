//! Transaction staging and payload building.
//!
//! The [`Producer`] is a plain synchronous staging area: all access is
//! serialized through the replica event loop, so no interior locking is
//! needed.

mod producer;

pub use producer::{Producer, DEFAULT_BATCH_SIZE};
