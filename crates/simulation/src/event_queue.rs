//! Deterministic event ordering.

use std::time::Duration;
use trichain_core::{Event, EventPriority};
use trichain_types::ReplicaId;

/// Ordering key for queued events.
///
/// Events sort by delivery time, then priority (internal consequences
/// before new external input), then receiving replica, then insertion
/// sequence. The sequence number makes every key unique, so a `BTreeMap`
/// works as the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct EventKey {
    pub time: Duration,
    pub priority: EventPriority,
    pub replica: ReplicaId,
    pub seq: u64,
}

impl EventKey {
    pub fn new(time: Duration, event: &Event, replica: ReplicaId, seq: u64) -> Self {
        EventKey {
            time,
            priority: event.priority(),
            replica,
            seq,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trichain_types::View;

    #[test]
    fn orders_by_time_then_priority() {
        let internal = Event::EnteringView { view: View(1) };
        let network = Event::QcReceived {
            qc: trichain_types::QuorumCertificate::genesis(),
        };

        let early = EventKey::new(Duration::from_millis(1), &network, ReplicaId(0), 2);
        let late = EventKey::new(Duration::from_millis(2), &internal, ReplicaId(0), 1);
        assert!(early < late);

        let a = EventKey::new(Duration::from_millis(5), &internal, ReplicaId(0), 4);
        let b = EventKey::new(Duration::from_millis(5), &network, ReplicaId(0), 3);
        assert!(a < b, "internal events drain before network events");
    }
}
