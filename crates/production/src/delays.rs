//! Delegated-work delays.
//!
//! The state machine never sleeps; signing costs are modeled here. Each
//! delegated action becomes a spawned task that sleeps for the configured
//! delay and then feeds the callback event back into the event loop.

use std::time::Duration;
use tokio::sync::mpsc;
use tracing::trace;
use trichain_core::Event;

/// Spawns delay tasks that deliver callback events.
#[derive(Debug, Clone)]
pub struct DelayPool {
    callback_tx: mpsc::Sender<Event>,
}

impl DelayPool {
    /// Create a pool feeding `callback_tx`.
    pub fn new(callback_tx: mpsc::Sender<Event>) -> Self {
        DelayPool { callback_tx }
    }

    /// Deliver `event` after `delay`.
    pub fn schedule(&self, event: Event, delay: Duration) {
        let callback_tx = self.callback_tx.clone();
        tokio::spawn(async move {
            trace!(event = event.type_name(), ?delay, "delay task sleeping");
            tokio::time::sleep(delay).await;
            // The loop shutting down mid-sleep is fine.
            let _ = callback_tx.send(event).await;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trichain_types::View;

    #[tokio::test]
    async fn delivers_after_the_delay() {
        let (tx, mut rx) = mpsc::channel(4);
        let pool = DelayPool::new(tx);

        pool.schedule(
            Event::EnteringView { view: View(3) },
            Duration::from_millis(10),
        );

        let event = tokio::time::timeout(Duration::from_millis(200), rx.recv())
            .await
            .expect("timeout")
            .expect("channel closed");
        assert!(matches!(event, Event::EnteringView { view: View(3) }));
    }

    #[tokio::test]
    async fn preserves_order_for_staggered_delays() {
        let (tx, mut rx) = mpsc::channel(4);
        let pool = DelayPool::new(tx);

        pool.schedule(
            Event::EnteringView { view: View(2) },
            Duration::from_millis(50),
        );
        pool.schedule(
            Event::EnteringView { view: View(1) },
            Duration::from_millis(5),
        );

        let first = rx.recv().await.unwrap();
        assert!(matches!(first, Event::EnteringView { view: View(1) }));
        let second = rx.recv().await.unwrap();
        assert!(matches!(second, Event::EnteringView { view: View(2) }));
    }
}
