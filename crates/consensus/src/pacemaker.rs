//! View progression.

use tracing::debug;
use trichain_types::View;

/// Tracks the current view and hands out entering-view notifications.
///
/// `cur_view` is monotone: only a certificate of view `>= cur_view` advances
/// it, to `qc.view + 1`. The pending slot holds the latest entered view not
/// yet consumed; a second advance before the consumer picks the first one up
/// overwrites it, coalescing the notifications - only the latest view
/// matters for liveness.
#[derive(Debug, Default)]
pub struct Pacemaker {
    cur_view: View,
    pending: Option<View>,
}

impl Pacemaker {
    pub fn new() -> Self {
        Pacemaker::default()
    }

    /// The current view.
    pub fn cur_view(&self) -> View {
        self.cur_view
    }

    /// Advance past the view certified by `view`. No-op (returns false) when
    /// `view` is behind the current view.
    pub fn advance_view(&mut self, view: View) -> bool {
        if view < self.cur_view {
            return false;
        }
        self.cur_view = view.next();
        self.pending = Some(self.cur_view);
        debug!(view = %self.cur_view, "advanced to view");
        true
    }

    /// Take the latest entered view, if one is pending.
    pub fn take_entering_view(&mut self) -> Option<View> {
        self.pending.take()
    }
}
