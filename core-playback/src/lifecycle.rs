//! # Lifecycle Monitor
//!
//! Observes app visibility, window focus and audio route transitions, and
//! forwards a normalized trigger to the reconciler when a check is
//! warranted. The monitor never decides what corrective action to take.
//!
//! Going hidden is deliberately *not* a reason to touch playback: background
//! audio must keep playing through locks and tab switches. The monitor only
//! records the transition and refreshes the OS surface so the lock screen
//! shows accurate state while the app is away.

use crate::adapter::PlayerAdapter;
use crate::reconciler::{ReconcileTrigger, Reconciler};
use crate::session::MediaSessionBridge;
use bridge_traits::lifecycle::{
    FocusState, LifecycleEvents, OutputDeviceChange, VisibilityState,
};
use bridge_traits::time::Clock;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use tracing::{debug, info};

/// Normalizes platform lifecycle transitions into reconciliation triggers.
pub struct LifecycleMonitor {
    reconciler: Arc<Reconciler>,
    session: Arc<MediaSessionBridge>,
    adapter: Arc<PlayerAdapter>,
    clock: Arc<dyn Clock>,
    weak_self: Weak<LifecycleMonitor>,
    hidden_since: Mutex<Option<DateTime<Utc>>>,
}

impl LifecycleMonitor {
    pub fn new(
        reconciler: Arc<Reconciler>,
        session: Arc<MediaSessionBridge>,
        adapter: Arc<PlayerAdapter>,
        clock: Arc<dyn Clock>,
    ) -> Arc<Self> {
        Arc::new_cyclic(|weak| Self {
            reconciler,
            session,
            adapter,
            clock,
            weak_self: weak.clone(),
            hidden_since: Mutex::new(None),
        })
    }

    /// Register the monitor's callbacks on the platform event source.
    pub fn attach(&self, events: &dyn LifecycleEvents) {
        let Some(this) = self.weak_self.upgrade() else {
            return;
        };

        let monitor = Arc::clone(&this);
        events.on_visibility_change(Box::new(move |state| monitor.handle_visibility(state)));

        let monitor = Arc::clone(&this);
        events.on_focus_change(Box::new(move |state| monitor.handle_focus(state)));

        let monitor = this;
        events.on_output_device_change(Box::new(move |change| monitor.handle_device_change(change)));
    }

    /// Timestamp of the last transition to hidden, when the app is currently
    /// hidden.
    pub fn hidden_since(&self) -> Option<DateTime<Utc>> {
        *self.hidden_since.lock()
    }

    fn handle_visibility(&self, state: VisibilityState) {
        match state {
            VisibilityState::Hidden => {
                *self.hidden_since.lock() = Some(self.clock.now());
                // Refresh the OS surface so the lock screen renders fresh
                // state; playback itself is left alone.
                let snapshot = self.adapter.snapshot();
                self.session.publish_playback_state(snapshot.actually_playing());
                self.session.publish_position(&snapshot, true);
                debug!("app hidden; session surface refreshed, playback untouched");
            }
            VisibilityState::Visible => {
                if self.hidden_since.lock().take().is_some() {
                    debug!("app visible again; requesting reconciliation");
                    self.reconciler.request_check(ReconcileTrigger::VisibilityChange);
                }
            }
        }
    }

    fn handle_focus(&self, state: FocusState) {
        debug!(?state, "window focus changed; requesting reconciliation");
        self.reconciler.request_check(ReconcileTrigger::FocusChange);
    }

    fn handle_device_change(&self, change: OutputDeviceChange) {
        info!(device = ?change.device_id, "audio output device changed");
        // Position freezes across a route change are expected; old evidence
        // must not count toward a stall.
        self.reconciler.reset_stall_tracking();
        self.reconciler.request_check(ReconcileTrigger::DeviceChange);
    }
}
