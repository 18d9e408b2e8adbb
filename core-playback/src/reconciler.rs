//! # Playback Reconciler
//!
//! Detects and corrects mismatches between the intended play state and what
//! the hardware is really doing. Mobile platforms deliver unreliable
//! suspend/resume signals: after a lock-screen unlock the audio element may
//! sit paused while the store still intends playback, or keep playing while
//! the store was downgraded by a missed event.
//!
//! ## State machine
//!
//! ```text
//!            lifecycle trigger            timer fires
//!   Idle ────────────────────► PendingCheck ─────────► Idle (states match)
//!    ▲                            │    ▲                │
//!    │                            │    └── new trigger  ▼
//!    └────── single correction ◄──┴──── (debounce)   Correcting
//! ```
//!
//! A trigger arriving while a check is pending cancels the outstanding timer
//! and restarts it — debounce, not a queue. This is what prevents "flicker":
//! several lifecycle events firing in quick succession produce exactly one
//! check, after one settle delay, and at most one corrective action per
//! settle window. The correction is deliberately single-shot; looping
//! re-sync is the bug this design exists to avoid.
//!
//! A separate low-frequency poll feeds the stall detector (CarPlay sometimes
//! wedges the element with `paused == false` but a frozen position). The
//! poll drives only the stall path, never the general check.

use crate::adapter::PlayerAdapter;
use crate::config::ReconcilerConfig;
use crate::session::MediaSessionBridge;
use crate::store::PlaybackStore;
use bridge_traits::scheduler::{OneShotTask, RepeatingTask, ScheduleHandle, TaskScheduler};
use bridge_traits::time::Clock;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tracing::{debug, info, warn};

/// What woke the reconciler up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileTrigger {
    /// App came back to the foreground (lock-screen dismissal, tab switch).
    VisibilityChange,
    /// Window focus moved.
    FocusChange,
    /// The stall-detection poll.
    PeriodicPoll,
    /// Audio output device changed (CarPlay or Bluetooth route).
    DeviceChange,
}

/// Reconciler state machine phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcilerPhase {
    Idle,
    /// A check is scheduled but has not run yet.
    PendingCheck,
    /// A corrective action is in flight.
    Correcting,
}

/// Ephemeral record of a detected mismatch. Drives logging and damping; never
/// persisted.
#[derive(Debug, Clone)]
pub struct ReconciliationEvent {
    pub detected_at: DateTime<Utc>,
    pub intended_playing: bool,
    pub actual_playing: bool,
    pub trigger: ReconcileTrigger,
}

struct ReconcilerState {
    phase: ReconcilerPhase,
    /// Handle for the scheduled settle check. Clear-then-set: a new trigger
    /// cancels this before scheduling its replacement.
    pending: Option<Box<dyn ScheduleHandle>>,
    stall_strikes: u32,
    stall_last_position: Option<Duration>,
    stall_handle: Option<Box<dyn ScheduleHandle>>,
}

/// The reconciliation engine.
pub struct Reconciler {
    store: Arc<PlaybackStore>,
    adapter: Arc<PlayerAdapter>,
    session: Arc<MediaSessionBridge>,
    scheduler: Arc<dyn TaskScheduler>,
    clock: Arc<dyn Clock>,
    config: ReconcilerConfig,
    weak_self: Weak<Reconciler>,
    state: Mutex<ReconcilerState>,
}

impl Reconciler {
    pub fn new(
        store: Arc<PlaybackStore>,
        adapter: Arc<PlayerAdapter>,
        session: Arc<MediaSessionBridge>,
        scheduler: Arc<dyn TaskScheduler>,
        clock: Arc<dyn Clock>,
        config: ReconcilerConfig,
    ) -> Arc<Self> {
        Arc::new_cyclic(|weak| Self {
            store,
            adapter,
            session,
            scheduler,
            clock,
            config,
            weak_self: weak.clone(),
            state: Mutex::new(ReconcilerState {
                phase: ReconcilerPhase::Idle,
                pending: None,
                stall_strikes: 0,
                stall_last_position: None,
                stall_handle: None,
            }),
        })
    }

    /// Current state machine phase.
    pub fn phase(&self) -> ReconcilerPhase {
        self.state.lock().phase
    }

    /// Request a reconciliation check after the settle delay.
    ///
    /// A request arriving while a check is pending supersedes it: the
    /// outstanding timer is cancelled and restarted.
    pub fn request_check(&self, trigger: ReconcileTrigger) {
        let Some(this) = self.weak_self.upgrade() else {
            return;
        };
        let mut state = self.state.lock();
        if let Some(handle) = state.pending.take() {
            handle.cancel();
            debug!(?trigger, "superseding pending reconciliation check");
        }
        state.phase = ReconcilerPhase::PendingCheck;
        let task: OneShotTask = Box::new(move || {
            Box::pin(async move { this.run_check(trigger).await })
        });
        state.pending = Some(self.scheduler.schedule_once(self.config.settle_delay, task));
    }

    /// Start the stall-detection poll. Idempotent.
    pub fn start_stall_monitor(&self) {
        let Some(this) = self.weak_self.upgrade() else {
            return;
        };
        let mut state = self.state.lock();
        if state.stall_handle.is_some() {
            return;
        }
        let task: RepeatingTask = Arc::new(move || {
            let this = Arc::clone(&this);
            Box::pin(async move { this.run_stall_poll().await })
        });
        state.stall_handle = Some(
            self.scheduler
                .schedule_repeating(self.config.stall_poll_interval, task),
        );
    }

    /// Stop the stall-detection poll.
    pub fn stop_stall_monitor(&self) {
        if let Some(handle) = self.state.lock().stall_handle.take() {
            handle.cancel();
        }
    }

    /// Forget accumulated stall evidence. Called on output device changes,
    /// where a position freeze across the transition is expected.
    pub fn reset_stall_tracking(&self) {
        let mut state = self.state.lock();
        state.stall_strikes = 0;
        state.stall_last_position = None;
    }

    /// The scheduled settle check.
    async fn run_check(&self, trigger: ReconcileTrigger) {
        {
            let mut state = self.state.lock();
            if state.phase != ReconcilerPhase::PendingCheck {
                return;
            }
            state.pending = None;
        }

        // Always re-read fresh state: nothing from before the settle delay
        // can be trusted.
        let intent = self.store.snapshot();
        let snapshot = self.adapter.snapshot();
        let actually_playing = snapshot.actually_playing();

        let event = ReconciliationEvent {
            detected_at: self.clock.now(),
            intended_playing: intent.playing,
            actual_playing: actually_playing,
            trigger,
        };

        if actually_playing == intent.playing {
            self.state.lock().phase = ReconcilerPhase::Idle;
            debug!(?trigger, playing = actually_playing, "reconciliation check found no mismatch");
            return;
        }

        self.state.lock().phase = ReconcilerPhase::Correcting;
        info!(?event, "playback state mismatch; applying single correction");

        if intent.playing && snapshot.has_ended {
            // The track finished while we were away; nothing to resume.
            self.store.set_playing_intended(false);
        } else if intent.playing && !actually_playing {
            match self.adapter.play().await {
                Ok(()) => {
                    // Intent was already right; tell the OS the truth.
                    self.session.publish_playback_state(true);
                }
                Err(err) if err.is_benign() => {
                    debug!(error = %err, "corrective play superseded; leaving state for next trigger");
                }
                Err(err) => {
                    warn!(error = %err, "corrective play failed; downgrading intent to paused");
                    if err.is_autoplay_block() {
                        self.store.set_needs_user_interaction(true);
                    } else if err.is_transient() {
                        self.store.set_last_error(Some(err.clone()));
                    }
                    self.store.set_playing_intended(false);
                }
            }
        } else {
            // Intent says paused but the hardware kept playing.
            self.adapter.pause();
            self.session.publish_playback_state(false);
        }

        self.state.lock().phase = ReconcilerPhase::Idle;
    }

    /// One tick of the stall-detection poll.
    async fn run_stall_poll(&self) {
        // The poll never competes with a scheduled check or a correction.
        if self.state.lock().phase != ReconcilerPhase::Idle {
            return;
        }

        let intent = self.store.snapshot();
        if !intent.playing {
            self.reset_stall_tracking();
            return;
        }

        let snapshot = self.adapter.snapshot();
        if snapshot.is_paused || snapshot.has_ended {
            // Paused-but-intended-playing is the settle check's business.
            self.reset_stall_tracking();
            return;
        }

        let stalled = {
            let mut state = self.state.lock();
            match state.stall_last_position {
                Some(last) if abs_delta(last, snapshot.position) < self.config.stall_epsilon => {
                    state.stall_strikes += 1;
                }
                _ => state.stall_strikes = 0,
            }
            state.stall_last_position = Some(snapshot.position);
            if state.stall_strikes >= self.config.stall_strikes {
                // Reset before recovery runs, whatever its outcome.
                state.stall_strikes = 0;
                state.stall_last_position = None;
                state.phase = ReconcilerPhase::Correcting;
                true
            } else {
                false
            }
        };
        if !stalled {
            return;
        }

        warn!(
            trigger = ?ReconcileTrigger::PeriodicPoll,
            position = ?snapshot.position,
            "playback position stalled; attempting pause/seek/play recovery"
        );
        self.adapter.pause();
        self.adapter.seek(snapshot.position);
        match self.adapter.play().await {
            Ok(()) => {
                info!("stall recovery succeeded");
                self.session.publish_playback_state(true);
            }
            Err(err) => {
                warn!(error = %err, "stall recovery failed; downgrading intent to paused");
                self.store.set_playing_intended(false);
            }
        }
        self.state.lock().phase = ReconcilerPhase::Idle;
    }
}

fn abs_delta(a: Duration, b: Duration) -> Duration {
    if a > b {
        a - b
    } else {
        b - a
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abs_delta_is_symmetric() {
        let a = Duration::from_millis(1500);
        let b = Duration::from_millis(1420);
        assert_eq!(abs_delta(a, b), Duration::from_millis(80));
        assert_eq!(abs_delta(b, a), Duration::from_millis(80));
    }
}
