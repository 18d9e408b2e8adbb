//! # Interruption Guard
//!
//! Pauses playback when the platform takes audio focus away (phone call,
//! system notification, output device loss) and resumes it once focus
//! returns. Resuming waits a short stabilization delay and retries exactly
//! once before giving up — audio routing right after a call ends is flaky on
//! mobile platforms.

use crate::adapter::PlayerAdapter;
use crate::config::ResumeConfig;
use crate::store::PlaybackStore;
use bridge_traits::lifecycle::{InterruptionEvent, InterruptionReason, LifecycleEvents};
use bridge_traits::scheduler::{OneShotTask, TaskScheduler};
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use tracing::{debug, info};

#[derive(Default)]
struct InterruptionState {
    /// Playback was running when focus was lost and should resume.
    was_playing: bool,
    reason: Option<InterruptionReason>,
}

/// Pause-and-resume handling for audio-focus interruptions.
pub struct InterruptionGuard {
    store: Arc<PlaybackStore>,
    adapter: Arc<PlayerAdapter>,
    scheduler: Arc<dyn TaskScheduler>,
    config: ResumeConfig,
    weak_self: Weak<InterruptionGuard>,
    state: Mutex<InterruptionState>,
}

impl InterruptionGuard {
    pub fn new(
        store: Arc<PlaybackStore>,
        adapter: Arc<PlayerAdapter>,
        scheduler: Arc<dyn TaskScheduler>,
        config: ResumeConfig,
    ) -> Arc<Self> {
        Arc::new_cyclic(|weak| Self {
            store,
            adapter,
            scheduler,
            config,
            weak_self: weak.clone(),
            state: Mutex::new(InterruptionState::default()),
        })
    }

    /// Register the guard's callback on the platform event source.
    pub fn attach(&self, events: &dyn LifecycleEvents) {
        let Some(this) = self.weak_self.upgrade() else {
            return;
        };
        events.on_interruption(Box::new(move |event| this.handle(event)));
    }

    /// `true` while an interruption is active and playback should resume
    /// when it ends.
    pub fn resume_pending(&self) -> bool {
        self.state.lock().was_playing
    }

    fn handle(&self, event: InterruptionEvent) {
        match event {
            InterruptionEvent::Began(reason) => self.handle_began(reason),
            InterruptionEvent::Ended => self.handle_ended(),
        }
    }

    fn handle_began(&self, reason: InterruptionReason) {
        let intent = self.store.snapshot();
        let hardware = self.adapter.snapshot();
        if !intent.playing || hardware.is_paused {
            return;
        }
        info!(?reason, "audio focus lost; pausing playback");
        self.adapter.pause();
        self.store.set_playing_intended(false);
        let mut state = self.state.lock();
        state.was_playing = true;
        state.reason = Some(reason);
    }

    fn handle_ended(&self) {
        let (was_playing, reason) = {
            let mut state = self.state.lock();
            let was_playing = state.was_playing;
            state.was_playing = false;
            (was_playing, state.reason.take())
        };
        if !was_playing {
            return;
        }
        info!(?reason, "audio focus regained; scheduling resume");
        // A system-level resume implies consent for autoplay purposes.
        self.store.mark_user_interacted();

        let Some(this) = self.weak_self.upgrade() else {
            return;
        };
        let task: OneShotTask = Box::new(move || {
            Box::pin(async move { this.resume_after_interruption().await })
        });
        let _ = self.scheduler.schedule_once(self.config.resume_delay, task);
    }

    async fn resume_after_interruption(&self) {
        match self.adapter.play().await {
            Ok(()) => self.store.set_playing_intended(true),
            Err(err) => {
                debug!(error = %err, "resume after interruption failed; retrying once");
                let Some(this) = self.weak_self.upgrade() else {
                    return;
                };
                let task: OneShotTask = Box::new(move || {
                    Box::pin(async move {
                        match this.adapter.play().await {
                            Ok(()) => this.store.set_playing_intended(true),
                            Err(err) => {
                                debug!(error = %err, "resume retry failed; leaving playback paused");
                            }
                        }
                    })
                });
                let _ = self
                    .scheduler
                    .schedule_once(self.config.resume_retry_delay, task);
            }
        }
    }
}
