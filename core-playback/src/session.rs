//! # Media-Session Bridge
//!
//! Keeps the OS transport surface (lock screen, notification shade, CarPlay)
//! in sync with the playback store, and turns inbound OS commands into store
//! mutations plus hardware attempts.
//!
//! Position publishes are throttled: OS surfaces only need coarse progress
//! and flooding the IPC channel starves other messages. Seeks and visibility
//! transitions bypass the throttle so the progress bar never shows stale
//! data right after a jump.
//!
//! A remote `NextTrack` frequently arrives before the new source finished
//! loading, so the immediate `play()` can fail with a transient fault. The
//! bridge schedules exactly one deferred retry for that case; anything still
//! wrong afterwards is the reconciler's job.

use crate::adapter::PlayerAdapter;
use crate::config::SessionConfig;
use crate::store::{PlaybackStore, PreviousAction, StoreObserver, TrackRef};
use bridge_traits::player::HardwareSnapshot;
use bridge_traits::scheduler::{OneShotTask, TaskScheduler};
use bridge_traits::session::{
    MediaSessionSurface, RemoteCommand, RemoteCommandHandler, SessionMetadata,
    SessionPlaybackState, SessionPosition,
};
use bridge_traits::time::Clock;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Bridge between the playback core and the OS media-session surface.
pub struct MediaSessionBridge {
    surface: Arc<dyn MediaSessionSurface>,
    store: Arc<PlaybackStore>,
    adapter: Arc<PlayerAdapter>,
    scheduler: Arc<dyn TaskScheduler>,
    clock: Arc<dyn Clock>,
    config: SessionConfig,
    /// Feature detection result; when `false` every operation is a no-op.
    enabled: bool,
    last_position_publish: Mutex<Option<DateTime<Utc>>>,
}

impl MediaSessionBridge {
    pub fn new(
        surface: Arc<dyn MediaSessionSurface>,
        store: Arc<PlaybackStore>,
        adapter: Arc<PlayerAdapter>,
        scheduler: Arc<dyn TaskScheduler>,
        clock: Arc<dyn Clock>,
        config: SessionConfig,
    ) -> Self {
        let enabled = surface.is_available();
        if !enabled {
            debug!("media session surface unavailable; bridge runs disabled");
        }
        Self {
            surface,
            store,
            adapter,
            scheduler,
            clock,
            config,
            enabled,
            last_position_publish: Mutex::new(None),
        }
    }

    /// Whether the OS surface was detected at construction.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Publish track metadata, or clear the surface when no track is loaded.
    pub fn publish_track(&self, track: Option<&TrackRef>) {
        if !self.enabled {
            return;
        }
        match track {
            Some(track) => {
                let metadata = SessionMetadata {
                    title: track.title.clone(),
                    artist: track.artist.clone(),
                    album: track.album.clone(),
                    artwork_url: track.artwork_url.clone(),
                    duration: track.duration,
                };
                self.surface.publish_metadata(&metadata);
            }
            None => self.surface.publish_playback_state(SessionPlaybackState::None),
        }
    }

    /// Publish the playing/paused state.
    pub fn publish_playback_state(&self, playing: bool) {
        if !self.enabled {
            return;
        }
        let state = if playing {
            SessionPlaybackState::Playing
        } else {
            SessionPlaybackState::Paused
        };
        self.surface.publish_playback_state(state);
    }

    /// Publish position state, throttled unless `force` is set. Skipped when
    /// the hardware has no usable duration yet.
    pub fn publish_position(&self, snapshot: &HardwareSnapshot, force: bool) {
        if !self.enabled {
            return;
        }
        let duration = match snapshot.duration {
            Some(duration) if duration > Duration::ZERO => duration,
            _ => return,
        };

        let now = self.clock.now();
        {
            let mut last = self.last_position_publish.lock();
            if !force {
                if let Some(previous) = *last {
                    let elapsed = now.signed_duration_since(previous).num_milliseconds();
                    if elapsed >= 0
                        && (elapsed as u128) < self.config.position_publish_interval.as_millis()
                    {
                        return;
                    }
                }
            }
            *last = Some(now);
        }
        self.surface
            .publish_position(&SessionPosition::new(duration, snapshot.position));
    }

    /// Attempt playback, scheduling one deferred retry for transient faults.
    ///
    /// Used for inbound OS commands, which race against source loading.
    async fn play_with_deferred_retry(&self) {
        match self.adapter.play().await {
            Ok(()) => {}
            Err(err) if err.is_transient() || err.is_benign() => {
                debug!(error = %err, "remote play attempt failed; scheduling one deferred retry");
                let adapter = Arc::clone(&self.adapter);
                let retry: OneShotTask = Box::new(move || {
                    Box::pin(async move {
                        if let Err(err) = adapter.play().await {
                            debug!(error = %err, "deferred remote play retry failed");
                        }
                    })
                });
                // The handle is dropped on purpose: the retry is detached and
                // must run even if the command handler is torn down.
                let _ = self
                    .scheduler
                    .schedule_once(self.config.command_retry_delay, retry);
            }
            Err(err) => {
                warn!(error = %err, "remote play attempt failed; downgrading intent");
                self.store.set_playing_intended(false);
            }
        }
    }

    /// Re-attempt playback once if the store intends playing but the
    /// hardware sits paused (used after seeks and restarts).
    async fn ensure_playing(&self) {
        if self.store.snapshot().playing && self.adapter.snapshot().is_paused {
            if let Err(err) = self.adapter.play().await {
                debug!(error = %err, "post-seek play attempt failed");
            }
        }
    }
}

impl StoreObserver for MediaSessionBridge {
    fn track_changed(&self, track: Option<&TrackRef>) {
        self.publish_track(track);
    }

    fn play_intent_changed(&self, playing: bool) {
        self.publish_playback_state(playing);
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
impl RemoteCommandHandler for MediaSessionBridge {
    async fn handle_command(&self, command: RemoteCommand) {
        debug!(?command, "remote command received");
        // OS-level remote control implies consent for autoplay purposes.
        self.store.mark_user_interacted();

        match command {
            RemoteCommand::Play => {
                self.store.set_playing_intended(true);
                self.play_with_deferred_retry().await;
            }
            RemoteCommand::Pause => {
                self.store.set_playing_intended(false);
                self.adapter.pause();
            }
            RemoteCommand::NextTrack => {
                if self.store.advance_next().is_some() {
                    self.play_with_deferred_retry().await;
                }
            }
            RemoteCommand::PreviousTrack => {
                let position = self.adapter.snapshot().position;
                match self.store.advance_previous(position) {
                    PreviousAction::Restart => {
                        self.adapter.seek(Duration::ZERO);
                        self.store.set_position(Duration::ZERO);
                        self.ensure_playing().await;
                    }
                    PreviousAction::Switched(_) => self.play_with_deferred_retry().await,
                    PreviousAction::NoQueue => {}
                }
            }
            RemoteCommand::SeekTo(position) => {
                self.adapter.seek(position);
                let snapshot = self.adapter.snapshot();
                self.store.set_position(snapshot.position);
                self.publish_position(&snapshot, true);
                self.ensure_playing().await;
            }
        }
    }
}
