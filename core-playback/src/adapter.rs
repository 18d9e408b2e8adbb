//! # Player Adapter
//!
//! Thin wrapper translating intent changes into hardware calls and hardware
//! faults into the typed [`PlaybackError`] taxonomy. The adapter also guards
//! the two invariants the raw hardware cannot:
//!
//! - no play attempt before the session's first user gesture (autoplay
//!   policy; refusing here avoids a guaranteed platform rejection), and
//! - no insecure source URL on a secure host context (mixed content is a
//!   hard failure in browsers, not a retryable error, so `http://` is
//!   rewritten to `https://` before the hardware ever sees it).

use crate::error::{PlaybackError, Result};
use crate::store::{PlaybackStore, StoreObserver, TrackRef};
use bridge_traits::player::{HardwarePlayer, HardwareSnapshot};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Adapter over the platform's physical player.
pub struct PlayerAdapter {
    player: Arc<dyn HardwarePlayer>,
    store: Arc<PlaybackStore>,
    /// Whether the hosting page/app runs in a secure context.
    secure_context: bool,
}

impl PlayerAdapter {
    pub fn new(
        player: Arc<dyn HardwarePlayer>,
        store: Arc<PlaybackStore>,
        secure_context: bool,
    ) -> Self {
        Self {
            player,
            store,
            secure_context,
        }
    }

    /// Swap the hardware source, upgrading `http://` URLs on secure hosts.
    pub fn set_source(&self, url: &str) {
        if self.secure_context {
            if let Some(rest) = url.strip_prefix("http://") {
                let upgraded = format!("https://{rest}");
                warn!(
                    original = url,
                    upgraded = %upgraded,
                    "rewriting insecure audio URL for secure host context"
                );
                self.player.load_source(&upgraded);
                return;
            }
        }
        self.player.load_source(url);
    }

    /// Attempt to start or resume playback.
    ///
    /// Refuses with [`PlaybackError::UserInteractionRequired`] before the
    /// first recorded user gesture, without touching the hardware.
    pub async fn play(&self) -> Result<()> {
        if !self.store.snapshot().has_user_interacted {
            return Err(PlaybackError::UserInteractionRequired);
        }
        self.player.play().await.map_err(PlaybackError::from)
    }

    /// Pause playback. Always succeeds.
    pub fn pause(&self) {
        self.player.pause();
    }

    /// Seek to `position`, clamped to the known duration.
    pub fn seek(&self, position: Duration) {
        let clamped = match self.player.snapshot().duration {
            Some(duration) => position.min(duration),
            None => position,
        };
        self.player.seek(clamped);
    }

    /// Set the output volume after validating the normalized range.
    pub fn set_volume(&self, volume: f32) -> Result<()> {
        if !(0.0..=1.0).contains(&volume) {
            return Err(PlaybackError::InvalidVolume(volume));
        }
        self.player.set_volume(volume);
        self.store.set_volume(volume);
        Ok(())
    }

    /// Fresh read of the hardware flags. Never mutates anything.
    pub fn snapshot(&self) -> HardwareSnapshot {
        self.player.snapshot()
    }
}

impl StoreObserver for PlayerAdapter {
    fn track_changed(&self, track: Option<&TrackRef>) {
        if let Some(track) = track {
            self.set_source(&track.source_url);
        }
    }
}
