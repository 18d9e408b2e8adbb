//! OS media-session bridge trait and supporting types.
//!
//! The media-session surface is the operating system's lock-screen /
//! notification / car-display transport UI. Publishing to it is one-way and
//! fire-and-forget: the OS caches whatever was last published. Commands flow
//! back inbound through an installed [`RemoteCommandHandler`].
//!
//! The surface is a progressive enhancement. Hosts without one (plain desktop
//! builds, embedded webviews with the API disabled) report
//! [`MediaSessionSurface::is_available`] as `false` and the core degrades to
//! a no-op — absence is never an error.

use crate::platform::PlatformSendSync;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Track metadata published to the OS transport UI.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SessionMetadata {
    /// Display title.
    pub title: String,
    /// Display artist string.
    pub artist: String,
    /// Album or collection name, when known.
    pub album: Option<String>,
    /// Artwork URL for the lock-screen tile.
    pub artwork_url: Option<String>,
    /// Track duration, when known.
    pub duration: Option<Duration>,
}

/// Playback state as reported to the OS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPlaybackState {
    Playing,
    Paused,
    /// Nothing is loaded; the OS may hide the transport UI.
    None,
}

/// Position state published for the OS progress bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SessionPosition {
    /// Total duration of the current track.
    pub duration: Duration,
    /// Current position, clamped to `duration`.
    pub position: Duration,
    /// Playback rate (1.0 for normal speed).
    pub playback_rate: f64,
}

impl SessionPosition {
    /// Build a position state at normal playback rate, clamping the position
    /// so it never exceeds the duration (some OS surfaces reject that).
    pub fn new(duration: Duration, position: Duration) -> Self {
        Self {
            duration,
            position: position.min(duration),
            playback_rate: 1.0,
        }
    }
}

/// Transport commands the OS can send back to the application.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RemoteCommand {
    Play,
    Pause,
    NextTrack,
    PreviousTrack,
    /// Seek to an absolute position.
    SeekTo(Duration),
}

/// Receiver for inbound OS transport commands.
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
pub trait RemoteCommandHandler: PlatformSendSync {
    /// Handle one transport command from the OS.
    async fn handle_command(&self, command: RemoteCommand);
}

/// Trait for the platform's media-session surface.
///
/// All publish methods are fire-and-forget; implementations swallow platform
/// errors (a failed lock-screen update must never disturb playback).
pub trait MediaSessionSurface: PlatformSendSync {
    /// Feature detection. When `false`, callers must not expect any publish
    /// or command delivery to have an effect.
    fn is_available(&self) -> bool {
        true
    }

    /// Publish track metadata.
    fn publish_metadata(&self, metadata: &SessionMetadata);

    /// Publish the current playback state.
    fn publish_playback_state(&self, state: SessionPlaybackState);

    /// Publish position state for the OS progress bar.
    fn publish_position(&self, position: &SessionPosition);

    /// Install the receiver for inbound commands. Replaces any previously
    /// installed handler.
    fn install_command_handler(&self, handler: Arc<dyn RemoteCommandHandler>);

    /// Remove the installed command handler, if any.
    fn clear_command_handler(&self);
}
