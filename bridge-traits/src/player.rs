//! Hardware player bridge trait and supporting types.
//!
//! The hardware player is the physical media-rendering primitive owned by the
//! host platform: an HTML audio element on the web, an `AVPlayer` on iOS, an
//! ExoPlayer instance inside an Android WebView shell. The core never touches
//! the primitive directly; it drives this trait and receives raw events back
//! through [`PlayerEventHandler`].
//!
//! One player instance is created at application start and persists across
//! track changes — only the source URL is swapped.

use crate::platform::PlatformSendSync;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Reasons the hardware can reject a playback request.
///
/// The variants mirror the rejection classes observed from real media
/// backends: autoplay-policy refusals, unsupported sources, transport and
/// codec failures, and requests superseded by a newer source swap.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlayerFault {
    /// The platform refused to start playback before a user gesture.
    #[error("playback not allowed before a user gesture")]
    NotAllowed,

    /// The source or operation is not supported by the backend.
    #[error("media source or operation not supported")]
    NotSupported,

    /// Fetching media data failed.
    #[error("network failure while fetching media: {0}")]
    Network(String),

    /// Media data was fetched but could not be decoded.
    #[error("media data could not be decoded: {0}")]
    Decode(String),

    /// The request was aborted, typically because a newer `load_source`
    /// superseded it. Expected during rapid track switching.
    #[error("playback request aborted")]
    Aborted,
}

/// Read-only snapshot of the hardware player's observable state.
///
/// Snapshots are taken on demand and must never be cached across await
/// points by consumers that care about freshness.
#[derive(Debug, Clone, PartialEq)]
pub struct HardwareSnapshot {
    /// `true` when the backend is not currently rendering audio.
    pub is_paused: bool,
    /// `true` when the current source played to completion.
    pub has_ended: bool,
    /// Current playback position.
    pub position: Duration,
    /// Total duration of the current source, when known.
    pub duration: Option<Duration>,
    /// Last fault reported by the backend, if any.
    pub fault: Option<PlayerFault>,
}

impl HardwareSnapshot {
    /// `true` when the hardware is genuinely rendering audio: not paused, not
    /// ended, and the position has advanced past zero.
    pub fn actually_playing(&self) -> bool {
        !self.is_paused && !self.has_ended && self.position > Duration::ZERO
    }
}

impl Default for HardwareSnapshot {
    fn default() -> Self {
        Self {
            is_paused: true,
            has_ended: false,
            position: Duration::ZERO,
            duration: None,
            fault: None,
        }
    }
}

/// Raw events emitted by the hardware player.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    /// A new source started loading.
    LoadStart,
    /// Source metadata became available.
    LoadedMetadata {
        /// Duration reported by the source.
        duration: Duration,
    },
    /// Playback position advanced.
    TimeUpdate {
        /// New playback position.
        position: Duration,
    },
    /// The current source played to completion.
    Ended,
    /// The backend reported a fault outside of a `play()` call.
    Faulted(PlayerFault),
}

/// Receiver for raw hardware events.
///
/// Hosts invoke the handler on their event loop; implementations must not
/// block.
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
pub trait PlayerEventHandler: PlatformSendSync {
    /// Handle a single hardware event.
    async fn on_player_event(&self, event: PlayerEvent);
}

/// Trait for the platform's physical media player.
///
/// Control methods are fire-and-forget except [`HardwarePlayer::play`], which
/// resolves asynchronously: media backends may reject a play request long
/// after the call returns (autoplay policy, network failure). Callers must
/// not assume synchronous success.
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
pub trait HardwarePlayer: PlatformSendSync {
    /// Begin or resume playback of the currently loaded source.
    async fn play(&self) -> Result<(), PlayerFault>;

    /// Pause playback. Always succeeds synchronously.
    fn pause(&self);

    /// Swap the media source. Resets position and the ended flag; the new
    /// source starts paused.
    fn load_source(&self, url: &str);

    /// Seek to an absolute position within the current source.
    fn seek(&self, position: Duration);

    /// Set the output volume. `volume` is normalized to `0.0..=1.0`; callers
    /// validate the range before invoking.
    fn set_volume(&self, volume: f32);

    /// Synchronous read of the current hardware flags. Never mutates.
    fn snapshot(&self) -> HardwareSnapshot;

    /// Install the receiver for raw hardware events. Replaces any previously
    /// installed handler.
    fn set_event_handler(&self, handler: Arc<dyn PlayerEventHandler>);

    /// Remove the installed event handler, if any.
    fn clear_event_handler(&self);
}
