//! # Playback Error Types
//!
//! Error taxonomy for the playback core. Hardware faults never cross the
//! adapter boundary untyped: [`PlayerFault`] values are converted into
//! [`PlaybackError`] variants, and the classification helpers drive the
//! retry/surface policy (transient faults retry exactly once, autoplay blocks
//! become a UI prompt, aborts are swallowed).

use bridge_traits::player::PlayerFault;
use thiserror::Error;

/// Errors that can occur during playback operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlaybackError {
    /// Playback was requested before the session recorded a user gesture.
    ///
    /// Recoverable: the UI renders a one-tap play affordance and the next
    /// gesture clears the condition.
    #[error("user interaction required before playback can start")]
    UserInteractionRequired,

    /// Fetching audio data failed. Transient; retried exactly once before
    /// being surfaced.
    #[error("network error while fetching audio: {0}")]
    Network(String),

    /// Audio data could not be decoded. Transient; retried exactly once
    /// before being surfaced.
    #[error("audio data could not be decoded: {0}")]
    Decode(String),

    /// The current source cannot be played by this backend.
    #[error("playback is not supported for the current source")]
    NotSupported,

    /// The playback attempt was superseded by a newer request. Expected
    /// during rapid track switching and never surfaced.
    #[error("playback attempt aborted by a newer request")]
    Aborted,

    /// An operation that needs a current track was invoked without one.
    #[error("no track is loaded")]
    NoTrackLoaded,

    /// Volume outside the normalized range.
    #[error("invalid volume: {0} (must be between 0.0 and 1.0)")]
    InvalidVolume(f32),

    /// Engine construction was given an invalid configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl PlaybackError {
    /// Returns `true` if this error is transient and a single retry is
    /// worthwhile.
    pub fn is_transient(&self) -> bool {
        matches!(self, PlaybackError::Network(_) | PlaybackError::Decode(_))
    }

    /// Returns `true` if this error is the platform's autoplay policy
    /// refusing to start without a user gesture.
    pub fn is_autoplay_block(&self) -> bool {
        matches!(self, PlaybackError::UserInteractionRequired)
    }

    /// Returns `true` if this error is expected noise (superseded requests)
    /// that must be swallowed rather than surfaced.
    pub fn is_benign(&self) -> bool {
        matches!(self, PlaybackError::Aborted)
    }
}

impl From<PlayerFault> for PlaybackError {
    fn from(fault: PlayerFault) -> Self {
        match fault {
            PlayerFault::NotAllowed => PlaybackError::UserInteractionRequired,
            PlayerFault::NotSupported => PlaybackError::NotSupported,
            PlayerFault::Network(message) => PlaybackError::Network(message),
            PlayerFault::Decode(message) => PlaybackError::Decode(message),
            PlayerFault::Aborted => PlaybackError::Aborted,
        }
    }
}

/// Result type for playback operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;
