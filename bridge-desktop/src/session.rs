//! Media-session surface for hosts without a transport UI.

use bridge_traits::session::{
    MediaSessionSurface, RemoteCommandHandler, SessionMetadata, SessionPlaybackState,
    SessionPosition,
};
use std::sync::Arc;

/// Surface for hosts with no OS media-session equivalent.
///
/// Reports unavailable so the core's media-session bridge constructs itself
/// disabled; every publish is a no-op and no commands are ever delivered.
#[derive(Debug, Default, Clone)]
pub struct UnavailableMediaSession;

impl UnavailableMediaSession {
    pub fn new() -> Self {
        Self
    }
}

impl MediaSessionSurface for UnavailableMediaSession {
    fn is_available(&self) -> bool {
        false
    }

    fn publish_metadata(&self, _metadata: &SessionMetadata) {}

    fn publish_playback_state(&self, _state: SessionPlaybackState) {}

    fn publish_position(&self, _position: &SessionPosition) {}

    fn install_command_handler(&self, _handler: Arc<dyn RemoteCommandHandler>) {}

    fn clear_command_handler(&self) {}
}
