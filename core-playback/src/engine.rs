//! # Playback Engine
//!
//! Wires the store, adapter, media-session bridge, lifecycle monitor,
//! interruption guard and reconciler into one dependency-injected unit, and
//! exposes the user-facing transport operations.
//!
//! Every component is explicitly constructed from the injected
//! [`PlatformCapabilities`] — no global state, no singletons — so multiple
//! independent engines can coexist in tests.

use crate::adapter::PlayerAdapter;
use crate::config::EngineConfig;
use crate::error::{PlaybackError, Result};
use crate::interruption::InterruptionGuard;
use crate::lifecycle::LifecycleMonitor;
use crate::reconciler::Reconciler;
use crate::session::MediaSessionBridge;
use crate::store::{PlaybackIntent, PlaybackStore, PreviousAction, StoreObserver, TrackRef};
use bridge_traits::lifecycle::LifecycleEvents;
use bridge_traits::player::{HardwarePlayer, PlayerEvent, PlayerEventHandler};
use bridge_traits::scheduler::TaskScheduler;
use bridge_traits::session::MediaSessionSurface;
use bridge_traits::time::Clock;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Platform capabilities injected at engine construction.
///
/// Implementations differ per target runtime (web, desktop shell, mobile
/// webview); the core is written purely against the bridge traits.
pub struct PlatformCapabilities {
    pub player: Arc<dyn HardwarePlayer>,
    pub media_session: Arc<dyn MediaSessionSurface>,
    pub lifecycle: Arc<dyn LifecycleEvents>,
    pub scheduler: Arc<dyn TaskScheduler>,
    pub clock: Arc<dyn Clock>,
    /// Whether the hosting page/app runs in a secure context. Controls the
    /// defensive `http://` → `https://` source rewrite.
    pub secure_context: bool,
}

/// The assembled playback engine.
pub struct PlaybackEngine {
    store: Arc<PlaybackStore>,
    adapter: Arc<PlayerAdapter>,
    session: Arc<MediaSessionBridge>,
    reconciler: Arc<Reconciler>,
    monitor: Arc<LifecycleMonitor>,
    interruptions: Arc<InterruptionGuard>,
    player: Arc<dyn HardwarePlayer>,
    surface: Arc<dyn MediaSessionSurface>,
}

impl PlaybackEngine {
    /// Construct and wire an engine from the injected capabilities.
    pub fn new(capabilities: PlatformCapabilities, config: EngineConfig) -> Result<Arc<Self>> {
        config.validate().map_err(PlaybackError::InvalidConfig)?;

        let PlatformCapabilities {
            player,
            media_session,
            lifecycle,
            scheduler,
            clock,
            secure_context,
        } = capabilities;

        let store = Arc::new(PlaybackStore::new());
        let adapter = Arc::new(PlayerAdapter::new(
            Arc::clone(&player),
            Arc::clone(&store),
            secure_context,
        ));
        let session = Arc::new(MediaSessionBridge::new(
            Arc::clone(&media_session),
            Arc::clone(&store),
            Arc::clone(&adapter),
            Arc::clone(&scheduler),
            Arc::clone(&clock),
            config.session,
        ));
        let reconciler = Reconciler::new(
            Arc::clone(&store),
            Arc::clone(&adapter),
            Arc::clone(&session),
            Arc::clone(&scheduler),
            Arc::clone(&clock),
            config.reconciler,
        );
        let monitor = LifecycleMonitor::new(
            Arc::clone(&reconciler),
            Arc::clone(&session),
            Arc::clone(&adapter),
            Arc::clone(&clock),
        );
        let interruptions = InterruptionGuard::new(
            Arc::clone(&store),
            Arc::clone(&adapter),
            Arc::clone(&scheduler),
            config.resume,
        );

        let adapter_observer: Arc<dyn StoreObserver> = Arc::clone(&adapter);
        store.register_observer(&adapter_observer);
        let session_observer: Arc<dyn StoreObserver> = Arc::clone(&session);
        store.register_observer(&session_observer);

        if session.is_enabled() {
            media_session.install_command_handler(Arc::clone(&session));
        }
        monitor.attach(lifecycle.as_ref());
        interruptions.attach(lifecycle.as_ref());
        reconciler.start_stall_monitor();

        let engine = Arc::new(Self {
            store,
            adapter,
            session,
            reconciler,
            monitor,
            interruptions,
            player: Arc::clone(&player),
            surface: media_session,
        });
        player.set_event_handler(Arc::clone(&engine));

        info!("playback engine initialized");
        Ok(engine)
    }

    /// The authoritative store, for reactive UI observation.
    pub fn store(&self) -> &Arc<PlaybackStore> {
        &self.store
    }

    /// Snapshot of the intended state.
    pub fn snapshot(&self) -> PlaybackIntent {
        self.store.snapshot()
    }

    /// The reconciler, exposed for host-driven diagnostics.
    pub fn reconciler(&self) -> &Arc<Reconciler> {
        &self.reconciler
    }

    /// The lifecycle monitor.
    pub fn monitor(&self) -> &Arc<LifecycleMonitor> {
        &self.monitor
    }

    /// The interruption guard.
    pub fn interruptions(&self) -> &Arc<InterruptionGuard> {
        &self.interruptions
    }

    /// Record a user gesture, unlocking playback under autoplay policy.
    pub fn mark_user_interacted(&self) {
        self.store.mark_user_interacted();
    }

    /// Make `track` current and start playback.
    pub async fn play_track(&self, track: TrackRef) -> Result<()> {
        self.store.set_last_error(None);
        self.store.set_current_track(track);
        self.start_playback().await
    }

    /// Replace the queue and start playing from `start_index`.
    pub async fn play_collection(&self, tracks: Vec<TrackRef>, start_index: usize) -> Result<()> {
        if tracks.is_empty() {
            return Err(PlaybackError::NoTrackLoaded);
        }
        self.store.set_last_error(None);
        self.store.play_collection(tracks, start_index);
        self.start_playback().await
    }

    /// Replace the queue without starting playback.
    pub fn set_queue(&self, tracks: Vec<TrackRef>) {
        self.store.initialize_queue(tracks);
    }

    /// Append a track to the queue.
    pub fn enqueue(&self, track: TrackRef) {
        self.store.enqueue(track);
    }

    /// Remove the track at `index` from the queue.
    pub fn remove_from_queue(&self, index: usize) {
        self.store.remove_from_queue(index);
    }

    /// Clear the queue and stop playback.
    pub fn clear_queue(&self) {
        self.store.clear_queue();
        self.adapter.pause();
    }

    /// Toggle shuffle mode.
    pub fn toggle_shuffle(&self) {
        self.store.toggle_shuffle();
    }

    /// Toggle between play and pause.
    pub async fn toggle(&self) -> Result<()> {
        if self.store.snapshot().playing {
            self.pause();
            Ok(())
        } else {
            self.resume().await
        }
    }

    /// Pause playback.
    pub fn pause(&self) {
        self.store.set_playing_intended(false);
        self.adapter.pause();
    }

    /// Resume playback of the current track.
    pub async fn resume(&self) -> Result<()> {
        if self.store.snapshot().current_track.is_none() {
            return Err(PlaybackError::NoTrackLoaded);
        }
        self.store.set_last_error(None);
        self.store.set_playing_intended(true);
        self.start_playback().await
    }

    /// Advance to the next track.
    pub async fn next(&self) -> Result<()> {
        match self.store.advance_next() {
            Some(_) => self.start_playback().await,
            None => Ok(()),
        }
    }

    /// Go to the previous track, or restart the current one when it is past
    /// the restart threshold.
    pub async fn previous(&self) -> Result<()> {
        let position = self.adapter.snapshot().position;
        match self.store.advance_previous(position) {
            PreviousAction::Restart => {
                self.adapter.seek(Duration::ZERO);
                self.store.set_position(Duration::ZERO);
                Ok(())
            }
            PreviousAction::Switched(_) => self.start_playback().await,
            PreviousAction::NoQueue => Ok(()),
        }
    }

    /// Seek within the current track and push fresh position state to the OS.
    pub fn seek(&self, position: Duration) {
        self.adapter.seek(position);
        let snapshot = self.adapter.snapshot();
        self.store.set_position(snapshot.position);
        self.session.publish_position(&snapshot, true);
    }

    /// Set the output volume.
    pub fn set_volume(&self, volume: f32) -> Result<()> {
        self.adapter.set_volume(volume)
    }

    /// Tear down platform registrations and background tasks.
    ///
    /// The engine participates in host-owned callback registrations; calling
    /// this releases them so the engine can be dropped.
    pub fn shutdown(&self) {
        self.reconciler.stop_stall_monitor();
        self.player.clear_event_handler();
        self.surface.clear_command_handler();
        info!("playback engine shut down");
    }

    /// Drive one play attempt with the retry-once-then-surface policy.
    async fn start_playback(&self) -> Result<()> {
        match self.adapter.play().await {
            Ok(()) => {
                self.store.set_needs_user_interaction(false);
                Ok(())
            }
            Err(PlaybackError::Aborted) => {
                // A newer request owns the outcome.
                debug!("play attempt aborted by a newer request");
                Ok(())
            }
            Err(err @ PlaybackError::UserInteractionRequired) => {
                self.store.set_needs_user_interaction(true);
                self.store.set_playing_intended(false);
                Err(err)
            }
            Err(err) if err.is_transient() => {
                debug!(error = %err, "play attempt failed; retrying once");
                match self.adapter.play().await {
                    Ok(()) => Ok(()),
                    Err(PlaybackError::Aborted) => Ok(()),
                    Err(retry_err) => {
                        warn!(error = %retry_err, "playback failed after single retry");
                        self.store.set_last_error(Some(retry_err.clone()));
                        self.store.set_playing_intended(false);
                        Err(retry_err)
                    }
                }
            }
            Err(err) => {
                self.store.set_last_error(Some(err.clone()));
                self.store.set_playing_intended(false);
                Err(err)
            }
        }
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
impl PlayerEventHandler for PlaybackEngine {
    async fn on_player_event(&self, event: PlayerEvent) {
        match event {
            PlayerEvent::LoadStart => debug!("source loading started"),
            PlayerEvent::LoadedMetadata { duration } => {
                self.store.set_duration(duration);
                self.session.publish_position(&self.adapter.snapshot(), true);
            }
            PlayerEvent::TimeUpdate { position } => {
                self.store.set_position(position);
                self.session.publish_position(&self.adapter.snapshot(), false);
            }
            PlayerEvent::Ended => {
                info!("track ended; advancing queue");
                if self.store.advance_next().is_some() {
                    if let Err(err) = self.start_playback().await {
                        debug!(error = %err, "auto-advance play failed");
                    }
                }
            }
            PlayerEvent::Faulted(fault) => {
                let err = PlaybackError::from(fault);
                if err.is_benign() {
                    debug!(error = %err, "ignoring aborted playback request");
                } else {
                    warn!(error = %err, "hardware playback fault");
                    self.store.set_last_error(Some(err));
                    self.store.set_playing_intended(false);
                }
            }
        }
    }
}
