//! # Playback Engine Demo
//!
//! Wires the engine against console-backed capabilities and walks through a
//! lock/unlock cycle: playback starts, the app goes to the background, the
//! platform silently pauses the element, and the reconciler resumes it after
//! the app comes back.
//!
//! Run with: `cargo run --example playback_demo --package core-playback`

use bridge_desktop::{DesktopLifecycleHub, TokioTaskScheduler};
use bridge_traits::player::{
    HardwarePlayer, HardwareSnapshot, PlayerEvent, PlayerEventHandler, PlayerFault,
};
use bridge_traits::session::{
    MediaSessionSurface, RemoteCommand, RemoteCommandHandler, SessionMetadata,
    SessionPlaybackState, SessionPosition,
};
use bridge_traits::time::SystemClock;
use bridge_traits::VisibilityState;
use core_playback::{EngineConfig, PlatformCapabilities, PlaybackEngine, TrackRef};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// Console hardware player (for demonstration)
// ============================================================================

struct ConsolePlayer {
    state: Mutex<ConsoleState>,
    handler: Mutex<Option<Arc<dyn PlayerEventHandler>>>,
}

struct ConsoleState {
    paused: bool,
    position: Duration,
    duration: Option<Duration>,
    source: Option<String>,
}

impl ConsolePlayer {
    fn new() -> Self {
        Self {
            state: Mutex::new(ConsoleState {
                paused: true,
                position: Duration::ZERO,
                duration: Some(Duration::from_secs(180)),
                source: None,
            }),
            handler: Mutex::new(None),
        }
    }

    /// Simulate the platform pausing the element behind the app's back.
    fn platform_pause(&self) {
        println!("   [platform] element paused during lock");
        self.state.lock().paused = true;
    }

    fn advance_to(&self, position: Duration) {
        self.state.lock().position = position;
    }

    /// Simulate the current source playing to completion.
    async fn finish_track(&self) {
        self.state.lock().paused = true;
        let handler = self.handler.lock().clone();
        if let Some(handler) = handler {
            handler.on_player_event(PlayerEvent::Ended).await;
        }
    }
}

#[async_trait::async_trait]
impl HardwarePlayer for ConsolePlayer {
    async fn play(&self) -> Result<(), PlayerFault> {
        let mut state = self.state.lock();
        state.paused = false;
        println!("   [hardware] play ({})", state.source.as_deref().unwrap_or("<none>"));
        Ok(())
    }

    fn pause(&self) {
        println!("   [hardware] pause");
        self.state.lock().paused = true;
    }

    fn load_source(&self, url: &str) {
        println!("   [hardware] load {url}");
        let mut state = self.state.lock();
        state.source = Some(url.to_string());
        state.paused = true;
        state.position = Duration::ZERO;
    }

    fn seek(&self, position: Duration) {
        println!("   [hardware] seek to {position:?}");
        self.state.lock().position = position;
    }

    fn set_volume(&self, volume: f32) {
        println!("   [hardware] volume {:.0}%", volume * 100.0);
    }

    fn snapshot(&self) -> HardwareSnapshot {
        let state = self.state.lock();
        HardwareSnapshot {
            is_paused: state.paused,
            has_ended: false,
            position: state.position,
            duration: state.duration,
            fault: None,
        }
    }

    fn set_event_handler(&self, handler: Arc<dyn PlayerEventHandler>) {
        *self.handler.lock() = Some(handler);
    }

    fn clear_event_handler(&self) {
        *self.handler.lock() = None;
    }
}

// ============================================================================
// Console media-session surface (for demonstration)
// ============================================================================

#[derive(Default)]
struct ConsoleMediaSession {
    handler: Mutex<Option<Arc<dyn RemoteCommandHandler>>>,
}

impl ConsoleMediaSession {
    async fn send(&self, command: RemoteCommand) {
        let handler = self.handler.lock().clone();
        if let Some(handler) = handler {
            println!("   [os] remote command {command:?}");
            handler.handle_command(command).await;
        }
    }
}

impl MediaSessionSurface for ConsoleMediaSession {
    fn publish_metadata(&self, metadata: &SessionMetadata) {
        println!("   [os] lock screen shows \"{} — {}\"", metadata.artist, metadata.title);
    }

    fn publish_playback_state(&self, state: SessionPlaybackState) {
        println!("   [os] playback state -> {state:?}");
    }

    fn publish_position(&self, position: &SessionPosition) {
        println!(
            "   [os] progress {:?} / {:?}",
            position.position, position.duration
        );
    }

    fn install_command_handler(&self, handler: Arc<dyn RemoteCommandHandler>) {
        *self.handler.lock() = Some(handler);
    }

    fn clear_command_handler(&self) {
        *self.handler.lock() = None;
    }
}

// ============================================================================
// Scenario
// ============================================================================

fn demo_track(id: &str, title: &str) -> TrackRef {
    TrackRef {
        id: id.to_string(),
        title: title.to_string(),
        artist: "Night Drive".to_string(),
        album: Some("City Lights".to_string()),
        artwork_url: None,
        source_url: format!("http://cdn.example.com/{id}.mp3"),
        duration: Some(Duration::from_secs(180)),
    }
}

#[tokio::main]
async fn main() -> core_playback::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let player = Arc::new(ConsolePlayer::new());
    let surface = Arc::new(ConsoleMediaSession::default());
    let hub = Arc::new(DesktopLifecycleHub::new());

    let capabilities = PlatformCapabilities {
        player: Arc::clone(&player),
        media_session: Arc::clone(&surface),
        lifecycle: Arc::clone(&hub),
        scheduler: Arc::new(TokioTaskScheduler::new()),
        clock: Arc::new(SystemClock),
        // Note the demo track uses http://; the adapter upgrades it.
        secure_context: true,
    };
    let engine = PlaybackEngine::new(capabilities, EngineConfig::default())?;

    println!("1. User taps play");
    engine.mark_user_interacted();
    engine
        .play_collection(
            vec![demo_track("t1", "Neon Rain"), demo_track("t2", "Overpass")],
            0,
        )
        .await?;
    player.advance_to(Duration::from_secs(5));

    println!("\n2. App is locked; audio keeps playing");
    hub.set_visibility(VisibilityState::Hidden);
    tokio::time::sleep(Duration::from_millis(100)).await;

    println!("\n3. The platform pauses the element while locked");
    player.platform_pause();

    println!("\n4. App unlocked; the reconciler checks after the settle delay");
    hub.set_visibility(VisibilityState::Visible);
    tokio::time::sleep(Duration::from_millis(400)).await;
    println!(
        "   intent says playing={}, hardware paused={}",
        engine.snapshot().playing,
        player.snapshot().is_paused
    );

    println!("\n5. Track finishes; the queue auto-advances");
    player.finish_track().await;

    println!("\n6. Lock-screen \"previous\" command restarts the track");
    player.advance_to(Duration::from_secs(30));
    surface.send(RemoteCommand::PreviousTrack).await;
    tokio::time::sleep(Duration::from_millis(200)).await;

    engine.shutdown();
    println!("\nDone.");
    Ok(())
}
