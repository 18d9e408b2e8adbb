//! Deterministic fakes shared by the integration suites.
//!
//! The scheduler and clock are driven manually so settle delays, throttle
//! windows and stall polls advance only when a test says so.

#![allow(dead_code)]

use bridge_desktop::DesktopLifecycleHub;
use bridge_traits::player::{
    HardwarePlayer, HardwareSnapshot, PlayerEvent, PlayerEventHandler, PlayerFault,
};
use bridge_traits::scheduler::{OneShotTask, RepeatingTask, ScheduleHandle, TaskScheduler};
use bridge_traits::session::{
    MediaSessionSurface, RemoteCommand, RemoteCommandHandler, SessionMetadata,
    SessionPlaybackState, SessionPosition,
};
use bridge_traits::time::Clock;
use chrono::{DateTime, TimeZone, Utc};
use core_playback::{EngineConfig, PlatformCapabilities, PlaybackEngine, TrackRef};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// Manual clock
// ============================================================================

pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Mutex::new(Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()),
        }
    }

    pub fn advance(&self, delta: Duration) {
        let mut now = self.now.lock();
        *now += chrono::Duration::from_std(delta).unwrap();
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

// ============================================================================
// Manual scheduler
// ============================================================================

enum Job {
    Once {
        task: Option<OneShotTask>,
        cancelled: Arc<AtomicBool>,
    },
    Repeating {
        task: RepeatingTask,
        cancelled: Arc<AtomicBool>,
    },
}

/// Scheduler whose jobs run only when the test fires them.
pub struct ManualScheduler {
    jobs: Mutex<Vec<Job>>,
}

struct ManualHandle {
    cancelled: Arc<AtomicBool>,
}

impl ScheduleHandle for ManualHandle {
    fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self {
            jobs: Mutex::new(Vec::new()),
        }
    }

    /// Number of live (not cancelled) one-shot jobs waiting to fire.
    pub fn pending_once(&self) -> usize {
        self.jobs
            .lock()
            .iter()
            .filter(|job| match job {
                Job::Once { cancelled, .. } => !cancelled.load(Ordering::SeqCst),
                Job::Repeating { .. } => false,
            })
            .count()
    }

    /// Fire every live one-shot currently queued; cancelled jobs are
    /// silently dropped. Jobs scheduled from inside a fired task stay queued
    /// for the next call. Returns how many tasks actually ran.
    pub async fn fire_once_jobs(&self) -> usize {
        let drained: Vec<OneShotTask> = {
            let mut jobs = self.jobs.lock();
            let mut taken = Vec::new();
            jobs.retain_mut(|job| match job {
                Job::Once { task, cancelled } => {
                    if !cancelled.load(Ordering::SeqCst) {
                        if let Some(task) = task.take() {
                            taken.push(task);
                        }
                    }
                    false
                }
                Job::Repeating { .. } => true,
            });
            taken
        };
        let count = drained.len();
        for task in drained {
            task().await;
        }
        count
    }

    /// Invoke each live repeating job once.
    pub async fn tick_repeating(&self) {
        let tasks: Vec<RepeatingTask> = {
            let jobs = self.jobs.lock();
            jobs.iter()
                .filter_map(|job| match job {
                    Job::Repeating { task, cancelled } if !cancelled.load(Ordering::SeqCst) => {
                        Some(Arc::clone(task))
                    }
                    _ => None,
                })
                .collect()
        };
        for task in tasks {
            task().await;
        }
    }
}

impl TaskScheduler for ManualScheduler {
    fn schedule_once(&self, _delay: Duration, task: OneShotTask) -> Box<dyn ScheduleHandle> {
        let cancelled = Arc::new(AtomicBool::new(false));
        self.jobs.lock().push(Job::Once {
            task: Some(task),
            cancelled: Arc::clone(&cancelled),
        });
        Box::new(ManualHandle { cancelled })
    }

    fn schedule_repeating(&self, _period: Duration, task: RepeatingTask) -> Box<dyn ScheduleHandle> {
        let cancelled = Arc::new(AtomicBool::new(false));
        self.jobs.lock().push(Job::Repeating {
            task,
            cancelled: Arc::clone(&cancelled),
        });
        Box::new(ManualHandle { cancelled })
    }
}

// ============================================================================
// Scripted hardware player
// ============================================================================

struct PlayerState {
    paused: bool,
    ended: bool,
    position: Duration,
    duration: Option<Duration>,
    source: Option<String>,
    volume: f32,
    scripted_failures: VecDeque<PlayerFault>,
}

/// Hardware player whose observable state is controlled by the test.
pub struct ScriptedPlayer {
    state: Mutex<PlayerState>,
    handler: Mutex<Option<Arc<dyn PlayerEventHandler>>>,
    play_calls: AtomicUsize,
    pause_calls: AtomicUsize,
    seek_calls: AtomicUsize,
    snapshot_calls: AtomicUsize,
}

impl ScriptedPlayer {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(PlayerState {
                paused: true,
                ended: false,
                position: Duration::ZERO,
                duration: None,
                source: None,
                volume: 1.0,
                scripted_failures: VecDeque::new(),
            }),
            handler: Mutex::new(None),
            play_calls: AtomicUsize::new(0),
            pause_calls: AtomicUsize::new(0),
            seek_calls: AtomicUsize::new(0),
            snapshot_calls: AtomicUsize::new(0),
        }
    }

    /// Queue a failure for the next `play()` call. Multiple calls queue in
    /// order; once drained, plays succeed again.
    pub fn script_play_failure(&self, fault: PlayerFault) {
        self.state.lock().scripted_failures.push_back(fault);
    }

    /// Overwrite the raw hardware flags, bypassing call counters (simulates
    /// the platform changing state behind the core's back).
    pub fn force_state(&self, paused: bool, ended: bool, position: Duration) {
        let mut state = self.state.lock();
        state.paused = paused;
        state.ended = ended;
        state.position = position;
    }

    pub fn set_position(&self, position: Duration) {
        self.state.lock().position = position;
    }

    pub fn set_duration(&self, duration: Duration) {
        self.state.lock().duration = Some(duration);
    }

    pub fn source(&self) -> Option<String> {
        self.state.lock().source.clone()
    }

    pub fn is_paused(&self) -> bool {
        self.state.lock().paused
    }

    pub fn volume(&self) -> f32 {
        self.state.lock().volume
    }

    pub fn play_call_count(&self) -> usize {
        self.play_calls.load(Ordering::SeqCst)
    }

    pub fn pause_call_count(&self) -> usize {
        self.pause_calls.load(Ordering::SeqCst)
    }

    pub fn seek_call_count(&self) -> usize {
        self.seek_calls.load(Ordering::SeqCst)
    }

    pub fn snapshot_call_count(&self) -> usize {
        self.snapshot_calls.load(Ordering::SeqCst)
    }

    pub fn has_event_handler(&self) -> bool {
        self.handler.lock().is_some()
    }

    /// Deliver a raw hardware event to the installed handler.
    pub async fn emit(&self, event: PlayerEvent) {
        let handler = self.handler.lock().clone();
        if let Some(handler) = handler {
            handler.on_player_event(event).await;
        }
    }
}

#[async_trait::async_trait]
impl HardwarePlayer for ScriptedPlayer {
    async fn play(&self) -> Result<(), PlayerFault> {
        self.play_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock();
        if let Some(fault) = state.scripted_failures.pop_front() {
            return Err(fault);
        }
        state.paused = false;
        state.ended = false;
        Ok(())
    }

    fn pause(&self) {
        self.pause_calls.fetch_add(1, Ordering::SeqCst);
        self.state.lock().paused = true;
    }

    fn load_source(&self, url: &str) {
        let mut state = self.state.lock();
        state.source = Some(url.to_string());
        state.paused = true;
        state.ended = false;
        state.position = Duration::ZERO;
    }

    fn seek(&self, position: Duration) {
        self.seek_calls.fetch_add(1, Ordering::SeqCst);
        self.state.lock().position = position;
    }

    fn set_volume(&self, volume: f32) {
        self.state.lock().volume = volume;
    }

    fn snapshot(&self) -> HardwareSnapshot {
        self.snapshot_calls.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock();
        HardwareSnapshot {
            is_paused: state.paused,
            has_ended: state.ended,
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
// Recording media-session surface
// ============================================================================

/// Surface that records every publish and lets tests inject OS commands.
pub struct RecordingSurface {
    available: bool,
    metadata: Mutex<Vec<SessionMetadata>>,
    states: Mutex<Vec<SessionPlaybackState>>,
    positions: Mutex<Vec<SessionPosition>>,
    handler: Mutex<Option<Arc<dyn RemoteCommandHandler>>>,
}

impl RecordingSurface {
    pub fn new(available: bool) -> Self {
        Self {
            available,
            metadata: Mutex::new(Vec::new()),
            states: Mutex::new(Vec::new()),
            positions: Mutex::new(Vec::new()),
            handler: Mutex::new(None),
        }
    }

    pub fn metadata(&self) -> Vec<SessionMetadata> {
        self.metadata.lock().clone()
    }

    pub fn states(&self) -> Vec<SessionPlaybackState> {
        self.states.lock().clone()
    }

    pub fn positions(&self) -> Vec<SessionPosition> {
        self.positions.lock().clone()
    }

    pub fn has_handler(&self) -> bool {
        self.handler.lock().is_some()
    }

    /// Deliver an OS transport command to the installed handler.
    pub async fn send_command(&self, command: RemoteCommand) {
        let handler = self.handler.lock().clone();
        if let Some(handler) = handler {
            handler.handle_command(command).await;
        }
    }
}

impl MediaSessionSurface for RecordingSurface {
    fn is_available(&self) -> bool {
        self.available
    }

    fn publish_metadata(&self, metadata: &SessionMetadata) {
        self.metadata.lock().push(metadata.clone());
    }

    fn publish_playback_state(&self, state: SessionPlaybackState) {
        self.states.lock().push(state);
    }

    fn publish_position(&self, position: &SessionPosition) {
        self.positions.lock().push(*position);
    }

    fn install_command_handler(&self, handler: Arc<dyn RemoteCommandHandler>) {
        *self.handler.lock() = Some(handler);
    }

    fn clear_command_handler(&self) {
        *self.handler.lock() = None;
    }
}

// ============================================================================
// Fixture
// ============================================================================

pub struct Fixture {
    pub engine: Arc<PlaybackEngine>,
    pub player: Arc<ScriptedPlayer>,
    pub surface: Arc<RecordingSurface>,
    pub scheduler: Arc<ManualScheduler>,
    pub clock: Arc<ManualClock>,
    pub hub: Arc<DesktopLifecycleHub>,
}

pub fn fixture() -> Fixture {
    fixture_with(EngineConfig::default(), true, true)
}

pub fn fixture_with(config: EngineConfig, surface_available: bool, secure_context: bool) -> Fixture {
    let player = Arc::new(ScriptedPlayer::new());
    let surface = Arc::new(RecordingSurface::new(surface_available));
    let scheduler = Arc::new(ManualScheduler::new());
    let clock = Arc::new(ManualClock::new());
    let hub = Arc::new(DesktopLifecycleHub::new());

    let capabilities = PlatformCapabilities {
        player: Arc::clone(&player),
        media_session: Arc::clone(&surface),
        lifecycle: Arc::clone(&hub),
        scheduler: Arc::clone(&scheduler),
        clock: Arc::clone(&clock),
        secure_context,
    };
    let engine = PlaybackEngine::new(capabilities, config).expect("engine should construct");

    Fixture {
        engine,
        player,
        surface,
        scheduler,
        clock,
        hub,
    }
}

/// Test track with an already-secure source URL.
pub fn track(id: &str) -> TrackRef {
    TrackRef {
        id: id.to_string(),
        title: format!("Track {id}"),
        artist: "Test Artist".to_string(),
        album: Some("Test Album".to_string()),
        artwork_url: None,
        source_url: format!("https://cdn.example.com/{id}.mp3"),
        duration: Some(Duration::from_secs(180)),
    }
}
