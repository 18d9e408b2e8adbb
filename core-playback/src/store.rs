//! # Playback Store
//!
//! The single source of truth for what playback *should* be doing: current
//! track, intended play/pause state, position, volume, and the queue. Every
//! other component reads intent from here; only user actions, remote
//! commands, queue advancement and the reconciler's corrections write back.
//!
//! Setters that change the intended play state or the current track notify
//! registered observers synchronously (the player adapter swaps sources, the
//! media-session bridge publishes). Observers are held weakly and invoked
//! with the store lock released, so they may freely read back from the store.

use crate::error::PlaybackError;
use bridge_traits::platform::PlatformSendSync;
use parking_lot::Mutex;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tracing::debug;

/// Pressing "previous" within the first seconds of a track restarts it
/// instead of moving back through the queue.
const PREVIOUS_RESTART_THRESHOLD: Duration = Duration::from_secs(3);

/// Reference to a playable track.
///
/// Ids come from external catalogues and are treated as opaque strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackRef {
    pub id: String,
    pub title: String,
    pub artist: String,
    #[serde(default)]
    pub album: Option<String>,
    #[serde(default)]
    pub artwork_url: Option<String>,
    /// Playable URL resolved by the track/source resolver.
    pub source_url: String,
    #[serde(default)]
    pub duration: Option<Duration>,
}

/// Immutable snapshot of the intended playback state.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackIntent {
    pub current_track: Option<TrackRef>,
    /// Whether playback *should* be running. The hardware may disagree; the
    /// reconciler closes the gap.
    pub playing: bool,
    pub position: Duration,
    pub duration: Duration,
    pub volume: f32,
    /// Set once per session on the first user gesture. Play attempts are
    /// refused until then (autoplay policy).
    pub has_user_interacted: bool,
    /// The UI should render a one-tap play affordance.
    pub needs_user_interaction: bool,
    /// Last surfaced failure, for a dismissible error in the UI.
    pub last_error: Option<PlaybackError>,
}

/// Result of a "previous track" request.
#[derive(Debug, Clone, PartialEq)]
pub enum PreviousAction {
    /// Restart the current track from the beginning.
    Restart,
    /// The store switched to this track.
    Switched(TrackRef),
    /// Nothing to do; the queue is empty.
    NoQueue,
}

/// Observer for intent changes that must propagate synchronously.
pub trait StoreObserver: PlatformSendSync {
    /// The current track changed (or was cleared).
    fn track_changed(&self, track: Option<&TrackRef>) {
        let _ = track;
    }

    /// The intended play state changed.
    fn play_intent_changed(&self, playing: bool) {
        let _ = playing;
    }
}

#[derive(Debug)]
struct StoreState {
    current_track: Option<TrackRef>,
    playing: bool,
    position: Duration,
    duration: Duration,
    volume: f32,
    has_user_interacted: bool,
    needs_user_interaction: bool,
    last_error: Option<PlaybackError>,
    queue: Vec<TrackRef>,
    /// Original queue order, kept for un-shuffling.
    original_order: Vec<TrackRef>,
    current_index: Option<usize>,
    shuffled: bool,
}

impl Default for StoreState {
    fn default() -> Self {
        Self {
            current_track: None,
            playing: false,
            position: Duration::ZERO,
            duration: Duration::ZERO,
            volume: 1.0,
            has_user_interacted: false,
            needs_user_interaction: false,
            last_error: None,
            queue: Vec::new(),
            original_order: Vec::new(),
            current_index: None,
            shuffled: false,
        }
    }
}

/// Deferred observer notification, dispatched after the state lock is
/// released.
enum Notice {
    Track(Option<TrackRef>),
    Playing(bool),
}

/// Authoritative intended-state store.
pub struct PlaybackStore {
    state: Mutex<StoreState>,
    observers: Mutex<Vec<Weak<dyn StoreObserver>>>,
}

impl PlaybackStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(StoreState::default()),
            observers: Mutex::new(Vec::new()),
        }
    }

    /// Register an observer. Observers are held weakly; dropping the owning
    /// `Arc` unregisters automatically.
    pub fn register_observer(&self, observer: &Arc<dyn StoreObserver>) {
        self.observers.lock().push(Arc::downgrade(observer));
    }

    /// Snapshot of the intended state.
    pub fn snapshot(&self) -> PlaybackIntent {
        let state = self.state.lock();
        PlaybackIntent {
            current_track: state.current_track.clone(),
            playing: state.playing,
            position: state.position,
            duration: state.duration,
            volume: state.volume,
            has_user_interacted: state.has_user_interacted,
            needs_user_interaction: state.needs_user_interaction,
            last_error: state.last_error.clone(),
        }
    }

    /// Current queue contents, in play order.
    pub fn queue(&self) -> Vec<TrackRef> {
        self.state.lock().queue.clone()
    }

    pub fn current_index(&self) -> Option<usize> {
        self.state.lock().current_index
    }

    pub fn is_shuffled(&self) -> bool {
        self.state.lock().shuffled
    }

    /// Record the first user gesture of the session. Clears any pending
    /// interaction prompt.
    pub fn mark_user_interacted(&self) {
        let mut state = self.state.lock();
        if !state.has_user_interacted {
            debug!("user interaction recorded");
        }
        state.has_user_interacted = true;
        state.needs_user_interaction = false;
    }

    pub fn set_needs_user_interaction(&self, needs: bool) {
        self.state.lock().needs_user_interaction = needs;
    }

    pub fn set_last_error(&self, error: Option<PlaybackError>) {
        self.state.lock().last_error = error;
    }

    pub fn set_position(&self, position: Duration) {
        self.state.lock().position = position;
    }

    pub fn set_duration(&self, duration: Duration) {
        self.state.lock().duration = duration;
    }

    /// Set the intended volume, clamped to `[0, 1]`.
    pub fn set_volume(&self, volume: f32) {
        self.state.lock().volume = volume.clamp(0.0, 1.0);
    }

    /// Set the intended play state and notify observers on change.
    pub fn set_playing_intended(&self, playing: bool) {
        let notices = {
            let mut state = self.state.lock();
            if state.playing == playing {
                Vec::new()
            } else {
                state.playing = playing;
                vec![Notice::Playing(playing)]
            }
        };
        self.dispatch(notices);
    }

    /// Make `track` current and intend playback. Tracks not already in the
    /// queue are appended.
    pub fn set_current_track(&self, track: TrackRef) {
        let notices = {
            let mut state = self.state.lock();
            let index = match state.queue.iter().position(|t| t.id == track.id) {
                Some(index) => index,
                None => {
                    state.queue.push(track.clone());
                    state.original_order.push(track.clone());
                    state.queue.len() - 1
                }
            };
            state.current_index = Some(index);
            Self::apply_track(&mut state, track)
        };
        self.dispatch(notices);
    }

    /// Replace the queue contents without starting playback. Keeps the
    /// current track when one is set, otherwise points at the first entry.
    pub fn initialize_queue(&self, tracks: Vec<TrackRef>) {
        let notices = {
            let mut state = self.state.lock();
            state.original_order = tracks.clone();
            state.queue = tracks;
            state.shuffled = false;
            let mut notices = Vec::new();
            if state.current_track.is_none() {
                if let Some(first) = state.queue.first().cloned() {
                    state.current_track = Some(first.clone());
                    state.current_index = Some(0);
                    notices.push(Notice::Track(Some(first)));
                }
            } else {
                // Re-locate the current track in the new queue.
                let current_id = state.current_track.as_ref().map(|t| t.id.clone());
                let index = current_id.and_then(|id| state.queue.iter().position(|t| t.id == id));
                state.current_index = index;
            }
            notices
        };
        self.dispatch(notices);
    }

    /// Replace the queue and start playing from `start_index`.
    pub fn play_collection(&self, tracks: Vec<TrackRef>, start_index: usize) {
        if tracks.is_empty() {
            return;
        }
        let notices = {
            let mut state = self.state.lock();
            let index = start_index.min(tracks.len() - 1);
            let track = tracks[index].clone();
            state.original_order = tracks.clone();
            state.queue = tracks;
            state.current_index = Some(index);
            state.shuffled = false;
            Self::apply_track(&mut state, track)
        };
        self.dispatch(notices);
    }

    /// Advance to the next queue entry, wrapping to the first at the end.
    /// An empty queue downgrades the play intent instead.
    pub fn advance_next(&self) -> Option<TrackRef> {
        let (next, notices) = {
            let mut state = self.state.lock();
            if state.queue.is_empty() {
                let notices = if state.playing {
                    state.playing = false;
                    vec![Notice::Playing(false)]
                } else {
                    Vec::new()
                };
                (None, notices)
            } else {
                let next_index = match state.current_index {
                    Some(index) if index + 1 < state.queue.len() => index + 1,
                    _ => 0,
                };
                let track = state.queue[next_index].clone();
                state.current_index = Some(next_index);
                let notices = Self::apply_track(&mut state, track.clone());
                (Some(track), notices)
            }
        };
        self.dispatch(notices);
        next
    }

    /// Move to the previous queue entry, wrapping to the last at the start.
    /// When `position` is past the restart threshold the current track is
    /// restarted instead, so both the UI and the OS transport controls agree
    /// on the behavior.
    pub fn advance_previous(&self, position: Duration) -> PreviousAction {
        let (action, notices) = {
            let mut state = self.state.lock();
            if state.current_track.is_some() && position > PREVIOUS_RESTART_THRESHOLD {
                (PreviousAction::Restart, Vec::new())
            } else if state.queue.is_empty() {
                let notices = if state.playing {
                    state.playing = false;
                    vec![Notice::Playing(false)]
                } else {
                    Vec::new()
                };
                (PreviousAction::NoQueue, notices)
            } else {
                let prev_index = match state.current_index {
                    Some(index) if index > 0 => index - 1,
                    _ => state.queue.len() - 1,
                };
                let track = state.queue[prev_index].clone();
                state.current_index = Some(prev_index);
                let notices = Self::apply_track(&mut state, track.clone());
                (PreviousAction::Switched(track), notices)
            }
        };
        self.dispatch(notices);
        action
    }

    /// Toggle shuffle. Shuffling keeps the current track in first position
    /// and shuffles the rest; un-shuffling restores the original order and
    /// re-locates the current track.
    pub fn toggle_shuffle(&self) {
        let mut state = self.state.lock();
        if state.shuffled {
            let current_id = state.current_track.as_ref().map(|t| t.id.clone());
            state.queue = state.original_order.clone();
            let index = match current_id {
                Some(id) => state.queue.iter().position(|t| t.id == id).or(Some(0)),
                None => Some(0),
            };
            state.current_index = index;
            state.shuffled = false;
        } else {
            let current = state.current_track.clone();
            let current_id = current.as_ref().map(|t| t.id.clone());
            let mut rest: Vec<TrackRef> = state
                .queue
                .iter()
                .filter(|t| Some(&t.id) != current_id.as_ref())
                .cloned()
                .collect();
            rest.shuffle(&mut rand::thread_rng());
            match current {
                Some(track) => {
                    let mut shuffled = Vec::with_capacity(rest.len() + 1);
                    shuffled.push(track);
                    shuffled.extend(rest);
                    state.queue = shuffled;
                    state.current_index = Some(0);
                }
                None => {
                    state.queue = rest;
                    state.current_index = None;
                }
            }
            state.shuffled = true;
        }
    }

    /// Append a track to the end of the queue.
    pub fn enqueue(&self, track: TrackRef) {
        let mut state = self.state.lock();
        state.queue.push(track.clone());
        state.original_order.push(track);
    }

    /// Remove the track at `index`. The currently playing entry cannot be
    /// removed; the current index is re-based when an earlier entry goes.
    pub fn remove_from_queue(&self, index: usize) {
        let mut state = self.state.lock();
        if index >= state.queue.len() || state.current_index == Some(index) {
            return;
        }
        let removed = state.queue.remove(index);
        if let Some(original_index) = state.original_order.iter().position(|t| t.id == removed.id) {
            state.original_order.remove(original_index);
        }
        if let Some(current) = state.current_index {
            if index < current {
                state.current_index = Some(current - 1);
            }
        }
    }

    /// Clear the queue and stop playback intent.
    pub fn clear_queue(&self) {
        let notices = {
            let mut state = self.state.lock();
            state.queue.clear();
            state.original_order.clear();
            state.current_index = None;
            state.shuffled = false;
            state.position = Duration::ZERO;
            state.duration = Duration::ZERO;
            let mut notices = Vec::new();
            if state.current_track.take().is_some() {
                notices.push(Notice::Track(None));
            }
            if state.playing {
                state.playing = false;
                notices.push(Notice::Playing(false));
            }
            notices
        };
        self.dispatch(notices);
    }

    /// Install `track` as current with a fresh position and a playing
    /// intent. Returns the notices to dispatch once the lock is gone.
    fn apply_track(state: &mut StoreState, track: TrackRef) -> Vec<Notice> {
        state.position = Duration::ZERO;
        state.duration = track.duration.unwrap_or(Duration::ZERO);
        let mut notices = vec![Notice::Track(Some(track.clone()))];
        state.current_track = Some(track);
        if !state.playing {
            state.playing = true;
            notices.push(Notice::Playing(true));
        }
        notices
    }

    fn dispatch(&self, notices: Vec<Notice>) {
        if notices.is_empty() {
            return;
        }
        let observers: Vec<Arc<dyn StoreObserver>> = {
            let mut list = self.observers.lock();
            list.retain(|weak| weak.strong_count() > 0);
            list.iter().filter_map(Weak::upgrade).collect()
        };
        for notice in &notices {
            for observer in &observers {
                match notice {
                    Notice::Track(track) => observer.track_changed(track.as_ref()),
                    Notice::Playing(playing) => observer.play_intent_changed(*playing),
                }
            }
        }
    }
}

impl Default for PlaybackStore {
    fn default() -> Self {
        Self::new()
    }
}
