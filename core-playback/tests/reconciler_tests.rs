//! Reconciler behavior: debounce, single-shot correction, stall recovery.

mod common;

use bridge_traits::lifecycle::{FocusState, VisibilityState};
use bridge_traits::player::PlayerFault;
use bridge_traits::session::SessionPlaybackState;
use common::{fixture, track};
use core_playback::{PlaybackError, ReconcilerPhase};
use std::time::Duration;

/// Rapid lifecycle triggers inside one settle window collapse into exactly
/// one hardware check.
#[tokio::test]
async fn rapid_triggers_debounce_to_one_check() {
    let f = fixture();
    f.engine.mark_user_interacted();
    f.player.set_duration(Duration::from_secs(180));
    f.engine.play_track(track("a")).await.unwrap();
    f.player.set_position(Duration::from_secs(5));

    f.hub.set_visibility(VisibilityState::Hidden);
    f.hub.set_visibility(VisibilityState::Visible);
    f.hub.set_focus(FocusState::Focused);

    // The second trigger superseded the first: one live timer remains.
    assert_eq!(f.scheduler.pending_once(), 1);

    let baseline = f.player.snapshot_call_count();
    let fired = f.scheduler.fire_once_jobs().await;
    assert_eq!(fired, 1);

    // Exactly one snapshot-based check ran, and it found nothing to fix.
    assert_eq!(f.player.snapshot_call_count(), baseline + 1);
    assert_eq!(f.player.play_call_count(), 1);
    assert_eq!(f.player.pause_call_count(), 0);
    assert_eq!(f.engine.reconciler().phase(), ReconcilerPhase::Idle);
}

/// A check that finds intent and hardware in agreement performs zero
/// hardware calls and zero store writes.
#[tokio::test]
async fn matching_states_are_a_cheap_no_op() {
    let f = fixture();
    f.engine.mark_user_interacted();
    f.player.set_duration(Duration::from_secs(180));
    f.engine.play_track(track("a")).await.unwrap();
    f.player.set_position(Duration::from_secs(5));

    f.hub.set_visibility(VisibilityState::Hidden);
    f.hub.set_visibility(VisibilityState::Visible);

    let intent_before = f.engine.snapshot();
    let plays_before = f.player.play_call_count();
    let states_before = f.surface.states().len();

    f.scheduler.fire_once_jobs().await;

    assert_eq!(f.engine.snapshot(), intent_before);
    assert_eq!(f.player.play_call_count(), plays_before);
    assert_eq!(f.player.pause_call_count(), 0);
    assert_eq!(f.surface.states().len(), states_before);
    assert_eq!(f.engine.reconciler().phase(), ReconcilerPhase::Idle);
}

/// Intended playing + actually paused resumes with exactly one `play()`
/// attempt; a failed attempt downgrades intent instead of retrying.
#[tokio::test]
async fn failed_correction_is_single_shot_and_downgrades() {
    let f = fixture();
    f.engine.mark_user_interacted();
    f.player.set_duration(Duration::from_secs(180));
    f.engine.play_track(track("a")).await.unwrap();

    // The platform paused the element behind our back during a lock.
    f.player.force_state(true, false, Duration::from_secs(5));
    f.player.script_play_failure(PlayerFault::Network("cdn unreachable".into()));

    f.hub.set_visibility(VisibilityState::Hidden);
    f.hub.set_visibility(VisibilityState::Visible);
    f.scheduler.fire_once_jobs().await;

    // One corrective attempt on top of the initial play, then surrender.
    assert_eq!(f.player.play_call_count(), 2);
    let intent = f.engine.snapshot();
    assert!(!intent.playing);
    assert_eq!(
        intent.last_error,
        Some(PlaybackError::Network("cdn unreachable".into()))
    );
    assert_eq!(f.engine.reconciler().phase(), ReconcilerPhase::Idle);
    // Nothing queued: no retry loop.
    assert_eq!(f.scheduler.pending_once(), 0);
}

#[tokio::test]
async fn successful_correction_resumes_and_publishes() {
    let f = fixture();
    f.engine.mark_user_interacted();
    f.player.set_duration(Duration::from_secs(180));
    f.engine.play_track(track("a")).await.unwrap();
    f.player.force_state(true, false, Duration::from_secs(5));

    f.hub.set_visibility(VisibilityState::Hidden);
    f.hub.set_visibility(VisibilityState::Visible);
    f.scheduler.fire_once_jobs().await;

    assert_eq!(f.player.play_call_count(), 2);
    assert!(!f.player.is_paused());
    assert!(f.engine.snapshot().playing);
    assert_eq!(
        f.surface.states().last(),
        Some(&SessionPlaybackState::Playing)
    );
}

/// Intended paused + actually playing corrects with a single `pause()`.
#[tokio::test]
async fn unwanted_playback_is_paused() {
    let f = fixture();
    f.engine.mark_user_interacted();
    f.player.set_duration(Duration::from_secs(180));
    f.engine.play_track(track("a")).await.unwrap();
    f.player.set_position(Duration::from_secs(5));

    // The store was downgraded (e.g., by the UI) but the pause never reached
    // the hardware.
    f.engine.store().set_playing_intended(false);

    f.hub.set_visibility(VisibilityState::Hidden);
    f.hub.set_visibility(VisibilityState::Visible);
    f.scheduler.fire_once_jobs().await;

    assert_eq!(f.player.pause_call_count(), 1);
    assert!(f.player.is_paused());
    assert!(!f.engine.snapshot().playing);
    assert_eq!(
        f.surface.states().last(),
        Some(&SessionPlaybackState::Paused)
    );
}

/// A track that ended while the app was away downgrades intent rather than
/// restarting playback.
#[tokio::test]
async fn ended_track_downgrades_intent() {
    let f = fixture();
    f.engine.mark_user_interacted();
    f.player.set_duration(Duration::from_secs(180));
    f.engine.play_track(track("a")).await.unwrap();
    f.player.force_state(true, true, Duration::from_secs(180));

    f.hub.set_visibility(VisibilityState::Hidden);
    f.hub.set_visibility(VisibilityState::Visible);
    f.scheduler.fire_once_jobs().await;

    assert_eq!(f.player.play_call_count(), 1);
    assert!(!f.engine.snapshot().playing);
}

/// Three consecutive polls with a frozen position trigger exactly one
/// pause/seek/play recovery cycle, and the counter resets afterwards.
#[tokio::test]
async fn stalled_position_recovers_once_per_episode() {
    let f = fixture();
    f.engine.mark_user_interacted();
    f.player.set_duration(Duration::from_secs(180));
    f.engine.play_track(track("a")).await.unwrap();
    f.player.set_position(Duration::from_secs(42));

    // Baseline poll plus three unchanged observations.
    for _ in 0..3 {
        f.scheduler.tick_repeating().await;
    }
    assert_eq!(f.player.pause_call_count(), 0);

    f.scheduler.tick_repeating().await;
    assert_eq!(f.player.pause_call_count(), 1);
    assert_eq!(f.player.seek_call_count(), 1);
    assert_eq!(f.player.play_call_count(), 2);
    assert!(!f.player.is_paused());

    // The strike counter restarted from scratch: three more unchanged polls
    // are not enough for a second recovery.
    for _ in 0..3 {
        f.scheduler.tick_repeating().await;
    }
    assert_eq!(f.player.pause_call_count(), 1);

    f.scheduler.tick_repeating().await;
    assert_eq!(f.player.pause_call_count(), 2);
}

/// The counter resets even when recovery fails, and the failed recovery
/// downgrades intent so the poll goes quiet.
#[tokio::test]
async fn failed_stall_recovery_downgrades_and_resets() {
    let f = fixture();
    f.engine.mark_user_interacted();
    f.player.set_duration(Duration::from_secs(180));
    f.engine.play_track(track("a")).await.unwrap();
    f.player.set_position(Duration::from_secs(42));
    f.player.script_play_failure(PlayerFault::Network("route lost".into()));

    for _ in 0..4 {
        f.scheduler.tick_repeating().await;
    }
    assert_eq!(f.player.pause_call_count(), 1);
    assert!(!f.engine.snapshot().playing);

    // Intent is paused now; further polls must not attempt anything.
    for _ in 0..4 {
        f.scheduler.tick_repeating().await;
    }
    assert_eq!(f.player.pause_call_count(), 1);
    assert_eq!(f.player.play_call_count(), 2);
}

/// An advancing position never accumulates strikes.
#[tokio::test]
async fn advancing_playback_never_trips_the_stall_detector() {
    let f = fixture();
    f.engine.mark_user_interacted();
    f.player.set_duration(Duration::from_secs(180));
    f.engine.play_track(track("a")).await.unwrap();

    for i in 1..=8u64 {
        f.player.set_position(Duration::from_secs(i));
        f.scheduler.tick_repeating().await;
    }
    assert_eq!(f.player.pause_call_count(), 0);
}

/// A device change discards accumulated stall evidence.
#[tokio::test]
async fn device_change_resets_stall_evidence() {
    let f = fixture();
    f.engine.mark_user_interacted();
    f.player.set_duration(Duration::from_secs(180));
    f.engine.play_track(track("a")).await.unwrap();
    f.player.set_position(Duration::from_secs(42));

    for _ in 0..3 {
        f.scheduler.tick_repeating().await;
    }

    f.hub.notify_device_change(Some("carplay-head-unit".into()));
    assert_eq!(f.scheduler.pending_once(), 1);
    f.scheduler.fire_once_jobs().await;

    // Counting starts over after the route change.
    f.scheduler.tick_repeating().await;
    assert_eq!(f.player.pause_call_count(), 0);
}

/// The stall poll stays quiet while a settle check is pending, so the two
/// paths can never race corrective actions.
#[tokio::test]
async fn stall_poll_defers_to_pending_check() {
    let f = fixture();
    f.engine.mark_user_interacted();
    f.player.set_duration(Duration::from_secs(180));
    f.engine.play_track(track("a")).await.unwrap();
    f.player.set_position(Duration::from_secs(42));

    f.hub.set_visibility(VisibilityState::Hidden);
    f.hub.set_visibility(VisibilityState::Visible);
    assert_eq!(f.engine.reconciler().phase(), ReconcilerPhase::PendingCheck);

    for _ in 0..4 {
        f.scheduler.tick_repeating().await;
    }
    assert_eq!(f.player.pause_call_count(), 0);

    f.scheduler.fire_once_jobs().await;
    assert_eq!(f.engine.reconciler().phase(), ReconcilerPhase::Idle);
}

/// End-to-end background/foreground pass: backgrounding takes no action,
/// foregrounding checks once and finds nothing to fix.
#[tokio::test]
async fn background_foreground_round_trip_is_quiet() {
    let f = fixture();
    f.engine.mark_user_interacted();
    f.player.set_duration(Duration::from_secs(180));
    f.engine.play_track(track("a")).await.unwrap();
    f.player.set_position(Duration::from_secs(5));

    assert_eq!(
        f.surface.states().last(),
        Some(&SessionPlaybackState::Playing)
    );

    f.hub.set_visibility(VisibilityState::Hidden);
    // Backgrounding must not touch playback.
    assert_eq!(f.player.pause_call_count(), 0);
    assert!(!f.player.is_paused());
    assert!(f.engine.monitor().hidden_since().is_some());

    f.clock.advance(Duration::from_secs(10));
    f.player.set_position(Duration::from_secs(15));

    f.hub.set_visibility(VisibilityState::Visible);
    f.scheduler.fire_once_jobs().await;

    assert_eq!(f.player.play_call_count(), 1);
    assert_eq!(f.player.pause_call_count(), 0);
    assert!(f.engine.snapshot().playing);
    assert_eq!(f.engine.reconciler().phase(), ReconcilerPhase::Idle);
    assert!(f.engine.monitor().hidden_since().is_none());
}
