//! # Host Bridge Traits
//!
//! Platform capability traits that must be implemented by each host platform.
//!
//! ## Overview
//!
//! This crate defines the contract between the playback core and
//! platform-specific implementations. Each trait represents a capability the
//! core requires but that must be implemented differently per platform
//! (web/PWA, desktop shell, iOS webview, Android webview):
//!
//! - [`HardwarePlayer`](player::HardwarePlayer) — the physical media player
//!   (audio element, `AVPlayer`, ExoPlayer)
//! - [`MediaSessionSurface`](session::MediaSessionSurface) — lock-screen /
//!   notification transport UI and its inbound commands
//! - [`LifecycleEvents`](lifecycle::LifecycleEvents) — visibility, window
//!   focus, audio route and audio-focus interruption notifications
//! - [`TaskScheduler`](scheduler::TaskScheduler) — deferred and repeating
//!   timers with explicit cancellation handles
//! - [`Clock`](time::Clock) — time source for deterministic testing
//!
//! ## Progressive enhancement
//!
//! The media-session surface is optional by design: when
//! [`MediaSessionSurface::is_available`](session::MediaSessionSurface::is_available)
//! reports `false`, the core silently degrades rather than failing. Every
//! other capability is required; the core fails fast at construction when one
//! is missing or misconfigured.
//!
//! ## Thread Safety
//!
//! On native targets all bridge traits require `Send + Sync` so
//! implementations can be shared across async tasks. WebAssembly builds relax
//! the bounds through the [`platform`] marker traits, because browser-provided
//! objects are single-threaded.

pub mod lifecycle;
pub mod platform;
pub mod player;
pub mod scheduler;
pub mod session;
pub mod time;

// Re-export commonly used types
pub use lifecycle::{
    FocusState, InterruptionEvent, InterruptionReason, LifecycleCallback, LifecycleEvents,
    OutputDeviceChange, VisibilityState,
};
pub use player::{HardwarePlayer, HardwareSnapshot, PlayerEvent, PlayerEventHandler, PlayerFault};
pub use scheduler::{OneShotTask, RepeatingTask, ScheduleHandle, TaskFuture, TaskScheduler};
pub use session::{
    MediaSessionSurface, RemoteCommand, RemoteCommandHandler, SessionMetadata, SessionPlaybackState,
    SessionPosition,
};
pub use time::{Clock, SystemClock};
