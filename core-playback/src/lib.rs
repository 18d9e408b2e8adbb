//! # Playback State Reconciliation Core
//!
//! Keeps three observable states mutually consistent on platforms with
//! unreliable suspend/resume signals:
//!
//! - the **intended** state (what the app believes should be happening),
//! - the **hardware** state (what the physical player is really doing),
//! - the **OS media-session** state (what the lock screen shows).
//!
//! ```text
//! user / OS input ──► PlaybackStore ──► PlayerAdapter ──► hardware
//!                         ▲   │                              │
//!                         │   └──────► MediaSessionBridge    │ events
//!        corrections      │                  ▲               ▼
//!      Reconciler ◄── LifecycleMonitor ◄── platform lifecycle events
//! ```
//!
//! The store owns intent; the adapter owns hardware access; the bridge owns
//! the OS surface; the monitor decides *when* to reconcile and the
//! reconciler decides *what* to correct — exactly once per settle window, so
//! overlapping lifecycle events can never cause play/pause flicker.
//!
//! All platform access goes through the capability traits in
//! [`bridge_traits`]; hosts inject implementations via
//! [`engine::PlatformCapabilities`].

pub mod adapter;
pub mod config;
pub mod engine;
pub mod error;
pub mod interruption;
pub mod lifecycle;
pub mod reconciler;
pub mod session;
pub mod store;

pub use adapter::PlayerAdapter;
pub use config::{EngineConfig, ReconcilerConfig, ResumeConfig, SessionConfig};
pub use engine::{PlatformCapabilities, PlaybackEngine};
pub use error::{PlaybackError, Result};
pub use interruption::InterruptionGuard;
pub use lifecycle::LifecycleMonitor;
pub use reconciler::{ReconcileTrigger, ReconciliationEvent, Reconciler, ReconcilerPhase};
pub use session::MediaSessionBridge;
pub use store::{PlaybackIntent, PlaybackStore, PreviousAction, StoreObserver, TrackRef};
