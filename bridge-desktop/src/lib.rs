//! # Desktop Bridge Implementations
//!
//! Tokio-backed implementations of the platform capability traits for native
//! hosts:
//!
//! - [`TokioTaskScheduler`](scheduler::TokioTaskScheduler) — timers on the
//!   ambient tokio runtime
//! - [`DesktopLifecycleHub`](lifecycle::DesktopLifecycleHub) — lifecycle
//!   event fan-out fed by the host's windowing layer
//! - [`UnavailableMediaSession`](session::UnavailableMediaSession) — surface
//!   stub for hosts without a lock-screen equivalent
//!
//! The hardware player itself stays host-specific (an audio element, an
//! `AVPlayer`, a native output stack) and is injected by the shell.

pub mod lifecycle;
pub mod scheduler;
pub mod session;

pub use lifecycle::DesktopLifecycleHub;
pub use scheduler::TokioTaskScheduler;
pub use session::UnavailableMediaSession;
