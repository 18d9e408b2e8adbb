//! Deferred task scheduling with explicit cancellation handles.
//!
//! The core never owns a runtime; all timers (debounced settle checks, the
//! stall-detection poll, deferred command retries) go through this trait so
//! tests can drive them deterministically and hosts can map them onto their
//! own scheduling primitive (tokio timers, `setTimeout`, dispatch queues).

use crate::platform::PlatformSendSync;
use std::sync::Arc;
use std::time::Duration;

/// Future type produced by scheduled tasks.
#[cfg(not(target_arch = "wasm32"))]
pub type TaskFuture = futures_util::future::BoxFuture<'static, ()>;

#[cfg(target_arch = "wasm32")]
pub type TaskFuture = futures_util::future::LocalBoxFuture<'static, ()>;

/// One-shot task body.
#[cfg(not(target_arch = "wasm32"))]
pub type OneShotTask = Box<dyn FnOnce() -> TaskFuture + Send + 'static>;

#[cfg(target_arch = "wasm32")]
pub type OneShotTask = Box<dyn FnOnce() -> TaskFuture + 'static>;

/// Repeating task body, invoked once per period.
#[cfg(not(target_arch = "wasm32"))]
pub type RepeatingTask = Arc<dyn Fn() -> TaskFuture + Send + Sync + 'static>;

#[cfg(target_arch = "wasm32")]
pub type RepeatingTask = Arc<dyn Fn() -> TaskFuture + 'static>;

/// Cancellation handle for a scheduled task.
///
/// Dropping the handle detaches the task (it keeps running); only an explicit
/// [`ScheduleHandle::cancel`] stops it. Cancelling a one-shot task that has
/// not fired yet guarantees its body never runs.
pub trait ScheduleHandle: PlatformSendSync {
    /// Cancel the task. Idempotent.
    fn cancel(&self);

    /// `true` once [`ScheduleHandle::cancel`] has been called.
    fn is_cancelled(&self) -> bool;
}

/// Trait for platform task scheduling.
///
/// Implementations must defer execution: a scheduled task must never run on
/// the caller's stack inside `schedule_once`/`schedule_repeating`, even for a
/// zero delay. The core relies on this for its clear-then-set debounce to be
/// race-free.
pub trait TaskScheduler: PlatformSendSync {
    /// Run `task` once after `delay`.
    fn schedule_once(&self, delay: Duration, task: OneShotTask) -> Box<dyn ScheduleHandle>;

    /// Run `task` every `period`, starting one period from now.
    fn schedule_repeating(&self, period: Duration, task: RepeatingTask) -> Box<dyn ScheduleHandle>;
}
