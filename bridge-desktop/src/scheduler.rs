//! Tokio-backed task scheduler for native hosts.

use bridge_traits::scheduler::{OneShotTask, RepeatingTask, ScheduleHandle, TaskScheduler};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::trace;

/// Task scheduler that maps the bridge contract onto tokio timers.
///
/// Must be constructed and used inside a tokio runtime: every scheduled task
/// is spawned onto the ambient runtime. Execution is always deferred through
/// `tokio::time::sleep`, satisfying the contract that tasks never run on the
/// caller's stack.
pub struct TokioTaskScheduler;

impl TokioTaskScheduler {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TokioTaskScheduler {
    fn default() -> Self {
        Self::new()
    }
}

struct TokioScheduleHandle {
    cancelled: Arc<AtomicBool>,
    join: Mutex<Option<JoinHandle<()>>>,
}

impl ScheduleHandle for TokioScheduleHandle {
    fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        if let Some(join) = self.join.lock().take() {
            join.abort();
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

impl TaskScheduler for TokioTaskScheduler {
    fn schedule_once(&self, delay: Duration, task: OneShotTask) -> Box<dyn ScheduleHandle> {
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);
        let join = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if flag.load(Ordering::SeqCst) {
                return;
            }
            trace!(delay_ms = delay.as_millis() as u64, "one-shot task firing");
            task().await;
        });
        Box::new(TokioScheduleHandle {
            cancelled,
            join: Mutex::new(Some(join)),
        })
    }

    fn schedule_repeating(&self, period: Duration, task: RepeatingTask) -> Box<dyn ScheduleHandle> {
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);
        let join = tokio::spawn(async move {
            loop {
                tokio::time::sleep(period).await;
                if flag.load(Ordering::SeqCst) {
                    return;
                }
                task().await;
            }
        });
        Box::new(TokioScheduleHandle {
            cancelled,
            join: Mutex::new(Some(join)),
        })
    }
}
