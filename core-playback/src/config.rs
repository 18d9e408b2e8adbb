//! # Engine Configuration
//!
//! Configuration types for the playback engine: reconciliation timing, the
//! media-session publish throttle, and interruption resume behavior.
//!
//! The defaults unify thresholds that drifted apart across earlier ad-hoc
//! sync layers (different settle delays and stall check counts per surface);
//! one set of values now drives every path.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Reconciler timing configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconcilerConfig {
    /// Delay between a lifecycle trigger and the scheduled state check.
    ///
    /// Lets the platform finish its own transition (lock-screen dismissal,
    /// tab activation) before the hardware snapshot is trusted.
    ///
    /// Default: 200 ms.
    #[serde(default = "default_settle_delay")]
    pub settle_delay: Duration,

    /// Period of the low-frequency stall-detection poll.
    ///
    /// Default: 1 s.
    #[serde(default = "default_stall_poll_interval")]
    pub stall_poll_interval: Duration,

    /// Consecutive polls with an unchanged position required before a
    /// pause/seek/play recovery cycle runs.
    ///
    /// Default: 3.
    #[serde(default = "default_stall_strikes")]
    pub stall_strikes: u32,

    /// Position delta below which two consecutive polls count as "unchanged".
    ///
    /// Default: 100 ms.
    #[serde(default = "default_stall_epsilon")]
    pub stall_epsilon: Duration,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            settle_delay: default_settle_delay(),
            stall_poll_interval: default_stall_poll_interval(),
            stall_strikes: default_stall_strikes(),
            stall_epsilon: default_stall_epsilon(),
        }
    }
}

/// Media-session bridge configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Minimum interval between position publishes to the OS surface.
    ///
    /// Position updates flood the OS IPC channel otherwise; seeks and
    /// visibility transitions bypass the throttle.
    ///
    /// Default: 2 s.
    #[serde(default = "default_position_publish_interval")]
    pub position_publish_interval: Duration,

    /// Delay before the single deferred retry of a remote-command play that
    /// failed because the element was momentarily not ready.
    ///
    /// Default: 100 ms.
    #[serde(default = "default_command_retry_delay")]
    pub command_retry_delay: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            position_publish_interval: default_position_publish_interval(),
            command_retry_delay: default_command_retry_delay(),
        }
    }
}

/// Interruption resume configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumeConfig {
    /// Stabilization delay after audio focus returns before the resume
    /// attempt.
    ///
    /// Default: 300 ms.
    #[serde(default = "default_resume_delay")]
    pub resume_delay: Duration,

    /// Delay before the single resume retry when the first attempt fails.
    ///
    /// Default: 500 ms.
    #[serde(default = "default_resume_retry_delay")]
    pub resume_retry_delay: Duration,
}

impl Default for ResumeConfig {
    fn default() -> Self {
        Self {
            resume_delay: default_resume_delay(),
            resume_retry_delay: default_resume_retry_delay(),
        }
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub reconciler: ReconcilerConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub resume: ResumeConfig,
}

impl EngineConfig {
    /// Configuration tuned for fast-reacting surfaces (CarPlay projection):
    /// shorter settle delay and a faster stall poll.
    pub fn responsive() -> Self {
        Self {
            reconciler: ReconcilerConfig {
                settle_delay: Duration::from_millis(150),
                stall_poll_interval: Duration::from_millis(500),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Configuration tuned for battery-constrained hosts: longer settle
    /// delay, slower stall poll, sparser position publishes.
    pub fn relaxed() -> Self {
        Self {
            reconciler: ReconcilerConfig {
                settle_delay: Duration::from_millis(250),
                stall_poll_interval: Duration::from_secs(2),
                ..Default::default()
            },
            session: SessionConfig {
                position_publish_interval: Duration::from_secs(5),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.reconciler.settle_delay.is_zero() {
            return Err("settle_delay must be greater than zero".into());
        }
        if self.reconciler.stall_poll_interval.is_zero() {
            return Err("stall_poll_interval must be greater than zero".into());
        }
        if self.reconciler.stall_strikes == 0 {
            return Err("stall_strikes must be at least 1".into());
        }
        if self.session.position_publish_interval.is_zero() {
            return Err("position_publish_interval must be greater than zero".into());
        }
        Ok(())
    }
}

fn default_settle_delay() -> Duration {
    Duration::from_millis(200)
}

fn default_stall_poll_interval() -> Duration {
    Duration::from_secs(1)
}

fn default_stall_strikes() -> u32 {
    3
}

fn default_stall_epsilon() -> Duration {
    Duration::from_millis(100)
}

fn default_position_publish_interval() -> Duration {
    Duration::from_secs(2)
}

fn default_command_retry_delay() -> Duration {
    Duration::from_millis(100)
}

fn default_resume_delay() -> Duration {
    Duration::from_millis(300)
}

fn default_resume_retry_delay() -> Duration {
    Duration::from_millis(500)
}
