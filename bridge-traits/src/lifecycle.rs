//! Lifecycle and audio-focus event sources.
//!
//! Mobile browsers and webview shells deliver app lifecycle transitions
//! (lock/unlock, tab switches, window focus), audio route changes (CarPlay or
//! Bluetooth connect/disconnect) and audio-focus interruptions (phone calls)
//! through platform-specific channels. This trait normalizes them into
//! callback registrations the core subscribes to once at startup.
//!
//! Event sources only report transitions; deciding whether any corrective
//! action is warranted belongs to the core.

use crate::platform::PlatformSendSync;

/// App visibility, as in the page-visibility sense: `Hidden` covers the
/// device lock screen, background tabs, and minimized webviews.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibilityState {
    Visible,
    Hidden,
}

/// Window focus state. Distinct from visibility: a window can be visible but
/// unfocused (split screen, CarPlay projection).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusState {
    Focused,
    Blurred,
}

/// Audio output routing change (e.g., CarPlay or a Bluetooth speaker
/// connecting or disconnecting).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputDeviceChange {
    /// Identifier of the new default output device, when the platform
    /// exposes one.
    pub device_id: Option<String>,
}

/// Why the platform took audio focus away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptionReason {
    PhoneCall,
    SystemNotification,
    DeviceDisconnected,
    Unknown,
}

/// Audio-focus interruption transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptionEvent {
    /// Focus was taken away; playback should be paused by the observer.
    Began(InterruptionReason),
    /// Focus returned; playback may be resumed.
    Ended,
}

/// Callback type for lifecycle registrations.
///
/// Callbacks are invoked on the host's event loop and must not block.
#[cfg(not(target_arch = "wasm32"))]
pub type LifecycleCallback<T> = Box<dyn Fn(T) + Send + Sync>;

#[cfg(target_arch = "wasm32")]
pub type LifecycleCallback<T> = Box<dyn Fn(T)>;

/// Trait for the platform's lifecycle event sources.
///
/// Registrations are additive: every registered callback observes every
/// event for the lifetime of the source.
pub trait LifecycleEvents: PlatformSendSync {
    /// Register for app visibility transitions.
    fn on_visibility_change(&self, callback: LifecycleCallback<VisibilityState>);

    /// Register for window focus transitions.
    fn on_focus_change(&self, callback: LifecycleCallback<FocusState>);

    /// Register for audio output device changes.
    fn on_output_device_change(&self, callback: LifecycleCallback<OutputDeviceChange>);

    /// Register for audio-focus interruptions.
    fn on_interruption(&self, callback: LifecycleCallback<InterruptionEvent>);
}
