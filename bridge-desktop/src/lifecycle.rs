//! Host-fed lifecycle event hub for native shells.

use bridge_traits::lifecycle::{
    FocusState, InterruptionEvent, LifecycleCallback, LifecycleEvents, OutputDeviceChange,
    VisibilityState,
};
use parking_lot::Mutex;
use tracing::debug;

/// Lifecycle event source fed by the host's windowing layer.
///
/// Desktop shells receive minimize/restore, focus and audio-route events
/// through their window toolkit; the shell forwards them into this hub and
/// the hub fans them out to every registered core callback. Callbacks run
/// synchronously on the caller's thread.
#[derive(Default)]
pub struct DesktopLifecycleHub {
    visibility: Mutex<Vec<LifecycleCallback<VisibilityState>>>,
    focus: Mutex<Vec<LifecycleCallback<FocusState>>>,
    device: Mutex<Vec<LifecycleCallback<OutputDeviceChange>>>,
    interruption: Mutex<Vec<LifecycleCallback<InterruptionEvent>>>,
}

impl DesktopLifecycleHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report an app visibility transition.
    pub fn set_visibility(&self, state: VisibilityState) {
        debug!(?state, "visibility transition");
        for callback in self.visibility.lock().iter() {
            callback(state);
        }
    }

    /// Report a window focus transition.
    pub fn set_focus(&self, state: FocusState) {
        debug!(?state, "focus transition");
        for callback in self.focus.lock().iter() {
            callback(state);
        }
    }

    /// Report an audio output device change.
    pub fn notify_device_change(&self, device_id: Option<String>) {
        let change = OutputDeviceChange { device_id };
        for callback in self.device.lock().iter() {
            callback(change.clone());
        }
    }

    /// Report an audio-focus interruption transition.
    pub fn notify_interruption(&self, event: InterruptionEvent) {
        debug!(?event, "audio-focus interruption");
        for callback in self.interruption.lock().iter() {
            callback(event);
        }
    }
}

impl LifecycleEvents for DesktopLifecycleHub {
    fn on_visibility_change(&self, callback: LifecycleCallback<VisibilityState>) {
        self.visibility.lock().push(callback);
    }

    fn on_focus_change(&self, callback: LifecycleCallback<FocusState>) {
        self.focus.lock().push(callback);
    }

    fn on_output_device_change(&self, callback: LifecycleCallback<OutputDeviceChange>) {
        self.device.lock().push(callback);
    }

    fn on_interruption(&self, callback: LifecycleCallback<InterruptionEvent>) {
        self.interruption.lock().push(callback);
    }
}
