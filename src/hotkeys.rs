//! Global hotkey surface
//!
//! Each named control action is a thread-safe flag raised from the input
//! hook and drained by the control loop. The engines never see key events
//! directly; they only receive commands dispatched from these signals.

use crate::input::{InputEvent, InputHook};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HotkeyAction {
    StartRecording,
    StopRecording,
    ReplayLooped,
    ReplayCounted,
    StopReplay,
    CancelAll,
}

/// Key-name to action map.
#[derive(Debug, Clone)]
pub struct HotkeyBindings {
    bindings: Vec<(String, HotkeyAction)>,
}

impl Default for HotkeyBindings {
    fn default() -> Self {
        Self {
            bindings: vec![
                ("f5".to_string(), HotkeyAction::StartRecording),
                ("f6".to_string(), HotkeyAction::StopRecording),
                ("f7".to_string(), HotkeyAction::ReplayLooped),
                ("f9".to_string(), HotkeyAction::ReplayCounted),
                ("f8".to_string(), HotkeyAction::StopReplay),
                ("f10".to_string(), HotkeyAction::CancelAll),
            ],
        }
    }
}

impl HotkeyBindings {
    pub fn action_for(&self, key: &str) -> Option<HotkeyAction> {
        self.bindings
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, action)| *action)
    }
}

/// One raised/consumed flag per hotkey action.
#[derive(Debug, Default)]
pub struct HotkeySignals {
    start_recording: AtomicBool,
    stop_recording: AtomicBool,
    replay_looped: AtomicBool,
    replay_counted: AtomicBool,
    stop_replay: AtomicBool,
    cancel_all: AtomicBool,
}

impl HotkeySignals {
    fn flag(&self, action: HotkeyAction) -> &AtomicBool {
        match action {
            HotkeyAction::StartRecording => &self.start_recording,
            HotkeyAction::StopRecording => &self.stop_recording,
            HotkeyAction::ReplayLooped => &self.replay_looped,
            HotkeyAction::ReplayCounted => &self.replay_counted,
            HotkeyAction::StopReplay => &self.stop_replay,
            HotkeyAction::CancelAll => &self.cancel_all,
        }
    }

    /// Thread-safe "signal received" entry point.
    pub fn raise(&self, action: HotkeyAction) {
        self.flag(action).store(true, Ordering::SeqCst);
    }

    /// Consume a raised signal. Returns true at most once per raise.
    pub fn take(&self, action: HotkeyAction) -> bool {
        self.flag(action).swap(false, Ordering::SeqCst)
    }
}

/// Raise signals from global key presses according to the bindings.
pub fn spawn_hotkey_listener(
    hook: &InputHook,
    bindings: HotkeyBindings,
    signals: Arc<HotkeySignals>,
) -> JoinHandle<()> {
    let mut events = hook.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(InputEvent::KeyPress { key }) => {
                    if let Some(action) = bindings.action_for(&key) {
                        log::debug!("Hotkey '{key}' -> {action:?}");
                        signals.raise(action);
                    }
                }
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{Duration, sleep};

    #[test]
    fn test_signals_are_consumed_once() {
        let signals = HotkeySignals::default();
        assert!(!signals.take(HotkeyAction::StopReplay));

        signals.raise(HotkeyAction::StopReplay);
        assert!(signals.take(HotkeyAction::StopReplay));
        assert!(!signals.take(HotkeyAction::StopReplay));
    }

    #[test]
    fn test_default_bindings() {
        let bindings = HotkeyBindings::default();
        assert_eq!(bindings.action_for("f5"), Some(HotkeyAction::StartRecording));
        assert_eq!(bindings.action_for("f10"), Some(HotkeyAction::CancelAll));
        assert_eq!(bindings.action_for("a"), None);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_listener_raises_signal_on_bound_key() {
        let hook = InputHook::detached();
        let signals = Arc::new(HotkeySignals::default());
        let _listener = spawn_hotkey_listener(&hook, HotkeyBindings::default(), Arc::clone(&signals));

        // Give the listener task a moment to subscribe-and-poll
        sleep(Duration::from_millis(50)).await;
        hook.sender()
            .send(InputEvent::KeyPress {
                key: "f7".to_string(),
            })
            .unwrap();
        sleep(Duration::from_millis(100)).await;

        assert!(signals.take(HotkeyAction::ReplayLooped));
        assert!(!signals.take(HotkeyAction::StartRecording));
    }
}
