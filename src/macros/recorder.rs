//! Macro recorder
//!
//! Captures a timestamped action sequence from the global input hook
//! between a countdown-gated start and a stop signal.

use super::action::{ActionKind, MacroAction, PressState};
use super::types::MacroEvent;
use crate::input::InputEvent;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{broadcast, mpsc};
use tokio::time::{Duration, Instant, sleep, timeout};

#[derive(Debug, Clone)]
pub struct RecorderConfig {
    /// Armed delay before capture begins, announced second by second
    pub countdown_secs: u32,
    /// A press-and-release of this key ends the recording from inside the
    /// event stream
    pub stop_key: Option<String>,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            countdown_secs: 5,
            stop_key: None,
        }
    }
}

/// Interval at which idle waits re-check the cancellation flag.
const RECV_SLICE: Duration = Duration::from_millis(100);

/// Capture input events until cancelled, the stop key fires, or the hook
/// closes. Returns the recorded buffer; persisting it is the caller's
/// decision.
pub async fn run_recording(
    mut events: broadcast::Receiver<InputEvent>,
    config: RecorderConfig,
    cancel: Arc<AtomicBool>,
    event_tx: mpsc::Sender<MacroEvent>,
) -> Vec<MacroAction> {
    for remaining in (1..=config.countdown_secs).rev() {
        let _ = event_tx.send(MacroEvent::Countdown(remaining)).await;
        if sleep_cancellable(Duration::from_secs(1), &cancel).await {
            return Vec::new();
        }
    }
    if cancel.load(Ordering::Relaxed) {
        return Vec::new();
    }

    // Events observed while the countdown ran are not part of the macro
    while events.try_recv().is_ok() {}

    let _ = event_tx.send(MacroEvent::RecordingStarted).await;
    let start = Instant::now();
    let mut actions: Vec<MacroAction> = Vec::new();
    let mut last_move: Option<(i32, i32)> = None;

    loop {
        if cancel.load(Ordering::Relaxed) {
            break;
        }
        let event = match timeout(RECV_SLICE, events.recv()).await {
            Ok(Ok(event)) => event,
            Ok(Err(broadcast::error::RecvError::Lagged(skipped))) => {
                log::warn!("Input hook lagged, {skipped} events dropped from recording");
                continue;
            }
            Ok(Err(broadcast::error::RecvError::Closed)) => break,
            Err(_) => continue,
        };

        let time = start.elapsed().as_secs_f64();
        match event {
            InputEvent::MouseMove { x, y } => {
                // Coalesce repeated positions
                if last_move == Some((x, y)) {
                    continue;
                }
                last_move = Some((x, y));
                actions.push(MacroAction {
                    kind: ActionKind::Move { x, y },
                    time,
                });
            }
            InputEvent::ButtonPress { x, y, button } => {
                actions.push(MacroAction {
                    kind: ActionKind::Click {
                        x,
                        y,
                        button,
                        state: PressState::Press,
                    },
                    time,
                });
            }
            InputEvent::ButtonRelease { x, y, button } => {
                actions.push(MacroAction {
                    kind: ActionKind::Click {
                        x,
                        y,
                        button,
                        state: PressState::Release,
                    },
                    time,
                });
            }
            InputEvent::KeyPress { key } => {
                if config.stop_key.as_deref() == Some(key.as_str()) {
                    continue;
                }
                actions.push(MacroAction {
                    kind: ActionKind::Key {
                        key,
                        state: PressState::Press,
                    },
                    time,
                });
            }
            InputEvent::KeyRelease { key } => {
                if config.stop_key.as_deref() == Some(key.as_str()) {
                    break;
                }
                actions.push(MacroAction {
                    kind: ActionKind::Key {
                        key,
                        state: PressState::Release,
                    },
                    time,
                });
            }
        }
    }

    actions
}

/// Sleep in small slices, returning true as soon as the flag is set.
pub(crate) async fn sleep_cancellable(duration: Duration, cancel: &AtomicBool) -> bool {
    let deadline = Instant::now() + duration;
    loop {
        if cancel.load(Ordering::Relaxed) {
            return true;
        }
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return false;
        }
        sleep(remaining.min(RECV_SLICE)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{InputHook, MouseButton};

    fn instant_config() -> RecorderConfig {
        RecorderConfig {
            countdown_secs: 0,
            stop_key: None,
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_recording_coalesces_repeated_moves() {
        let hook = InputHook::detached();
        let events = hook.subscribe();
        let sender = hook.sender();
        let cancel = Arc::new(AtomicBool::new(false));
        let (event_tx, _event_rx) = mpsc::channel(32);

        let task = tokio::spawn(run_recording(
            events,
            instant_config(),
            Arc::clone(&cancel),
            event_tx,
        ));

        // Let the recorder pass its countdown and drain phase
        sleep(Duration::from_millis(50)).await;
        sender.send(InputEvent::MouseMove { x: 10, y: 10 }).unwrap();
        sender.send(InputEvent::MouseMove { x: 10, y: 10 }).unwrap();
        sender.send(InputEvent::MouseMove { x: 20, y: 20 }).unwrap();
        sender
            .send(InputEvent::ButtonPress {
                x: 20,
                y: 20,
                button: MouseButton::Left,
            })
            .unwrap();
        sleep(Duration::from_millis(100)).await;
        cancel.store(true, Ordering::Relaxed);

        let actions = task.await.unwrap();
        assert_eq!(actions.len(), 3, "duplicate move must be dropped: {actions:?}");
        assert!(matches!(actions[0].kind, ActionKind::Move { x: 10, y: 10 }));
        assert!(matches!(actions[1].kind, ActionKind::Move { x: 20, y: 20 }));
        assert!(matches!(
            actions[2].kind,
            ActionKind::Click {
                state: PressState::Press,
                ..
            }
        ));

        // Timestamps are monotonically non-decreasing
        for pair in actions.windows(2) {
            assert!(pair[0].time <= pair[1].time);
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_stop_key_ends_recording_without_being_recorded() {
        let hook = InputHook::detached();
        let events = hook.subscribe();
        let sender = hook.sender();
        let cancel = Arc::new(AtomicBool::new(false));
        let (event_tx, _event_rx) = mpsc::channel(32);
        let config = RecorderConfig {
            countdown_secs: 0,
            stop_key: Some("f6".to_string()),
        };

        let task = tokio::spawn(run_recording(events, config, Arc::clone(&cancel), event_tx));

        sleep(Duration::from_millis(50)).await;
        sender
            .send(InputEvent::KeyPress {
                key: "a".to_string(),
            })
            .unwrap();
        sender
            .send(InputEvent::KeyPress {
                key: "f6".to_string(),
            })
            .unwrap();
        sender
            .send(InputEvent::KeyRelease {
                key: "f6".to_string(),
            })
            .unwrap();

        // The recorder ends on its own; no cancel needed
        let actions = tokio::time::timeout(Duration::from_secs(2), task)
            .await
            .expect("stop key should end the recording")
            .unwrap();
        assert_eq!(actions.len(), 1);
        assert!(matches!(
            &actions[0].kind,
            ActionKind::Key { key, state: PressState::Press } if key == "a"
        ));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_cancel_during_countdown_discards_everything() {
        let hook = InputHook::detached();
        let events = hook.subscribe();
        let cancel = Arc::new(AtomicBool::new(false));
        let (event_tx, mut event_rx) = mpsc::channel(32);
        let config = RecorderConfig {
            countdown_secs: 5,
            stop_key: None,
        };

        let task = tokio::spawn(run_recording(events, config, Arc::clone(&cancel), event_tx));

        // First countdown announcement proves the recorder is armed
        let first = tokio::time::timeout(Duration::from_secs(2), event_rx.recv())
            .await
            .unwrap();
        assert!(matches!(first, Some(MacroEvent::Countdown(5))));

        cancel.store(true, Ordering::Relaxed);
        let actions = tokio::time::timeout(Duration::from_secs(2), task)
            .await
            .expect("cancel should end the countdown")
            .unwrap();
        assert!(actions.is_empty());
    }
}
