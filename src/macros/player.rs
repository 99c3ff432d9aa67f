//! Macro player
//!
//! Replays a recorded action sequence with the original inter-event
//! timing scaled by a speed factor. Runs on a blocking thread; the
//! cancellation flag is checked between and within event sleeps, so a
//! stop request takes effect within one sleep slice.

use super::action::{ActionKind, MacroAction, PressState, Recording};
use super::types::MacroEvent;
use crate::input::InputInjector;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// Granularity at which replay sleeps re-check cancellation.
pub const CANCEL_CHECK_SLICE: Duration = Duration::from_millis(50);

#[derive(Debug, Clone)]
pub struct ReplayOptions {
    /// Recorded delays are divided by this factor
    pub speed_factor: f64,
    /// 0 repeats until cancelled; N > 0 repeats exactly N times
    pub loop_count: u32,
    /// Armed delay before the first pass, announced second by second
    pub countdown_secs: u32,
    /// Smoothing duration for replayed pointer moves
    pub mouse_move_duration: Duration,
}

impl Default for ReplayOptions {
    fn default() -> Self {
        Self {
            speed_factor: 1.0,
            loop_count: 1,
            countdown_secs: 0,
            mouse_move_duration: Duration::from_millis(50),
        }
    }
}

/// Replay the recording, returning the number of completed passes.
///
/// The injector failsafe is disabled for the duration and restored on
/// completion or cancellation.
pub fn run_replay_blocking(
    recording: &Recording,
    injector: &mut dyn InputInjector,
    options: &ReplayOptions,
    cancel: &AtomicBool,
    event_tx: &mpsc::Sender<MacroEvent>,
) -> u32 {
    for remaining in (1..=options.countdown_secs).rev() {
        let _ = event_tx.blocking_send(MacroEvent::Countdown(remaining));
        if sleep_blocking_cancellable(Duration::from_secs(1), cancel) {
            return 0;
        }
    }

    let speed = if options.speed_factor > 0.0 {
        options.speed_factor
    } else {
        1.0
    };

    injector.set_failsafe(false);

    let mut completed = 0u32;
    while !cancel.load(Ordering::Relaxed)
        && (options.loop_count == 0 || completed < options.loop_count)
    {
        let mut last_time = 0.0f64;
        for action in &recording.actions {
            if cancel.load(Ordering::Relaxed) {
                break;
            }
            let delay = action.time - last_time;
            if delay > 0.0
                && sleep_blocking_cancellable(Duration::from_secs_f64(delay / speed), cancel)
            {
                break;
            }
            perform(injector, action, options);
            last_time = action.time;
        }
        if cancel.load(Ordering::Relaxed) {
            break;
        }
        completed += 1;
        let _ = event_tx.blocking_send(MacroEvent::ReplayLoop(completed));
    }

    injector.set_failsafe(true);
    completed
}

fn perform(injector: &mut dyn InputInjector, action: &MacroAction, options: &ReplayOptions) {
    let outcome = match &action.kind {
        ActionKind::Move { x, y } => {
            injector.mouse_move_smooth(*x, *y, options.mouse_move_duration)
        }
        ActionKind::Click {
            x,
            y,
            button,
            state,
        } => match state {
            PressState::Press => injector.mouse_down(*x, *y, *button),
            PressState::Release => injector.mouse_up(*x, *y, *button),
        },
        ActionKind::Key { key, state } => match state {
            PressState::Press => injector.key_down(key),
            PressState::Release => injector.key_up(key),
        },
    };
    if let Err(e) = outcome {
        log::warn!("Failed to inject {:?}: {e}", action.kind);
    }
}

fn sleep_blocking_cancellable(duration: Duration, cancel: &AtomicBool) -> bool {
    let deadline = Instant::now() + duration;
    loop {
        if cancel.load(Ordering::Relaxed) {
            return true;
        }
        let now = Instant::now();
        if now >= deadline {
            return false;
        }
        std::thread::sleep((deadline - now).min(CANCEL_CHECK_SLICE));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{InjectedAction, MouseButton, NoopInjector};
    use std::sync::{Arc, Mutex};

    fn sample_recording() -> Recording {
        Recording::new(vec![
            MacroAction {
                kind: ActionKind::Move { x: 10, y: 20 },
                time: 0.0,
            },
            MacroAction {
                kind: ActionKind::Click {
                    x: 10,
                    y: 20,
                    button: MouseButton::Left,
                    state: PressState::Press,
                },
                time: 0.02,
            },
            MacroAction {
                kind: ActionKind::Key {
                    key: "enter".to_string(),
                    state: PressState::Press,
                },
                time: 0.04,
            },
        ])
    }

    fn logged_injector() -> (NoopInjector, Arc<Mutex<Vec<InjectedAction>>>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        (NoopInjector::with_log(Arc::clone(&log)), log)
    }

    fn injected_without_failsafe(log: &Arc<Mutex<Vec<InjectedAction>>>) -> Vec<InjectedAction> {
        log.lock()
            .unwrap()
            .iter()
            .filter(|a| !matches!(a, InjectedAction::Failsafe(_)))
            .cloned()
            .collect()
    }

    #[test]
    fn test_single_replay_preserves_count_and_order() {
        let recording = sample_recording();
        let (mut injector, log) = logged_injector();
        let cancel = AtomicBool::new(false);
        let (event_tx, _event_rx) = mpsc::channel(32);

        let completed = run_replay_blocking(
            &recording,
            &mut injector,
            &ReplayOptions::default(),
            &cancel,
            &event_tx,
        );

        assert_eq!(completed, 1);
        let actions = injected_without_failsafe(&log);
        assert_eq!(
            actions,
            vec![
                InjectedAction::MouseMove(10, 20),
                InjectedAction::MouseDown(10, 20, MouseButton::Left),
                InjectedAction::KeyDown("enter".to_string()),
            ]
        );
    }

    #[test]
    fn test_replay_loops_exactly_n_times() {
        let recording = sample_recording();
        let (mut injector, log) = logged_injector();
        let cancel = AtomicBool::new(false);
        let (event_tx, _event_rx) = mpsc::channel(32);
        let options = ReplayOptions {
            loop_count: 3,
            speed_factor: 4.0,
            ..ReplayOptions::default()
        };

        let completed =
            run_replay_blocking(&recording, &mut injector, &options, &cancel, &event_tx);

        assert_eq!(completed, 3);
        assert_eq!(injected_without_failsafe(&log).len(), 9);
    }

    #[test]
    fn test_infinite_replay_stops_on_cancel() {
        let recording = sample_recording();
        let log = Arc::new(Mutex::new(Vec::new()));
        let task_log = Arc::clone(&log);
        let cancel = Arc::new(AtomicBool::new(false));
        let task_cancel = Arc::clone(&cancel);
        let (event_tx, _event_rx) = mpsc::channel(256);

        let handle = std::thread::spawn(move || {
            let mut injector = NoopInjector::with_log(task_log);
            let options = ReplayOptions {
                loop_count: 0,
                ..ReplayOptions::default()
            };
            run_replay_blocking(&recording, &mut injector, &options, &task_cancel, &event_tx)
        });

        std::thread::sleep(Duration::from_millis(200));
        cancel.store(true, Ordering::Relaxed);
        let completed = handle.join().unwrap();

        assert!(completed >= 1, "infinite replay should have looped");
        let issued = log.lock().unwrap().len();
        std::thread::sleep(Duration::from_millis(100));
        // No further actions after cancellation
        assert_eq!(log.lock().unwrap().len(), issued);
    }

    #[test]
    fn test_speed_factor_scales_delays() {
        let recording = Recording::new(vec![
            MacroAction {
                kind: ActionKind::Key {
                    key: "a".to_string(),
                    state: PressState::Press,
                },
                time: 0.0,
            },
            MacroAction {
                kind: ActionKind::Key {
                    key: "b".to_string(),
                    state: PressState::Press,
                },
                time: 0.4,
            },
        ]);
        let (mut injector, _log) = logged_injector();
        let cancel = AtomicBool::new(false);
        let (event_tx, _event_rx) = mpsc::channel(32);
        let options = ReplayOptions {
            speed_factor: 2.0,
            ..ReplayOptions::default()
        };

        let started = Instant::now();
        run_replay_blocking(&recording, &mut injector, &options, &cancel, &event_tx);
        let elapsed = started.elapsed();

        // 0.4s of recorded delay at double speed: roughly 0.2s
        assert!(elapsed >= Duration::from_millis(150), "elapsed {elapsed:?}");
        assert!(elapsed < Duration::from_millis(600), "elapsed {elapsed:?}");
    }

    #[test]
    fn test_failsafe_disabled_then_restored() {
        let recording = sample_recording();
        let (mut injector, log) = logged_injector();
        let cancel = AtomicBool::new(false);
        let (event_tx, _event_rx) = mpsc::channel(32);

        run_replay_blocking(
            &recording,
            &mut injector,
            &ReplayOptions::default(),
            &cancel,
            &event_tx,
        );

        let actions = log.lock().unwrap();
        assert_eq!(actions.first(), Some(&InjectedAction::Failsafe(false)));
        assert_eq!(actions.last(), Some(&InjectedAction::Failsafe(true)));
    }
}
