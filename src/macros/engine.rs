// Finite State Machine implementation for the macro engine
use super::action::{MacroAction, Recording};
use super::player::{ReplayOptions, run_replay_blocking};
use super::recorder::{RecorderConfig, run_recording};
use super::types::{MacroCommand, MacroEngineState, MacroEvent};
use crate::input::{InjectorFactory, InputHook};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Duration, sleep};

// Macro for debug output
macro_rules! debug_print {
    ($debug_enabled:expr, $($arg:tt)*) => {
        if $debug_enabled {
            println!($($arg)*);
        }
    };
}

struct ActiveRecording {
    handle: JoinHandle<Vec<MacroAction>>,
    cancel: Arc<AtomicBool>,
    save_to: Option<PathBuf>,
}

struct ActiveReplay {
    handle: JoinHandle<u32>,
    cancel: Arc<AtomicBool>,
}

pub struct MacroEngine {
    state: MacroEngineState,
    recorder_config: RecorderConfig,
    replay_options: ReplayOptions,
    hook: InputHook,
    injector_factory: Arc<InjectorFactory>,
    command_rx: mpsc::Receiver<MacroCommand>,
    event_tx: mpsc::Sender<MacroEvent>,
    recording: Option<ActiveRecording>,
    replay: Option<ActiveReplay>,
    should_exit: bool,
    debug_enabled: bool,
}

impl MacroEngine {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        hook: InputHook,
        injector_factory: Arc<InjectorFactory>,
        recorder_config: RecorderConfig,
        replay_options: ReplayOptions,
        command_rx: mpsc::Receiver<MacroCommand>,
        event_tx: mpsc::Sender<MacroEvent>,
        debug_enabled: bool,
    ) -> Self {
        Self {
            state: MacroEngineState::Idle,
            recorder_config,
            replay_options,
            hook,
            injector_factory,
            command_rx,
            event_tx,
            recording: None,
            replay: None,
            should_exit: false,
            debug_enabled,
        }
    }

    pub fn state(&self) -> &MacroEngineState {
        &self.state
    }

    pub async fn run(&mut self) {
        debug_print!(self.debug_enabled, "🎬 Macro engine FSM loop started");

        loop {
            // Check for commands (non-blocking)
            if let Ok(command) = self.command_rx.try_recv() {
                self.process_command(command).await;
            }

            self.reap_finished_tasks().await;
            sleep(Duration::from_millis(100)).await;

            if self.should_exit {
                break;
            }
        }

        debug_print!(self.debug_enabled, "🎬 Macro engine FSM loop ended");
    }

    async fn process_command(&mut self, command: MacroCommand) {
        debug_print!(self.debug_enabled, "🎬 Processing macro command: {:?}", command);
        match command {
            MacroCommand::StartRecording { save_to } => {
                if self.state != MacroEngineState::Idle {
                    debug_print!(self.debug_enabled, "🎬 Engine busy, ignoring record start");
                    return;
                }
                let cancel = Arc::new(AtomicBool::new(false));
                let events = self.hook.subscribe();
                let handle = tokio::spawn(run_recording(
                    events,
                    self.recorder_config.clone(),
                    Arc::clone(&cancel),
                    self.event_tx.clone(),
                ));
                self.recording = Some(ActiveRecording {
                    handle,
                    cancel,
                    save_to,
                });
                self.state = MacroEngineState::Recording;
                debug_print!(
                    self.debug_enabled,
                    "⏺️ Recording armed ({}s countdown)",
                    self.recorder_config.countdown_secs
                );
            }
            MacroCommand::StopRecording => {
                if self.recording.is_some() {
                    self.finish_recording().await;
                } else {
                    debug_print!(self.debug_enabled, "🎬 No recording in progress");
                }
            }
            MacroCommand::StartReplay { file, loop_count } => {
                if self.state != MacroEngineState::Idle {
                    debug_print!(self.debug_enabled, "🎬 Engine busy, ignoring replay start");
                    return;
                }
                let recording = match Recording::load(&file) {
                    Ok(recording) => recording,
                    Err(e) => {
                        log::error!("Replay aborted: {e}");
                        let _ = self.event_tx.send(MacroEvent::Error(e.to_string())).await;
                        return;
                    }
                };

                let cancel = Arc::new(AtomicBool::new(false));
                let options = ReplayOptions {
                    loop_count,
                    ..self.replay_options.clone()
                };
                let factory = Arc::clone(&self.injector_factory);
                let event_tx = self.event_tx.clone();
                let task_cancel = Arc::clone(&cancel);
                let handle = tokio::task::spawn_blocking(move || {
                    let mut injector = factory();
                    run_replay_blocking(
                        &recording,
                        injector.as_mut(),
                        &options,
                        &task_cancel,
                        &event_tx,
                    )
                });

                let _ = self
                    .event_tx
                    .send(MacroEvent::ReplayStarted { loop_count })
                    .await;
                self.replay = Some(ActiveReplay { handle, cancel });
                self.state = MacroEngineState::Replaying;
                debug_print!(
                    self.debug_enabled,
                    "▶️ Replay started (loop_count={})",
                    loop_count
                );
            }
            MacroCommand::StopReplay => {
                if let Some(replay) = &self.replay {
                    replay.cancel.store(true, Ordering::Relaxed);
                    debug_print!(self.debug_enabled, "⏹️ Replay stop requested");
                } else {
                    debug_print!(self.debug_enabled, "🎬 No replay in progress");
                }
            }
            MacroCommand::Shutdown => {
                if self.recording.is_some() {
                    self.finish_recording().await;
                }
                if let Some(replay) = &self.replay {
                    replay.cancel.store(true, Ordering::Relaxed);
                }
                if self.replay.is_some() {
                    self.finish_replay().await;
                }
                self.should_exit = true;
                debug_print!(self.debug_enabled, "🛑 Macro engine shutting down");
            }
        }
    }

    /// Pick up recorder/replay tasks that ended on their own (stop key,
    /// finite loop count).
    async fn reap_finished_tasks(&mut self) {
        if self.recording.as_ref().is_some_and(|t| t.handle.is_finished()) {
            self.finish_recording().await;
        }
        if self.replay.as_ref().is_some_and(|t| t.handle.is_finished()) {
            self.finish_replay().await;
        }
    }

    async fn finish_recording(&mut self) {
        let Some(task) = self.recording.take() else {
            return;
        };
        task.cancel.store(true, Ordering::Relaxed);
        let actions = match task.handle.await {
            Ok(actions) => actions,
            Err(e) => {
                log::error!("Recorder task failed: {e}");
                Vec::new()
            }
        };

        let count = actions.len();
        let mut saved_to = None;
        if let Some(path) = task.save_to {
            let recording = Recording::new(actions);
            match recording.save(&path) {
                Ok(()) => saved_to = Some(path),
                Err(e) => {
                    log::error!("Failed to save recording: {e}");
                    let _ = self.event_tx.send(MacroEvent::Error(e.to_string())).await;
                }
            }
        }

        debug_print!(
            self.debug_enabled,
            "⏺️ Recording finished: {} actions, saved_to={:?}",
            count,
            saved_to
        );
        let _ = self
            .event_tx
            .send(MacroEvent::RecordingFinished { count, saved_to })
            .await;
        self.state = MacroEngineState::Idle;
    }

    async fn finish_replay(&mut self) {
        let Some(task) = self.replay.take() else {
            return;
        };
        let completed_loops = match task.handle.await {
            Ok(completed) => completed,
            Err(e) => {
                log::error!("Replay task failed: {e}");
                0
            }
        };

        debug_print!(
            self.debug_enabled,
            "⏹️ Replay finished after {} loops",
            completed_loops
        );
        let _ = self
            .event_tx
            .send(MacroEvent::ReplayFinished { completed_loops })
            .await;
        self.state = MacroEngineState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{InputEvent, InputInjector, MouseButton, NoopInjector};
    use crate::macros::channels::create_macro_channels;
    use std::sync::Mutex;
    use tokio::time::timeout;

    async fn wait_for_event(
        event_rx: &mut mpsc::Receiver<MacroEvent>,
        mut predicate: impl FnMut(&MacroEvent) -> bool,
    ) -> Option<MacroEvent> {
        timeout(Duration::from_secs(5), async {
            while let Some(event) = event_rx.recv().await {
                if predicate(&event) {
                    return Some(event);
                }
            }
            None
        })
        .await
        .ok()
        .flatten()
    }

    fn noop_factory() -> Arc<InjectorFactory> {
        Arc::new(|| Box::new(NoopInjector::new()) as Box<dyn InputInjector>)
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_record_save_and_replay_round_trip() {
        let path = std::env::temp_dir().join("card-macro-run-engine-roundtrip.txt");
        std::fs::remove_file(&path).ok();

        let hook = InputHook::detached();
        let sender = hook.sender();
        let log = Arc::new(Mutex::new(Vec::new()));
        let factory_log = Arc::clone(&log);
        let factory: Arc<InjectorFactory> = Arc::new(move || {
            Box::new(NoopInjector::with_log(Arc::clone(&factory_log))) as Box<dyn InputInjector>
        });

        let (cmd_tx, cmd_rx, event_tx, mut event_rx) = create_macro_channels();
        let mut engine = MacroEngine::new(
            hook,
            factory,
            RecorderConfig {
                countdown_secs: 0,
                stop_key: None,
            },
            ReplayOptions::default(),
            cmd_rx,
            event_tx,
            false,
        );
        let handle = tokio::spawn(async move {
            engine.run().await;
            engine
        });

        cmd_tx
            .send(MacroCommand::StartRecording {
                save_to: Some(path.clone()),
            })
            .await
            .unwrap();

        let started =
            wait_for_event(&mut event_rx, |e| matches!(e, MacroEvent::RecordingStarted)).await;
        assert!(started.is_some());

        sender.send(InputEvent::MouseMove { x: 5, y: 6 }).unwrap();
        sender
            .send(InputEvent::ButtonPress {
                x: 5,
                y: 6,
                button: MouseButton::Left,
            })
            .unwrap();
        sleep(Duration::from_millis(100)).await;

        cmd_tx.send(MacroCommand::StopRecording).await.unwrap();
        let finished = wait_for_event(&mut event_rx, |e| {
            matches!(e, MacroEvent::RecordingFinished { .. })
        })
        .await;
        match finished {
            Some(MacroEvent::RecordingFinished { count, saved_to }) => {
                assert_eq!(count, 2);
                assert_eq!(saved_to, Some(path.clone()));
            }
            other => panic!("unexpected event {other:?}"),
        }

        cmd_tx
            .send(MacroCommand::StartReplay {
                file: path.clone(),
                loop_count: 1,
            })
            .await
            .unwrap();
        let done = wait_for_event(&mut event_rx, |e| {
            matches!(e, MacroEvent::ReplayFinished { .. })
        })
        .await;
        assert!(matches!(
            done,
            Some(MacroEvent::ReplayFinished { completed_loops: 1 })
        ));
        assert_eq!(log.lock().unwrap().len(), 4, "failsafe toggles + 2 actions");

        cmd_tx.send(MacroCommand::Shutdown).await.unwrap();
        let engine = handle.await.unwrap();
        assert_eq!(*engine.state(), MacroEngineState::Idle);

        std::fs::remove_file(&path).ok();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_replay_of_missing_file_reports_error_and_stays_idle() {
        let hook = InputHook::detached();
        let (cmd_tx, cmd_rx, event_tx, mut event_rx) = create_macro_channels();
        let mut engine = MacroEngine::new(
            hook,
            noop_factory(),
            RecorderConfig::default(),
            ReplayOptions::default(),
            cmd_rx,
            event_tx,
            false,
        );
        let handle = tokio::spawn(async move {
            engine.run().await;
            engine
        });

        cmd_tx
            .send(MacroCommand::StartReplay {
                file: std::env::temp_dir().join("card-macro-run-not-there.txt"),
                loop_count: 1,
            })
            .await
            .unwrap();

        let error = wait_for_event(&mut event_rx, |e| matches!(e, MacroEvent::Error(_))).await;
        assert!(error.is_some());

        cmd_tx.send(MacroCommand::Shutdown).await.unwrap();
        let engine = handle.await.unwrap();
        assert_eq!(*engine.state(), MacroEngineState::Idle);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_discarded_recording_still_reports_count() {
        let hook = InputHook::detached();
        let sender = hook.sender();
        let (cmd_tx, cmd_rx, event_tx, mut event_rx) = create_macro_channels();
        let mut engine = MacroEngine::new(
            hook,
            noop_factory(),
            RecorderConfig {
                countdown_secs: 0,
                stop_key: None,
            },
            ReplayOptions::default(),
            cmd_rx,
            event_tx,
            false,
        );
        let handle = tokio::spawn(async move {
            engine.run().await;
            engine
        });

        cmd_tx
            .send(MacroCommand::StartRecording { save_to: None })
            .await
            .unwrap();
        let started =
            wait_for_event(&mut event_rx, |e| matches!(e, MacroEvent::RecordingStarted)).await;
        assert!(started.is_some());

        sender.send(InputEvent::MouseMove { x: 1, y: 2 }).unwrap();
        sleep(Duration::from_millis(100)).await;
        cmd_tx.send(MacroCommand::StopRecording).await.unwrap();

        let finished = wait_for_event(&mut event_rx, |e| {
            matches!(e, MacroEvent::RecordingFinished { .. })
        })
        .await;
        match finished {
            Some(MacroEvent::RecordingFinished { count, saved_to }) => {
                assert_eq!(count, 1);
                assert_eq!(saved_to, None);
            }
            other => panic!("unexpected event {other:?}"),
        }

        cmd_tx.send(MacroCommand::Shutdown).await.unwrap();
        handle.await.unwrap();
    }
}
