use card_macro_run::args::{Args, CompletionChoice, Mode};
use card_macro_run::capture::{ScreenGrabber, XcapGrabber};
use card_macro_run::detection::{CardDetector, DetectorConfig, TemplateStore};
use card_macro_run::hotkeys::{HotkeyAction, HotkeyBindings, HotkeySignals, spawn_hotkey_listener};
use card_macro_run::input::{
    EnigoInjector, InjectorFactory, InputHook, InputInjector, NoopInjector,
};
use card_macro_run::macros::{
    MacroCommand, MacroEngine, MacroEvent, RecorderConfig, ReplayOptions, create_macro_channels,
    default_recording_path,
};
use card_macro_run::tracker::{
    CompletionAction, LiveVision, TrackedTarget, TrackerCommand, TrackerConfig, TrackerEngine,
    TrackerEvent, create_tracker_channels, load_target_list,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{Duration, Instant, sleep};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let Some(args) = Args::parse() else {
        return;
    };

    match args.mode.clone() {
        Mode::Screenshot => run_screenshot(),
        Mode::Track => run_track(&args),
        Mode::Record { save_to } => {
            let save_to = save_to.unwrap_or_else(default_recording_path);
            run_record(&args, save_to);
        }
        Mode::Replay { file, loop_count } => run_replay(&args, file, loop_count),
    }
}

fn run_screenshot() {
    println!("📸 Capturing primary screen...");
    let mut grabber = XcapGrabber::new();
    match grabber.grab() {
        Ok(frame) => {
            let (width, height) = frame.dimensions();
            match frame.save("cli-screenshot.png") {
                Ok(()) => println!("✅ Screenshot {width}x{height} saved to cli-screenshot.png"),
                Err(e) => println!("❌ Write failed: {e}"),
            }
        }
        Err(e) => println!("❌ Screenshot failed: {e}"),
    }
}

/// Real injector when the platform allows it, otherwise a logged no-op so
/// the engines keep running.
fn injector_factory() -> Arc<InjectorFactory> {
    Arc::new(|| match EnigoInjector::new() {
        Ok(injector) => Box::new(injector) as Box<dyn InputInjector>,
        Err(e) => {
            log::error!("Input injection unavailable, actions will be dropped: {e}");
            Box::new(NoopInjector::new())
        }
    })
}

fn run_track(args: &Args) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    rt.block_on(async move {
        let targets: Vec<TrackedTarget> = match load_target_list(&args.config_file) {
            Ok(Some(load)) => {
                for line in &load.skipped_lines {
                    log::error!(
                        "Ignoring malformed target entry at {}:{}",
                        args.config_file.display(),
                        line
                    );
                }
                load.entries
                    .into_iter()
                    .map(|(name, required)| TrackedTarget::new(name, required))
                    .collect()
            }
            Ok(None) => {
                log::info!(
                    "No target list at {}, starting with no cards",
                    args.config_file.display()
                );
                Vec::new()
            }
            Err(e) => {
                eprintln!("❌ {e}");
                return;
            }
        };

        println!(
            "🃏 Tracking {} card(s) from {}",
            targets.len(),
            args.image_dir.display()
        );

        let detector_config = DetectorConfig {
            debug_enabled: args.debug_mode,
            ..DetectorConfig::default()
        };
        let mut store = TemplateStore::new(&args.image_dir, detector_config.clone());
        let names: Vec<String> = targets.iter().map(|t| t.name.clone()).collect();
        store.reload(&names);
        let detector = CardDetector::new(detector_config);
        let vision = LiveVision::new(Box::new(XcapGrabber::new()), store, detector);

        let hook = InputHook::spawn();
        let signals = Arc::new(HotkeySignals::default());
        let _listener =
            spawn_hotkey_listener(&hook, HotkeyBindings::default(), Arc::clone(&signals));

        let factory = injector_factory();
        let (macro_cmd_tx, macro_cmd_rx, macro_event_tx, macro_event_rx) = create_macro_channels();
        let recorder_config = RecorderConfig {
            countdown_secs: args.countdown_secs,
            stop_key: Some("f6".to_string()),
        };
        let replay_options = ReplayOptions {
            speed_factor: args.speed_factor,
            countdown_secs: args.countdown_secs,
            ..ReplayOptions::default()
        };
        let mut macro_engine = MacroEngine::new(
            hook,
            Arc::clone(&factory),
            recorder_config,
            replay_options,
            macro_cmd_rx,
            macro_event_tx,
            args.debug_mode,
        );

        let completion = match args.on_complete {
            CompletionChoice::ConfirmKey => CompletionAction::ConfirmKey {
                injector: Arc::clone(&factory),
                key: "f8".to_string(),
                hold: Duration::from_secs(2),
            },
            CompletionChoice::StopReplay => CompletionAction::StopReplay(macro_cmd_tx.clone()),
        };
        let tracker_config = TrackerConfig {
            config_path: Some(args.config_file.clone()),
            ..TrackerConfig::default()
        };
        let (tracker_cmd_tx, tracker_cmd_rx, tracker_event_tx, tracker_event_rx) =
            create_tracker_channels();
        let mut tracker = TrackerEngine::new(
            vision,
            targets,
            completion,
            tracker_config,
            tracker_cmd_rx,
            tracker_event_tx,
            args.debug_mode,
        );

        let macro_task = tokio::spawn(async move { macro_engine.run().await });
        let tracker_task = tokio::spawn(async move { tracker.run().await });
        let tracker_printer = tokio::spawn(print_tracker_events(tracker_event_rx));
        let macro_printer = tokio::spawn(print_macro_events(macro_event_rx));

        let _ = tracker_cmd_tx.send(TrackerCommand::Start).await;
        println!("🚀 Card tracking started; F10 cancels everything");

        let started = Instant::now();
        loop {
            sleep(Duration::from_millis(100)).await;

            if signals.take(HotkeyAction::StartRecording) {
                let _ = macro_cmd_tx
                    .send(MacroCommand::StartRecording {
                        save_to: Some(default_recording_path()),
                    })
                    .await;
            }
            if signals.take(HotkeyAction::StopRecording) {
                let _ = macro_cmd_tx.send(MacroCommand::StopRecording).await;
            }
            if signals.take(HotkeyAction::ReplayLooped) {
                let _ = macro_cmd_tx
                    .send(MacroCommand::StartReplay {
                        file: default_recording_path(),
                        loop_count: 0,
                    })
                    .await;
            }
            if signals.take(HotkeyAction::ReplayCounted) {
                let _ = macro_cmd_tx
                    .send(MacroCommand::StartReplay {
                        file: default_recording_path(),
                        loop_count: 10,
                    })
                    .await;
            }
            if signals.take(HotkeyAction::StopReplay) {
                let _ = macro_cmd_tx.send(MacroCommand::StopReplay).await;
            }
            if signals.take(HotkeyAction::CancelAll) {
                println!("🛑 Cancel requested, shutting down");
                break;
            }
            if let Some(secs) = args.debug_mode_timeout_secs
                && started.elapsed() >= Duration::from_secs(secs)
            {
                println!("⏱️ Timeout reached, shutting down");
                break;
            }
        }

        let _ = tracker_cmd_tx.send(TrackerCommand::Shutdown).await;
        let _ = macro_cmd_tx.send(MacroCommand::Shutdown).await;
        let _ = tracker_task.await;
        let _ = macro_task.await;
        let _ = tracker_printer.await;
        let _ = macro_printer.await;
    });
}

fn run_record(args: &Args, save_to: PathBuf) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    rt.block_on(async move {
        let hook = InputHook::spawn();
        let signals = Arc::new(HotkeySignals::default());
        let _listener =
            spawn_hotkey_listener(&hook, HotkeyBindings::default(), Arc::clone(&signals));

        let (cmd_tx, cmd_rx, event_tx, mut event_rx) = create_macro_channels();
        let recorder_config = RecorderConfig {
            countdown_secs: args.countdown_secs,
            stop_key: Some("f6".to_string()),
        };
        let mut engine = MacroEngine::new(
            hook,
            injector_factory(),
            recorder_config,
            ReplayOptions::default(),
            cmd_rx,
            event_tx,
            args.debug_mode,
        );
        let engine_task = tokio::spawn(async move { engine.run().await });

        let _ = cmd_tx
            .send(MacroCommand::StartRecording {
                save_to: Some(save_to),
            })
            .await;
        println!("⏺️ Recording armed; press F6 to stop");

        let started = Instant::now();
        let mut ticker = tokio::time::interval(Duration::from_millis(100));
        loop {
            tokio::select! {
                maybe_event = event_rx.recv() => match maybe_event {
                    Some(event) => {
                        let finished = matches!(event, MacroEvent::RecordingFinished { .. });
                        print_macro_event(&event);
                        if finished {
                            break;
                        }
                    }
                    None => break,
                },
                _ = ticker.tick() => {
                    if signals.take(HotkeyAction::StopRecording)
                        || signals.take(HotkeyAction::CancelAll)
                    {
                        let _ = cmd_tx.send(MacroCommand::StopRecording).await;
                    }
                    if let Some(secs) = args.debug_mode_timeout_secs
                        && started.elapsed() >= Duration::from_secs(secs)
                    {
                        let _ = cmd_tx.send(MacroCommand::StopRecording).await;
                    }
                }
            }
        }

        let _ = cmd_tx.send(MacroCommand::Shutdown).await;
        let _ = engine_task.await;
    });
}

fn run_replay(args: &Args, file: PathBuf, loop_count: u32) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    rt.block_on(async move {
        let hook = InputHook::spawn();
        let signals = Arc::new(HotkeySignals::default());
        let _listener =
            spawn_hotkey_listener(&hook, HotkeyBindings::default(), Arc::clone(&signals));

        let (cmd_tx, cmd_rx, event_tx, mut event_rx) = create_macro_channels();
        let replay_options = ReplayOptions {
            speed_factor: args.speed_factor,
            countdown_secs: args.countdown_secs,
            ..ReplayOptions::default()
        };
        let mut engine = MacroEngine::new(
            hook,
            injector_factory(),
            RecorderConfig::default(),
            replay_options,
            cmd_rx,
            event_tx,
            args.debug_mode,
        );
        let engine_task = tokio::spawn(async move { engine.run().await });

        let _ = cmd_tx
            .send(MacroCommand::StartReplay { file, loop_count })
            .await;
        println!("▶️ Replay armed; press F8 to stop");

        let started = Instant::now();
        let mut ticker = tokio::time::interval(Duration::from_millis(100));
        loop {
            tokio::select! {
                maybe_event = event_rx.recv() => match maybe_event {
                    Some(event) => {
                        let finished = matches!(
                            event,
                            MacroEvent::ReplayFinished { .. } | MacroEvent::Error(_)
                        );
                        print_macro_event(&event);
                        if finished {
                            break;
                        }
                    }
                    None => break,
                },
                _ = ticker.tick() => {
                    if signals.take(HotkeyAction::StopReplay)
                        || signals.take(HotkeyAction::CancelAll)
                    {
                        let _ = cmd_tx.send(MacroCommand::StopReplay).await;
                    }
                    if let Some(secs) = args.debug_mode_timeout_secs
                        && started.elapsed() >= Duration::from_secs(secs)
                    {
                        let _ = cmd_tx.send(MacroCommand::StopReplay).await;
                    }
                }
            }
        }

        let _ = cmd_tx.send(MacroCommand::Shutdown).await;
        let _ = engine_task.await;
    });
}

async fn print_tracker_events(mut rx: mpsc::Receiver<TrackerEvent>) {
    while let Some(event) = rx.recv().await {
        match event {
            TrackerEvent::StateChanged(state) => println!("🃏 Tracker state: {state:?}"),
            TrackerEvent::TargetFound { name, confidence } => {
                println!("🎯 Card '{name}' found! accuracy {confidence:.2}%");
            }
            TrackerEvent::Progress {
                name,
                found,
                required,
            } => println!("   {name}: {found}/{required}"),
            TrackerEvent::ResetDetected => println!("🔄 Reset detected, counts cleared"),
            TrackerEvent::Completed => println!("🏁 All cards found!"),
            TrackerEvent::Error(e) => eprintln!("❌ {e}"),
        }
    }
}

fn print_macro_event(event: &MacroEvent) {
    match event {
        MacroEvent::Countdown(secs) => println!("⏳ Starting in {secs}s..."),
        MacroEvent::RecordingStarted => println!("⏺️ Recording..."),
        MacroEvent::RecordingFinished { count, saved_to } => match saved_to {
            Some(path) => println!("✅ Recorded {} action(s) to {}", count, path.display()),
            None => println!("ℹ️ Recording discarded ({count} action(s) captured)"),
        },
        MacroEvent::ReplayStarted { loop_count } => {
            if *loop_count == 0 {
                println!("▶️ Replaying until stopped...");
            } else {
                println!("▶️ Replaying {loop_count} time(s)...");
            }
        }
        MacroEvent::ReplayLoop(n) => println!("🔁 Replay pass {n} complete"),
        MacroEvent::ReplayFinished { completed_loops } => {
            println!("✅ Replay finished after {completed_loops} pass(es)");
        }
        MacroEvent::Error(e) => eprintln!("❌ {e}"),
    }
}

async fn print_macro_events(mut rx: mpsc::Receiver<MacroEvent>) {
    while let Some(event) = rx.recv().await {
        print_macro_event(&event);
    }
}
