// Finite State Machine implementation for the card tracker
use super::targets::{TrackedTarget, save_target_list};
use super::types::{TrackerCommand, TrackerEvent, TrackerState};
use super::vision::Vision;
use crate::input::InjectorFactory;
use crate::macros::MacroCommand;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{Duration, Instant, sleep};

// Macro for debug output
macro_rules! debug_print {
    ($debug_enabled:expr, $($arg:tt)*) => {
        if $debug_enabled {
            println!($($arg)*);
        }
    };
}

/// What to do when every target reaches its required count.
pub enum CompletionAction {
    /// Hold a synthetic confirm key for a fixed duration, then release it
    ConfirmKey {
        injector: Arc<InjectorFactory>,
        key: String,
        hold: Duration,
    },
    /// Signal the macro player to stop an in-progress replay
    StopReplay(mpsc::Sender<MacroCommand>),
    /// Emit the completion event only
    NotifyOnly,
}

#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Delay between detection sweeps
    pub poll_interval: Duration,
    /// Minimum time between two counted sightings of the same target
    pub cooldown: Duration,
    /// Pause after the reset trigger fires
    pub reset_pause: Duration,
    /// Target list saved here when the tracker stops
    pub config_path: Option<PathBuf>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(500),
            cooldown: Duration::from_secs(2),
            reset_pause: Duration::from_secs(1),
            config_path: None,
        }
    }
}

pub struct TrackerEngine<V: Vision> {
    state: TrackerState,
    targets: Vec<TrackedTarget>,
    vision: V,
    config: TrackerConfig,
    completion: CompletionAction,
    command_rx: mpsc::Receiver<TrackerCommand>,
    event_tx: mpsc::Sender<TrackerEvent>,
    should_exit: bool,
    debug_enabled: bool,
}

impl<V: Vision> TrackerEngine<V> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        vision: V,
        targets: Vec<TrackedTarget>,
        completion: CompletionAction,
        config: TrackerConfig,
        command_rx: mpsc::Receiver<TrackerCommand>,
        event_tx: mpsc::Sender<TrackerEvent>,
        debug_enabled: bool,
    ) -> Self {
        Self {
            state: TrackerState::Idle,
            targets,
            vision,
            config,
            completion,
            command_rx,
            event_tx,
            should_exit: false,
            debug_enabled,
        }
    }

    pub fn state(&self) -> &TrackerState {
        &self.state
    }

    pub fn targets(&self) -> &[TrackedTarget] {
        &self.targets
    }

    async fn change_state(&mut self, new_state: TrackerState) {
        if self.state != new_state {
            debug_print!(
                self.debug_enabled,
                "🃏 Card tracker state: {:?} -> {:?}",
                self.state,
                new_state
            );
            self.state = new_state.clone();
            let _ = self.event_tx.send(TrackerEvent::StateChanged(new_state)).await;
        }
    }

    async fn process_command(&mut self, command: TrackerCommand) {
        debug_print!(self.debug_enabled, "🃏 Processing tracker command: {:?}", command);
        match command {
            TrackerCommand::Start => {
                if self.state == TrackerState::Running {
                    debug_print!(self.debug_enabled, "🃏 Tracker already running, ignoring start");
                } else if self.targets.is_empty() {
                    let _ = self
                        .event_tx
                        .send(TrackerEvent::Error(
                            "No cards to track; add a card before starting".to_string(),
                        ))
                        .await;
                } else {
                    for target in &mut self.targets {
                        target.reset();
                    }
                    self.change_state(TrackerState::Running).await;
                    debug_print!(
                        self.debug_enabled,
                        "🚀 Card tracking started ({} targets, interval {:?})",
                        self.targets.len(),
                        self.config.poll_interval
                    );
                }
            }
            TrackerCommand::Stop => {
                if self.state == TrackerState::Running {
                    self.change_state(TrackerState::Stopped).await;
                    self.save_targets();
                    debug_print!(self.debug_enabled, "⏹️ Card tracking stopped");
                }
            }
            TrackerCommand::SetRequired { name, value } => {
                match self.targets.iter_mut().find(|t| t.name == name) {
                    Some(target) => target.required_raw = value,
                    None => {
                        log::warn!("SetRequired for unknown target '{name}'");
                    }
                }
            }
            TrackerCommand::AddTarget { name, required } => {
                if self.state == TrackerState::Running {
                    let _ = self
                        .event_tx
                        .send(TrackerEvent::Error(
                            "Cannot modify targets while tracking is running".to_string(),
                        ))
                        .await;
                } else if self.targets.iter().any(|t| t.name == name) {
                    debug_print!(self.debug_enabled, "🃏 Target '{}' already tracked", name);
                } else {
                    self.targets.push(TrackedTarget::new(name, required));
                    self.reload_vision();
                    self.save_targets();
                }
            }
            TrackerCommand::RemoveTarget { name } => {
                if self.state == TrackerState::Running {
                    let _ = self
                        .event_tx
                        .send(TrackerEvent::Error(
                            "Cannot modify targets while tracking is running".to_string(),
                        ))
                        .await;
                } else {
                    self.targets.retain(|t| t.name != name);
                    self.reload_vision();
                    self.save_targets();
                }
            }
            TrackerCommand::Shutdown => {
                self.should_exit = true;
                if self.state == TrackerState::Running {
                    self.change_state(TrackerState::Stopped).await;
                }
                self.save_targets();
                debug_print!(self.debug_enabled, "🛑 Card tracker shutting down");
            }
        }
    }

    pub async fn run(&mut self) {
        debug_print!(self.debug_enabled, "🃏 Card tracker FSM loop started");

        loop {
            // Check for commands (non-blocking)
            if let Ok(command) = self.command_rx.try_recv() {
                self.process_command(command).await;
            }

            match self.state {
                TrackerState::Idle | TrackerState::Stopped => {
                    sleep(Duration::from_millis(100)).await;
                }
                TrackerState::Running => {
                    self.tick().await;
                }
            }

            if self.should_exit {
                break;
            }
        }

        debug_print!(self.debug_enabled, "🃏 Card tracker FSM loop ended");
    }

    /// One detection sweep.
    ///
    /// The reset-trigger check always precedes target evaluation, so a
    /// reset masks any detections in the same tick. Targets are evaluated
    /// in insertion order.
    async fn tick(&mut self) {
        if !self.vision.refresh() {
            sleep(self.config.poll_interval).await;
            return;
        }

        if let Some(result) = self.vision.detect_reset()
            && result.matched
        {
            for target in &mut self.targets {
                target.found = 0;
            }
            debug_print!(self.debug_enabled, "🔄 Reset trigger detected, counts zeroed");
            let _ = self.event_tx.send(TrackerEvent::ResetDetected).await;
            sleep(self.config.reset_pause).await;
            return;
        }

        let mut all_met = true;
        for idx in 0..self.targets.len() {
            let name = self.targets[idx].name.clone();
            let required = self.targets[idx].required();

            if self.targets[idx].found < required {
                if let Some(result) = self.vision.detect_target(&name)
                    && result.matched
                {
                    let now = Instant::now();
                    let cooled = self.targets[idx]
                        .last_found
                        .is_none_or(|at| now.duration_since(at) > self.config.cooldown);
                    if cooled {
                        self.targets[idx].found += 1;
                        self.targets[idx].last_found = Some(now);
                        debug_print!(
                            self.debug_enabled,
                            "🎯 Card '{}' sighted ({:.2}%), count {}/{}",
                            name,
                            result.confidence,
                            self.targets[idx].found,
                            required
                        );
                        let _ = self
                            .event_tx
                            .send(TrackerEvent::TargetFound {
                                name: name.clone(),
                                confidence: result.confidence,
                            })
                            .await;
                        let _ = self
                            .event_tx
                            .send(TrackerEvent::Progress {
                                name,
                                found: self.targets[idx].found,
                                required,
                            })
                            .await;
                    }
                }
            }

            if self.targets[idx].found < required {
                all_met = false;
            }
        }

        if all_met && !self.targets.is_empty() {
            debug_print!(self.debug_enabled, "🏁 All cards found, tracking complete");
            let _ = self.event_tx.send(TrackerEvent::Completed).await;
            self.run_completion().await;
            self.change_state(TrackerState::Stopped).await;
            self.save_targets();
        } else {
            sleep(self.config.poll_interval).await;
        }
    }

    async fn run_completion(&mut self) {
        match &self.completion {
            CompletionAction::ConfirmKey { injector, key, hold } => {
                let factory = Arc::clone(injector);
                let key = key.clone();
                let hold = *hold;
                let pressed = tokio::task::spawn_blocking(move || {
                    let mut injector = factory();
                    if let Err(e) = injector.key_down(&key) {
                        log::warn!("Completion key press failed: {e}");
                        return;
                    }
                    std::thread::sleep(hold);
                    if let Err(e) = injector.key_up(&key) {
                        log::warn!("Completion key release failed: {e}");
                    }
                })
                .await;
                if let Err(e) = pressed {
                    log::warn!("Completion key task failed: {e}");
                }
            }
            CompletionAction::StopReplay(macro_tx) => {
                if macro_tx.send(MacroCommand::StopReplay).await.is_err() {
                    log::warn!("Macro engine unavailable, replay not stopped");
                }
            }
            CompletionAction::NotifyOnly => {}
        }
    }

    fn reload_vision(&mut self) {
        let names: Vec<String> = self.targets.iter().map(|t| t.name.clone()).collect();
        self.vision.reload_templates(&names);
    }

    fn save_targets(&self) {
        if let Some(path) = &self.config.config_path
            && let Err(e) = save_target_list(path, &self.targets)
        {
            log::error!("Failed to save target list: {e}");
        }
    }
}
