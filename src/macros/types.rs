// Types and enums for the macro engine
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
pub enum MacroEngineState {
    Idle,
    Recording,
    Replaying,
}

#[derive(Debug, Clone)]
pub enum MacroCommand {
    /// Arm the countdown and start capturing input events
    StartRecording { save_to: Option<PathBuf> },
    /// Stop capturing; the buffer is saved when a path was chosen
    StopRecording,
    /// Load a recording and replay it; loop_count 0 repeats until stopped
    StartReplay { file: PathBuf, loop_count: u32 },
    StopReplay,
    Shutdown,
}

#[derive(Debug, Clone)]
pub enum MacroEvent {
    /// Seconds remaining before recording or replay begins
    Countdown(u32),
    RecordingStarted,
    /// Emitted even for a discarded recording, with the event count
    RecordingFinished {
        count: usize,
        saved_to: Option<PathBuf>,
    },
    ReplayStarted {
        loop_count: u32,
    },
    /// A full pass over the action sequence finished
    ReplayLoop(u32),
    ReplayFinished {
        completed_loops: u32,
    },
    Error(String),
}
