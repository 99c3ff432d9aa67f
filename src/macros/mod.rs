// Macro engine module
// Records timestamped mouse/keyboard sequences from the global input hook
// and replays them with scaled timing, looping, and cooperative
// cancellation.

pub mod action;
pub mod channels;
pub mod engine;
pub mod error;
pub mod player;
pub mod recorder;
pub mod types;

// Re-export the main types and functions for easy access
pub use action::{ActionKind, MacroAction, PressState, Recording, default_recording_path};
pub use channels::create_macro_channels;
pub use engine::MacroEngine;
pub use error::{MacroError, MacroResult};
pub use player::{CANCEL_CHECK_SLICE, ReplayOptions, run_replay_blocking};
pub use recorder::{RecorderConfig, run_recording};
pub use types::{MacroCommand, MacroEngineState, MacroEvent};
