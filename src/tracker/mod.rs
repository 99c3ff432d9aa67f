// Card tracker module
// This module provides a finite state machine that polls the screen for
// tracked cards, debounces sightings, and fires a completion action when
// every card reaches its required count.

pub mod channels;
pub mod engine;
pub mod targets;
pub mod types;
pub mod vision;

// Re-export the main types and functions for easy access
pub use channels::create_tracker_channels;
pub use engine::{CompletionAction, TrackerConfig, TrackerEngine};
pub use targets::{
    ConfigError, TargetListLoad, TrackedTarget, load_target_list, save_target_list,
};
pub use types::{TrackerCommand, TrackerEvent, TrackerState};
pub use vision::{LiveVision, Vision};
