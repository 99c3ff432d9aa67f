// Types and enums for the card tracker
#[derive(Debug, Clone, PartialEq)]
pub enum TrackerState {
    Idle,
    Running,
    Stopped,
}

#[derive(Debug, Clone)]
pub enum TrackerCommand {
    Start,
    Stop,
    /// Update the raw required-count text for a target; re-parsed every tick
    SetRequired {
        name: String,
        value: String,
    },
    AddTarget {
        name: String,
        required: u32,
    },
    RemoveTarget {
        name: String,
    },
    Shutdown,
}

#[derive(Debug, Clone)]
pub enum TrackerEvent {
    StateChanged(TrackerState),
    /// A card sighting passed the cooldown debounce
    TargetFound {
        name: String,
        confidence: f32,
    },
    Progress {
        name: String,
        found: u32,
        required: u32,
    },
    /// The reset trigger was seen; all found counts were zeroed
    ResetDetected,
    /// Every target reached its required count
    Completed,
    Error(String),
}
