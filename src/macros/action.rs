//! Recorded actions and their line-oriented persistence
//!
//! A recording is one JSON object per line, preserving event type,
//! coordinates/key, button and press state, and the elapsed time since
//! the recording reference start with sub-millisecond precision.

use super::error::{MacroError, MacroResult};
use crate::input::MouseButton;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PressState {
    Press,
    Release,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionKind {
    Move {
        x: i32,
        y: i32,
    },
    Click {
        x: i32,
        y: i32,
        button: MouseButton,
        state: PressState,
    },
    Key {
        key: String,
        state: PressState,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacroAction {
    #[serde(flatten)]
    pub kind: ActionKind,
    /// Seconds since the recording reference start
    pub time: f64,
}

/// An ordered action sequence identified by a file path.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Recording {
    pub actions: Vec<MacroAction>,
}

impl Recording {
    pub fn new(actions: Vec<MacroAction>) -> Self {
        Self { actions }
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Timestamp of the last action, in seconds.
    pub fn duration(&self) -> f64 {
        self.actions.last().map_or(0.0, |a| a.time)
    }

    /// Load a recording, one JSON action per line.
    ///
    /// A missing file and malformed content are distinct errors; both
    /// abort the replay attempt cleanly.
    pub fn load(path: &Path) -> MacroResult<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(MacroError::RecordingNotFound {
                    path: path.to_path_buf(),
                });
            }
            Err(source) => {
                return Err(MacroError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        let mut actions = Vec::new();
        for (idx, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let action: MacroAction =
                serde_json::from_str(line).map_err(|source| MacroError::Malformed {
                    path: path.to_path_buf(),
                    line: idx + 1,
                    source,
                })?;
            actions.push(action);
        }
        Ok(Self { actions })
    }

    /// Write the recording, one JSON action per line.
    pub fn save(&self, path: &Path) -> MacroResult<()> {
        let mut content = String::new();
        for action in &self.actions {
            let line =
                serde_json::to_string(action).map_err(|source| MacroError::Serialize { source })?;
            content.push_str(&line);
            content.push('\n');
        }
        std::fs::write(path, content).map_err(|source| MacroError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Default path a recording is saved to when no target is chosen.
pub fn default_recording_path() -> PathBuf {
    PathBuf::from("recording.txt")
}
