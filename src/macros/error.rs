use std::path::PathBuf;
use thiserror::Error;

/// A specialized `Result` type for macro operations.
pub type MacroResult<T> = Result<T, MacroError>;

/// The error type for recording and replay operations.
#[derive(Debug, Error)]
pub enum MacroError {
    #[error("Recording file not found: {path}")]
    RecordingNotFound { path: PathBuf },

    #[error("Failed to read recording {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write recording {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Malformed recording entry at {path}:{line}: {source}")]
    Malformed {
        path: PathBuf,
        line: usize,
        source: serde_json::Error,
    },

    #[error("Failed to serialize action: {source}")]
    Serialize { source: serde_json::Error },
}
