//! Structured error types for exthud
//!
//! Using thiserror for automatic Display implementation and error chaining.

use thiserror::Error;

/// Failures reported by a profiling capability
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProfilingError {
    #[error("Failed to start profiling: {0}")]
    StartFailed(String),

    #[error("Failed to stop profiling: {0}")]
    StopFailed(String),

    #[error("No recorded trace available to replay")]
    NoTraceAvailable,

    #[error("Profiling task ended without reporting a result")]
    TaskLost,
}

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("Failed to read snapshot {path}: {error}")]
    ReadFailed { path: String, error: std::io::Error },

    #[error("Failed to parse snapshot {path}: {error}")]
    ParseFailed { path: String, error: serde_json::Error },
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("No profile to export")]
    NoProfile,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum TuiError {
    #[error("Terminal error: {0}")]
    TerminalError(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
