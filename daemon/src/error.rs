use std::path::PathBuf;

use thiserror::Error;

/// Failures the daemon distinguishes between.
///
/// Only `StreamTerminated` and `StartupFailed` end the process; a
/// `PlaybackFailed` is logged by the dispatcher and the loop carries on.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// The bus monitor's output ended or could not be read.
    #[error("bus monitor stream terminated: {0}")]
    StreamTerminated(String),

    /// The player could not be started, or exited unsuccessfully.
    #[error("playback of {} failed: {reason}", path.display())]
    PlaybackFailed { path: PathBuf, reason: String },

    /// A prerequisite was missing before the dispatch loop started.
    #[error("startup failed: {0}")]
    StartupFailed(String),
}

impl MonitorError {
    /// Process exit status for a fatal error.
    pub fn exit_code(&self) -> i32 {
        match self {
            MonitorError::StreamTerminated(_) => 1,
            MonitorError::PlaybackFailed { .. } => 1,
            MonitorError::StartupFailed(_) => 2,
        }
    }
}
