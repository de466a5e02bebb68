use std::process::{ExitStatus, Stdio};

use tokio::io::BufReader;
use tokio::process::{Child, ChildStdout, Command};
use tracing::info;

use crate::error::MonitorError;

/// The external bus monitor process whose stdout feeds the event source.
///
/// The child is killed when this value is dropped.
pub struct BusMonitor {
    child: Child,
}

impl BusMonitor {
    /// Spawns `command` with stdout piped. The caller takes the reader with
    /// [`BusMonitor::take_stdout`].
    pub fn spawn(command: &[String]) -> Result<Self, MonitorError> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| MonitorError::StartupFailed("bus monitor command is empty".to_string()))?;

        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| MonitorError::StartupFailed(format!("failed to start {program}: {e}")))?;

        info!(pid = child.id(), command = %command.join(" "), "bus monitor started");
        Ok(Self { child })
    }

    pub fn take_stdout(&mut self) -> Result<BufReader<ChildStdout>, MonitorError> {
        self.child
            .stdout
            .take()
            .map(BufReader::new)
            .ok_or_else(|| MonitorError::StartupFailed("bus monitor stdout unavailable".to_string()))
    }

    /// Exit status, if the monitor has already exited.
    pub fn try_exit_status(&mut self) -> Option<ExitStatus> {
        self.child.try_wait().ok().flatten()
    }

    pub async fn stop(mut self) {
        let _ = self.child.kill().await;
    }
}
