/// Sound playback through an external player program.
///
/// Decoding and audio output are left to the player (`paplay` by default).
/// `play` only starts the child; its exit status is collected by a detached
/// task so the caller never waits for the sound to finish.
use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::config::PlaybackMode;
use crate::error::MonitorError;

/// Starts playback of a sound file without waiting for it to finish.
pub trait Player {
    /// Returns once playback has been initiated. An error means no sound will
    /// be produced for this request.
    fn play(&mut self, sound: &Path) -> Result<(), MonitorError>;
}

/// Runs `program args... <sound>` for every request.
pub struct CommandPlayer {
    program: String,
    args: Vec<String>,
    mode: PlaybackMode,
    /// Cancels the most recent player in `Interrupt` mode.
    previous: Option<oneshot::Sender<()>>,
}

impl CommandPlayer {
    /// `command` is the program followed by its leading arguments.
    pub fn new(command: &[String], mode: PlaybackMode) -> Result<Self, MonitorError> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| MonitorError::StartupFailed("player command is empty".to_string()))?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
            mode,
            previous: None,
        })
    }
}

impl Player for CommandPlayer {
    fn play(&mut self, sound: &Path) -> Result<(), MonitorError> {
        if self.mode == PlaybackMode::Interrupt {
            if let Some(cancel) = self.previous.take() {
                // Fails harmlessly when the previous sound already ended.
                let _ = cancel.send(());
            }
        }

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg(sound)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| MonitorError::PlaybackFailed {
                path: sound.to_path_buf(),
                reason: format!("failed to start {}: {e}", self.program),
            })?;

        let (cancel_tx, mut cancel_rx) = oneshot::channel::<()>();
        if self.mode == PlaybackMode::Interrupt {
            self.previous = Some(cancel_tx);
        }

        let path: PathBuf = sound.to_path_buf();
        tokio::spawn(async move {
            let finished = tokio::select! {
                status = child.wait() => Some(status),
                Ok(()) = &mut cancel_rx => None,
            };

            let reason = match finished {
                Some(Ok(status)) if status.success() => {
                    debug!(path = %path.display(), "playback finished");
                    return;
                }
                Some(Ok(status)) => format!("player exited with {status}"),
                Some(Err(e)) => format!("waiting for player: {e}"),
                None => {
                    debug!(path = %path.display(), "playback interrupted by a newer request");
                    let _ = child.kill().await;
                    return;
                }
            };
            let err = MonitorError::PlaybackFailed { path, reason };
            warn!("{err}");
        });

        Ok(())
    }
}
