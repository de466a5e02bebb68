/// Startup checks run before the dispatch loop.
///
/// Everything the daemon needs from the outside world is verified up front so
/// that a missing bus monitor, player, or sound file is reported once with a
/// clear message instead of surfacing as a stream or playback failure later.
use std::env;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use crate::config::MonitorConfig;
use crate::error::MonitorError;

/// Verifies the sound file and both external programs.
pub fn preflight(config: &MonitorConfig) -> Result<(), MonitorError> {
    check_sound_file(&config.sound_path)?;
    require_program("bus monitor", &config.monitor_command)?;
    require_program("player", &config.player_command)?;
    Ok(())
}

fn check_sound_file(path: &Path) -> Result<(), MonitorError> {
    match std::fs::metadata(path) {
        Ok(meta) if meta.is_file() => Ok(()),
        Ok(_) => Err(MonitorError::StartupFailed(format!(
            "sound path {} is not a regular file",
            path.display()
        ))),
        Err(e) => Err(MonitorError::StartupFailed(format!(
            "sound file {} is not readable: {e}",
            path.display()
        ))),
    }
}

fn require_program(role: &str, command: &[String]) -> Result<PathBuf, MonitorError> {
    let program = command
        .first()
        .ok_or_else(|| MonitorError::StartupFailed(format!("{role} command is empty")))?;
    find_program(program, env::var_os("PATH").as_deref()).ok_or_else(|| {
        MonitorError::StartupFailed(format!("{role} program '{program}' was not found"))
    })
}

/// Resolves `program` the way a shell would: names containing a path
/// separator are taken as-is, bare names are searched for on `path_var`.
pub fn find_program(program: &str, path_var: Option<&OsStr>) -> Option<PathBuf> {
    let candidate = Path::new(program);
    if candidate.components().count() > 1 {
        return candidate.is_file().then(|| candidate.to_path_buf());
    }
    env::split_paths(path_var?)
        .map(|dir| dir.join(program))
        .find(|p| p.is_file())
}
