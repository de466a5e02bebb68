use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_APP_NAME: &str = "dolphin";
pub const DEFAULT_SOUND_PATH: &str = "./navigation.wav";
pub const DEFAULT_SIGNAL_MARKER: &str = "member=urlChanged";
pub const DEFAULT_MATCH_RULE: &str = "type='signal',member='urlChanged'";
pub const DEFAULT_PLAYER: &str = "paplay";
pub const DEFAULT_LIVENESS_INTERVAL_SECS: u64 = 2;
pub const MIN_LIVENESS_INTERVAL_SECS: u64 = 1;

/// How a new playback request treats one that is still audible.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackMode {
    /// Every request gets its own player; sounds may overlap.
    #[default]
    Overlap,
    /// A new request stops the previous player before starting.
    Interrupt,
}

/// Settings read from the optional config file. Every key may be omitted.
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub app_name: Option<String>,
    pub sound_path: Option<PathBuf>,
    pub debug: Option<bool>,
    pub signal_marker: Option<String>,
    pub monitor_command: Option<Vec<String>>,
    pub player_command: Option<Vec<String>>,
    pub playback_mode: Option<PlaybackMode>,
    pub require_running: Option<bool>,
    pub liveness_interval_secs: Option<u64>,
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub app_name: Option<String>,
    pub sound_path: Option<PathBuf>,
    pub debug: bool,
    pub require_running: bool,
}

/// Resolved daemon configuration. Built once at startup, never mutated.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Matched case-insensitively against bus senders and process names.
    pub app_name: String,
    pub sound_path: PathBuf,
    pub debug: bool,
    /// Substring that identifies a navigation signal header.
    pub signal_marker: String,
    /// Program and arguments of the bus monitor.
    pub monitor_command: Vec<String>,
    /// Program and leading arguments of the player; the sound path is appended.
    pub player_command: Vec<String>,
    pub playback_mode: PlaybackMode,
    /// Suppress playback while the application is not running.
    pub require_running: bool,
    pub liveness_interval_secs: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            app_name: DEFAULT_APP_NAME.to_string(),
            sound_path: PathBuf::from(DEFAULT_SOUND_PATH),
            debug: false,
            signal_marker: DEFAULT_SIGNAL_MARKER.to_string(),
            monitor_command: vec![
                "dbus-monitor".to_string(),
                "--session".to_string(),
                DEFAULT_MATCH_RULE.to_string(),
            ],
            player_command: vec![DEFAULT_PLAYER.to_string()],
            playback_mode: PlaybackMode::Overlap,
            require_running: false,
            liveness_interval_secs: DEFAULT_LIVENESS_INTERVAL_SECS,
        }
    }
}

impl MonitorConfig {
    /// Layers `file` and then `cli` over the built-in defaults.
    pub fn resolve(file: FileConfig, cli: &Overrides) -> Result<Self> {
        let defaults = Self::default();
        let config = Self {
            app_name: cli
                .app_name
                .clone()
                .or(file.app_name)
                .unwrap_or(defaults.app_name),
            sound_path: cli
                .sound_path
                .clone()
                .or(file.sound_path)
                .unwrap_or(defaults.sound_path),
            debug: cli.debug || file.debug.unwrap_or(defaults.debug),
            signal_marker: file.signal_marker.unwrap_or(defaults.signal_marker),
            monitor_command: file.monitor_command.unwrap_or(defaults.monitor_command),
            player_command: file.player_command.unwrap_or(defaults.player_command),
            playback_mode: file.playback_mode.unwrap_or(defaults.playback_mode),
            require_running: cli.require_running
                || file.require_running.unwrap_or(defaults.require_running),
            liveness_interval_secs: file
                .liveness_interval_secs
                .unwrap_or(defaults.liveness_interval_secs)
                .max(MIN_LIVENESS_INTERVAL_SECS),
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.app_name.trim().is_empty() {
            bail!("app_name must not be empty");
        }
        if self.signal_marker.is_empty() {
            bail!("signal_marker must not be empty");
        }
        if self.monitor_command.is_empty() {
            bail!("monitor_command must name a program");
        }
        if self.player_command.is_empty() {
            bail!("player_command must name a program");
        }
        Ok(())
    }
}

/// Loads the config file at `path`, returning `FileConfig::default()` if the file does not exist.
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_or_default(path: &Path) -> Result<FileConfig> {
    if !path.exists() {
        return Ok(FileConfig::default());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}
