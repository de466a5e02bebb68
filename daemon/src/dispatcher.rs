use std::path::PathBuf;

use tokio::io::AsyncBufRead;
use tracing::{debug, warn};

use crate::error::MonitorError;
use crate::event::NavigationEvent;
use crate::event_source::EventSource;
use crate::liveness::LivenessGate;
use crate::playback::Player;

/// What the dispatcher did with one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Playback was initiated.
    Played,
    /// The player refused the request; the loop carries on.
    PlaybackFailed,
    /// The application is not running and the liveness gate is closed.
    Suppressed,
    /// The event did not belong to the monitored application.
    NotQualifying,
}

/// Running totals, reported when the loop ends.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchStats {
    pub played: u64,
    pub failed: u64,
    pub suppressed: u64,
}

/// Plays the configured sound for every qualifying navigation event.
pub struct Dispatcher<P> {
    sound_path: PathBuf,
    player: P,
    gate: LivenessGate,
    stats: DispatchStats,
}

impl<P: Player> Dispatcher<P> {
    pub fn new(sound_path: PathBuf, player: P, gate: LivenessGate) -> Self {
        Self {
            sound_path,
            player,
            gate,
            stats: DispatchStats::default(),
        }
    }

    pub fn stats(&self) -> DispatchStats {
        self.stats
    }

    /// Handles a single event. Never blocks on the sound finishing.
    pub fn handle(&mut self, event: &NavigationEvent) -> Outcome {
        if !event.application_matched {
            debug!(?event, "event is not from the monitored application");
            return Outcome::NotQualifying;
        }

        if !self.gate.is_open() {
            self.stats.suppressed += 1;
            debug!(?event, "application not running, playback suppressed");
            return Outcome::Suppressed;
        }

        match self.player.play(&self.sound_path) {
            Ok(()) => {
                self.stats.played += 1;
                debug!(kind = ?event.kind, path = %self.sound_path.display(), "playback started");
                Outcome::Played
            }
            Err(e) => {
                self.stats.failed += 1;
                warn!("{e}");
                Outcome::PlaybackFailed
            }
        }
    }

    /// Dispatches events until the source fails, returning that failure.
    pub async fn run<R: AsyncBufRead + Unpin>(&mut self, source: &mut EventSource<R>) -> MonitorError {
        loop {
            match source.next_event().await {
                Ok(event) => {
                    self.handle(&event);
                }
                Err(e) => return e,
            }
        }
    }
}
