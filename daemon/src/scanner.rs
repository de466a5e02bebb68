/// Line classifier for `dbus-monitor` output.
///
/// dbus-monitor prints one header line per message followed by indented
/// argument lines:
///
/// ```text
/// signal time=1700000000.1 sender=:1.23 -> destination=(null destination) path=/org/kde/dolphin; member=urlChanged
///    string "org.kde.dolphin"
/// ```
///
/// A navigation therefore spans two or more lines: a header carrying the
/// signal marker, then an argument naming the sending application. The
/// scanner keeps just enough state to join the two.
use crate::event::NavigationEvent;

const HEADER_PREFIXES: [&str; 4] = ["signal ", "method call ", "method return ", "error "];

/// Rolling parse state carried between lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    /// No navigation signal is open.
    Idle,
    /// A header with the signal marker was seen; its first string argument
    /// will name the sending application.
    AwaitingSender,
}

/// Outcome of feeding a single line to the scanner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Neither a navigation signal nor part of one.
    Ignored,
    /// A header carrying the signal marker. `dropped_pending` is set when it
    /// replaced a signal whose sender never matched.
    Signal { dropped_pending: bool },
    /// The first string argument of the open signal matched the application.
    Matched { identity: String },
    /// The first string argument of the open signal named some other
    /// application; the signal is dropped.
    Mismatch { identity: String },
    /// A non-string argument of the open signal.
    Argument,
    /// A header without the marker closed an open signal that never matched.
    Dropped,
}

impl Classification {
    /// The event this line completes, if any.
    pub fn event(&self) -> Option<NavigationEvent> {
        match self {
            Classification::Matched { .. } => Some(NavigationEvent::folder_changed()),
            _ => None,
        }
    }
}

/// Joins signal headers with the argument line that identifies the sender.
#[derive(Debug, Clone)]
pub struct LineScanner {
    marker: String,
    app_name: String,
    state: ScanState,
}

impl LineScanner {
    /// `marker` is matched case-sensitively against header lines;
    /// `app_name` case-insensitively against string arguments.
    pub fn new(marker: &str, app_name: &str) -> Self {
        Self {
            marker: marker.to_string(),
            app_name: app_name.to_lowercase(),
            state: ScanState::Idle,
        }
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    /// Classifies `line` and advances the parse state.
    pub fn feed(&mut self, line: &str) -> Classification {
        let trimmed = line.trim();

        if is_header(trimmed) {
            let was_pending = self.state == ScanState::AwaitingSender;
            if trimmed.contains(self.marker.as_str()) {
                self.state = ScanState::AwaitingSender;
                return Classification::Signal {
                    dropped_pending: was_pending,
                };
            }
            self.state = ScanState::Idle;
            return if was_pending {
                Classification::Dropped
            } else {
                Classification::Ignored
            };
        }

        if self.state == ScanState::Idle {
            return Classification::Ignored;
        }

        match string_argument(trimmed) {
            Some(identity) if identity.to_lowercase().contains(self.app_name.as_str()) => {
                self.state = ScanState::Idle;
                Classification::Matched {
                    identity: identity.to_string(),
                }
            }
            Some(identity) => {
                // The first string argument is the sender; later ones are payload.
                self.state = ScanState::Idle;
                Classification::Mismatch {
                    identity: identity.to_string(),
                }
            }
            None => Classification::Argument,
        }
    }
}

fn is_header(line: &str) -> bool {
    HEADER_PREFIXES.iter().any(|p| line.starts_with(p))
}

/// Value of a `string "..."` argument line, without the quotes.
fn string_argument(line: &str) -> Option<&str> {
    let rest = line.strip_prefix("string ")?.trim();
    let rest = rest.strip_prefix('"').unwrap_or(rest);
    Some(rest.strip_suffix('"').unwrap_or(rest))
}
