use sysinfo::{ProcessesToUpdate, System};
use tokio::sync::watch;
use tokio::time::{interval, Duration};
use tracing::info;

/// Whether qualifying events may be played right now.
pub enum LivenessGate {
    /// Events always play, whether or not the application runs.
    Disabled,
    /// Events play only while the latest poll saw the application.
    Watch(watch::Receiver<bool>),
}

impl LivenessGate {
    pub fn is_open(&self) -> bool {
        match self {
            LivenessGate::Disabled => true,
            LivenessGate::Watch(rx) => *rx.borrow(),
        }
    }
}

/// Returns true if any process name contains `app_name`, ignoring case.
pub fn is_running<'a>(app_name: &str, process_names: impl IntoIterator<Item = &'a str>) -> bool {
    let target = app_name.to_lowercase();
    process_names
        .into_iter()
        .any(|name| name.to_lowercase().contains(&target))
}

fn probe(sys: &mut System, app_name: &str) -> bool {
    sys.refresh_processes(ProcessesToUpdate::All, true);
    let names: Vec<String> = sys
        .processes()
        .values()
        .map(|p| p.name().to_string_lossy().into_owned())
        .collect();
    is_running(app_name, names.iter().map(String::as_str))
}

/// Takes an initial reading of the process table and starts polling it every
/// `interval_secs` seconds. The returned gate tracks the latest reading.
pub fn spawn(app_name: String, interval_secs: u64) -> LivenessGate {
    let mut sys = System::new();
    let running = probe(&mut sys, &app_name);
    if running {
        info!(app = app_name.as_str(), "application is running");
    } else {
        info!(app = app_name.as_str(), "application is not running; playback suppressed until it starts");
    }

    let (tx, rx) = watch::channel(running);
    tokio::spawn(run(sys, app_name, interval_secs, tx));
    LivenessGate::Watch(rx)
}

/// Polls the OS process list and publishes every change of the running state,
/// logging when the monitored application starts or exits.
async fn run(mut sys: System, app_name: String, interval_secs: u64, tx: watch::Sender<bool>) {
    let mut ticker = interval(Duration::from_secs(interval_secs));
    // The first tick completes immediately; the initial reading is already published.
    ticker.tick().await;

    loop {
        ticker.tick().await;

        let running = probe(&mut sys, &app_name);
        let was_running = *tx.borrow();
        if running == was_running {
            continue;
        }

        if running {
            info!(app = app_name.as_str(), "application started");
        } else {
            info!(app = app_name.as_str(), "application exited");
        }
        if tx.send(running).is_err() {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_gate_is_always_open() {
        assert!(LivenessGate::Disabled.is_open());
    }

    #[test]
    fn watch_gate_follows_channel() {
        let (tx, rx) = watch::channel(false);
        let gate = LivenessGate::Watch(rx);
        assert!(!gate.is_open());
        tx.send(true).unwrap();
        assert!(gate.is_open());
    }

    #[test]
    fn is_running_matches_substring_case_insensitively() {
        assert!(is_running("dolphin", ["systemd", "Dolphin"]));
        assert!(is_running("dolphin", ["dolphin-bin"]));
        assert!(!is_running("dolphin", ["nautilus", "bash"]));
    }

    #[test]
    fn is_running_on_empty_process_list_is_false() {
        assert!(!is_running("dolphin", std::iter::empty()));
    }
}
