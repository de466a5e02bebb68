use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::debug;

use crate::error::MonitorError;
use crate::event::NavigationEvent;
use crate::scanner::{Classification, LineScanner};

/// Turns the bus monitor's output into a lazy sequence of navigation events.
///
/// The sequence is unbounded and cannot be restarted: once the underlying
/// reader reports end of stream or an I/O error, every further call fails
/// with [`MonitorError::StreamTerminated`].
pub struct EventSource<R> {
    reader: R,
    scanner: LineScanner,
    buf: Vec<u8>,
    finished: bool,
}

impl<R: AsyncBufRead + Unpin> EventSource<R> {
    pub fn new(reader: R, scanner: LineScanner) -> Self {
        Self {
            reader,
            scanner,
            buf: Vec::new(),
            finished: false,
        }
    }

    /// Waits for the next navigation event, classifying lines as they arrive.
    pub async fn next_event(&mut self) -> Result<NavigationEvent, MonitorError> {
        loop {
            let line = self.next_line().await?;
            let classification = self.scanner.feed(&line);
            log_classification(&line, &classification);
            if let Some(event) = classification.event() {
                return Ok(event);
            }
        }
    }

    async fn next_line(&mut self) -> Result<String, MonitorError> {
        if self.finished {
            return Err(MonitorError::StreamTerminated("end of stream".to_string()));
        }

        self.buf.clear();
        let read = match self.reader.read_until(b'\n', &mut self.buf).await {
            Ok(n) => n,
            Err(e) => {
                self.finished = true;
                return Err(MonitorError::StreamTerminated(format!("read failed: {e}")));
            }
        };

        if read == 0 {
            self.finished = true;
            return Err(MonitorError::StreamTerminated("end of stream".to_string()));
        }

        if self.buf.last() != Some(&b'\n') {
            // The writer died mid-line; the fragment is never classified.
            self.finished = true;
            debug!(
                bytes = self.buf.len(),
                state = ?self.scanner.state(),
                "discarding unterminated final line"
            );
            return Err(MonitorError::StreamTerminated(
                "end of stream (partial line discarded)".to_string(),
            ));
        }

        let line = String::from_utf8_lossy(&self.buf);
        Ok(line.trim_end_matches(['\n', '\r']).to_string())
    }
}

fn log_classification(line: &str, classification: &Classification) {
    match classification {
        Classification::Ignored => debug!(line, "no match"),
        Classification::Signal { dropped_pending } => {
            if *dropped_pending {
                debug!("navigation signal without matching sender dropped");
            }
            debug!(line, "navigation signal, awaiting sender");
        }
        Classification::Matched { identity } => {
            debug!(identity = identity.as_str(), "sender matched, folder changed")
        }
        Classification::Mismatch { identity } => {
            debug!(identity = identity.as_str(), "sender is another application")
        }
        Classification::Argument => debug!(line, "signal argument skipped"),
        Classification::Dropped => debug!(line, "navigation signal without matching sender dropped"),
    }
}

#[cfg(test)]
mod tests {
    use std::io::{self, Cursor};
    use std::sync::{Arc, Mutex};

    use tracing_subscriber::fmt::MakeWriter;
    use tracing_subscriber::EnvFilter;

    use super::*;
    use crate::event::EventKind;
    use crate::logging::compute_spec;

    const SIGNAL: &str = "signal sender=:1.23 path=/org/kde/dolphin member=urlChanged";

    fn source(input: impl Into<Vec<u8>>) -> EventSource<Cursor<Vec<u8>>> {
        EventSource::new(
            Cursor::new(input.into()),
            LineScanner::new("member=urlChanged", "dolphin"),
        )
    }

    async fn collect(input: impl Into<Vec<u8>>) -> (Vec<NavigationEvent>, MonitorError) {
        let mut src = source(input);
        let mut events = Vec::new();
        loop {
            match src.next_event().await {
                Ok(ev) => events.push(ev),
                Err(e) => return (events, e),
            }
        }
    }

    #[tokio::test]
    async fn matching_signal_yields_folder_changed() {
        let input = format!("{SIGNAL}\n   string \"org.kde.dolphin\"\n");
        let (events, err) = collect(input).await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::FolderChanged);
        assert!(events[0].application_matched);
        assert!(matches!(err, MonitorError::StreamTerminated(_)));
    }

    #[tokio::test]
    async fn unrelated_traffic_yields_nothing() {
        let (events, err) = collect(&b"method call sender=:1.5\n   string \"x\"\n"[..]).await;
        assert!(events.is_empty());
        assert!(matches!(err, MonitorError::StreamTerminated(_)));
    }

    #[tokio::test]
    async fn crlf_line_endings_are_accepted() {
        let input = format!("{SIGNAL}\r\nstring \"org.kde.dolphin\"\r\n");
        let (events, _) = collect(input).await;
        assert_eq!(events.len(), 1);
    }

    #[tokio::test]
    async fn unterminated_final_line_produces_no_event() {
        let input = format!("{SIGNAL}\nstring \"org.kde.dolphin\"");
        let (events, err) = collect(input).await;
        assert!(events.is_empty());
        match err {
            MonitorError::StreamTerminated(reason) => assert!(reason.contains("partial")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn empty_stream_terminates_immediately() {
        let mut src = source(Vec::new());
        assert!(matches!(
            src.next_event().await,
            Err(MonitorError::StreamTerminated(_))
        ));
    }

    #[tokio::test]
    async fn sequence_is_not_restartable() {
        let mut src = source(Vec::new());
        assert!(src.next_event().await.is_err());
        assert!(src.next_event().await.is_err());
    }

    #[tokio::test]
    async fn invalid_utf8_is_treated_as_no_match() {
        let (events, err) = collect(&b"\xff\xfe garbage\n"[..]).await;
        assert!(events.is_empty());
        match err {
            MonitorError::StreamTerminated(reason) => assert_eq!(reason, "end of stream"),
            other => panic!("unexpected error: {other}"),
        }
    }

    // ── classification logging ────────────────────────────────────────────────

    /// Collects formatted log output in memory.
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl CapturedLogs {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for CapturedLogs {
        type Writer = CapturedLogs;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    /// Runs unrelated traffic through a source under the daemon's own filter
    /// for the given `--debug` setting and returns what was logged.
    async fn logs_for_unrelated_line(debug: bool) -> String {
        let logs = CapturedLogs::default();
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new(compute_spec(debug, None)))
            .with_writer(logs.clone())
            .with_ansi(false)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let mut src = source(&b"method call sender=:1.5\n"[..]);
        assert!(src.next_event().await.is_err());
        logs.text()
    }

    #[tokio::test]
    async fn unrelated_line_logs_nothing_without_debug() {
        assert_eq!(logs_for_unrelated_line(false).await, "");
    }

    #[tokio::test]
    async fn unrelated_line_logs_one_no_match_with_debug() {
        let text = logs_for_unrelated_line(true).await;
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 1, "unexpected log output: {text}");
        assert!(lines[0].contains("DEBUG"));
        assert!(lines[0].contains("no match"));
    }
}
