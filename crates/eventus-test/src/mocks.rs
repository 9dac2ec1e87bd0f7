//! Recording mocks for asserting on bus behavior.

use std::sync::Arc;

use eventus::{LogLevel, LogRecord, LogSink};
use parking_lot::Mutex;

/// Records the order in which tagged callbacks run.
///
/// Cloning a recorder shares the underlying log.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    entries: Arc<Mutex<Vec<&'static str>>>,
}

impl Recorder {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `tag` directly.
    pub fn record(&self, tag: &'static str) {
        self.entries.lock().push(tag);
    }

    /// A callback that records `tag` and continues propagation.
    pub fn tag<E: 'static>(&self, tag: &'static str) -> impl Fn(&mut E) -> bool + Send + Sync + 'static {
        self.tag_returning(tag, true)
    }

    /// A callback that records `tag` and returns `result`.
    pub fn tag_returning<E: 'static>(
        &self,
        tag: &'static str,
        result: bool,
    ) -> impl Fn(&mut E) -> bool + Send + Sync + 'static {
        let entries = Arc::clone(&self.entries);
        move |_: &mut E| {
            entries.lock().push(tag);
            result
        }
    }

    /// Snapshot of the recorded tags.
    #[must_use]
    pub fn entries(&self) -> Vec<&'static str> {
        self.entries.lock().clone()
    }

    /// Take the recorded tags, leaving the recorder empty.
    #[must_use]
    pub fn take(&self) -> Vec<&'static str> {
        std::mem::take(&mut *self.entries.lock())
    }

    /// Number of recorded tags.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// How many times `tag` was recorded.
    #[must_use]
    pub fn count(&self, tag: &str) -> usize {
        self.entries.lock().iter().filter(|t| **t == tag).count()
    }
}

/// A log sink that keeps every record it receives.
#[derive(Debug, Clone, Default)]
pub struct CapturingSink {
    records: Arc<Mutex<Vec<LogRecord>>>,
}

impl CapturingSink {
    /// Create an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the captured records.
    #[must_use]
    pub fn records(&self) -> Vec<LogRecord> {
        self.records.lock().clone()
    }

    /// Captured records rendered with [`LogRecord::format`].
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.records.lock().iter().map(LogRecord::format).collect()
    }

    /// Captured records at `level`.
    #[must_use]
    pub fn at_level(&self, level: LogLevel) -> Vec<LogRecord> {
        self.records
            .lock()
            .iter()
            .filter(|r| r.level == level)
            .copied()
            .collect()
    }

    /// How many records used the message template `message`.
    #[must_use]
    pub fn count(&self, message: &str) -> usize {
        self.records
            .lock()
            .iter()
            .filter(|r| r.message == message)
            .count()
    }

    /// Drop everything captured so far.
    pub fn clear(&self) {
        self.records.lock().clear();
    }
}

impl LogSink for CapturingSink {
    fn log(&self, record: &LogRecord) {
        self.records.lock().push(*record);
    }
}
