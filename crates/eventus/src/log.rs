//! Structured debug records emitted by the bus.
//!
//! The bus never renders log output itself. Each notable operation produces a
//! [`LogRecord`] and hands it to the configured [`LogSink`], which is free to
//! format, route or drop it. [`TracingSink`] forwards records to `tracing`.

use std::fmt;

use tracing::{debug, error, info, warn};

use crate::key::EventKey;
use crate::subscriber::SubscriberId;
use crate::sync::ThreadBound;

/// Severity of a [`LogRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    /// Routine bookkeeping (subscriptions, GC).
    Debug,
    /// Informational.
    Info,
    /// Lookup misses and other recoverable conditions.
    Warning,
    /// Errors.
    Error,
    /// Reserved for sinks. The bus never acts on it.
    Fatal,
}

impl LogLevel {
    /// Stable name of the level.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
            Self::Fatal => "FATAL",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A structured log record.
///
/// `message` is a template: `{event}` expands to the event type name and
/// `{id}` to the subscriber id. Use [`LogRecord::format`] to render it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogRecord {
    /// Severity.
    pub level: LogLevel,
    /// Message template.
    pub message: &'static str,
    /// Event type involved, if any.
    pub event: Option<EventKey>,
    /// Subscriber involved, if any.
    pub id: Option<SubscriberId>,
}

impl LogRecord {
    pub(crate) const fn new(level: LogLevel, message: &'static str) -> Self {
        Self {
            level,
            message,
            event: None,
            id: None,
        }
    }

    #[must_use]
    pub(crate) const fn with_event(mut self, event: EventKey) -> Self {
        self.event = Some(event);
        self
    }

    #[must_use]
    pub(crate) const fn with_id(mut self, id: SubscriberId) -> Self {
        self.id = Some(id);
        self
    }

    /// Render the message with its placeholders substituted.
    #[must_use]
    pub fn format(&self) -> String {
        let event = self.event.map_or("<none>", |e| e.name());
        let id = self
            .id
            .map_or_else(|| "<none>".to_owned(), |id| id.to_string());
        self.message.replace("{event}", event).replace("{id}", &id)
    }
}

impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format())
    }
}

/// Receiver of the bus's [`LogRecord`]s.
///
/// Any `Fn(&LogRecord)` closure is a sink.
pub trait LogSink: ThreadBound {
    /// Handle one record.
    fn log(&self, record: &LogRecord);
}

impl<F> LogSink for F
where
    F: Fn(&LogRecord) + ThreadBound,
{
    fn log(&self, record: &LogRecord) {
        self(record);
    }
}

/// Sink that forwards records to the `tracing` ecosystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn log(&self, record: &LogRecord) {
        let event_type = record.event.map(|e| e.name());
        let subscriber_id = record.id.map(SubscriberId::get);
        let message = record.format();

        match record.level {
            LogLevel::Debug => debug!(?event_type, ?subscriber_id, "{message}"),
            LogLevel::Info => info!(?event_type, ?subscriber_id, "{message}"),
            LogLevel::Warning => warn!(?event_type, ?subscriber_id, "{message}"),
            LogLevel::Error => error!(?event_type, ?subscriber_id, "{message}"),
            LogLevel::Fatal => error!(?event_type, ?subscriber_id, fatal = true, "{message}"),
        }
    }
}
