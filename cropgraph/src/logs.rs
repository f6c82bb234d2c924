//! Run logs.
//!
//! Every pipeline step reports through a process-wide broadcaster: entries
//! are printed to stderr and also sent to any in-process subscriber. The CLI
//! subscribes with a [`LogTally`] to summarize warnings and errors of a run.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, oneshot};
use tokio::task::JoinHandle;

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A single log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    /// Log level
    pub level: LogLevel,
    /// Log message
    pub message: String,
    /// Optional indentation level (for nested logs)
    #[serde(default)]
    pub indent: u8,
}

impl LogEntry {
    pub fn info(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Info, message: message.into(), indent: 0 }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Success, message: message.into(), indent: 0 }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Warning, message: message.into(), indent: 0 }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Error, message: message.into(), indent: 0 }
    }

    pub fn with_indent(mut self, indent: u8) -> Self {
        self.indent = indent;
        self
    }

    /// The line printed for this entry.
    pub fn render(&self) -> String {
        let prefix = match self.level {
            LogLevel::Info => "   ",
            LogLevel::Success => "   ✓",
            LogLevel::Warning => "   ⚠️",
            LogLevel::Error => "   ❌",
        };
        let indent = "   ".repeat(self.indent as usize);
        format!("{}{} {}", indent, prefix, self.message)
    }
}

/// Global log broadcaster
pub static LOG_BROADCASTER: Lazy<LogBroadcaster> = Lazy::new(LogBroadcaster::new);

/// Prints log entries and forwards them to subscribers
pub struct LogBroadcaster {
    sender: broadcast::Sender<LogEntry>,
}

impl LogBroadcaster {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(256);
        Self { sender }
    }

    /// Print a log entry and send it to all subscribers
    pub fn log(&self, entry: LogEntry) {
        eprintln!("{}", entry.render());

        // No subscriber is fine
        let _ = self.sender.send(entry);
    }

    /// Get a receiver for entries logged from now on
    pub fn subscribe(&self) -> broadcast::Receiver<LogEntry> {
        self.sender.subscribe()
    }
}

impl Default for LogBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenient logging functions
pub fn log_info(msg: impl Into<String>) {
    LOG_BROADCASTER.log(LogEntry::info(msg));
}

pub fn log_success(msg: impl Into<String>) {
    LOG_BROADCASTER.log(LogEntry::success(msg));
}

pub fn log_warning(msg: impl Into<String>) {
    LOG_BROADCASTER.log(LogEntry::warning(msg));
}

pub fn log_error(msg: impl Into<String>) {
    LOG_BROADCASTER.log(LogEntry::error(msg));
}

pub fn log_info_indent(msg: impl Into<String>, indent: u8) {
    LOG_BROADCASTER.log(LogEntry::info(msg).with_indent(indent));
}

/// Warning and error counts of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LogCounts {
    pub warnings: usize,
    pub errors: usize,
    /// Entries dropped because the tally fell behind the channel
    pub missed: u64,
}

impl LogCounts {
    fn record(&mut self, entry: &LogEntry) {
        match entry.level {
            LogLevel::Warning => self.warnings += 1,
            LogLevel::Error => self.errors += 1,
            LogLevel::Info | LogLevel::Success => {}
        }
    }
}

/// Background subscriber counting warnings and errors until [`LogTally::finish`].
///
/// Must be started inside a tokio runtime.
pub struct LogTally {
    stop: oneshot::Sender<()>,
    handle: JoinHandle<LogCounts>,
}

impl LogTally {
    /// Count entries of the global broadcaster.
    pub fn start() -> Self {
        Self::start_on(&LOG_BROADCASTER)
    }

    pub fn start_on(broadcaster: &LogBroadcaster) -> Self {
        let mut receiver = broadcaster.subscribe();
        let (stop, mut stopped) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            let mut counts = LogCounts::default();
            loop {
                // Pending entries are drained before the stop signal is seen
                tokio::select! {
                    biased;
                    received = receiver.recv() => match received {
                        Ok(entry) => counts.record(&entry),
                        Err(broadcast::error::RecvError::Lagged(n)) => counts.missed += n,
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                    _ = &mut stopped => break,
                }
            }
            counts
        });

        Self { stop, handle }
    }

    /// Stop counting and return the totals.
    pub async fn finish(self) -> LogCounts {
        let _ = self.stop.send(());
        self.handle.await.unwrap_or_default()
    }
}
