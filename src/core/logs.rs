/// Session activity log
///
/// Keeps a short, timestamped history of backend exchanges so the front end
/// can show what happened without the operator digging through the log file.
/// Every entry is mirrored to the `log` facade when it is pushed.
use chrono::{DateTime, Local};
use serde::Serialize;

use crate::protocol::Port;

/// Number of entries kept by a session.
pub const ACTIVITY_CAPACITY: usize = 64;

#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Local>,
    pub message: String,
    pub level: LogLevel,
    pub activity: Activity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LogLevel {
    Info,
    Warning,
    Error,
}

/// Which workflow step produced an entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Activity {
    Directory,
    Confirm { port: Port },
    Read { port: Port },
    Submit { port: Port },
}

impl LogEntry {
    pub fn new(activity: Activity, level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            timestamp: Local::now(),
            message: message.into(),
            level,
            activity,
        }
    }

    pub fn info(activity: Activity, message: impl Into<String>) -> Self {
        Self::new(activity, LogLevel::Info, message)
    }

    pub fn warning(activity: Activity, message: impl Into<String>) -> Self {
        Self::new(activity, LogLevel::Warning, message)
    }

    pub fn error(activity: Activity, message: impl Into<String>) -> Self {
        Self::new(activity, LogLevel::Error, message)
    }
}

/// Bounded buffer of recent entries, oldest first.
#[derive(Debug, Clone)]
pub struct LogBuffer {
    entries: Vec<LogEntry>,
    max_entries: usize,
}

impl LogBuffer {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: Vec::new(),
            max_entries,
        }
    }

    /// Append an entry, forwarding it to the `log` facade, and drop the oldest
    /// entries beyond capacity.
    pub fn push(&mut self, entry: LogEntry) {
        match entry.level {
            LogLevel::Info => log::info!("{}", entry.message),
            LogLevel::Warning => log::warn!("{}", entry.message),
            LogLevel::Error => log::error!("{}", entry.message),
        }
        self.entries.push(entry);

        if self.entries.len() > self.max_entries {
            let excess = self.entries.len() - self.max_entries;
            self.entries.drain(0..excess);
        }
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// The `n` most recent entries, oldest first.
    pub fn tail(&self, n: usize) -> &[LogEntry] {
        let start = self.entries.len().saturating_sub(n);
        &self.entries[start..]
    }
}

impl Default for LogBuffer {
    fn default() -> Self {
        Self::new(ACTIVITY_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_drops_oldest_entries() {
        let mut buffer = LogBuffer::new(3);
        for i in 0..5 {
            buffer.push(LogEntry::info(Activity::Directory, format!("entry {i}")));
        }
        assert_eq!(buffer.entries().len(), 3);
        assert_eq!(buffer.entries()[0].message, "entry 2");
        assert_eq!(buffer.tail(1)[0].message, "entry 4");
        assert_eq!(buffer.tail(10).len(), 3);
    }
}
