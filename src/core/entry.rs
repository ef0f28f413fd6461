//! Buffered log entry structure

use super::severity::Severity;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// One buffered log line. Immutable once created; the position in its
/// context's buffer is its emission order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Local>,
    pub tag: String,
    pub severity: Severity,
    pub message: String,
}

impl LogEntry {
    pub fn new(tag: impl Into<String>, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            timestamp: Local::now(),
            tag: tag.into(),
            severity,
            message: message.into(),
        }
    }

    /// The line handed to the sink: local wall-clock timestamp prefix,
    /// then the message as buffered.
    pub fn format_line(&self) -> String {
        format!("[{}] {}", self.timestamp.format("%Y-%m-%d %H:%M:%S"), self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_line() {
        let mut entry = LogEntry::new("rails", Severity::Info, "hello");
        entry.timestamp = Local.with_ymd_and_hms(2010, 10, 10, 10, 10, 10).unwrap();
        assert_eq!(entry.format_line(), "[2010-10-10 10:10:10] hello");
    }
}
