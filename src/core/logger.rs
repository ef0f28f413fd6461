//! Main buffered logger implementation

use super::{
    entry::LogEntry,
    error::{LoggerError, Result},
    facility::Facility,
    severity::Severity,
    sink::{Connect, ContextId, Sink},
};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Safety ceiling for a buffer whose owner never flushes.
///
/// With auto-flushing disabled the host framework is expected to call
/// [`BufferedLogger::flush`] at its unit-of-work boundary; this cap bounds
/// the pending sequence if it forgets.
pub const DEFAULT_MAX_BUFFER_SIZE: usize = 500;

/// Tag used by [`BufferedLogger::custom`] when none is given.
pub const DEFAULT_CUSTOM_TAG: &str = "custom";

/// Request-start marker some frameworks embed at the top of a request's
/// first log line. Only the exact two-newline shape counts.
const REQUEST_START_MARKER: &str = "\n\nStarted";

/// Separator entry emitted ahead of a normalized request-start message,
/// marking the previous request's end in the stream.
const REQUEST_SEPARATOR: &str = "---";

/// Construction-time settings. `min_level` and the auto-flushing mode may
/// also be changed at runtime through the logger itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    pub tag: String,
    pub facility: Facility,
    pub min_level: Severity,
    pub max_buffer_size: usize,
    pub log_pid: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            tag: "rails".to_string(),
            facility: Facility::Local2,
            min_level: Severity::Debug,
            max_buffer_size: 1,
            log_pid: true,
        }
    }
}

/// A buffering, level-filtering adapter in front of a syslog-like sink.
///
/// Entries are filtered by severity at append time, accumulated per
/// execution context so one unit of work flushes as an atomic batch, and
/// emitted in insertion order. Individual entries may carry a foreign tag
/// (see [`BufferedLogger::custom`]); during a flush the sink identity is
/// re-homed around each such entry so it reaches its own destination.
///
/// # Example
///
/// ```
/// use buffered_syslogger::prelude::*;
///
/// let connector = MemoryConnector::new();
/// let logger = BufferedLogger::builder()
///     .tag("myapp")
///     .facility("local1")
///     .min_level(Severity::Info)
///     .build(&connector)
///     .unwrap();
///
/// logger.set_auto_flushing(false);
/// logger.info("request received").unwrap();
/// logger.flush().unwrap();
/// logger.close().unwrap();
/// ```
pub struct BufferedLogger {
    tag: String,
    facility: Facility,
    log_pid: bool,
    min_level: RwLock<Severity>,
    max_buffer_size: AtomicUsize,
    /// Pending entries, sharded by execution context. A context's sequence
    /// is created lazily on first append and removed entirely on flush.
    buffers: Mutex<HashMap<ContextId, Vec<LogEntry>>>,
    /// The one sink connection. Flush holds this guard for the whole drain:
    /// re-homing the identity must never leak into another context's batch.
    sink: Mutex<Box<dyn Sink>>,
    closed: AtomicBool,
}

impl BufferedLogger {
    /// Create a builder with the default configuration
    /// (tag "rails", facility "local2", min level Debug, buffer size 1).
    #[must_use]
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::new()
    }

    /// Construct from a ready configuration, opening one sink connection
    /// bound to (tag, pid flag, facility).
    pub fn from_config(config: LoggerConfig, connector: &dyn Connect) -> Result<Self> {
        let sink = connector.open(&config.tag, config.log_pid, config.facility)?;
        Ok(Self {
            tag: config.tag,
            facility: config.facility,
            log_pid: config.log_pid,
            min_level: RwLock::new(config.min_level),
            max_buffer_size: AtomicUsize::new(config.max_buffer_size),
            buffers: Mutex::new(HashMap::new()),
            sink: Mutex::new(sink),
            closed: AtomicBool::new(false),
        })
    }

    /// The default tag entries are emitted under.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn facility(&self) -> Facility {
        self.facility
    }

    pub fn min_level(&self) -> Severity {
        *self.min_level.read()
    }

    pub fn set_min_level(&self, level: Severity) {
        *self.min_level.write() = level;
    }

    /// `true` flushes every line the moment it is written; `false` leaves
    /// flushing to the host framework, bounded by
    /// [`DEFAULT_MAX_BUFFER_SIZE`].
    pub fn set_auto_flushing(&self, enabled: bool) {
        let size = if enabled { 1 } else { DEFAULT_MAX_BUFFER_SIZE };
        self.max_buffer_size.store(size, Ordering::Relaxed);
    }

    pub fn max_buffer_size(&self) -> usize {
        self.max_buffer_size.load(Ordering::Relaxed)
    }

    /// Whether messages at `severity` currently pass the filter.
    pub fn enabled(&self, severity: Severity) -> bool {
        severity >= *self.min_level.read()
    }

    #[inline]
    pub fn debug_enabled(&self) -> bool {
        self.enabled(Severity::Debug)
    }

    #[inline]
    pub fn info_enabled(&self) -> bool {
        self.enabled(Severity::Info)
    }

    #[inline]
    pub fn warn_enabled(&self) -> bool {
        self.enabled(Severity::Warn)
    }

    #[inline]
    pub fn error_enabled(&self) -> bool {
        self.enabled(Severity::Error)
    }

    #[inline]
    pub fn fatal_enabled(&self) -> bool {
        self.enabled(Severity::Fatal)
    }

    #[inline]
    pub fn unknown_enabled(&self) -> bool {
        self.enabled(Severity::Unknown)
    }

    #[inline]
    pub fn debug(&self, message: impl Into<String>) -> Result<()> {
        self.append(&self.tag, Severity::Debug, message)
    }

    #[inline]
    pub fn info(&self, message: impl Into<String>) -> Result<()> {
        self.append(&self.tag, Severity::Info, message)
    }

    #[inline]
    pub fn warn(&self, message: impl Into<String>) -> Result<()> {
        self.append(&self.tag, Severity::Warn, message)
    }

    #[inline]
    pub fn error(&self, message: impl Into<String>) -> Result<()> {
        self.append(&self.tag, Severity::Error, message)
    }

    #[inline]
    pub fn fatal(&self, message: impl Into<String>) -> Result<()> {
        self.append(&self.tag, Severity::Fatal, message)
    }

    #[inline]
    pub fn unknown(&self, message: impl Into<String>) -> Result<()> {
        self.append(&self.tag, Severity::Unknown, message)
    }

    /// Route one message to a different destination under the "custom" tag
    /// at Info, without touching the logger's own tag. Downstream syslog
    /// configuration can then filter that tag into its own file.
    pub fn custom(&self, message: impl Into<String>) -> Result<()> {
        self.custom_tagged(message, DEFAULT_CUSTOM_TAG, Severity::Info)
    }

    /// [`custom`](Self::custom) with an explicit tag and severity.
    pub fn custom_tagged(
        &self,
        message: impl Into<String>,
        tag: &str,
        severity: Severity,
    ) -> Result<()> {
        self.append(tag, severity, message)
    }

    /// Filter, normalize, and buffer one message for the calling context,
    /// auto-flushing when the context's buffer reaches the threshold.
    pub fn append(&self, tag: &str, severity: Severity, message: impl Into<String>) -> Result<()> {
        self.ensure_open()?;
        if !self.enabled(severity) {
            return Ok(());
        }

        let message = message.into();
        if message.contains(REQUEST_START_MARKER) {
            // A request is starting: mark the previous one's end with a
            // separator entry, then buffer the message with the redundant
            // blank lines stripped. Two explicit steps, each with its own
            // auto-flush check.
            self.buffer_entry(LogEntry::new(tag, severity, REQUEST_SEPARATOR))?;
            self.buffer_entry(LogEntry::new(
                tag,
                severity,
                message.replace(REQUEST_START_MARKER, "Started"),
            ))
        } else {
            self.buffer_entry(LogEntry::new(tag, severity, message))
        }
    }

    fn buffer_entry(&self, entry: LogEntry) -> Result<()> {
        let pending = {
            let mut buffers = self.buffers.lock();
            let buffer = buffers.entry(ContextId::current()).or_default();
            buffer.push(entry);
            buffer.len()
        };

        if pending >= self.max_buffer_size.load(Ordering::Relaxed) {
            self.flush()?;
        }
        Ok(())
    }

    /// Number of entries currently buffered for the calling context.
    pub fn pending_count(&self) -> usize {
        self.buffers
            .lock()
            .get(&ContextId::current())
            .map_or(0, Vec::len)
    }

    /// Drain the calling context's buffer to the sink, in insertion order.
    ///
    /// Foreign-tag entries re-home the connection to their tag, emit, and
    /// re-home back before the next entry; tags may interleave within one
    /// batch, so the identity has to track the entry, not the batch.
    ///
    /// Emission failures propagate immediately. The batch was already
    /// drained, so entries after the failure are lost; nothing is retried
    /// or re-buffered.
    pub fn flush(&self) -> Result<()> {
        self.ensure_open()?;

        let mut sink = self.sink.lock();
        let batch = self.buffers.lock().remove(&ContextId::current());
        let Some(batch) = batch else {
            return Ok(());
        };

        for entry in batch {
            let line = entry.format_line();
            if entry.tag == self.tag {
                sink.emit(entry.severity, &line)?;
            } else {
                sink.reopen(&entry.tag, self.log_pid, self.facility)?;
                sink.emit(entry.severity, &line)?;
                sink.reopen(&self.tag, self.log_pid, self.facility)?;
            }
        }
        Ok(())
    }

    /// Release the sink connection. Every operation afterwards fails with
    /// [`LoggerError::LoggerClosed`].
    pub fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Err(LoggerError::LoggerClosed);
        }
        self.sink.lock().close()
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(LoggerError::LoggerClosed);
        }
        Ok(())
    }
}

// The sink handle is a trait object, so Debug is written by hand.
impl fmt::Debug for BufferedLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferedLogger")
            .field("tag", &self.tag)
            .field("facility", &self.facility)
            .field("log_pid", &self.log_pid)
            .field("min_level", &*self.min_level.read())
            .field(
                "max_buffer_size",
                &self.max_buffer_size.load(Ordering::Relaxed),
            )
            .field("closed", &self.closed.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

/// Builder for constructing a [`BufferedLogger`] with a fluent API.
///
/// The facility is given as the string syslogd recognizes and resolved at
/// [`build`](LoggerBuilder::build); an unknown name fails construction.
///
/// # Example
/// ```
/// use buffered_syslogger::prelude::*;
///
/// let connector = MemoryConnector::new();
/// let logger = BufferedLogger::builder()
///     .tag("myapp")
///     .facility("local1")
///     .min_level(Severity::Info)
///     .build(&connector)
///     .unwrap();
/// ```
pub struct LoggerBuilder {
    tag: String,
    facility: String,
    min_level: Severity,
    max_buffer_size: usize,
    log_pid: bool,
}

impl LoggerBuilder {
    pub fn new() -> Self {
        let defaults = LoggerConfig::default();
        Self {
            tag: defaults.tag,
            facility: defaults.facility.name().to_string(),
            min_level: defaults.min_level,
            max_buffer_size: defaults.max_buffer_size,
            log_pid: defaults.log_pid,
        }
    }

    /// Set the default tag
    #[must_use = "builder methods return a new value"]
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    /// Set the facility by its syslog name ("local2", "daemon", ...)
    #[must_use = "builder methods return a new value"]
    pub fn facility(mut self, facility: impl Into<String>) -> Self {
        self.facility = facility.into();
        self
    }

    /// Set the minimum severity
    #[must_use = "builder methods return a new value"]
    pub fn min_level(mut self, level: Severity) -> Self {
        self.min_level = level;
        self
    }

    /// Set the auto-flush threshold directly
    #[must_use = "builder methods return a new value"]
    pub fn max_buffer_size(mut self, size: usize) -> Self {
        self.max_buffer_size = size;
        self
    }

    /// Whether the sink should record the process id with each entry
    #[must_use = "builder methods return a new value"]
    pub fn log_pid(mut self, log_pid: bool) -> Self {
        self.log_pid = log_pid;
        self
    }

    /// Resolve the facility and open the sink connection.
    pub fn build(self, connector: &dyn Connect) -> Result<BufferedLogger> {
        let facility = Facility::resolve(&self.facility)?;
        BufferedLogger::from_config(
            LoggerConfig {
                tag: self.tag,
                facility,
                min_level: self.min_level,
                max_buffer_size: self.max_buffer_size,
                log_pid: self.log_pid,
            },
            connector,
        )
    }
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
