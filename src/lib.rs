//! # Buffered Syslogger
//!
//! A buffering, level-filtering adapter between an application's log call
//! sites and a syslog-like sink.
//!
//! ## Features
//!
//! - **Severity Filtering**: messages below the configured minimum never
//!   enter the buffer
//! - **Per-Context Batching**: each execution context accumulates its own
//!   ordered batch, flushed atomically at a unit-of-work boundary
//! - **Ad-hoc Retagging**: route a single message to a different log
//!   destination without reconfiguring the logger
//! - **Thread Safe**: one shared logger, isolated per-context buffers

pub mod core;
pub mod sinks;

pub mod prelude {
    pub use crate::core::{
        BufferedLogger, Connect, ContextId, Facility, LogEntry, LoggerBuilder, LoggerConfig,
        LoggerError, Result, Severity, Sink, DEFAULT_CUSTOM_TAG, DEFAULT_MAX_BUFFER_SIZE,
    };
    pub use crate::sinks::{MemoryConnector, SinkEvent};
    #[cfg(unix)]
    pub use crate::sinks::UnixConnector;
}

pub use crate::core::{
    BufferedLogger, Connect, ContextId, Facility, LogEntry, LoggerBuilder, LoggerConfig,
    LoggerError, Result, Severity, Sink, DEFAULT_CUSTOM_TAG, DEFAULT_MAX_BUFFER_SIZE,
};
pub use crate::sinks::{MemoryConnector, SinkEvent};
#[cfg(unix)]
pub use crate::sinks::UnixConnector;
