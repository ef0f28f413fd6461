//! Core logger types and traits

pub mod entry;
pub mod error;
pub mod facility;
pub mod logger;
pub mod severity;
pub mod sink;

pub use entry::LogEntry;
pub use error::{LoggerError, Result};
pub use facility::Facility;
pub use logger::{
    BufferedLogger, LoggerBuilder, LoggerConfig, DEFAULT_CUSTOM_TAG, DEFAULT_MAX_BUFFER_SIZE,
};
pub use severity::Severity;
pub use sink::{Connect, ContextId, Sink};
