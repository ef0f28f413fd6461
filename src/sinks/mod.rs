//! Sink implementations

pub mod memory;
#[cfg(unix)]
pub mod unix;

pub use memory::{MemoryConnector, MemorySink, SinkEvent};
#[cfg(unix)]
pub use unix::{UnixConnector, UnixDatagramSink};
