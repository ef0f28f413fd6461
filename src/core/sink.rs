//! Sink capability traits and the execution-context token
//!
//! The underlying system log facility is consumed, never reimplemented: the
//! logger only needs open/reopen/emit/close. `reopen` re-homes the same
//! logical connection to a new identity, which is how individual entries get
//! routed to a different destination during a flush.

use super::error::Result;
use super::facility::Facility;
use super::severity::Severity;
use std::thread;

/// An open connection to the underlying log sink.
pub trait Sink: Send {
    /// Re-home the connection to a new identity, keeping the same logical
    /// connection.
    fn reopen(&mut self, tag: &str, log_pid: bool, facility: Facility) -> Result<()>;

    /// Emit one formatted line at the given severity.
    fn emit(&mut self, severity: Severity, message: &str) -> Result<()>;

    /// Release the connection.
    fn close(&mut self) -> Result<()>;
}

/// Opens sink connections. Fails fatally when the endpoint or facility is
/// unusable; the logger cannot exist without a sink handle.
pub trait Connect {
    fn open(&self, tag: &str, log_pid: bool, facility: Facility) -> Result<Box<dyn Sink>>;
}

/// Identity of one execution context (thread, or one logical unit of work
/// pinned to a thread). Buffers are keyed by this token so concurrent
/// contexts never interleave within one pending sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextId(thread::ThreadId);

impl ContextId {
    /// The token for the calling context.
    pub fn current() -> Self {
        ContextId(thread::current().id())
    }
}
