//! In-memory recording sink
//!
//! Records every call the logger makes against the sink capability so tests
//! (the crate's own and a host framework's) can assert the exact emission
//! sequence, including the reopen dance around retagged entries.

use crate::core::{Connect, Facility, LoggerError, Result, Severity, Sink};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// One observed sink call. `Emitted` records the sink-native severity name
/// (e.g. "warning" for `Severity::Warn`), which is what a real sink sees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkEvent {
    Opened {
        tag: String,
        log_pid: bool,
        facility: Facility,
    },
    Reopened {
        tag: String,
        log_pid: bool,
        facility: Facility,
    },
    Emitted {
        severity: &'static str,
        message: String,
    },
    Closed,
}

/// Connector handing out [`MemorySink`]s that all record into one shared
/// event log, inspectable through the connector after the fact.
#[derive(Clone, Default)]
pub struct MemoryConnector {
    events: Arc<Mutex<Vec<SinkEvent>>>,
    fail_emits: Arc<AtomicBool>,
}

impl MemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every recorded sink call, in order.
    pub fn events(&self) -> Vec<SinkEvent> {
        self.events.lock().clone()
    }

    /// Drain the recorded calls, leaving the log empty.
    pub fn take_events(&self) -> Vec<SinkEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    /// Just the emissions, as (severity name, message) pairs.
    pub fn emitted(&self) -> Vec<(&'static str, String)> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                SinkEvent::Emitted { severity, message } => Some((*severity, message.clone())),
                _ => None,
            })
            .collect()
    }

    /// Make every subsequent emit fail, for exercising error propagation.
    pub fn fail_emits(&self, fail: bool) {
        self.fail_emits.store(fail, Ordering::SeqCst);
    }
}

impl Connect for MemoryConnector {
    fn open(&self, tag: &str, log_pid: bool, facility: Facility) -> Result<Box<dyn Sink>> {
        self.events.lock().push(SinkEvent::Opened {
            tag: tag.to_string(),
            log_pid,
            facility,
        });
        Ok(Box::new(MemorySink {
            events: Arc::clone(&self.events),
            fail_emits: Arc::clone(&self.fail_emits),
        }))
    }
}

pub struct MemorySink {
    events: Arc<Mutex<Vec<SinkEvent>>>,
    fail_emits: Arc<AtomicBool>,
}

impl Sink for MemorySink {
    fn reopen(&mut self, tag: &str, log_pid: bool, facility: Facility) -> Result<()> {
        self.events.lock().push(SinkEvent::Reopened {
            tag: tag.to_string(),
            log_pid,
            facility,
        });
        Ok(())
    }

    fn emit(&mut self, severity: Severity, message: &str) -> Result<()> {
        if self.fail_emits.load(Ordering::SeqCst) {
            return Err(LoggerError::sink("emit rejected"));
        }
        self.events.lock().push(SinkEvent::Emitted {
            severity: severity.sink_name(),
            message: message.to_string(),
        });
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.events.lock().push(SinkEvent::Closed);
        Ok(())
    }
}
