//! Local syslogd sink over a Unix datagram socket
//!
//! Minimal BSD-style transport: `<PRI>tag[pid]: message` to the local
//! syslogd socket. Delivery, rotation, and routing stay syslogd's job.

use crate::core::{Connect, Facility, LoggerError, Result, Severity, Sink};
use std::os::unix::net::UnixDatagram;
use std::path::{Path, PathBuf};

/// Candidate syslogd endpoints, tried in order.
const ENDPOINTS: &[&str] = &["/dev/log", "/var/run/syslog"];

/// Connector for the local syslogd socket.
#[derive(Debug, Clone, Default)]
pub struct UnixConnector {
    path: Option<PathBuf>,
}

impl UnixConnector {
    /// Auto-detect the local syslogd endpoint at open time.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an explicit socket path instead of auto-detection.
    pub fn with_path(path: impl AsRef<Path>) -> Self {
        Self {
            path: Some(path.as_ref().to_path_buf()),
        }
    }

    fn connect(&self) -> Result<UnixDatagram> {
        let socket = UnixDatagram::unbound()
            .map_err(|e| LoggerError::io_operation("opening sink", "cannot create socket", e))?;

        if let Some(ref path) = self.path {
            socket.connect(path).map_err(|e| {
                LoggerError::io_operation("opening sink", format!("cannot reach {:?}", path), e)
            })?;
            return Ok(socket);
        }

        for endpoint in ENDPOINTS {
            if socket.connect(endpoint).is_ok() {
                return Ok(socket);
            }
        }
        Err(LoggerError::config(
            "sink",
            "no local syslogd endpoint found",
        ))
    }
}

impl Connect for UnixConnector {
    fn open(&self, tag: &str, log_pid: bool, facility: Facility) -> Result<Box<dyn Sink>> {
        let socket = self.connect()?;
        Ok(Box::new(UnixDatagramSink {
            socket,
            tag: tag.to_string(),
            log_pid,
            facility,
        }))
    }
}

pub struct UnixDatagramSink {
    socket: UnixDatagram,
    tag: String,
    log_pid: bool,
    facility: Facility,
}

impl UnixDatagramSink {
    fn header(&self, severity: Severity) -> String {
        let pri = (self.facility.code() << 3) | severity.sink_code();
        if self.log_pid {
            format!("<{}>{}[{}]: ", pri, self.tag, std::process::id())
        } else {
            format!("<{}>{}: ", pri, self.tag)
        }
    }
}

impl Sink for UnixDatagramSink {
    fn reopen(&mut self, tag: &str, log_pid: bool, facility: Facility) -> Result<()> {
        // Same socket, new identity; the datagram header carries it.
        self.tag = tag.to_string();
        self.log_pid = log_pid;
        self.facility = facility;
        Ok(())
    }

    fn emit(&mut self, severity: Severity, message: &str) -> Result<()> {
        let datagram = format!("{}{}", self.header(severity), message);
        self.socket
            .send(datagram.as_bytes())
            .map_err(|e| LoggerError::io_operation("emitting entry", "send failed", e))?;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        // The socket is released on drop; nothing to tear down eagerly.
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_format() {
        let socket = UnixDatagram::unbound().unwrap();
        let sink = UnixDatagramSink {
            socket,
            tag: "rails".to_string(),
            log_pid: false,
            facility: Facility::Local2,
        };
        // local2 = 18, warning = 4 -> 18*8+4 = 148
        assert_eq!(sink.header(Severity::Warn), "<148>rails: ");
    }

    #[test]
    fn test_header_with_pid() {
        let socket = UnixDatagram::unbound().unwrap();
        let sink = UnixDatagramSink {
            socket,
            tag: "rails".to_string(),
            log_pid: true,
            facility: Facility::Local2,
        };
        let header = sink.header(Severity::Debug);
        assert!(header.starts_with("<151>rails["));
        assert!(header.ends_with("]: "));
    }

    #[test]
    fn test_emit_reaches_endpoint() {
        let dir =
            std::env::temp_dir().join(format!("buffered_syslogger_test_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("syslog.sock");
        let _ = std::fs::remove_file(&path);
        let server = UnixDatagram::bind(&path).unwrap();

        let connector = UnixConnector::with_path(&path);
        let mut sink = connector.open("rails", false, Facility::Local2).unwrap();
        sink.emit(Severity::Info, "[2010-10-10 10:10:10] hello").unwrap();

        let mut buf = [0u8; 256];
        let n = server.recv(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"<150>rails: [2010-10-10 10:10:10] hello");

        let _ = std::fs::remove_file(&path);
        let _ = std::fs::remove_dir(&dir);
    }

    #[test]
    fn test_unknown_endpoint_is_fatal() {
        let connector = UnixConnector::with_path("/nonexistent/syslog.sock");
        // The Ok side is a trait object, so take the error out directly
        let err = connector
            .open("rails", true, Facility::Local2)
            .err()
            .expect("open should fail for a missing endpoint");
        assert!(matches!(err, LoggerError::IoOperation { .. }));
    }
}
