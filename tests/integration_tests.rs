//! Integration tests for the buffered logger
//!
//! These tests verify:
//! - Construction and facility resolution
//! - Severity filtering at append time
//! - Auto-flush thresholds
//! - Flush ordering and per-entry sink re-homing
//! - Request-start marker normalization
//! - Error propagation out of flush

use buffered_syslogger::prelude::*;

fn buffered_logger(connector: &MemoryConnector) -> BufferedLogger {
    let logger = BufferedLogger::builder()
        .build(connector)
        .expect("Failed to build logger");
    logger.set_auto_flushing(false);
    logger
}

/// Emissions recorded so far, as (severity name, message) pairs.
fn emissions(connector: &MemoryConnector) -> Vec<(&'static str, String)> {
    connector
        .events()
        .into_iter()
        .filter_map(|event| match event {
            SinkEvent::Emitted { severity, message } => Some((severity, message)),
            _ => None,
        })
        .collect()
}

#[test]
fn test_default_construction_opens_sink() {
    let connector = MemoryConnector::new();
    let logger = BufferedLogger::builder().build(&connector).unwrap();

    assert_eq!(
        connector.events(),
        vec![SinkEvent::Opened {
            tag: "rails".to_string(),
            log_pid: true,
            facility: Facility::Local2,
        }]
    );
    assert_eq!(logger.max_buffer_size(), 1);
}

#[test]
fn test_construction_with_params() {
    let connector = MemoryConnector::new();
    let logger = BufferedLogger::builder()
        .tag("my tag")
        .facility("local3")
        .min_level(Severity::Info)
        .log_pid(false)
        .build(&connector)
        .unwrap();

    assert_eq!(
        connector.events(),
        vec![SinkEvent::Opened {
            tag: "my tag".to_string(),
            log_pid: false,
            facility: Facility::Local3,
        }]
    );
    assert_eq!(logger.min_level(), Severity::Info);
}

#[test]
fn test_unknown_facility_fails_construction() {
    let connector = MemoryConnector::new();
    let err = BufferedLogger::builder()
        .facility("nosuch")
        .build(&connector)
        .unwrap_err();

    assert!(matches!(err, LoggerError::InvalidConfiguration { .. }));
    // No sink connection was opened
    assert!(connector.events().is_empty());
}

#[test]
fn test_filtered_message_never_enters_buffer() {
    let connector = MemoryConnector::new();
    let logger = buffered_logger(&connector);
    logger.set_min_level(Severity::Info);

    logger.debug("dropped").unwrap();
    assert_eq!(logger.pending_count(), 0);

    logger.info("kept").unwrap();
    logger.error("also kept").unwrap();
    assert_eq!(logger.pending_count(), 2);

    assert!(emissions(&connector).is_empty());
}

#[test]
fn test_append_is_in_insertion_order() {
    let connector = MemoryConnector::new();
    let logger = buffered_logger(&connector);

    logger.debug("first").unwrap();
    logger.info("second").unwrap();
    logger.warn("third").unwrap();
    logger.flush().unwrap();

    let emitted = emissions(&connector);
    assert_eq!(emitted.len(), 3);
    assert!(emitted[0].1.ends_with("first"));
    assert!(emitted[1].1.ends_with("second"));
    assert!(emitted[2].1.ends_with("third"));
    assert_eq!(emitted[0].0, "debug");
    assert_eq!(emitted[1].0, "info");
    assert_eq!(emitted[2].0, "warning");
}

#[test]
fn test_auto_flushing_emits_every_line() {
    let connector = MemoryConnector::new();
    let logger = BufferedLogger::builder().build(&connector).unwrap();
    logger.set_auto_flushing(true);

    logger.debug("one").unwrap();
    assert_eq!(logger.pending_count(), 0);
    assert_eq!(emissions(&connector).len(), 1);

    logger.debug("two").unwrap();
    assert_eq!(emissions(&connector).len(), 2);
}

#[test]
fn test_buffer_threshold_triggers_flush() {
    let connector = MemoryConnector::new();
    let logger = BufferedLogger::builder()
        .max_buffer_size(3)
        .build(&connector)
        .unwrap();

    logger.debug("one").unwrap();
    logger.debug("two").unwrap();
    assert_eq!(logger.pending_count(), 2);
    assert!(emissions(&connector).is_empty());

    // Third entry crosses the threshold and drains the whole batch
    logger.debug("three").unwrap();
    assert_eq!(logger.pending_count(), 0);
    assert_eq!(emissions(&connector).len(), 3);
}

#[test]
fn test_flush_rehomes_sink_around_foreign_tags() {
    let connector = MemoryConnector::new();
    let logger = buffered_logger(&connector);
    connector.take_events(); // drop the Opened event

    logger.debug("wadus debug").unwrap();
    logger.info("wadus info").unwrap();
    logger
        .custom_tagged("wadus custom tag info", "new tag", Severity::Info)
        .unwrap();
    logger.debug("wadus debug again").unwrap();
    logger.flush().unwrap();

    let events = connector.events();
    assert_eq!(events.len(), 6);
    assert!(matches!(&events[0], SinkEvent::Emitted { severity: "debug", message } if message.ends_with("wadus debug")));
    assert!(matches!(&events[1], SinkEvent::Emitted { severity: "info", message } if message.ends_with("wadus info")));
    assert!(matches!(&events[2], SinkEvent::Reopened { tag, .. } if tag == "new tag"));
    assert!(matches!(&events[3], SinkEvent::Emitted { severity: "info", message } if message.ends_with("wadus custom tag info")));
    assert!(matches!(&events[4], SinkEvent::Reopened { tag, .. } if tag == "rails"));
    assert!(matches!(&events[5], SinkEvent::Emitted { severity: "debug", message } if message.ends_with("wadus debug again")));
}

#[test]
fn test_custom_defaults_to_custom_tag_at_info() {
    let connector = MemoryConnector::new();
    let logger = buffered_logger(&connector);
    connector.take_events();

    logger.custom("operational note").unwrap();
    logger.flush().unwrap();

    let events = connector.events();
    assert_eq!(events.len(), 3);
    assert!(matches!(&events[0], SinkEvent::Reopened { tag, .. } if tag == DEFAULT_CUSTOM_TAG));
    assert!(matches!(&events[1], SinkEvent::Emitted { severity: "info", .. }));
    assert!(matches!(&events[2], SinkEvent::Reopened { tag, .. } if tag == "rails"));
}

#[test]
fn test_timestamp_prefix_format() {
    let connector = MemoryConnector::new();
    let logger = buffered_logger(&connector);

    logger.info("stamped").unwrap();
    logger.flush().unwrap();

    let emitted = emissions(&connector);
    // "[YYYY-MM-DD HH:MM:SS] stamped"
    assert_eq!(emitted.len(), 1);
    let message = &emitted[0].1;
    assert_eq!(message.len(), "[2010-10-10 10:10:10] stamped".len());
    assert!(message.starts_with('['));
    assert_eq!(&message[11..12], " ");
    assert_eq!(&message[20..22], "] ");
    assert!(message.ends_with("stamped"));
}

#[test]
fn test_request_start_marker_is_normalized() {
    let connector = MemoryConnector::new();
    let logger = buffered_logger(&connector);

    logger.info("\n\nStarted GET \"/\"").unwrap();
    assert_eq!(logger.pending_count(), 2);

    logger.flush().unwrap();
    let emitted = emissions(&connector);
    assert_eq!(emitted.len(), 2);
    assert!(emitted[0].1.ends_with("---"));
    assert!(emitted[1].1.ends_with("Started GET \"/\""));
    assert!(!emitted[1].1.contains('\n'));
}

#[test]
fn test_request_start_marker_with_auto_flush() {
    let connector = MemoryConnector::new();
    let logger = BufferedLogger::builder().build(&connector).unwrap();
    logger.set_auto_flushing(true);

    // Both the separator and the normalized message count as appends,
    // each triggering its own flush
    logger.info("\n\nStarted").unwrap();
    let emitted = emissions(&connector);
    assert_eq!(emitted.len(), 2);
    assert!(emitted[0].1.ends_with("---"));
    assert!(emitted[1].1.ends_with("Started"));
}

#[test]
fn test_single_newline_does_not_trigger_marker() {
    let connector = MemoryConnector::new();
    let logger = buffered_logger(&connector);

    logger.info("\nStarted").unwrap();
    logger.info("\n\nStarting up").unwrap();
    assert_eq!(logger.pending_count(), 2);

    logger.flush().unwrap();
    let emitted = emissions(&connector);
    assert_eq!(emitted.len(), 2);
    assert!(emitted[0].1.ends_with("\nStarted"));
    assert!(emitted[1].1.ends_with("\n\nStarting up"));
}

#[test]
fn test_flush_of_empty_buffer_is_noop() {
    let connector = MemoryConnector::new();
    let logger = buffered_logger(&connector);
    connector.take_events();

    logger.flush().unwrap();
    assert!(connector.events().is_empty());
}

#[test]
fn test_min_level_change_does_not_refilter_buffered_entries() {
    let connector = MemoryConnector::new();
    let logger = buffered_logger(&connector);

    logger.debug("already buffered").unwrap();
    logger.set_min_level(Severity::Error);
    logger.debug("now filtered").unwrap();

    logger.flush().unwrap();
    let emitted = emissions(&connector);
    assert_eq!(emitted.len(), 1);
    assert!(emitted[0].1.ends_with("already buffered"));
}

#[test]
fn test_emit_failure_propagates_without_rebuffer() {
    let connector = MemoryConnector::new();
    let logger = buffered_logger(&connector);

    logger.info("one").unwrap();
    logger.info("two").unwrap();

    connector.fail_emits(true);
    let err = logger.flush().unwrap_err();
    assert!(matches!(err, LoggerError::SinkFailure(_)));

    // The batch was drained up front; nothing is re-queued
    assert_eq!(logger.pending_count(), 0);
    connector.fail_emits(false);
    connector.take_events();
    logger.flush().unwrap();
    assert!(connector.events().is_empty());
}

#[test]
fn test_close_releases_sink() {
    let connector = MemoryConnector::new();
    let logger = buffered_logger(&connector);

    logger.close().unwrap();
    assert_eq!(connector.events().last(), Some(&SinkEvent::Closed));

    assert!(matches!(logger.info("late"), Err(LoggerError::LoggerClosed)));
    assert!(matches!(logger.flush(), Err(LoggerError::LoggerClosed)));
}

#[test]
fn test_end_to_end_filter_buffer_flush() {
    let connector = MemoryConnector::new();
    let logger = BufferedLogger::builder()
        .min_level(Severity::Info)
        .build(&connector)
        .unwrap();
    logger.set_auto_flushing(false);

    logger.debug("x").unwrap();
    assert_eq!(logger.pending_count(), 0);

    logger.info("y").unwrap();
    logger.flush().unwrap();

    let emitted = emissions(&connector);
    assert_eq!(emitted.len(), 1);
    assert_eq!(emitted[0].0, "info");
    assert!(emitted[0].1.ends_with("y"));
    assert_eq!(logger.pending_count(), 0);
}
