//! # UART Sink Tests
//!
//! Verifies capture, line-buffered echo, the append-only log file, and
//! recovery from a failing writer.

use cosim_core::config::UartConfig;
use cosim_core::uart::UartSink;

use crate::common::mocks::writer::{BrokenWriter, SharedBuffer};

fn push_str(sink: &mut UartSink, text: &str) {
    for byte in text.bytes() {
        sink.push(byte);
    }
}

#[test]
fn captures_every_byte() {
    let mut sink = UartSink::new();
    push_str(&mut sink, "hello");
    assert_eq!(sink.captured(), b"hello");
    assert_eq!(sink.text(), "hello");
}

#[test]
fn echo_waits_for_newline() {
    let echo = SharedBuffer::new();
    let mut sink = UartSink::new().with_live(Box::new(echo.clone()));

    push_str(&mut sink, "abc");
    assert!(echo.contents().is_empty());

    sink.push(b'\n');
    assert_eq!(echo.text(), "abc\n");
    assert!(echo.flushes() >= 1);
}

#[test]
fn explicit_flush_releases_partial_line() {
    let echo = SharedBuffer::new();
    let mut sink = UartSink::new().with_live(Box::new(echo.clone()));

    push_str(&mut sink, "partial");
    sink.flush();

    assert_eq!(echo.text(), "partial");
}

#[test]
fn long_line_flushed_at_threshold() {
    let echo = SharedBuffer::new();
    let mut sink = UartSink::new().with_live(Box::new(echo.clone()));

    for _ in 0..4096 {
        sink.push(b'x');
    }

    assert_eq!(echo.contents().len(), 4096);
}

#[test]
fn drop_flushes_pending_output() {
    let echo = SharedBuffer::new();
    {
        let mut sink = UartSink::new().with_live(Box::new(echo.clone()));
        push_str(&mut sink, "bye");
    }
    assert_eq!(echo.text(), "bye");
}

#[test]
fn log_file_appends_across_sinks() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("uart.log");

    {
        let mut sink = UartSink::new().with_log_file(&path).unwrap();
        push_str(&mut sink, "first\n");
    }
    {
        let mut sink = UartSink::new().with_log_file(&path).unwrap();
        push_str(&mut sink, "second");
        sink.flush();
    }

    assert_eq!(std::fs::read_to_string(&path).unwrap(), "first\nsecond");
}

#[test]
fn log_file_in_missing_directory_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("no/such/dir/uart.log");
    assert!(UartSink::new().with_log_file(path).is_err());
}

#[test]
fn broken_writer_detached_capture_continues() {
    let mut sink = UartSink::new().with_live(Box::new(BrokenWriter));

    push_str(&mut sink, "one\ntwo\n");

    assert_eq!(sink.text(), "one\ntwo\n");
}

#[test]
fn from_config_without_echo_or_log() {
    let config = UartConfig {
        log_file: None,
        echo: false,
    };
    let mut sink = UartSink::from_config(&config).unwrap();
    sink.push(b'z');
    assert_eq!(sink.captured(), b"z");
}

#[test]
fn from_config_with_log() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cfg.log");
    let config = UartConfig {
        log_file: Some(path.clone()),
        echo: false,
    };

    {
        let mut sink = UartSink::from_config(&config).unwrap();
        push_str(&mut sink, "ok");
    }

    assert_eq!(std::fs::read(&path).unwrap(), b"ok");
}
