//! Tests for error types

use std::time::Duration;

use eventloop::core::{EventError, SchedulerError};

#[test]
fn test_empty_queue_error() {
    let err = SchedulerError::EmptyQueue;
    assert_eq!(format!("{err}"), "empty queue");
}

#[test]
fn test_invalid_config_error() {
    let err = SchedulerError::InvalidConfig("handoff_capacity must be greater than 0".into());
    assert_eq!(
        format!("{err}"),
        "invalid configuration: handoff_capacity must be greater than 0"
    );
}

#[test]
fn test_stopped_error() {
    let err = SchedulerError::Stopped;
    assert_eq!(format!("{err}"), "scheduler has been stopped");
}

#[test]
fn test_spawn_error_from_io() {
    let err: SchedulerError = std::io::Error::other("no threads left").into();
    assert!(matches!(err, SchedulerError::Spawn(_)));
    assert_eq!(format!("{err}"), "failed to spawn run loop: no threads left");
}

#[test]
fn test_event_error_variants() {
    let err: EventError<String> = EventError::DeadlineExceeded(Duration::from_millis(50));
    assert_eq!(format!("{err}"), "action exceeded its deadline of 50ms");

    let err: EventError<String> = EventError::Panicked("boom".into());
    assert_eq!(format!("{err}"), "action panicked: boom");

    let err: EventError<String> = EventError::Stopped;
    assert!(err.is_stopped());
    assert!(err.into_action_error().is_none());
}

#[test]
fn test_action_error_passes_through() {
    let err: EventError<std::io::Error> = EventError::Action(std::io::Error::other("disk full"));
    assert!(!err.is_stopped());
    let inner = err.into_action_error().unwrap();
    assert_eq!(inner.to_string(), "disk full");
}
