//! Tests for events and reply channels

use eventloop::core::{reply_channel, Event, EventKind};

#[test]
fn test_require_feedback_event() {
    let (tx, _rx) = reply_channel::<u32, String>();
    let event = Event::require_feedback(tx);
    assert_eq!(event.kind(), EventKind::RequireFeedback);
    assert!(event.has_reply());
}

#[test]
fn test_no_feedback_event() {
    let event = Event::<u32, String>::no_feedback();
    assert_eq!(event.kind(), EventKind::NoFeedback);
    assert!(!event.has_reply());
}

#[test]
fn test_event_kind_serde() {
    let json = serde_json::to_string(&EventKind::RequireFeedback).unwrap();
    assert_eq!(json, "\"require_feedback\"");
    let kind: EventKind = serde_json::from_str("\"no_feedback\"").unwrap();
    assert_eq!(kind, EventKind::NoFeedback);
}

#[test]
fn test_dropped_sender_disconnects_receiver() {
    let (tx, rx) = reply_channel::<u32, String>();
    drop(Event::require_feedback(tx));
    assert!(rx.recv().is_err());
}
