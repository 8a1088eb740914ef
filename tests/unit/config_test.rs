//! Tests for configuration validation and loading

use std::time::Duration;

use eventloop::config::{DequeueOrder, RetryConfig, SchedulerConfig, UnrepliedPolicy};

#[test]
fn test_scheduler_config_defaults() {
    let cfg = SchedulerConfig::default();
    assert_eq!(cfg.handoff_capacity, 100);
    assert_eq!(cfg.dequeue_order, DequeueOrder::Fifo);
    assert_eq!(cfg.unreplied, UnrepliedPolicy::Execute);
    assert_eq!(cfg.action_timeout_ms, None);
    assert_eq!(cfg.thread_name, "eventloop");
    assert!(cfg.validate().is_ok());
}

#[test]
fn test_scheduler_config_builders() {
    let cfg = SchedulerConfig::new()
        .with_handoff_capacity(8)
        .with_dequeue_order(DequeueOrder::Lifo)
        .with_unreplied(UnrepliedPolicy::Drop)
        .with_action_timeout(Duration::from_millis(250))
        .with_thread_name("orders")
        .with_thread_stack_size(512 * 1024);

    assert_eq!(cfg.handoff_capacity, 8);
    assert_eq!(cfg.dequeue_order, DequeueOrder::Lifo);
    assert_eq!(cfg.unreplied, UnrepliedPolicy::Drop);
    assert_eq!(cfg.action_timeout(), Some(Duration::from_millis(250)));
    assert_eq!(cfg.thread_name, "orders");
    assert_eq!(cfg.thread_stack_size, 512 * 1024);
    assert!(cfg.validate().is_ok());
}

#[test]
fn test_scheduler_config_invalid_capacity() {
    let cfg = SchedulerConfig::new().with_handoff_capacity(0);
    assert!(cfg.validate().is_err());
}

#[test]
fn test_scheduler_config_invalid_timeout() {
    let cfg = SchedulerConfig::new().with_action_timeout(Duration::ZERO);
    assert!(cfg.validate().is_err());
}

#[test]
fn test_scheduler_config_invalid_thread_name() {
    let cfg = SchedulerConfig::new().with_thread_name("   ");
    assert!(cfg.validate().is_err());
}

#[test]
fn test_scheduler_config_from_json() {
    let json = r#"{
        "handoff_capacity": 16,
        "dequeue_order": "lifo",
        "unreplied": "drop",
        "action_timeout_ms": 1500
    }"#;
    let cfg = SchedulerConfig::from_json_str(json).unwrap();
    assert_eq!(cfg.handoff_capacity, 16);
    assert_eq!(cfg.dequeue_order, DequeueOrder::Lifo);
    assert_eq!(cfg.unreplied, UnrepliedPolicy::Drop);
    assert_eq!(cfg.action_timeout(), Some(Duration::from_millis(1500)));
    // omitted keys keep their defaults
    assert_eq!(cfg.thread_name, "eventloop");
}

#[test]
fn test_scheduler_config_from_json_rejects_invalid() {
    assert!(SchedulerConfig::from_json_str(r#"{"handoff_capacity": 0}"#).is_err());
    assert!(SchedulerConfig::from_json_str("not json").is_err());
    assert!(SchedulerConfig::from_json_str(r#"{"dequeue_order": "random"}"#).is_err());
}

#[test]
fn test_scheduler_config_from_env() {
    std::env::set_var("EVENTLOOP_HANDOFF_CAPACITY", "32");
    std::env::set_var("EVENTLOOP_DEQUEUE_ORDER", "LIFO");
    std::env::set_var("EVENTLOOP_ACTION_TIMEOUT_MS", "750");

    let cfg = SchedulerConfig::from_env().unwrap();
    assert_eq!(cfg.handoff_capacity, 32);
    assert_eq!(cfg.dequeue_order, DequeueOrder::Lifo);
    assert_eq!(cfg.action_timeout(), Some(Duration::from_millis(750)));

    std::env::set_var("EVENTLOOP_HANDOFF_CAPACITY", "lots");
    let err = SchedulerConfig::from_env().unwrap_err();
    assert!(err.to_string().contains("EVENTLOOP_HANDOFF_CAPACITY"));

    std::env::remove_var("EVENTLOOP_HANDOFF_CAPACITY");
    std::env::remove_var("EVENTLOOP_DEQUEUE_ORDER");
    std::env::remove_var("EVENTLOOP_ACTION_TIMEOUT_MS");
}

#[test]
fn test_retry_config_defaults() {
    let cfg = RetryConfig::default();
    assert_eq!(cfg.max_tries, 5);
    assert_eq!(cfg.initial_delay_ms, 200);
    assert_eq!(cfg.max_delay_ms, 1000);
}

#[test]
fn test_retry_config_from_json() {
    let cfg: RetryConfig = serde_json::from_str(r#"{"max_tries": 3}"#).unwrap();
    assert_eq!(cfg.max_tries, 3);
    assert_eq!(cfg.initial_delay_ms, 200);
}

#[test]
fn test_retry_config_from_env() {
    std::env::set_var("EVENTLOOP_RETRY_MAX_TRIES", "9");
    std::env::set_var("EVENTLOOP_RETRY_MAX_DELAY_MS", "5000");

    let cfg = RetryConfig::from_env().unwrap();
    assert_eq!(cfg.max_tries, 9);
    assert_eq!(cfg.initial_delay_ms, 200);
    assert_eq!(cfg.max_delay_ms, 5000);

    std::env::remove_var("EVENTLOOP_RETRY_MAX_TRIES");
    std::env::remove_var("EVENTLOOP_RETRY_MAX_DELAY_MS");
}
