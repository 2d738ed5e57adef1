#![allow(clippy::unwrap_used, clippy::expect_used)]

use tanchor_core::errors::AnchorError;
use tanchor_core::logging_facility::test_capture::init_test_capture;
use tanchor_core::{log_op_end, log_op_error, log_op_start};
use tanchor_core_types::schema::{EVENT_END, EVENT_END_ERROR, EVENT_START};

#[test]
fn test_log_op_start_macro() {
    let capture = init_test_capture();
    let op_name = "test_log_op_start_unique_1";

    log_op_start!(op_name);

    capture.assert_event_exists(op_name, EVENT_START);
}

#[test]
fn test_log_op_end_records_duration() {
    let capture = init_test_capture();
    let op_name = "test_log_op_end_unique_2";

    log_op_end!(op_name, duration_ms = 42);

    let events = capture.events_for_op(op_name);
    let end_events: Vec<_> = events
        .iter()
        .filter(|e| e.event.as_deref() == Some(EVENT_END))
        .collect();

    assert_eq!(end_events.len(), 1);
    assert_eq!(end_events[0].field("duration_ms"), Some("42"));
}

#[test]
fn test_log_op_error_includes_code() {
    let capture = init_test_capture();
    let op_name = "test_log_op_error_unique_3";

    log_op_error!(
        op_name,
        AnchorError::AnchorNotFound { anchor_id: 5 },
        duration_ms = 10
    );

    let events = capture.events_for_op(op_name);
    let error_event = events
        .iter()
        .find(|e| e.event.as_deref() == Some(EVENT_END_ERROR))
        .expect("Should have error event");

    assert_eq!(error_event.field("err.code"), Some("ERR_NOT_FOUND"));
    assert_eq!(error_event.field("err.kind"), Some("NotFound"));
}

#[test]
fn test_boundary_ownership_single_start_end() {
    let capture = init_test_capture();
    let op_name = "test_boundary_ownership_unique_4";

    log_op_start!(op_name, anchor_id = 7);
    log_op_end!(op_name, duration_ms = 3, anchor_id = 7);

    let starts = capture.count_events(|e| {
        e.op.as_deref() == Some(op_name) && e.event.as_deref() == Some(EVENT_START)
    });
    let ends = capture.count_events(|e| {
        e.op.as_deref() == Some(op_name) && e.event.as_deref() == Some(EVENT_END)
    });

    assert_eq!(starts, 1);
    assert_eq!(ends, 1);
}

#[test]
fn test_log_macros_with_multiple_fields() {
    let capture = init_test_capture();
    let op_name = "test_log_macros_fields_unique_5";

    log_op_start!(op_name, anchor_id = 11, target_id = "local-log");

    let events = capture.events_for_op(op_name);
    let start_event = events.first().expect("Should have start event");

    assert_eq!(start_event.field("anchor_id"), Some("11"));
    assert_eq!(start_event.field("target_id"), Some("local-log"));
}

#[test]
#[should_panic(expected = "Expected event")]
fn test_capture_assert_event_exists_fails() {
    let capture = init_test_capture();
    capture.assert_event_exists("nonexistent_op_truly_unique_999", EVENT_START);
}

#[test]
fn test_illegal_transition_error_event() {
    let capture = init_test_capture();
    let op_name = "test_illegal_transition_unique_6";

    let err = AnchorError::IllegalTransition {
        anchor_id: 2,
        from: "FAILED".to_string(),
        to: "ANCHORED".to_string(),
    };
    log_op_error!(op_name, err, duration_ms = 1, anchor_id = 2);

    let events = capture.events_for_op(op_name);
    let error_event = events
        .iter()
        .find(|e| e.event.as_deref() == Some(EVENT_END_ERROR))
        .expect("Should have error event");
    assert_eq!(error_event.field("err.code"), Some("ERR_ILLEGAL_TRANSITION"));
    assert_eq!(error_event.field("anchor_id"), Some("2"));
}
