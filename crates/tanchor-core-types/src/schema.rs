//! Canonical schema constants for structured logging and audit events
//!
//! These constants keep log fields and audit event names consistent across
//! the lifecycle, the collectors and the publishers.

// Field keys read back by the test capture layer
pub const FIELD_COMPONENT: &str = "component";
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";

// Canonical event names
pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";
pub const EVENT_DEGRADED: &str = "degraded";

// Audit event types emitted to the forensics sink
pub const AUDIT_ANCHOR_CREATED: &str = "TRANSPARENCY_ANCHOR_CREATED";
pub const AUDIT_ANCHOR_CONFIRMED: &str = "TRANSPARENCY_ANCHOR_CONFIRMED";
pub const AUDIT_ANCHOR_FAILED: &str = "TRANSPARENCY_ANCHOR_FAILED";
