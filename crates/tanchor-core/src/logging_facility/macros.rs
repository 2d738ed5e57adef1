//! Canonical logging macros
//!
//! Every lifecycle and publish operation logs exactly one `start` and one
//! `end` (or `end_error`) event through these macros.

/// Log the start of an operation
///
/// # Example
///
/// ```
/// # use tanchor_core::log_op_start;
/// log_op_start!("anchor_create");
/// log_op_start!("anchor_confirm", anchor_id = 42);
/// ```
#[macro_export]
macro_rules! log_op_start {
    ($op:expr) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = tanchor_core_types::schema::EVENT_START,
        );
    };
    ($op:expr, $($field:tt)*) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = tanchor_core_types::schema::EVENT_START,
            $($field)*
        );
    };
}

/// Log the successful end of an operation
///
/// # Example
///
/// ```
/// # use tanchor_core::log_op_end;
/// log_op_end!("anchor_create", duration_ms = 42);
/// ```
#[macro_export]
macro_rules! log_op_end {
    ($op:expr, duration_ms = $duration:expr) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = tanchor_core_types::schema::EVENT_END,
            duration_ms = $duration,
        );
    };
    ($op:expr, duration_ms = $duration:expr, $($field:tt)*) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = tanchor_core_types::schema::EVENT_END,
            duration_ms = $duration,
            $($field)*
        );
    };
}

/// Log an operation error
///
/// Accepts anything convertible into `TaError` and records its kind and
/// stable code.
///
/// # Example
///
/// ```
/// # use tanchor_core::{log_op_error, errors::AnchorError};
/// let err = AnchorError::AnchorNotFound { anchor_id: 1 };
/// log_op_error!("anchor_get", err, duration_ms = 10);
/// ```
#[macro_export]
macro_rules! log_op_error {
    ($op:expr, $err:expr, duration_ms = $duration:expr) => {{
        let ta_err: $crate::errors::TaError = $err.into();
        tracing::error!(
            component = module_path!(),
            op = $op,
            event = tanchor_core_types::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err.kind = ?ta_err.kind(),
            err.code = ta_err.code(),
            err.message = ta_err.message(),
        );
    }};
    ($op:expr, $err:expr, duration_ms = $duration:expr, $($field:tt)*) => {{
        let ta_err: $crate::errors::TaError = $err.into();
        tracing::error!(
            component = module_path!(),
            op = $op,
            event = tanchor_core_types::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err.kind = ?ta_err.kind(),
            err.code = ta_err.code(),
            err.message = ta_err.message(),
            $($field)*
        );
    }};
}
