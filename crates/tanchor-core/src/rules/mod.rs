//! Pure rules: anchor state machine and input validation.

pub mod transitions;
pub mod validation;

pub use transitions::{check_transition, is_legal_transition};
pub use validation::{validate_confirmation, validate_digest, validate_target_id};
