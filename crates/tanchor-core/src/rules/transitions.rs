use crate::errors::{AnchorError, Result};
use crate::model::{Anchor, AnchorStatus};

/// Whether the anchor state machine permits `from -> to`.
///
/// Only `PENDING -> ANCHORED` and `PENDING -> FAILED` are legal. Terminal
/// states never move, and nothing transitions into `EXPIRED`.
pub fn is_legal_transition(from: AnchorStatus, to: AnchorStatus) -> bool {
    !from.is_terminal() && matches!(to, AnchorStatus::Anchored | AnchorStatus::Failed)
}

/// Reject the transition of `anchor` into `to` unless it is legal
///
/// # Errors
/// Returns `ERR_ILLEGAL_TRANSITION` carrying the anchor id.
pub fn check_transition(anchor: &Anchor, to: AnchorStatus) -> Result<()> {
    if is_legal_transition(anchor.status, to) {
        Ok(())
    } else {
        Err(AnchorError::IllegalTransition {
            anchor_id: anchor.id,
            from: anchor.status.to_string(),
            to: to.to_string(),
        }
        .into())
    }
}
