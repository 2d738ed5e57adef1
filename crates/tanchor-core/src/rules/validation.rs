use crate::errors::{AnchorError, Result};
use crate::hash::DIGEST_HEX_LEN;
use crate::model::Confirmation;

fn require(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(AnchorError::MissingField {
            field: field.to_string(),
        }
        .into());
    }
    Ok(())
}

/// Confirm needs both a target id and a non-blank reference
///
/// # Errors
/// Returns `ERR_MISSING_FIELD` naming the first blank field.
pub fn validate_confirmation(confirmation: &Confirmation) -> Result<()> {
    require("anchor_target", &confirmation.target_id)?;
    require("anchor_ref", &confirmation.anchor_ref)
}

/// # Errors
/// Returns `ERR_MISSING_FIELD` if the id is blank.
pub fn validate_target_id(target_id: &str) -> Result<()> {
    require("target_id", target_id)
}

/// Check for a 64-character lowercase hex digest
///
/// # Errors
/// Returns `ERR_INVALID_DIGEST` for anything else.
pub fn validate_digest(value: &str) -> Result<()> {
    let well_formed = value.len() == DIGEST_HEX_LEN
        && value
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
    if well_formed {
        Ok(())
    } else {
        Err(AnchorError::InvalidDigest {
            value: value.to_string(),
        }
        .into())
    }
}
