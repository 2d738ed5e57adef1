use chrono::{DateTime, Utc};
use serde::Serialize;

use super::anchor::Anchor;

/// Answer to "was this combined root hash anchored, and when?"
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Verification {
    pub verified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchor_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchored_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchor_target: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchor_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Verification {
    pub fn not_found() -> Self {
        Self {
            verified: false,
            anchor_id: None,
            anchored_at: None,
            anchor_target: None,
            anchor_ref: None,
            message: Some("Hash not found in anchor history".to_string()),
        }
    }

    /// Build a positive answer from an anchored record
    pub fn from_anchor(anchor: &Anchor) -> Self {
        Self {
            verified: true,
            anchor_id: Some(anchor.id),
            anchored_at: anchor.anchored_at,
            anchor_target: anchor.anchor_target.clone(),
            anchor_ref: anchor.anchor_ref.clone(),
            message: None,
        }
    }
}
