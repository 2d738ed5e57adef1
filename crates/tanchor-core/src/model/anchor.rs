use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::AnchorError;

/// Lifecycle status of an anchor
///
/// `Pending` is the only initial state; `Anchored` and `Failed` are
/// terminal. `Expired` is representable and round-trips through storage but
/// nothing in this workspace produces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnchorStatus {
    Pending,
    Anchored,
    Failed,
    Expired,
}

impl AnchorStatus {
    /// Stored / wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            AnchorStatus::Pending => "PENDING",
            AnchorStatus::Anchored => "ANCHORED",
            AnchorStatus::Failed => "FAILED",
            AnchorStatus::Expired => "EXPIRED",
        }
    }

    /// Whether no further transition is permitted
    pub fn is_terminal(&self) -> bool {
        !matches!(self, AnchorStatus::Pending)
    }
}

impl std::fmt::Display for AnchorStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AnchorStatus {
    type Err = AnchorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Ok(AnchorStatus::Pending),
            "ANCHORED" => Ok(AnchorStatus::Anchored),
            "FAILED" => Ok(AnchorStatus::Failed),
            "EXPIRED" => Ok(AnchorStatus::Expired),
            _ => Err(AnchorError::InvalidStatus {
                value: s.to_string(),
            }),
        }
    }
}

/// A persisted commitment to the combined digest of upstream state at a
/// point in time.
///
/// `anchor_ref` and `anchored_at` are set exactly when the status is
/// `Anchored`. `anchor_proof` holds the target's evidence when anchored and
/// a `{"error": reason}` payload when failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anchor {
    /// Assigned by the store, immutable
    pub id: i64,

    /// Digest of the issuer-registry snapshot
    pub issuer_registry_root_hash: String,

    /// Digest of the event-chain heads snapshot
    pub wcaf_heads_root_hash: String,

    /// `H(issuer_registry_root_hash ‖ wcaf_heads_root_hash)`
    pub combined_root_hash: String,

    /// Issuers observed at snapshot time
    pub issuer_count: u64,

    /// Event-chain documents observed at snapshot time
    pub wcaf_document_count: u64,

    /// When the upstream state was sampled
    pub snapshot_at: DateTime<Utc>,

    pub status: AnchorStatus,

    /// Target id used on successful publish
    pub anchor_target: Option<String>,

    /// Opaque locator returned by the target
    pub anchor_ref: Option<String>,

    /// Target-specific evidence (or failure payload)
    pub anchor_proof: Option<Value>,

    /// Set only when anchored
    pub anchored_at: Option<DateTime<Utc>>,

    /// Row creation time, used for history ordering
    pub created_at: DateTime<Utc>,
}

impl Anchor {
    pub fn is_pending(&self) -> bool {
        self.status == AnchorStatus::Pending
    }

    pub fn is_anchored(&self) -> bool {
        self.status == AnchorStatus::Anchored
    }

    /// Failure reason recorded by a `fail` transition
    pub fn failure_reason(&self) -> Option<&str> {
        if self.status != AnchorStatus::Failed {
            return None;
        }
        self.anchor_proof
            .as_ref()
            .and_then(|proof| proof.get("error"))
            .and_then(Value::as_str)
    }
}

/// Input to the `confirm` transition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Confirmation {
    pub target_id: String,
    pub anchor_ref: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor_proof: Option<Value>,
}

impl Confirmation {
    pub fn new(
        target_id: impl Into<String>,
        anchor_ref: impl Into<String>,
        anchor_proof: Option<Value>,
    ) -> Self {
        Self {
            target_id: target_id.into(),
            anchor_ref: anchor_ref.into(),
            anchor_proof,
        }
    }
}

/// Paging and filtering for anchor history
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnchorListQuery {
    pub limit: u32,
    pub offset: u32,
    pub status: Option<AnchorStatus>,
}

impl AnchorListQuery {
    pub const DEFAULT_LIMIT: u32 = 100;

    pub fn with_status(mut self, status: AnchorStatus) -> Self {
        self.status = Some(status);
        self
    }
}

impl Default for AnchorListQuery {
    fn default() -> Self {
        Self {
            limit: Self::DEFAULT_LIMIT,
            offset: 0,
            status: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::{combine_root_hash, digest_text};
    use serde_json::json;

    fn sample(status: AnchorStatus) -> Anchor {
        let registry = digest_text("registry");
        let heads = digest_text("heads");
        Anchor {
            id: 1,
            combined_root_hash: combine_root_hash(&registry, &heads),
            issuer_registry_root_hash: registry,
            wcaf_heads_root_hash: heads,
            issuer_count: 2,
            wcaf_document_count: 3,
            snapshot_at: Utc::now(),
            status,
            anchor_target: None,
            anchor_ref: None,
            anchor_proof: None,
            anchored_at: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_status_round_trip() {
        for status in [
            AnchorStatus::Pending,
            AnchorStatus::Anchored,
            AnchorStatus::Failed,
            AnchorStatus::Expired,
        ] {
            assert_eq!(status.as_str().parse::<AnchorStatus>().unwrap(), status);
        }
        assert!("anchored".parse::<AnchorStatus>().is_ok());
        assert!("DONE".parse::<AnchorStatus>().is_err());
    }

    #[test]
    fn test_only_pending_is_non_terminal() {
        assert!(!AnchorStatus::Pending.is_terminal());
        assert!(AnchorStatus::Anchored.is_terminal());
        assert!(AnchorStatus::Failed.is_terminal());
        assert!(AnchorStatus::Expired.is_terminal());
    }

    #[test]
    fn test_status_serializes_screaming_case() {
        assert_eq!(
            serde_json::to_value(AnchorStatus::Anchored).unwrap(),
            json!("ANCHORED")
        );
    }

    #[test]
    fn test_failure_reason_only_for_failed() {
        let mut anchor = sample(AnchorStatus::Failed);
        anchor.anchor_proof = Some(json!({"error": "Log server returned 503"}));
        assert_eq!(anchor.failure_reason(), Some("Log server returned 503"));

        anchor.status = AnchorStatus::Anchored;
        assert_eq!(anchor.failure_reason(), None);
    }
}
