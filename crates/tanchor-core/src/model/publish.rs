use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use serde_json::Value;

/// Normalized outcome of publishing an anchor to a target.
///
/// Serializes as `{"success": true, "anchor_ref", "proof"}` or
/// `{"success": false, "error"}`.
#[derive(Debug, Clone, PartialEq)]
pub enum PublishResult {
    Published { anchor_ref: String, proof: Value },
    Failed { error: String },
}

impl PublishResult {
    pub fn published(anchor_ref: impl Into<String>, proof: Value) -> Self {
        PublishResult::Published {
            anchor_ref: anchor_ref.into(),
            proof,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        PublishResult::Failed {
            error: error.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, PublishResult::Published { .. })
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            PublishResult::Failed { error } => Some(error),
            PublishResult::Published { .. } => None,
        }
    }

    pub fn anchor_ref(&self) -> Option<&str> {
        match self {
            PublishResult::Published { anchor_ref, .. } => Some(anchor_ref),
            PublishResult::Failed { .. } => None,
        }
    }
}

#[derive(Serialize)]
struct PublishResultWire<'a> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    anchor_ref: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    proof: Option<&'a Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
}

impl Serialize for PublishResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let wire = match self {
            PublishResult::Published { anchor_ref, proof } => PublishResultWire {
                success: true,
                anchor_ref: Some(anchor_ref),
                proof: Some(proof),
                error: None,
            },
            PublishResult::Failed { error } => PublishResultWire {
                success: false,
                anchor_ref: None,
                proof: None,
                error: Some(error),
            },
        };
        wire.serialize(serializer)
    }
}

/// A successful publish, remembered per (anchor, target, idempotency key)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublishRecord {
    pub anchor_id: i64,
    pub target_id: String,
    pub idempotency_key: String,
    pub anchor_ref: String,
    pub proof: Value,
    pub published_at: DateTime<Utc>,
}

impl PublishRecord {
    pub fn to_result(&self) -> PublishResult {
        PublishResult::published(self.anchor_ref.clone(), self.proof.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_wire_shape() {
        let result = PublishResult::published("local://log/1", json!({"type": "local-log"}));
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({"success": true, "anchor_ref": "local://log/1", "proof": {"type": "local-log"}})
        );
    }

    #[test]
    fn test_failure_wire_shape() {
        let result = PublishResult::failed("Unknown target type: FAX");
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({"success": false, "error": "Unknown target type: FAX"})
        );
        assert_eq!(result.error(), Some("Unknown target type: FAX"));
        assert!(result.anchor_ref().is_none());
    }
}
