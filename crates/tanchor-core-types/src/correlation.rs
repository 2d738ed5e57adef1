//! Correlation types for request tracking
//!
//! Every engine command or query runs under a `RequestId` so that log lines
//! from the collectors, the publishers and the store can be tied back to the
//! trigger (CLI invocation, API call or scheduled tick) that caused them.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a single request or operation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(String);

impl RequestId {
    /// Generate a new random RequestId using UUIDv7
    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// Get the string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Create from an existing string (e.g. an inbound `X-Request-Id`)
    pub fn from_string(s: String) -> Self {
        Self(s)
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Context carried through operation boundaries for correlation
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: RequestId,
    /// Who triggered the operation (`cli`, `scheduler`, `api`, ...)
    pub trigger: String,
}

impl RequestContext {
    /// Create a new context with a fresh RequestId
    pub fn new(trigger: impl Into<String>) -> Self {
        Self {
            request_id: RequestId::new(),
            trigger: trigger.into(),
        }
    }

    /// Create a context with an existing RequestId
    pub fn with_request_id(request_id: RequestId, trigger: impl Into<String>) -> Self {
        Self {
            request_id,
            trigger: trigger.into(),
        }
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new("internal")
    }
}
