use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::hash::{combine_root_hash, Sentinel};

/// Why a source fell back to its sentinel digest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Degradation {
    pub sentinel: Sentinel,
    pub reason: String,
}

/// Digest and item count produced from one upstream source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDigest {
    pub hash: String,
    pub count: u64,
    /// Set when the source was unavailable and `hash` is a sentinel digest
    pub degradation: Option<Degradation>,
}

impl SourceDigest {
    pub fn observed(hash: String, count: u64) -> Self {
        Self {
            hash,
            count,
            degradation: None,
        }
    }

    /// Sentinel digest with a zero count
    pub fn degraded(sentinel: Sentinel, reason: impl Into<String>) -> Self {
        Self {
            hash: sentinel.digest(),
            count: 0,
            degradation: Some(Degradation {
                sentinel,
                reason: reason.into(),
            }),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.degradation.is_some()
    }
}

/// The digest tuple an anchor is created from
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub issuer_registry_root_hash: String,
    pub issuer_count: u64,
    pub wcaf_heads_root_hash: String,
    pub wcaf_document_count: u64,
    pub combined_root_hash: String,
    pub snapshot_at: DateTime<Utc>,
}

impl Snapshot {
    /// Combine the two source digests, stamping the given time.
    pub fn combine(
        registry: &SourceDigest,
        chain_heads: &SourceDigest,
        snapshot_at: DateTime<Utc>,
    ) -> Self {
        Self {
            issuer_registry_root_hash: registry.hash.clone(),
            issuer_count: registry.count,
            wcaf_heads_root_hash: chain_heads.hash.clone(),
            wcaf_document_count: chain_heads.count,
            combined_root_hash: combine_root_hash(&registry.hash, &chain_heads.hash),
            snapshot_at,
        }
    }
}
