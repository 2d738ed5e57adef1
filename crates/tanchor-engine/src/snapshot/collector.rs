//! Turns upstream records into per-source digests and a combined snapshot.
//!
//! Collection never fails: any source error is replaced by that source's
//! sentinel digest with a zero count, and a `degraded` warning is logged.

use std::sync::Arc;

use chrono::Utc;
use serde_json::{Map, Value};
use tanchor_core::hash::{combine_digests, digest_value, Sentinel};
use tanchor_core::model::{Snapshot, SourceDigest};
use tanchor_core_types::schema::EVENT_DEGRADED;

use super::sources::{
    ChainHeadSource, HttpChainHeadSource, HttpRegistrySource, RegistrySource, SourceError,
};
use crate::config::EngineConfig;
use crate::http::HttpPolicy;

const REGISTRY_FIELDS: [&str; 3] = ["issuer_id", "current_status", "status_updated_at"];

fn string_field<'a>(record: &'a Value, field: &str, what: &str) -> Result<&'a str, SourceError> {
    record
        .get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| SourceError::Malformed(format!("{} record without string `{}`", what, field)))
}

/// Digest of the issuer directory.
///
/// Each record is projected to `issuer_id`, `current_status` and
/// `status_updated_at` (absent fields stay absent, nulls stay null), sorted
/// by `issuer_id` and hashed as one canonical list.
///
/// # Errors
/// `Malformed` if a record has no string `issuer_id`.
pub fn registry_digest(issuers: &[Value]) -> Result<SourceDigest, SourceError> {
    let mut projected: Vec<(String, Value)> = Vec::with_capacity(issuers.len());
    for issuer in issuers {
        let issuer_id = string_field(issuer, "issuer_id", "issuer")?.to_string();
        let mut kept = Map::new();
        for field in REGISTRY_FIELDS {
            if let Some(value) = issuer.get(field) {
                kept.insert(field.to_string(), value.clone());
            }
        }
        projected.push((issuer_id, Value::Object(kept)));
    }
    projected.sort_by(|a, b| a.0.cmp(&b.0));

    let list = Value::Array(projected.into_iter().map(|(_, v)| v).collect());
    Ok(SourceDigest::observed(digest_value(&list), issuers.len() as u64))
}

/// Aggregate digest of the current chain heads.
///
/// # Errors
/// `Malformed` if a head lacks a string `document_id` or `head_event_hash`.
pub fn chain_heads_digest(heads: &[Value]) -> Result<SourceDigest, SourceError> {
    let mut projected: Vec<(&str, &str)> = Vec::with_capacity(heads.len());
    for head in heads {
        projected.push((
            string_field(head, "document_id", "chain head")?,
            string_field(head, "head_event_hash", "chain head")?,
        ));
    }
    projected.sort_by(|a, b| a.0.cmp(b.0));

    let hash = combine_digests(projected.iter().map(|(_, head_hash)| *head_hash));
    Ok(SourceDigest::observed(hash, heads.len() as u64))
}

fn degrade(source: &str, sentinel: Sentinel, err: &SourceError) -> SourceDigest {
    tracing::warn!(
        event = EVENT_DEGRADED,
        source,
        sentinel = sentinel.label(),
        reason = %err,
        "upstream unavailable, using sentinel digest"
    );
    SourceDigest::degraded(sentinel, err.to_string())
}

#[derive(Clone)]
pub struct SnapshotCollector {
    registry: Arc<dyn RegistrySource>,
    chain_heads: Arc<dyn ChainHeadSource>,
}

impl SnapshotCollector {
    pub fn new(registry: Arc<dyn RegistrySource>, chain_heads: Arc<dyn ChainHeadSource>) -> Self {
        Self {
            registry,
            chain_heads,
        }
    }

    /// HTTP-backed collector for the configured services
    pub fn from_config(config: &EngineConfig, http: &HttpPolicy) -> Self {
        Self::new(
            Arc::new(HttpRegistrySource::new(
                http.clone(),
                &config.registry_url,
                config.registry_page_limit,
            )),
            Arc::new(HttpChainHeadSource::new(
                http.clone(),
                &config.chain_service_url,
            )),
        )
    }

    pub async fn collect_registry(&self) -> SourceDigest {
        let result = match self.registry.fetch_issuers().await {
            Ok(issuers) => registry_digest(&issuers),
            Err(err) => Err(err),
        };
        result.unwrap_or_else(|err| degrade("issuer_registry", Sentinel::RegistryUnavailable, &err))
    }

    pub async fn collect_chain_heads(&self) -> SourceDigest {
        let result = match self.chain_heads.fetch_heads().await {
            Ok(heads) => chain_heads_digest(&heads),
            Err(err) => Err(err),
        };
        result.unwrap_or_else(|err| {
            let sentinel = match err {
                SourceError::CapabilityMissing(_) => Sentinel::ChainHeadsNotAvailable,
                _ => Sentinel::ChainHeadsUnavailable,
            };
            degrade("chain_heads", sentinel, &err)
        })
    }

    /// Both sources concurrently, then the combined root hash stamped with
    /// the time it was computed
    pub async fn create_snapshot(&self) -> Snapshot {
        let (registry, chain_heads) =
            futures::future::join(self.collect_registry(), self.collect_chain_heads()).await;
        Snapshot::combine(&registry, &chain_heads, Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tanchor_core::hash::{digest_text, digest_value};

    #[test]
    fn test_registry_digest_ignores_input_order_and_extra_fields() {
        let a = vec![
            json!({"issuer_id": "b", "current_status": "ACTIVE", "status_updated_at": null, "name": "Bee"}),
            json!({"issuer_id": "a", "current_status": "REVOKED", "status_updated_at": "2024-01-01"}),
        ];
        let b = vec![
            json!({"status_updated_at": "2024-01-01", "current_status": "REVOKED", "issuer_id": "a"}),
            json!({"issuer_id": "b", "status_updated_at": null, "current_status": "ACTIVE"}),
        ];

        let da = registry_digest(&a).unwrap();
        let db = registry_digest(&b).unwrap();
        assert_eq!(da.hash, db.hash);
        assert_eq!(da.count, 2);
    }

    #[test]
    fn test_registry_record_without_update_time_omits_the_key() {
        let issuers = vec![
            json!({"issuer_id": "a", "current_status": "ACTIVE"}),
            json!({"issuer_id": "b", "current_status": "REVOKED", "status_updated_at": "2024-01-01"}),
        ];

        let d = registry_digest(&issuers).unwrap();
        assert_eq!(
            d.hash,
            digest_value(&json!([
                {"current_status": "ACTIVE", "issuer_id": "a"},
                {"current_status": "REVOKED", "issuer_id": "b", "status_updated_at": "2024-01-01"}
            ]))
        );

        let with_null = vec![
            json!({"issuer_id": "a", "current_status": "ACTIVE", "status_updated_at": null}),
            issuers[1].clone(),
        ];
        assert_ne!(d.hash, registry_digest(&with_null).unwrap().hash);
    }

    #[test]
    fn test_registry_digest_of_empty_list() {
        let d = registry_digest(&[]).unwrap();
        assert_eq!(d.hash, digest_text("[]"));
        assert_eq!(d.count, 0);
    }

    #[test]
    fn test_registry_record_without_id_is_malformed() {
        let err = registry_digest(&[json!({"current_status": "ACTIVE"})]).unwrap_err();
        assert!(matches!(err, SourceError::Malformed(_)));
    }

    #[test]
    fn test_chain_heads_digest_is_combined_head_hashes() {
        let h1 = digest_text("one");
        let h2 = digest_text("two");
        let heads = vec![
            json!({"document_id": "doc-2", "head_event_hash": h2}),
            json!({"document_id": "doc-1", "head_event_hash": h1}),
        ];

        let d = chain_heads_digest(&heads).unwrap();
        assert_eq!(d.hash, combine_digests([&h1, &h2]));
        assert_eq!(d.count, 2);
    }

    #[test]
    fn test_no_heads_is_empty_sentinel() {
        let d = chain_heads_digest(&[]).unwrap();
        assert_eq!(d.hash, Sentinel::Empty.digest());
        assert!(!d.is_degraded());
    }
}
