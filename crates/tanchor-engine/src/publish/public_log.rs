//! HTTP transparency log: `POST <url>/entries`
//!
//! The idempotency key travels both as an `Idempotency-Key` header and in
//! the body so the log server can collapse retried submissions.

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tanchor_core::model::PublishResult;

use super::{PublishRequest, Publisher};
use crate::http::HttpPolicy;

pub const IDEMPOTENCY_HEADER: &str = "Idempotency-Key";

#[derive(Debug, Serialize)]
struct LogSubmission<'a> {
    combined_root_hash: &'a str,
    issuer_registry_root_hash: &'a str,
    wcaf_heads_root_hash: &'a str,
    timestamp: String,
    source: &'a str,
    source_id: i64,
    idempotency_key: &'a str,
}

/// What the log server answers; everything is optional and passed through
#[derive(Debug, Default, Deserialize)]
struct LogReceipt {
    entry_id: Option<Value>,
    entry_url: Option<String>,
    entry_hash: Option<Value>,
    inclusion_proof: Option<Value>,
}

impl LogReceipt {
    fn anchor_ref(&self, log_url: &str) -> Option<String> {
        if let Some(url) = self.entry_url.as_deref().filter(|u| !u.is_empty()) {
            return Some(url.to_string());
        }
        let id = match self.entry_id.as_ref()? {
            Value::String(s) => s.clone(),
            Value::Null => return None,
            other => other.to_string(),
        };
        Some(format!("{}/entries/{}", log_url, id))
    }

    fn into_proof(self) -> Value {
        let mut proof = Map::new();
        proof.insert("type".to_string(), Value::from("public-log"));
        for (key, value) in [
            ("entry_id", self.entry_id),
            ("entry_hash", self.entry_hash),
            ("inclusion_proof", self.inclusion_proof),
        ] {
            if let Some(value) = value {
                proof.insert(key.to_string(), value);
            }
        }
        Value::Object(proof)
    }
}

pub struct PublicLogPublisher {
    http: HttpPolicy,
    default_url: Option<String>,
    source_name: String,
}

impl PublicLogPublisher {
    pub fn new(http: HttpPolicy, default_url: Option<String>, source_name: &str) -> Self {
        Self {
            http,
            default_url,
            source_name: source_name.to_string(),
        }
    }
}

#[async_trait]
impl Publisher for PublicLogPublisher {
    async fn publish(&self, request: PublishRequest<'_>) -> PublishResult {
        let Some(log_url) = request
            .target
            .config_str("url")
            .or(self.default_url.as_deref())
            .map(|url| url.trim_end_matches('/').to_string())
        else {
            return PublishResult::failed(format!(
                "No log URL configured for target {}",
                request.target.target_id
            ));
        };

        let anchor = request.anchor;
        let submission = LogSubmission {
            combined_root_hash: &anchor.combined_root_hash,
            issuer_registry_root_hash: &anchor.issuer_registry_root_hash,
            wcaf_heads_root_hash: &anchor.wcaf_heads_root_hash,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            source: &self.source_name,
            source_id: anchor.id,
            idempotency_key: request.idempotency_key,
        };

        let entries_url = format!("{}/entries", log_url);
        let response = match self
            .http
            .send_with_retry("public_log_submit", |client| {
                client
                    .post(&entries_url)
                    .header(IDEMPOTENCY_HEADER, request.idempotency_key)
                    .json(&submission)
            })
            .await
        {
            Ok(response) => response,
            Err(err) => return PublishResult::failed(err.to_string()),
        };

        if !response.status().is_success() {
            return PublishResult::failed(format!(
                "Log server returned {}",
                response.status().as_u16()
            ));
        }

        let receipt: LogReceipt = match response.json().await {
            Ok(receipt) => receipt,
            Err(err) => return PublishResult::failed(format!("Invalid log server response: {}", err)),
        };

        match receipt.anchor_ref(&log_url) {
            Some(anchor_ref) => PublishResult::published(anchor_ref, receipt.into_proof()),
            None => PublishResult::failed("Log server response has neither entry_url nor entry_id"),
        }
    }
}
