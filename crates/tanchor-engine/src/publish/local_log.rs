//! Local append-only log sink
//!
//! Always available. Emits the entry as a structured log line and, when the
//! target config names a `path`, appends it to that file as JSON lines.

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::json;
use tanchor_core::hash::digest;
use tanchor_core::model::PublishResult;
use tokio::io::AsyncWriteExt;

use super::{PublishRequest, Publisher};

#[derive(Debug, Clone, Serialize)]
pub struct LocalLogEntry {
    pub timestamp: String,
    pub combined_root_hash: String,
    pub issuer_registry_root_hash: String,
    pub wcaf_heads_root_hash: String,
    pub anchor_id: i64,
}

#[derive(Debug, Default)]
pub struct LocalLogPublisher;

impl LocalLogPublisher {
    pub fn new() -> Self {
        Self
    }
}

async fn append_line(path: &str, line: &str) -> std::io::Result<()> {
    if let Some(parent) = std::path::Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    file.write_all(line.as_bytes()).await?;
    file.write_all(b"\n").await?;
    file.flush().await
}

#[async_trait]
impl Publisher for LocalLogPublisher {
    async fn publish(&self, request: PublishRequest<'_>) -> PublishResult {
        let anchor = request.anchor;
        let entry = LocalLogEntry {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            combined_root_hash: anchor.combined_root_hash.clone(),
            issuer_registry_root_hash: anchor.issuer_registry_root_hash.clone(),
            wcaf_heads_root_hash: anchor.wcaf_heads_root_hash.clone(),
            anchor_id: anchor.id,
        };

        let (entry_hash, line) = match (digest(&entry), serde_json::to_string(&entry)) {
            (Ok(hash), Ok(line)) => (hash, line),
            (Err(err), _) => return PublishResult::failed(err.to_string()),
            (_, Err(err)) => return PublishResult::failed(err.to_string()),
        };

        tracing::info!(anchor_id = anchor.id, entry = %line, "local log entry");

        if let Some(path) = request.target.config_str("path") {
            if let Err(err) = append_line(path, &line).await {
                return PublishResult::failed(format!("Local log write failed: {}", err));
            }
        }

        PublishResult::published(
            format!("local://log/{}", anchor.id),
            json!({
                "type": "local-log",
                "entry_hash": entry_hash,
                "logged_at": entry.timestamp,
            }),
        )
    }
}
