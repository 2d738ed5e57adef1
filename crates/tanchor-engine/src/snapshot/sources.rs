//! Upstream collaborators feeding a snapshot
//!
//! Sources return raw upstream records; projection and hashing happen in
//! the collector so they stay pure.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::http::HttpPolicy;

/// Why a source could not produce records
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    /// Transport failure or non-success status
    #[error("{0}")]
    Unavailable(String),

    /// Service answered its health check but lacks the endpoint
    #[error("{0}")]
    CapabilityMissing(String),

    /// Response did not have the expected shape
    #[error("{0}")]
    Malformed(String),
}

#[async_trait]
pub trait RegistrySource: Send + Sync {
    /// Every issuer record in the directory
    async fn fetch_issuers(&self) -> Result<Vec<Value>, SourceError>;
}

#[async_trait]
pub trait ChainHeadSource: Send + Sync {
    /// Current head of every tracked document chain
    async fn fetch_heads(&self) -> Result<Vec<Value>, SourceError>;
}

fn trim_base(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

/// Pull the named array out of a response body; a missing key is an empty list
fn records_under(body: Value, key: &str) -> Result<Vec<Value>, SourceError> {
    match body {
        Value::Object(mut map) => match map.remove(key) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Array(items)) => Ok(items),
            Some(other) => Err(SourceError::Malformed(format!(
                "expected `{}` to be an array, got {}",
                key, other
            ))),
        },
        other => Err(SourceError::Malformed(format!(
            "expected a JSON object, got {}",
            other
        ))),
    }
}

/// `GET <registry>/directory?limit=N`
pub struct HttpRegistrySource {
    http: HttpPolicy,
    base_url: String,
    page_limit: u32,
}

impl HttpRegistrySource {
    pub fn new(http: HttpPolicy, base_url: &str, page_limit: u32) -> Self {
        Self {
            http,
            base_url: trim_base(base_url),
            page_limit,
        }
    }
}

#[async_trait]
impl RegistrySource for HttpRegistrySource {
    async fn fetch_issuers(&self) -> Result<Vec<Value>, SourceError> {
        let url = format!("{}/directory", self.base_url);
        let limit = self.page_limit.to_string();
        let response = self
            .http
            .send_with_retry("registry_directory", |client| {
                client.get(&url).query(&[("limit", limit.as_str())])
            })
            .await
            .map_err(|e| SourceError::Unavailable(format!("Registry fetch failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(SourceError::Unavailable(format!(
                "Registry fetch failed: {}",
                response.status().as_u16()
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| SourceError::Malformed(format!("Registry response: {}", e)))?;
        records_under(body, "issuers")
    }
}

/// `GET <chain-service>/chain-heads`, with `/health` as the liveness fallback
pub struct HttpChainHeadSource {
    http: HttpPolicy,
    base_url: String,
}

impl HttpChainHeadSource {
    pub fn new(http: HttpPolicy, base_url: &str) -> Self {
        Self {
            http,
            base_url: trim_base(base_url),
        }
    }

    async fn service_is_up(&self) -> bool {
        let url = format!("{}/health", self.base_url);
        match self
            .http
            .send_with_retry("chain_health", |client| client.get(&url))
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}

#[async_trait]
impl ChainHeadSource for HttpChainHeadSource {
    async fn fetch_heads(&self) -> Result<Vec<Value>, SourceError> {
        let url = format!("{}/chain-heads", self.base_url);
        let response = self
            .http
            .send_with_retry("chain_heads", |client| client.get(&url))
            .await
            .map_err(|e| SourceError::Unavailable(format!("Chain-heads fetch failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            if self.service_is_up().await {
                return Err(SourceError::CapabilityMissing(format!(
                    "chain-heads endpoint returned {}",
                    status.as_u16()
                )));
            }
            return Err(SourceError::Unavailable(format!(
                "Chain-heads fetch failed: {}",
                status.as_u16()
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| SourceError::Malformed(format!("Chain-heads response: {}", e)))?;
        records_under(body, "heads")
    }
}
