//! Dispatch of anchors to publish targets
//!
//! One [`Publisher`] per target type. Publishers never return errors: every
//! transport or upstream failure comes back as [`PublishResult::Failed`].

pub mod local_log;
pub mod public_log;
pub mod unimplemented;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tanchor_core::model::{
    Anchor, AnchorTarget, PublishResult, TargetType, LOCAL_LOG_TARGET_ID,
};

pub use local_log::LocalLogPublisher;
pub use public_log::PublicLogPublisher;
pub use unimplemented::UnimplementedPublisher;

use crate::config::EngineConfig;
use crate::http::HttpPolicy;

/// Everything a publisher needs for one attempt
#[derive(Debug, Clone, Copy)]
pub struct PublishRequest<'a> {
    pub anchor: &'a Anchor,
    pub target: &'a AnchorTarget,
    /// Stable across retries of the same (anchor, target) publish
    pub idempotency_key: &'a str,
}

#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, request: PublishRequest<'_>) -> PublishResult;
}

pub struct PublishRouter {
    local_log: Arc<dyn Publisher>,
    by_type: HashMap<TargetType, Arc<dyn Publisher>>,
}

impl PublishRouter {
    /// Router with only the local-log sink registered
    pub fn new(local_log: Arc<dyn Publisher>) -> Self {
        Self {
            local_log,
            by_type: HashMap::new(),
        }
    }

    pub fn with_publisher(mut self, target_type: TargetType, publisher: Arc<dyn Publisher>) -> Self {
        self.by_type.insert(target_type, publisher);
        self
    }

    /// Local log, HTTP public log, and the not-yet-implemented notary,
    /// blockchain and certificate-transparency variants
    pub fn standard(config: &EngineConfig, http: &HttpPolicy) -> Self {
        Self::new(Arc::new(LocalLogPublisher::new()))
            .with_publisher(
                TargetType::PublicLog,
                Arc::new(PublicLogPublisher::new(
                    http.clone(),
                    config.public_log_url.clone(),
                    &config.source_name,
                )),
            )
            .with_publisher(TargetType::Notary, Arc::new(UnimplementedPublisher::notary()))
            .with_publisher(
                TargetType::Blockchain,
                Arc::new(UnimplementedPublisher::blockchain()),
            )
            .with_publisher(
                TargetType::CertificateTransparency,
                Arc::new(UnimplementedPublisher::certificate_transparency()),
            )
    }

    fn publisher_for(&self, target: &AnchorTarget) -> Option<&Arc<dyn Publisher>> {
        if target.target_id == LOCAL_LOG_TARGET_ID && target.target_type == TargetType::PublicLog {
            return Some(&self.local_log);
        }
        self.by_type.get(&target.target_type)
    }

    pub async fn publish(&self, request: PublishRequest<'_>) -> PublishResult {
        let result = match self.publisher_for(request.target) {
            Some(publisher) => publisher.publish(request).await,
            None => PublishResult::failed(format!(
                "Unknown target type: {}",
                request.target.target_type
            )),
        };

        if let Some(error) = result.error() {
            tracing::warn!(
                anchor_id = request.anchor.id,
                target_id = %request.target.target_id,
                reason = error,
                "publish failed"
            );
        }
        result
    }
}
