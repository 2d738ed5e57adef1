use async_trait::async_trait;
use tanchor_core::model::PublishResult;

use super::{PublishRequest, Publisher};

/// Placeholder for target types with no integration yet; always fails
/// with a fixed message
pub struct UnimplementedPublisher {
    capability: &'static str,
}

impl UnimplementedPublisher {
    pub fn notary() -> Self {
        Self {
            capability: "Notary",
        }
    }

    pub fn blockchain() -> Self {
        Self {
            capability: "Blockchain",
        }
    }

    pub fn certificate_transparency() -> Self {
        Self {
            capability: "Certificate transparency",
        }
    }
}

#[async_trait]
impl Publisher for UnimplementedPublisher {
    async fn publish(&self, request: PublishRequest<'_>) -> PublishResult {
        tracing::debug!(
            target_id = %request.target.target_id,
            capability = self.capability,
            "publisher not implemented"
        );
        PublishResult::failed(format!("{} integration not yet implemented", self.capability))
    }
}
