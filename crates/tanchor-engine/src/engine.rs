//! Wiring of the lifecycle, verifier and publish router behind one handle.

use std::sync::Arc;

use tanchor_core::errors::Result;
use tanchor_core::repository::AnchorRepository;

use crate::audit::{AuditSink, HttpAuditSink};
use crate::config::EngineConfig;
use crate::http::HttpPolicy;
use crate::lifecycle::AnchorLifecycle;
use crate::publish::PublishRouter;
use crate::snapshot::SnapshotCollector;
use crate::verifier::Verifier;

pub struct Engine {
    lifecycle: AnchorLifecycle,
    verifier: Verifier,
    router: PublishRouter,
    default_target: String,
}

impl Engine {
    pub fn new(
        lifecycle: AnchorLifecycle,
        router: PublishRouter,
        default_target: impl Into<String>,
    ) -> Self {
        let verifier = Verifier::new(Arc::clone(lifecycle.repository()));
        Self {
            lifecycle,
            verifier,
            router,
            default_target: default_target.into(),
        }
    }

    /// HTTP collectors, HTTP audit sink and the standard publishers over the
    /// given repository
    ///
    /// # Errors
    /// `ERR_CONFIGURATION` if the HTTP client cannot be built.
    pub fn from_config(config: &EngineConfig, repo: Arc<dyn AnchorRepository>) -> Result<Self> {
        let http = HttpPolicy::from_config(config)?;
        let collector = SnapshotCollector::from_config(config, &http);
        let audit: Arc<dyn AuditSink> = Arc::new(HttpAuditSink::new(http.clone(), &config.audit_url));
        let lifecycle = AnchorLifecycle::new(repo, collector, audit, config.instance_id.clone());
        let router = PublishRouter::standard(config, &http);
        Ok(Self::new(lifecycle, router, config.default_target.clone()))
    }

    pub fn lifecycle(&self) -> &AnchorLifecycle {
        &self.lifecycle
    }

    pub fn verifier(&self) -> &Verifier {
        &self.verifier
    }

    pub fn router(&self) -> &PublishRouter {
        &self.router
    }

    pub fn default_target(&self) -> &str {
        &self.default_target
    }
}
