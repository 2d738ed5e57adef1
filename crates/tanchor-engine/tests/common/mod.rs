#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use tanchor_core::errors::{Result, TaError, TaErrorKind};
use tanchor_core::model::{
    Anchor, AnchorListQuery, AnchorTarget, Confirmation, PublishRecord, Snapshot,
};
use tanchor_core::repository::AnchorRepository;
use tanchor_engine::audit::{AuditEvent, AuditSink};
use tanchor_engine::publish::{LocalLogPublisher, PublishRouter, UnimplementedPublisher};
use tanchor_engine::snapshot::{ChainHeadSource, RegistrySource, SnapshotCollector, SourceError};
use tanchor_engine::{AnchorLifecycle, Engine};
use tanchor_core::model::TargetType;
use tanchor_store::SqliteAnchorStore;

pub struct StaticRegistry(pub Vec<Value>);

#[async_trait]
impl RegistrySource for StaticRegistry {
    async fn fetch_issuers(&self) -> std::result::Result<Vec<Value>, SourceError> {
        Ok(self.0.clone())
    }
}

pub struct StaticChainHeads(pub Vec<Value>);

#[async_trait]
impl ChainHeadSource for StaticChainHeads {
    async fn fetch_heads(&self) -> std::result::Result<Vec<Value>, SourceError> {
        Ok(self.0.clone())
    }
}

/// Source that always fails with the given error
pub struct FailingSource(pub SourceError);

#[async_trait]
impl RegistrySource for FailingSource {
    async fn fetch_issuers(&self) -> std::result::Result<Vec<Value>, SourceError> {
        Err(self.0.clone())
    }
}

#[async_trait]
impl ChainHeadSource for FailingSource {
    async fn fetch_heads(&self) -> std::result::Result<Vec<Value>, SourceError> {
        Err(self.0.clone())
    }
}

/// Keeps every emitted event; optionally refuses them all
#[derive(Default)]
pub struct RecordingAuditSink {
    pub events: Mutex<Vec<AuditEvent>>,
    pub reject: bool,
}

impl RecordingAuditSink {
    pub fn rejecting() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            reject: true,
        }
    }

    pub fn types(&self) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|e| e.event_type.clone())
            .collect()
    }
}

#[async_trait]
impl AuditSink for RecordingAuditSink {
    async fn emit(&self, event: &AuditEvent) -> Result<()> {
        self.events.lock().unwrap().push(event.clone());
        if self.reject {
            return Err(TaError::new(TaErrorKind::ExternalService)
                .with_op("audit_emit")
                .with_message("audit sink down"));
        }
        Ok(())
    }
}

/// Never finishes an emission
pub struct StalledAuditSink;

#[async_trait]
impl AuditSink for StalledAuditSink {
    async fn emit(&self, _event: &AuditEvent) -> Result<()> {
        std::future::pending::<()>().await;
        Ok(())
    }
}

/// Delegates to `inner`, but the first `mark_anchored` fails with a
/// persistence error and writes nothing
pub struct FlakyConfirmRepo {
    inner: Arc<dyn AnchorRepository>,
    failed_once: AtomicBool,
}

impl FlakyConfirmRepo {
    pub fn new(inner: Arc<dyn AnchorRepository>) -> Self {
        Self {
            inner,
            failed_once: AtomicBool::new(false),
        }
    }
}

impl AnchorRepository for FlakyConfirmRepo {
    fn insert_pending(&self, snapshot: &Snapshot) -> Result<Anchor> {
        self.inner.insert_pending(snapshot)
    }

    fn get(&self, anchor_id: i64) -> Result<Option<Anchor>> {
        self.inner.get(anchor_id)
    }

    fn list(&self, query: &AnchorListQuery) -> Result<Vec<Anchor>> {
        self.inner.list(query)
    }

    fn latest(&self) -> Result<Option<Anchor>> {
        self.inner.latest()
    }

    fn latest_anchored_with_root(&self, combined_root_hash: &str) -> Result<Option<Anchor>> {
        self.inner.latest_anchored_with_root(combined_root_hash)
    }

    fn mark_anchored(
        &self,
        anchor_id: i64,
        confirmation: &Confirmation,
        anchored_at: DateTime<Utc>,
    ) -> Result<Anchor> {
        if !self.failed_once.swap(true, Ordering::SeqCst) {
            return Err(TaError::new(TaErrorKind::Persistence)
                .with_op("mark_anchored")
                .with_message("database is locked"));
        }
        self.inner.mark_anchored(anchor_id, confirmation, anchored_at)
    }

    fn mark_failed(&self, anchor_id: i64, reason: &str) -> Result<Anchor> {
        self.inner.mark_failed(anchor_id, reason)
    }

    fn list_enabled_targets(&self) -> Result<Vec<AnchorTarget>> {
        self.inner.list_enabled_targets()
    }

    fn get_enabled_target(&self, target_id: &str) -> Result<Option<AnchorTarget>> {
        self.inner.get_enabled_target(target_id)
    }

    fn upsert_target(&self, target: &AnchorTarget) -> Result<()> {
        self.inner.upsert_target(target)
    }

    fn find_publish_record(
        &self,
        anchor_id: i64,
        target_id: &str,
        idempotency_key: &str,
    ) -> Result<Option<PublishRecord>> {
        self.inner
            .find_publish_record(anchor_id, target_id, idempotency_key)
    }

    fn record_publish(&self, record: &PublishRecord) -> Result<()> {
        self.inner.record_publish(record)
    }
}

pub fn issuers() -> Vec<Value> {
    vec![
        json!({"issuer_id": "iss-b", "current_status": "ACTIVE", "status_updated_at": "2024-03-01T00:00:00Z"}),
        json!({"issuer_id": "iss-a", "current_status": "SUSPENDED", "status_updated_at": null}),
    ]
}

pub fn heads() -> Vec<Value> {
    vec![
        json!({"document_id": "doc-1", "head_event_hash": "a".repeat(64)}),
        json!({"document_id": "doc-2", "head_event_hash": "b".repeat(64)}),
        json!({"document_id": "doc-3", "head_event_hash": "c".repeat(64)}),
    ]
}

pub fn static_collector() -> SnapshotCollector {
    SnapshotCollector::new(
        Arc::new(StaticRegistry(issuers())),
        Arc::new(StaticChainHeads(heads())),
    )
}

pub fn memory_repo() -> Arc<dyn AnchorRepository> {
    Arc::new(SqliteAnchorStore::open_in_memory().unwrap())
}

pub struct Harness {
    pub repo: Arc<dyn AnchorRepository>,
    pub audit: Arc<RecordingAuditSink>,
    pub engine: Engine,
}

pub fn harness_with(collector: SnapshotCollector, audit: RecordingAuditSink) -> Harness {
    harness_on(memory_repo(), collector, audit)
}

pub fn harness_on(
    repo: Arc<dyn AnchorRepository>,
    collector: SnapshotCollector,
    audit: RecordingAuditSink,
) -> Harness {
    let audit = Arc::new(audit);
    let lifecycle = AnchorLifecycle::new(
        Arc::clone(&repo),
        collector,
        audit.clone() as Arc<dyn AuditSink>,
        "anchor-test",
    );
    let router = PublishRouter::new(Arc::new(LocalLogPublisher::new()))
        .with_publisher(TargetType::Notary, Arc::new(UnimplementedPublisher::notary()))
        .with_publisher(
            TargetType::Blockchain,
            Arc::new(UnimplementedPublisher::blockchain()),
        );
    let engine = Engine::new(lifecycle, router, "local-log");
    Harness {
        repo,
        audit,
        engine,
    }
}

pub fn harness() -> Harness {
    harness_with(static_collector(), RecordingAuditSink::default())
}
