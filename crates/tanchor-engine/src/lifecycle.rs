//! Anchor lifecycle: create, confirm, fail and the read accessors.
//!
//! Each mutating operation is logged with `log_op_start!` / `log_op_end!` /
//! `log_op_error!` and queues one audit event after the row is written.
//! Audit delivery happens in the background; failures are logged, never
//! returned.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tanchor_core::errors::{AnchorError, Result};
use tanchor_core::model::{Anchor, AnchorListQuery, AnchorTarget, Confirmation};
use tanchor_core::repository::AnchorRepository;
use tanchor_core::rules::{validate_confirmation, validate_target_id};
use tanchor_core::{log_op_end, log_op_error, log_op_start};
use tanchor_core_types::schema::{
    AUDIT_ANCHOR_CONFIRMED, AUDIT_ANCHOR_CREATED, AUDIT_ANCHOR_FAILED,
};

use crate::audit::{AuditDispatcher, AuditEvent, AuditSink};
use crate::snapshot::SnapshotCollector;

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

#[derive(Clone)]
pub struct AnchorLifecycle {
    repo: Arc<dyn AnchorRepository>,
    collector: SnapshotCollector,
    audit: AuditDispatcher,
    instance_id: String,
}

impl AnchorLifecycle {
    pub fn new(
        repo: Arc<dyn AnchorRepository>,
        collector: SnapshotCollector,
        audit: Arc<dyn AuditSink>,
        instance_id: impl Into<String>,
    ) -> Self {
        Self {
            repo,
            collector,
            audit: AuditDispatcher::new(audit),
            instance_id: instance_id.into(),
        }
    }

    pub fn repository(&self) -> &Arc<dyn AnchorRepository> {
        &self.repo
    }

    fn emit(&self, event_type: &str, anchor: &Anchor) {
        self.audit
            .dispatch(AuditEvent::for_anchor(event_type, anchor, &self.instance_id));
    }

    /// Wait for queued audit events to reach the sink
    pub async fn flush_audit(&self) {
        self.audit.flush().await;
    }

    /// Snapshot both sources and persist a new `PENDING` anchor.
    ///
    /// Upstream failures never surface here; they are folded into sentinel
    /// digests by the collector.
    ///
    /// # Errors
    /// Only persistence failures.
    pub async fn create(&self) -> Result<Anchor> {
        log_op_start!("anchor_create");
        let start = Instant::now();

        let snapshot = self.collector.create_snapshot().await;
        let anchor = self.repo.insert_pending(&snapshot).map_err(|e| {
            log_op_error!("anchor_create", e.clone(), duration_ms = elapsed_ms(start));
            e
        })?;

        self.emit(AUDIT_ANCHOR_CREATED, &anchor);

        log_op_end!(
            "anchor_create",
            duration_ms = elapsed_ms(start),
            anchor_id = anchor.id,
            combined_root_hash = %anchor.combined_root_hash
        );
        Ok(anchor)
    }

    /// Move a pending anchor to `ANCHORED`.
    ///
    /// # Errors
    /// `ERR_MISSING_FIELD` for a blank target or reference, `ERR_NOT_FOUND`
    /// for an unknown id, `ERR_ILLEGAL_TRANSITION` if the anchor is terminal.
    pub async fn confirm(&self, anchor_id: i64, confirmation: &Confirmation) -> Result<Anchor> {
        log_op_start!(
            "anchor_confirm",
            anchor_id = anchor_id,
            target_id = %confirmation.target_id
        );
        let start = Instant::now();

        let anchor = validate_confirmation(confirmation)
            .and_then(|()| self.repo.mark_anchored(anchor_id, confirmation, Utc::now()))
            .map_err(|e| {
                let e = e.with_anchor_id(anchor_id);
                log_op_error!(
                    "anchor_confirm",
                    e.clone(),
                    duration_ms = elapsed_ms(start),
                    anchor_id = anchor_id
                );
                e
            })?;

        self.emit(AUDIT_ANCHOR_CONFIRMED, &anchor);

        log_op_end!(
            "anchor_confirm",
            duration_ms = elapsed_ms(start),
            anchor_id = anchor_id
        );
        Ok(anchor)
    }

    /// Move a pending anchor to `FAILED`, keeping `reason` in the proof field.
    ///
    /// # Errors
    /// `ERR_NOT_FOUND` or `ERR_ILLEGAL_TRANSITION`.
    pub async fn fail(&self, anchor_id: i64, reason: &str) -> Result<Anchor> {
        log_op_start!("anchor_fail", anchor_id = anchor_id, reason = reason);
        let start = Instant::now();

        let anchor = self.repo.mark_failed(anchor_id, reason).map_err(|e| {
            log_op_error!(
                "anchor_fail",
                e.clone(),
                duration_ms = elapsed_ms(start),
                anchor_id = anchor_id
            );
            e
        })?;

        self.emit(AUDIT_ANCHOR_FAILED, &anchor);

        log_op_end!(
            "anchor_fail",
            duration_ms = elapsed_ms(start),
            anchor_id = anchor_id
        );
        Ok(anchor)
    }

    /// # Errors
    /// `ERR_NOT_FOUND` if no anchor has this id.
    pub fn get(&self, anchor_id: i64) -> Result<Anchor> {
        self.repo
            .get(anchor_id)?
            .ok_or_else(|| AnchorError::AnchorNotFound { anchor_id }.into())
    }

    pub fn list(&self, query: &AnchorListQuery) -> Result<Vec<Anchor>> {
        self.repo.list(query)
    }

    pub fn latest(&self) -> Result<Option<Anchor>> {
        self.repo.latest()
    }

    pub fn list_targets(&self) -> Result<Vec<AnchorTarget>> {
        self.repo.list_enabled_targets()
    }

    /// # Errors
    /// `ERR_MISSING_FIELD` for a blank id, `ERR_TARGET_NOT_FOUND` if the
    /// target is unknown or disabled.
    pub fn enabled_target(&self, target_id: &str) -> Result<AnchorTarget> {
        validate_target_id(target_id)?;
        self.repo.get_enabled_target(target_id)?.ok_or_else(|| {
            AnchorError::TargetNotFound {
                target_id: target_id.to_string(),
            }
            .into()
        })
    }
}
