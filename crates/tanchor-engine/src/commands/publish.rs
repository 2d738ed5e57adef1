//! Publish pipeline and the create-then-publish run.
//!
//! ## Publish steps (in order):
//! 1. Target id must be non-blank
//! 2. Anchor must exist
//! 3. Target must be enabled
//! 4. A recorded publish under the same idempotency key is replayed,
//!    confirming the anchor first if it is still pending
//! 5. An anchor already anchored on this target is replayed from the row;
//!    any other terminal anchor is rejected
//! 6. Dispatch through the router, record success, then confirm or fail

#![allow(clippy::result_large_err)]

use std::time::Instant;

use chrono::Utc;
use tanchor_core::errors::{Result, TaError};
use tanchor_core::hash::digest_text;
use tanchor_core::model::{Anchor, AnchorStatus, Confirmation, PublishRecord, PublishResult};
use tanchor_core::rules::{check_transition, validate_target_id};
use tanchor_core::{log_op_end, log_op_error, log_op_start};

use crate::engine::Engine;
use crate::publish::PublishRequest;

/// Key used when the caller supplies none; stable for a given anchor,
/// target and digest
pub fn default_idempotency_key(anchor: &Anchor, target_id: &str) -> String {
    digest_text(&format!(
        "{}:{}:{}",
        anchor.id, target_id, anchor.combined_root_hash
    ))
}

#[derive(Debug, Clone)]
pub struct PublishOutcome {
    /// The anchor after the transition (or as found, when replayed)
    pub anchor: Anchor,
    pub result: PublishResult,
    /// True when answered from an earlier publish without calling the target
    pub replayed: bool,
}

#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub anchor: Anchor,
    /// `None` when publishing was skipped or never reached the target
    pub publish: Option<PublishResult>,
    /// Set when the publish step itself was rejected (unknown target, ...)
    pub publish_error: Option<TaError>,
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        self.publish_error.is_none()
            && self
                .publish
                .as_ref()
                .map(PublishResult::is_success)
                .unwrap_or(true)
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

impl Engine {
    /// Publish an existing anchor to an enabled target and record the outcome
    /// on the anchor.
    ///
    /// A target-side failure is not an error: it moves the anchor to
    /// `FAILED` and comes back as `PublishResult::Failed`.
    ///
    /// # Errors
    /// `ERR_MISSING_FIELD`, `ERR_NOT_FOUND`, `ERR_TARGET_NOT_FOUND`,
    /// `ERR_ILLEGAL_TRANSITION`, or persistence failures.
    pub async fn publish_anchor(
        &self,
        anchor_id: i64,
        target_id: &str,
        idempotency_key: Option<&str>,
    ) -> Result<PublishOutcome> {
        log_op_start!("anchor_publish", anchor_id = anchor_id, target_id = target_id);
        let start = Instant::now();

        let outcome = self
            .publish_anchor_impl(anchor_id, target_id, idempotency_key)
            .await
            .map_err(|e| {
                let e = e.with_anchor_id(anchor_id).with_target_id(target_id);
                log_op_error!(
                    "anchor_publish",
                    e.clone(),
                    duration_ms = elapsed_ms(start),
                    anchor_id = anchor_id,
                    target_id = target_id
                );
                e
            })?;

        log_op_end!(
            "anchor_publish",
            duration_ms = elapsed_ms(start),
            anchor_id = anchor_id,
            target_id = target_id,
            success = outcome.result.is_success(),
            replayed = outcome.replayed
        );
        Ok(outcome)
    }

    async fn publish_anchor_impl(
        &self,
        anchor_id: i64,
        target_id: &str,
        idempotency_key: Option<&str>,
    ) -> Result<PublishOutcome> {
        validate_target_id(target_id)?;
        let lifecycle = self.lifecycle();
        let anchor = lifecycle.get(anchor_id)?;
        let target = lifecycle.enabled_target(target_id)?;

        let key = idempotency_key
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| default_idempotency_key(&anchor, target_id));

        let repo = lifecycle.repository();
        if let Some(record) = repo.find_publish_record(anchor.id, target_id, &key)? {
            // A recorded publish whose confirm never landed is finished here.
            let anchor = if anchor.is_pending() {
                lifecycle
                    .confirm(
                        anchor_id,
                        &Confirmation::new(
                            target_id,
                            record.anchor_ref.clone(),
                            Some(record.proof.clone()),
                        ),
                    )
                    .await?
            } else {
                anchor
            };
            return Ok(PublishOutcome {
                result: record.to_result(),
                anchor,
                replayed: true,
            });
        }

        if anchor.is_anchored() && anchor.anchor_target.as_deref() == Some(target_id) {
            let result = PublishResult::published(
                anchor.anchor_ref.clone().unwrap_or_default(),
                anchor.anchor_proof.clone().unwrap_or_default(),
            );
            return Ok(PublishOutcome {
                anchor,
                result,
                replayed: true,
            });
        }
        check_transition(&anchor, AnchorStatus::Anchored)?;

        let result = self
            .router()
            .publish(PublishRequest {
                anchor: &anchor,
                target: &target,
                idempotency_key: &key,
            })
            .await;

        let anchor = match &result {
            PublishResult::Published { anchor_ref, proof } => {
                repo.record_publish(&PublishRecord {
                    anchor_id,
                    target_id: target_id.to_string(),
                    idempotency_key: key.clone(),
                    anchor_ref: anchor_ref.clone(),
                    proof: proof.clone(),
                    published_at: Utc::now(),
                })?;
                lifecycle
                    .confirm(
                        anchor_id,
                        &Confirmation::new(target_id, anchor_ref.clone(), Some(proof.clone())),
                    )
                    .await?
            }
            PublishResult::Failed { error } => lifecycle.fail(anchor_id, error).await?,
        };

        Ok(PublishOutcome {
            anchor,
            result,
            replayed: false,
        })
    }

    /// Create an anchor and, when `publish` is set, publish it to `target`
    /// (or the configured default target).
    ///
    /// The created anchor is returned even if publishing is rejected.
    ///
    /// # Errors
    /// Only when the anchor itself cannot be created.
    pub async fn run(&self, target: Option<&str>, publish: bool) -> Result<RunOutcome> {
        let anchor = self.lifecycle().create().await?;
        if !publish {
            return Ok(RunOutcome {
                anchor,
                publish: None,
                publish_error: None,
            });
        }

        let target_id = target.unwrap_or_else(|| self.default_target());
        match self.publish_anchor(anchor.id, target_id, None).await {
            Ok(outcome) => Ok(RunOutcome {
                anchor: outcome.anchor,
                publish: Some(outcome.result),
                publish_error: None,
            }),
            Err(err) => Ok(RunOutcome {
                anchor,
                publish: None,
                publish_error: Some(err),
            }),
        }
    }
}
