//! Engine-level commands that write to the anchor ledger.

#![allow(clippy::result_large_err)]

use tanchor_core::errors::Result;
use tanchor_core::model::{Anchor, AnchorTarget, Confirmation};
use tanchor_core::rules::validate_target_id;
use tanchor_core_types::correlation::RequestContext;
use tracing::Instrument;

use crate::commands::publish::{PublishOutcome, RunOutcome};
use crate::engine::Engine;

/// Commands that mutate anchors or targets.
#[derive(Debug, Clone)]
pub enum EngineCommand {
    /// Snapshot upstream state into a new anchor, optionally publishing it.
    Run {
        /// Defaults to the configured target when `None`.
        target: Option<String>,
        publish: bool,
    },
    /// Publish an existing anchor.
    Publish {
        anchor_id: i64,
        target_id: String,
        idempotency_key: Option<String>,
    },
    /// Record an out-of-band confirmation.
    Confirm {
        anchor_id: i64,
        confirmation: Confirmation,
    },
    /// Record an out-of-band failure.
    Fail { anchor_id: i64, reason: String },
    /// Create or replace a publish target.
    UpsertTarget(AnchorTarget),
}

/// Result of applying an engine command.
#[derive(Debug, Clone)]
pub enum EngineCommandResult {
    Run(RunOutcome),
    Publish(PublishOutcome),
    /// Confirm and Fail both answer with the updated anchor.
    Anchor(Anchor),
    TargetSaved(AnchorTarget),
}

/// Apply an engine command under the request's correlation span.
///
/// Errors carry the request id of `ctx`.
pub async fn apply_engine_command(
    cmd: EngineCommand,
    engine: &Engine,
    ctx: &RequestContext,
) -> Result<EngineCommandResult> {
    let span = tracing::info_span!(
        "engine_command",
        request_id = %ctx.request_id,
        trigger = %ctx.trigger
    );

    dispatch(cmd, engine)
        .instrument(span)
        .await
        .map_err(|e| e.with_request_id(ctx.request_id.clone()))
}

async fn dispatch(cmd: EngineCommand, engine: &Engine) -> Result<EngineCommandResult> {
    match cmd {
        EngineCommand::Run { target, publish } => {
            let outcome = engine.run(target.as_deref(), publish).await?;
            Ok(EngineCommandResult::Run(outcome))
        }
        EngineCommand::Publish {
            anchor_id,
            target_id,
            idempotency_key,
        } => {
            let outcome = engine
                .publish_anchor(anchor_id, &target_id, idempotency_key.as_deref())
                .await?;
            Ok(EngineCommandResult::Publish(outcome))
        }
        EngineCommand::Confirm {
            anchor_id,
            confirmation,
        } => {
            let anchor = engine.lifecycle().confirm(anchor_id, &confirmation).await?;
            Ok(EngineCommandResult::Anchor(anchor))
        }
        EngineCommand::Fail { anchor_id, reason } => {
            let anchor = engine.lifecycle().fail(anchor_id, &reason).await?;
            Ok(EngineCommandResult::Anchor(anchor))
        }
        EngineCommand::UpsertTarget(target) => {
            validate_target_id(&target.target_id)?;
            engine.lifecycle().repository().upsert_target(&target)?;
            tracing::info!(
                target_id = %target.target_id,
                target_type = %target.target_type,
                enabled = target.enabled,
                "target saved"
            );
            Ok(EngineCommandResult::TargetSaved(target))
        }
    }
}
