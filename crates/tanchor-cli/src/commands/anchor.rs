//! Commands that create or transition anchors

use anyhow::{anyhow, bail};
use clap::Args;
use serde_json::{json, Value};
use tanchor_core::model::Confirmation;
use tanchor_engine::{apply_engine_command, EngineCommand, EngineCommandResult};

use super::{print_json, AppContext};

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Target to publish to (defaults to TANCHOR_DEFAULT_TARGET)
    #[arg(long)]
    pub target: Option<String>,

    /// Create the anchor but leave it pending
    #[arg(long)]
    pub no_publish: bool,
}

#[derive(Debug, Args)]
pub struct PublishArgs {
    pub anchor_id: i64,

    #[arg(long)]
    pub target: String,

    /// Reuse a key to make a retried publish a no-op
    #[arg(long)]
    pub idempotency_key: Option<String>,
}

#[derive(Debug, Args)]
pub struct ConfirmArgs {
    pub anchor_id: i64,

    #[arg(long)]
    pub target: String,

    #[arg(long = "ref")]
    pub anchor_ref: String,

    /// Target evidence as a JSON document
    #[arg(long)]
    pub proof: Option<String>,
}

pub async fn run(app: &AppContext, args: RunArgs) -> anyhow::Result<()> {
    let cmd = EngineCommand::Run {
        target: args.target,
        publish: !args.no_publish,
    };
    let EngineCommandResult::Run(outcome) = apply_engine_command(cmd, &app.engine, &app.request).await?
    else {
        bail!("unexpected result for run");
    };

    print_json(&json!({
        "anchor": outcome.anchor,
        "publish": outcome.publish,
    }))?;

    if let Some(err) = outcome.publish_error {
        return Err(err.into());
    }
    if let Some(reason) = outcome.publish.as_ref().and_then(|p| p.error()) {
        bail!("publish failed: {}", reason);
    }
    Ok(())
}

pub async fn publish(app: &AppContext, args: PublishArgs) -> anyhow::Result<()> {
    let cmd = EngineCommand::Publish {
        anchor_id: args.anchor_id,
        target_id: args.target,
        idempotency_key: args.idempotency_key,
    };
    let EngineCommandResult::Publish(outcome) =
        apply_engine_command(cmd, &app.engine, &app.request).await?
    else {
        bail!("unexpected result for publish");
    };

    print_json(&json!({
        "anchor": outcome.anchor,
        "publish": outcome.result,
        "replayed": outcome.replayed,
    }))?;

    match outcome.result.error() {
        Some(reason) => bail!("publish failed: {}", reason),
        None => Ok(()),
    }
}

pub async fn confirm(app: &AppContext, args: ConfirmArgs) -> anyhow::Result<()> {
    let proof = args
        .proof
        .as_deref()
        .map(serde_json::from_str::<Value>)
        .transpose()
        .map_err(|e| anyhow!("--proof is not valid JSON: {}", e))?;

    let cmd = EngineCommand::Confirm {
        anchor_id: args.anchor_id,
        confirmation: Confirmation::new(args.target, args.anchor_ref, proof),
    };
    let EngineCommandResult::Anchor(anchor) =
        apply_engine_command(cmd, &app.engine, &app.request).await?
    else {
        bail!("unexpected result for confirm");
    };

    print_json(&serde_json::to_value(&anchor)?)
}
