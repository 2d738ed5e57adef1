//! Read-only commands

use anyhow::bail;
use clap::Args;
use tanchor_core::model::{AnchorListQuery, AnchorStatus};
use tanchor_engine::{apply_engine_query, EngineQuery, EngineQueryResult};

use super::{print_json, AppContext};

#[derive(Debug, Args)]
pub struct GetArgs {
    pub anchor_id: i64,
}

#[derive(Debug, Args)]
pub struct ListArgs {
    /// PENDING, ANCHORED, FAILED or EXPIRED
    #[arg(long)]
    pub status: Option<AnchorStatus>,

    #[arg(long, default_value_t = AnchorListQuery::DEFAULT_LIMIT)]
    pub limit: u32,

    #[arg(long, default_value_t = 0)]
    pub offset: u32,
}

#[derive(Debug, Args)]
pub struct VerifyArgs {
    pub combined_root_hash: String,
}

fn query(app: &AppContext, q: EngineQuery) -> anyhow::Result<EngineQueryResult> {
    Ok(apply_engine_query(q, &app.engine, &app.request)?)
}

pub fn get(app: &AppContext, args: GetArgs) -> anyhow::Result<()> {
    match query(
        app,
        EngineQuery::Get {
            anchor_id: args.anchor_id,
        },
    )? {
        EngineQueryResult::Anchor(anchor) => print_json(&serde_json::to_value(&anchor)?),
        _ => bail!("unexpected result for get"),
    }
}

pub fn latest(app: &AppContext) -> anyhow::Result<()> {
    match query(app, EngineQuery::Latest)? {
        EngineQueryResult::Latest(Some(anchor)) => print_json(&serde_json::to_value(&anchor)?),
        EngineQueryResult::Latest(None) => bail!("No anchors found"),
        _ => bail!("unexpected result for latest"),
    }
}

pub fn list(app: &AppContext, args: ListArgs) -> anyhow::Result<()> {
    let q = AnchorListQuery {
        limit: args.limit,
        offset: args.offset,
        status: args.status,
    };
    match query(app, EngineQuery::List(q))? {
        EngineQueryResult::List(anchors) => print_json(&serde_json::to_value(&anchors)?),
        _ => bail!("unexpected result for list"),
    }
}

pub fn verify(app: &AppContext, args: VerifyArgs) -> anyhow::Result<()> {
    match query(
        app,
        EngineQuery::Verify {
            combined_root_hash: args.combined_root_hash,
        },
    )? {
        EngineQueryResult::Verify(verification) => {
            print_json(&serde_json::to_value(&verification)?)
        }
        _ => bail!("unexpected result for verify"),
    }
}

pub fn targets(app: &AppContext) -> anyhow::Result<()> {
    match query(app, EngineQuery::Targets)? {
        EngineQueryResult::Targets(targets) => print_json(&serde_json::to_value(&targets)?),
        _ => bail!("unexpected result for targets"),
    }
}
