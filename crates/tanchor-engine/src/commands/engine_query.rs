//! Engine-level read-only query surface.
//!
//! `apply_engine_query` never writes to the ledger and never calls an
//! upstream service.

#![allow(clippy::result_large_err)]

use std::time::Instant;

use tanchor_core::errors::Result;
use tanchor_core::model::{Anchor, AnchorListQuery, AnchorTarget, Verification};
use tanchor_core::{log_op_end, log_op_error, log_op_start};
use tanchor_core_types::correlation::RequestContext;

use crate::engine::Engine;

/// Read-only queries supported by the engine.
#[derive(Debug, Clone)]
pub enum EngineQuery {
    /// Get an anchor by id.
    Get { anchor_id: i64 },
    /// Most recently created anchor, any status.
    Latest,
    /// Anchor history, newest first.
    List(AnchorListQuery),
    /// Whether a combined root hash was anchored.
    Verify { combined_root_hash: String },
    /// Enabled publish targets.
    Targets,
}

#[derive(Debug, Clone)]
pub enum EngineQueryResult {
    Anchor(Anchor),
    Latest(Option<Anchor>),
    List(Vec<Anchor>),
    Verify(Verification),
    Targets(Vec<AnchorTarget>),
}

impl EngineQuery {
    fn op_name(&self) -> &'static str {
        match self {
            EngineQuery::Get { .. } => "anchor_get",
            EngineQuery::Latest => "anchor_latest",
            EngineQuery::List(_) => "anchor_list",
            EngineQuery::Verify { .. } => "anchor_verify",
            EngineQuery::Targets => "target_list",
        }
    }
}

/// Apply a read-only query.
pub fn apply_engine_query(
    query: EngineQuery,
    engine: &Engine,
    ctx: &RequestContext,
) -> Result<EngineQueryResult> {
    let span = tracing::info_span!(
        "engine_query",
        request_id = %ctx.request_id,
        trigger = %ctx.trigger
    );
    let op = query.op_name();

    span.in_scope(|| {
        log_op_start!(op);
        let start = Instant::now();

        let result = run_query(query, engine);

        let elapsed = start.elapsed().as_millis() as u64;
        match result {
            Ok(r) => {
                log_op_end!(op, duration_ms = elapsed);
                Ok(r)
            }
            Err(e) => {
                let e = e.with_request_id(ctx.request_id.clone());
                log_op_error!(op, e.clone(), duration_ms = elapsed);
                Err(e)
            }
        }
    })
}

fn run_query(query: EngineQuery, engine: &Engine) -> Result<EngineQueryResult> {
    let lifecycle = engine.lifecycle();
    match query {
        EngineQuery::Get { anchor_id } => lifecycle.get(anchor_id).map(EngineQueryResult::Anchor),
        EngineQuery::Latest => lifecycle.latest().map(EngineQueryResult::Latest),
        EngineQuery::List(q) => lifecycle.list(&q).map(EngineQueryResult::List),
        EngineQuery::Verify { combined_root_hash } => engine
            .verifier()
            .verify(&combined_root_hash)
            .map(EngineQueryResult::Verify),
        EngineQuery::Targets => lifecycle.list_targets().map(EngineQueryResult::Targets),
    }
}
