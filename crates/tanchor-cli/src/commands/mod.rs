pub mod anchor;
pub mod history;

use std::sync::Arc;

use anyhow::Context;
use serde_json::Value;
use tanchor_core_types::correlation::RequestContext;
use tanchor_engine::{Engine, EngineConfig};
use tanchor_store::SqliteAnchorStore;

const TRIGGER: &str = "cli";

/// Engine wired to the configured database and services
pub struct AppContext {
    pub engine: Engine,
    pub request: RequestContext,
}

impl AppContext {
    pub fn open(db_override: Option<&str>) -> anyhow::Result<Self> {
        let mut config = EngineConfig::load()?;
        if let Some(db) = db_override {
            config.db_path = db.to_string();
        }

        let store = SqliteAnchorStore::open(&config.db_path)
            .with_context(|| format!("opening database {}", config.db_path))?;
        let engine = Engine::from_config(&config, Arc::new(store))?;

        let request = RequestContext::new(TRIGGER);
        tracing::debug!(request_id = %request.request_id, db = %config.db_path, "cli context ready");
        Ok(Self { engine, request })
    }
}

pub fn print_json(value: &Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
