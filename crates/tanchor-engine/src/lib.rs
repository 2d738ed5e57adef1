//! Transparency Anchor Engine - snapshots, lifecycle, publishing, verification
//!
//! Everything that talks to the outside world lives here:
//! - `snapshot`: upstream sources and the digest collector
//! - `lifecycle`: create / confirm / fail over an `AnchorRepository`
//! - `publish`: per-target publishers behind the `PublishRouter`
//! - `verifier`: read-only digest lookups
//! - `commands`: the publish pipeline and the command/query surface

pub mod audit;
pub mod commands;
pub mod config;
pub mod engine;
pub mod http;
pub mod lifecycle;
pub mod publish;
pub mod snapshot;
pub mod verifier;

pub use audit::{AuditDispatcher, AuditEvent, AuditSink, HttpAuditSink};
pub use commands::{
    apply_engine_command, apply_engine_query, EngineCommand, EngineCommandResult, EngineQuery,
    EngineQueryResult, PublishOutcome, RunOutcome,
};
pub use config::EngineConfig;
pub use engine::Engine;
pub use http::{HttpPolicy, RetryPolicy};
pub use lifecycle::AnchorLifecycle;
pub use publish::{PublishRequest, PublishRouter, Publisher};
pub use snapshot::SnapshotCollector;
pub use verifier::Verifier;
