//! Command orchestration layer.
//!
//! `EngineCommand` covers every operation that writes to the ledger,
//! `EngineQuery` every read-only one.

pub mod engine_command;
pub mod engine_query;
pub mod publish;

pub use engine_command::{apply_engine_command, EngineCommand, EngineCommandResult};
pub use engine_query::{apply_engine_query, EngineQuery, EngineQueryResult};
pub use publish::{default_idempotency_key, PublishOutcome, RunOutcome};
