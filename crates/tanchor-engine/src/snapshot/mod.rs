//! Snapshot collection from the issuer registry and the event-chain service.

pub mod collector;
pub mod sources;

pub use collector::{chain_heads_digest, registry_digest, SnapshotCollector};
pub use sources::{
    ChainHeadSource, HttpChainHeadSource, HttpRegistrySource, RegistrySource, SourceError,
};
