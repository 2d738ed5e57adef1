//! Transparency Anchor Core - hashing, domain model and rules
//!
//! This crate holds everything that does not touch the network or disk:
//! - Canonical JSON and SHA-256 digests (`hash`)
//! - Anchor, target, snapshot and publish models (`model`)
//! - The anchor state machine and input validation (`rules`)
//! - The `AnchorRepository` persistence port
//! - The structured error facility and logging facility

pub mod errors;
pub mod hash;
pub mod logging_facility;
pub mod model;
pub mod repository;
pub mod rules;

pub use errors::{AnchorError, Result, TaError, TaErrorKind};
pub use model::{
    Anchor, AnchorListQuery, AnchorStatus, AnchorTarget, Confirmation, PublishRecord,
    PublishResult, Snapshot, SourceDigest, TargetType, Verification,
};
pub use repository::AnchorRepository;
