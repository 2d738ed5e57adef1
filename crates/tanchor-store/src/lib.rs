//! Transparency Anchor Store - SQLite persistence for the anchor ledger
//!
//! Provides:
//! - SQLite connection management
//! - Embedded, checksummed schema migrations
//! - `SqliteAnchorStore`, the `AnchorRepository` adapter

pub mod db;
pub mod errors;
pub mod migrations;
pub mod repo;

pub use errors::Result;
pub use repo::SqliteAnchorStore;
