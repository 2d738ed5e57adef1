//! Repository layer persisting the anchor ledger to SQLite

pub mod sqlite_repo;

pub use sqlite_repo::SqliteAnchorStore;
