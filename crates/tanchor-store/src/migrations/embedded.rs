//! Embedded SQL migrations
//!
//! Migrations are embedded at compile time using include_str!

/// Migration metadata
pub struct Migration {
    pub id: &'static str,
    pub sql: &'static str,
}

/// Get all embedded migrations in order
pub fn get_migrations() -> Vec<Migration> {
    vec![
        Migration {
            id: "001_anchor_ledger",
            sql: include_str!("../../migrations/001_anchor_ledger.sql"),
        },
        Migration {
            id: "002_anchor_targets",
            sql: include_str!("../../migrations/002_anchor_targets.sql"),
        },
        Migration {
            id: "003_publish_attempts",
            sql: include_str!("../../migrations/003_publish_attempts.sql"),
        },
    ]
}

/// Ids of every embedded migration, in application order
pub fn migration_ids() -> Vec<&'static str> {
    get_migrations().into_iter().map(|m| m.id).collect()
}
