//! SQLite implementation of the anchor repository
//!
//! One connection behind a mutex. Every transition is a single conditional
//! `UPDATE ... WHERE status = 'PENDING'`, so two racing confirmations cannot
//! both succeed.

#![allow(clippy::result_large_err)]

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, TimeZone, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde_json::Value;
use tanchor_core::errors::{AnchorError, Result};
use tanchor_core::model::{
    Anchor, AnchorListQuery, AnchorStatus, AnchorTarget, Confirmation, PublishRecord, Snapshot,
    TargetType,
};
use tanchor_core::repository::AnchorRepository;

use crate::db;
use crate::errors::{corrupt_row, from_rusqlite, lock_poisoned};
use crate::migrations::apply_migrations;

const ANCHOR_COLUMNS: &str = "id, issuer_registry_root_hash, wcaf_heads_root_hash, \
     combined_root_hash, issuer_count, wcaf_document_count, snapshot_at, status, \
     anchor_target, anchor_ref, anchor_proof, anchored_at, created_at";

/// SQLite-backed anchor ledger
pub struct SqliteAnchorStore {
    conn: Mutex<Connection>,
}

impl SqliteAnchorStore {
    /// Open (or create) the database file and bring its schema up to date
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = db::open(path)?;
        Self::from_connection(conn)
    }

    /// Fresh in-memory ledger, used by tests
    pub fn open_in_memory() -> Result<Self> {
        let conn = db::open_in_memory()?;
        Self::from_connection(conn)
    }

    fn from_connection(mut conn: Connection) -> Result<Self> {
        db::configure(&conn)?;
        apply_migrations(&mut conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| lock_poisoned())
    }

    fn load(conn: &Connection, anchor_id: i64) -> Result<Option<Anchor>> {
        let sql = format!("SELECT {ANCHOR_COLUMNS} FROM transparency_anchors WHERE id = ?1");
        let raw = conn
            .query_row(&sql, [anchor_id], AnchorRow::read)
            .optional()
            .map_err(from_rusqlite)?;
        raw.map(AnchorRow::into_anchor).transpose()
    }

    fn query_anchors(
        conn: &Connection,
        sql: &str,
        params: &[&dyn rusqlite::ToSql],
    ) -> Result<Vec<Anchor>> {
        let mut stmt = conn.prepare(sql).map_err(from_rusqlite)?;
        let rows = stmt
            .query_map(params, AnchorRow::read)
            .map_err(from_rusqlite)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(from_rusqlite)?;
        rows.into_iter().map(AnchorRow::into_anchor).collect()
    }

    /// Explain why a conditional transition touched no row
    fn transition_rejected(conn: &Connection, anchor_id: i64, to: AnchorStatus) -> Result<Anchor> {
        match Self::load(conn, anchor_id)? {
            None => Err(AnchorError::AnchorNotFound { anchor_id }.into()),
            Some(current) => Err(AnchorError::IllegalTransition {
                anchor_id,
                from: current.status.to_string(),
                to: to.to_string(),
            }
            .into()),
        }
    }

    fn reload(conn: &Connection, anchor_id: i64) -> Result<Anchor> {
        Self::load(conn, anchor_id)?.ok_or_else(|| AnchorError::AnchorNotFound { anchor_id }.into())
    }
}

impl AnchorRepository for SqliteAnchorStore {
    fn insert_pending(&self, snapshot: &Snapshot) -> Result<Anchor> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO transparency_anchors (
                issuer_registry_root_hash, wcaf_heads_root_hash, combined_root_hash,
                issuer_count, wcaf_document_count, snapshot_at, status, created_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 'PENDING', ?7)",
            params![
                snapshot.issuer_registry_root_hash,
                snapshot.wcaf_heads_root_hash,
                snapshot.combined_root_hash,
                count_to_sql(snapshot.issuer_count),
                count_to_sql(snapshot.wcaf_document_count),
                snapshot.snapshot_at.timestamp_millis(),
                Utc::now().timestamp_millis(),
            ],
        )
        .map_err(from_rusqlite)?;

        let anchor_id = conn.last_insert_rowid();
        Self::reload(&conn, anchor_id)
    }

    fn get(&self, anchor_id: i64) -> Result<Option<Anchor>> {
        let conn = self.conn()?;
        Self::load(&conn, anchor_id)
    }

    fn list(&self, query: &AnchorListQuery) -> Result<Vec<Anchor>> {
        let conn = self.conn()?;
        let limit = i64::from(query.limit);
        let offset = i64::from(query.offset);
        match query.status {
            Some(status) => {
                let sql = format!(
                    "SELECT {ANCHOR_COLUMNS} FROM transparency_anchors WHERE status = ?1
                     ORDER BY created_at DESC, id DESC LIMIT ?2 OFFSET ?3"
                );
                Self::query_anchors(&conn, &sql, params![status.as_str(), limit, offset])
            }
            None => {
                let sql = format!(
                    "SELECT {ANCHOR_COLUMNS} FROM transparency_anchors
                     ORDER BY created_at DESC, id DESC LIMIT ?1 OFFSET ?2"
                );
                Self::query_anchors(&conn, &sql, params![limit, offset])
            }
        }
    }

    fn latest(&self) -> Result<Option<Anchor>> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT {ANCHOR_COLUMNS} FROM transparency_anchors
             ORDER BY created_at DESC, id DESC LIMIT 1"
        );
        Ok(Self::query_anchors(&conn, &sql, params![])?.into_iter().next())
    }

    fn latest_anchored_with_root(&self, combined_root_hash: &str) -> Result<Option<Anchor>> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT {ANCHOR_COLUMNS} FROM transparency_anchors
             WHERE combined_root_hash = ?1 AND status = 'ANCHORED'
             ORDER BY created_at DESC, id DESC LIMIT 1"
        );
        Ok(Self::query_anchors(&conn, &sql, params![combined_root_hash])?
            .into_iter()
            .next())
    }

    fn mark_anchored(
        &self,
        anchor_id: i64,
        confirmation: &Confirmation,
        anchored_at: DateTime<Utc>,
    ) -> Result<Anchor> {
        let proof = confirmation
            .anchor_proof
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        let conn = self.conn()?;
        let changed = conn
            .execute(
                "UPDATE transparency_anchors
                 SET status = 'ANCHORED', anchor_target = ?2, anchor_ref = ?3,
                     anchor_proof = ?4, anchored_at = ?5
                 WHERE id = ?1 AND status = 'PENDING'",
                params![
                    anchor_id,
                    confirmation.target_id,
                    confirmation.anchor_ref,
                    proof,
                    anchored_at.timestamp_millis(),
                ],
            )
            .map_err(from_rusqlite)?;

        if changed == 0 {
            return Self::transition_rejected(&conn, anchor_id, AnchorStatus::Anchored);
        }
        Self::reload(&conn, anchor_id)
    }

    fn mark_failed(&self, anchor_id: i64, reason: &str) -> Result<Anchor> {
        let proof = serde_json::json!({ "error": reason }).to_string();

        let conn = self.conn()?;
        let changed = conn
            .execute(
                "UPDATE transparency_anchors SET status = 'FAILED', anchor_proof = ?2
                 WHERE id = ?1 AND status = 'PENDING'",
                params![anchor_id, proof],
            )
            .map_err(from_rusqlite)?;

        if changed == 0 {
            return Self::transition_rejected(&conn, anchor_id, AnchorStatus::Failed);
        }
        Self::reload(&conn, anchor_id)
    }

    fn list_enabled_targets(&self) -> Result<Vec<AnchorTarget>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT target_id, target_type, config, enabled FROM anchor_targets
                 WHERE enabled = 1 ORDER BY target_id",
            )
            .map_err(from_rusqlite)?;
        let rows = stmt
            .query_map([], TargetRow::read)
            .map_err(from_rusqlite)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(from_rusqlite)?;
        rows.into_iter().map(TargetRow::into_target).collect()
    }

    fn get_enabled_target(&self, target_id: &str) -> Result<Option<AnchorTarget>> {
        let conn = self.conn()?;
        let raw = conn
            .query_row(
                "SELECT target_id, target_type, config, enabled FROM anchor_targets
                 WHERE target_id = ?1 AND enabled = 1",
                [target_id],
                TargetRow::read,
            )
            .optional()
            .map_err(from_rusqlite)?;
        raw.map(TargetRow::into_target).transpose()
    }

    fn upsert_target(&self, target: &AnchorTarget) -> Result<()> {
        let config = serde_json::to_string(&target.config)?;
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO anchor_targets (target_id, target_type, config, enabled)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(target_id) DO UPDATE SET
                target_type = excluded.target_type,
                config = excluded.config,
                enabled = excluded.enabled",
            params![
                target.target_id,
                target.target_type.as_str(),
                config,
                target.enabled,
            ],
        )
        .map_err(from_rusqlite)?;
        Ok(())
    }

    fn find_publish_record(
        &self,
        anchor_id: i64,
        target_id: &str,
        idempotency_key: &str,
    ) -> Result<Option<PublishRecord>> {
        let conn = self.conn()?;
        let raw = conn
            .query_row(
                "SELECT anchor_id, target_id, idempotency_key, anchor_ref, proof, published_at
                 FROM publish_attempts
                 WHERE anchor_id = ?1 AND target_id = ?2 AND idempotency_key = ?3",
                params![anchor_id, target_id, idempotency_key],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, i64>(5)?,
                    ))
                },
            )
            .optional()
            .map_err(from_rusqlite)?;

        raw.map(
            |(anchor_id, target_id, idempotency_key, anchor_ref, proof, published_at)| {
                Ok(PublishRecord {
                    anchor_id,
                    target_id,
                    idempotency_key,
                    anchor_ref,
                    proof: parse_json("proof", &proof)?,
                    published_at: millis_to_utc("published_at", published_at)?,
                })
            },
        )
        .transpose()
    }

    fn record_publish(&self, record: &PublishRecord) -> Result<()> {
        let proof = serde_json::to_string(&record.proof)?;
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO publish_attempts
                (anchor_id, target_id, idempotency_key, anchor_ref, proof, published_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(anchor_id, target_id, idempotency_key) DO NOTHING",
            params![
                record.anchor_id,
                record.target_id,
                record.idempotency_key,
                record.anchor_ref,
                proof,
                record.published_at.timestamp_millis(),
            ],
        )
        .map_err(from_rusqlite)?;
        Ok(())
    }
}

/// Raw column values, decoded into the domain type outside the row callback
struct AnchorRow {
    id: i64,
    issuer_registry_root_hash: String,
    wcaf_heads_root_hash: String,
    combined_root_hash: String,
    issuer_count: i64,
    wcaf_document_count: i64,
    snapshot_at: i64,
    status: String,
    anchor_target: Option<String>,
    anchor_ref: Option<String>,
    anchor_proof: Option<String>,
    anchored_at: Option<i64>,
    created_at: i64,
}

impl AnchorRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            issuer_registry_root_hash: row.get(1)?,
            wcaf_heads_root_hash: row.get(2)?,
            combined_root_hash: row.get(3)?,
            issuer_count: row.get(4)?,
            wcaf_document_count: row.get(5)?,
            snapshot_at: row.get(6)?,
            status: row.get(7)?,
            anchor_target: row.get(8)?,
            anchor_ref: row.get(9)?,
            anchor_proof: row.get(10)?,
            anchored_at: row.get(11)?,
            created_at: row.get(12)?,
        })
    }

    fn into_anchor(self) -> Result<Anchor> {
        let status: AnchorStatus = self.status.parse()?;
        Ok(Anchor {
            id: self.id,
            issuer_registry_root_hash: self.issuer_registry_root_hash,
            wcaf_heads_root_hash: self.wcaf_heads_root_hash,
            combined_root_hash: self.combined_root_hash,
            issuer_count: count_from_sql("issuer_count", self.issuer_count)?,
            wcaf_document_count: count_from_sql("wcaf_document_count", self.wcaf_document_count)?,
            snapshot_at: millis_to_utc("snapshot_at", self.snapshot_at)?,
            status,
            anchor_target: self.anchor_target,
            anchor_ref: self.anchor_ref,
            anchor_proof: self
                .anchor_proof
                .as_deref()
                .map(|raw| parse_json("anchor_proof", raw))
                .transpose()?,
            anchored_at: self
                .anchored_at
                .map(|ms| millis_to_utc("anchored_at", ms))
                .transpose()?,
            created_at: millis_to_utc("created_at", self.created_at)?,
        })
    }
}

struct TargetRow {
    target_id: String,
    target_type: String,
    config: String,
    enabled: bool,
}

impl TargetRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            target_id: row.get(0)?,
            target_type: row.get(1)?,
            config: row.get(2)?,
            enabled: row.get(3)?,
        })
    }

    fn into_target(self) -> Result<AnchorTarget> {
        Ok(AnchorTarget {
            target_id: self.target_id,
            target_type: TargetType::from(self.target_type),
            config: parse_json("config", &self.config)?,
            enabled: self.enabled,
        })
    }
}

fn millis_to_utc(column: &str, millis: i64) -> Result<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or_else(|| corrupt_row(column, format!("timestamp {} out of range", millis)))
}

fn parse_json(column: &str, raw: &str) -> Result<Value> {
    serde_json::from_str(raw).map_err(|e| corrupt_row(column, e))
}

fn count_to_sql(count: u64) -> i64 {
    i64::try_from(count).unwrap_or(i64::MAX)
}

fn count_from_sql(column: &str, value: i64) -> Result<u64> {
    u64::try_from(value).map_err(|e| corrupt_row(column, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tanchor_core::errors::TaErrorKind;
    use tanchor_core::hash::digest_text;
    use tanchor_core::model::SourceDigest;

    fn snapshot(seed: &str) -> Snapshot {
        Snapshot::combine(
            &SourceDigest::observed(digest_text(&format!("{seed}-registry")), 3),
            &SourceDigest::observed(digest_text(&format!("{seed}-heads")), 5),
            Utc::now(),
        )
    }

    #[test]
    fn test_insert_pending_round_trip() {
        let store = SqliteAnchorStore::open_in_memory().unwrap();
        let snap = snapshot("a");

        let anchor = store.insert_pending(&snap).unwrap();

        assert_eq!(anchor.status, AnchorStatus::Pending);
        assert_eq!(anchor.combined_root_hash, snap.combined_root_hash);
        assert_eq!(anchor.issuer_count, 3);
        assert_eq!(anchor.wcaf_document_count, 5);
        assert_eq!(
            anchor.snapshot_at.timestamp_millis(),
            snap.snapshot_at.timestamp_millis()
        );
        assert!(anchor.anchor_ref.is_none());
        assert!(anchor.anchored_at.is_none());
    }

    #[test]
    fn test_second_confirm_is_rejected() {
        let store = SqliteAnchorStore::open_in_memory().unwrap();
        let anchor = store.insert_pending(&snapshot("b")).unwrap();
        let confirmation = Confirmation::new("local-log", "local://log/1", None);

        store
            .mark_anchored(anchor.id, &confirmation, Utc::now())
            .unwrap();
        let err = store
            .mark_anchored(anchor.id, &confirmation, Utc::now())
            .unwrap_err();

        assert_eq!(err.kind(), TaErrorKind::IllegalTransition);
    }

    #[test]
    fn test_transition_on_missing_anchor_is_not_found() {
        let store = SqliteAnchorStore::open_in_memory().unwrap();
        let err = store.mark_failed(999, "nope").unwrap_err();
        assert_eq!(err.kind(), TaErrorKind::NotFound);
        assert_eq!(err.anchor_id(), Some(999));
    }
}
