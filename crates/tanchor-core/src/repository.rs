//! Persistence port for anchors, targets and publish records.
//!
//! Implemented by the SQLite store. The trait is synchronous; async callers
//! hold it behind an `Arc` and keep the critical sections short.

use chrono::{DateTime, Utc};

use crate::errors::Result;
use crate::model::{
    Anchor, AnchorListQuery, AnchorTarget, Confirmation, PublishRecord, Snapshot,
};

pub trait AnchorRepository: Send + Sync {
    /// Insert a new `PENDING` anchor and return it with its assigned id.
    fn insert_pending(&self, snapshot: &Snapshot) -> Result<Anchor>;

    fn get(&self, anchor_id: i64) -> Result<Option<Anchor>>;

    /// Anchors ordered by `created_at` descending.
    fn list(&self, query: &AnchorListQuery) -> Result<Vec<Anchor>>;

    /// Most recently created anchor in any status.
    fn latest(&self) -> Result<Option<Anchor>>;

    /// Most recently created `ANCHORED` record whose combined root hash
    /// equals `combined_root_hash`.
    fn latest_anchored_with_root(&self, combined_root_hash: &str) -> Result<Option<Anchor>>;

    /// Move a `PENDING` anchor to `ANCHORED`.
    ///
    /// # Errors
    /// `ERR_NOT_FOUND` if the id is unknown, `ERR_ILLEGAL_TRANSITION` if the
    /// row is no longer pending.
    fn mark_anchored(
        &self,
        anchor_id: i64,
        confirmation: &Confirmation,
        anchored_at: DateTime<Utc>,
    ) -> Result<Anchor>;

    /// Move a `PENDING` anchor to `FAILED`, recording the reason.
    ///
    /// # Errors
    /// Same as [`AnchorRepository::mark_anchored`].
    fn mark_failed(&self, anchor_id: i64, reason: &str) -> Result<Anchor>;

    /// Enabled targets ordered by id.
    fn list_enabled_targets(&self) -> Result<Vec<AnchorTarget>>;

    /// `None` when the target is unknown or disabled.
    fn get_enabled_target(&self, target_id: &str) -> Result<Option<AnchorTarget>>;

    fn upsert_target(&self, target: &AnchorTarget) -> Result<()>;

    fn find_publish_record(
        &self,
        anchor_id: i64,
        target_id: &str,
        idempotency_key: &str,
    ) -> Result<Option<PublishRecord>>;

    fn record_publish(&self, record: &PublishRecord) -> Result<()>;
}
