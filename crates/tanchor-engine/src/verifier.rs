//! Read-only lookup of anchored digests.

use std::sync::Arc;

use tanchor_core::errors::Result;
use tanchor_core::model::Verification;
use tanchor_core::repository::AnchorRepository;
use tanchor_core::rules::validate_digest;

#[derive(Clone)]
pub struct Verifier {
    repo: Arc<dyn AnchorRepository>,
}

impl Verifier {
    pub fn new(repo: Arc<dyn AnchorRepository>) -> Self {
        Self { repo }
    }

    /// Whether `combined_root_hash` was anchored, and by which record.
    ///
    /// Only `ANCHORED` rows count; a pending or failed anchor with the same
    /// digest answers `verified: false`.
    ///
    /// # Errors
    /// `ERR_INVALID_DIGEST` unless the trimmed input is 64 lowercase hex
    /// characters.
    pub fn verify(&self, combined_root_hash: &str) -> Result<Verification> {
        let combined_root_hash = combined_root_hash.trim();
        validate_digest(combined_root_hash)?;
        let found = self.repo.latest_anchored_with_root(combined_root_hash)?;
        Ok(found
            .as_ref()
            .map(Verification::from_anchor)
            .unwrap_or_else(Verification::not_found))
    }
}
