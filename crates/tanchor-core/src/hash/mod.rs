//! Canonical hashing primitives.
//!
//! - [`canonicalize`]: canonical text of a structured value
//! - [`digest`] / [`digest_text`]: SHA-256, 64 lowercase hex characters
//! - [`combine_digests`]: order-invariant digest of a set of digests
//! - [`combine_root_hash`]: the anchor's combined root hash
//!
//! `combine_digests` is a digest of a set, not a Merkle tree: it supports
//! whole-set equality checks only, never per-element membership proofs.

pub mod canonical;

pub use canonical::canonicalize;

use crate::errors::Result;
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

/// Length of a hex-encoded SHA-256 digest
pub const DIGEST_HEX_LEN: usize = 64;

/// Fixed texts whose digests stand in for missing data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sentinel {
    /// Digest of an empty set of digests
    Empty,
    /// Issuer registry could not be fetched
    RegistryUnavailable,
    /// Event-chain service could not be reached
    ChainHeadsUnavailable,
    /// Event-chain service is up but does not expose chain heads
    ChainHeadsNotAvailable,
}

impl Sentinel {
    /// Text that is hashed to produce the sentinel digest
    pub fn label(&self) -> &'static str {
        match self {
            Sentinel::Empty => "EMPTY",
            Sentinel::RegistryUnavailable => "REGISTRY_UNAVAILABLE",
            Sentinel::ChainHeadsUnavailable => "WCAF_UNAVAILABLE",
            Sentinel::ChainHeadsNotAvailable => "WCAF_HEADS_NOT_AVAILABLE",
        }
    }

    /// The sentinel digest
    pub fn digest(&self) -> String {
        digest_text(self.label())
    }
}

/// SHA-256 of the UTF-8 bytes of `text`, hex-encoded.
///
/// Text is hashed as-is, with no canonicalization or quoting.
pub fn digest_text(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}

/// Digest of an already-built JSON value.
///
/// A JSON string is hashed directly; anything else is canonicalized first.
pub fn digest_value(value: &Value) -> String {
    match value {
        Value::String(s) => digest_text(s),
        other => digest_text(&canonicalize(other)),
    }
}

/// Digest of any serializable value.
///
/// # Errors
///
/// Returns `Serialization` if the value cannot be represented as JSON
/// (e.g. a map with non-string keys).
pub fn digest<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let value = serde_json::to_value(value)?;
    Ok(digest_value(&value))
}

/// Order-invariant aggregate over a set of digests.
///
/// Sorts the digests, concatenates them and hashes the concatenation. An
/// empty set yields the `EMPTY` sentinel digest.
pub fn combine_digests<I, S>(digests: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut sorted: Vec<String> = digests
        .into_iter()
        .map(|d| d.as_ref().to_string())
        .collect();
    if sorted.is_empty() {
        return Sentinel::Empty.digest();
    }
    sorted.sort();
    digest_text(&sorted.concat())
}

/// Combined root hash of an anchor: `H(registry_hash ‖ chain_heads_hash)`.
pub fn combine_root_hash(registry_hash: &str, chain_heads_hash: &str) -> String {
    let mut joined = String::with_capacity(registry_hash.len() + chain_heads_hash.len());
    joined.push_str(registry_hash);
    joined.push_str(chain_heads_hash);
    digest_text(&joined)
}
