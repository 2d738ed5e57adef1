//! Checksums of migration SQL, recorded when applied and re-checked on open

use sha2::{Digest, Sha256};

/// SHA-256 of the migration text, hex-encoded
pub fn compute_checksum(sql: &str) -> String {
    hex::encode(Sha256::digest(sql.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_is_stable_hex() {
        let first = compute_checksum("CREATE TABLE t (x INTEGER)");
        assert_eq!(first.len(), 64);
        assert_eq!(first, compute_checksum("CREATE TABLE t (x INTEGER)"));
        assert_ne!(first, compute_checksum("CREATE TABLE t (y INTEGER)"));
    }
}
