//! SHA-256 checksums for rendered migration scripts.
//!
//! Fingerprints decide equality inside the engine; this digest identifies a
//! generated script outside it (review tools, CI caches).

use sha2::{Digest, Sha256};

/// Lower-case hex SHA-256 of a string.
pub fn compute_checksum(s: &str) -> String {
    format!("{:x}", Sha256::digest(s.as_bytes()))
}

/// Checksum of a statement list, one statement per line.
pub fn checksum_statements<S: AsRef<str>>(statements: &[S]) -> String {
    let mut hasher = Sha256::new();
    for statement in statements {
        hasher.update(statement.as_ref().as_bytes());
        hasher.update(b"\n");
    }
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statements_match_joined_text() {
        let statements = ["DROP VIEW s.v;", "CREATE VIEW s.v AS SELECT 1;"];
        let joined = format!("{}\n{}\n", statements[0], statements[1]);
        assert_eq!(checksum_statements(&statements), compute_checksum(&joined));
    }

    #[test]
    fn test_order_matters() {
        assert_ne!(
            checksum_statements(&["a;", "b;"]),
            checksum_statements(&["b;", "a;"])
        );
        assert_eq!(compute_checksum("").len(), 64);
    }
}
