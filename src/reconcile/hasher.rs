// file: src/reconcile/hasher.rs
// description: whitespace-trimmed content fingerprints for code examples
// reference: https://docs.rs/sha2

use sha2::{Digest, Sha256};

/// Leading and trailing whitespace is not part of an example's identity.
pub fn normalize_code(code: &str) -> &str {
    code.trim()
}

/// Hex SHA-256 of the normalized code.
pub fn fingerprint(code: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalize_code(code).as_bytes());
    format!("{:x}", hasher.finalize())
}
