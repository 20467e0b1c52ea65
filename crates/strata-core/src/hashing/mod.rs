//! Hashing utilities for content fingerprinting and change detection.
//!
//! Two families of hashes are provided:
//!
//! - **Fast** (xxHash/XXH64, 64-bit): change detection, hash-map keys,
//!   subtree fingerprints. Not collision resistant.
//! - **Secure** (BLAKE3, 256-bit): integrity verification and stable
//!   fingerprints where collision resistance matters.
//!
//! Each family comes in three forms:
//!
//! - **raw**: hash of the exact byte content
//! - **trimmed**: leading/trailing whitespace stripped before hashing
//! - **normalized**: blank lines removed before hashing, so vertical
//!   whitespace noise never changes the hash
//!
//! All functions are pure and deterministic with a fixed zero seed; the same
//! input produces the same hash on every platform and every run.

mod fast;
mod secure;

pub use fast::{hash_fast, hash_fast_bytes, hash_fast_normalized, hash_fast_trimmed};
pub use secure::{
    hash_secure, hash_secure_bytes, hash_secure_normalized, hash_secure_trimmed, SecureHash,
    SecureHashError,
};

/// Removes blank lines so hashes reflect content, not vertical whitespace.
pub(crate) fn strip_blank_lines(data: &str) -> String {
    data.lines()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
