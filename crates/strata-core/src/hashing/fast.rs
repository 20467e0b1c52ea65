//! Fast 64-bit content hashing backed by XXH64.
//!
//! These hashes drive outline fingerprints and delta matching, where speed
//! matters and collision resistance does not. The seed is fixed at zero so
//! hashes are reproducible across runs, processes, and platforms.

use xxhash_rust::xxh64::xxh64;

use super::strip_blank_lines;

/// Computes the XXH64 hash of the input string.
///
/// ## Examples
///
/// ```
/// use strata_core::hashing::hash_fast;
///
/// let hash = hash_fast("Hello, World!");
/// assert_eq!(hash, hash_fast("Hello, World!"));
/// assert_ne!(hash, hash_fast("Hello, World"));
/// ```
#[inline]
pub fn hash_fast(data: &str) -> u64 {
    xxh64(data.as_bytes(), 0)
}

/// Computes the XXH64 hash of raw bytes.
#[inline]
pub fn hash_fast_bytes(data: &[u8]) -> u64 {
    xxh64(data, 0)
}

/// Computes the XXH64 hash after trimming leading/trailing whitespace.
///
/// ## Examples
///
/// ```
/// use strata_core::hashing::hash_fast_trimmed;
///
/// assert_eq!(hash_fast_trimmed("  hello  "), hash_fast_trimmed("hello"));
/// ```
#[inline]
pub fn hash_fast_trimmed(data: &str) -> u64 {
    xxh64(data.trim().as_bytes(), 0)
}

/// Computes the XXH64 hash with blank lines removed.
///
/// Content that differs only in the amount of vertical whitespace produces
/// the same hash.
///
/// ## Examples
///
/// ```
/// use strata_core::hashing::hash_fast_normalized;
///
/// let sparse = "line one\n\n\nline two\n";
/// let dense = "line one\nline two";
/// assert_eq!(hash_fast_normalized(sparse), hash_fast_normalized(dense));
/// ```
pub fn hash_fast_normalized(data: &str) -> u64 {
    xxh64(strip_blank_lines(data).as_bytes(), 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn deterministic() {
        let content = "Hello, World!";
        assert_eq!(hash_fast(content), hash_fast(content));
    }

    #[test]
    fn different_content_different_hash() {
        assert_ne!(hash_fast("hello"), hash_fast("world"));
    }

    #[test]
    fn bytes_and_str_agree() {
        assert_eq!(hash_fast("Hello"), hash_fast_bytes(b"Hello"));
    }

    #[test]
    fn trimmed_ignores_surrounding_whitespace() {
        assert_eq!(hash_fast_trimmed("\n\nhello\t "), hash_fast_trimmed("hello"));
    }

    #[test]
    fn trimmed_preserves_internal_whitespace() {
        assert_ne!(hash_fast_trimmed("hello world"), hash_fast_trimmed("helloworld"));
    }

    #[test]
    fn normalized_ignores_blank_lines() {
        assert_eq!(
            hash_fast_normalized("a\n\n\nb\n\n"),
            hash_fast_normalized("a\nb")
        );
    }

    #[test]
    fn normalized_still_sees_content_changes() {
        assert_ne!(hash_fast_normalized("a\nb"), hash_fast_normalized("a\nc"));
    }

    proptest! {
        #[test]
        fn prop_deterministic(s in ".*") {
            prop_assert_eq!(hash_fast(&s), hash_fast(&s));
        }

        #[test]
        fn prop_trimmed_invariant_under_padding(s in "\\PC*", pad in "[ \t\n]{0,8}") {
            let padded = format!("{pad}{s}{pad}");
            prop_assert_eq!(hash_fast_trimmed(&padded), hash_fast_trimmed(&s));
        }
    }
}
