//! Error values returned across the cache boundary.

use thiserror::Error;

/// Errors returned by cache operations.
///
/// These are value-typed sentinels. Callers match on the variant; no error
/// carries a payload and none is ever raised as a panic.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheError {
    /// No live entry for the key. Returned for keys that were never stored
    /// as well as for deleted, evicted, or expired ones.
    #[error("entry not found")]
    NotFound,

    /// The key is longer than [`MAX_KEY_LEN`](crate::MAX_KEY_LEN) bytes.
    #[error("key is too large")]
    LargeKey,

    /// Header, key, and value together would exceed a quarter of the
    /// segment buffer.
    #[error("entry is too large")]
    LargeEntry,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variants_are_distinguishable() {
        assert_eq!(CacheError::NotFound, CacheError::NotFound);
        assert_ne!(CacheError::NotFound, CacheError::LargeKey);
        assert_ne!(CacheError::LargeKey, CacheError::LargeEntry);
    }

    #[test]
    fn display_is_stable() {
        assert_eq!(CacheError::NotFound.to_string(), "entry not found");
    }
}
