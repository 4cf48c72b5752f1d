//! Error types for the calculation cache
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for cache operations.
///
/// `E` is the caller's own computation error type. A failed computation is
/// propagated through [`CacheError::Compute`] unchanged and is never cached.
#[derive(Error, Debug)]
pub enum CacheError<E>
where
    E: std::error::Error,
{
    /// Key is empty or exceeds the maximum length — a precondition
    /// violation by the caller, rejected before any computation runs.
    #[error("invalid cache key: {0}")]
    InvalidKey(String),

    /// The caller's compute closure failed. Forwarded as-is.
    #[error(transparent)]
    Compute(E),
}

// == Result Type Alias ==
/// Convenience Result type for cache operations.
pub type CacheResult<T, E> = std::result::Result<T, CacheError<E>>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_invalid_key_display() {
        let err: CacheError<io::Error> = CacheError::InvalidKey("key cannot be empty".into());
        assert!(err.to_string().contains("invalid cache key"));
    }

    #[test]
    fn test_compute_error_is_transparent() {
        let inner = io::Error::new(io::ErrorKind::TimedOut, "ephemeris service timed out");
        let err: CacheError<io::Error> = CacheError::Compute(inner);
        assert_eq!(err.to_string(), "ephemeris service timed out");
    }
}
