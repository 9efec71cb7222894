//! Error type shared by every map in this crate.

use offheap_memory::RangeError;

/// Errors surfaced by arena maps and their adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CacheError {
    /// A capacity, value or range was unusable.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// No free chunk can hold the value, even after compaction.
    #[error("not enough memory: {requested} bytes requested, arena capacity is {capacity} bytes")]
    CapacityExceeded {
        /// Length of the rejected value.
        requested: usize,
        /// Total arena capacity.
        capacity: usize,
    },

    /// The operation would copy the whole arena onto the heap.
    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),

    /// A converter could not translate between a value and its bytes.
    #[error("conversion failed: {0}")]
    Conversion(String),
}

impl From<RangeError> for CacheError {
    fn from(err: RangeError) -> Self {
        Self::InvalidArgument(err.to_string())
    }
}

/// Result alias for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_error_becomes_invalid_argument() {
        let err: CacheError = RangeError::ZeroCapacity.into();
        assert_eq!(
            err,
            CacheError::InvalidArgument("capacity must be at least one byte".into())
        );
    }

    #[test]
    fn capacity_message() {
        let err = CacheError::CapacityExceeded {
            requested: 30,
            capacity: 20,
        };
        assert_eq!(
            err.to_string(),
            "not enough memory: 30 bytes requested, arena capacity is 20 bytes"
        );
    }
}
