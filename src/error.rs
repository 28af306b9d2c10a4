use thiserror::Error;

/// Errors returned by fallible [`Bitset`](crate::Bitset) operations.
///
/// Every variant is a contract violation by the caller. Operations that
/// return one of these leave the bitset untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BitsetError {
    /// A constructor or argument list was missing or malformed.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// A bit index was not below the bitset's size.
    #[error("bit index {index} out of bounds for bitset of size {size}")]
    IndexOutOfRange {
        /// The offending index.
        index: usize,
        /// Size of the bitset that was accessed.
        size: usize,
    },

    /// A binary operation was invoked on bitsets of different sizes.
    #[error("bitset size mismatch: {left} != {right}")]
    SizeMismatch {
        /// Size of the receiver.
        left: usize,
        /// Size of the other operand.
        right: usize,
    },

    /// A set-bit rank addressed a set bit that does not exist.
    #[error("set bit rank {rank} out of range for {cardinality} set bits")]
    RankOutOfRange {
        /// The requested rank, negative ranks count from the end.
        rank: isize,
        /// Number of set bits at the time of the call.
        cardinality: usize,
    },
}

/// Shorthand result type for bitset operations.
pub type Result<T> = core::result::Result<T, BitsetError>;
