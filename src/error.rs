// Error types for block hashing and match finding.
//
// Two families, both caused by the caller and fatal to the current call:
//   - capacity: the source is too large for the table sizing scheme
//   - sequencing: blocks inserted out of order, out of range, or a chain
//     found in an inconsistent state
//
// Not finding a match is never an error; it is a `Match` of size 0.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, MatchError>;

/// Errors raised by `BlockHash` construction and insertion.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchError {
    /// The hash table for a source of this size cannot be allocated by the
    /// power-of-two doubling search.
    #[error("source of {size} bytes is too large for the block hash table")]
    SourceTooLarge { size: usize },

    /// A block was inserted before its predecessor.
    #[error("block {block} added out of sequence (next expected block is {expected})")]
    OutOfSequence { block: usize, expected: usize },

    /// A block number at or past the number of complete blocks in the source.
    #[error("block {block} is out of range: source holds {total} complete blocks")]
    BlockOutOfRange { block: usize, total: usize },

    /// An index past the end of the source buffer.
    #[error("index {index} is past the end of the {size}-byte source")]
    IndexOutOfRange { index: usize, size: usize },

    /// An end index that does not move past blocks already indexed.
    #[error("index {index} must be larger than the last indexed block start {last}")]
    IndexNotAdvancing { index: usize, last: usize },

    /// A chain link that should have been empty was already set.
    #[error("hash chain corrupted at block {block}")]
    ChainCorrupted { block: usize },
}

impl MatchError {
    /// True for errors caused by the size of the source buffer.
    pub fn is_capacity(&self) -> bool {
        matches!(self, Self::SourceTooLarge { .. })
    }

    /// True for errors caused by inserting blocks in the wrong order or
    /// finding the chain tables in an inconsistent state.
    pub fn is_sequencing(&self) -> bool {
        !self.is_capacity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification() {
        assert!(MatchError::SourceTooLarge { size: 1 }.is_capacity());
        assert!(
            MatchError::OutOfSequence {
                block: 3,
                expected: 1
            }
            .is_sequencing()
        );
        assert!(MatchError::ChainCorrupted { block: 0 }.is_sequencing());
    }

    #[test]
    fn display() {
        let err = MatchError::BlockOutOfRange { block: 9, total: 4 };
        let msg = err.to_string();
        assert!(msg.contains("block 9"), "{msg}");
        assert!(msg.contains("4 complete blocks"), "{msg}");
    }
}
