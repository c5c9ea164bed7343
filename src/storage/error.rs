//! Storage-layer errors.

use std::fmt;

use super::BlockId;

/// Errors from block I/O.
#[derive(Debug)]
pub enum StorageError {
    /// The addressed block has not been allocated.
    BlockNotFound(BlockId),

    /// A buffer of the wrong size was passed to a block operation.
    InvalidBufferSize {
        /// Bytes expected (always `BLOCK_SIZE`).
        expected: usize,
        /// Bytes provided.
        actual: usize,
    },

    /// A backing file's size is not a whole number of blocks.
    Corrupted(String),

    /// Underlying I/O failure.
    Io(std::io::Error),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::BlockNotFound(blk) => write!(f, "block {} does not exist", blk),
            StorageError::InvalidBufferSize { expected, actual } => {
                write!(f, "invalid buffer size: need {}, have {}", expected, actual)
            }
            StorageError::Corrupted(msg) => write!(f, "corrupted storage: {}", msg),
            StorageError::Io(e) => write!(f, "i/o error: {}", e),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(e: std::io::Error) -> Self {
        StorageError::Io(e)
    }
}
