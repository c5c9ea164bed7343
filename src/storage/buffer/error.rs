//! Buffer pool errors.

use std::fmt;

use crate::storage::StorageError;

/// Errors from buffer pool operations.
#[derive(Debug)]
pub enum BufferError {
    /// Every frame is pinned; nothing can be evicted to make room.
    NoFreeFrames,

    /// A file could not be discarded because some of its blocks are pinned.
    FileInUse(String),

    /// Underlying storage failure.
    Storage(StorageError),
}

impl fmt::Display for BufferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BufferError::NoFreeFrames => write!(f, "no free buffer frames available"),
            BufferError::FileInUse(name) => {
                write!(f, "file \"{}\" still has pinned blocks", name)
            }
            BufferError::Storage(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for BufferError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BufferError::Storage(e) => Some(e),
            _ => None,
        }
    }
}

impl From<StorageError> for BufferError {
    fn from(e: StorageError) -> Self {
        BufferError::Storage(e)
    }
}
