//! In-memory storage implementation for testing.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::storage::{BlockId, Storage, StorageError, BLOCK_SIZE};

/// In-memory storage implementation for tests and demos.
///
/// Keeps each relation file as a `Vec` of block images inside a
/// `HashMap<String, _>` behind a `Mutex`. Not persistent — all data is lost
/// when dropped.
///
/// # Concurrency
///
/// Uses `parking_lot::Mutex` (not `tokio::sync::Mutex`) because operations
/// are just map accesses and memory copies; no I/O blocks inside the lock.
pub struct MemoryStorage {
    files: Mutex<HashMap<String, Vec<Box<[u8; BLOCK_SIZE]>>>>,
}

impl MemoryStorage {
    /// Creates a new empty memory storage.
    pub fn new() -> Self {
        Self {
            files: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl Storage for MemoryStorage {
    async fn read_block(&self, blk: &BlockId, buf: &mut [u8]) -> Result<(), StorageError> {
        if buf.len() != BLOCK_SIZE {
            return Err(StorageError::InvalidBufferSize {
                expected: BLOCK_SIZE,
                actual: buf.len(),
            });
        }

        let files = self.files.lock();
        let block = files
            .get(blk.file())
            .and_then(|blocks| blocks.get(blk.num() as usize))
            .ok_or_else(|| StorageError::BlockNotFound(blk.clone()))?;

        buf.copy_from_slice(&**block);
        Ok(())
    }

    async fn write_block(&self, blk: &BlockId, buf: &[u8]) -> Result<(), StorageError> {
        if buf.len() != BLOCK_SIZE {
            return Err(StorageError::InvalidBufferSize {
                expected: BLOCK_SIZE,
                actual: buf.len(),
            });
        }

        let mut files = self.files.lock();
        let block = files
            .get_mut(blk.file())
            .and_then(|blocks| blocks.get_mut(blk.num() as usize))
            .ok_or_else(|| StorageError::BlockNotFound(blk.clone()))?;

        block.copy_from_slice(buf);
        Ok(())
    }

    async fn append_block(&self, file: &str) -> Result<BlockId, StorageError> {
        let mut files = self.files.lock();
        let blocks = files.entry(file.to_string()).or_default();
        blocks.push(Box::new([0u8; BLOCK_SIZE]));
        Ok(BlockId::new(file, blocks.len() as u64 - 1))
    }

    async fn block_count(&self, file: &str) -> Result<u64, StorageError> {
        let files = self.files.lock();
        Ok(files.get(file).map(|blocks| blocks.len() as u64).unwrap_or(0))
    }

    async fn remove_file(&self, file: &str) -> Result<(), StorageError> {
        self.files.lock().remove(file);
        Ok(())
    }

    async fn sync_all(&self) -> Result<(), StorageError> {
        // Data is already in memory.
        Ok(())
    }
}
