//! Storage trait definition.

use crate::storage::{BlockId, StorageError};

/// Storage backend trait for block-based I/O.
///
/// This trait defines the interface for reading and writing fixed-size
/// blocks using caller-owned buffers, one logical file per relation.
/// Implementations include:
/// - [`MemoryStorage`](crate::storage::MemoryStorage): in-memory, for tests
/// - [`FileStorage`](crate::storage::FileStorage): disk-backed via tokio::fs
///
/// # Design Decisions
///
/// 1. **Async methods**: file I/O is inherently blocking; implementations
///    route it through tokio.
/// 2. **Caller-owned buffers**: this layer moves raw bytes only. Caching
///    and page interpretation belong to the buffer pool and record layer.
/// 3. **Explicit growth**: `append_block` extends a file by one zeroed
///    block, creating the file on first append. `block_count` of a file
///    that was never appended to is 0 — a fresh relation is empty.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; block-level coordination is the
/// buffer pool's job.
pub trait Storage: Send + Sync + 'static {
    /// Reads a block into a caller-provided `BLOCK_SIZE` buffer.
    ///
    /// # Errors
    ///
    /// `StorageError::BlockNotFound` if the block has not been allocated;
    /// `StorageError::InvalidBufferSize` if `buf` is not `BLOCK_SIZE` bytes.
    fn read_block(
        &self,
        blk: &BlockId,
        buf: &mut [u8],
    ) -> impl std::future::Future<Output = Result<(), StorageError>> + Send;

    /// Writes a block from a caller-provided `BLOCK_SIZE` buffer.
    ///
    /// # Errors
    ///
    /// `StorageError::BlockNotFound` if the block has not been allocated;
    /// `StorageError::InvalidBufferSize` if `buf` is not `BLOCK_SIZE` bytes.
    fn write_block(
        &self,
        blk: &BlockId,
        buf: &[u8],
    ) -> impl std::future::Future<Output = Result<(), StorageError>> + Send;

    /// Appends a zeroed block to `file`, creating the file if needed, and
    /// returns the new block's address.
    fn append_block(
        &self,
        file: &str,
    ) -> impl std::future::Future<Output = Result<BlockId, StorageError>> + Send;

    /// Returns the number of blocks in `file` (0 for an unknown file).
    fn block_count(
        &self,
        file: &str,
    ) -> impl std::future::Future<Output = Result<u64, StorageError>> + Send;

    /// Removes `file` and its blocks. Removing an unknown file is a no-op.
    ///
    /// Used to reclaim temporary relations at transaction end.
    fn remove_file(
        &self,
        file: &str,
    ) -> impl std::future::Future<Output = Result<(), StorageError>> + Send;

    /// Syncs all pending writes to durable media.
    ///
    /// A no-op for memory storage.
    fn sync_all(&self) -> impl std::future::Future<Output = Result<(), StorageError>> + Send;
}
