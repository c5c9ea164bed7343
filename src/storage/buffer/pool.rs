//! Buffer pool manager.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::storage::{BlockId, Storage};

use super::error::BufferError;
use super::frame::{Frame, FrameId, FrameMeta};
use super::replacer::LruReplacer;

/// Buffer pool caching blocks in a fixed number of frames.
///
/// Pinning a block loads it into a frame (evicting the LRU unpinned frame
/// when the pool is full) and returns a [`PinnedPage`] handle. The handle
/// owns the pin: the frame cannot be evicted until every handle on it is
/// dropped. Dirty frames are written back on eviction and on
/// [`flush_all`](BufferPool::flush_all).
///
/// Cloning a `BufferPool` clones a cheap `Arc` to the shared state, so the
/// engine, transactions and pin handles can all point at the same pool.
///
/// # Capacity
///
/// When every frame is pinned, pinning one more block fails with
/// [`BufferError::NoFreeFrames`] — execution is single-threaded per
/// transaction, so waiting for another pin holder would wait forever.
pub struct BufferPool<S: Storage> {
    inner: Arc<PoolInner<S>>,
}

impl<S: Storage> Clone for BufferPool<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct PoolInner<S: Storage> {
    storage: S,
    frames: Vec<Frame>,
    state: Mutex<PoolState>,
    pool_size: usize,
}

struct PoolState {
    /// Maps BlockId -> FrameId for resident blocks.
    page_table: HashMap<BlockId, FrameId>,
    /// Bookkeeping per frame (indexed by FrameId).
    meta: Vec<FrameMeta>,
    /// Frames not currently holding any block.
    free_list: Vec<FrameId>,
    /// Eviction candidates among occupied, unpinned frames.
    replacer: LruReplacer,
}

impl<S: Storage> BufferPool<S> {
    /// Creates a buffer pool with `pool_size` frames over `storage`.
    ///
    /// # Panics
    ///
    /// Panics if `pool_size` is 0.
    pub fn new(storage: S, pool_size: usize) -> Self {
        assert!(pool_size > 0, "pool_size must be > 0");

        let frames: Vec<_> = (0..pool_size).map(|_| Frame::new()).collect();
        let meta: Vec<_> = (0..pool_size).map(|_| FrameMeta::new()).collect();
        let free_list: Vec<_> = (0..pool_size).collect();

        Self {
            inner: Arc::new(PoolInner {
                storage,
                frames,
                state: Mutex::new(PoolState {
                    page_table: HashMap::with_capacity(pool_size),
                    meta,
                    free_list,
                    replacer: LruReplacer::new(pool_size),
                }),
                pool_size,
            }),
        }
    }

    /// Pins a block into the pool and returns an owning handle.
    ///
    /// If the block is already resident its pin count is incremented;
    /// otherwise it is read from storage into a free or evicted frame.
    ///
    /// # Errors
    ///
    /// - [`BufferError::NoFreeFrames`] if every frame is pinned
    /// - [`BufferError::Storage`] if the block doesn't exist or I/O fails
    pub async fn pin(&self, blk: &BlockId) -> Result<PinnedPage<S>, BufferError> {
        // Fast path: block already resident.
        {
            let mut state = self.inner.state.lock();
            if let Some(&frame_id) = state.page_table.get(blk) {
                let meta = &mut state.meta[frame_id];
                meta.pin_count += 1;
                if meta.pin_count == 1 {
                    state.replacer.pin(frame_id);
                }
                return Ok(PinnedPage {
                    inner: Arc::clone(&self.inner),
                    frame_id,
                    block: blk.clone(),
                });
            }
        }

        // Miss: allocate a frame and read the block in.
        let frame_id = self.inner.allocate_frame().await?;

        let read_result = {
            let mut data = self.inner.frames[frame_id].write().await;
            self.inner.storage.read_block(blk, data.as_mut_slice()).await
        };
        if let Err(e) = read_result {
            let mut state = self.inner.state.lock();
            state.free_list.push(frame_id);
            return Err(e.into());
        }

        {
            let mut state = self.inner.state.lock();
            state.page_table.insert(blk.clone(), frame_id);
            let meta = &mut state.meta[frame_id];
            meta.block = Some(blk.clone());
            meta.pin_count = 1;
            meta.dirty = false;
        }

        Ok(PinnedPage {
            inner: Arc::clone(&self.inner),
            frame_id,
            block: blk.clone(),
        })
    }

    /// Appends a zeroed block to `file` and returns its address.
    ///
    /// The new block is not cached; pin it to use it.
    pub async fn append(&self, file: &str) -> Result<BlockId, BufferError> {
        Ok(self.inner.storage.append_block(file).await?)
    }

    /// Returns the number of blocks in `file`.
    pub async fn block_count(&self, file: &str) -> Result<u64, BufferError> {
        Ok(self.inner.storage.block_count(file).await?)
    }

    /// Returns the number of unpinned frames.
    ///
    /// This is the figure chunk sizing consumes: each block of a loaded
    /// chunk occupies one pinned frame for the chunk's lifetime.
    pub fn available(&self) -> usize {
        let state = self.inner.state.lock();
        state.meta.iter().filter(|m| m.pin_count == 0).count()
    }

    /// Returns the total number of frames.
    pub fn pool_size(&self) -> usize {
        self.inner.pool_size
    }

    /// Writes every dirty frame back to storage and syncs.
    pub async fn flush_all(&self) -> Result<(), BufferError> {
        let dirty: Vec<(FrameId, BlockId)> = {
            let state = self.inner.state.lock();
            state
                .meta
                .iter()
                .enumerate()
                .filter_map(|(frame_id, m)| {
                    if m.dirty {
                        m.block.clone().map(|blk| (frame_id, blk))
                    } else {
                        None
                    }
                })
                .collect()
        };

        for (frame_id, blk) in dirty {
            let data = self.inner.frames[frame_id].read().await;
            self.inner.storage.write_block(&blk, data.as_slice()).await?;
            drop(data);

            let mut state = self.inner.state.lock();
            if state.meta[frame_id].block.as_ref() == Some(&blk) {
                state.meta[frame_id].dirty = false;
            }
        }

        self.inner.storage.sync_all().await?;
        Ok(())
    }

    /// Drops every cached frame of `file` without write-back and removes
    /// the file from storage.
    ///
    /// Used to reclaim temporary relations: their contents are dead once the
    /// owning transaction ends, so dirty frames are discarded, not flushed.
    ///
    /// # Errors
    ///
    /// [`BufferError::FileInUse`] if any block of the file is still pinned.
    pub async fn remove_file(&self, file: &str) -> Result<(), BufferError> {
        {
            let mut state = self.inner.state.lock();
            let resident: Vec<(BlockId, FrameId)> = state
                .page_table
                .iter()
                .filter(|(blk, _)| blk.file() == file)
                .map(|(blk, &fid)| (blk.clone(), fid))
                .collect();

            if resident
                .iter()
                .any(|&(_, fid)| state.meta[fid].pin_count > 0)
            {
                return Err(BufferError::FileInUse(file.to_string()));
            }

            for (blk, frame_id) in resident {
                state.page_table.remove(&blk);
                state.replacer.pin(frame_id);
                state.meta[frame_id].reset();
                state.free_list.push(frame_id);
            }
        }

        self.inner.storage.remove_file(file).await?;
        Ok(())
    }
}

impl<S: Storage> PoolInner<S> {
    /// Takes a free frame, evicting the LRU unpinned frame if necessary.
    async fn allocate_frame(&self) -> Result<FrameId, BufferError> {
        let victim = {
            let mut state = self.state.lock();
            if let Some(frame_id) = state.free_list.pop() {
                return Ok(frame_id);
            }
            match state.replacer.evict() {
                Some(fid) => fid,
                None => return Err(BufferError::NoFreeFrames),
            }
        };

        // Write back the victim if dirty, then clear its slot.
        let (old_block, dirty) = {
            let state = self.state.lock();
            let meta = &state.meta[victim];
            (meta.block.clone(), meta.dirty)
        };

        if let Some(ref blk) = old_block {
            if dirty {
                let data = self.frames[victim].read().await;
                self.storage.write_block(blk, data.as_slice()).await?;
            }
        }

        let mut state = self.state.lock();
        if let Some(ref blk) = old_block {
            state.page_table.remove(blk);
        }
        state.meta[victim].reset();
        Ok(victim)
    }

    /// Releases one pin on a frame (called from `PinnedPage::drop`).
    fn unpin(&self, frame_id: FrameId) {
        let mut state = self.state.lock();
        let meta = &mut state.meta[frame_id];
        debug_assert!(meta.pin_count > 0, "unpin on frame with no pins");
        if meta.pin_count > 0 {
            meta.pin_count -= 1;
            if meta.pin_count == 0 {
                state.replacer.unpin(frame_id);
            }
        }
    }

    fn mark_dirty(&self, frame_id: FrameId) {
        self.state.lock().meta[frame_id].dirty = true;
    }
}

/// Owned pin on one buffered block.
///
/// Holding the handle keeps the block resident; dropping it releases the
/// pin. Handles are owned (no borrow of the pool), so a scan can keep a
/// whole chunk of blocks pinned across `next()` calls.
pub struct PinnedPage<S: Storage> {
    inner: Arc<PoolInner<S>>,
    frame_id: FrameId,
    block: BlockId,
}

impl<S: Storage> PinnedPage<S> {
    /// Returns the pinned block's address.
    pub fn block(&self) -> &BlockId {
        &self.block
    }

    /// Reads the block image under the frame's read lock.
    pub async fn with_read<T>(&self, f: impl FnOnce(&crate::storage::Page) -> T) -> T {
        let data = self.inner.frames[self.frame_id].read().await;
        f(&data)
    }

    /// Mutates the block image under the frame's write lock and marks the
    /// frame dirty.
    pub async fn with_write<T>(&self, f: impl FnOnce(&mut crate::storage::Page) -> T) -> T {
        let mut data = self.inner.frames[self.frame_id].write().await;
        let out = f(&mut data);
        drop(data);
        self.inner.mark_dirty(self.frame_id);
        out
    }
}

impl<S: Storage> Drop for PinnedPage<S> {
    fn drop(&mut self) {
        self.inner.unpin(self.frame_id);
    }
}
