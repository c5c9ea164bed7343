//! Buffer pool frame.

use tokio::sync::RwLock;

use crate::storage::Page;

/// Index of a frame within the pool's frame array.
pub(super) type FrameId = usize;

/// A frame holding one block image.
///
/// The image itself sits behind its own `RwLock`; bookkeeping (which block,
/// pin count, dirty flag) lives in the pool state so it can be read without
/// touching the data lock.
pub(super) struct Frame {
    data: RwLock<Page>,
}

impl Frame {
    pub fn new() -> Self {
        Self {
            data: RwLock::new(Page::new()),
        }
    }

    /// Acquires a read lock on the block image.
    pub async fn read(&self) -> tokio::sync::RwLockReadGuard<'_, Page> {
        self.data.read().await
    }

    /// Acquires a write lock on the block image.
    pub async fn write(&self) -> tokio::sync::RwLockWriteGuard<'_, Page> {
        self.data.write().await
    }
}

/// Bookkeeping for one frame, kept in the pool state.
pub(super) struct FrameMeta {
    /// Block currently held, or `None` for a free frame.
    pub block: Option<crate::storage::BlockId>,
    /// Number of live pins. Only a frame with zero pins may be evicted.
    pub pin_count: u32,
    /// Whether the image was modified since it was last written back.
    pub dirty: bool,
}

impl FrameMeta {
    pub fn new() -> Self {
        Self {
            block: None,
            pin_count: 0,
            dirty: false,
        }
    }

    pub fn reset(&mut self) {
        self.block = None;
        self.pin_count = 0;
        self.dirty = false;
    }
}
