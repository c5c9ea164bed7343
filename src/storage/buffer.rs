//! Buffer pool for caching blocks in memory.
//!
//! The buffer pool sits between the storage layer and the record/query
//! layers, caching recently used blocks to reduce disk I/O and tracking
//! which blocks are pinned by open scans.
//!
//! # Components
//!
//! - [`BufferPool`]: main interface — pin a block, get a [`PinnedPage`]
//! - [`PinnedPage`]: owned RAII pin handle; dropping it unpins the block
//! - [`LruReplacer`]: LRU selection of unpinned frames for eviction
//!
//! `available()` reports the number of unpinned frames. The
//! block-nested-loop join reads this figure to size its chunks: a chunk of
//! `k` blocks holds `k` pins for the lifetime of the chunk scan, so the
//! spare frame count bounds how much of the inner relation can be resident
//! at once.
//!
//! # Latch Hierarchy
//!
//! 1. Pool state mutex (page table, frame metadata, free list, replacer)
//! 2. Frame data RwLocks
//!
//! Never acquire the state mutex while holding a frame data lock.

mod error;
mod frame;
mod pool;
mod replacer;

pub use error::BufferError;
pub use pool::{BufferPool, PinnedPage};
pub use replacer::LruReplacer;
