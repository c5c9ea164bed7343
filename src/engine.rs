//! Engine context object.
//!
//! The [`Engine`] bundles the infrastructure the query layer runs on — the
//! buffer pool over a storage backend, the catalog, and temp-relation name
//! allocation — into one explicit object that is constructed once and passed
//! by reference into every plan, scan and planner. There are no process-wide
//! statics.
//!
//! # Architecture
//!
//! ```text
//! +--------------------------------------------------------------+
//! |                          Engine                              |
//! |                                                              |
//! |  +----------------+   +-----------+   +-------------------+  |
//! |  | BufferPool     |   | Catalog   |   | temp-name counter |  |
//! |  | (pin/unpin,    |   | (tables,  |   | (temp1, temp2...) |  |
//! |  |  LRU eviction) |   |  stats,   |   +-------------------+  |
//! |  +-------+--------+   |  views)   |                          |
//! |          |            +-----------+                          |
//! +----------+---------------------------------------------------+
//!            v
//!   +------------------+
//!   | Storage (trait)  |
//!   | Memory / File    |
//!   +------------------+
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::debug;

use crate::catalog::Catalog;
use crate::storage::{BufferPool, Storage};
use crate::tx::Transaction;

/// Shared engine infrastructure: buffer pool, catalog, temp-name allocator.
///
/// Generic over the storage backend; tests run on
/// [`MemoryStorage`](crate::storage::MemoryStorage), persistent databases on
/// [`FileStorage`](crate::storage::FileStorage).
pub struct Engine<S: Storage> {
    pool: BufferPool<S>,
    catalog: Catalog,
    next_temp: AtomicU64,
}

impl<S: Storage> Engine<S> {
    /// Creates an engine over `storage` with a buffer pool of `pool_size`
    /// frames.
    pub fn new(storage: S, pool_size: usize) -> Arc<Self> {
        debug!(pool_size, "engine initialized");
        Arc::new(Self {
            pool: BufferPool::new(storage, pool_size),
            catalog: Catalog::new(),
            next_temp: AtomicU64::new(0),
        })
    }

    /// Returns the buffer pool.
    pub fn pool(&self) -> &BufferPool<S> {
        &self.pool
    }

    /// Returns the catalog.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Starts a new transaction.
    pub fn begin(self: &Arc<Self>) -> Arc<Transaction<S>> {
        Arc::new(Transaction::new(Arc::clone(self)))
    }

    /// Allocates a unique name for a temporary relation.
    pub fn next_temp_name(&self) -> String {
        let n = self.next_temp.fetch_add(1, Ordering::Relaxed) + 1;
        format!("temp{}", n)
    }
}
