//! Transactions.
//!
//! A [`Transaction`] is the unit of work the query layer executes inside.
//! It provides block access through the engine's buffer pool, captures
//! before-images of every write so [`rollback`](Transaction::rollback) can
//! restore them, and owns the temporary relations created on its behalf
//! (join materialization, sorting), reclaiming them at transaction end.
//!
//! Locking, write-ahead logging and media recovery are outside this layer's
//! scope: execution is single-threaded per transaction, the undo list lives
//! in memory, and [`recover`](Transaction::recover) only forces pending
//! writes to storage.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::engine::Engine;
use crate::storage::{BlockId, BufferError, PinnedPage, Storage};

/// Errors from transaction-level block access and lifecycle operations.
#[derive(Debug)]
pub enum TxError {
    /// Buffer pool failure (no free frames, storage I/O, pinned temp file).
    Buffer(BufferError),
}

impl std::fmt::Display for TxError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TxError::Buffer(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for TxError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TxError::Buffer(e) => Some(e),
        }
    }
}

impl From<BufferError> for TxError {
    fn from(e: BufferError) -> Self {
        TxError::Buffer(e)
    }
}

/// Before-image of one write, kept for rollback.
enum UndoValue {
    Int(i32),
    Text(String),
}

struct UndoRecord {
    blk: BlockId,
    offset: usize,
    old: UndoValue,
}

struct TxState {
    undo: Vec<UndoRecord>,
    temps: Vec<String>,
}

/// A single-threaded unit of work over the engine.
///
/// Obtained from [`Engine::begin`]; shared by the plans and scans built for
/// it via `Arc`. All writes funnel through [`set_i32`](Transaction::set_i32)
/// / [`set_string`](Transaction::set_string) so the transaction can capture
/// undo information. Writes to this transaction's own temporary relations
/// skip undo capture — a temp relation never outlives the transaction, so
/// there is nothing to restore.
pub struct Transaction<S: Storage> {
    engine: Arc<Engine<S>>,
    state: Mutex<TxState>,
}

impl<S: Storage> Transaction<S> {
    pub(crate) fn new(engine: Arc<Engine<S>>) -> Self {
        Self {
            engine,
            state: Mutex::new(TxState {
                undo: Vec::new(),
                temps: Vec::new(),
            }),
        }
    }

    /// Returns the engine this transaction runs against.
    pub fn engine(&self) -> &Arc<Engine<S>> {
        &self.engine
    }

    /// Pins a block, keeping it buffered until the handle is dropped.
    pub async fn pin(&self, blk: &BlockId) -> Result<PinnedPage<S>, TxError> {
        Ok(self.engine.pool().pin(blk).await?)
    }

    /// Returns the number of blocks in a relation file.
    pub async fn size(&self, file: &str) -> Result<u64, TxError> {
        Ok(self.engine.pool().block_count(file).await?)
    }

    /// Appends a fresh zeroed block to a relation file.
    pub async fn append(&self, file: &str) -> Result<BlockId, TxError> {
        Ok(self.engine.pool().append(file).await?)
    }

    /// Returns the number of unpinned buffer frames.
    ///
    /// The block-nested-loop join sizes its chunks from this figure.
    pub fn available_buffers(&self) -> usize {
        self.engine.pool().available()
    }

    /// Writes an i32 through a pinned page, capturing the before-image.
    pub async fn set_i32(&self, page: &PinnedPage<S>, offset: usize, val: i32) {
        let old = page
            .with_write(|p| {
                let old = p.get_i32(offset);
                p.set_i32(offset, val);
                old
            })
            .await;
        self.log_undo(page.block(), offset, UndoValue::Int(old));
    }

    /// Writes a string through a pinned page, capturing the before-image.
    pub async fn set_string(&self, page: &PinnedPage<S>, offset: usize, val: &str) {
        let old = page
            .with_write(|p| {
                let old = p.get_string(offset);
                p.set_string(offset, val);
                old
            })
            .await;
        self.log_undo(page.block(), offset, UndoValue::Text(old));
    }

    fn log_undo(&self, blk: &BlockId, offset: usize, old: UndoValue) {
        let mut state = self.state.lock();
        if state.temps.iter().any(|t| t == blk.file()) {
            return;
        }
        state.undo.push(UndoRecord {
            blk: blk.clone(),
            offset,
            old,
        });
    }

    /// Registers a temporary relation owned by this transaction.
    ///
    /// Its file is removed (cached frames discarded, no write-back) when the
    /// transaction commits or rolls back.
    pub fn register_temp(&self, file: &str) {
        self.state.lock().temps.push(file.to_string());
    }

    /// Commits: flushes every dirty block and reclaims temp relations.
    pub async fn commit(&self) -> Result<(), TxError> {
        self.engine.pool().flush_all().await?;
        let temps = {
            let mut state = self.state.lock();
            state.undo.clear();
            std::mem::take(&mut state.temps)
        };
        self.reclaim(&temps).await?;
        debug!(temps = temps.len(), "transaction committed");
        Ok(())
    }

    /// Rolls back: restores every before-image in reverse order, flushes,
    /// and reclaims temp relations.
    pub async fn rollback(&self) -> Result<(), TxError> {
        let (undo, temps) = {
            let mut state = self.state.lock();
            (
                std::mem::take(&mut state.undo),
                std::mem::take(&mut state.temps),
            )
        };

        for record in undo.iter().rev() {
            // A temp file may already be gone; its writes were never logged,
            // so every logged block still exists.
            let page = self.engine.pool().pin(&record.blk).await?;
            match &record.old {
                UndoValue::Int(n) => {
                    let n = *n;
                    page.with_write(|p| p.set_i32(record.offset, n)).await;
                }
                UndoValue::Text(s) => {
                    page.with_write(|p| p.set_string(record.offset, s)).await;
                }
            }
        }

        self.engine.pool().flush_all().await?;
        self.reclaim(&temps).await?;
        debug!(undone = undo.len(), "transaction rolled back");
        Ok(())
    }

    /// Forces pending writes to storage after a restart.
    ///
    /// Media recovery (log replay) is owned by an external collaborator;
    /// failures here are fatal to the initializing transaction.
    pub async fn recover(&self) -> Result<(), TxError> {
        Ok(self.engine.pool().flush_all().await?)
    }

    async fn reclaim(&self, temps: &[String]) -> Result<(), TxError> {
        for file in temps {
            self.engine.pool().remove_file(file).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    async fn engine() -> Arc<Engine<MemoryStorage>> {
        Engine::new(MemoryStorage::new(), 8)
    }

    #[tokio::test]
    async fn test_set_and_read_back() {
        let engine = engine().await;
        let tx = engine.begin();
        let blk = tx.append("t.tbl").await.unwrap();

        let page = tx.pin(&blk).await.unwrap();
        tx.set_i32(&page, 0, 42).await;
        tx.set_string(&page, 8, "hello").await;

        assert_eq!(page.with_read(|p| p.get_i32(0)).await, 42);
        assert_eq!(page.with_read(|p| p.get_string(8)).await, "hello");
    }

    #[tokio::test]
    async fn test_rollback_restores_before_images() {
        let engine = engine().await;
        let tx = engine.begin();
        let blk = tx.append("t.tbl").await.unwrap();

        {
            let page = tx.pin(&blk).await.unwrap();
            tx.set_i32(&page, 0, 1).await;
            tx.set_i32(&page, 0, 2).await;
            tx.set_string(&page, 8, "abc").await;
        }
        tx.rollback().await.unwrap();

        let tx2 = engine.begin();
        let page = tx2.pin(&blk).await.unwrap();
        assert_eq!(page.with_read(|p| p.get_i32(0)).await, 0);
        assert_eq!(page.with_read(|p| p.get_string(8)).await, "");
    }

    #[tokio::test]
    async fn test_commit_then_rollback_does_not_undo() {
        let engine = engine().await;
        let tx = engine.begin();
        let blk = tx.append("t.tbl").await.unwrap();

        {
            let page = tx.pin(&blk).await.unwrap();
            tx.set_i32(&page, 0, 9).await;
        }
        tx.commit().await.unwrap();
        tx.rollback().await.unwrap();

        let page = tx.pin(&blk).await.unwrap();
        assert_eq!(page.with_read(|p| p.get_i32(0)).await, 9);
    }

    #[tokio::test]
    async fn test_temp_files_reclaimed_on_commit() {
        let engine = engine().await;
        let tx = engine.begin();

        tx.register_temp("temp1.tbl");
        let blk = tx.append("temp1.tbl").await.unwrap();
        {
            let page = tx.pin(&blk).await.unwrap();
            tx.set_i32(&page, 0, 5).await;
        }
        tx.commit().await.unwrap();

        assert_eq!(tx.size("temp1.tbl").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_temp_writes_skip_undo() {
        let engine = engine().await;
        let tx = engine.begin();

        tx.register_temp("temp1.tbl");
        let blk = tx.append("temp1.tbl").await.unwrap();
        {
            let page = tx.pin(&blk).await.unwrap();
            tx.set_i32(&page, 0, 5).await;
        }
        // Rollback must not try to restore the reclaimed temp block.
        tx.rollback().await.unwrap();
        assert_eq!(tx.size("temp1.tbl").await.unwrap(), 0);
    }
}
