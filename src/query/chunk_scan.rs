//! Cursor over one pinned chunk of a materialized relation.

use std::sync::Arc;

use crate::catalog::TableInfo;
use crate::datum::Constant;
use crate::record::RecordPage;
use crate::storage::{BlockId, Storage};
use crate::tx::Transaction;

use super::error::QueryError;

/// Cursor over a contiguous run of blocks, all pinned for the cursor's
/// lifetime.
///
/// This is what makes the block-nested-loop join block-aware: while a chunk
/// is open, every one of its blocks occupies a buffer frame, so rescanning
/// the chunk (once per outer row) costs no disk reads. The chunk is sized
/// against [`available_buffers`](Transaction::available_buffers) by the
/// join, never larger than the pool can hold.
pub struct ChunkScan<S: Storage> {
    pages: Vec<RecordPage<S>>,
    current: usize,
    slot: Option<usize>,
}

impl<S: Storage> ChunkScan<S> {
    /// Pins blocks `start..=end` of the relation and positions the cursor
    /// before the chunk's first record.
    pub async fn new(
        tx: &Arc<Transaction<S>>,
        info: &TableInfo,
        start: u64,
        end: u64,
    ) -> Result<Self, QueryError> {
        let mut pages = Vec::with_capacity((end - start + 1) as usize);
        for num in start..=end {
            let blk = BlockId::new(info.file_name(), num);
            pages.push(RecordPage::open(tx, &blk, Arc::clone(info.layout())).await?);
        }
        Ok(Self {
            pages,
            current: 0,
            slot: None,
        })
    }

    /// Repositions before the chunk's first record. No I/O — the blocks
    /// stay pinned.
    pub fn before_first(&mut self) {
        self.current = 0;
        self.slot = None;
    }

    /// Advances to the next used slot, crossing into the chunk's later
    /// blocks as needed.
    pub async fn next(&mut self) -> Result<bool, QueryError> {
        loop {
            let Some(page) = self.pages.get(self.current) else {
                return Ok(false);
            };
            if let Some(slot) = page.next_used_after(self.slot).await {
                self.slot = Some(slot);
                return Ok(true);
            }
            self.current += 1;
            self.slot = None;
        }
    }

    /// Reads the named field of the current record.
    pub async fn get_value(&self, field: &str) -> Result<Constant, QueryError> {
        let page = self.pages.get(self.current).ok_or(QueryError::NoCurrentRow)?;
        let slot = self.slot.ok_or(QueryError::NoCurrentRow)?;
        Ok(page.get_value(slot, field).await?)
    }
}
