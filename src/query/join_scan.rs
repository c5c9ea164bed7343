//! Block-nested-loop equi-join cursor.

use std::sync::Arc;

use crate::catalog::TableInfo;
use crate::datum::Constant;
use crate::materialize::best_factor;
use crate::storage::Storage;
use crate::tx::Transaction;

use super::chunk_scan::ChunkScan;
use super::error::QueryError;
use super::scan::Scan;

/// Cursor realizing a block-nested-loop equi-join.
///
/// The inner relation has already been materialized into a temporary table
/// by the owning plan; this cursor walks it one chunk of blocks at a time:
///
/// 1. Load the next chunk of the inner relation (pinning its blocks).
/// 2. Stream every outer row once; for each outer row, scan the entire
///    chunk from its start, yielding each pairing whose join fields are
///    equal.
/// 3. When the outer side is exhausted, rewind it and move to the next
///    chunk. No next chunk means the join is exhausted.
///
/// The outer relation is thus re-read once per chunk — not once per inner
/// row — which is the whole point: total block reads are one inner pass
/// (at materialization) plus `ceil(B(inner)/chunk_size)` outer passes.
///
/// Join-field equality uses [`Constant`] equality; values of incompatible
/// types never match.
pub struct BlockJoinScan<S: Storage> {
    tx: Arc<Transaction<S>>,
    outer: Box<Scan<S>>,
    inner_info: TableInfo,
    outer_field: String,
    inner_field: String,

    chunk: Option<ChunkScan<S>>,
    /// Blocks per chunk, from `best_factor` over the available buffers.
    chunk_size: u64,
    /// First block of the next chunk to load.
    next_block: u64,
    /// Total blocks in the materialized inner relation.
    file_size: u64,

    more_outer: bool,
}

impl<S: Storage> BlockJoinScan<S> {
    /// Creates the join cursor over an open outer scan and a materialized
    /// inner relation, positioned before the first output row.
    pub async fn new(
        tx: Arc<Transaction<S>>,
        outer: Scan<S>,
        inner_info: TableInfo,
        outer_field: impl Into<String>,
        inner_field: impl Into<String>,
    ) -> Result<Self, QueryError> {
        let file_size = tx.size(inner_info.file_name()).await?;
        let chunk_size = best_factor(tx.available_buffers(), file_size);

        let mut scan = Self {
            tx,
            outer: Box::new(outer),
            inner_info,
            outer_field: outer_field.into(),
            inner_field: inner_field.into(),
            chunk: None,
            chunk_size,
            next_block: 0,
            file_size,
            more_outer: false,
        };
        scan.before_first().await?;
        Ok(scan)
    }

    /// Returns the chunk size the cursor settled on (in blocks).
    pub fn chunk_size(&self) -> u64 {
        self.chunk_size
    }

    /// Repositions before the first output row: outer on its first row,
    /// first inner chunk loaded.
    pub async fn before_first(&mut self) -> Result<(), QueryError> {
        self.next_block = 0;
        self.outer.before_first().await?;
        self.more_outer = self.outer.next().await?;
        self.use_next_chunk().await?;
        Ok(())
    }

    /// Advances to the next pairing satisfying the join condition.
    pub async fn next(&mut self) -> Result<bool, QueryError> {
        while self.more_outer {
            // Look for a match in the rest of the current chunk.
            loop {
                let advanced = match &mut self.chunk {
                    Some(chunk) => chunk.next().await?,
                    None => false,
                };
                if !advanced {
                    break;
                }
                if self.matches().await? {
                    return Ok(true);
                }
            }

            // Chunk exhausted for this outer row: advance the outer side.
            self.more_outer = self.outer.next().await?;
            if self.more_outer {
                if let Some(chunk) = &mut self.chunk {
                    chunk.before_first();
                }
            } else if self.use_next_chunk().await? {
                // Outer exhausted: rewind it for the next chunk.
                self.outer.before_first().await?;
                self.more_outer = self.outer.next().await?;
            } else {
                return Ok(false);
            }
        }
        Ok(false)
    }

    async fn matches(&self) -> Result<bool, QueryError> {
        let chunk = self.chunk.as_ref().ok_or(QueryError::NoCurrentRow)?;
        let outer_val = self.outer.get_value(&self.outer_field).await?;
        let inner_val = chunk.get_value(&self.inner_field).await?;
        Ok(outer_val == inner_val)
    }

    /// Loads the next chunk of the inner relation, dropping the previous
    /// chunk's pins first. Returns `false` when no blocks remain.
    async fn use_next_chunk(&mut self) -> Result<bool, QueryError> {
        self.chunk = None;
        if self.next_block >= self.file_size {
            return Ok(false);
        }
        let end = (self.next_block + self.chunk_size - 1).min(self.file_size - 1);
        self.chunk =
            Some(ChunkScan::new(&self.tx, &self.inner_info, self.next_block, end).await?);
        self.next_block = end + 1;
        Ok(true)
    }

    /// Reads the named field from whichever side declares it.
    pub async fn get_value(&self, field: &str) -> Result<Constant, QueryError> {
        if self.outer.has_field(field) {
            self.outer.get_value(field).await
        } else if self.inner_info.schema().has_field(field) {
            self.chunk
                .as_ref()
                .ok_or(QueryError::NoCurrentRow)?
                .get_value(field)
                .await
        } else {
            Err(QueryError::UnknownField(field.to_string()))
        }
    }

    /// Returns whether either side declares `field`.
    pub fn has_field(&self, field: &str) -> bool {
        self.outer.has_field(field) || self.inner_info.schema().has_field(field)
    }

    /// Releases the outer scan and the current chunk's pins.
    pub fn close(&mut self) {
        self.outer.close();
        self.chunk = None;
    }
}
