//! Temporary relations and materialization.
//!
//! The block-nested-loop join copies one side of the join into a [`TempTable`]
//! before producing any rows, so that side can be re-read chunk by chunk at
//! the cost of a single sequential pass. This module provides the temp-table
//! handle, the row-copying pass itself, the estimate of how many blocks a
//! materialized relation will occupy, and the chunk-sizing rule that fits a
//! materialized relation into the buffer pool's spare capacity.

use std::sync::Arc;

use tracing::debug;

use crate::catalog::TableInfo;
use crate::query::{QueryError, Scan, TableScan};
use crate::record::{Layout, RecordError, Schema};
use crate::storage::Storage;
use crate::tx::Transaction;

/// Handle to an ephemeral relation holding a materialized intermediate
/// result.
///
/// The table is never registered in the catalog: it has no statistics and no
/// name visible to queries. Its backing file is registered with the creating
/// transaction, which reclaims it (frames discarded, file removed) at commit
/// or rollback — a temp table must not outlive its transaction.
pub struct TempTable {
    info: TableInfo,
}

impl TempTable {
    /// Allocates a fresh, empty temporary relation for `schema`.
    ///
    /// # Errors
    ///
    /// [`RecordError::SlotTooLarge`] if one record of `schema` would not fit
    /// in a block.
    pub fn new<S: Storage>(
        tx: &Arc<Transaction<S>>,
        schema: Schema,
    ) -> Result<Self, RecordError> {
        let name = tx.engine().next_temp_name();
        let layout = Arc::new(Layout::new(schema)?);
        let info = TableInfo::new(name.clone(), format!("{}.tbl", name), layout);
        tx.register_temp(info.file_name());
        Ok(Self { info })
    }

    /// Returns the temp relation's descriptor.
    pub fn info(&self) -> &TableInfo {
        &self.info
    }

    /// Opens a fresh cursor over the temp relation.
    pub async fn open<S: Storage>(
        &self,
        tx: &Arc<Transaction<S>>,
    ) -> Result<TableScan<S>, QueryError> {
        TableScan::new(Arc::clone(tx), self.info.clone()).await
    }
}

/// Drains `src` into a fresh temp relation with the given schema, returning
/// the populated [`TempTable`].
///
/// `src` is rewound first, read to exhaustion, and closed; every row is
/// written field by field into the new relation.
pub async fn materialize<S: Storage>(
    tx: &Arc<Transaction<S>>,
    src: &mut Scan<S>,
    schema: &Schema,
) -> Result<TempTable, QueryError> {
    let temp = TempTable::new(tx, schema.clone())?;
    let mut dest = temp.open(tx).await?;

    src.before_first().await?;
    let mut rows = 0u64;
    while src.next().await? {
        dest.insert().await?;
        for field in schema.fields() {
            let val = src.get_value(field).await?;
            dest.set_value(field, &val).await?;
        }
        rows += 1;
    }
    src.close();
    dest.close();

    let blocks = tx.size(temp.info().file_name()).await?;
    debug!(
        relation = temp.info().table_name(),
        rows, blocks, "relation materialized"
    );
    Ok(temp)
}

/// Estimates how many blocks `records` rows occupy once materialized with
/// the given layout.
pub fn materialized_blocks(records: u64, layout: &Layout) -> u64 {
    let per_block = (layout.slots_per_block() as u64).max(1);
    records.div_ceil(per_block)
}

/// Picks the chunk size (in blocks) for walking a materialized relation of
/// `size` blocks when `available` buffer frames are unpinned.
///
/// One frame is reserved for the other side's current block; a pool
/// reporting fewer than two frames is treated as two so the result is never
/// zero and the join always makes progress. Among chunk sizes that fit the
/// usable frames, the search prefers the one dividing the relation into the
/// fewest whole chunks: it tries 1 chunk, 2 chunks, ... and stops at the
/// first count whose per-chunk size fits.
pub fn best_factor(available: usize, size: u64) -> u64 {
    let usable = (available.max(2) - 1) as u64;
    if size == 0 {
        return 1;
    }
    let mut chunks = 1u64;
    loop {
        let chunk = size.div_ceil(chunks);
        if chunk <= usable {
            return chunk.max(1);
        }
        chunks += 1;
    }
}
