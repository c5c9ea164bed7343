//! Block-nested-loop equi-join plan.

use std::sync::Arc;

use tracing::debug;

use crate::materialize::{best_factor, materialize, materialized_blocks};
use crate::query::{BlockJoinScan, Scan};
use crate::record::{Layout, Schema};
use crate::storage::Storage;
use crate::tx::Transaction;

use super::error::PlanError;
use super::node::Plan;

/// Equality join that materializes its inner side and walks it in
/// buffer-sized chunks.
///
/// Construction is pure: it stores the children, validates the two join
/// columns and computes the union schema. All I/O happens in
/// [`open()`](BlockJoinPlan::open):
///
/// 1. The inner child is drained into a temp relation (one sequential pass,
///    however often its rows are revisited afterwards).
/// 2. A chunk size is picked from the unpinned buffer count.
/// 3. The join cursor streams the outer side once per inner chunk.
///
/// # Cost model
///
/// The block estimate follows the scan's actual chunking of the
/// materialized *inner* relation:
///
/// ```text
/// B(inner) + ceil(B(inner) / chunk_size) * B(outer)
/// ```
///
/// where `B(inner)` is the materialized inner block count. A family of
/// related engines estimates the chunk count from the *outer* relation's
/// blocks divided by the available buffers instead; that figure disagrees
/// with what the cursor actually does, so it is deliberately not used here
/// (the cost tests pin the difference down).
pub struct BlockJoinPlan<S: Storage> {
    tx: Arc<Transaction<S>>,
    outer: Box<Plan<S>>,
    inner: Box<Plan<S>>,
    outer_field: String,
    inner_field: String,
    schema: Arc<Schema>,
    /// Layout the inner side will have once materialized; fixed here so the
    /// block estimate needs no I/O.
    inner_layout: Arc<Layout>,
}

impl<S: Storage> BlockJoinPlan<S> {
    /// Joins `outer` and `inner` on `outer_field = inner_field`.
    ///
    /// # Errors
    ///
    /// [`PlanError::UnknownField`] if a join column is missing from its
    /// side's schema; [`PlanError::Record`] if the two schemas overlap.
    pub fn new(
        tx: Arc<Transaction<S>>,
        outer: Plan<S>,
        inner: Plan<S>,
        outer_field: impl Into<String>,
        inner_field: impl Into<String>,
    ) -> Result<Self, PlanError> {
        let outer_field = outer_field.into();
        let inner_field = inner_field.into();
        if !outer.schema().has_field(&outer_field) {
            return Err(PlanError::UnknownField(outer_field));
        }
        if !inner.schema().has_field(&inner_field) {
            return Err(PlanError::UnknownField(inner_field));
        }

        let mut schema = Schema::new();
        schema.add_all(outer.schema())?;
        schema.add_all(inner.schema())?;
        let inner_layout = Arc::new(Layout::new((**inner.schema()).clone())?);

        Ok(Self {
            tx,
            outer: Box::new(outer),
            inner: Box::new(inner),
            outer_field,
            inner_field,
            schema: Arc::new(schema),
            inner_layout,
        })
    }

    /// Returns the outer child.
    pub fn outer(&self) -> &Plan<S> {
        &self.outer
    }

    /// Returns the inner (materialized) child.
    pub fn inner(&self) -> &Plan<S> {
        &self.inner
    }

    /// Returns the outer side's join column.
    pub fn outer_field(&self) -> &str {
        &self.outer_field
    }

    /// Returns the inner side's join column.
    pub fn inner_field(&self) -> &str {
        &self.inner_field
    }

    /// Returns the concatenated schema.
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Estimated block count of the materialized inner relation.
    fn inner_blocks(&self) -> u64 {
        materialized_blocks(self.inner.records_output(), &self.inner_layout)
    }

    /// The chunk size the join would pick right now, from the unpinned
    /// buffer count and the estimated materialized inner size.
    pub fn chunk_size(&self) -> u64 {
        best_factor(self.tx.available_buffers(), self.inner_blocks())
    }

    /// One materialization pass over the inner side plus one outer pass per
    /// inner chunk.
    pub fn blocks_accessed(&self) -> u64 {
        let inner_blocks = self.inner_blocks();
        let chunks = inner_blocks.div_ceil(self.chunk_size());
        inner_blocks.saturating_add(chunks.saturating_mul(self.outer.blocks_accessed()))
    }

    /// The standard equi-join cardinality estimate: the product of the row
    /// counts, divided by the larger distinct-value count of the two join
    /// columns.
    pub fn records_output(&self) -> u64 {
        let outer_values = self.outer.distinct_values(&self.outer_field).unwrap_or(1);
        let inner_values = self.inner.distinct_values(&self.inner_field).unwrap_or(1);
        let pairs = self
            .outer
            .records_output()
            .saturating_mul(self.inner.records_output());
        pairs / outer_values.max(inner_values).max(1)
    }

    /// Delegates to whichever side's schema contains `field`.
    pub fn distinct_values(&self, field: &str) -> Result<u64, PlanError> {
        if self.outer.schema().has_field(field) {
            self.outer.distinct_values(field)
        } else if self.inner.schema().has_field(field) {
            self.inner.distinct_values(field)
        } else {
            Err(PlanError::UnknownField(field.to_string()))
        }
    }

    /// Materializes the inner side, then opens the chunked join cursor.
    ///
    /// This is the one plan whose `open()` is not O(1): the whole inner
    /// child is read and written into a temp relation before the first row
    /// is available.
    pub async fn open(&self) -> Result<Scan<S>, PlanError> {
        let mut src = self.inner.open().await?;
        let temp = materialize(&self.tx, &mut src, self.inner.schema()).await?;

        let outer = self.outer.open().await?;
        let scan = BlockJoinScan::new(
            Arc::clone(&self.tx),
            outer,
            temp.info().clone(),
            self.outer_field.clone(),
            self.inner_field.clone(),
        )
        .await?;
        debug!(
            outer_field = %self.outer_field,
            inner_field = %self.inner_field,
            chunk_size = scan.chunk_size(),
            "block join opened"
        );
        Ok(Scan::BlockJoin(scan))
    }
}
