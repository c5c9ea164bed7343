//! Sort plan: stable ascending order over a child.

use std::sync::Arc;

use crate::materialize::materialized_blocks;
use crate::query::{Scan, SortScan};
use crate::record::{Layout, Schema};
use crate::storage::Storage;

use super::error::PlanError;
use super::node::Plan;

/// Orders a child plan's rows by a key list, ascending, stably.
///
/// The cursor drains and sorts the child in memory at its first positioning
/// call, so the block estimate models one materialization of the child's
/// output; rows and distinct values pass through unchanged — sorting is a
/// permutation.
pub struct SortPlan<S: Storage> {
    child: Box<Plan<S>>,
    sort_fields: Vec<String>,
    /// Layout the child's rows would have if written out; sizes the
    /// materialization estimate.
    layout: Arc<Layout>,
}

impl<S: Storage> SortPlan<S> {
    /// Wraps `child`, sorting by `sort_fields` in order.
    ///
    /// # Errors
    ///
    /// [`PlanError::UnknownField`] if a sort key is missing from the
    /// child's schema.
    pub fn new(child: Plan<S>, sort_fields: Vec<String>) -> Result<Self, PlanError> {
        for field in &sort_fields {
            if !child.schema().has_field(field) {
                return Err(PlanError::UnknownField(field.clone()));
            }
        }
        let layout = Arc::new(Layout::new((**child.schema()).clone())?);
        Ok(Self {
            child: Box::new(child),
            sort_fields,
            layout,
        })
    }

    /// Returns the sorted child plan.
    pub fn child(&self) -> &Plan<S> {
        &self.child
    }

    /// Returns the sort-key field list.
    pub fn sort_fields(&self) -> &[String] {
        &self.sort_fields
    }

    /// Returns the child's schema, unchanged.
    pub fn schema(&self) -> &Arc<Schema> {
        self.child.schema()
    }

    /// One materialization of the child's output.
    pub fn blocks_accessed(&self) -> u64 {
        materialized_blocks(self.child.records_output(), &self.layout)
    }

    /// Delegates to the child: sorting drops no rows.
    pub fn records_output(&self) -> u64 {
        self.child.records_output()
    }

    /// Delegates to the child.
    pub fn distinct_values(&self, field: &str) -> Result<u64, PlanError> {
        self.child.distinct_values(field)
    }

    /// Opens the child into the sorting cursor.
    pub async fn open(&self) -> Result<Scan<S>, PlanError> {
        let child = self.child.open().await?;
        Ok(Scan::Sort(
            SortScan::new(
                child,
                Arc::clone(self.child.schema()),
                self.sort_fields.clone(),
            )
            .await?,
        ))
    }
}
