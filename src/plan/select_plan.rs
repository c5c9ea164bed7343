//! Selection plan: predicate filter over a child.

use std::sync::Arc;

use crate::query::{Predicate, Scan, SelectScan};
use crate::record::Schema;
use crate::storage::Storage;

use super::error::PlanError;
use super::node::Plan;

/// Filters a child plan's rows by a predicate.
///
/// The schema is the child's, unchanged. Selection never changes how many
/// blocks must be read — every child block is still visited — so
/// `blocks_accessed` delegates as-is; only the row-count estimate shrinks,
/// by the predicate's reduction factor.
pub struct SelectPlan<S: Storage> {
    child: Box<Plan<S>>,
    pred: Predicate,
}

impl<S: Storage> SelectPlan<S> {
    /// Wraps `child`, filtering by `pred`.
    pub fn new(child: Plan<S>, pred: Predicate) -> Self {
        Self {
            child: Box::new(child),
            pred,
        }
    }

    /// Returns the filtered child plan.
    pub fn child(&self) -> &Plan<S> {
        &self.child
    }

    /// Returns the filtering predicate.
    pub fn predicate(&self) -> &Predicate {
        &self.pred
    }

    /// Returns the child's schema, unchanged.
    pub fn schema(&self) -> &Arc<Schema> {
        self.child.schema()
    }

    /// Same as the child's: filtering reads every child block.
    pub fn blocks_accessed(&self) -> u64 {
        self.child.blocks_accessed()
    }

    /// The child's row count scaled down by the predicate's estimated
    /// selectivity.
    pub fn records_output(&self) -> u64 {
        let factor = self.pred.reduction_factor(&self.child).max(1);
        self.child.records_output() / factor
    }

    /// The child's estimate, capped at this plan's row count when the
    /// predicate pins `field` to a constant.
    pub fn distinct_values(&self, field: &str) -> Result<u64, PlanError> {
        let child_estimate = self.child.distinct_values(field)?;
        if self.pred.equates_with_constant(field).is_some() {
            Ok(child_estimate.min(self.records_output()))
        } else {
            Ok(child_estimate)
        }
    }

    /// Opens the child and wraps its cursor in the filter.
    pub async fn open(&self) -> Result<Scan<S>, PlanError> {
        let child = self.child.open().await?;
        Ok(Scan::Select(SelectScan::new(child, self.pred.clone())))
    }
}
