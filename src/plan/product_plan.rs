//! Cross-product plan: the naive join baseline.

use std::sync::Arc;

use crate::query::{ProductScan, Scan};
use crate::record::Schema;
use crate::storage::Storage;

use super::error::PlanError;
use super::node::Plan;

/// Pairs every lhs row with every rhs row, no filtering.
///
/// Together with a [`SelectPlan`](super::SelectPlan) on the join condition
/// this realizes an equality join — the baseline whose cost the
/// block-nested-loop join beats. The rhs is rescanned once per lhs row,
/// which the block-read estimate makes plain.
pub struct ProductPlan<S: Storage> {
    lhs: Box<Plan<S>>,
    rhs: Box<Plan<S>>,
    schema: Arc<Schema>,
}

impl<S: Storage> ProductPlan<S> {
    /// Combines two plans into their cross product.
    ///
    /// # Errors
    ///
    /// [`PlanError::Record`] if the two schemas share a field name — the
    /// output schema is their disjoint union.
    pub fn new(lhs: Plan<S>, rhs: Plan<S>) -> Result<Self, PlanError> {
        let mut schema = Schema::new();
        schema.add_all(lhs.schema())?;
        schema.add_all(rhs.schema())?;
        Ok(Self {
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
            schema: Arc::new(schema),
        })
    }

    /// Returns the outer (lhs) child.
    pub fn lhs(&self) -> &Plan<S> {
        &self.lhs
    }

    /// Returns the inner (rhs) child.
    pub fn rhs(&self) -> &Plan<S> {
        &self.rhs
    }

    /// Returns the concatenated schema.
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// One lhs pass plus one full rhs pass per lhs row.
    pub fn blocks_accessed(&self) -> u64 {
        self.lhs.blocks_accessed().saturating_add(
            self.lhs
                .records_output()
                .saturating_mul(self.rhs.blocks_accessed()),
        )
    }

    /// Every pairing: the product of the children's row counts.
    pub fn records_output(&self) -> u64 {
        self.lhs
            .records_output()
            .saturating_mul(self.rhs.records_output())
    }

    /// Delegates to whichever side's schema contains `field`.
    pub fn distinct_values(&self, field: &str) -> Result<u64, PlanError> {
        if self.lhs.schema().has_field(field) {
            self.lhs.distinct_values(field)
        } else if self.rhs.schema().has_field(field) {
            self.rhs.distinct_values(field)
        } else {
            Err(PlanError::UnknownField(field.to_string()))
        }
    }

    /// Opens both children into the product cursor.
    pub async fn open(&self) -> Result<Scan<S>, PlanError> {
        let lhs = self.lhs.open().await?;
        let rhs = self.rhs.open().await?;
        Ok(Scan::Product(ProductScan::new(lhs, rhs).await?))
    }
}
