//! Group-by plan: grouped aggregation over a sorted child.

use std::sync::Arc;

use crate::query::{AggregateFn, GroupByScan, Scan};
use crate::record::Schema;
use crate::storage::Storage;

use super::error::PlanError;
use super::node::Plan;
use super::sort_plan::SortPlan;

/// Produces one row per distinct combination of grouping-field values, each
/// carrying the grouping values plus one output field per aggregate.
///
/// The grouping cursor needs its input clustered by the grouping fields, so
/// construction wraps the child in a [`SortPlan`] on exactly those fields —
/// the sort is part of this plan's cost.
pub struct GroupByPlan<S: Storage> {
    /// The sort plan wrapping the original child.
    child: Box<Plan<S>>,
    group_fields: Vec<String>,
    aggs: Vec<AggregateFn>,
    schema: Arc<Schema>,
}

impl<S: Storage> GroupByPlan<S> {
    /// Groups `child` by `group_fields`, computing `aggs` per group.
    ///
    /// An empty `group_fields` list collapses the whole input into one
    /// group.
    ///
    /// # Errors
    ///
    /// [`PlanError::Record`] if a grouping field or an aggregate's source
    /// field is missing from the child's schema.
    pub fn new(
        child: Plan<S>,
        group_fields: Vec<String>,
        aggs: Vec<AggregateFn>,
    ) -> Result<Self, PlanError> {
        let mut schema = Schema::new();
        for field in &group_fields {
            schema.add_from(field, child.schema())?;
        }
        for agg in &aggs {
            agg.add_output_field(&mut schema, child.schema())?;
        }

        let sorted = Plan::Sort(SortPlan::new(child, group_fields.clone())?);
        Ok(Self {
            child: Box::new(sorted),
            group_fields,
            aggs,
            schema: Arc::new(schema),
        })
    }

    /// Returns the (sorted) child plan.
    pub fn child(&self) -> &Plan<S> {
        &self.child
    }

    /// Returns the grouping fields.
    pub fn group_fields(&self) -> &[String] {
        &self.group_fields
    }

    /// Returns the aggregates.
    pub fn aggregates(&self) -> &[AggregateFn] {
        &self.aggs
    }

    /// Returns the output schema: grouping fields, then aggregate outputs.
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// The internal sort's cost: grouping itself adds no block reads.
    pub fn blocks_accessed(&self) -> u64 {
        self.child.blocks_accessed()
    }

    /// One row per group: the product of the grouping fields'
    /// distinct-value estimates.
    pub fn records_output(&self) -> u64 {
        self.group_fields
            .iter()
            .map(|f| self.child.distinct_values(f).unwrap_or(1))
            .fold(1u64, u64::saturating_mul)
    }

    /// Grouping fields keep the child's estimate; an aggregate output can
    /// take a different value in every group.
    pub fn distinct_values(&self, field: &str) -> Result<u64, PlanError> {
        if self.group_fields.iter().any(|f| f == field) {
            return self.child.distinct_values(field);
        }
        if self.aggs.iter().any(|a| a.output_field() == field) {
            return Ok(self.records_output());
        }
        Err(PlanError::UnknownField(field.to_string()))
    }

    /// Opens the sorted child into the grouping cursor.
    pub async fn open(&self) -> Result<Scan<S>, PlanError> {
        let child = self.child.open().await?;
        Ok(Scan::GroupBy(
            GroupByScan::new(child, self.group_fields.clone(), self.aggs.clone()).await?,
        ))
    }
}
