//! Projection plan: field-list restriction over a child.

use std::sync::Arc;

use crate::query::{ProjectScan, Scan};
use crate::record::Schema;
use crate::storage::Storage;

use super::error::PlanError;
use super::node::Plan;

/// Restricts a child plan's visible fields.
///
/// Projection changes neither the number of rows nor the blocks read, so
/// every cost estimate delegates unchanged to the child.
pub struct ProjectPlan<S: Storage> {
    child: Box<Plan<S>>,
    fields: Vec<String>,
    schema: Arc<Schema>,
}

impl<S: Storage> ProjectPlan<S> {
    /// Wraps `child`, exposing only `fields`.
    ///
    /// # Errors
    ///
    /// [`PlanError::Record`] if a requested field is missing from the
    /// child's schema — a misconfigured projection aborts plan construction
    /// rather than silently dropping the field.
    pub fn new(child: Plan<S>, fields: Vec<String>) -> Result<Self, PlanError> {
        let schema = Arc::new(child.schema().project(&fields)?);
        Ok(Self {
            child: Box::new(child),
            fields,
            schema,
        })
    }

    /// Returns the projected child plan.
    pub fn child(&self) -> &Plan<S> {
        &self.child
    }

    /// Returns the projection's field list.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Returns the projected schema.
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Delegates to the child.
    pub fn blocks_accessed(&self) -> u64 {
        self.child.blocks_accessed()
    }

    /// Delegates to the child.
    pub fn records_output(&self) -> u64 {
        self.child.records_output()
    }

    /// Delegates to the child.
    pub fn distinct_values(&self, field: &str) -> Result<u64, PlanError> {
        self.child.distinct_values(field)
    }

    /// Opens the child and wraps its cursor in the field restriction.
    pub async fn open(&self) -> Result<Scan<S>, PlanError> {
        let child = self.child.open().await?;
        Ok(Scan::Project(ProjectScan::new(child, self.fields.clone())))
    }
}
