//! The plan node family.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::query::Scan;
use crate::record::Schema;
use crate::storage::Storage;

use super::error::PlanError;
use super::group_plan::GroupByPlan;
use super::join_plan::BlockJoinPlan;
use super::product_plan::ProductPlan;
use super::project_plan::ProjectPlan;
use super::select_plan::SelectPlan;
use super::sort_plan::SortPlan;
use super::table_plan::TablePlan;

/// Boxed future breaking the recursive async cycle through boxed children
/// (Plan -> SelectPlan -> Plan).
pub(super) type PlanFuture<'a, T> =
    Pin<Box<dyn Future<Output = Result<T, PlanError>> + Send + 'a>>;

/// A logical, side-effect-free description of a relational computation.
///
/// Like [`Scan`], the variant set is closed and dispatched by enum match;
/// composite variants own their children as `Box<Plan<_>>`. A plan's output
/// schema and cost estimates are fixed at construction and never change; the
/// estimation methods perform no I/O and are safe to call before
/// [`open()`](Plan::open). Opening the same plan twice yields independent
/// cursors.
pub enum Plan<S: Storage> {
    /// Leaf over one physical table; estimates come from catalog statistics.
    Table(TablePlan<S>),
    /// Predicate filter; reduces cardinality, never block reads.
    Select(SelectPlan<S>),
    /// Field-list restriction; never changes cardinality.
    Project(ProjectPlan<S>),
    /// Naive cross product; the join baseline.
    Product(ProductPlan<S>),
    /// Block-nested-loop equi-join over a materialized inner relation.
    BlockJoin(BlockJoinPlan<S>),
    /// Grouped aggregation over an internally sorted child.
    GroupBy(GroupByPlan<S>),
    /// Stable ascending sort.
    Sort(SortPlan<S>),
}

impl<S: Storage> Plan<S> {
    /// Returns the plan's output schema.
    pub fn schema(&self) -> &Arc<Schema> {
        match self {
            Plan::Table(p) => p.schema(),
            Plan::Select(p) => p.schema(),
            Plan::Project(p) => p.schema(),
            Plan::Product(p) => p.schema(),
            Plan::BlockJoin(p) => p.schema(),
            Plan::GroupBy(p) => p.schema(),
            Plan::Sort(p) => p.schema(),
        }
    }

    /// Estimates the number of block reads a full scan of this plan costs.
    pub fn blocks_accessed(&self) -> u64 {
        match self {
            Plan::Table(p) => p.blocks_accessed(),
            Plan::Select(p) => p.blocks_accessed(),
            Plan::Project(p) => p.blocks_accessed(),
            Plan::Product(p) => p.blocks_accessed(),
            Plan::BlockJoin(p) => p.blocks_accessed(),
            Plan::GroupBy(p) => p.blocks_accessed(),
            Plan::Sort(p) => p.blocks_accessed(),
        }
    }

    /// Estimates the number of rows the plan outputs.
    pub fn records_output(&self) -> u64 {
        match self {
            Plan::Table(p) => p.records_output(),
            Plan::Select(p) => p.records_output(),
            Plan::Project(p) => p.records_output(),
            Plan::Product(p) => p.records_output(),
            Plan::BlockJoin(p) => p.records_output(),
            Plan::GroupBy(p) => p.records_output(),
            Plan::Sort(p) => p.records_output(),
        }
    }

    /// Estimates the number of distinct values `field` takes in the output.
    ///
    /// Composite plans delegate to whichever child's schema contains the
    /// field; a field neither side contains is a configuration error.
    pub fn distinct_values(&self, field: &str) -> Result<u64, PlanError> {
        match self {
            Plan::Table(p) => p.distinct_values(field),
            Plan::Select(p) => p.distinct_values(field),
            Plan::Project(p) => p.distinct_values(field),
            Plan::Product(p) => p.distinct_values(field),
            Plan::BlockJoin(p) => p.distinct_values(field),
            Plan::GroupBy(p) => p.distinct_values(field),
            Plan::Sort(p) => p.distinct_values(field),
        }
    }

    /// Opens the plan into a fresh scan positioned before its first row.
    pub fn open(&self) -> PlanFuture<'_, Scan<S>> {
        Box::pin(async move {
            match self {
                Plan::Table(p) => p.open().await,
                Plan::Select(p) => p.open().await,
                Plan::Project(p) => p.open().await,
                Plan::Product(p) => p.open().await,
                Plan::BlockJoin(p) => p.open().await,
                Plan::GroupBy(p) => p.open().await,
                Plan::Sort(p) => p.open().await,
            }
        })
    }

    /// Formats the plan tree as a human-readable string, one node per line.
    ///
    /// # Example output
    ///
    /// ```text
    /// Project: smername, prednaziv
    ///   BlockJoin: smid = predsmerid
    ///     Table: smer
    ///     Table: predmet
    /// ```
    pub fn explain(&self) -> String {
        self.format_explain(0)
    }

    fn format_explain(&self, indent: usize) -> String {
        let prefix = "  ".repeat(indent);
        match self {
            Plan::Table(p) => format!("{}Table: {}", prefix, p.table_name()),
            Plan::Select(p) => format!(
                "{}Select: {}\n{}",
                prefix,
                p.predicate(),
                p.child().format_explain(indent + 1)
            ),
            Plan::Project(p) => format!(
                "{}Project: {}\n{}",
                prefix,
                p.fields().join(", "),
                p.child().format_explain(indent + 1)
            ),
            Plan::Product(p) => format!(
                "{}Product\n{}\n{}",
                prefix,
                p.lhs().format_explain(indent + 1),
                p.rhs().format_explain(indent + 1)
            ),
            Plan::BlockJoin(p) => format!(
                "{}BlockJoin: {} = {}\n{}\n{}",
                prefix,
                p.outer_field(),
                p.inner_field(),
                p.outer().format_explain(indent + 1),
                p.inner().format_explain(indent + 1)
            ),
            Plan::GroupBy(p) => {
                let aggs: Vec<String> = p.aggregates().iter().map(|a| a.to_string()).collect();
                format!(
                    "{}GroupBy: [{}] {}\n{}",
                    prefix,
                    p.group_fields().join(", "),
                    aggs.join(", "),
                    p.child().format_explain(indent + 1)
                )
            }
            Plan::Sort(p) => format!(
                "{}Sort: {}\n{}",
                prefix,
                p.sort_fields().join(", "),
                p.child().format_explain(indent + 1)
            ),
        }
    }
}
