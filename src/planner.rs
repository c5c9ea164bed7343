//! The planner: from parsed statement descriptors to executed plans.
//!
//! SQL text parsing lives outside this crate; the planner consumes the
//! structured descriptors a parser produces — [`QueryData`] for queries, the
//! [`UpdateCommand`] variants for updates — and assembles plan trees over
//! the operators in [`plan`](crate::plan). It orchestrates; the operators
//! hold the algorithms.
//!
//! Query planning pushes each predicate conjunct as close to the leaves as
//! it can: per-table terms become selections directly over the table leaf,
//! a term equating a field on each side of a table pair becomes a
//! block-nested-loop join, and whatever remains is applied once at the
//! root. View names in a query's table list expand recursively to their
//! stored definitions.
//!
//! Update execution is transactional at statement granularity: a failure
//! mid-statement rolls the owning transaction back before the error is
//! propagated, so no partial update survives.

mod core;
mod data;
mod error;
mod query_planner;
mod update_planner;

pub use self::core::Planner;
pub use data::{
    CreateIndexData, CreateTableData, CreateViewData, DeleteData, InsertData, ModifyData,
    QueryData, UpdateCommand,
};
pub use error::PlannerError;
pub use query_planner::BasicQueryPlanner;
pub use update_planner::BasicUpdatePlanner;
