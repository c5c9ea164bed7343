//! Logical query plans and their cost model.
//!
//! A [`Plan`] describes a relational computation without performing any I/O:
//! it knows its output schema and three cost estimates (`blocks_accessed`,
//! `records_output`, `distinct_values`) that a planner compares to choose
//! among equivalent trees. [`Plan::open`] turns the description into a
//! [`Scan`](crate::query::Scan) cursor tree.
//!
//! # Architecture
//!
//! ```text
//! ProjectPlan (smername, prednaziv)
//!   └── BlockJoinPlan (smid = predsmerid)      <- estimates chunked cost
//!         ├── SelectPlan (smername = 'SI')
//!         │     └── TablePlan smer             <- estimates from StatInfo
//!         └── SelectPlan (predgod = 1)
//!               └── TablePlan predmet
//! ```
//!
//! Estimation is pure and safely callable before `open()`; the only plan
//! whose `open()` is not O(1) is [`BlockJoinPlan`], which materializes its
//! inner side first.

mod error;
mod group_plan;
mod join_plan;
mod node;
mod product_plan;
mod project_plan;
mod select_plan;
mod sort_plan;
mod table_plan;

pub use error::PlanError;
pub use group_plan::GroupByPlan;
pub use join_plan::BlockJoinPlan;
pub use node::Plan;
pub use product_plan::ProductPlan;
pub use project_plan::ProjectPlan;
pub use select_plan::SelectPlan;
pub use sort_plan::SortPlan;
pub use table_plan::TablePlan;
