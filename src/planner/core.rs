//! The planner facade.

use std::sync::Arc;

use crate::plan::Plan;
use crate::storage::Storage;
use crate::tx::Transaction;

use super::data::{QueryData, UpdateCommand};
use super::error::PlannerError;
use super::query_planner::BasicQueryPlanner;
use super::update_planner::BasicUpdatePlanner;

/// Entry point for statement execution: queries become plan trees, updates
/// run to completion or roll back.
pub struct Planner {
    query_planner: BasicQueryPlanner,
    update_planner: BasicUpdatePlanner,
}

impl Planner {
    /// Creates a planner.
    pub fn new() -> Self {
        Self {
            query_planner: BasicQueryPlanner::new(),
            update_planner: BasicUpdatePlanner::new(),
        }
    }

    /// Builds the plan tree for a query; the caller opens and drains it.
    pub async fn create_query_plan<S: Storage>(
        &self,
        data: &QueryData,
        tx: &Arc<Transaction<S>>,
    ) -> Result<Plan<S>, PlannerError> {
        self.query_planner.create_plan(data, tx).await
    }

    /// Executes an update statement, returning the number of affected rows
    /// (0 for schema statements).
    ///
    /// A failure rolls the transaction back before the error is returned —
    /// no partial update is ever left behind.
    pub async fn execute_update<S: Storage>(
        &self,
        cmd: &UpdateCommand,
        tx: &Arc<Transaction<S>>,
    ) -> Result<u64, PlannerError> {
        let result = match cmd {
            UpdateCommand::Insert(d) => self.update_planner.execute_insert(d, tx).await,
            UpdateCommand::Delete(d) => self.update_planner.execute_delete(d, tx).await,
            UpdateCommand::Modify(d) => self.update_planner.execute_modify(d, tx).await,
            UpdateCommand::CreateTable(d) => {
                self.update_planner.execute_create_table(d, tx).await
            }
            UpdateCommand::CreateView(d) => self.update_planner.execute_create_view(d, tx).await,
            UpdateCommand::CreateIndex(d) => {
                self.update_planner.execute_create_index(d, tx).await
            }
        };
        match result {
            Ok(count) => Ok(count),
            Err(e) => {
                tx.rollback().await?;
                Err(e)
            }
        }
    }
}

impl Default for Planner {
    fn default() -> Self {
        Self::new()
    }
}
