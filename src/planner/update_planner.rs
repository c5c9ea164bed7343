//! Update execution: descriptor to mutated relation.

use std::sync::Arc;

use tracing::debug;

use crate::plan::{Plan, SelectPlan, TablePlan};
use crate::storage::Storage;
use crate::tx::Transaction;

use super::data::{
    CreateIndexData, CreateTableData, CreateViewData, DeleteData, InsertData, ModifyData,
};
use super::error::PlannerError;

/// Executes update statements by scan-and-mutate over a table leaf.
///
/// Every data statement opens a selection over the target table (a
/// selection passes updates through to the table cursor underneath) and
/// walks the matching rows. Schema statements go straight to the catalog.
/// Rollback on failure is the [`Planner`](super::Planner) facade's job, so
/// these methods just propagate errors.
pub struct BasicUpdatePlanner;

impl BasicUpdatePlanner {
    /// Creates the planner.
    pub fn new() -> Self {
        Self
    }

    /// Inserts one row; returns 1.
    pub async fn execute_insert<S: Storage>(
        &self,
        data: &InsertData,
        tx: &Arc<Transaction<S>>,
    ) -> Result<u64, PlannerError> {
        if data.fields.len() != data.values.len() {
            return Err(PlannerError::InsertArity {
                fields: data.fields.len(),
                values: data.values.len(),
            });
        }
        let plan = Plan::Table(TablePlan::new(Arc::clone(tx), &data.table).await?);
        let mut scan = plan.open().await?;
        scan.insert().await?;
        for (field, value) in data.fields.iter().zip(&data.values) {
            scan.set_value(field, value.clone()).await?;
        }
        scan.close();
        debug!(table = %data.table, "row inserted");
        Ok(1)
    }

    /// Deletes every matching row; returns the count.
    pub async fn execute_delete<S: Storage>(
        &self,
        data: &DeleteData,
        tx: &Arc<Transaction<S>>,
    ) -> Result<u64, PlannerError> {
        let table = Plan::Table(TablePlan::new(Arc::clone(tx), &data.table).await?);
        let plan = Plan::Select(SelectPlan::new(table, data.pred.clone()));
        let mut scan = plan.open().await?;
        let mut count = 0;
        while scan.next().await? {
            scan.delete().await?;
            count += 1;
        }
        scan.close();
        debug!(table = %data.table, count, "rows deleted");
        Ok(count)
    }

    /// Assigns the statement's value expression to the named field of every
    /// matching row; returns the count.
    pub async fn execute_modify<S: Storage>(
        &self,
        data: &ModifyData,
        tx: &Arc<Transaction<S>>,
    ) -> Result<u64, PlannerError> {
        let table = Plan::Table(TablePlan::new(Arc::clone(tx), &data.table).await?);
        let plan = Plan::Select(SelectPlan::new(table, data.pred.clone()));
        let mut scan = plan.open().await?;
        let mut count = 0;
        while scan.next().await? {
            let value = data.value.evaluate(&scan).await?;
            scan.set_value(&data.field, value).await?;
            count += 1;
        }
        scan.close();
        debug!(table = %data.table, field = %data.field, count, "rows modified");
        Ok(count)
    }

    /// Registers a new table.
    pub async fn execute_create_table<S: Storage>(
        &self,
        data: &CreateTableData,
        tx: &Arc<Transaction<S>>,
    ) -> Result<u64, PlannerError> {
        tx.engine()
            .catalog()
            .create_table(&data.table, data.schema.clone())?;
        Ok(0)
    }

    /// Registers a new view.
    pub async fn execute_create_view<S: Storage>(
        &self,
        data: &CreateViewData,
        tx: &Arc<Transaction<S>>,
    ) -> Result<u64, PlannerError> {
        tx.engine()
            .catalog()
            .create_view(&data.view, data.definition.clone())?;
        Ok(0)
    }

    /// Records an index declaration.
    pub async fn execute_create_index<S: Storage>(
        &self,
        data: &CreateIndexData,
        tx: &Arc<Transaction<S>>,
    ) -> Result<u64, PlannerError> {
        tx.engine()
            .catalog()
            .create_index(&data.index, &data.table, &data.field)?;
        Ok(0)
    }
}

impl Default for BasicUpdatePlanner {
    fn default() -> Self {
        Self::new()
    }
}
