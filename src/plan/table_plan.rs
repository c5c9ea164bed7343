//! Leaf plan over one physical table.

use std::sync::Arc;

use crate::catalog::{StatInfo, TableInfo};
use crate::query::{Scan, TableScan};
use crate::record::Schema;
use crate::storage::Storage;
use crate::tx::Transaction;

use super::error::PlanError;

/// Leaf of every plan tree: wraps one catalog-registered relation.
///
/// The table's descriptor and statistics are resolved once, at construction,
/// and cached for the plan's lifetime — estimation afterwards is O(1) and
/// touches no I/O. The statistics are a snapshot; a concurrent refresh does
/// not change an already-built plan's estimates.
pub struct TablePlan<S: Storage> {
    tx: Arc<Transaction<S>>,
    info: TableInfo,
    stats: StatInfo,
}

impl<S: Storage> TablePlan<S> {
    /// Resolves `table` through the catalog.
    pub async fn new(tx: Arc<Transaction<S>>, table: &str) -> Result<Self, PlanError> {
        let catalog = tx.engine().catalog();
        let info = catalog.table_info(table)?;
        let stats = catalog.stat_info(table, &tx).await?;
        Ok(Self { tx, info, stats })
    }

    /// Returns the wrapped table's name.
    pub fn table_name(&self) -> &str {
        self.info.table_name()
    }

    /// Returns the table's schema.
    pub fn schema(&self) -> &Arc<Schema> {
        self.info.schema()
    }

    /// Block count, straight from the statistics snapshot.
    pub fn blocks_accessed(&self) -> u64 {
        self.stats.blocks_accessed()
    }

    /// Record count, straight from the statistics snapshot.
    pub fn records_output(&self) -> u64 {
        self.stats.records_output()
    }

    /// Distinct-value estimate for `field`.
    pub fn distinct_values(&self, field: &str) -> Result<u64, PlanError> {
        if !self.info.schema().has_field(field) {
            return Err(PlanError::UnknownField(field.to_string()));
        }
        Ok(self.stats.distinct_values(field))
    }

    /// Opens a fresh cursor over the table.
    pub async fn open(&self) -> Result<Scan<S>, PlanError> {
        Ok(Scan::Table(
            TableScan::new(Arc::clone(&self.tx), self.info.clone()).await?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datum::Constant;
    use crate::engine::Engine;
    use crate::storage::MemoryStorage;

    async fn seeded_plan() -> TablePlan<MemoryStorage> {
        let engine = Engine::new(MemoryStorage::new(), 8);
        let tx = engine.begin();

        let mut schema = Schema::new();
        schema.add_int_field("smid").unwrap();
        schema.add_string_field("smername", 25).unwrap();
        let info = engine.catalog().create_table("smer", schema).unwrap();

        let mut scan = TableScan::new(Arc::clone(&tx), info).await.unwrap();
        for (smid, name) in [(1, "SI"), (2, "ET"), (3, "SI")] {
            scan.insert().await.unwrap();
            scan.set_value("smid", &Constant::Int(smid)).await.unwrap();
            scan.set_value("smername", &Constant::from(name))
                .await
                .unwrap();
        }
        drop(scan);

        TablePlan::new(tx, "smer").await.unwrap()
    }

    #[tokio::test]
    async fn test_estimates_from_statistics() {
        let plan = seeded_plan().await;
        assert_eq!(plan.blocks_accessed(), 1);
        assert_eq!(plan.records_output(), 3);
        assert_eq!(plan.distinct_values("smid").unwrap(), 3);
        assert_eq!(plan.distinct_values("smername").unwrap(), 2);
    }

    #[tokio::test]
    async fn test_distinct_values_unknown_field() {
        let plan = seeded_plan().await;
        assert!(matches!(
            plan.distinct_values("nope"),
            Err(PlanError::UnknownField(_))
        ));
    }

    #[tokio::test]
    async fn test_unknown_table() {
        let engine = Engine::new(MemoryStorage::new(), 8);
        let tx = engine.begin();
        assert!(matches!(
            TablePlan::new(tx, "missing").await,
            Err(PlanError::Catalog(_))
        ));
    }

    #[tokio::test]
    async fn test_open_twice_yields_independent_scans() {
        let plan = seeded_plan().await;
        let mut a = plan.open().await.unwrap();
        let mut b = plan.open().await.unwrap();

        assert!(a.next().await.unwrap());
        assert!(a.next().await.unwrap());
        // b starts from the beginning regardless of a's position.
        assert!(b.next().await.unwrap());
        assert_eq!(b.get_value("smid").await.unwrap(), Constant::Int(1));
    }
}
