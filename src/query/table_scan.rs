//! Sequential scan over one table's record pages.

use std::sync::Arc;

use crate::catalog::TableInfo;
use crate::datum::Constant;
use crate::storage::{BlockId, Storage};
use crate::record::RecordPage;
use crate::tx::Transaction;

use super::error::QueryError;

/// Cursor over a table's records in block/slot order.
///
/// Holds at most one pinned block (the current one) at a time; advancing
/// past a block's last used slot unpins it and pins the next. This is also
/// the engine's only updatable cursor: [`insert`](TableScan::insert),
/// [`delete`](TableScan::delete) and [`set_value`](TableScan::set_value)
/// mutate the underlying relation in place.
pub struct TableScan<S: Storage> {
    tx: Arc<Transaction<S>>,
    info: TableInfo,
    page: Option<RecordPage<S>>,
    slot: Option<usize>,
}

impl<S: Storage> TableScan<S> {
    /// Opens a scan positioned before the table's first row.
    pub async fn new(tx: Arc<Transaction<S>>, info: TableInfo) -> Result<Self, QueryError> {
        let mut scan = Self {
            tx,
            info,
            page: None,
            slot: None,
        };
        scan.before_first().await?;
        Ok(scan)
    }

    /// Returns the scanned table's descriptor.
    pub fn info(&self) -> &TableInfo {
        &self.info
    }

    async fn move_to_block(&mut self, num: u64) -> Result<(), QueryError> {
        // Drop the old pin before taking the new one.
        self.page = None;
        let blk = BlockId::new(self.info.file_name(), num);
        let page = RecordPage::open(&self.tx, &blk, Arc::clone(self.info.layout())).await?;
        self.page = Some(page);
        self.slot = None;
        Ok(())
    }

    /// Repositions before the first row.
    pub async fn before_first(&mut self) -> Result<(), QueryError> {
        if self.tx.size(self.info.file_name()).await? == 0 {
            // Empty relation: nothing to pin.
            self.page = None;
            self.slot = None;
        } else {
            self.move_to_block(0).await?;
        }
        Ok(())
    }

    /// Advances to the next used slot, crossing block boundaries.
    pub async fn next(&mut self) -> Result<bool, QueryError> {
        loop {
            let Some(page) = &self.page else {
                return Ok(false);
            };
            if let Some(slot) = page.next_used_after(self.slot).await {
                self.slot = Some(slot);
                return Ok(true);
            }
            let current = page.block().num();
            if current + 1 >= self.tx.size(self.info.file_name()).await? {
                self.page = None;
                self.slot = None;
                return Ok(false);
            }
            self.move_to_block(current + 1).await?;
        }
    }

    fn current(&self) -> Result<(&RecordPage<S>, usize), QueryError> {
        match (&self.page, self.slot) {
            (Some(page), Some(slot)) => Ok((page, slot)),
            _ => Err(QueryError::NoCurrentRow),
        }
    }

    /// Reads the named field of the current row.
    pub async fn get_value(&self, field: &str) -> Result<Constant, QueryError> {
        if !self.has_field(field) {
            return Err(QueryError::UnknownField(field.to_string()));
        }
        let (page, slot) = self.current()?;
        Ok(page.get_value(slot, field).await?)
    }

    /// Returns whether the table's schema contains `field`.
    pub fn has_field(&self, field: &str) -> bool {
        self.info.schema().has_field(field)
    }

    /// Writes `val` into the named field of the current row.
    pub async fn set_value(&self, field: &str, val: &Constant) -> Result<(), QueryError> {
        if !self.has_field(field) {
            return Err(QueryError::UnknownField(field.to_string()));
        }
        let (page, slot) = self.current()?;
        Ok(page.set_value(slot, field, val).await?)
    }

    /// Claims the next free slot after the current position (appending a
    /// fresh block at end of file if needed) and positions the scan on it.
    pub async fn insert(&mut self) -> Result<(), QueryError> {
        loop {
            if self.page.is_none() {
                // Empty relation, or a scan parked at end of file.
                if self.tx.size(self.info.file_name()).await? == 0 {
                    self.tx.append(self.info.file_name()).await?;
                }
                self.move_to_block(0).await?;
            }
            let page = self.page.as_ref().ok_or(QueryError::NoCurrentRow)?;
            if let Some(slot) = page.insert_after(self.slot).await {
                self.slot = Some(slot);
                return Ok(());
            }
            let current = page.block().num();
            if current + 1 < self.tx.size(self.info.file_name()).await? {
                self.move_to_block(current + 1).await?;
            } else {
                let blk = self.tx.append(self.info.file_name()).await?;
                self.move_to_block(blk.num()).await?;
            }
        }
    }

    /// Deletes the current row (its slot becomes reusable).
    pub async fn delete(&mut self) -> Result<(), QueryError> {
        let (page, slot) = self.current()?;
        page.delete(slot).await;
        Ok(())
    }

    /// Releases the current pinned block.
    pub fn close(&mut self) {
        self.page = None;
        self.slot = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Engine;
    use crate::record::Schema;
    use crate::storage::MemoryStorage;

    async fn seeded_scan(rows: &[(i32, &str)]) -> TableScan<MemoryStorage> {
        let engine = Engine::new(MemoryStorage::new(), 8);
        let tx = engine.begin();

        let mut schema = Schema::new();
        schema.add_int_field("smid").unwrap();
        schema.add_string_field("smername", 25).unwrap();
        let info = engine.catalog().create_table("smer", schema).unwrap();

        let mut scan = TableScan::new(Arc::clone(&tx), info).await.unwrap();
        for (smid, name) in rows {
            scan.insert().await.unwrap();
            scan.set_value("smid", &Constant::Int(*smid)).await.unwrap();
            scan.set_value("smername", &Constant::from(*name))
                .await
                .unwrap();
        }
        scan.before_first().await.unwrap();
        scan
    }

    #[tokio::test]
    async fn test_insert_then_scan() {
        let mut scan = seeded_scan(&[(1, "SI"), (2, "ET")]).await;

        assert!(scan.next().await.unwrap());
        assert_eq!(scan.get_value("smid").await.unwrap(), Constant::Int(1));
        assert_eq!(
            scan.get_value("smername").await.unwrap(),
            Constant::from("SI")
        );

        assert!(scan.next().await.unwrap());
        assert_eq!(scan.get_value("smid").await.unwrap(), Constant::Int(2));

        assert!(!scan.next().await.unwrap());
        // Exhausted scans stay exhausted.
        assert!(!scan.next().await.unwrap());
    }

    #[tokio::test]
    async fn test_empty_table() {
        let mut scan = seeded_scan(&[]).await;
        assert!(!scan.next().await.unwrap());
    }

    #[tokio::test]
    async fn test_before_first_rewinds() {
        let mut scan = seeded_scan(&[(1, "SI"), (2, "ET")]).await;

        let mut first_pass = Vec::new();
        while scan.next().await.unwrap() {
            first_pass.push(scan.get_value("smid").await.unwrap());
        }
        scan.before_first().await.unwrap();
        let mut second_pass = Vec::new();
        while scan.next().await.unwrap() {
            second_pass.push(scan.get_value("smid").await.unwrap());
        }
        assert_eq!(first_pass, second_pass);
    }

    #[tokio::test]
    async fn test_delete_skips_row() {
        let mut scan = seeded_scan(&[(1, "SI"), (2, "ET"), (3, "RN")]).await;

        while scan.next().await.unwrap() {
            if scan.get_value("smid").await.unwrap() == Constant::Int(2) {
                scan.delete().await.unwrap();
            }
        }

        scan.before_first().await.unwrap();
        let mut seen = Vec::new();
        while scan.next().await.unwrap() {
            seen.push(scan.get_value("smid").await.unwrap());
        }
        assert_eq!(seen, vec![Constant::Int(1), Constant::Int(3)]);
    }

    #[tokio::test]
    async fn test_access_before_next_is_error() {
        let scan = seeded_scan(&[(1, "SI")]).await;
        assert!(matches!(
            scan.get_value("smid").await,
            Err(QueryError::NoCurrentRow)
        ));
    }

    #[tokio::test]
    async fn test_unknown_field_is_error() {
        let mut scan = seeded_scan(&[(1, "SI")]).await;
        scan.next().await.unwrap();
        assert!(matches!(
            scan.get_value("nope").await,
            Err(QueryError::UnknownField(_))
        ));
    }

    #[tokio::test]
    async fn test_inserts_spill_into_new_blocks() {
        // More rows than one block holds: slot is 4 + 4 + 29 = 37 bytes,
        // so a 4096-byte block holds 110 slots.
        let rows: Vec<(i32, String)> = (0..250).map(|i| (i, format!("s{}", i))).collect();
        let engine = Engine::new(MemoryStorage::new(), 8);
        let tx = engine.begin();

        let mut schema = Schema::new();
        schema.add_int_field("smid").unwrap();
        schema.add_string_field("smername", 25).unwrap();
        let info = engine.catalog().create_table("smer", schema).unwrap();

        let mut scan = TableScan::new(Arc::clone(&tx), info.clone()).await.unwrap();
        for (smid, name) in &rows {
            scan.insert().await.unwrap();
            scan.set_value("smid", &Constant::Int(*smid)).await.unwrap();
            scan.set_value("smername", &Constant::from(name.clone()))
                .await
                .unwrap();
        }

        assert!(tx.size(info.file_name()).await.unwrap() > 1);

        scan.before_first().await.unwrap();
        let mut count = 0;
        while scan.next().await.unwrap() {
            count += 1;
        }
        assert_eq!(count, rows.len());
    }
}
