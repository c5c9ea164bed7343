//! Table descriptors handed to the query layer.

use std::collections::HashMap;
use std::sync::Arc;

use crate::record::{Layout, Schema};

/// Physical description of one relation: its file and record layout.
///
/// Cheap to clone (the layout is shared). Temporary relations construct
/// their `TableInfo` directly without registering in the catalog.
#[derive(Clone)]
pub struct TableInfo {
    table: String,
    file: String,
    layout: Arc<Layout>,
}

impl TableInfo {
    /// Creates a descriptor for a relation stored in `file`.
    pub fn new(table: impl Into<String>, file: impl Into<String>, layout: Arc<Layout>) -> Self {
        Self {
            table: table.into(),
            file: file.into(),
            layout,
        }
    }

    /// Returns the relation name.
    pub fn table_name(&self) -> &str {
        &self.table
    }

    /// Returns the backing file name.
    pub fn file_name(&self) -> &str {
        &self.file
    }

    /// Returns the record layout.
    pub fn layout(&self) -> &Arc<Layout> {
        &self.layout
    }

    /// Returns the relation schema.
    pub fn schema(&self) -> &Arc<Schema> {
        self.layout.schema()
    }
}

/// Statistics for one relation: the inputs to plan cost estimation.
///
/// All three figures are approximations of the state at the time the
/// statistics were computed; the catalog refreshes them out of band.
#[derive(Debug, Clone)]
pub struct StatInfo {
    blocks: u64,
    records: u64,
    distinct: HashMap<String, u64>,
}

impl StatInfo {
    /// Creates a statistics record.
    pub fn new(blocks: u64, records: u64, distinct: HashMap<String, u64>) -> Self {
        Self {
            blocks,
            records,
            distinct,
        }
    }

    /// Estimated number of blocks in the relation.
    pub fn blocks_accessed(&self) -> u64 {
        self.blocks
    }

    /// Estimated number of records in the relation.
    pub fn records_output(&self) -> u64 {
        self.records
    }

    /// Estimated number of distinct values of `field`.
    ///
    /// Falls back to the `1 + records/3` guess for a field with no recorded
    /// figure, so a stale or partial statistics snapshot still yields a
    /// usable (if rough) selectivity.
    pub fn distinct_values(&self, field: &str) -> u64 {
        self.distinct
            .get(field)
            .copied()
            .unwrap_or(1 + self.records / 3)
    }
}
