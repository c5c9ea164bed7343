//! The catalog registry.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::debug;

use crate::datum::Constant;
use crate::planner::QueryData;
use crate::record::{Layout, RecordPage, Schema};
use crate::storage::{BlockId, Storage};
use crate::tx::Transaction;

use super::error::CatalogError;
use super::info::{StatInfo, TableInfo};

/// Statistics are recomputed from scratch after this many lookups.
const REFRESH_CALL_LIMIT: usize = 100;

/// A declared (but unused) index: recorded as metadata only, since the
/// engine has no index access paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexInfo {
    /// Index name.
    pub index_name: String,
    /// Indexed table.
    pub table_name: String,
    /// Indexed field.
    pub field_name: String,
}

struct StatsCache {
    map: HashMap<String, StatInfo>,
    calls: usize,
}

/// In-memory metadata registry: tables, views, index declarations and the
/// statistics cache.
///
/// Views are stored as structured [`QueryData`] — SQL text never enters
/// this layer; parsing a view definition into its descriptor is the parser
/// collaborator's job.
pub struct Catalog {
    tables: RwLock<HashMap<String, TableInfo>>,
    views: RwLock<HashMap<String, QueryData>>,
    indexes: RwLock<Vec<IndexInfo>>,
    stats: Mutex<StatsCache>,
}

impl Catalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
            views: RwLock::new(HashMap::new()),
            indexes: RwLock::new(Vec::new()),
            stats: Mutex::new(StatsCache {
                map: HashMap::new(),
                calls: 0,
            }),
        }
    }

    /// Registers a table and computes its record layout.
    ///
    /// The backing file is `<name>.tbl`; it is created lazily by the first
    /// insert.
    ///
    /// # Errors
    ///
    /// [`CatalogError::NameInUse`] if a table or view with this name exists;
    /// [`CatalogError::Record`] if the schema's slot does not fit a block.
    pub fn create_table(&self, name: &str, schema: Schema) -> Result<TableInfo, CatalogError> {
        if self.views.read().contains_key(name) {
            return Err(CatalogError::NameInUse(name.to_string()));
        }
        let mut tables = self.tables.write();
        if tables.contains_key(name) {
            return Err(CatalogError::NameInUse(name.to_string()));
        }
        let layout = Arc::new(Layout::new(schema)?);
        let info = TableInfo::new(name, format!("{}.tbl", name), layout);
        tables.insert(name.to_string(), info.clone());
        debug!(table = name, "table created");
        Ok(info)
    }

    /// Looks up a table's physical descriptor.
    pub fn table_info(&self, name: &str) -> Result<TableInfo, CatalogError> {
        self.tables
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| CatalogError::TableNotFound(name.to_string()))
    }

    /// Looks up (computing if needed) a table's statistics.
    ///
    /// The whole cache is invalidated after [`REFRESH_CALL_LIMIT`] lookups,
    /// so long-running workloads see periodically refreshed figures.
    pub async fn stat_info<S: Storage>(
        &self,
        name: &str,
        tx: &Arc<Transaction<S>>,
    ) -> Result<StatInfo, CatalogError> {
        {
            let mut cache = self.stats.lock();
            cache.calls += 1;
            if cache.calls > REFRESH_CALL_LIMIT {
                cache.map.clear();
                cache.calls = 0;
                debug!("statistics cache invalidated");
            }
            if let Some(si) = cache.map.get(name) {
                return Ok(si.clone());
            }
        }

        let info = self.table_info(name)?;
        let si = compute_stats(&info, tx).await?;
        debug!(
            table = name,
            blocks = si.blocks_accessed(),
            records = si.records_output(),
            "statistics computed"
        );
        self.stats.lock().map.insert(name.to_string(), si.clone());
        Ok(si)
    }

    /// Registers a view under `name` with a structured definition.
    pub fn create_view(&self, name: &str, definition: QueryData) -> Result<(), CatalogError> {
        if self.tables.read().contains_key(name) {
            return Err(CatalogError::NameInUse(name.to_string()));
        }
        let mut views = self.views.write();
        if views.contains_key(name) {
            return Err(CatalogError::NameInUse(name.to_string()));
        }
        views.insert(name.to_string(), definition);
        debug!(view = name, "view created");
        Ok(())
    }

    /// Returns the named view's definition, if one exists.
    pub fn view_definition(&self, name: &str) -> Option<QueryData> {
        self.views.read().get(name).cloned()
    }

    /// Records an index declaration over an existing table and field.
    pub fn create_index(
        &self,
        index_name: &str,
        table_name: &str,
        field_name: &str,
    ) -> Result<(), CatalogError> {
        let info = self.table_info(table_name)?;
        if !info.schema().has_field(field_name) {
            return Err(CatalogError::Record(
                crate::record::RecordError::UnknownField(field_name.to_string()),
            ));
        }
        self.indexes.write().push(IndexInfo {
            index_name: index_name.to_string(),
            table_name: table_name.to_string(),
            field_name: field_name.to_string(),
        });
        debug!(index = index_name, table = table_name, "index declared");
        Ok(())
    }

    /// Returns the index declarations on a table.
    pub fn indexes_on(&self, table_name: &str) -> Vec<IndexInfo> {
        self.indexes
            .read()
            .iter()
            .filter(|ix| ix.table_name == table_name)
            .cloned()
            .collect()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

/// Computes statistics by one full walk of the relation.
async fn compute_stats<S: Storage>(
    info: &TableInfo,
    tx: &Arc<Transaction<S>>,
) -> Result<StatInfo, CatalogError> {
    let blocks = tx.size(info.file_name()).await?;
    let mut records: u64 = 0;
    let mut seen: HashMap<String, HashSet<Constant>> = info
        .schema()
        .fields()
        .iter()
        .map(|f| (f.clone(), HashSet::new()))
        .collect();

    for num in 0..blocks {
        let blk = BlockId::new(info.file_name(), num);
        let page = RecordPage::open(tx, &blk, Arc::clone(info.layout())).await?;
        let mut slot = page.next_used_after(None).await;
        while let Some(s) = slot {
            records += 1;
            for field in info.schema().fields() {
                let val = page.get_value(s, field).await?;
                if let Some(set) = seen.get_mut(field) {
                    set.insert(val);
                }
            }
            slot = page.next_used_after(Some(s)).await;
        }
    }

    let distinct = seen
        .into_iter()
        .map(|(field, set)| (field, set.len() as u64))
        .collect();
    Ok(StatInfo::new(blocks, records, distinct))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Engine;
    use crate::storage::MemoryStorage;

    fn smer_schema() -> Schema {
        let mut schema = Schema::new();
        schema.add_int_field("smid").unwrap();
        schema.add_string_field("smername", 25).unwrap();
        schema
    }

    #[tokio::test]
    async fn test_create_and_lookup_table() {
        let catalog = Catalog::new();
        catalog.create_table("smer", smer_schema()).unwrap();

        let info = catalog.table_info("smer").unwrap();
        assert_eq!(info.table_name(), "smer");
        assert_eq!(info.file_name(), "smer.tbl");
        assert!(info.schema().has_field("smername"));
    }

    #[tokio::test]
    async fn test_duplicate_table_rejected() {
        let catalog = Catalog::new();
        catalog.create_table("smer", smer_schema()).unwrap();
        assert!(matches!(
            catalog.create_table("smer", smer_schema()),
            Err(CatalogError::NameInUse(_))
        ));
    }

    #[tokio::test]
    async fn test_table_not_found() {
        let catalog = Catalog::new();
        assert!(matches!(
            catalog.table_info("nope"),
            Err(CatalogError::TableNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_stats_of_seeded_table() {
        let engine = Engine::new(MemoryStorage::new(), 8);
        let tx = engine.begin();
        let info = engine.catalog().create_table("smer", smer_schema()).unwrap();

        // Seed two records by hand.
        let blk = tx.append(info.file_name()).await.unwrap();
        let page = RecordPage::open(&tx, &blk, Arc::clone(info.layout()))
            .await
            .unwrap();
        let mut prev = None;
        for (smid, name) in [(1, "SI"), (2, "ET")] {
            let slot = page.insert_after(prev).await.unwrap();
            page.set_i32(slot, "smid", smid).await.unwrap();
            page.set_string(slot, "smername", name).await.unwrap();
            prev = Some(slot);
        }
        drop(page);

        let si = engine.catalog().stat_info("smer", &tx).await.unwrap();
        assert_eq!(si.blocks_accessed(), 1);
        assert_eq!(si.records_output(), 2);
        assert_eq!(si.distinct_values("smid"), 2);
    }

    #[tokio::test]
    async fn test_index_declarations() {
        let catalog = Catalog::new();
        catalog.create_table("smer", smer_schema()).unwrap();
        catalog.create_index("smer_smid_idx", "smer", "smid").unwrap();

        let on_smer = catalog.indexes_on("smer");
        assert_eq!(on_smer.len(), 1);
        assert_eq!(on_smer[0].field_name, "smid");

        assert!(catalog.create_index("bad", "smer", "missing").is_err());
        assert!(catalog.create_index("bad", "nope", "smid").is_err());
    }
}
